//! Development auto-reload.
//!
//! With `--reload` the server watches its own executable. When a rebuild
//! replaces it, the server shuts down gracefully and re-executes the new
//! binary with the same arguments.

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Give the linker a moment to finish writing the new binary.
const SETTLE_DELAY: Duration = Duration::from_millis(300);

pub struct ReloadWatcher {
    exe: PathBuf,
    changed: Arc<Notify>,
    // Dropping the watcher stops the notifications.
    _watcher: RecommendedWatcher,
}

impl ReloadWatcher {
    /// Start watching the running executable.
    pub fn start() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to resolve current executable")?;
        let dir = exe
            .parent()
            .context("Executable has no parent directory")?
            .to_path_buf();

        let changed = Arc::new(Notify::new());
        let notify_changed = changed.clone();
        let watched = exe.clone();

        // Build tools replace the file rather than rewrite it, so watch the
        // directory and filter on our file name.
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) if is_rebuild_event(&event, &watched) => {
                    tracing::info!(path = %watched.display(), "executable changed, reloading");
                    notify_changed.notify_one();
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "reload watcher error"),
            },
            notify::Config::default(),
        )?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        tracing::info!(path = %exe.display(), "auto-reload enabled");

        Ok(Self {
            exe,
            changed,
            _watcher: watcher,
        })
    }

    /// Resolves once the executable has been replaced.
    pub fn changed(&self) -> Arc<Notify> {
        self.changed.clone()
    }

    /// Replace the current process with the rebuilt binary. Only returns on
    /// failure.
    pub async fn restart(self) -> Result<()> {
        tokio::time::sleep(SETTLE_DELAY).await;
        let args = forwarded_args(std::env::args_os());
        exec(&self.exe, &args)
    }
}

/// Arguments to hand the new process, without the program name. Kept as
/// `OsString` so paths that are not valid UTF-8 survive the restart.
fn forwarded_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter().skip(1).collect()
}

fn is_rebuild_event(event: &notify::Event, exe: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == exe.file_name())
}

#[cfg(unix)]
fn exec(exe: &Path, args: &[OsString]) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(exe).args(args).exec();
    Err(err).with_context(|| format!("Failed to re-exec {}", exe.display()))
}

#[cfg(not(unix))]
fn exec(exe: &Path, args: &[OsString]) -> Result<()> {
    std::process::Command::new(exe)
        .args(args)
        .spawn()
        .with_context(|| format!("Failed to restart {}", exe.display()))?;
    std::process::exit(0);
}
