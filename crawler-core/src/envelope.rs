//! Uniform response envelope.
//!
//! Every endpoint answers with `{code, msg, data}`. The transport status is
//! always 200; `code` carries the real outcome.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Business codes carried in [`Envelope::code`].
pub mod codes {
    pub const SUCCESS: i32 = 0;
    /// The target page could not be fetched.
    pub const CRAWL_FAILED: i32 = 1;
    /// The request itself was unusable (bad JSON, bad URL).
    pub const INVALID_PARAM: i32 = 10400;
}

pub const SUCCESS_MSG: &str = "success";

/// `code == 0` iff `data` is present and `msg == "success"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    pub code: i32,
    pub msg: String,
    /// Always serialized; `null` on error.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            code: codes::SUCCESS,
            msg: SUCCESS_MSG.to_string(),
            data: Some(data),
        }
    }

    /// Failed response with no payload.
    pub fn error(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    /// True when `code` is [`codes::SUCCESS`].
    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }

    /// Unwrap the payload, turning a nonzero code into `Err((code, msg))`.
    pub fn into_result(self) -> Result<T, (i32, String)> {
        match (self.is_success(), self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err((self.code, self.msg)),
        }
    }
}
