//! Shared primitives for the token gateway workspace.
//!
//! - [`ErrorLocation`]: file/line/column captured at the point an error is built
//! - [`RedactedSecret`]: a string that never shows up in logs or debug output
//!
//! Both `auth-core` and the `gateway` app depend on this crate; it has no
//! knowledge of the protocol or the HTTP layer.

pub mod error;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
