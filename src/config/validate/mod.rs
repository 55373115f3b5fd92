//! Configuration validation
//!
//! Checks a run file for values the engine or the loop would reject, and
//! reports them with the offending field.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::validate_config;
