//! Reply sink trait and output errors
//!
//! This module defines the interface the front end delivers replies through.

use crate::output::reply::Reply;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for user-facing replies
///
/// The search core never formats text; sinks decide how a [`Reply`] reaches
/// the user (a terminal, a chat transport, a test buffer).
pub trait ReplySink {
    /// Delivers one reply
    ///
    /// # Arguments
    ///
    /// * `reply` - The reply to render and send
    fn deliver(&mut self, reply: &Reply) -> OutputResult<()>;
}
