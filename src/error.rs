use derive_more::Display;
use error_stack::Report;
use std::error::Error;

pub type ESResult<T, E> = Result<T, Report<E>>;

#[derive(Debug, Display)]
pub enum SetupError {
    /// Error from user input.
    #[display("User error")]
    UserError,
    /// Error from APIs, OS, etc.
    #[display("An unexpected error occurred")]
    Unexpected,
}

impl Error for SetupError {}

/// Message for the user. Attached to reports whose cause is the caller's input or a catalog that
/// has nothing matching it.
#[derive(Debug, Clone, Display, PartialEq, Eq)]
#[display("{message}")]
pub struct UserMessage {
    pub message: String,
}

impl UserMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Collect every [`UserMessage`] attached anywhere in the report, in the order they were
/// attached.
pub fn user_messages<C: ?Sized>(report: &Report<C>) -> Vec<&UserMessage> {
    let mut messages = report
        .frames()
        .filter_map(|frame| frame.downcast_ref::<UserMessage>())
        .collect::<Vec<_>>();
    messages.reverse();
    messages
}
