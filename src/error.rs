use thiserror::Error;

/// Everything that can go wrong between the mailbox, the model and the relay.
///
/// Only an inbound `Connection` failure stops the responder; the loop catches
/// every other variant where it happens and logs it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("couldn't open mail session: {0}")]
    Connection(String),

    #[error("unseen search failed: {0}")]
    Search(String),

    #[error("couldn't fetch message {id}: {reason}")]
    Fetch { id: u32, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("inference request failed: {0}")]
    InferenceTransport(String),

    #[error("inference endpoint answered with status {0}")]
    InferenceStatus(u16),

    #[error("inference endpoint didn't answer within {0} seconds")]
    InferenceTimeout(u64),

    #[error("couldn't deliver reply to {to}: {reason}")]
    Delivery { to: String, reason: String },

    #[error("bad configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the only condition that ends the poll loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}
