pub mod args;
pub mod body;
pub mod config;
pub mod email;
pub mod error;
pub mod inference;
pub mod mailbox;
pub mod reply;
pub mod responder;
pub mod seen;

pub use error::{Error, Result};
