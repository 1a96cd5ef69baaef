//! Error types for snapshot export operations.

use thiserror::Error;

/// Errors that can occur while capturing or delivering a snapshot.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No node matches {0}")]
    NodeNotFound(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Object handle creation failed: {0}")]
    HandleCreation(String),

    #[error("Activation failed: {0}")]
    Activation(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed character reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
