// src/error.rs

//! Unified error handling for the crawl-state subsystem.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawl-state operations.
pub type Result<T> = std::result::Result<T, StateError>;

/// Unified error type for the crawl-state subsystem.
#[derive(Error, Debug)]
pub enum StateError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reading or writing one of the snapshot blobs failed
    #[error("Snapshot error for {name}: {message}")]
    Snapshot { name: String, message: String },

    /// A positional operation named an element the set does not hold
    #[error("No such element: {element}")]
    MissingElement { element: String },

    /// An operation that needs at least one element ran on an empty set
    #[error("{operation} on an empty set")]
    EmptySet { operation: &'static str },
}

impl StateError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a snapshot error naming the blob that failed.
    pub fn snapshot(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Snapshot {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a missing-element error carrying the offending value.
    pub fn missing(element: impl fmt::Display) -> Self {
        Self::MissingElement {
            element: element.to_string(),
        }
    }

    /// Create an empty-set error for the named operation.
    pub fn empty_set(operation: &'static str) -> Self {
        Self::EmptySet { operation }
    }
}
