//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `prompt-overlay` library. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the library. Each variant corresponds to a specific type of
//!   error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library to simplify function signatures.
//!
//! Most failures are recovered locally by the component that observes them:
//! a missing or malformed template only skips that overlay, a section merge
//! failure only skips that section. The one exception is
//! `CompositionFatal`, which aborts the whole composition so the caller can
//! substitute an independently produced baseline document.

use thiserror::Error;

/// Main error type for prompt-overlay operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested overlay name has no backing content in the store's
    /// content source.
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    /// Backing content exists for the template but fails minimal shape
    /// validation (missing `metadata.version`, non-map `sections`, invalid
    /// JSON, etc.).
    #[error("Template malformed: {name} - {message}")]
    TemplateMalformed { name: String, message: String },

    /// An individual section's reconciliation failed. Recovered locally by
    /// the overlay engine: the section is left unmerged and the remaining
    /// sections proceed.
    #[error("Section merge error: {section} - {message}")]
    MergeSection { section: String, message: String },

    /// A value nests deeper than the recursion budget allows.
    #[error("Nesting depth limit exceeded: value nests deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    /// An error outside the per-overlay recovery paths, e.g. the base
    /// document is not a JSON object. Callers must fall back to their
    /// known-good baseline document.
    #[error("Composition fatal: {message}")]
    CompositionFatal { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
