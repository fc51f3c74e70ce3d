//! # scrivo-core
//!
//! Core types, traits, and access rules for the scrivo notes service.
//!
//! This crate holds everything that is independent of the storage engine and
//! the HTTP transport: the data model, the repository traits the stores
//! implement, note access control, history capture, input validation, and
//! the [`NoteService`] that ties them together.

pub mod access;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod service;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use access::{Access, Action};
pub use error::{Error, Result};
pub use history::HistorySnapshot;
pub use models::*;
pub use service::NoteService;
pub use traits::*;
pub use validation::FieldErrors;
