//! Core types, identifiers, and errors for Lanthorn.
//!
//! This crate provides:
//! - [`EntityId`] - Generational entity identifiers
//! - [`SymbolId`] and [`Interner`] - Interned symbol atoms
//! - [`Type`] - Runtime type tags used in fault messages
//! - [`Error`] - Rich error types with context, grouped by [`ErrorCategory`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod intern;
pub mod types;

pub use entity::EntityId;
pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result};
pub use intern::{Interner, SymbolId};
pub use types::Type;
