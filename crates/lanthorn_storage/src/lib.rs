//! Values, scopes, entities, and the world registry for Lanthorn.
//!
//! This crate provides:
//! - [`Value`] - The dynamically tagged script value
//! - [`Scope`] - Lexical binding frames
//! - [`Entity`] and [`Kind`] - World objects and their native capabilities
//! - [`accessor`] - Per-kind getter/setter tables for native members
//! - [`Registry`] - Identity-keyed entity storage with prototype delegation
//! - [`WorldSnapshot`] - A plain-data view of the registry for persistence

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accessor;
pub mod entity;
pub mod registry;
pub mod scope;
pub mod snapshot;
pub mod value;

pub use accessor::Accessor;
pub use entity::{Entity, Exit, Kind};
pub use registry::Registry;
pub use scope::Scope;
pub use snapshot::{EntitySnapshot, SnapshotValue, WorldSnapshot};
pub use value::{Closure, Value, ValueDisplay};
