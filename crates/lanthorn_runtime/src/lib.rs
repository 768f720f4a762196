//! Command-line host, console, and snapshot files for Lanthorn.
//!
//! This crate provides:
//! - [`SourceSet`] and [`load_files`] - World files with `include` expanded
//! - [`Session`] - One avatar's view of a running world
//! - [`Console`] - Line-oriented play on a terminal or from a script
//! - [`to_bytes`], [`from_bytes`], [`save_to_file`], [`load_from_file`] -
//!   `MessagePack` snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod console;
pub mod editor;
pub mod serialize;
pub mod session;
pub mod sources;

pub use console::{Console, Flow};
pub use editor::{LineEditor, ReadResult, RustylineEditor, ScriptEditor};
pub use serialize::{from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::Session;
pub use sources::{Skipped, SourceError, SourceSet, load_files};
