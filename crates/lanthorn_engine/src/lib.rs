//! Evaluator, scheduler, event dispatcher, and world loader for Lanthorn.
//!
//! This crate provides:
//! - [`load_world`] and [`load_source`] - Two-phase world construction
//! - [`World`] - The live world, driven by commands, ticks, and resumptions
//! - [`Update`] - Structured records of everything a run changed
//! - [`DispatchResult`] - Outcome of one event dispatch
//! - [`TaskId`], [`TaskState`], [`WakeCondition`] - Suspendable script tasks
//! - [`EngineConfig`] - Budgets, seed, and tracing switches
//! - [`command`] - Player input tokenizing and direction words
//!
//! # Example
//!
//! ```
//! use lanthorn_engine::{EngineConfig, load_source};
//!
//! let source = r#"
//!     def location hall { name = "Great Hall"; }
//!     def location cellar {}
//!     extend location hall {
//!         when startWorld() { addExit(down, cellar); }
//!     }
//! "#;
//! let (mut world, skipped) = load_source(source, EngineConfig::default()).unwrap();
//! assert!(skipped.is_empty());
//!
//! world.advance_tick();
//! let hall = world.lookup("hall").unwrap();
//! let exits = world.get_member(hall, "exits").unwrap();
//! assert_eq!(world.format_value(&exits), "[[down, cellar]]");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builtins;
pub mod command;
pub mod config;
mod defaults;
pub mod dispatch;
mod interp;
pub mod loader;
mod resolve;
mod scheduler;
pub mod task;
pub mod update;
pub mod world;

pub use builtins::names as builtin_names;
pub use config::EngineConfig;
pub use dispatch::DispatchResult;
pub use loader::{LoadErrors, START_EVENT, load_source, load_world};
pub use task::{TaskId, TaskState, WakeCondition};
pub use update::Update;
pub use world::World;
