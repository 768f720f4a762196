//! Lanthorn - scripting runtime for shared text worlds
//!
//! This crate re-exports all layers of the Lanthorn system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: lanthorn_runtime    - CLI, console, snapshot files
//! Layer 3: lanthorn_engine     - Evaluator, scheduler, dispatcher, loader
//! Layer 2: lanthorn_storage    - Values, scopes, entities, registry
//! Layer 1: lanthorn_language   - Lexer, parser, printer, noun phrases
//! Layer 0: lanthorn_foundation - Core types (EntityId, Error, Interner)
//! ```

pub use lanthorn_engine as engine;
pub use lanthorn_foundation as foundation;
pub use lanthorn_language as language;
pub use lanthorn_runtime as runtime;
pub use lanthorn_storage as storage;
