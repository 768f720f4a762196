//! Integration tests for Layer 2: Storage
//!
//! Tests for the registry, prototype delegation, containment, scopes, and
//! snapshots.

mod registry;
mod scopes;
mod snapshots;
