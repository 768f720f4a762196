//! Integration tests for Layer 3: Engine
//!
//! Tests for world loading, dispatch, the scheduler, player commands, and
//! expression evaluation.

mod commands;
mod dispatch;
mod evaluation;
mod loading;
mod scheduling;

use lanthorn_engine::{EngineConfig, Update, World, load_source};

/// Loads a world that is expected to load cleanly.
pub fn world(source: &str) -> World {
    let (world, skipped) = load_source(source, EngineConfig::testing()).unwrap();
    assert!(skipped.is_empty(), "skipped declarations: {skipped:?}");
    world
}

/// The text of every message and broadcast in `updates`.
pub fn texts(updates: &[Update]) -> Vec<String> {
    updates
        .iter()
        .filter(|u| matches!(u, Update::Message { .. } | Update::Broadcast { .. }))
        .filter_map(Update::text)
        .map(str::to_string)
        .collect()
}
