//! One avatar's view of a running world.
//!
//! A [`Session`] submits the avatar's commands, turns the clock, and renders
//! the updates the avatar is entitled to see as lines of text. Requests from
//! scripts are listed so the host can answer them.

use std::fmt::Write as _;

use lanthorn_engine::{TaskId, Update, World};
use lanthorn_foundation::{EntityId, Error, Result};
use lanthorn_storage::{Entity, SnapshotValue};
use tracing::debug;

/// How many ticks pass after each command by default.
pub const DEFAULT_TICKS_PER_COMMAND: u64 = 1;

/// A world plus the avatar a person is playing.
#[derive(Debug)]
pub struct Session {
    world: World,
    avatar: EntityId,
    ticks_per_command: u64,
    pending: Vec<TaskId>,
}

impl Session {
    /// Plays `avatar` in `world`.
    #[must_use]
    pub fn new(world: World, avatar: EntityId) -> Self {
        Self {
            world,
            avatar,
            ticks_per_command: DEFAULT_TICKS_PER_COMMAND,
            pending: Vec::new(),
        }
    }

    /// Spawns an avatar from the prototype named `prototype` and plays it.
    ///
    /// The avatar starts in the location named `start`, or else wherever the
    /// prototype itself is placed.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedSymbol` if either name does not resolve.
    pub fn join(mut world: World, prototype: &str, start: Option<&str>) -> Result<Self> {
        let proto = world
            .lookup(prototype)
            .ok_or_else(|| Error::undefined_symbol(prototype))?;
        let location = match start {
            Some(name) => Some(world.lookup(name).ok_or_else(|| Error::undefined_symbol(name))?),
            None => world.registry().get(proto).and_then(Entity::location),
        };
        let avatar = world.spawn_avatar(proto, location)?;
        world.take_updates();
        Ok(Self::new(world, avatar))
    }

    /// Sets how many ticks pass after each command. Zero stops the clock.
    #[must_use]
    pub fn with_ticks_per_command(mut self, ticks: u64) -> Self {
        self.ticks_per_command = ticks;
        self
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The avatar.
    #[must_use]
    pub fn avatar(&self) -> EntityId {
        self.avatar
    }

    /// Requests still waiting for an answer.
    #[must_use]
    pub fn pending_requests(&self) -> &[TaskId] {
        &self.pending
    }

    /// Submits a command, then lets the configured number of ticks pass.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the avatar no longer exists.
    pub fn submit(&mut self, line: &str) -> Result<Vec<String>> {
        let updates = self.world.submit_command(self.avatar, line)?;
        let mut lines = self.render(&updates);
        lines.extend(self.advance(self.ticks_per_command));
        Ok(lines)
    }

    /// Advances the clock `ticks` times and renders what the avatar sees.
    pub fn advance(&mut self, ticks: u64) -> Vec<String> {
        let mut lines = Vec::new();
        for _ in 0..ticks {
            let updates = self.world.advance_tick();
            lines.extend(self.render(&updates));
        }
        lines
    }

    /// Answers a waiting request with the value of `expression`.
    ///
    /// Returns `false` if `task` was not waiting.
    ///
    /// # Errors
    ///
    /// Returns the parse or runtime error of `expression`.
    pub fn answer(&mut self, task: TaskId, expression: &str) -> Result<bool> {
        let value = self.world.evaluate(expression)?;
        let resumed = self.world.resume_task(task, value);
        if resumed {
            self.pending.retain(|t| *t != task);
        }
        debug!(%task, resumed, "request answered");
        Ok(resumed)
    }

    /// Text for the updates the avatar can see, in order.
    ///
    /// Requests are always shown and remembered as pending.
    pub fn render(&mut self, updates: &[Update]) -> Vec<String> {
        let location = self.world.enclosing_location(self.avatar);
        let mut lines = Vec::new();
        for update in updates {
            match update {
                Update::Request { task, kind, payload } => {
                    self.pending.push(*task);
                    lines.push(format!("[{task} requests {kind}: {}]", describe(payload)));
                }
                Update::Removed { entity, .. } if *entity == self.avatar => {
                    lines.push("[your avatar is gone]".to_string());
                }
                Update::Fault { message, .. } if update.is_visible_to(self.avatar, location) => {
                    lines.push(format!("[error] {message}"));
                }
                _ if update.is_visible_to(self.avatar, location) => {
                    if let Some(text) = update.text() {
                        lines.push(text.to_string());
                    }
                }
                _ => {}
            }
        }
        lines
    }
}

/// Short human-readable form of a request payload.
fn describe(value: &SnapshotValue) -> String {
    match value {
        SnapshotValue::Nil => "nil".to_string(),
        SnapshotValue::Bool(b) => b.to_string(),
        SnapshotValue::Number(n) => n.to_string(),
        SnapshotValue::Text(s) => format!("\"{s}\""),
        SnapshotValue::Symbol(s) => format!("#{s}"),
        SnapshotValue::Closure(name) => format!("<fn {name}>"),
        SnapshotValue::Entity(Some(id)) => id.clone(),
        SnapshotValue::Entity(None) => "<removed>".to_string(),
        SnapshotValue::List(items) => {
            let mut out = String::from("[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}", describe(item));
            }
            out.push(']');
            out
        }
    }
}
