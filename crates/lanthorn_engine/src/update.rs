//! Structured records of what changed in the world.
//!
//! Updates are plain data. The world appends them as scripts run, and
//! [`World::submit_command`](crate::World::submit_command) and
//! [`World::advance_tick`](crate::World::advance_tick) hand them back in the
//! order they happened. Rendering and transport belong to the caller.

use lanthorn_foundation::EntityId;
use lanthorn_storage::SnapshotValue;

use crate::task::TaskId;

/// One observable change.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// Text for one entity (usually an avatar).
    Message {
        /// Recipient.
        to: EntityId,
        /// Message text.
        text: String,
    },
    /// Text for everyone in a location.
    Broadcast {
        /// Location whose occupants hear it.
        location: EntityId,
        /// Message text.
        text: String,
        /// An occupant who does not hear it.
        except: Option<EntityId>,
    },
    /// An entity changed container.
    Moved {
        /// The moved entity.
        entity: EntityId,
        /// Previous container.
        from: Option<EntityId>,
        /// New container.
        to: Option<EntityId>,
    },
    /// An entity was created at runtime.
    Spawned {
        /// The new entity.
        entity: EntityId,
        /// Its prototype.
        prototype: EntityId,
    },
    /// An entity was removed.
    Removed {
        /// The removed entity. It no longer resolves.
        entity: EntityId,
        /// Its identifier at removal time.
        name: String,
    },
    /// An exit appeared.
    ExitAdded {
        /// Location the exit leaves from.
        location: EntityId,
        /// Direction name.
        direction: String,
        /// Where it leads.
        destination: EntityId,
    },
    /// An exit disappeared.
    ExitRemoved {
        /// Location the exit left from.
        location: EntityId,
        /// Direction name.
        direction: String,
        /// Where it led.
        destination: EntityId,
    },
    /// A task or command aborted.
    Fault {
        /// The aborted task, if the fault happened inside one.
        task: Option<TaskId>,
        /// The entity whose action triggered it.
        actor: Option<EntityId>,
        /// Human-readable description including the operation and position.
        message: String,
    },
    /// A task is waiting for the host to answer a request.
    ///
    /// Answer with [`World::resume_task`](crate::World::resume_task).
    Request {
        /// The waiting task.
        task: TaskId,
        /// Request kind (the symbol's name).
        kind: String,
        /// Request payload.
        payload: SnapshotValue,
    },
}

impl Update {
    /// True if `viewer`, standing in `location`, should see this update.
    #[must_use]
    pub fn is_visible_to(&self, viewer: EntityId, location: Option<EntityId>) -> bool {
        match self {
            Self::Message { to, .. } => *to == viewer,
            Self::Broadcast {
                location: at,
                except,
                ..
            } => Some(*at) == location && *except != Some(viewer),
            Self::Fault { actor, .. } => actor.is_none_or(|a| a == viewer),
            _ => false,
        }
    }

    /// The text carried by message-like updates.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } | Self::Broadcast { text, .. } => Some(text),
            Self::Fault { message, .. } => Some(message),
            _ => None,
        }
    }
}
