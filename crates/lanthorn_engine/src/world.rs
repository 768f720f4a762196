//! The live world: registry, task table, clock, and pending updates.
//!
//! A [`World`] is created by the loader and then driven by its host through
//! three entry points: [`World::submit_command`] for player input,
//! [`World::advance_tick`] for the passage of time, and
//! [`World::resume_task`] for answers to script requests. Everything in
//! between runs on the calling thread, one task at a time.

use std::fmt;

use lanthorn_foundation::{EntityId, Error, Result, SymbolId};
use lanthorn_language::parse_expr;
use lanthorn_storage::{Entity, Kind, Registry, Scope, SnapshotValue, Value, WorldSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, warn};

use crate::command::{CommandTable, DIRECTIONS};
use crate::config::EngineConfig;
use crate::interp::{Ctx, Execution, Outcome, Suspension};
use crate::loader::PendingFields;
use crate::scheduler::Scheduler;
use crate::task::{Task, TaskId, TaskState, WakeCondition};
use crate::update::Update;

/// A running world.
pub struct World {
    pub(crate) registry: Registry,
    pub(crate) scheduler: Scheduler,
    pub(crate) config: EngineConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) updates: Vec<Update>,
    /// Direction constants, sealed; every handler scope is a child of this one.
    pub(crate) globals: Scope,
    pub(crate) commands: CommandTable,
    /// Steps charged in the current run.
    pub(crate) steps: u64,
    /// Nested calls and dispatches in the current run.
    pub(crate) depth: usize,
    /// Member initializers still to evaluate, while the loader binds them.
    pub(crate) binding: Option<PendingFields>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = Registry::new();
        let globals = Scope::root();
        for direction in DIRECTIONS {
            globals.define(direction, Value::Symbol(registry.intern(direction)));
        }
        globals.seal();
        Self {
            registry,
            scheduler: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            updates: Vec::new(),
            globals,
            commands: CommandTable::with_builtins(),
            steps: 0,
            depth: 0,
            binding: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The entity registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration this world runs with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    /// Resolves an identifier.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.registry.lookup(name)
    }

    /// Reads a member through native accessors and the prototype chain.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn get_member(&self, id: EntityId, name: &str) -> Result<Value> {
        self.registry.get_member(id, name)
    }

    /// Writes a member. Writing `location` moves the entity.
    ///
    /// # Errors
    /// Returns the accessor's error, or `EntityNotFound`.
    pub fn set_member(&mut self, id: EntityId, name: &str, value: Value) -> Result<()> {
        self.write_member(id, name, value)
    }

    /// Renders a value the way scripts see it.
    #[must_use]
    pub fn format_value(&self, value: &Value) -> String {
        value.display(&self.registry).to_string()
    }

    /// The name of an interned symbol.
    #[must_use]
    pub fn symbol_name(&self, symbol: SymbolId) -> String {
        self.registry
            .interner()
            .resolve(symbol)
            .map_or_else(|| format!("#{}", symbol.index()), str::to_string)
    }

    /// The innermost location around `id`, excluding `id` itself.
    #[must_use]
    pub fn enclosing_location(&self, id: EntityId) -> Option<EntityId> {
        let mut current = self.registry.get(id).and_then(Entity::location);
        let mut steps = 0;
        while let Some(container) = current {
            let entity = self.registry.get(container)?;
            if entity.kind() == Kind::Location {
                return Some(container);
            }
            steps += 1;
            if steps > self.registry.len() {
                return None;
            }
            current = entity.location();
        }
        None
    }

    /// A plain-data copy of every entity's state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.registry, self.tick())
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Number of live tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Tasks whose subject is `entity`, oldest first.
    #[must_use]
    pub fn tasks_for(&self, entity: EntityId) -> Vec<TaskId> {
        self.scheduler.for_subject(entity)
    }

    /// Every live task, oldest first.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.scheduler.ids()
    }

    /// The state of a live task. `None` once it finished or was cancelled.
    #[must_use]
    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.scheduler.state(id).cloned()
    }

    /// The `<entity>.<event>` label of a live task.
    #[must_use]
    pub fn task_label(&self, id: TaskId) -> Option<&str> {
        self.scheduler.label(id)
    }

    /// Answers a task parked on `await request(...)`. It continues on the
    /// next tick with `value` as the result of its `await`.
    ///
    /// Returns false if the task is gone or was not waiting for an answer.
    pub fn resume_task(&mut self, id: TaskId, value: Value) -> bool {
        let resumed = self.scheduler.resume_external(id, value);
        debug!(task = %id, resumed, "external resume");
        resumed
    }

    /// Parks a suspended execution as a new task.
    pub(crate) fn park(
        &mut self,
        exec: Execution,
        suspension: Suspension,
        subject: Option<EntityId>,
        actor: Option<EntityId>,
        label: String,
    ) -> TaskId {
        let (state, wake_at) = self.wake_for(&suspension);
        let id = self.scheduler.insert(exec, subject, actor, label, state, wake_at);
        self.request_update(id, &suspension);
        id
    }

    fn wake_for(&self, suspension: &Suspension) -> (TaskState, u64) {
        match suspension {
            Suspension::Sleep(ticks) => {
                let at = self.tick() + ticks;
                (TaskState::Suspended(WakeCondition::At(at)), at)
            }
            Suspension::Signal(signal) => (TaskState::Suspended(WakeCondition::Signal(*signal)), 0),
            Suspension::Request { .. } => (TaskState::Suspended(WakeCondition::External), 0),
        }
    }

    fn request_update(&mut self, task: TaskId, suspension: &Suspension) {
        if let Suspension::Request { kind, payload } = suspension {
            let update = Update::Request {
                task,
                kind: self.symbol_name(*kind),
                payload: SnapshotValue::capture(payload, &self.registry),
            };
            self.emit(update);
        }
    }

    /// Runs a due task to its next suspension, completion, or fault.
    fn run_task(&mut self, id: TaskId) {
        let Some(mut task) = self.scheduler.take(id) else {
            return;
        };
        if task.subject.is_some_and(|s| !self.registry.contains(s)) {
            debug!(task = %id, label = %task.label, "task cancelled");
            return;
        }

        self.begin_run();
        task.state = TaskState::Running;
        let resume_value = task.resume_value.take().unwrap_or(Value::Nil);
        let outcome = self.drive(&mut task.exec, resume_value);

        match outcome {
            Ok(Outcome::Finished(_)) => {
                debug!(task = %id, label = %task.label, "task completed");
            }
            Ok(Outcome::Suspended(suspension)) => {
                let (state, wake_at) = self.wake_for(&suspension);
                debug!(task = %id, label = %task.label, ?state, "task suspended");
                task.state = state;
                task.wake_at = wake_at;
                self.request_update(id, &suspension);
                self.scheduler.restore(task);
            }
            Err(error) => self.task_fault(&task, &error),
        }
    }

    fn drive(&mut self, exec: &mut Execution, resume_value: Value) -> Result<Outcome> {
        self.resume(exec, resume_value)?;
        self.run(exec)
    }

    fn task_fault(&mut self, task: &Task, error: &Error) {
        let message = self.fault_message(error);
        warn!(task = %task.id, label = %task.label, category = %error.category(), error = %message, "task aborted");
        self.emit(Update::Fault {
            task: Some(task.id),
            actor: task.actor,
            message,
        });
    }

    /// A fault description with the operation and source position.
    pub(crate) fn fault_message(&self, error: &Error) -> String {
        match &error.context {
            Some(context) if context.source.is_some() || context.line.is_some() => {
                format!("{} ({context})", error.kind)
            }
            _ => error.kind.to_string(),
        }
    }

    /// Advances the clock one tick.
    ///
    /// Entities whose lifetime ended are removed first; then every due task
    /// runs, earliest wake time first. Returns the updates produced.
    #[instrument(skip_all, fields(tick = self.tick() + 1))]
    pub fn advance_tick(&mut self) -> Vec<Update> {
        let tick = self.scheduler.advance();

        for id in self.registry.expired(tick) {
            if !self.registry.contains(id) {
                continue;
            }
            debug!(entity = %self.registry.name_of(id), "lifetime ended");
            if let Err(error) = self.remove_entity(id) {
                warn!(%error, "expiry failed");
            }
        }

        let due = self.scheduler.due(tick);
        for id in due {
            self.run_task(id);
        }
        self.take_updates()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an avatar from `prototype`, placed in `location`.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if either entity does not resolve.
    pub fn spawn_avatar(&mut self, prototype: EntityId, location: Option<EntityId>) -> Result<EntityId> {
        let avatar = self.registry.spawn(prototype, location)?;
        self.registry.set_kind(avatar, Kind::Avatar)?;
        debug!(avatar = %self.registry.name_of(avatar), "avatar spawned");
        self.emit(Update::Spawned {
            entity: avatar,
            prototype,
        });
        Ok(avatar)
    }

    /// Removes an entity and its contents and cancels their tasks.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<()> {
        let removed = self.registry.remove(id)?;
        let ids: Vec<EntityId> = removed.iter().map(Entity::id).collect();
        for entity in &removed {
            self.emit(Update::Removed {
                entity: entity.id(),
                name: entity.name().to_string(),
            });
        }
        let cancelled = self.scheduler.cancel_subjects(&ids);
        debug!(removed = ids.len(), cancelled = cancelled.len(), "entity removed");
        Ok(())
    }

    /// Moves an entity, recording the move if it changed anything.
    pub(crate) fn relocate(&mut self, entity: EntityId, destination: Option<EntityId>) -> Result<()> {
        let from = self.registry.entity(entity)?.location();
        self.registry.move_entity(entity, destination)?;
        if from != destination {
            self.emit(Update::Moved {
                entity,
                from,
                to: destination,
            });
        }
        Ok(())
    }

    /// Member assignment from scripts.
    pub(crate) fn write_member(&mut self, entity: EntityId, member: &str, value: Value) -> Result<()> {
        if member == "location" {
            let destination = match value {
                Value::Nil => None,
                other => Some(self.expect_entity(&other)?),
            };
            return self.relocate(entity, destination);
        }
        self.registry.set_member(entity, member, value)
    }

    // =========================================================================
    // Updates and evaluation
    // =========================================================================

    pub(crate) fn emit(&mut self, update: Update) {
        self.updates.push(update);
    }

    /// Every verb `submit_command` understands, sorted.
    #[must_use]
    pub fn verbs(&self) -> Vec<String> {
        self.commands.verbs()
    }

    /// Drains the updates produced since the last call.
    pub fn take_updates(&mut self) -> Vec<Update> {
        std::mem::take(&mut self.updates)
    }

    /// Evaluates one expression against the world, outside any handler.
    ///
    /// # Errors
    /// Returns a parse error or the expression's runtime fault.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        let expr = parse_expr(source)?;
        self.begin_run();
        let ctx = Ctx::new(self.globals.child(), None);
        self.eval(&ctx, &expr)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick())
            .field("entities", &self.registry.len())
            .field("tasks", &self.scheduler.len())
            .field("verbs", &self.commands.len())
            .finish_non_exhaustive()
    }
}
