//! Building a [`World`] from declarations.
//!
//! Loading happens in two phases. Phase 1 registers every identifier and
//! links prototypes before any expression is evaluated, so declarations may
//! refer to each other in any order; it then binds member initializers,
//! each one no later than the first read of it.
//! Phase 2 runs `init` blocks once each and schedules `startWorld` handlers
//! to begin on the first tick.
//!
//! ```text
//! register ─▶ link prototypes ─▶ attach handlers ─▶ check names
//!     ─▶ bind fields ─▶ derive kinds ─▶ commands ─▶ init blocks ─▶ startWorld
//! ```
//!
//! Errors are collected per stage; a stage with errors stops the load and no
//! world is returned.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use lanthorn_foundation::{EntityId, Error, ErrorKind};
use lanthorn_language::{Block, DeclKind, Declaration, Expr, Handler, HandlerKind, Item, Span, parse_recovering};
use lanthorn_storage::{Kind, Registry, Value};
use thiserror::Error as ThisError;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::interp::{Ctx, Execution, Outcome};
use crate::resolve::unresolved_references;
use crate::task::TaskState;
use crate::world::World;

/// The event whose `when` handlers start running on the first tick.
pub const START_EVENT: &str = "startWorld";

/// Every error that stopped a world from loading. Never empty.
#[derive(Debug, Clone, ThisError)]
#[error("{}", summary(.0))]
pub struct LoadErrors(pub Vec<Error>);

fn summary(errors: &[Error]) -> String {
    match errors {
        [one] => one.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
        [] => "world failed to load".to_string(),
    }
}

impl LoadErrors {
    /// The collected errors, in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.0
    }
}

impl IntoIterator for LoadErrors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A declaration and the `extend` blocks merged into it.
struct Entry<'a> {
    id: EntityId,
    def: &'a Declaration,
    extensions: Vec<&'a Declaration>,
}

impl<'a> Entry<'a> {
    fn parts(&self) -> impl Iterator<Item = &'a Declaration> + '_ {
        std::iter::once(self.def).chain(self.extensions.iter().copied())
    }

    fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Expr)> + '_ {
        self.parts().flat_map(Declaration::fields)
    }

    fn init_blocks(&self) -> impl Iterator<Item = &'a Block> + '_ {
        self.parts().flat_map(Declaration::init_blocks)
    }

    fn requires(&self) -> impl Iterator<Item = &'a String> + '_ {
        self.parts().flat_map(|d| d.requires.iter())
    }

    /// The last prototype named by the declaration or an extension.
    fn prototype(&self) -> Option<&'a str> {
        self.parts().filter_map(|d| d.prototype.as_deref()).last()
    }

    /// True if the kind does not come from the prototype.
    fn has_own_kind(&self) -> bool {
        self.def.kind != DeclKind::Entity || self.fields().any(|(name, _)| name == "kind")
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.def.name)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

fn positioned(error: Error, span: Span) -> Error {
    error.at(span.line, span.column)
}

/// Member initializers not yet evaluated, keyed by owner and member name.
#[derive(Debug, Default)]
pub(crate) struct PendingFields {
    fields: HashMap<(EntityId, String), Vec<Expr>>,
    /// Members being bound right now, outermost first.
    active: Vec<(EntityId, String)>,
    failed: Vec<(EntityId, Span, Error)>,
}

impl PendingFields {
    fn cycle_through(&self, key: &(EntityId, String), registry: &Registry) -> Vec<String> {
        let start = self.active.iter().position(|k| k == key).unwrap_or(0);
        self.active[start..]
            .iter()
            .chain(std::iter::once(key))
            .map(|(id, name)| format!("{}.{name}", registry.name_of(*id)))
            .collect()
    }
}

/// The stored member a native accessor derives its value from.
fn source_member(name: &str) -> &str {
    match name {
        "singular" | "plural" | "article" | "indefinite" => "name",
        other => other,
    }
}

impl World {
    /// Reads a member. While the loader binds initializers, one that has not
    /// been evaluated yet is evaluated first.
    pub(crate) fn read_member(&mut self, id: EntityId, name: &str) -> lanthorn_foundation::Result<Value> {
        self.bind_pending(id, name)?;
        self.registry.get_member(id, name)
    }

    /// Binds the initializer that a read of `id.name` would see, if it is
    /// still pending.
    ///
    /// # Errors
    /// Returns `CyclicMemberBinding` if that initializer is already being
    /// evaluated further up. Other initializer failures are recorded and
    /// leave the member unbound.
    pub(crate) fn bind_pending(&mut self, id: EntityId, name: &str) -> lanthorn_foundation::Result<()> {
        if self.binding.is_none() {
            return Ok(());
        }
        let name = source_member(name);
        for owner in self.registry.prototype_chain(id) {
            let key = (owner, name.to_string());
            let Some(pending) = &self.binding else {
                return Ok(());
            };
            if pending.active.contains(&key) {
                let cycle = pending.cycle_through(&key, &self.registry);
                return Err(Error::new(ErrorKind::CyclicMemberBinding { cycle }));
            }
            let waiting = pending.fields.contains_key(&key);
            if waiting {
                return self.bind_field(key);
            }
            let owns = self.registry.get(owner).is_some_and(|e| e.own_member(name).is_some());
            if owns {
                return Ok(());
            }
        }
        Ok(())
    }

    fn bind_field(&mut self, key: (EntityId, String)) -> lanthorn_foundation::Result<()> {
        let Some(pending) = self.binding.as_mut() else {
            return Ok(());
        };
        let exprs = pending.fields.remove(&key).unwrap_or_default();
        pending.active.push(key.clone());
        let (owner, name) = key;
        let mut outcome = Ok(());
        for expr in &exprs {
            let ctx = Ctx::new(self.globals.child(), Some(owner));
            let bound = self
                .eval(&ctx, expr)
                .and_then(|value| self.write_member(owner, &name, value));
            match bound {
                Ok(()) => {}
                Err(error) if matches!(error.kind, ErrorKind::CyclicMemberBinding { .. }) => {
                    outcome = Err(error);
                    break;
                }
                Err(error) => {
                    if let Some(pending) = self.binding.as_mut() {
                        pending.failed.push((owner, expr.span(), error.in_operation(name.as_str())));
                    }
                }
            }
        }
        if let Some(pending) = self.binding.as_mut() {
            pending.active.pop();
        }
        outcome
    }
}

struct Loader<'a> {
    world: World,
    entries: Vec<Entry<'a>>,
    errors: Vec<Error>,
}

impl<'a> Loader<'a> {
    fn new(config: EngineConfig) -> Self {
        Self {
            world: World::new(config),
            entries: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn check(&mut self) -> Result<(), LoadErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(LoadErrors(std::mem::take(&mut self.errors)))
        }
    }

    fn initializer_fault(&self, declaration: &str, error: &Error) -> Error {
        Error::new(ErrorKind::InitializerFault {
            declaration: declaration.to_string(),
            message: self.world.fault_message(error),
        })
    }

    // =========================================================================
    // Phase 1
    // =========================================================================

    fn register(&mut self, items: &'a [Item]) {
        let mut extends = Vec::new();
        for item in items {
            match item {
                Item::Include(path, _) => {
                    warn!(%path, "include left unresolved; includes are expanded before loading");
                }
                Item::Declaration(decl) if decl.extend => extends.push(decl),
                Item::Declaration(decl) => {
                    let kind = Kind::from_declaration(decl.kind).unwrap_or(Kind::Thing);
                    match self.world.registry.insert(&decl.name, kind, None) {
                        Ok(id) => self.entries.push(Entry {
                            id,
                            def: decl,
                            extensions: Vec::new(),
                        }),
                        Err(error) => self.errors.push(positioned(error, decl.span)),
                    }
                }
            }
        }

        let index: HashMap<&str, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.def.name.as_str(), i))
            .collect();
        for decl in extends {
            match index.get(decl.name.as_str()) {
                Some(&i) => self.entries[i].extensions.push(decl),
                None => self.errors.push(positioned(
                    Error::new(ErrorKind::ExtendUndeclared(decl.name.clone())),
                    decl.span,
                )),
            }
        }
        info!(declarations = self.entries.len(), "declarations registered");
    }

    fn link_prototypes(&mut self) {
        for entry in &self.entries {
            let Some(name) = entry.prototype() else {
                continue;
            };
            let Some(prototype) = self.world.registry.lookup(name) else {
                self.errors.push(positioned(
                    Error::new(ErrorKind::UnknownPrototype {
                        declaration: entry.def.name.clone(),
                        prototype: name.to_string(),
                    }),
                    entry.def.span,
                ));
                continue;
            };
            if let Err(error) = self.world.registry.set_prototype(entry.id, Some(prototype)) {
                self.errors.push(positioned(error, entry.def.span));
            }
        }
    }

    fn attach_handlers(&mut self) {
        for entry in &self.entries {
            for handler in entry.parts().flat_map(Declaration::handlers) {
                if let Err(error) = self.world.registry.add_handler(entry.id, Arc::new(handler.clone())) {
                    self.errors.push(error);
                }
            }
        }
    }

    fn check_references(&mut self) {
        for entry in &self.entries {
            for decl in entry.parts() {
                self.errors.extend(unresolved_references(&self.world.registry, decl));
            }
        }
    }

    /// Evaluates member initializers. An initializer that reads a member not
    /// yet bound binds that one first, so declaration order does not matter.
    /// World-changing built-ins are refused here; they belong in `init` blocks.
    fn bind_fields(&mut self) {
        let mut pending = PendingFields::default();
        for entry in &self.entries {
            for (name, expr) in entry.fields() {
                let key = (entry.id, name.to_string());
                pending.fields.entry(key).or_default().push(expr.clone());
            }
        }
        self.world.binding = Some(pending);
        for entry in &self.entries {
            for (name, expr) in entry.fields() {
                self.world.begin_run();
                if let Err(error) = self.world.bind_pending(entry.id, name) {
                    self.errors.push(positioned(error, expr.span()));
                }
            }
        }
        let failed = self.world.binding.take().map(|p| p.failed).unwrap_or_default();
        for (id, span, error) in failed {
            let fault = self.initializer_fault(&self.world.registry.name_of(id), &error);
            self.errors.push(positioned(fault, span));
        }
        let discarded = self.world.take_updates().len();
        debug!(discarded, "member binding complete");
    }

    /// `entity` declarations without a `kind` member take the kind of the
    /// nearest ancestor that has its own, or stay things.
    fn derive_kinds(&mut self) {
        let own: HashSet<EntityId> = self
            .entries
            .iter()
            .filter(|e| e.has_own_kind())
            .map(|e| e.id)
            .collect();
        for entry in self.entries.iter().filter(|e| !e.has_own_kind()) {
            let registry = &self.world.registry;
            let kind = registry
                .prototype_chain(entry.id)
                .into_iter()
                .skip(1)
                .find(|ancestor| own.contains(ancestor))
                .and_then(|ancestor| registry.get(ancestor))
                .map_or(Kind::Thing, |ancestor| ancestor.kind());
            if let Err(error) = self.world.registry.set_kind(entry.id, kind) {
                self.errors.push(error);
            }
        }
    }

    fn register_commands(&mut self) {
        let commands: Vec<EntityId> = self
            .entries
            .iter()
            .map(|e| e.id)
            .filter(|&id| self.world.registry.get(id).is_some_and(|e| e.kind() == Kind::Command))
            .collect();
        for id in commands {
            self.world.register_command(id);
        }
    }

    // =========================================================================
    // Phase 2
    // =========================================================================

    /// Declaration order, except that a declaration runs after everything
    /// it `requires`.
    fn init_order(&mut self) -> Vec<usize> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            i: usize,
            entries: &[Entry<'_>],
            index: &HashMap<&str, usize>,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
            order: &mut Vec<usize>,
            errors: &mut Vec<Error>,
        ) {
            match marks[i] {
                Mark::Done => return,
                Mark::Active => {
                    let start = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|&p| entries[p].def.name.clone()).collect();
                    cycle.push(entries[i].def.name.clone());
                    errors.push(positioned(
                        Error::new(ErrorKind::CyclicInitOrder { cycle }),
                        entries[i].def.span,
                    ));
                    return;
                }
                Mark::New => {}
            }
            marks[i] = Mark::Active;
            path.push(i);
            for name in entries[i].requires() {
                match index.get(name.as_str()) {
                    Some(&dep) => visit(dep, entries, index, marks, path, order, errors),
                    None => errors.push(positioned(
                        Error::new(ErrorKind::UnresolvedReference {
                            name: name.clone(),
                            in_declaration: entries[i].def.name.clone(),
                        }),
                        entries[i].def.span,
                    )),
                }
            }
            path.pop();
            marks[i] = Mark::Done;
            order.push(i);
        }

        let index: HashMap<&str, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.def.name.as_str(), i))
            .collect();
        let mut marks = vec![Mark::New; self.entries.len()];
        let mut order = Vec::with_capacity(self.entries.len());
        for i in 0..self.entries.len() {
            visit(
                i,
                &self.entries,
                &index,
                &mut marks,
                &mut Vec::new(),
                &mut order,
                &mut self.errors,
            );
        }
        order
    }

    fn run_init_blocks(&mut self) {
        let order = self.init_order();
        if !self.errors.is_empty() {
            return;
        }
        for i in order {
            let (id, name) = (self.entries[i].id, self.entries[i].def.name.clone());
            let blocks: Vec<&Block> = self.entries[i].init_blocks().collect();
            for block in blocks {
                self.world.begin_run();
                let mut exec = Execution::new(block, self.world.globals.child(), Some(id));
                match self.world.run(&mut exec) {
                    Ok(Outcome::Finished(_)) => {}
                    Ok(Outcome::Suspended(suspension)) => {
                        let task = self.world.park(exec, suspension, Some(id), None, format!("{name}.init"));
                        debug!(%task, declaration = %name, "init block suspended");
                    }
                    Err(error) => {
                        let fault = self.initializer_fault(&name, &error);
                        self.errors.push(positioned(fault, block.span));
                    }
                }
            }
        }
    }

    /// Each declaration's own `when startWorld` handlers become tasks that
    /// first run on tick 1. A guard is checked now, with no arguments.
    fn schedule_start(&mut self) {
        let starts: Vec<(EntityId, String, Arc<Handler>)> = self
            .entries
            .iter()
            .filter_map(|e| self.world.registry.get(e.id).map(|entity| (e, entity)))
            .flat_map(|(e, entity)| {
                entity
                    .handlers_for(START_EVENT, HandlerKind::When)
                    .map(move |h| (e.id, e.def.name.clone(), Arc::clone(h)))
            })
            .collect();

        let first_tick = self.world.tick() + 1;
        for (id, name, handler) in starts {
            let scope = self.world.globals.child();
            for param in &handler.params {
                scope.define(param.clone(), Value::Nil);
            }
            if let Some(guard) = &handler.guard {
                self.world.begin_run();
                let ctx = Ctx::new(scope.clone(), Some(id));
                match self.world.eval(&ctx, guard) {
                    Ok(value) if value.is_truthy() => {}
                    Ok(_) => continue,
                    Err(error) => {
                        let fault = self.initializer_fault(&name, &error);
                        self.errors.push(positioned(fault, handler.span));
                        continue;
                    }
                }
            }
            let exec = Execution::new(&handler.body, scope, Some(id));
            self.world.scheduler.insert(
                exec,
                Some(id),
                None,
                format!("{name}.{START_EVENT}"),
                TaskState::Ready,
                first_tick,
            );
        }
    }
}

/// Builds a world from parsed items.
///
/// `include` items are ignored; the runtime expands them before loading.
///
/// # Errors
/// Returns every duplicate identifier, unknown or cyclic prototype,
/// unresolved name, cyclic `requires` chain, and failed initializer found.
#[instrument(skip_all, fields(items = items.len()))]
pub fn load_world(items: &[Item], config: EngineConfig) -> Result<World, LoadErrors> {
    let mut loader = Loader::new(config);
    loader.register(items);
    loader.check()?;
    loader.link_prototypes();
    loader.attach_handlers();
    loader.check_references();
    loader.check()?;

    loader.derive_kinds();
    loader.bind_fields();
    loader.derive_kinds();
    loader.check()?;
    loader.register_commands();

    loader.run_init_blocks();
    loader.check()?;
    loader.schedule_start();
    loader.check()?;

    let world = loader.world;
    info!(
        entities = world.registry.len(),
        tasks = world.task_count(),
        "world loaded"
    );
    Ok(world)
}

/// Parses and loads one source text.
///
/// Malformed declarations are skipped and returned alongside the world.
///
/// # Errors
/// Returns the load errors of the declarations that did parse.
pub fn load_source(source: &str, config: EngineConfig) -> Result<(World, Vec<Error>), LoadErrors> {
    let (items, parse_errors) = parse_recovering(source);
    for error in &parse_errors {
        warn!(%error, "declaration skipped");
    }
    let world = load_world(&items, config)?;
    Ok((world, parse_errors))
}
