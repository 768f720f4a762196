//! Event dispatch.
//!
//! An event on a target collects handlers from a fixed list of participants:
//!
//! 1. the target itself,
//! 2. the nearest location enclosing the target,
//! 3. that location's `region`,
//! 4. the `event` or `command` declaration named like the event.
//!
//! Each participant contributes its prototype chain, nearest first. The
//! phases then run in order:
//!
//! ```text
//! allow ──refused──▶ vetoed (nothing else runs)
//!   │
//! before ──#cancel──▶ default skipped, remaining befores run
//!   │    ──#halt────▶ default and after skipped, remaining befores skipped
//!   │
//! default (nearest passing `when`, else the built-in action)
//!   │
//! after
//! ```
//!
//! A handler that suspends is parked as its own task; the dispatch that
//! started it carries on as if the handler had returned nil.

use std::sync::Arc;

use lanthorn_foundation::{EntityId, Result, SymbolId};
use lanthorn_language::{Handler, HandlerKind};
use lanthorn_storage::{Kind, Value};
use tracing::trace;

use crate::defaults;
use crate::interp::{Ctx, Execution, Outcome};
use crate::update::Update;
use crate::world::World;

/// Outcome of dispatching one event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// True unless an `allow` handler refused or a `before` handler cancelled.
    pub performed: bool,
    /// The participant whose `allow` handler refused.
    pub vetoed_by: Option<EntityId>,
    /// True if a `before` handler returned `#cancel` or `#halt`.
    pub cancelled: bool,
}

impl DispatchResult {
    fn vetoed(by: EntityId) -> Self {
        Self {
            performed: false,
            vetoed_by: Some(by),
            cancelled: false,
        }
    }
}

/// One handler in dispatch order: the participant it runs for (its `self`)
/// and the handler itself.
type Entry = (EntityId, Arc<Handler>);

impl World {
    /// Dispatches `event` on `target`.
    ///
    /// `args` are bound positionally to each handler's parameters.
    ///
    /// # Errors
    /// Returns the first fault raised by a handler, or `EntityNotFound` if
    /// `target` does not resolve.
    pub fn dispatch(
        &mut self,
        event: &str,
        target: EntityId,
        actor: Option<EntityId>,
        args: Vec<Value>,
    ) -> Result<DispatchResult> {
        self.begin_run();
        self.dispatch_event(event, target, actor, args)
    }

    /// Dispatch from inside a running script; shares the caller's budget.
    pub(crate) fn dispatch_event(
        &mut self,
        event: &str,
        target: EntityId,
        actor: Option<EntityId>,
        args: Vec<Value>,
    ) -> Result<DispatchResult> {
        self.registry.validate(target)?;
        self.enter()?;
        let result = self.run_phases(event, target, actor, &args);
        self.leave();
        result
    }

    /// Entities whose handlers take part in `event` on `target`, in order.
    /// A location target brings its own region, ahead of any enclosing
    /// location and that location's region.
    pub(crate) fn participants(&self, event: &str, target: EntityId) -> Vec<EntityId> {
        let mut out = vec![target];
        if self.registry.get(target).is_some_and(|e| e.kind() == Kind::Location) {
            self.push_region(&mut out, target);
        }
        if let Some(location) = self.enclosing_location(target) {
            out.push(location);
            self.push_region(&mut out, location);
        }
        if let Some(declared) = self.registry.lookup(event) {
            if self
                .registry
                .get(declared)
                .is_some_and(|e| matches!(e.kind(), Kind::Event | Kind::Command))
            {
                out.push(declared);
            }
        }
        let mut seen = Vec::with_capacity(out.len());
        out.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        out
    }

    fn push_region(&self, out: &mut Vec<EntityId>, location: EntityId) {
        if let Some(Value::Entity(region)) = self.registry.lookup_member(location, "region") {
            if self.registry.contains(region) {
                out.push(region);
            }
        }
    }

    fn handlers(&self, participants: &[EntityId], event: &str, kind: HandlerKind) -> Vec<Entry> {
        participants
            .iter()
            .flat_map(|&p| {
                self.registry
                    .handler_chain(p, event, kind)
                    .into_iter()
                    .map(move |(_, handler)| (p, handler))
            })
            .collect()
    }

    fn run_phases(
        &mut self,
        event: &str,
        target: EntityId,
        actor: Option<EntityId>,
        args: &[Value],
    ) -> Result<DispatchResult> {
        let participants = self.participants(event, target);
        self.trace_phase(event, "begin", target);

        for (participant, handler) in self.handlers(&participants, event, HandlerKind::Allow) {
            if !self.registry.contains(participant) {
                continue;
            }
            self.trace_phase(event, "allow", participant);
            let Some(verdict) = self.run_handler(event, participant, &handler, actor, args)? else {
                continue;
            };
            let refused = match &verdict {
                Value::Bool(false) => true,
                Value::Text(reason) => {
                    if let Some(actor) = actor {
                        self.emit(Update::Message {
                            to: actor,
                            text: reason.to_string(),
                        });
                    }
                    true
                }
                _ => false,
            };
            if refused {
                self.trace_phase(event, "vetoed", participant);
                return Ok(DispatchResult::vetoed(participant));
            }
        }

        let mut cancelled = false;
        let mut halted = false;
        for (participant, handler) in self.handlers(&participants, event, HandlerKind::Before) {
            if !self.registry.contains(participant) {
                continue;
            }
            self.trace_phase(event, "before", participant);
            match self.run_handler(event, participant, &handler, actor, args)? {
                Some(Value::Symbol(SymbolId::CANCEL)) => cancelled = true,
                Some(Value::Symbol(SymbolId::HALT)) => {
                    cancelled = true;
                    halted = true;
                    break;
                }
                _ => {}
            }
        }

        if !cancelled {
            let mut handled = false;
            for (participant, handler) in self.handlers(&participants, event, HandlerKind::When) {
                if !self.registry.contains(participant) {
                    continue;
                }
                if self.run_handler(event, participant, &handler, actor, args)?.is_some() {
                    self.trace_phase(event, "when", participant);
                    handled = true;
                    break;
                }
            }
            if !handled && self.registry.contains(target) {
                let builtin = defaults::default_action(self, event, target, actor, args)?;
                if builtin {
                    self.trace_phase(event, "default", target);
                }
            }
        }

        if !halted {
            for (participant, handler) in self.handlers(&participants, event, HandlerKind::After) {
                if !self.registry.contains(participant) {
                    continue;
                }
                self.trace_phase(event, "after", participant);
                self.run_handler(event, participant, &handler, actor, args)?;
            }
        }

        Ok(DispatchResult {
            performed: !cancelled,
            vetoed_by: None,
            cancelled,
        })
    }

    /// Runs one handler for `participant`. `None` if its guard failed.
    fn run_handler(
        &mut self,
        event: &str,
        participant: EntityId,
        handler: &Handler,
        actor: Option<EntityId>,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let scope = self.globals.child();
        for (i, param) in handler.params.iter().enumerate() {
            scope.define(param.clone(), args.get(i).cloned().unwrap_or(Value::Nil));
        }
        let ctx = Ctx::new(scope.clone(), Some(participant));
        if let Some(guard) = &handler.guard {
            if !self.eval(&ctx, guard)?.is_truthy() {
                return Ok(None);
            }
        }

        self.enter()?;
        let mut exec = Execution::new(&handler.body, scope, Some(participant));
        let outcome = self.run(&mut exec);
        self.leave();

        match outcome? {
            Outcome::Finished(value) => Ok(Some(value)),
            Outcome::Suspended(suspension) => {
                let label = format!("{}.{}", self.registry.name_of(participant), event);
                self.park(exec, suspension, Some(participant), actor, label);
                Ok(Some(Value::Nil))
            }
        }
    }

    fn trace_phase(&self, event: &str, phase: &str, entity: EntityId) {
        if self.config.trace_dispatch {
            trace!(event, phase, entity = %self.registry.name_of(entity), "dispatch");
        }
    }
}
