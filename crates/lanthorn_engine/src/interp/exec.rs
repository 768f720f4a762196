//! The statement machine.

use std::rc::Rc;
use std::sync::Arc;

use lanthorn_foundation::{EntityId, Error, Result, SymbolId, Type};
use lanthorn_language::{AssignTarget, Block, Expr, Stmt};
use lanthorn_storage::{Closure, Scope, Value};

use super::Ctx;
use crate::builtins;
use crate::world::World;

/// One level of the statement stack.
enum Frame {
    /// Statements of a block, `pc` being the next to run.
    Block {
        stmts: Arc<[Stmt]>,
        pc: usize,
        scope: Scope,
    },
    /// A `while` or `for` statement, identified by its block and index.
    Loop {
        stmts: Arc<[Stmt]>,
        index: usize,
        scope: Scope,
        state: LoopState,
    },
}

impl Frame {
    fn block(block: &Block, scope: Scope) -> Self {
        Self::Block {
            stmts: Arc::clone(&block.stmts),
            pc: 0,
            scope,
        }
    }
}

enum LoopState {
    While,
    For { items: Vec<Value>, next: usize },
}

/// Where the value of a pending `await` goes.
enum ResumeSlot {
    Discard,
    Define { name: String, scope: Scope },
    AssignName { name: String, scope: Scope },
    AssignMember { entity: EntityId, member: String },
}

/// Why an execution stopped before finishing.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Suspension {
    /// `await sleep(n)`: resume `n` ticks later.
    Sleep(u64),
    /// `await waitFor(#s)`: resume when signalled.
    Signal(SymbolId),
    /// `await request(#kind, payload)`: resume when the host answers.
    Request { kind: SymbolId, payload: Value },
}

/// Result of running an execution.
#[derive(Debug)]
pub(crate) enum Outcome {
    Finished(Value),
    Suspended(Suspension),
}

enum Flow {
    Next,
    Push(Frame),
    Pop,
    Return(Value),
    Break,
    Continue,
    Suspend(Suspension, ResumeSlot),
}

/// A resumable statement execution: the frame stack of a handler body,
/// initializer, or function body, plus where to deliver a pending `await`.
pub struct Execution {
    frames: Vec<Frame>,
    this: Option<EntityId>,
    pending: Option<ResumeSlot>,
}

impl Execution {
    /// Starts executing `body` in `scope` with `self` bound to `this`.
    #[must_use]
    pub fn new(body: &Block, scope: Scope, this: Option<EntityId>) -> Self {
        Self {
            frames: vec![Frame::block(body, scope)],
            this,
            pending: None,
        }
    }
}

impl std::fmt::Debug for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("frames", &self.frames.len())
            .field("this", &self.this)
            .field("awaiting", &self.pending.is_some())
            .finish()
    }
}

impl World {
    /// Runs `exec` until it finishes or reaches an `await`.
    pub(crate) fn run(&mut self, exec: &mut Execution) -> Result<Outcome> {
        let this = exec.this;
        loop {
            let flow = match exec.frames.last_mut() {
                None => return Ok(Outcome::Finished(Value::Nil)),
                Some(Frame::Block { stmts, pc, scope }) => {
                    let index = *pc;
                    if index >= stmts.len() {
                        Flow::Pop
                    } else {
                        *pc += 1;
                        let ctx = Ctx::new(scope.clone(), this);
                        let stmts = Arc::clone(stmts);
                        self.exec_stmt(&ctx, &stmts, index)?
                    }
                }
                Some(Frame::Loop {
                    stmts,
                    index,
                    scope,
                    state,
                }) => {
                    self.step()?;
                    match (stmts.get(*index), state) {
                        (Some(Stmt::While { cond, body, .. }), LoopState::While) => {
                            let ctx = Ctx::new(scope.clone(), this);
                            if self.eval(&ctx, cond)?.is_truthy() {
                                Flow::Push(Frame::block(body, scope.child()))
                            } else {
                                Flow::Pop
                            }
                        }
                        (Some(Stmt::For { var, body, .. }), LoopState::For { items, next }) => {
                            match items.get(*next) {
                                Some(item) => {
                                    let inner = scope.child();
                                    inner.define(var.clone(), item.clone());
                                    *next += 1;
                                    Flow::Push(Frame::block(body, inner))
                                }
                                None => Flow::Pop,
                            }
                        }
                        _ => return Err(Error::internal("loop frame without a loop statement")),
                    }
                }
            };

            match flow {
                Flow::Next => {}
                Flow::Pop => {
                    exec.frames.pop();
                }
                Flow::Push(frame) => exec.frames.push(frame),
                Flow::Return(value) => {
                    exec.frames.clear();
                    return Ok(Outcome::Finished(value));
                }
                Flow::Break | Flow::Continue => {
                    let Some(at) = exec
                        .frames
                        .iter()
                        .rposition(|f| matches!(f, Frame::Loop { .. }))
                    else {
                        return Err(Error::internal("break or continue outside a loop"));
                    };
                    let keep = if matches!(flow, Flow::Break) { at } else { at + 1 };
                    exec.frames.truncate(keep);
                }
                Flow::Suspend(suspension, slot) => {
                    exec.pending = Some(slot);
                    return Ok(Outcome::Suspended(suspension));
                }
            }
        }
    }

    /// Delivers the result of the pending `await`, if any.
    pub(crate) fn resume(&mut self, exec: &mut Execution, value: Value) -> Result<()> {
        match exec.pending.take() {
            Some(slot) => self.deliver(slot, value),
            None => Ok(()),
        }
    }

    fn deliver(&mut self, slot: ResumeSlot, value: Value) -> Result<()> {
        match slot {
            ResumeSlot::Discard => Ok(()),
            ResumeSlot::Define { name, scope } => {
                scope.define(name, value);
                Ok(())
            }
            ResumeSlot::AssignName { name, scope } => {
                scope.assign(&name, value);
                Ok(())
            }
            ResumeSlot::AssignMember { entity, member } => self.write_member(entity, &member, value),
        }
    }

    fn exec_stmt(&mut self, ctx: &Ctx, stmts: &Arc<[Stmt]>, index: usize) -> Result<Flow> {
        let Some(stmt) = stmts.get(index) else {
            return Ok(Flow::Pop);
        };
        self.step()?;
        let span = stmt.span();
        self.exec_stmt_inner(ctx, stmts, index, stmt)
            .map_err(|e| e.at(span.line, span.column))
    }

    fn exec_stmt_inner(&mut self, ctx: &Ctx, stmts: &Arc<[Stmt]>, index: usize, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let slot = ResumeSlot::Define {
                    name: name.clone(),
                    scope: ctx.scope.clone(),
                };
                self.assign_from(ctx, value, slot)
            }
            Stmt::Assign { target, value, .. } => {
                let slot = match target {
                    AssignTarget::Name(name) => ResumeSlot::AssignName {
                        name: name.clone(),
                        scope: ctx.scope.clone(),
                    },
                    AssignTarget::Member { object, member } => {
                        let object = self.eval(ctx, object)?;
                        ResumeSlot::AssignMember {
                            entity: self.expect_entity(&object)?,
                            member: member.clone(),
                        }
                    }
                };
                self.assign_from(ctx, value, slot)
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                if self.eval(ctx, cond)?.is_truthy() {
                    Ok(Flow::Push(Frame::block(then_block, ctx.scope.child())))
                } else if let Some(block) = else_block {
                    Ok(Flow::Push(Frame::block(block, ctx.scope.child())))
                } else {
                    Ok(Flow::Next)
                }
            }
            Stmt::While { .. } => Ok(Flow::Push(Frame::Loop {
                stmts: Arc::clone(stmts),
                index,
                scope: ctx.scope.clone(),
                state: LoopState::While,
            })),
            Stmt::For { iterable, .. } => {
                let iterable = self.eval(ctx, iterable)?;
                let items = self.iterate(&iterable)?;
                Ok(Flow::Push(Frame::Loop {
                    stmts: Arc::clone(stmts),
                    index,
                    scope: ctx.scope.clone(),
                    state: LoopState::For { items, next: 0 },
                }))
            }
            Stmt::Fn(def) => {
                let name = def.name.clone().unwrap_or_default();
                let closure = Closure::new(Arc::clone(def), ctx.scope.clone(), ctx.this);
                ctx.scope.define(name, Value::Closure(Rc::new(closure)));
                Ok(Flow::Next)
            }
            Stmt::Return(value, _) => {
                let value = match value {
                    Some(expr) => self.eval(ctx, expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Expr(expr, _) => self.assign_from(ctx, expr, ResumeSlot::Discard),
        }
    }

    /// Evaluates `value` into `slot`, suspending if it is an awaited
    /// suspension call.
    fn assign_from(&mut self, ctx: &Ctx, value: &Expr, slot: ResumeSlot) -> Result<Flow> {
        if let Expr::Await(call, _) = value {
            if let Some(suspension) = self.suspension_for(ctx, call)? {
                return Ok(Flow::Suspend(suspension, slot));
            }
            let result = self.eval(ctx, call)?;
            self.deliver(slot, result)?;
            return Ok(Flow::Next);
        }
        let result = self.eval(ctx, value)?;
        self.deliver(slot, result)?;
        Ok(Flow::Next)
    }

    /// The suspension an awaited call requests, or `None` if the call does
    /// not suspend and should simply be evaluated.
    fn suspension_for(&mut self, ctx: &Ctx, call: &Expr) -> Result<Option<Suspension>> {
        let Expr::Call { callee, args, span } = call else {
            return Ok(None);
        };
        let Expr::Ident(name, _) = callee.as_ref() else {
            return Ok(None);
        };
        if !builtins::is_suspending(name) || ctx.scope.contains(name) {
            return Ok(None);
        }
        let args = self.eval_args(ctx, args)?;
        builtins::suspension(self, name, &args)
            .map(Some)
            .map_err(|e| e.in_operation(name.as_str()).at(span.line, span.column))
    }

    pub(crate) fn expect_entity(&self, value: &Value) -> Result<EntityId> {
        match value {
            Value::Entity(id) if self.registry.contains(*id) => Ok(*id),
            Value::Entity(id) => Err(Error::entity_not_found(*id)),
            other => Err(Error::type_mismatch(Type::Entity, other.type_of())),
        }
    }
}
