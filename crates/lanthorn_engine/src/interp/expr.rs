//! Expression evaluation.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

use lanthorn_foundation::{EntityId, Error, ErrorKind, Result, Type};
use lanthorn_language::{BinaryOp, Expr, TextPart, UnaryOp};
use lanthorn_storage::{Closure, Value};

use super::{Ctx, Execution, Outcome};
use crate::builtins;
use crate::world::World;

impl World {
    /// Evaluates an expression.
    pub(crate) fn eval(&mut self, ctx: &Ctx, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Nil(_) => Ok(Value::Nil),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::Number(n, _) => Ok(Value::Number(*n)),
            Expr::Text(parts, span) => self
                .interpolate(ctx, parts)
                .map_err(|e| e.at(span.line, span.column)),
            Expr::Noun(phrase, _) => Ok(Value::text(phrase)),
            Expr::Symbol(name, _) => Ok(Value::Symbol(self.registry.intern(name))),
            Expr::SelfRef(span) => ctx
                .this
                .map(Value::Entity)
                .ok_or_else(|| Error::undefined_symbol("self").at(span.line, span.column)),
            Expr::Ident(name, span) => self
                .lookup_name(ctx, name)
                .map_err(|e| e.at(span.line, span.column)),
            Expr::List(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(ctx, item)?);
                }
                Ok(Value::list(values))
            }
            Expr::Comprehension {
                element,
                var,
                iterable,
                filter,
                span,
            } => self
                .comprehension(ctx, element, var, iterable, filter.as_deref())
                .map_err(|e| e.at(span.line, span.column)),
            Expr::Unary { op, operand, span } => {
                let value = self.eval(ctx, operand)?;
                match op {
                    UnaryOp::Neg => number(&value)
                        .map(|n| Value::Number(-n))
                        .map_err(|e| e.in_operation("-").at(span.line, span.column)),
                    UnaryOp::Bang | UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs, span } => self
                .binary(ctx, *op, lhs, rhs)
                .map_err(|e| e.in_operation(op.symbol()).at(span.line, span.column)),
            Expr::Member { object, name, span } => {
                let object = self.eval(ctx, object)?;
                self.expect_entity(&object)
                    .and_then(|id| self.read_member(id, name))
                    .map_err(|e| e.at(span.line, span.column))
            }
            Expr::Index {
                object,
                index,
                span,
            } => {
                let object = self.eval(ctx, object)?;
                let index = self.eval(ctx, index)?;
                index_value(&object, &index).map_err(|e| e.at(span.line, span.column))
            }
            Expr::Call { callee, args, span } => self
                .eval_call(ctx, callee, args)
                .map_err(|e| e.at(span.line, span.column)),
            Expr::Lambda(def) => {
                let closure = Closure::new(Arc::clone(def), ctx.scope.clone(), ctx.this);
                Ok(Value::Closure(Rc::new(closure)))
            }
            Expr::Await(call, span) => {
                let operation = call.call_name().unwrap_or("await").to_string();
                Err(Error::new(ErrorKind::SuspensionNotPermitted { operation }).at(span.line, span.column))
            }
        }
    }

    pub(crate) fn eval_args(&mut self, ctx: &Ctx, args: &[Expr]) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(ctx, arg)?);
        }
        Ok(values)
    }

    /// Resolves a bare name: local bindings, then entity identifiers.
    fn lookup_name(&self, ctx: &Ctx, name: &str) -> Result<Value> {
        if let Some(value) = ctx.scope.lookup(name) {
            return Ok(value);
        }
        if let Some(id) = self.registry.lookup(name) {
            return Ok(Value::Entity(id));
        }
        Err(Error::undefined_symbol(name))
    }

    fn interpolate(&mut self, ctx: &Ctx, parts: &[TextPart]) -> Result<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                TextPart::Literal(text) => out.push_str(text),
                TextPart::Expr(expr) => {
                    let value = self.eval(ctx, expr)?;
                    out.push_str(&self.to_text(&value));
                }
            }
        }
        Ok(Value::text(out))
    }

    fn comprehension(
        &mut self,
        ctx: &Ctx,
        element: &Expr,
        var: &str,
        iterable: &Expr,
        filter: Option<&Expr>,
    ) -> Result<Value> {
        let source = self.eval(ctx, iterable)?;
        let mut out = Vec::new();
        for item in self.iterate(&source)? {
            self.step()?;
            let inner = Ctx::new(ctx.scope.child(), ctx.this);
            inner.scope.define(var, item);
            if let Some(filter) = filter {
                if !self.eval(&inner, filter)?.is_truthy() {
                    continue;
                }
            }
            out.push(self.eval(&inner, element)?);
        }
        Ok(Value::list(out))
    }

    fn binary(&mut self, ctx: &Ctx, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let left = self.eval(ctx, lhs)?;
        match op {
            BinaryOp::And if !left.is_truthy() => return Ok(left),
            BinaryOp::Or if left.is_truthy() => return Ok(left),
            BinaryOp::And | BinaryOp::Or => return self.eval(ctx, rhs),
            _ => {}
        }
        let right = self.eval(ctx, rhs)?;

        match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            BinaryOp::Lt => compare(&left, &right).map(|o| Value::Bool(o == Ordering::Less)),
            BinaryOp::Le => compare(&left, &right).map(|o| Value::Bool(o != Ordering::Greater)),
            BinaryOp::Gt => compare(&left, &right).map(|o| Value::Bool(o == Ordering::Greater)),
            BinaryOp::Ge => compare(&left, &right).map(|o| Value::Bool(o != Ordering::Less)),
            BinaryOp::Range => {
                let start = number(&left)?.floor() as i64;
                let end = number(&right)?.floor() as i64;
                let len = end.saturating_sub(start).max(0);
                self.charge(len as u64)?;
                Ok(Value::list((start..end).map(Value::from)))
            }
            BinaryOp::Add => self.add(left, right),
            BinaryOp::Sub => arithmetic(&left, &right, |a, b| Ok(a - b)),
            BinaryOp::Mul => arithmetic(&left, &right, |a, b| Ok(a * b)),
            BinaryOp::Div => arithmetic(&left, &right, |a, b| {
                if b == 0.0 {
                    Err(Error::new(ErrorKind::DivisionByZero))
                } else {
                    Ok(a / b)
                }
            }),
            BinaryOp::Rem => arithmetic(&left, &right, |a, b| {
                if b == 0.0 {
                    Err(Error::new(ErrorKind::DivisionByZero))
                } else {
                    Ok(a % b)
                }
            }),
            BinaryOp::And | BinaryOp::Or => Err(Error::internal("short-circuit operator fell through")),
        }
    }

    fn add(&self, left: Value, right: Value) -> Result<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::List(mut a), Value::List(b)) => {
                a.append(b);
                Ok(Value::List(a))
            }
            (left @ Value::Text(_), right) | (left, right @ Value::Text(_)) => {
                let mut out = self.to_text(&left);
                out.push_str(&self.to_text(&right));
                Ok(Value::text(out))
            }
            (left, _) => Err(Error::type_mismatch(Type::Number, left.type_of())),
        }
    }

    fn eval_call(&mut self, ctx: &Ctx, callee: &Expr, args: &[Expr]) -> Result<Value> {
        match callee {
            Expr::Ident(name, _) if !ctx.scope.contains(name) => {
                if builtins::is_suspending(name) {
                    return Err(Error::new(ErrorKind::SuspensionNotPermitted {
                        operation: name.clone(),
                    }));
                }
                if let Some(builtin) = builtins::lookup(name) {
                    let args = self.eval_args(ctx, args)?;
                    return self
                        .call_builtin(builtin, ctx, args)
                        .map_err(|e| e.in_operation(name.as_str()));
                }
            }
            Expr::Member { object, name, .. } => {
                let receiver = self.eval(ctx, object)?;
                let id = self.expect_entity(&receiver)?;
                let function = self.read_member(id, name)?;
                let args = self.eval_args(ctx, args)?;
                return self
                    .call_value(&function, args, Some(id))
                    .map_err(|e| e.in_operation(name.as_str()));
            }
            _ => {}
        }
        let function = self.eval(ctx, callee)?;
        let args = self.eval_args(ctx, args)?;
        self.call_value(&function, args, None)
    }

    fn call_builtin(&mut self, builtin: &builtins::Builtin, ctx: &Ctx, args: Vec<Value>) -> Result<Value> {
        if args.len() < builtin.min || builtin.max.is_some_and(|max| args.len() > max) {
            return Err(Error::arity_mismatch(builtin.name, builtin.arity(), args.len()));
        }
        if builtin.mutates && self.binding.is_some() {
            return Err(Error::new(ErrorKind::MutationDuringLoad {
                operation: builtin.name.to_string(),
            }));
        }
        (builtin.func)(self, ctx, &args)
    }

    /// Calls a closure. `receiver` becomes `self` for method calls;
    /// otherwise the closure keeps the `self` it was created with.
    pub(crate) fn call_value(&mut self, function: &Value, args: Vec<Value>, receiver: Option<EntityId>) -> Result<Value> {
        let Value::Closure(closure) = function else {
            return Err(Error::new(ErrorKind::NotCallable(function.type_of())));
        };
        let closure = Rc::clone(closure);
        let params = &closure.def.params;
        if args.len() != params.len() {
            return Err(Error::arity_mismatch(
                closure.name(),
                params.len().to_string(),
                args.len(),
            ));
        }

        self.enter()?;
        let scope = closure.env.child();
        for (param, arg) in params.iter().zip(args) {
            scope.define(param.clone(), arg);
        }
        let mut exec = Execution::new(&closure.def.body, scope, receiver.or(closure.this));
        let outcome = self.run(&mut exec);
        self.leave();

        match outcome? {
            Outcome::Finished(value) => Ok(value),
            Outcome::Suspended(_) => Err(Error::new(ErrorKind::SuspensionNotPermitted {
                operation: closure.name().to_string(),
            })),
        }
    }

    /// Player-facing text for a value. Entities print as their singular name.
    pub(crate) fn to_text(&self, value: &Value) -> String {
        match value {
            Value::Entity(id) if self.registry.contains(*id) => match self.registry.get_member(*id, "singular") {
                Ok(Value::Text(name)) => name.to_string(),
                _ => self.registry.name_of(*id),
            },
            other => other.display(&self.registry).to_string(),
        }
    }

    /// The elements a `for` loop or comprehension visits.
    pub(crate) fn iterate(&self, value: &Value) -> Result<Vec<Value>> {
        match value {
            Value::List(items) => Ok(items.iter().cloned().collect()),
            Value::Text(text) => Ok(text.chars().map(|c| Value::text(c.to_string())).collect()),
            other => Err(Error::type_mismatch(Type::List, other.type_of())),
        }
    }
}

pub(crate) fn number(value: &Value) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| Error::type_mismatch(Type::Number, value.type_of()))
}

fn arithmetic(left: &Value, right: &Value, op: impl FnOnce(f64, f64) -> Result<f64>) -> Result<Value> {
    op(number(left)?, number(right)?).map(Value::Number)
}

fn compare(left: &Value, right: &Value) -> Result<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)),
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Number(_) | Value::Text(_), other) => Err(Error::type_mismatch(left.type_of(), other.type_of())),
        (other, _) => Err(Error::type_mismatch(Type::Number, other.type_of())),
    }
}

fn index_value(object: &Value, index: &Value) -> Result<Value> {
    let i = number(index)?.floor() as i64;
    let out_of_bounds = |length| Error::new(ErrorKind::IndexOutOfBounds { index: i, length });
    match object {
        Value::List(items) => usize::try_from(i)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| out_of_bounds(items.len())),
        Value::Text(text) => usize::try_from(i)
            .ok()
            .and_then(|i| text.chars().nth(i))
            .map(|c| Value::text(c.to_string()))
            .ok_or_else(|| out_of_bounds(text.chars().count())),
        other => Err(Error::type_mismatch(Type::List, other.type_of())),
    }
}
