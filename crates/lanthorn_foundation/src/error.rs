//! Error types for the Lanthorn system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every [`ErrorKind`] belongs to one [`ErrorCategory`]; the category decides
//! how far an error propagates (a source declaration, the whole load, or a
//! single task).

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::types::Type;

/// Result alias used throughout Lanthorn.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Lanthorn operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a source position unless one is already recorded.
    ///
    /// Faults raised deep inside an operation get the position of the
    /// innermost expression that observed them.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.line.is_none() {
            ctx.line = Some(line);
            ctx.column = Some(column);
        }
        self
    }

    /// Tags this error with the operation that raised it, unless already tagged.
    #[must_use]
    pub fn in_operation(mut self, operation: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        if ctx.source.is_none() {
            ctx.source = Some(operation.into());
        }
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates an undefined symbol error.
    #[must_use]
    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedSymbol(name.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(operation: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            operation: operation.into(),
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Coarse grouping of errors by where they are contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed tokens; scoped to one declaration.
    Lex,
    /// Malformed syntax; scoped to one declaration.
    Parse,
    /// Structural errors in the declaration graph; fatal to starting a World.
    Load,
    /// Script faults; abort only the task that raised them.
    Runtime,
    /// A task exceeded its step budget without suspending.
    Scheduler,
    /// File or serialization failures in the runtime layer.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lex => "lex error",
            Self::Parse => "parse error",
            Self::Load => "load error",
            Self::Runtime => "runtime fault",
            Self::Scheduler => "scheduler fault",
            Self::Io => "io error",
        };
        f.write_str(name)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    // --- Lex / Parse ---
    /// Malformed token.
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// Malformed syntax.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    // --- Load ---
    /// An identifier was declared twice without `extend`.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// `extend` named an identifier that was never declared.
    #[error("cannot extend undeclared identifier: {0}")]
    ExtendUndeclared(String),

    /// Prototype references form a cycle.
    #[error("cyclic prototype chain: {}", cycle.join(" -> "))]
    CyclicPrototype {
        /// The identifiers on the cycle, first repeated at the end.
        cycle: Vec<String>,
    },

    /// A declaration names a prototype that does not exist.
    #[error("unknown prototype {prototype} for {declaration}")]
    UnknownPrototype {
        /// The declaring identifier.
        declaration: String,
        /// The missing prototype.
        prototype: String,
    },

    /// A name used in a declaration resolves to nothing once every
    /// declaration is registered.
    #[error("unresolved reference {name} in {in_declaration}")]
    UnresolvedReference {
        /// The unresolved name.
        name: String,
        /// The declaration that uses it.
        in_declaration: String,
    },

    /// `requires` clauses form a cycle.
    #[error("cyclic initialization order: {}", cycle.join(" -> "))]
    CyclicInitOrder {
        /// The identifiers on the cycle.
        cycle: Vec<String>,
    },

    /// Member initializers read each other in a loop.
    #[error("cyclic member binding: {}", cycle.join(" -> "))]
    CyclicMemberBinding {
        /// The `entity.member` names on the cycle.
        cycle: Vec<String>,
    },

    /// A member initializer or `init` block faulted while the World was loading.
    #[error("initializer of {declaration} failed: {message}")]
    InitializerFault {
        /// The declaration whose initializer failed.
        declaration: String,
        /// The underlying fault.
        message: String,
    },

    // --- Runtime ---
    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Entity was not found (never existed, or has been removed).
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// No entity is registered under this identifier.
    #[error("no entity named {0}")]
    UnknownEntity(String),

    /// A required member is missing on an entity and its prototypes.
    #[error("undefined member {member} on {entity}")]
    UndefinedMember {
        /// The entity identifier.
        entity: String,
        /// The member name.
        member: String,
    },

    /// A native member cannot be assigned.
    #[error("member {member} is read-only")]
    ReadOnlyMember {
        /// The member name.
        member: String,
    },

    /// A move would put an entity inside itself or one of its contents.
    #[error("cannot move {entity} into {destination}")]
    InvalidMove {
        /// The entity being moved.
        entity: String,
        /// The rejected destination.
        destination: String,
    },

    /// Symbol was not defined.
    #[error("undefined name: {0}")]
    UndefinedSymbol(String),

    /// Wrong number of arguments to an operation.
    #[error("{operation}: expected {expected} arguments, got {actual}")]
    ArityMismatch {
        /// The operation that was called.
        operation: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// A value that is not a function was called.
    #[error("value of type {0} is not callable")]
    NotCallable(Type),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: i64,
        /// The actual length of the collection.
        length: usize,
    },

    /// An argument has the right type but an unusable value.
    #[error("{operation}: {reason}")]
    InvalidArgument {
        /// The operation that was called.
        operation: String,
        /// What was wrong with the argument.
        reason: String,
    },

    /// A suspending operation was used where suspension is not permitted.
    #[error("{operation} may only be used with await inside a handler or init block")]
    SuspensionNotPermitted {
        /// The suspending operation.
        operation: String,
    },

    /// A world-mutating operation ran while declarations were still binding.
    #[error("{operation} cannot run while members are being bound")]
    MutationDuringLoad {
        /// The mutating operation.
        operation: String,
    },

    /// Too many nested calls or dispatches.
    #[error("call depth exceeded ({limit})")]
    CallDepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    // --- Scheduler ---
    /// A task ran past its step budget without suspending.
    #[error("step budget of {budget} exceeded without suspending")]
    StepBudgetExceeded {
        /// The configured budget.
        budget: u64,
    },

    // --- Io ---
    /// File system failure.
    #[error("io error: {0}")]
    IoError(String),

    /// Snapshot encoding failure.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the category this kind belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Lex { .. } => ErrorCategory::Lex,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::DuplicateIdentifier(_)
            | Self::ExtendUndeclared(_)
            | Self::CyclicPrototype { .. }
            | Self::UnknownPrototype { .. }
            | Self::UnresolvedReference { .. }
            | Self::CyclicInitOrder { .. }
            | Self::CyclicMemberBinding { .. }
            | Self::InitializerFault { .. } => ErrorCategory::Load,
            Self::StepBudgetExceeded { .. } => ErrorCategory::Scheduler,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::TypeMismatch { .. }
            | Self::EntityNotFound(_)
            | Self::UnknownEntity(_)
            | Self::UndefinedMember { .. }
            | Self::ReadOnlyMember { .. }
            | Self::InvalidMove { .. }
            | Self::UndefinedSymbol(_)
            | Self::ArityMismatch { .. }
            | Self::NotCallable(_)
            | Self::DivisionByZero
            | Self::IndexOutOfBounds { .. }
            | Self::InvalidArgument { .. }
            | Self::SuspensionNotPermitted { .. }
            | Self::MutationDuringLoad { .. }
            | Self::CallDepthExceeded { .. }
            | Self::Internal(_) => ErrorCategory::Runtime,
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation, declaration, or file name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<u32>,
    /// Column number in source.
    pub column: Option<u32>,
    /// Stack of handler/function frames.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source (operation or declaration name).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if let (Some(line), Some(col)) = (self.line, self.column) {
            if self.source.is_some() {
                f.write_str(" ")?;
            }
            write!(f, "at {line}:{col}")?;
        }
        for frame in &self.stack {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_mismatch() {
        let err = Error::type_mismatch(Type::Number, Type::Text);
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
        let msg = format!("{err}");
        assert!(msg.contains("number"));
        assert!(msg.contains("text"));
        assert_eq!(err.category(), ErrorCategory::Runtime);
    }

    #[test]
    fn error_with_context() {
        let err = Error::undefined_symbol("foo").with_context(
            ErrorContext::new()
                .with_source("world.lan")
                .with_position(10, 5),
        );

        let ctx = err.context.unwrap();
        assert_eq!(ctx.source, Some("world.lan".to_string()));
        assert_eq!(ctx.line, Some(10));
        assert_eq!(ctx.column, Some(5));
    }

    #[test]
    fn at_keeps_innermost_position() {
        let err = Error::new(ErrorKind::DivisionByZero).at(3, 7).at(1, 1);
        let ctx = err.context.unwrap();
        assert_eq!((ctx.line, ctx.column), (Some(3), Some(7)));
    }

    #[test]
    fn in_operation_keeps_first_tag() {
        let err = Error::arity_mismatch("sleep", "1", 0)
            .in_operation("sleep")
            .in_operation("handler open");
        assert_eq!(err.context.unwrap().source.as_deref(), Some("sleep"));
    }

    #[test]
    fn categories() {
        let cycle = ErrorKind::CyclicPrototype {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(cycle.category(), ErrorCategory::Load);
        assert_eq!(format!("{cycle}"), "cyclic prototype chain: a -> b -> a");

        let budget = ErrorKind::StepBudgetExceeded { budget: 10 };
        assert_eq!(budget.category(), ErrorCategory::Scheduler);
    }

    #[test]
    fn context_display() {
        let ctx = ErrorContext::new()
            .with_source("addExit")
            .with_position(4, 9)
            .with_frame("when startWorld");
        assert_eq!(format!("{ctx}"), "in addExit at 4:9\n  in when startWorld");
    }
}
