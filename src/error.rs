//! Logo error types and error message formatting.
//!
//! Error codes follow the numbering Berkeley Logo reports through `ERROR`,
//! so programs that inspect caught errors see familiar numbers. Messages are
//! the short forms; most diagnostics carry a detail sentence naming the
//! procedure and datum involved.

use std::fmt;

use crate::value::{List, Value, Word};

/// Logo error kinds with their `ERROR` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoError {
    /// 2: Stack overflow
    StackOverflow,
    /// 5: A procedure didn't output to its consumer
    NoOutput,
    /// 6: Not enough inputs
    NotEnoughInputs,
    /// 7: Procedure doesn't like an input
    BadInput,
    /// 8: Too much inside ()'s
    TooManyInputs,
    /// 9: You don't say what to do with a value
    NoUseForValue,
    /// 10: ')' not found
    UnmatchedParen,
    /// 11: Variable has no value
    UnboundVariable,
    /// 12: Unexpected ')'
    UnexpectedParen,
    /// 13: I don't know how to
    UndefinedProcedure,
    /// 14: Can't find catch tag
    UncaughtThrow,
    /// 18: File system error
    FileSystem,
    /// 21: THROW "ERROR
    UserError,
    /// 22: Name is a primitive
    IsPrimitive,
    /// 23: Can't use TO inside a procedure
    ToInsideProcedure,
    /// 25: IFTRUE/IFFALSE without TEST
    TestMissing,
    /// 26: Unexpected ']'
    UnexpectedBracket,
    /// 31: STOP or OUTPUT outside a procedure
    OutsideProcedure,
    /// 40: Missing ']'
    UnmatchedBracket,
    /// 41: TO without END
    UnterminatedDefinition,
}

impl LogoError {
    /// The code reported by `ERROR`.
    pub fn number(self) -> u32 {
        match self {
            Self::StackOverflow => 2,
            Self::NoOutput => 5,
            Self::NotEnoughInputs => 6,
            Self::BadInput => 7,
            Self::TooManyInputs => 8,
            Self::NoUseForValue => 9,
            Self::UnmatchedParen => 10,
            Self::UnboundVariable => 11,
            Self::UnexpectedParen => 12,
            Self::UndefinedProcedure => 13,
            Self::UncaughtThrow => 14,
            Self::FileSystem => 18,
            Self::UserError => 21,
            Self::IsPrimitive => 22,
            Self::ToInsideProcedure => 23,
            Self::TestMissing => 25,
            Self::UnexpectedBracket => 26,
            Self::OutsideProcedure => 31,
            Self::UnmatchedBracket => 40,
            Self::UnterminatedDefinition => 41,
        }
    }

    /// Standard message text.
    pub fn message(self) -> &'static str {
        match self {
            Self::StackOverflow => "Stack overflow",
            Self::NoOutput => "Procedure didn't output",
            Self::NotEnoughInputs => "Not enough inputs",
            Self::BadInput => "Bad input",
            Self::TooManyInputs => "Too much inside ()'s",
            Self::NoUseForValue => "You don't say what to do with a value",
            Self::UnmatchedParen => "')' not found",
            Self::UnboundVariable => "Variable has no value",
            Self::UnexpectedParen => "Unexpected ')'",
            Self::UndefinedProcedure => "I don't know how to do that",
            Self::UncaughtThrow => "Can't find catch tag",
            Self::FileSystem => "File system error",
            Self::UserError => "Throw \"Error",
            Self::IsPrimitive => "Name is a primitive",
            Self::ToInsideProcedure => "Can't use TO inside a procedure",
            Self::TestMissing => "IFTRUE/IFFALSE without TEST",
            Self::UnexpectedBracket => "Unexpected ']'",
            Self::OutsideProcedure => "Can only use STOP or OUTPUT inside a procedure",
            Self::UnmatchedBracket => "Missing ']'",
            Self::UnterminatedDefinition => "TO without END",
        }
    }

    /// Syntax errors abort the whole `execute` call and are never caught.
    pub fn is_syntax(self) -> bool {
        matches!(
            self,
            Self::UnmatchedParen
                | Self::UnexpectedParen
                | Self::UnexpectedBracket
                | Self::UnmatchedBracket
                | Self::UnterminatedDefinition
        )
    }
}

/// A Logo runtime or syntax error with its context.
#[derive(Debug, Clone)]
pub struct LogoDiagnostic {
    pub error: LogoError,
    pub detail: Option<String>,
    /// Procedure that was running when the error happened.
    pub procedure: Option<String>,
    /// The instruction line, in `show` form.
    pub line: Option<String>,
}

impl LogoDiagnostic {
    pub fn new(error: LogoError) -> Self {
        Self {
            error,
            detail: None,
            procedure: None,
            line: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach procedure context unless an inner call already did.
    pub fn within(mut self, procedure: &str, line: &List) -> Self {
        if self.procedure.is_none() {
            self.procedure = Some(procedure.to_string());
            self.line = Some(Value::List(line.clone()).to_string());
        }
        self
    }

    /// The text shown to the user.
    pub fn text(&self) -> &str {
        self.detail.as_deref().unwrap_or(self.error.message())
    }

    /// The list `ERROR` outputs: `[code message procedure line]`.
    pub fn to_list(&self) -> List {
        let procedure = self
            .procedure
            .as_deref()
            .map_or_else(|| Value::List(List::new()), Value::word);
        let line = self
            .line
            .as_deref()
            .map_or_else(|| Value::List(List::new()), Value::word);
        [
            Value::Word(Word::from(i64::from(self.error.number()))),
            Value::word(self.text()),
            procedure,
            line,
        ]
        .into_iter()
        .collect()
    }
}

impl fmt::Display for LogoDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())?;
        if let Some(ref procedure) = self.procedure {
            write!(f, "\n  in {procedure}")?;
            if let Some(ref line) = self.line {
                write!(f, ": {line}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for LogoDiagnostic {}

// ── Constructors for the common diagnostics ─────────────────────────

pub fn bad_input(procedure: &str, datum: &Value) -> LogoDiagnostic {
    LogoDiagnostic::new(LogoError::BadInput)
        .with_detail(format!("{procedure} doesn't like {datum} as input"))
}

pub fn not_enough_inputs(procedure: &str) -> LogoDiagnostic {
    LogoDiagnostic::new(LogoError::NotEnoughInputs)
        .with_detail(format!("not enough inputs to {procedure}"))
}

pub fn no_value(name: &str) -> LogoDiagnostic {
    LogoDiagnostic::new(LogoError::UnboundVariable).with_detail(format!("{name} has no value"))
}

pub fn file_error(procedure: &str, path: &str, err: &std::io::Error) -> LogoDiagnostic {
    LogoDiagnostic::new(LogoError::FileSystem)
        .with_detail(format!("{procedure}: can't use file {path}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_are_flagged() {
        assert!(LogoError::UnexpectedBracket.is_syntax());
        assert!(LogoError::UnmatchedParen.is_syntax());
        assert!(!LogoError::BadInput.is_syntax());
        assert!(!LogoError::UncaughtThrow.is_syntax());
    }

    #[test]
    fn display_prefers_detail() {
        let diag = LogoDiagnostic::new(LogoError::UndefinedProcedure)
            .with_detail("I don't know how to foo");
        assert_eq!(diag.to_string(), "I don't know how to foo");
        let bare = LogoDiagnostic::new(LogoError::TestMissing);
        assert_eq!(bare.to_string(), "IFTRUE/IFFALSE without TEST");
    }

    #[test]
    fn within_keeps_innermost_procedure() {
        let line: List = [Value::word("fd")].into_iter().collect();
        let diag = not_enough_inputs("fd").within("inner", &line).within("outer", &line);
        assert_eq!(diag.procedure.as_deref(), Some("inner"));
        assert_eq!(diag.to_string(), "not enough inputs to fd\n  in inner: [fd]");
    }

    #[test]
    fn error_list_shape() {
        let list = no_value("x").to_list();
        assert_eq!(list.len(), 4);
        assert_eq!(list.first().map(ToString::to_string).as_deref(), Some("11"));
    }
}
