//! Non-local control flow.
//!
//! STOP, OUTPUT, THROW, BYE and errors all leave the current computation
//! early. They travel as the `Err` side of `LogoResult` so every frame
//! between the origin and the handler unwinds through ordinary `?`.

use crate::error::{LogoDiagnostic, LogoError};
use crate::value::Value;

/// Why an evaluation is unwinding.
#[derive(Debug, Clone)]
pub enum Unwind {
    /// STOP: leave the current procedure with no value.
    Stop,
    /// OUTPUT: leave the current procedure with a value.
    Output(Value),
    /// THROW: unwind to the CATCH with a matching tag.
    Throw { tag: String, value: Option<Value> },
    /// BYE: unwind all the way out and ask the host to stop.
    Bye,
    Error(LogoDiagnostic),
}

pub type LogoResult<T> = Result<T, Unwind>;

impl From<LogoDiagnostic> for Unwind {
    fn from(diag: LogoDiagnostic) -> Self {
        Self::Error(diag)
    }
}

impl From<LogoError> for Unwind {
    fn from(error: LogoError) -> Self {
        Self::Error(LogoDiagnostic::new(error))
    }
}

/// What the host should do once `execute` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlSignal {
    #[default]
    None,
    StopRequested,
}
