#![allow(clippy::return_self_not_must_use)]

pub mod builtins;
pub mod control;
pub mod drawing;
pub mod env;
pub mod error;
pub mod eval;
pub mod files;
pub mod host;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod signal;
pub mod turtle;
pub mod value;
pub mod workspace;

pub use error::{LogoDiagnostic, LogoError};
pub use host::{Config, DEFAULT_MAX_CALL_DEPTH, Interpreter, Outcome};
pub use signal::ControlSignal;
pub use turtle::{GraphicsEvent, GraphicsOp};
pub use value::{List, Number, Value, Word};
