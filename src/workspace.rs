//! The workspace: user procedures and global variables.
//!
//! Everything here persists across `execute` calls until the host resets
//! the interpreter. Names are case-insensitive; procedures keep the
//! spelling they were defined with for display.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::builtins::{self, Primitive};
use crate::error::{LogoDiagnostic, LogoError, bad_input};
use crate::parser::runparse;
use crate::value::{List, Value, Word};

/// How many inputs a procedure takes: at least `min`, `default` when
/// called without parentheses, at most `max` (`None` = unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub default: usize,
    pub max: Option<usize>,
    /// Without parentheses, also take optional inputs up to `max` while a
    /// datum follows on the line.
    pub trailing: bool,
}

impl Arity {
    pub const fn fixed(n: usize) -> Self {
        Self {
            min: n,
            default: n,
            max: Some(n),
            trailing: false,
        }
    }

    pub const fn new(min: usize, default: usize, max: Option<usize>) -> Self {
        Self {
            min,
            default,
            max,
            trailing: false,
        }
    }

    /// `min` inputs, plus optional ones up to `max` when data follows.
    pub const fn trailing(min: usize, max: usize) -> Self {
        Self {
            min,
            default: min,
            max: Some(max),
            trailing: true,
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// A user-defined procedure.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    /// Parameter names, without the leading `:`.
    pub params: Vec<String>,
    pub body: Vec<List>,
}

impl Procedure {
    pub fn arity(&self) -> Arity {
        Arity::fixed(self.params.len())
    }

    /// The form TEXT outputs: `[[params] line1 line2 ...]`.
    pub fn text(&self) -> List {
        let params: List = self.params.iter().map(|p| Value::word(p)).collect();
        std::iter::once(Value::List(params))
            .chain(self.body.iter().cloned().map(Value::List))
            .collect()
    }

    /// Build a procedure from the form DEFINE takes.
    pub fn from_text(name: &str, text: &Value) -> Result<Self, LogoDiagnostic> {
        let bad = || bad_input("define", text);
        let list = text.as_list().ok_or_else(bad)?;
        let params = list.first().and_then(Value::as_list).ok_or_else(bad)?;
        let params = params
            .iter()
            .map(|p| match p {
                Value::Word(w) => Ok(param_name(&w.as_str())),
                Value::List(_) => Err(bad()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let body = list
            .iter()
            .skip(1)
            .map(|line| line.as_list().map(runparse).ok_or_else(bad))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            params,
            body,
        })
    }

    /// The definition as `TO ... END` source text.
    pub fn source(&self) -> String {
        let mut out = format!("to {}", self.name);
        for param in &self.params {
            out.push_str(" :");
            out.push_str(param);
        }
        out.push('\n');
        for line in &self.body {
            out.push_str(&Value::List(line.clone()).print_form());
            out.push('\n');
        }
        out.push_str("end");
        out
    }
}

/// Strip the `:` a parameter is written with.
pub fn param_name(word: &str) -> String {
    word.strip_prefix(':').unwrap_or(word).to_string()
}

/// What a procedure name resolves to.
#[derive(Clone)]
pub enum Callable {
    Primitive(&'static Primitive),
    Procedure(Rc<Procedure>),
}

impl Callable {
    pub fn arity(&self) -> Arity {
        match self {
            Self::Primitive(p) => p.arity,
            Self::Procedure(p) => p.arity(),
        }
    }
}

/// Procedure registry and global variables.
#[derive(Debug, Default)]
pub struct Workspace {
    procedures: BTreeMap<String, Rc<Procedure>>,
    globals: HashMap<String, Value>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primitives shadow user procedures; they cannot be redefined.
    pub fn lookup(&self, name: &str) -> Option<Callable> {
        if let Some(prim) = builtins::lookup(name) {
            return Some(Callable::Primitive(prim));
        }
        self.procedure(name).map(Callable::Procedure)
    }

    pub fn define(&mut self, procedure: Procedure) -> Result<(), LogoDiagnostic> {
        if builtins::lookup(&procedure.name).is_some() {
            return Err(LogoDiagnostic::new(LogoError::IsPrimitive)
                .with_detail(format!("{} is already in use as a primitive", procedure.name)));
        }
        tracing::debug!(name = %procedure.name, params = procedure.params.len(), "define");
        self.procedures
            .insert(procedure.name.to_lowercase(), Rc::new(procedure));
        Ok(())
    }

    pub fn procedure(&self, name: &str) -> Option<Rc<Procedure>> {
        self.procedures.get(&name.to_lowercase()).cloned()
    }

    pub fn erase(&mut self, name: &str) -> bool {
        let erased = self.procedures.remove(&name.to_lowercase()).is_some();
        if erased {
            tracing::debug!(name, "erase");
        }
        erased
    }

    /// Display names of all user procedures, sorted.
    pub fn procedure_names(&self) -> Vec<String> {
        self.procedures.values().map(|p| p.name.clone()).collect()
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(&name.to_lowercase())
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_lowercase(), value);
    }

    pub fn global_names(&self) -> List {
        let mut names: Vec<&String> = self.globals.keys().collect();
        names.sort();
        names.into_iter().map(|n| Value::Word(Word::from(n.as_str()))).collect()
    }

    /// ERALL: forget every procedure and global.
    pub fn clear(&mut self) {
        self.procedures.clear();
        self.globals.clear();
    }
}
