//! Logo variable environments: dynamic scoping, LOCAL, MAKE, TEST.
//!
//! Logo is dynamically scoped: a procedure sees the variables of every
//! procedure that called it. Each invocation pushes a frame holding its
//! inputs and LOCALs; lookups walk the frames innermost-first and fall back
//! to the workspace globals.

use std::collections::HashMap;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::LogoDiagnostic;
use crate::value::Value;
use crate::workspace::Workspace;

/// The interpreter state that outlives a single instruction.
#[derive(Debug)]
pub struct Environment {
    pub workspace: Workspace,
    /// Stack of frames. Last is the current (innermost) frame.
    frames: Vec<Frame>,
    /// TEST result of instructions typed at top level.
    toplevel_test: Option<bool>,
    rng: StdRng,
    /// The error most recently caught by `CATCH "ERROR`.
    pub last_error: Option<LogoDiagnostic>,
}

/// A single variable frame.
#[derive(Debug)]
struct Frame {
    /// Procedure name, or `None` for a block frame (FOR's variable).
    procedure: Option<Rc<str>>,
    /// name (lowercased) → value; `None` is a LOCAL with no value yet.
    vars: HashMap<String, Option<Value>>,
    test: Option<bool>,
}

impl Environment {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            workspace: Workspace::new(),
            frames: Vec::new(),
            toplevel_test: None,
            rng: seeded(seed),
            last_error: None,
        }
    }

    /// Look a variable up, innermost frame first, then the globals.
    /// A LOCAL without a value hides any outer binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        let key = name.to_lowercase();
        for frame in self.frames.iter().rev() {
            if let Some(slot) = frame.vars.get(&key) {
                return slot.clone();
            }
        }
        self.workspace.global(&key).cloned()
    }

    /// NAMEP: does the name have a value?
    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// MAKE: assign to the innermost existing binding, else a global.
    pub fn set(&mut self, name: &str, value: Value) {
        let key = name.to_lowercase();
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.vars.get_mut(&key) {
                *slot = Some(value);
                return;
            }
        }
        self.workspace.set_global(&key, value);
    }

    /// Bind a name in the current frame (inputs, FOR variables).
    pub fn bind(&mut self, name: &str, value: Value) {
        let key = name.to_lowercase();
        match self.frames.last_mut() {
            Some(frame) => {
                frame.vars.insert(key, Some(value));
            }
            None => self.workspace.set_global(&key, value),
        }
    }

    /// LOCAL: create an unset binding in the current frame. At top level
    /// there is no frame and LOCAL does nothing.
    pub fn declare_local(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.vars.entry(name.to_lowercase()).or_insert(None);
        }
    }

    /// Push a frame for a procedure invocation.
    pub fn push_procedure(&mut self, name: Rc<str>) {
        self.frames.push(Frame {
            procedure: Some(name),
            vars: HashMap::new(),
            test: None,
        });
    }

    /// Push a block frame; it shares its procedure's TEST flag.
    pub fn push_block(&mut self) {
        self.frames.push(Frame {
            procedure: None,
            vars: HashMap::new(),
            test: None,
        });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Drop every frame, as after an aborted top-level instruction.
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    /// The innermost running procedure.
    pub fn current_procedure(&self) -> Option<Rc<str>> {
        self.frames.iter().rev().find_map(|f| f.procedure.clone())
    }

    pub fn in_procedure(&self) -> bool {
        self.frames.iter().any(|f| f.procedure.is_some())
    }

    pub fn test(&self) -> Option<bool> {
        match self.frames.iter().rev().find(|f| f.procedure.is_some()) {
            Some(frame) => frame.test,
            None => self.toplevel_test,
        }
    }

    pub fn set_test(&mut self, value: bool) {
        match self.frames.iter_mut().rev().find(|f| f.procedure.is_some()) {
            Some(frame) => frame.test = Some(value),
            None => self.toplevel_test = Some(value),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// RERANDOM: make the random sequence repeatable.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn num(n: i64) -> Value {
        Value::Word(n.into())
    }

    #[test]
    fn unset_variable_has_no_value() {
        let env = Environment::new(Some(1));
        assert!(env.get("foo").is_none());
    }

    #[test]
    fn case_insensitive() {
        let mut env = Environment::new(Some(1));
        env.set("Name", Value::word("Bob"));
        assert_eq!(env.get("NAME").unwrap().to_string(), "Bob");
    }

    #[test]
    fn dynamic_scope_sees_callers_inputs() {
        let mut env = Environment::new(Some(1));
        env.push_procedure("outer".into());
        env.bind("x", num(1));
        env.push_procedure("inner".into());
        assert_eq!(env.get("x").unwrap().to_string(), "1");
        env.set("x", num(2));
        env.pop_frame();
        assert_eq!(env.get("x").unwrap().to_string(), "2");
        env.pop_frame();
        assert!(env.get("x").is_none());
    }

    #[test]
    fn make_without_binding_creates_global() {
        let mut env = Environment::new(Some(1));
        env.push_procedure("p".into());
        env.set("g", num(5));
        env.pop_frame();
        assert_eq!(env.get("g").unwrap().to_string(), "5");
    }

    #[test]
    fn local_shadows_global() {
        let mut env = Environment::new(Some(1));
        env.set("x", num(1));
        env.push_procedure("p".into());
        env.declare_local("x");
        assert!(env.get("x").is_none());
        env.set("x", num(9));
        env.pop_frame();
        assert_eq!(env.get("x").unwrap().to_string(), "1");
    }

    #[test]
    fn local_at_top_level_is_a_no_op() {
        let mut env = Environment::new(Some(1));
        env.declare_local("x");
        env.set("x", num(3));
        assert_eq!(env.workspace.global("x").unwrap().to_string(), "3");
    }

    #[test]
    fn test_flag_is_per_procedure() {
        let mut env = Environment::new(Some(1));
        env.set_test(true);
        env.push_procedure("p".into());
        assert_eq!(env.test(), None);
        env.set_test(false);
        env.push_block();
        assert_eq!(env.test(), Some(false));
        env.pop_frame();
        env.pop_frame();
        assert_eq!(env.test(), Some(true));
    }

    #[test]
    fn reseed_repeats_sequence() {
        let mut env = Environment::new(None);
        env.reseed(7);
        let a: u32 = env.rng().random_range(0..1000);
        env.reseed(7);
        let b: u32 = env.rng().random_range(0..1000);
        assert_eq!(a, b);
    }
}
