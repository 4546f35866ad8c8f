//! Logo evaluator: instruction lists + Environment -> execution.
//!
//! There is no AST. An instruction line is a `List`; the evaluator walks it
//! with a cursor, and each procedure name decides how many of the following
//! expressions it consumes. Infix operators are folded in strictly left to
//! right as each operand is read.

use std::rc::Rc;

use crate::builtins::{self, PrimFn};
use crate::env::Environment;
use crate::error::{LogoDiagnostic, LogoError, bad_input, not_enough_inputs, no_value};
use crate::host::Io;
use crate::parser::runparse;
use crate::signal::{LogoResult, Unwind};
use crate::turtle::TurtleWorld;
use crate::value::{List, Value, Word};
use crate::workspace::{Callable, Procedure, param_name};

/// Stack space kept free before recursing; below it, `stacker` grows the stack.
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

const INFIX: [&str; 10] = ["+", "-", "*", "/", "=", "<", ">", "<=", ">=", "<>"];

/// Cursor over the items of one instruction list.
struct Stream<'l> {
    items: &'l [Value],
    pos: usize,
}

impl<'l> Stream<'l> {
    fn new(items: &'l [Value]) -> Self {
        Self { items, pos: 0 }
    }

    fn peek(&self) -> Option<&'l Value> {
        self.items.get(self.pos)
    }

    fn next(&mut self) -> Option<&'l Value> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.items.len()
    }

    /// Whether the next item is a literal, a variable or an opening paren.
    fn datum_follows(&self) -> bool {
        match self.peek() {
            Some(Value::List(_) | Value::Word(Word::Number(_))) => true,
            Some(Value::Word(Word::Text(t))) => {
                t.starts_with(['"', ':'])
                    || &**t == "("
                    || crate::value::Number::parse(t).is_some()
            }
            None => false,
        }
    }

    /// The infix operator at the cursor, if there is one.
    fn peek_infix(&self) -> Option<&'l str> {
        match self.peek()? {
            Value::Word(Word::Text(t)) if INFIX.contains(&&**t) => Some(&**t),
            _ => None,
        }
    }

    fn at_close_paren(&self) -> bool {
        is_text(self.peek(), ")")
    }
}

fn is_text(value: Option<&Value>, text: &str) -> bool {
    matches!(value, Some(Value::Word(Word::Text(t))) if &**t == text)
}

fn starts_with_word(line: &List, word: &str) -> bool {
    matches!(line.first(), Some(Value::Word(Word::Text(t))) if t.eq_ignore_ascii_case(word))
}

fn no_use_for(value: &Value) -> Unwind {
    LogoDiagnostic::new(LogoError::NoUseForValue)
        .with_detail(format!("You don't say what to do with {value}"))
        .into()
}

/// A piece of a top-level program.
enum TopLevel<'l> {
    Define(Procedure),
    Run(&'l List),
}

/// Group `TO ... END` lines into definitions. A TO with no END is a
/// syntax error, found before anything runs.
fn split_definitions(lines: &[List]) -> Result<Vec<TopLevel<'_>>, LogoDiagnostic> {
    let mut out = Vec::new();
    let mut iter = lines.iter();
    while let Some(line) = iter.next() {
        if !starts_with_word(line, "to") {
            out.push(TopLevel::Run(line));
            continue;
        }
        let mut body = Vec::new();
        let mut closed = false;
        for next in iter.by_ref() {
            if starts_with_word(next, "end") {
                closed = true;
                break;
            }
            body.push(next.clone());
        }
        let mut procedure = title_line(line)?;
        if !closed {
            return Err(LogoDiagnostic::new(LogoError::UnterminatedDefinition)
                .with_detail(format!("TO {} without END", procedure.name)));
        }
        procedure.body = body;
        out.push(TopLevel::Define(procedure));
    }
    Ok(out)
}

/// Parse `to name :in1 :in2`.
fn title_line(line: &List) -> Result<Procedure, LogoDiagnostic> {
    let mut items = line.iter().skip(1);
    let name = match items.next() {
        Some(Value::Word(Word::Text(t))) if !t.starts_with(['"', ':']) => t.to_string(),
        Some(other) => return Err(bad_input("to", other)),
        None => return Err(not_enough_inputs("to")),
    };
    let params = items
        .map(|item| match item {
            Value::Word(Word::Text(t)) => Ok(param_name(t)),
            other => Err(bad_input("to", other)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Procedure {
        name,
        params,
        body: Vec::new(),
    })
}

pub struct Evaluator<'a> {
    pub env: &'a mut Environment,
    pub world: &'a mut TurtleWorld,
    pub io: &'a mut Io,
    /// Procedure nesting depth.
    depth: usize,
    max_depth: usize,
    /// REPCOUNT values of the enclosing REPEAT/FOREVER loops.
    pub repcount: Vec<i64>,
    /// Tags of the CATCH calls currently running, innermost last.
    pub catch_tags: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        env: &'a mut Environment,
        world: &'a mut TurtleWorld,
        io: &'a mut Io,
        max_depth: usize,
    ) -> Self {
        Self {
            env,
            world,
            io,
            depth: 0,
            max_depth,
            repcount: Vec::new(),
            catch_tags: Vec::new(),
        }
    }

    // ── Programs and instruction lists ──────────────────────────────

    /// Run a whole program. Only the last expression of the last line may
    /// leave a value; it becomes the result.
    pub fn run_program(&mut self, lines: &[List]) -> LogoResult<Option<Value>> {
        let pieces = split_definitions(lines)?;
        let mut produced = None;
        for piece in pieces {
            if let Some(value) = produced.take() {
                return Err(no_use_for(&value));
            }
            match piece {
                TopLevel::Define(procedure) => self.env.workspace.define(procedure)?,
                TopLevel::Run(line) => produced = self.run_sequence(&line.to_vec())?,
            }
        }
        Ok(produced)
    }

    /// RUN semantics: run an instruction list and output the value of its
    /// last expression, if any.
    pub fn run_value(&mut self, list: &List) -> LogoResult<Option<Value>> {
        let items = runparse(list).to_vec();
        ensure_sufficient_stack(|| self.run_sequence(&items))
    }

    /// Run a block (REPEAT, IF, ...) whose values nobody consumes.
    pub fn run_block(&mut self, list: &List) -> LogoResult<()> {
        match self.run_value(list)? {
            Some(value) => Err(no_use_for(&value)),
            None => Ok(()),
        }
    }

    /// Evaluate every expression in a list and collect the values.
    pub fn eval_expressions(&mut self, list: &List, caller: &str) -> LogoResult<Vec<Value>> {
        let items = runparse(list).to_vec();
        let mut stream = Stream::new(&items);
        let mut values = Vec::new();
        while !stream.at_end() {
            values.push(self.eval_input(caller, &mut stream)?);
        }
        Ok(values)
    }

    fn run_sequence(&mut self, items: &[Value]) -> LogoResult<Option<Value>> {
        let mut stream = Stream::new(items);
        let mut last = None;
        while !stream.at_end() {
            if let Some(value) = last.take() {
                return Err(no_use_for(&value));
            }
            if stream.at_close_paren() {
                return Err(LogoError::UnexpectedParen.into());
            }
            last = self.eval_expr(&mut stream)?;
        }
        Ok(last)
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// One expression: an operand followed by any infix operations.
    fn eval_expr(&mut self, stream: &mut Stream<'_>) -> LogoResult<Option<Value>> {
        let mut left = self.eval_operand(stream)?;
        while let Some(op) = stream.peek_infix() {
            let Some(lhs) = left else {
                return Err(not_enough_inputs(op).into());
            };
            stream.next();
            if stream.at_end() || stream.at_close_paren() {
                return Err(not_enough_inputs(op).into());
            }
            let rhs = self
                .eval_operand(stream)?
                .ok_or_else(|| didnt_output("expression", op))?;
            left = Some(builtins::infix(op, &lhs, &rhs)?);
        }
        Ok(left)
    }

    fn eval_operand(&mut self, stream: &mut Stream<'_>) -> LogoResult<Option<Value>> {
        let Some(item) = stream.next() else {
            return Ok(None);
        };
        let text = match item {
            Value::List(_) | Value::Word(Word::Number(_)) => return Ok(Some(item.clone())),
            Value::Word(Word::Text(t)) => t,
        };
        if let Some(quoted) = text.strip_prefix('"') {
            return Ok(Some(Value::word(quoted)));
        }
        if let Some(name) = text.strip_prefix(':') {
            return self.env.get(name).map(Some).ok_or_else(|| no_value(name).into());
        }
        match &**text {
            "(" => self.eval_paren(stream),
            ")" => Err(LogoError::UnexpectedParen.into()),
            "-" => {
                if stream.at_end() {
                    return Err(not_enough_inputs("-").into());
                }
                let operand = self
                    .eval_operand(stream)?
                    .ok_or_else(|| didnt_output("expression", "-"))?;
                Ok(Some(builtins::negate(&operand)?))
            }
            op if INFIX.contains(&op) => Err(not_enough_inputs(op).into()),
            _ if crate::value::Number::parse(text).is_some() => Ok(Some(item.clone())),
            name => self.call_named(name, stream),
        }
    }

    /// `(` either starts a call with an explicit input count or groups
    /// one expression.
    fn eval_paren(&mut self, stream: &mut Stream<'_>) -> LogoResult<Option<Value>> {
        let callable = match stream.peek() {
            Some(Value::Word(Word::Text(t))) if !t.starts_with(['"', ':']) => {
                self.env.workspace.lookup(t).map(|c| (t.clone(), c))
            }
            _ => None,
        };
        let Some((name, callable)) = callable else {
            let value = self.eval_expr(stream)?;
            return match stream.next() {
                Some(item) if is_text(Some(item), ")") => Ok(value),
                Some(_) => Err(LogoDiagnostic::new(LogoError::TooManyInputs)
                    .with_detail("too much inside ()'s")
                    .into()),
                None => Err(LogoError::UnmatchedParen.into()),
            };
        };
        stream.next();
        let mut args = Vec::new();
        loop {
            match stream.peek() {
                None => return Err(LogoError::UnmatchedParen.into()),
                Some(item) if is_text(Some(item), ")") => {
                    stream.next();
                    break;
                }
                Some(_) => args.push(self.eval_input(&name, stream)?),
            }
        }
        let arity = callable.arity();
        if args.len() < arity.min {
            return Err(not_enough_inputs(&name).into());
        }
        if !arity.accepts(args.len()) {
            return Err(LogoDiagnostic::new(LogoError::TooManyInputs)
                .with_detail(format!("too much inside ()'s for {name}"))
                .into());
        }
        self.apply(&callable, &name, args)
    }

    /// One input for `caller`; it must produce a value.
    fn eval_input(&mut self, caller: &str, stream: &mut Stream<'_>) -> LogoResult<Value> {
        let Some(first) = stream.peek() else {
            return Err(not_enough_inputs(caller).into());
        };
        if is_text(Some(first), ")") {
            return Err(not_enough_inputs(caller).into());
        }
        let head = match first {
            Value::Word(Word::Text(t)) if &**t == "(" => stream
                .items
                .get(stream.pos + 1)
                .map_or_else(String::new, Value::print_form),
            other => other.print_form(),
        };
        self.eval_expr(stream)?
            .ok_or_else(|| didnt_output(&head, caller))
    }

    fn call_named(&mut self, name: &str, stream: &mut Stream<'_>) -> LogoResult<Option<Value>> {
        let callable = self.env.workspace.lookup(name).ok_or_else(|| {
            LogoDiagnostic::new(LogoError::UndefinedProcedure)
                .with_detail(format!("I don't know how to {name}"))
        })?;
        let arity = callable.arity();
        let mut args = Vec::with_capacity(arity.default);
        for _ in 0..arity.default {
            args.push(self.eval_input(name, stream)?);
        }
        if arity.trailing {
            while arity.accepts(args.len() + 1) && stream.datum_follows() {
                args.push(self.eval_input(name, stream)?);
            }
        }
        self.apply(&callable, name, args)
    }

    /// Call a procedure by name with already evaluated inputs (APPLY).
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> LogoResult<Option<Value>> {
        let callable = self.env.workspace.lookup(name).ok_or_else(|| {
            LogoDiagnostic::new(LogoError::UndefinedProcedure)
                .with_detail(format!("I don't know how to {name}"))
        })?;
        let arity = callable.arity();
        if args.len() < arity.min {
            return Err(not_enough_inputs(name).into());
        }
        if !arity.accepts(args.len()) {
            return Err(LogoDiagnostic::new(LogoError::TooManyInputs)
                .with_detail(format!("too many inputs to {name}"))
                .into());
        }
        self.apply(&callable, name, args)
    }

    fn apply(
        &mut self,
        callable: &Callable,
        name: &str,
        args: Vec<Value>,
    ) -> LogoResult<Option<Value>> {
        match callable {
            Callable::Primitive(prim) => match prim.func {
                PrimFn::Op(f) => f(name, &args).map(Some),
                PrimFn::Cmd(f) => {
                    let result = f(self, name, &args);
                    self.flush_graphics();
                    result
                }
            },
            Callable::Procedure(procedure) => self.call_procedure(procedure, args),
        }
    }

    // ── Procedures ──────────────────────────────────────────────────

    fn call_procedure(
        &mut self,
        procedure: &Rc<Procedure>,
        args: Vec<Value>,
    ) -> LogoResult<Option<Value>> {
        if self.depth >= self.max_depth {
            return Err(LogoDiagnostic::new(LogoError::StackOverflow)
                .with_detail(format!("Stack overflow in {}", procedure.name))
                .into());
        }
        ensure_sufficient_stack(|| {
            self.depth += 1;
            self.env.push_procedure(Rc::from(procedure.name.as_str()));
            for (param, arg) in procedure.params.iter().zip(args) {
                self.env.bind(param, arg);
            }
            tracing::trace!(procedure = %procedure.name, depth = self.depth, "call");
            let result = self.run_body(procedure);
            self.env.pop_frame();
            self.depth -= 1;
            match result {
                Ok(()) | Err(Unwind::Stop) => Ok(None),
                Err(Unwind::Output(value)) => Ok(Some(value)),
                Err(other) => Err(other),
            }
        })
    }

    fn run_body(&mut self, procedure: &Procedure) -> LogoResult<()> {
        for line in &procedure.body {
            let result = match self.run_sequence(&line.to_vec()) {
                Ok(Some(value)) => Err(no_use_for(&value)),
                Ok(None) => Ok(()),
                Err(unwind) => Err(unwind),
            };
            result.map_err(|unwind| match unwind {
                Unwind::Error(diag) => Unwind::Error(diag.within(&procedure.name, line)),
                other => other,
            })?;
        }
        Ok(())
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Send text to the current writer or the host.
    pub fn print(&mut self, text: &str) -> LogoResult<()> {
        self.io.write(text).map_err(Unwind::from)
    }

    fn flush_graphics(&mut self) {
        let events = self.world.drain();
        if !events.is_empty() {
            self.io.emit_graphics(events);
        }
    }
}

fn didnt_output(what: &str, to: &str) -> Unwind {
    LogoDiagnostic::new(LogoError::NoOutput)
        .with_detail(format!("{what} didn't output to {to}"))
        .into()
}
