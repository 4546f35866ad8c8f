//! Control, variable, procedure and printing primitives.
//!
//! These all need the evaluator: they run instruction lists, touch the
//! environment, or write output.

use rand::Rng;

use crate::builtins::{self, Primitive, integer, list_arg, number, truth, word_arg};
use crate::error::{LogoDiagnostic, LogoError, bad_input, no_value};
use crate::eval::Evaluator;
use crate::parser::parse_list;
use crate::signal::{LogoResult, Unwind};
use crate::value::{List, Number, Value, Word};
use crate::workspace::{Arity, Procedure};

const VARIADIC: Arity = Arity::new(0, 1, None);

pub static PRIMITIVES: &[Primitive] = &[
    // Control
    Primitive::cmd(&["run"], Arity::fixed(1), run),
    Primitive::cmd(&["runresult"], Arity::fixed(1), runresult),
    Primitive::cmd(&["repeat"], Arity::fixed(2), repeat),
    Primitive::cmd(&["repcount"], Arity::fixed(0), repcount),
    Primitive::cmd(&["forever"], Arity::fixed(1), forever),
    Primitive::cmd(&["if"], Arity::new(2, 2, Some(3)), if_),
    Primitive::cmd(&["ifelse"], Arity::fixed(3), ifelse),
    Primitive::cmd(&["test"], Arity::fixed(1), test),
    Primitive::cmd(&["iftrue", "ift"], Arity::fixed(1), iftrue),
    Primitive::cmd(&["iffalse", "iff"], Arity::fixed(1), iffalse),
    Primitive::cmd(&["stop"], Arity::fixed(0), stop),
    Primitive::cmd(&["output", "op"], Arity::fixed(1), output),
    Primitive::cmd(&["catch"], Arity::fixed(2), catch),
    Primitive::cmd(&["throw"], Arity::trailing(1, 2), throw),
    Primitive::cmd(&["error"], Arity::fixed(0), error),
    Primitive::cmd(&["bye"], Arity::fixed(0), bye),
    Primitive::cmd(&["while"], Arity::fixed(2), while_),
    Primitive::cmd(&["until"], Arity::fixed(2), until),
    Primitive::cmd(&["do.while"], Arity::fixed(2), do_while),
    Primitive::cmd(&["do.until"], Arity::fixed(2), do_until),
    Primitive::cmd(&["for"], Arity::fixed(2), for_),
    Primitive::cmd(&["ignore"], Arity::fixed(1), ignore),
    Primitive::cmd(&["apply"], Arity::fixed(2), apply),
    Primitive::cmd(&["to"], Arity::fixed(0), to),
    // Variables
    Primitive::cmd(&["make"], Arity::fixed(2), make),
    Primitive::cmd(&["name"], Arity::fixed(2), name_value),
    Primitive::cmd(&["local"], Arity::new(1, 1, None), local),
    Primitive::cmd(&["localmake"], Arity::fixed(2), localmake),
    Primitive::cmd(&["thing"], Arity::fixed(1), thing),
    Primitive::cmd(&["namep", "name?"], Arity::fixed(1), namep),
    Primitive::cmd(&["names"], Arity::fixed(0), names),
    // Procedures
    Primitive::cmd(&["define"], Arity::fixed(2), define),
    Primitive::cmd(&["text"], Arity::fixed(1), text),
    Primitive::cmd(&["erase", "er"], Arity::fixed(1), erase),
    Primitive::cmd(&["erall"], Arity::fixed(0), erall),
    Primitive::cmd(&["procedures"], Arity::fixed(0), procedures),
    Primitive::cmd(&["procedurep", "procedure?"], Arity::fixed(1), procedurep),
    Primitive::cmd(&["primitivep", "primitive?"], Arity::fixed(1), primitivep),
    Primitive::cmd(&["definedp", "defined?"], Arity::fixed(1), definedp),
    Primitive::cmd(&["po"], Arity::fixed(1), po),
    // Printing
    Primitive::cmd(&["print", "pr"], VARIADIC, print),
    Primitive::cmd(&["type"], VARIADIC, type_),
    Primitive::cmd(&["show"], VARIADIC, show),
    // Random numbers
    Primitive::cmd(&["random"], Arity::new(1, 1, Some(2)), random),
    Primitive::cmd(&["rerandom"], Arity::new(0, 0, Some(1)), rerandom),
    Primitive::cmd(&["pick"], Arity::fixed(1), pick),
];

// ── Helpers ─────────────────────────────────────────────────────────

fn word_text(name: &str, value: &Value) -> Result<String, LogoDiagnostic> {
    Ok(word_arg(name, value)?.as_str().into_owned())
}

/// An instruction list input; a word is read as the text of a list.
fn instructions(_name: &str, value: &Value) -> Result<List, LogoDiagnostic> {
    match value {
        Value::List(list) => Ok(list.clone()),
        Value::Word(word) => parse_list(&word.as_str()),
    }
}

/// Evaluate a WHILE/UNTIL condition: a list is run for its value, a word
/// is taken as it is.
fn condition(ev: &mut Evaluator<'_>, name: &str, value: &Value) -> LogoResult<bool> {
    let result = match value {
        Value::List(list) => ev.run_value(list)?.ok_or_else(|| {
            LogoDiagnostic::new(LogoError::NoOutput)
                .with_detail(format!("{value} didn't output to {name}"))
        })?,
        Value::Word(_) => value.clone(),
    };
    Ok(truth(name, &result)?)
}

/// Names from a word or a list of words.
fn name_list(name: &str, value: &Value) -> Result<Vec<String>, LogoDiagnostic> {
    match value {
        Value::Word(w) => Ok(vec![w.as_str().into_owned()]),
        Value::List(list) => list.iter().map(|v| word_text(name, v)).collect(),
    }
}

fn count_arg(name: &str, value: &Value) -> Result<i64, LogoDiagnostic> {
    let n = integer(name, value)?;
    if n < 0 {
        return Err(bad_input(name, value));
    }
    Ok(n)
}

// ── Control ─────────────────────────────────────────────────────────

fn run(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let list = instructions(name, &args[0])?;
    ev.run_value(&list)
}

fn runresult(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let list = instructions(name, &args[0])?;
    let result = ev.run_value(&list)?;
    Ok(Some(Value::List(result.into_iter().collect())))
}

/// Run `body` `count` times with REPCOUNT counting from 1.
fn counted_loop(ev: &mut Evaluator<'_>, count: Option<i64>, body: &List) -> LogoResult<()> {
    ev.repcount.push(0);
    let mut result = Ok(());
    let mut i = 1;
    while count.is_none_or(|n| i <= n) {
        if let Some(current) = ev.repcount.last_mut() {
            *current = i;
        }
        result = ev.run_block(body);
        if result.is_err() {
            break;
        }
        i += 1;
    }
    ev.repcount.pop();
    result
}

fn repeat(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let count = count_arg(name, &args[0])?;
    let body = instructions(name, &args[1])?;
    counted_loop(ev, Some(count), &body)?;
    Ok(None)
}

fn repcount(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let n = ev.repcount.last().copied().unwrap_or(-1);
    Ok(Some(Value::Word(Word::from(n))))
}

fn forever(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let body = instructions(name, &args[0])?;
    counted_loop(ev, None, &body)?;
    Ok(None)
}

fn if_(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    if truth(name, &args[0])? {
        ev.run_value(&instructions(name, &args[1])?)
    } else if let Some(otherwise) = args.get(2) {
        ev.run_value(&instructions(name, otherwise)?)
    } else {
        Ok(None)
    }
}

fn ifelse(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let chosen = if truth(name, &args[0])? { &args[1] } else { &args[2] };
    ev.run_value(&instructions(name, chosen)?)
}

fn test(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let result = truth(name, &args[0])?;
    ev.env.set_test(result);
    Ok(None)
}

fn run_if_tested(
    ev: &mut Evaluator<'_>,
    name: &str,
    list: &Value,
    wanted: bool,
) -> LogoResult<Option<Value>> {
    match ev.env.test() {
        None => Err(LogoDiagnostic::new(LogoError::TestMissing)
            .with_detail(format!("{name} without TEST"))
            .into()),
        Some(result) if result == wanted => ev.run_value(&instructions(name, list)?),
        Some(_) => Ok(None),
    }
}

fn iftrue(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    run_if_tested(ev, name, &args[0], true)
}

fn iffalse(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    run_if_tested(ev, name, &args[0], false)
}

fn stop(_ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Err(Unwind::Stop)
}

fn output(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    if !ev.env.in_procedure() {
        return Err(LogoDiagnostic::new(LogoError::OutsideProcedure)
            .with_detail(format!("Can only use {name} inside a procedure"))
            .into());
    }
    Err(Unwind::Output(args[0].clone()))
}

fn catch(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let tag = word_text(name, &args[0])?;
    let body = instructions(name, &args[1])?;
    ev.catch_tags.push(tag.clone());
    let result = ev.run_value(&body);
    ev.catch_tags.pop();
    match result {
        Err(Unwind::Throw { tag: thrown, value }) if thrown.eq_ignore_ascii_case(&tag) => {
            Ok(value)
        }
        Err(Unwind::Error(diag)) if tag.eq_ignore_ascii_case("error") && !diag.error.is_syntax() => {
            tracing::debug!(code = diag.error.number(), error = %diag, "caught");
            ev.env.last_error = Some(diag);
            Ok(None)
        }
        other => other,
    }
}

fn throw(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let tag = word_text(name, &args[0])?;
    if tag.eq_ignore_ascii_case("error") {
        let mut diag = LogoDiagnostic::new(LogoError::UserError);
        if let Some(message) = args.get(1) {
            diag = diag.with_detail(message.print_form());
        }
        return Err(diag.into());
    }
    let caught = ev.catch_tags.iter().any(|t| t.eq_ignore_ascii_case(&tag));
    if !caught && !tag.eq_ignore_ascii_case("toplevel") {
        return Err(LogoDiagnostic::new(LogoError::UncaughtThrow)
            .with_detail(format!("Can't find catch tag for {tag}"))
            .into());
    }
    Err(Unwind::Throw {
        tag,
        value: args.get(1).cloned(),
    })
}

fn error(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let caught = ev.env.last_error.take();
    Ok(Some(caught.map_or_else(Value::empty_list, |d| Value::List(d.to_list()))))
}

fn bye(_ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Err(Unwind::Bye)
}

/// Shared loop for WHILE, UNTIL and their DO. forms.
fn conditional_loop(
    ev: &mut Evaluator<'_>,
    name: &str,
    args: &[Value],
    continue_when: bool,
    body_first: bool,
) -> LogoResult<Option<Value>> {
    let (cond, body) = if body_first {
        (&args[1], instructions(name, &args[0])?)
    } else {
        (&args[0], instructions(name, &args[1])?)
    };
    if body_first {
        ev.run_block(&body)?;
    }
    while condition(ev, name, cond)? == continue_when {
        ev.run_block(&body)?;
    }
    Ok(None)
}

fn while_(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    conditional_loop(ev, name, args, true, false)
}

fn until(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    conditional_loop(ev, name, args, false, false)
}

fn do_while(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    conditional_loop(ev, name, args, true, true)
}

fn do_until(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    conditional_loop(ev, name, args, false, true)
}

/// FOR [var start limit step] body. The variable lives in a block frame
/// so it disappears when the loop ends.
fn for_(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let control = list_arg(name, &args[0])?;
    let body = instructions(name, &args[1])?;
    let var = match control.first() {
        Some(Value::Word(w)) => w.as_str().into_owned(),
        _ => return Err(bad_input(name, &args[0]).into()),
    };
    let bounds = ev.eval_expressions(&control.butfirst().unwrap_or_default(), name)?;
    if !(2..=3).contains(&bounds.len()) {
        return Err(bad_input(name, &args[0]).into());
    }
    let start = number(name, &bounds[0])?;
    let limit = number(name, &bounds[1])?.as_f64();
    let step = match bounds.get(2) {
        Some(v) => {
            let step = number(name, v)?;
            if step.is_zero() {
                return Err(bad_input(name, v).into());
            }
            step
        }
        None if limit >= start.as_f64() => Number::Int(1),
        None => Number::Int(-1),
    };

    ev.env.push_block();
    let result = for_steps(ev, &var, start, limit, step, &body);
    ev.env.pop_frame();
    result?;
    Ok(None)
}

fn for_steps(
    ev: &mut Evaluator<'_>,
    var: &str,
    start: Number,
    limit: f64,
    step: Number,
    body: &List,
) -> LogoResult<()> {
    let ascending = step.as_f64() > 0.0;
    let mut current = start;
    loop {
        let at = current.as_f64();
        if (ascending && at > limit) || (!ascending && at < limit) {
            return Ok(());
        }
        ev.env.bind(var, Value::number(current));
        ev.run_block(body)?;
        current = match (current, step) {
            (Number::Int(c), Number::Int(s)) => match c.checked_add(s) {
                Some(next) => Number::Int(next),
                None => return Ok(()),
            },
            (c, s) => Number::Real(c.as_f64() + s.as_f64()),
        };
    }
}

fn ignore(_ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(None)
}

fn apply(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    let inputs = list_arg(name, &args[1])?.to_vec();
    ev.invoke(&procedure, inputs)
}

/// Top-level TO lines never get here; a TO that does is inside a
/// procedure or a run list.
fn to(_ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Err(LogoDiagnostic::new(LogoError::ToInsideProcedure)
        .with_detail("Can't use TO inside a procedure")
        .into())
}

// ── Variables ───────────────────────────────────────────────────────

fn make(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let var = word_text(name, &args[0])?;
    ev.env.set(&var, args[1].clone());
    Ok(None)
}

fn name_value(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let var = word_text(name, &args[1])?;
    ev.env.set(&var, args[0].clone());
    Ok(None)
}

fn local(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    for arg in args {
        for var in name_list(name, arg)? {
            ev.env.declare_local(&var);
        }
    }
    Ok(None)
}

fn localmake(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let var = word_text(name, &args[0])?;
    ev.env.declare_local(&var);
    ev.env.set(&var, args[1].clone());
    Ok(None)
}

fn thing(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let var = word_text(name, &args[0])?;
    ev.env.get(&var).map(Some).ok_or_else(|| no_value(&var).into())
}

fn namep(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let var = word_text(name, &args[0])?;
    Ok(Some(Value::boolean(ev.env.is_bound(&var))))
}

fn names(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(Value::List(ev.env.workspace.global_names())))
}

// ── Procedures ──────────────────────────────────────────────────────

fn define(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    let procedure = Procedure::from_text(&procedure, &args[1])?;
    ev.env.workspace.define(procedure)?;
    Ok(None)
}

fn text(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    match ev.env.workspace.procedure(&procedure) {
        Some(p) => Ok(Some(Value::List(p.text()))),
        None => Err(bad_input(name, &args[0]).into()),
    }
}

fn erase(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    for procedure in name_list(name, &args[0])? {
        ev.env.workspace.erase(&procedure);
    }
    Ok(None)
}

fn erall(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    tracing::debug!("erase all");
    ev.env.workspace.clear();
    Ok(None)
}

fn procedures(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    let names: List = ev
        .env
        .workspace
        .procedure_names()
        .into_iter()
        .map(|n| Value::Word(Word::from(n)))
        .collect();
    Ok(Some(Value::List(names)))
}

fn procedurep(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    Ok(Some(Value::boolean(ev.env.workspace.lookup(&procedure).is_some())))
}

fn primitivep(_ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    Ok(Some(Value::boolean(builtins::lookup(&procedure).is_some())))
}

fn definedp(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let procedure = word_text(name, &args[0])?;
    Ok(Some(Value::boolean(ev.env.workspace.procedure(&procedure).is_some())))
}

/// PO: print a definition as TO ... END source.
fn po(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    for procedure in name_list(name, &args[0])? {
        let Some(p) = ev.env.workspace.procedure(&procedure) else {
            return Err(LogoDiagnostic::new(LogoError::UndefinedProcedure)
                .with_detail(format!("I don't know how to {procedure}"))
                .into());
        };
        let mut source = p.source();
        source.push('\n');
        ev.print(&source)?;
    }
    Ok(None)
}

// ── Printing ────────────────────────────────────────────────────────

fn print(ev: &mut Evaluator<'_>, _name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let mut line = args.iter().map(Value::print_form).collect::<Vec<_>>().join(" ");
    line.push('\n');
    ev.print(&line)?;
    Ok(None)
}

fn type_(ev: &mut Evaluator<'_>, _name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let text: String = args.iter().map(Value::print_form).collect();
    ev.print(&text)?;
    Ok(None)
}

fn show(ev: &mut Evaluator<'_>, _name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let mut line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    line.push('\n');
    ev.print(&line)?;
    Ok(None)
}

// ── Random numbers ──────────────────────────────────────────────────

fn random(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let n = match args {
        [limit] => {
            let limit_n = integer(name, limit)?;
            if limit_n <= 0 {
                return Err(bad_input(name, limit).into());
            }
            ev.env.rng().random_range(0..limit_n)
        }
        [low, high, ..] => {
            let (low_n, high_n) = (integer(name, low)?, integer(name, high)?);
            if high_n < low_n {
                return Err(bad_input(name, high).into());
            }
            ev.env.rng().random_range(low_n..=high_n)
        }
        [] => return Err(crate::error::not_enough_inputs(name).into()),
    };
    Ok(Some(Value::Word(Word::from(n))))
}

fn rerandom(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let seed = match args.first() {
        Some(v) => u64::try_from(integer(name, v)?).map_err(|_| bad_input(name, v))?,
        None => 0,
    };
    ev.env.reseed(seed);
    Ok(None)
}

fn pick(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let items: Vec<Value> = match &args[0] {
        Value::List(list) => list.to_vec(),
        Value::Word(w) => w
            .as_str()
            .chars()
            .map(|c| Value::Word(Word::from(c.to_string())))
            .collect(),
    };
    if items.is_empty() {
        return Err(bad_input(name, &args[0]).into());
    }
    let index = ev.env.rng().random_range(0..items.len());
    Ok(Some(items[index].clone()))
}
