//! Logo primitives: the dispatch table plus word, list and arithmetic
//! operations.
//!
//! Every primitive carries its arity. Pure operations see only their
//! inputs; commands also get the evaluator, for anything that touches the
//! environment, the turtle or I/O. The control, turtle and file primitives
//! live in their own modules and register here.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{LogoDiagnostic, bad_input};
use crate::eval::Evaluator;
use crate::signal::LogoResult;
use crate::value::{List, Number, Value, Word};
use crate::workspace::Arity;
use crate::{control, drawing, files};

pub type OpFn = fn(&str, &[Value]) -> LogoResult<Value>;
pub type CmdFn = fn(&mut Evaluator<'_>, &str, &[Value]) -> LogoResult<Option<Value>>;

/// How a primitive runs.
#[derive(Clone, Copy)]
pub enum PrimFn {
    /// A pure operation on its inputs.
    Op(OpFn),
    /// Needs the evaluator; may or may not output.
    Cmd(CmdFn),
}

pub struct Primitive {
    /// Canonical name first, then aliases.
    pub names: &'static [&'static str],
    pub arity: Arity,
    pub func: PrimFn,
}

impl Primitive {
    pub const fn op(names: &'static [&'static str], arity: Arity, f: OpFn) -> Self {
        Self {
            names,
            arity,
            func: PrimFn::Op(f),
        }
    }

    pub const fn cmd(names: &'static [&'static str], arity: Arity, f: CmdFn) -> Self {
        Self {
            names,
            arity,
            func: PrimFn::Cmd(f),
        }
    }

    pub fn name(&self) -> &'static str {
        self.names[0]
    }
}

const VARIADIC: Arity = Arity::new(0, 2, None);

// ── Public dispatch ─────────────────────────────────────────────────

static INDEX: LazyLock<HashMap<&'static str, &'static Primitive>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for table in [
        PRIMITIVES,
        control::PRIMITIVES,
        drawing::PRIMITIVES,
        files::PRIMITIVES,
    ] {
        for prim in table {
            for name in prim.names {
                index.insert(*name, prim);
            }
        }
    }
    index
});

/// Find a primitive by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static Primitive> {
    INDEX.get(name.to_lowercase().as_str()).copied()
}

/// Apply an infix operator.
pub fn infix(op: &str, left: &Value, right: &Value) -> LogoResult<Value> {
    let args = [left.clone(), right.clone()];
    match op {
        "+" => sum(op, &args),
        "-" => difference(op, &args),
        "*" => product(op, &args),
        "/" => quotient(op, &args),
        "=" => equalp(op, &args),
        "<>" => notequalp(op, &args),
        "<" => lessp(op, &args),
        ">" => greaterp(op, &args),
        "<=" => lessequalp(op, &args),
        _ => greaterequalp(op, &args),
    }
}

/// Prefix minus.
pub fn negate(value: &Value) -> LogoResult<Value> {
    minus("-", std::slice::from_ref(value))
}

pub static PRIMITIVES: &[Primitive] = &[
    // Words and lists
    Primitive::op(&["word"], VARIADIC, word),
    Primitive::op(&["list"], VARIADIC, list),
    Primitive::op(&["sentence", "se"], VARIADIC, sentence),
    Primitive::op(&["fput"], Arity::fixed(2), fput),
    Primitive::op(&["lput"], Arity::fixed(2), lput),
    Primitive::op(&["first"], Arity::fixed(1), first),
    Primitive::op(&["last"], Arity::fixed(1), last),
    Primitive::op(&["butfirst", "bf"], Arity::fixed(1), butfirst),
    Primitive::op(&["butlast", "bl"], Arity::fixed(1), butlast),
    Primitive::op(&["item"], Arity::fixed(2), item),
    Primitive::op(&["remove"], Arity::fixed(2), remove),
    Primitive::op(&["reverse"], Arity::fixed(1), reverse),
    Primitive::op(&["count"], Arity::fixed(1), count),
    Primitive::op(&["uppercase"], Arity::fixed(1), uppercase),
    Primitive::op(&["lowercase"], Arity::fixed(1), lowercase),
    Primitive::op(&["char"], Arity::fixed(1), char_of),
    Primitive::op(&["ascii"], Arity::fixed(1), ascii),
    Primitive::op(&["member"], Arity::fixed(2), member),
    // Predicates
    Primitive::op(&["emptyp", "empty?"], Arity::fixed(1), emptyp),
    Primitive::op(&["wordp", "word?"], Arity::fixed(1), wordp),
    Primitive::op(&["listp", "list?"], Arity::fixed(1), listp),
    Primitive::op(&["numberp", "number?"], Arity::fixed(1), numberp),
    Primitive::op(&["equalp", "equal?"], Arity::fixed(2), equalp),
    Primitive::op(&["notequalp", "notequal?"], Arity::fixed(2), notequalp),
    Primitive::op(&["memberp", "member?"], Arity::fixed(2), memberp),
    Primitive::op(&["beforep", "before?"], Arity::fixed(2), beforep),
    // Arithmetic
    Primitive::op(&["sum"], VARIADIC, sum),
    Primitive::op(&["difference"], Arity::fixed(2), difference),
    Primitive::op(&["product"], VARIADIC, product),
    Primitive::op(&["quotient"], Arity::new(1, 2, Some(2)), quotient),
    Primitive::op(&["remainder"], Arity::fixed(2), remainder),
    Primitive::op(&["modulo"], Arity::fixed(2), modulo),
    Primitive::op(&["minus"], Arity::fixed(1), minus),
    Primitive::op(&["abs"], Arity::fixed(1), abs),
    Primitive::op(&["int"], Arity::fixed(1), int),
    Primitive::op(&["round"], Arity::fixed(1), round),
    Primitive::op(&["sqrt"], Arity::fixed(1), sqrt),
    Primitive::op(&["power"], Arity::fixed(2), power),
    Primitive::op(&["exp"], Arity::fixed(1), exp),
    Primitive::op(&["ln"], Arity::fixed(1), ln),
    Primitive::op(&["log10"], Arity::fixed(1), log10),
    Primitive::op(&["sin"], Arity::fixed(1), sin),
    Primitive::op(&["cos"], Arity::fixed(1), cos),
    Primitive::op(&["arctan"], Arity::new(1, 1, Some(2)), arctan),
    Primitive::op(&["bitand"], VARIADIC, bitand),
    Primitive::op(&["bitor"], VARIADIC, bitor),
    Primitive::op(&["bitxor"], VARIADIC, bitxor),
    Primitive::op(&["bitnot"], Arity::fixed(1), bitnot),
    Primitive::op(&["ashift"], Arity::fixed(2), ashift),
    Primitive::op(&["lshift"], Arity::fixed(2), lshift),
    // Comparison and logic
    Primitive::op(&["lessp", "less?"], Arity::fixed(2), lessp),
    Primitive::op(&["greaterp", "greater?"], Arity::fixed(2), greaterp),
    Primitive::op(&["lessequalp", "lessequal?"], Arity::fixed(2), lessequalp),
    Primitive::op(&["greaterequalp", "greaterequal?"], Arity::fixed(2), greaterequalp),
    Primitive::op(&["and"], VARIADIC, and),
    Primitive::op(&["or"], VARIADIC, or),
    Primitive::op(&["not"], Arity::fixed(1), not),
];

// ── Input helpers ───────────────────────────────────────────────────

pub fn number(name: &str, value: &Value) -> Result<Number, LogoDiagnostic> {
    value.as_number().ok_or_else(|| bad_input(name, value))
}

pub fn float(name: &str, value: &Value) -> Result<f64, LogoDiagnostic> {
    number(name, value).map(Number::as_f64)
}

pub fn integer(name: &str, value: &Value) -> Result<i64, LogoDiagnostic> {
    number(name, value)?
        .as_int()
        .ok_or_else(|| bad_input(name, value))
}

pub fn truth(name: &str, value: &Value) -> Result<bool, LogoDiagnostic> {
    value
        .as_word()
        .and_then(Word::as_bool)
        .ok_or_else(|| bad_input(name, value))
}

pub fn word_arg<'v>(name: &str, value: &'v Value) -> Result<&'v Word, LogoDiagnostic> {
    value.as_word().ok_or_else(|| bad_input(name, value))
}

pub fn list_arg<'v>(name: &str, value: &'v Value) -> Result<&'v List, LogoDiagnostic> {
    value.as_list().ok_or_else(|| bad_input(name, value))
}

fn chars(word: &Word) -> Vec<char> {
    word.as_str().chars().collect()
}

fn char_word(c: char) -> Value {
    Value::Word(Word::from(c.to_string()))
}

fn text(s: String) -> Value {
    Value::Word(Word::from(s))
}

// ── Words and lists ─────────────────────────────────────────────────

fn word(name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&word_arg(name, arg)?.as_str());
    }
    Ok(text(out))
}

fn list(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::List(args.iter().cloned().collect()))
}

fn sentence(_name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut items = Vec::new();
    for arg in args {
        match arg {
            Value::List(l) => items.extend(l.iter().cloned()),
            Value::Word(_) => items.push(arg.clone()),
        }
    }
    Ok(Value::List(items.into_iter().collect()))
}

fn fput(name: &str, args: &[Value]) -> LogoResult<Value> {
    match (&args[0], &args[1]) {
        (thing, Value::List(l)) => Ok(Value::List(l.fput(thing.clone()))),
        (Value::Word(a), Value::Word(b)) => Ok(text(format!("{a}{b}"))),
        (_, target) => Err(bad_input(name, target).into()),
    }
}

fn lput(name: &str, args: &[Value]) -> LogoResult<Value> {
    match (&args[0], &args[1]) {
        (thing, Value::List(l)) => Ok(Value::List(l.lput(thing.clone()))),
        (Value::Word(a), Value::Word(b)) => Ok(text(format!("{b}{a}"))),
        (_, target) => Err(bad_input(name, target).into()),
    }
}

fn first(name: &str, args: &[Value]) -> LogoResult<Value> {
    let found = match &args[0] {
        Value::List(l) => l.first().cloned(),
        Value::Word(w) => w.as_str().chars().next().map(char_word),
    };
    found.ok_or_else(|| bad_input(name, &args[0]).into())
}

fn last(name: &str, args: &[Value]) -> LogoResult<Value> {
    let found = match &args[0] {
        Value::List(l) => l.last().cloned(),
        Value::Word(w) => w.as_str().chars().last().map(char_word),
    };
    found.ok_or_else(|| bad_input(name, &args[0]).into())
}

fn butfirst(name: &str, args: &[Value]) -> LogoResult<Value> {
    let found = match &args[0] {
        Value::List(l) => l.butfirst().map(Value::List),
        Value::Word(w) => {
            let s = w.as_str();
            let mut it = s.chars();
            it.next().map(|_| text(it.collect()))
        }
    };
    found.ok_or_else(|| bad_input(name, &args[0]).into())
}

fn butlast(name: &str, args: &[Value]) -> LogoResult<Value> {
    let found = match &args[0] {
        Value::List(l) => l.butlast().map(Value::List),
        Value::Word(w) => {
            let s = w.as_str();
            let mut it = s.chars();
            it.next_back().map(|_| text(it.collect()))
        }
    };
    found.ok_or_else(|| bad_input(name, &args[0]).into())
}

fn item(name: &str, args: &[Value]) -> LogoResult<Value> {
    let index = integer(name, &args[0])?;
    let out_of_range = || bad_input(name, &args[0]);
    let index = usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .ok_or_else(out_of_range)?;
    let found = match &args[1] {
        Value::List(l) => l.get(index).cloned(),
        Value::Word(w) => w.as_str().chars().nth(index).map(char_word),
    };
    found.ok_or_else(|| out_of_range().into())
}

fn remove(_name: &str, args: &[Value]) -> LogoResult<Value> {
    let thing = &args[0];
    Ok(match &args[1] {
        Value::List(l) => Value::List(l.iter().filter(|v| !v.equalp(thing)).cloned().collect()),
        Value::Word(w) => text(
            chars(w)
                .into_iter()
                .filter(|c| !char_word(*c).equalp(thing))
                .collect(),
        ),
    })
}

fn reverse(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(match &args[0] {
        Value::List(l) => Value::List(l.reverse()),
        Value::Word(w) => text(w.as_str().chars().rev().collect()),
    })
}

fn count(_name: &str, args: &[Value]) -> LogoResult<Value> {
    let n = match &args[0] {
        Value::List(l) => l.len(),
        Value::Word(w) => w.as_str().chars().count(),
    };
    Ok(Value::Word(Word::from(i64::try_from(n).unwrap_or(i64::MAX))))
}

fn uppercase(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(text(word_arg(name, &args[0])?.as_str().to_uppercase()))
}

fn lowercase(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(text(word_arg(name, &args[0])?.as_str().to_lowercase()))
}

fn char_of(name: &str, args: &[Value]) -> LogoResult<Value> {
    let code = integer(name, &args[0])?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(char_word)
        .ok_or_else(|| bad_input(name, &args[0]).into())
}

fn ascii(name: &str, args: &[Value]) -> LogoResult<Value> {
    let letters = chars(word_arg(name, &args[0])?);
    match letters[..] {
        [c] => Ok(Value::Word(Word::from(i64::from(u32::from(c))))),
        _ => Err(bad_input(name, &args[0]).into()),
    }
}

fn member(name: &str, args: &[Value]) -> LogoResult<Value> {
    let thing = &args[0];
    match &args[1] {
        Value::List(l) => {
            let mut tail = l.clone();
            while let Some(candidate) = tail.first() {
                if candidate.equalp(thing) {
                    return Ok(Value::List(tail));
                }
                tail = tail.butfirst().unwrap_or_default();
            }
            Ok(Value::empty_list())
        }
        Value::Word(w) => {
            word_arg(name, thing)?;
            let letters = chars(w);
            let start = letters.iter().position(|c| char_word(*c).equalp(thing));
            Ok(text(
                start.map_or_else(String::new, |i| letters[i..].iter().collect()),
            ))
        }
    }
}

// ── Predicates ──────────────────────────────────────────────────────

fn emptyp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(args[0].is_empty()))
}

fn wordp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(args[0].as_word().is_some()))
}

fn listp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(args[0].as_list().is_some()))
}

fn numberp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(args[0].as_number().is_some()))
}

fn equalp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(args[0].equalp(&args[1])))
}

fn notequalp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(!args[0].equalp(&args[1])))
}

fn memberp(_name: &str, args: &[Value]) -> LogoResult<Value> {
    let thing = &args[0];
    let found = match &args[1] {
        Value::List(l) => l.iter().any(|v| v.equalp(thing)),
        Value::Word(w) => {
            thing.as_word().is_some() && chars(w).into_iter().any(|c| char_word(c).equalp(thing))
        }
    };
    Ok(Value::boolean(found))
}

fn beforep(name: &str, args: &[Value]) -> LogoResult<Value> {
    let a = word_arg(name, &args[0])?.as_str().to_lowercase();
    let b = word_arg(name, &args[1])?.as_str().to_lowercase();
    Ok(Value::boolean(a < b))
}

// ── Arithmetic ──────────────────────────────────────────────────────

fn add(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_add(y)
            .map_or_else(|| Number::Real(a.as_f64() + b.as_f64()), Number::Int),
        _ => Number::Real(a.as_f64() + b.as_f64()),
    }
}

fn multiply(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_mul(y)
            .map_or_else(|| Number::Real(a.as_f64() * b.as_f64()), Number::Int),
        _ => Number::Real(a.as_f64() * b.as_f64()),
    }
}

fn negated(n: Number) -> Number {
    match n {
        Number::Int(x) => x
            .checked_neg()
            .map_or_else(|| Number::Real(-n.as_f64()), Number::Int),
        Number::Real(x) => Number::Real(-x),
    }
}

fn divide(name: &str, a: Number, b: Number, divisor: &Value) -> LogoResult<Number> {
    if b.is_zero() {
        return Err(bad_input(name, divisor).into());
    }
    if let (Number::Int(x), Number::Int(y)) = (a, b)
        && x.checked_rem(y) == Some(0)
        && let Some(q) = x.checked_div(y)
    {
        return Ok(Number::Int(q));
    }
    Ok(Number::Real(a.as_f64() / b.as_f64()))
}

fn real(x: f64) -> Value {
    Value::number(Number::Real(x))
}

/// Refuse a result that overflowed the reals, blaming `culprit`.
fn finite(name: &str, n: Number, culprit: &Value) -> Result<Number, LogoDiagnostic> {
    if n.as_f64().is_finite() {
        Ok(n)
    } else {
        Err(bad_input(name, culprit))
    }
}

fn sum(name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut acc = Number::Int(0);
    for arg in args {
        acc = finite(name, add(acc, number(name, arg)?), arg)?;
    }
    Ok(Value::number(acc))
}

fn difference(name: &str, args: &[Value]) -> LogoResult<Value> {
    let a = number(name, &args[0])?;
    let b = number(name, &args[1])?;
    Ok(Value::number(finite(name, add(a, negated(b)), &args[1])?))
}

fn product(name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut acc = Number::Int(1);
    for arg in args {
        acc = finite(name, multiply(acc, number(name, arg)?), arg)?;
    }
    Ok(Value::number(acc))
}

fn quotient(name: &str, args: &[Value]) -> LogoResult<Value> {
    let (a, b, divisor) = match args {
        [x] => (Number::Int(1), number(name, x)?, x),
        [x, y, ..] => (number(name, x)?, number(name, y)?, y),
        [] => return Err(crate::error::not_enough_inputs(name).into()),
    };
    let q = divide(name, a, b, divisor)?;
    Ok(Value::number(finite(name, q, divisor)?))
}

fn remainder(name: &str, args: &[Value]) -> LogoResult<Value> {
    let a = number(name, &args[0])?;
    let b = number(name, &args[1])?;
    if b.is_zero() {
        return Err(bad_input(name, &args[1]).into());
    }
    Ok(Value::number(match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x.checked_rem(y).unwrap_or(0)),
        _ => Number::Real(a.as_f64() % b.as_f64()),
    }))
}

/// Like REMAINDER, but the result takes the sign of the divisor.
fn modulo(name: &str, args: &[Value]) -> LogoResult<Value> {
    let a = number(name, &args[0])?;
    let b = number(name, &args[1])?;
    if b.is_zero() {
        return Err(bad_input(name, &args[1]).into());
    }
    Ok(Value::number(match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let r = x.checked_rem(y).unwrap_or(0);
            Number::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r })
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let r = x % y;
            Number::Real(if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r })
        }
    }))
}

fn minus(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::number(negated(number(name, &args[0])?)))
}

fn abs(name: &str, args: &[Value]) -> LogoResult<Value> {
    let n = number(name, &args[0])?;
    Ok(Value::number(match n {
        Number::Int(x) if x < 0 => negated(n),
        Number::Real(x) => Number::Real(x.abs()),
        other => other,
    }))
}

fn whole(x: f64) -> Value {
    Value::number(Number::Real(x).as_int().map_or(Number::Real(x), Number::Int))
}

fn int(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(match number(name, &args[0])? {
        Number::Int(x) => Value::number(Number::Int(x)),
        Number::Real(x) => whole(x.trunc()),
    })
}

fn round(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(match number(name, &args[0])? {
        Number::Int(x) => Value::number(Number::Int(x)),
        Number::Real(x) => whole(x.round()),
    })
}

fn sqrt(name: &str, args: &[Value]) -> LogoResult<Value> {
    let x = float(name, &args[0])?;
    if x < 0.0 {
        return Err(bad_input(name, &args[0]).into());
    }
    Ok(real(x.sqrt()))
}

fn power(name: &str, args: &[Value]) -> LogoResult<Value> {
    let base = number(name, &args[0])?;
    let exponent = number(name, &args[1])?;
    if let (Number::Int(b), Number::Int(e)) = (base, exponent)
        && let Ok(e) = u32::try_from(e)
        && let Some(n) = b.checked_pow(e)
    {
        return Ok(Value::number(Number::Int(n)));
    }
    let result = base.as_f64().powf(exponent.as_f64());
    Ok(Value::number(finite(name, Number::Real(result), &args[0])?))
}

fn exp(name: &str, args: &[Value]) -> LogoResult<Value> {
    let result = Number::Real(float(name, &args[0])?.exp());
    Ok(Value::number(finite(name, result, &args[0])?))
}

fn ln(name: &str, args: &[Value]) -> LogoResult<Value> {
    let x = float(name, &args[0])?;
    if x <= 0.0 {
        return Err(bad_input(name, &args[0]).into());
    }
    Ok(real(x.ln()))
}

fn log10(name: &str, args: &[Value]) -> LogoResult<Value> {
    let x = float(name, &args[0])?;
    if x <= 0.0 {
        return Err(bad_input(name, &args[0]).into());
    }
    Ok(real(x.log10()))
}

/// Sine of an angle in degrees, exact at multiples of 90.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn sin_degrees(degrees: f64) -> f64 {
    let quarter = degrees / 90.0;
    if quarter == quarter.trunc() && quarter.abs() < 1e15 {
        return match (quarter as i64).rem_euclid(4) {
            1 => 1.0,
            3 => -1.0,
            _ => 0.0,
        };
    }
    degrees.to_radians().sin()
}

fn sin(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(real(sin_degrees(float(name, &args[0])?)))
}

fn cos(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(real(sin_degrees(float(name, &args[0])? + 90.0)))
}

/// `arctan x` or `(arctan x y)`, in degrees.
fn arctan(name: &str, args: &[Value]) -> LogoResult<Value> {
    let x = float(name, &args[0])?;
    let angle = match args.get(1) {
        Some(y) => float(name, y)?.atan2(x),
        None => x.atan(),
    };
    Ok(real(angle.to_degrees()))
}

fn fold_bits(name: &str, args: &[Value], init: i64, f: fn(i64, i64) -> i64) -> LogoResult<Value> {
    let mut acc = init;
    for arg in args {
        acc = f(acc, integer(name, arg)?);
    }
    Ok(Value::number(Number::Int(acc)))
}

fn bitand(name: &str, args: &[Value]) -> LogoResult<Value> {
    fold_bits(name, args, -1, |a, b| a & b)
}

fn bitor(name: &str, args: &[Value]) -> LogoResult<Value> {
    fold_bits(name, args, 0, |a, b| a | b)
}

fn bitxor(name: &str, args: &[Value]) -> LogoResult<Value> {
    fold_bits(name, args, 0, |a, b| a ^ b)
}

fn bitnot(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::number(Number::Int(!integer(name, &args[0])?)))
}

/// Arithmetic shift: left for positive counts, sign-extending right for
/// negative ones.
fn ashift(name: &str, args: &[Value]) -> LogoResult<Value> {
    let n = integer(name, &args[0])?;
    let by = integer(name, &args[1])?;
    let shift = u32::try_from(by.unsigned_abs().min(63)).unwrap_or(63);
    Ok(Value::number(Number::Int(if by >= 0 {
        n.checked_shl(shift).unwrap_or(0)
    } else {
        n >> shift
    })))
}

/// Logical shift: right shifts fill with zeros.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn lshift(name: &str, args: &[Value]) -> LogoResult<Value> {
    let n = integer(name, &args[0])?;
    let by = integer(name, &args[1])?;
    let shift = u32::try_from(by.unsigned_abs().min(63)).unwrap_or(63);
    Ok(Value::number(Number::Int(if by >= 0 {
        n.checked_shl(shift).unwrap_or(0)
    } else {
        ((n as u64) >> shift) as i64
    })))
}

// ── Comparison and logic ────────────────────────────────────────────

fn compare(name: &str, args: &[Value]) -> LogoResult<Ordering> {
    let a = number(name, &args[0])?;
    let b = number(name, &args[1])?;
    let ordering = match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    };
    ordering.ok_or_else(|| bad_input(name, &args[0]).into())
}

fn lessp(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(compare(name, args)? == Ordering::Less))
}

fn greaterp(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(compare(name, args)? == Ordering::Greater))
}

fn lessequalp(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(compare(name, args)? != Ordering::Greater))
}

fn greaterequalp(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(compare(name, args)? != Ordering::Less))
}

fn and(name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut result = true;
    for arg in args {
        result &= truth(name, arg)?;
    }
    Ok(Value::boolean(result))
}

fn or(name: &str, args: &[Value]) -> LogoResult<Value> {
    let mut result = false;
    for arg in args {
        result |= truth(name, arg)?;
    }
    Ok(Value::boolean(result))
}

fn not(name: &str, args: &[Value]) -> LogoResult<Value> {
    Ok(Value::boolean(!truth(name, &args[0])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_list;
    use crate::signal::Unwind;

    fn call(name: &str, args: &[Value]) -> LogoResult<Value> {
        match lookup(name).map(|p| p.func) {
            Some(PrimFn::Op(f)) => f(name, args),
            _ => panic!("{name} is not an operation"),
        }
    }

    fn n(x: i64) -> Value {
        Value::Word(Word::from(x))
    }

    fn data(source: &str) -> Value {
        Value::List(parse_list(source).unwrap())
    }

    fn show(result: LogoResult<Value>) -> String {
        match result {
            Ok(v) => v.to_string(),
            Err(Unwind::Error(d)) => format!("error: {d}"),
            Err(other) => format!("{other:?}"),
        }
    }

    #[test]
    fn lookup_is_case_insensitive_with_aliases() {
        assert_eq!(lookup("FORWARD").map(Primitive::name), Some("forward"));
        assert_eq!(lookup("Fd").map(Primitive::name), Some("forward"));
        assert_eq!(lookup("se").map(Primitive::name), Some("sentence"));
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn integer_arithmetic_stays_exact() {
        assert_eq!(show(call("sum", &[n(2), n(3), n(4)])), "9");
        assert_eq!(show(call("quotient", &[n(10), n(4)])), "2.5");
        assert_eq!(show(call("quotient", &[n(10), n(5)])), "2");
        assert_eq!(show(call("product", &[n(i64::MAX), n(2)])), "1.84467440737096e19");
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            show(call("quotient", &[n(1), n(0)])),
            "error: quotient doesn't like 0 as input"
        );
    }

    #[test]
    fn remainder_and_modulo_signs() {
        assert_eq!(show(call("remainder", &[n(-7), n(3)])), "-1");
        assert_eq!(show(call("modulo", &[n(-7), n(3)])), "2");
        assert_eq!(show(call("modulo", &[n(7), n(-3)])), "-2");
    }

    #[test]
    fn rounding() {
        assert_eq!(show(call("int", &[Value::word("3.7")])), "3");
        assert_eq!(show(call("int", &[Value::word("-3.7")])), "-3");
        assert_eq!(show(call("round", &[Value::word("2.5")])), "3");
        assert_eq!(show(call("sqrt", &[n(16)])), "4");
        assert_eq!(show(call("power", &[n(2), n(10)])), "1024");
    }

    #[test]
    fn trig_in_degrees() {
        assert_eq!(show(call("sin", &[n(90)])), "1");
        assert_eq!(show(call("cos", &[n(180)])), "-1");
        assert_eq!(show(call("arctan", &[n(1)])), "45");
    }

    #[test]
    fn overflow_is_rejected() {
        let big = Value::word("1e308");
        assert_eq!(
            show(call("sum", &[big.clone(), big.clone()])),
            "error: sum doesn't like 1e308 as input"
        );
        assert_eq!(
            show(call("product", &[big, n(10)])),
            "error: product doesn't like 10 as input"
        );
        assert_eq!(
            show(call("exp", &[n(1000)])),
            "error: exp doesn't like 1000 as input"
        );
        assert_eq!(
            show(call("power", &[n(10), n(400)])),
            "error: power doesn't like 10 as input"
        );
        assert_eq!(
            show(call("sum", &[Value::word("1e400"), n(1)])),
            "error: sum doesn't like 1e400 as input"
        );
    }

    #[test]
    fn text_is_rejected_by_arithmetic() {
        assert_eq!(
            show(call("sum", &[n(1), Value::word("x")])),
            "error: sum doesn't like x as input"
        );
    }

    #[test]
    fn list_selectors() {
        let abc = data("a b c");
        assert_eq!(show(call("first", &[abc.clone()])), "a");
        assert_eq!(show(call("last", &[abc.clone()])), "c");
        assert_eq!(show(call("butfirst", &[abc.clone()])), "[b c]");
        assert_eq!(show(call("butlast", &[abc.clone()])), "[a b]");
        assert_eq!(show(call("item", &[n(2), abc.clone()])), "b");
        assert_eq!(show(call("count", &[abc])), "3");
        assert!(call("first", &[Value::empty_list()]).is_err());
    }

    #[test]
    fn word_selectors() {
        assert_eq!(show(call("first", &[Value::word("hello")])), "h");
        assert_eq!(show(call("butfirst", &[Value::word("hello")])), "ello");
        assert_eq!(show(call("count", &[Value::word("hello")])), "5");
        assert_eq!(show(call("reverse", &[Value::word("abc")])), "cba");
    }

    #[test]
    fn constructors() {
        assert_eq!(show(call("sentence", &[data("a b"), Value::word("c")])), "[a b c]");
        assert_eq!(show(call("list", &[data("a b"), Value::word("c")])), "[[a b] c]");
        assert_eq!(show(call("fput", &[Value::word("x"), data("y")])), "[x y]");
        assert_eq!(show(call("lput", &[Value::word("x"), data("y")])), "[y x]");
        assert_eq!(show(call("word", &[Value::word("ab"), n(12)])), "ab12");
    }

    #[test]
    fn membership() {
        let list = data("a b c");
        assert_eq!(show(call("memberp", &[Value::word("B"), list.clone()])), "true");
        assert_eq!(show(call("member", &[Value::word("b"), list.clone()])), "[b c]");
        assert_eq!(show(call("remove", &[Value::word("b"), list])), "[a c]");
        assert_eq!(show(call("memberp", &[Value::word("l"), Value::word("hello")])), "true");
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(show(infix("<", &n(1), &n(2))), "true");
        assert_eq!(show(infix("=", &Value::word("ABC"), &Value::word("abc"))), "true");
        assert_eq!(show(infix("<>", &n(1), &n(1))), "false");
        assert_eq!(
            show(call("and", &[Value::word("true"), Value::word("false")])),
            "false"
        );
        assert_eq!(
            show(call("not", &[n(1)])),
            "error: not doesn't like 1 as input"
        );
    }

    #[test]
    fn bit_operations() {
        assert_eq!(show(call("bitand", &[n(12), n(10)])), "8");
        assert_eq!(show(call("bitor", &[n(12), n(10)])), "14");
        assert_eq!(show(call("ashift", &[n(-8), n(-1)])), "-4");
        assert_eq!(show(call("lshift", &[n(1), n(4)])), "16");
    }

    #[test]
    fn characters() {
        assert_eq!(show(call("char", &[n(65)])), "A");
        assert_eq!(show(call("ascii", &[Value::word("a")])), "97");
        assert_eq!(show(call("uppercase", &[Value::word("Logo")])), "LOGO");
    }
}
