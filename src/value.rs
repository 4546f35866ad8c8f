//! Logo values: words and lists.
//!
//! A word is either a number or a piece of text; text that happens to spell a
//! number behaves as that number wherever arithmetic or comparison asks for
//! one. Lists are persistent cons lists: `fput` and `butfirst` share
//! structure, and nothing visible to a Logo program is ever mutated in place.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

// ── Numbers ─────────────────────────────────────────────────────────

/// A numeric word.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    /// Parse a numeric literal: optional sign, digits with an optional
    /// decimal point, optional exponent.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let mut i = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            i += 1;
        }
        let mut digits = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
        let mut integral = true;
        if i < bytes.len() && bytes[i] == b'.' {
            integral = false;
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
            integral = false;
            i += 1;
            if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
                i += 1;
            }
            let exp_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == exp_start {
                return None;
            }
        }
        if i != bytes.len() {
            return None;
        }
        if integral && let Ok(n) = s.parse::<i64>() {
            return Some(Self::Int(n));
        }
        s.parse::<f64>().ok().filter(|x| x.is_finite()).map(Self::Real)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Real(x) => x,
        }
    }

    /// The integer value, if this number has no fractional part.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            Self::Real(x) if x.is_finite() && x == x.trunc() && x.abs() < 9.0e18 => {
                Some(x as i64)
            }
            Self::Real(_) => None,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(n) => n == 0,
            Self::Real(x) => x == 0.0,
        }
    }

    #[allow(clippy::float_cmp)]
    fn same(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Real(x) => f.write_str(&format_real(x)),
        }
    }
}

/// Format a real the way Logo prints it: whole values without a point,
/// at most 15 significant digits, trailing zeros trimmed.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn format_real(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == x.trunc() && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    let abs = x.abs();
    if !(1e-5..1e15).contains(&abs) {
        let s = format!("{x:.14e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_fraction(mantissa)),
            None => s,
        };
    }
    let int_digits = abs.log10().floor() as i32 + 1;
    let decimals = (15 - int_digits).clamp(0, 20) as usize;
    trim_fraction(&format!("{x:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ── Words ───────────────────────────────────────────────────────────

/// An atomic Logo value.
#[derive(Debug, Clone)]
pub enum Word {
    Number(Number),
    Text(Rc<str>),
}

impl Word {
    /// The numeric value, for numbers and for text spelling a number.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => Number::parse(t),
        }
    }

    /// The printed characters of the word.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Text(t) => Cow::Borrowed(t),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(t) => t.is_empty(),
        }
    }

    /// `true` / `false`, case-insensitively.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Text(t) if t.eq_ignore_ascii_case("true") => Some(true),
            Self::Text(t) if t.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Logo equality: numeric when both sides are numbers, otherwise
    /// case-insensitive text comparison.
    pub fn equalp(&self, other: &Word) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.same(b),
            _ => self.as_str().to_lowercase() == other.as_str().to_lowercase(),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
        }
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Self::Text(Rc::from(s))
    }
}

impl From<String> for Word {
    fn from(s: String) -> Self {
        Self::Text(Rc::from(s))
    }
}

impl From<i64> for Word {
    fn from(n: i64) -> Self {
        Self::Number(Number::Int(n))
    }
}

impl From<f64> for Word {
    fn from(x: f64) -> Self {
        Self::Number(Number::Real(x))
    }
}

impl From<Number> for Word {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Word {
    fn from(b: bool) -> Self {
        Self::from(if b { "true" } else { "false" })
    }
}

// ── Lists ───────────────────────────────────────────────────────────

/// A persistent, reference-counted list.
#[derive(Clone, Default)]
pub struct List {
    head: Option<Rc<Node>>,
}

struct Node {
    first: Value,
    rest: List,
}

impl List {
    pub fn new() -> Self {
        Self { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// A new list with `value` in front; the receiver becomes its tail.
    #[must_use]
    pub fn fput(&self, value: Value) -> Self {
        Self {
            head: Some(Rc::new(Node {
                first: value,
                rest: self.clone(),
            })),
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.head.as_deref().map(|node| &node.first)
    }

    /// Everything but the first element, sharing structure.
    pub fn butfirst(&self) -> Option<Self> {
        self.head.as_deref().map(|node| node.rest.clone())
    }

    pub fn last(&self) -> Option<&Value> {
        self.iter().last()
    }

    pub fn butlast(&self) -> Option<Self> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        Some(self.iter().take(len - 1).cloned().collect())
    }

    #[must_use]
    pub fn lput(&self, value: Value) -> Self {
        self.iter().cloned().chain(std::iter::once(value)).collect()
    }

    #[must_use]
    pub fn reverse(&self) -> Self {
        self.iter()
            .fold(Self::new(), |acc, value| acc.fput(value.clone()))
    }

    /// Zero-based element access.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.iter().nth(index)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }
}

impl Drop for List {
    // Unlink uniquely owned nodes one at a time so long lists don't
    // recurse through `Rc` drops.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => next = node.rest.head.take(),
                Err(_) => break,
            }
        }
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Self::new(), |acc, value| acc.fput(value))
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let node = self.next?;
        self.next = node.rest.head.as_deref();
        Some(&node.first)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Any Logo datum.
#[derive(Debug, Clone)]
pub enum Value {
    Word(Word),
    List(List),
}

impl Value {
    pub fn word(s: &str) -> Self {
        Self::Word(Word::from(s))
    }

    pub fn number(n: Number) -> Self {
        Self::Word(Word::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        Self::Word(Word::from(b))
    }

    pub fn empty_list() -> Self {
        Self::List(List::new())
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Self::Word(w) => Some(w),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            Self::Word(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        self.as_word().and_then(Word::as_number)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Word(w) => w.is_empty(),
            Self::List(l) => l.is_empty(),
        }
    }

    pub fn equalp(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Word(a), Self::Word(b)) => a.equalp(b),
            (Self::List(a), Self::List(b)) => {
                let mut left = a.iter();
                let mut right = b.iter();
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => return true,
                        (Some(x), Some(y)) if x.equalp(y) => {}
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    /// The `print` form: a top-level list loses its brackets.
    pub fn print_form(&self) -> String {
        match self {
            Self::Word(w) => w.to_string(),
            Self::List(l) => join(l),
        }
    }
}

fn join(list: &List) -> String {
    list.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `show` form: brackets at every level.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{w}"),
            Self::List(l) => write!(f, "[{}]", join(l)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equalp(other)
    }
}

impl From<Word> for Value {
    fn from(w: Word) -> Self {
        Self::Word(w)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Self::List(l)
    }
}
