//! Behavioral properties of the interpreter, checked through the library API.

use clasp_logo::{Config, ControlSignal, Interpreter, List, Value, Word};
use proptest::prelude::*;

fn logo() -> Interpreter {
    Interpreter::with_config(Config {
        seed: Some(3),
        ..Config::default()
    })
}

fn value_of(logo: &mut Interpreter, source: &str) -> String {
    let out = logo.execute(source);
    assert!(out.succeeded, "{source}: {:?}", out.error_message);
    out.produced_value
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn words(items: &[i64]) -> List {
    items.iter().map(|&n| Value::Word(Word::from(n))).collect()
}

fn shown(list: List) -> String {
    Value::from(list).to_string()
}

fn list_source(items: &[i64]) -> String {
    let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(" "))
}

proptest! {
    #[test]
    fn reverse_twice_is_identity(items in prop::collection::vec(-1000i64..1000, 0..40)) {
        let list = words(&items);
        prop_assert_eq!(shown(list.reverse().reverse()), shown(list.clone()));
        prop_assert_eq!(list.reverse().len(), list.len());
    }

    #[test]
    fn fput_then_first_and_butfirst(x in -50i64..50, items in prop::collection::vec(0i64..100, 0..20)) {
        let list = words(&items);
        let grown = list.fput(Value::Word(Word::from(x)));
        prop_assert_eq!(grown.first().map(ToString::to_string), Some(x.to_string()));
        prop_assert_eq!(grown.butfirst().map(shown), Some(shown(list)));
    }

    #[test]
    fn lput_then_last_and_butlast(x in -50i64..50, items in prop::collection::vec(0i64..100, 0..20)) {
        let list = words(&items);
        let grown = list.lput(Value::Word(Word::from(x)));
        prop_assert_eq!(grown.last().map(ToString::to_string), Some(x.to_string()));
        prop_assert_eq!(grown.butlast().map(shown), Some(shown(list)));
    }

    #[test]
    fn logo_count_matches_reverse(items in prop::collection::vec(-9i64..9, 0..12)) {
        let mut logo = logo();
        let source = list_source(&items);
        let direct = value_of(&mut logo, &format!("count {source}"));
        let reversed = value_of(&mut logo, &format!("count reverse {source}"));
        prop_assert_eq!(direct, reversed);
        let twice = value_of(&mut logo, &format!("reverse reverse {source}"));
        prop_assert_eq!(twice, source);
    }
}

#[test]
fn left_to_right_arithmetic() {
    assert_eq!(value_of(&mut logo(), "2 + 3 * 4"), "20");
}

#[test]
fn factorial_through_output() {
    let mut logo = logo();
    logo.execute("to factorial :n\nif :n = 0 [output 1]\noutput :n * factorial :n - 1\nend");
    assert_eq!(value_of(&mut logo, "factorial 5"), "120");
    assert_eq!(value_of(&mut logo, "factorial 0"), "1");
}

#[test]
fn local_scope_ends_with_the_call() {
    let mut logo = logo();
    logo.execute("make \"v 1\nto f\nlocal \"v\nmake \"v 2\noutput :v\nend");
    assert_eq!(value_of(&mut logo, "f"), "2");
    assert_eq!(value_of(&mut logo, ":v"), "1");
}

#[test]
fn catch_yields_thrown_value() {
    assert_eq!(value_of(&mut logo(), "catch \"tag [(throw \"tag 42)]"), "42");
    assert_eq!(value_of(&mut logo(), "catch \"tag [print 1 throw \"tag 42 print 2]"), "42");
    let out = logo().execute("catch \"tag [throw \"other]");
    assert_eq!(out.error_message.as_deref(), Some("Can't find catch tag for other"));
}

#[test]
fn turtle_ends_at_corner() {
    let mut logo = logo();
    logo.execute("forward 100 right 90 forward 100");
    assert_eq!(value_of(&mut logo, "pos"), "[100 100]");
    assert_eq!(value_of(&mut logo, "heading"), "90");
}

#[test]
fn reset_forgets_procedures() {
    let mut logo = logo();
    logo.execute("to greet\noutput \"hi\nend");
    assert_eq!(value_of(&mut logo, "greet"), "hi");
    logo.reset();
    let out = logo.execute("greet");
    assert!(!out.succeeded);
    assert_eq!(out.error_message.as_deref(), Some("I don't know how to greet"));
}

#[test]
fn text_can_be_redefined() {
    let mut logo = logo();
    logo.execute("to area :w :h\noutput :w * :h\nend");
    logo.execute("define \"area2 text \"area");
    assert_eq!(value_of(&mut logo, "area2 3 4"), "12");
    assert_eq!(value_of(&mut logo, "text \"area2"), value_of(&mut logo, "text \"area"));
}

#[test]
fn interpreters_are_independent() {
    let mut a = logo();
    let mut b = logo();
    a.execute("make \"x 1 fd 10");
    assert!(!b.execute(":x").succeeded);
    assert!(b.turtle().position.y.abs() < 1e-9);
}

#[test]
fn failed_execute_keeps_workspace() {
    let mut logo = logo();
    logo.execute("to one\noutput 1\nend");
    let out = logo.execute("print one\nprint nosuch");
    assert!(!out.succeeded);
    assert_eq!(out.text_output, "1\n");
    assert_eq!(value_of(&mut logo, "one"), "1");
}

#[test]
fn bye_signals_the_host() {
    let out = logo().execute("bye");
    assert!(out.succeeded);
    assert_eq!(out.control_signal, ControlSignal::StopRequested);
}

#[test]
fn seeded_interpreters_agree() {
    let first = value_of(&mut logo(), "(list random 1000 random 1000 random 1000)");
    let second = value_of(&mut logo(), "(list random 1000 random 1000 random 1000)");
    assert_eq!(first, second);
}
