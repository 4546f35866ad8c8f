//! Procedures, recursion and scoping.

use std::process::Command;

fn run_logo(source: &str) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_logo"))
        .args(["-e", source])
        .output()
        .expect("failed to run logo");
    assert!(
        output.status.success(),
        "logo exited with error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout)
        .expect("non-utf8 output")
        .trim()
        .to_string()
}

fn run_logo_err(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_logo"))
        .args(args)
        .output()
        .expect("failed to run logo");
    let stderr = String::from_utf8(output.stderr)
        .expect("non-utf8 stderr")
        .trim()
        .to_string();
    (output.status.success(), stderr)
}

const FACTORIAL: &str = "to fact :n\nif :n = 0 [output 1]\noutput :n * fact :n - 1\nend\n";

#[test]
fn recursive_factorial() {
    assert_eq!(run_logo(&format!("{FACTORIAL}print fact 5")), "120");
    assert_eq!(run_logo(&format!("{FACTORIAL}print fact 0")), "1");
}

#[test]
fn accumulator_recursion() {
    let src = "to facacc :n :acc\nif :n = 0 [output :acc]\noutput facacc :n - 1 :acc * :n\nend\n\
               print facacc 5 1";
    assert_eq!(run_logo(src), "120");
}

#[test]
fn deep_recursion_within_limit() {
    let src = "to down :n\nif :n = 0 [stop]\ndown :n - 1\nend\ndown 5000 print \"done";
    assert_eq!(run_logo(src), "done");
}

#[test]
fn recursion_limit_is_reported() {
    let (ok, stderr) = run_logo_err(&["--max-depth", "50", "-e", "to down\ndown\nend\ndown"]);
    assert!(!ok);
    assert!(stderr.starts_with("Stack overflow in down"), "{stderr}");
}

#[test]
fn local_shadows_global_for_one_call() {
    let src = "make \"x \"global\n\
               to f\nlocal \"x\nmake \"x \"local\nprint :x\nend\n\
               f print :x";
    assert_eq!(run_logo(src), "local\nglobal");
}

#[test]
fn local_is_invisible_after_return() {
    let src = "to f\nlocalmake \"y 1\nend\nf print namep \"y";
    assert_eq!(run_logo(src), "false");
}

#[test]
fn callee_sees_caller_inputs() {
    let src = "to outer :v\ninner\nend\nto inner\nprint :v\nend\nouter \"seen";
    assert_eq!(run_logo(src), "seen");
}

#[test]
fn make_without_local_sets_global() {
    let src = "to f\nmake \"g 9\nend\nf print :g";
    assert_eq!(run_logo(src), "9");
}

#[test]
fn names_are_case_insensitive() {
    assert_eq!(run_logo("to Greet\nprint \"hi\nend\nGREET"), "hi");
}

#[test]
fn text_round_trips_through_define() {
    let src = "to sq :s\nrepeat 4 [fd :s rt 90]\nend\n\
               define \"sq2 text \"sq\nshow text \"sq2";
    assert_eq!(run_logo(src), "[[s] [repeat 4 [fd :s rt 90]]]");
}

#[test]
fn po_prints_source() {
    assert_eq!(run_logo("to hi\nprint \"hello\nend\npo \"hi"), "to hi\nprint \"hello\nend");
}

#[test]
fn undefined_procedure() {
    let (ok, stderr) = run_logo_err(&["-e", "frobnicate 3"]);
    assert!(!ok);
    assert_eq!(stderr, "I don't know how to frobnicate");
}

#[test]
fn error_inside_procedure_names_it() {
    let (ok, stderr) = run_logo_err(&["-e", "to f\nprint :missing\nend\nf"]);
    assert!(!ok);
    assert_eq!(stderr, "missing has no value\n  in f: [print :missing]");
}

#[test]
fn value_without_consumer_in_body() {
    let (ok, stderr) = run_logo_err(&["-e", "to f\nsum 1 2\nend\nf"]);
    assert!(!ok);
    assert!(stderr.starts_with("You don't say what to do with 3"), "{stderr}");
}

#[test]
fn missing_end() {
    let (ok, stderr) = run_logo_err(&["-e", "to f\nprint 1"]);
    assert!(!ok);
    assert_eq!(stderr, "TO f without END");
}
