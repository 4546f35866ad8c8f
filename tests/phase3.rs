//! Non-local control flow: STOP, OUTPUT, CATCH/THROW, ERROR, BYE.

use std::process::Command;

struct Run {
    ok: bool,
    stdout: String,
    stderr: String,
}

fn run_logo(source: &str) -> Run {
    let output = Command::new(env!("CARGO_BIN_EXE_logo"))
        .args(["-e", source])
        .output()
        .expect("failed to run logo");
    Run {
        ok: output.status.success(),
        stdout: String::from_utf8(output.stdout)
            .expect("non-utf8 output")
            .trim()
            .to_string(),
        stderr: String::from_utf8(output.stderr)
            .expect("non-utf8 stderr")
            .trim()
            .to_string(),
    }
}

#[test]
fn catch_returns_thrown_value() {
    let run = run_logo("print catch \"tag [print \"before (throw \"tag 42) print \"after]");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "before\n42");
}

#[test]
fn unmatched_throw_propagates_past_catch() {
    let run = run_logo("catch \"tag [throw \"other 1] print \"unreached");
    assert!(!run.ok);
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "Can't find catch tag for other");
}

#[test]
fn bare_throw_carries_its_value() {
    let run = run_logo("print catch \"tag [throw \"tag 42]");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "42");

    let run = run_logo("make \"x [a b] show catch \"tag [throw \"tag :x]");
    assert_eq!(run.stdout, "[a b]");
}

#[test]
fn throw_without_its_tag_is_a_catchable_error() {
    let run = run_logo("catch \"error [throw \"nosuch] print \"recovered show error");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "recovered\n[14 Can't find catch tag for nosuch [] []]");

    let src = "to f\nthrow \"nosuch\nend\ncatch \"error [f] print \"recovered show error";
    let run = run_logo(src);
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(
        run.stdout,
        "recovered\n[14 Can't find catch tag for nosuch f [throw \"nosuch]]"
    );
}

#[test]
fn inner_catch_does_not_hide_outer_tag() {
    let run = run_logo("print catch \"outer [catch \"inner [throw \"outer 5] print \"skipped]");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "5");
}

#[test]
fn throw_crosses_procedures() {
    let src = "to deep :n\nif :n = 0 [(throw \"out :n)]\ndeep :n - 1\nend\n\
               print catch \"out [deep 20]";
    let run = run_logo(src);
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "0");
}

#[test]
fn catch_error_then_error_reports_it() {
    let run = run_logo("catch \"error [print 1 / 0] show error");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "[7 / doesn't like 0 as input [] []]");
}

#[test]
fn caught_error_keeps_procedure_context() {
    let run = run_logo("to f\nprint :x\nend\ncatch \"error [f] show error");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "[11 x has no value f [print :x]]");
}

#[test]
fn side_effects_before_error_persist() {
    let run = run_logo("make \"n 1 catch \"error [make \"n 2 print :nope make \"n 3] print :n");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "2");
}

#[test]
fn throw_toplevel_is_quiet() {
    let run = run_logo("print 1 throw \"toplevel print 2");
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "1");
}

#[test]
fn stop_at_top_level_is_quiet() {
    let run = run_logo("print 1 stop print 2");
    assert!(run.ok);
    assert_eq!(run.stdout, "1");
}

#[test]
fn output_at_top_level_fails() {
    let run = run_logo("output 5");
    assert!(!run.ok);
    assert_eq!(run.stderr, "Can only use output inside a procedure");
}

#[test]
fn bye_ends_the_run() {
    let run = run_logo("print 1 bye print 2");
    assert!(run.ok);
    assert_eq!(run.stdout, "1");
}

#[test]
fn user_error_message() {
    let run = run_logo("(throw \"error [disk on fire])");
    assert!(!run.ok);
    assert_eq!(run.stderr, "disk on fire");
}

#[test]
fn syntax_errors_abort_before_running() {
    let run = run_logo("print 1\nprint 2]");
    assert!(!run.ok);
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "Unexpected ']'");

    let run = run_logo("print (sum 1 2");
    assert_eq!(run.stderr, "')' not found");
}

#[test]
fn test_flag_belongs_to_the_procedure() {
    let src = "to inner\ntest \"false\nend\n\
               to outer\ntest \"true\ninner\niftrue [print \"kept]\nend\nouter";
    let run = run_logo(src);
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "kept");
}

#[test]
fn loops_with_stop_inside_procedure() {
    let src = "to firstbig :l\noutput foreach :l\nend\n\
               to foreach :l\nrepeat count :l [if (item repcount :l) > 5 [output item repcount :l]]\n\
               output \"none\nend\nprint firstbig [1 7 3 9]";
    let run = run_logo(src);
    assert!(run.ok, "{}", run.stderr);
    assert_eq!(run.stdout, "7");
}
