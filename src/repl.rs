//! Interactive session for the `logo` binary.

use std::path::PathBuf;

use clasp_logo::parser::is_incomplete;
use clasp_logo::{ControlSignal, Interpreter};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const PROMPT: &str = "? ";
const CONTINUATION_PROMPT: &str = "~ ";

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|d| d.join(".logo_history"))
}

pub fn run(interp: &mut Interpreter) {
    println!("clasp-logo {} (interactive)", env!("CARGO_PKG_VERSION"));
    println!("Type Logo instructions. Use BYE to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("logo: cannot initialize line editor: {e}");
            return;
        }
    };
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    // Lines of an instruction that is still open (a list, `~`, or TO).
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };
        match rl.readline(prompt) {
            Ok(line) => {
                if pending.is_empty() && line.trim().is_empty() {
                    continue;
                }
                pending.push_str(&line);
                pending.push('\n');
                if is_incomplete(&pending) {
                    continue;
                }
                let source = std::mem::take(&mut pending);
                let _ = rl.add_history_entry(source.trim_end());
                let outcome = interp.execute(&source);
                crate::report(&outcome);
                if outcome.control_signal == ControlSignal::StopRequested {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) if !pending.is_empty() => pending.clear(),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("logo: {e}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
}
