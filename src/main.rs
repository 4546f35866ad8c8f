mod repl;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clasp_logo::{Config, ControlSignal, DEFAULT_MAX_CALL_DEPTH, Interpreter, Outcome};

#[derive(Parser)]
#[command(name = "logo")]
#[command(about = "A Logo interpreter with turtle graphics")]
#[command(version)]
struct Cli {
    /// Logo source file to run
    source: Option<PathBuf>,

    /// Run Logo instructions directly
    #[arg(short = 'e', long)]
    eval: Option<String>,

    /// Start the interactive REPL (after running the source file, if any)
    #[arg(short, long)]
    interactive: bool,

    /// Seed for RANDOM and PICK, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum procedure call depth
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Print graphics events as they happen
    #[arg(long)]
    events: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let base_dir = cli
        .source
        .as_deref()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from);
    let mut interp = Interpreter::with_config(Config {
        seed: cli.seed,
        max_call_depth: cli.max_depth,
        base_dir,
    });
    interp.set_text_sink(Box::new(|text| {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }));
    if cli.events {
        interp.set_graphics_sink(Box::new(|event| println!("{event:?}")));
    }

    if let Some(source) = &cli.eval {
        let outcome = interp.execute(source);
        return exit_code(&outcome);
    }

    if let Some(path) = &cli.source {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("logo: cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        let outcome = interp.execute(&source);
        if !cli.interactive || outcome.control_signal == ControlSignal::StopRequested {
            return exit_code(&outcome);
        }
        report(&outcome);
    }

    repl::run(&mut interp);
    ExitCode::SUCCESS
}

/// Show what an `execute` call left behind: the value, or the error.
pub(crate) fn report(outcome: &Outcome) {
    if let Some(value) = &outcome.produced_value {
        println!("{value}");
    }
    if let Some(message) = &outcome.error_message {
        eprintln!("{message}");
    }
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    report(outcome);
    if outcome.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
