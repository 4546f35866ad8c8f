//! The embedding contract: `Interpreter`, its `Config`, and the `Outcome`
//! of each `execute` call.
//!
//! A host hands source text to `execute` and gets back everything that
//! happened: the value left at top level, printed text, graphics intents,
//! and whether the program asked to quit. Text and graphics can instead be
//! streamed to sinks as they are produced.

use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::error::{LogoDiagnostic, LogoError};
use crate::eval::Evaluator;
use crate::files::FileTable;
use crate::loader;
use crate::parser::parse_program;
use crate::signal::{ControlSignal, LogoResult, Unwind};
use crate::turtle::{GraphicsEvent, Turtle, TurtleWorld};
use crate::value::Value;
use crate::workspace::Workspace;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

pub type TextSink = Box<dyn FnMut(&str)>;
pub type GraphicsSink = Box<dyn FnMut(&GraphicsEvent)>;

#[derive(Debug, Clone)]
pub struct Config {
    /// Seed for RANDOM and PICK; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub max_call_depth: usize,
    /// Directory that relative file names resolve against.
    pub base_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            base_dir: None,
        }
    }
}

/// Result of one `execute` or `load_file` call.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub succeeded: bool,
    pub produced_value: Option<Value>,
    /// Printed text, unless a text sink took it.
    pub text_output: String,
    pub error_message: Option<String>,
    pub control_signal: ControlSignal,
    /// Graphics intents, unless a graphics sink took them.
    pub graphics: Vec<GraphicsEvent>,
    /// Whether any turtle primitive produced graphics.
    pub graphics_used: bool,
}

/// Where printed text and graphics intents go.
pub struct Io {
    text_sink: Option<TextSink>,
    graphics_sink: Option<GraphicsSink>,
    text: String,
    graphics: Vec<GraphicsEvent>,
    graphics_used: bool,
    pub files: FileTable,
}

impl Io {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            text_sink: None,
            graphics_sink: None,
            text: String::new(),
            graphics: Vec::new(),
            graphics_used: false,
            files: FileTable::new(base_dir),
        }
    }

    /// Write text to the current file writer, the sink, or the buffer.
    pub fn write(&mut self, text: &str) -> Result<(), LogoDiagnostic> {
        if self.files.write(text)? {
            return Ok(());
        }
        match self.text_sink.as_mut() {
            Some(sink) => sink(text),
            None => self.text.push_str(text),
        }
        Ok(())
    }

    pub fn emit_graphics(&mut self, events: Vec<GraphicsEvent>) {
        if events.is_empty() {
            return;
        }
        self.graphics_used = true;
        match self.graphics_sink.as_mut() {
            Some(sink) => {
                for event in &events {
                    sink(event);
                }
            }
            None => self.graphics.extend(events),
        }
    }

    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    fn take_graphics(&mut self) -> (Vec<GraphicsEvent>, bool) {
        let used = std::mem::replace(&mut self.graphics_used, false);
        (std::mem::take(&mut self.graphics), used)
    }
}

/// A Logo interpreter with its own workspace, turtles and files.
pub struct Interpreter {
    config: Config,
    env: Environment,
    world: TurtleWorld,
    io: Io,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            env: Environment::new(config.seed),
            world: TurtleWorld::new(),
            io: Io::new(config.base_dir.clone()),
            config,
        }
    }

    /// Run source text. Definitions, variables and turtle state persist
    /// across calls, also when the call fails.
    pub fn execute(&mut self, source: &str) -> Outcome {
        tracing::debug!(bytes = source.len(), "execute");
        let result = match parse_program(source) {
            Ok(lines) => self.evaluator().run_program(&lines),
            Err(diag) => Err(diag.into()),
        };
        self.finish(result)
    }

    /// Resolve a source file (see `loader::resolve`) and run it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Outcome {
        let name = path.as_ref().to_string_lossy().into_owned();
        let result = loader::read_source("load", &name, self.config.base_dir.as_deref())
            .and_then(|(source, _)| parse_program(&source))
            .map_err(Unwind::from)
            .and_then(|lines| self.evaluator().run_program(&lines));
        self.finish(result)
    }

    /// Forget every procedure and variable, reset the turtles, close all
    /// files and reseed the random generator. Sinks stay installed.
    pub fn reset(&mut self) {
        tracing::debug!("reset");
        self.env = Environment::new(self.config.seed);
        self.world = TurtleWorld::new();
        self.io.files.close_all();
        self.io.take_text();
        self.io.take_graphics();
    }

    pub fn set_text_sink(&mut self, sink: TextSink) {
        self.io.text_sink = Some(sink);
    }

    pub fn set_graphics_sink(&mut self, sink: GraphicsSink) {
        self.io.graphics_sink = Some(sink);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.env.workspace
    }

    /// The current turtle.
    pub fn turtle(&self) -> &Turtle {
        self.world.current()
    }

    pub fn turtles(&self) -> &TurtleWorld {
        &self.world
    }

    fn evaluator(&mut self) -> Evaluator<'_> {
        Evaluator::new(
            &mut self.env,
            &mut self.world,
            &mut self.io,
            self.config.max_call_depth,
        )
    }

    fn finish(&mut self, result: LogoResult<Option<Value>>) -> Outcome {
        self.env.clear_frames();
        let events = self.world.drain();
        self.io.emit_graphics(events);

        let mut outcome = Outcome {
            succeeded: true,
            ..Outcome::default()
        };
        match result {
            Ok(value) => outcome.produced_value = value,
            Err(Unwind::Stop) => {}
            Err(Unwind::Bye) => outcome.control_signal = ControlSignal::StopRequested,
            Err(Unwind::Throw { tag, .. }) if tag.eq_ignore_ascii_case("toplevel") => {}
            Err(Unwind::Throw { tag, .. }) => {
                outcome.fail(
                    &LogoDiagnostic::new(LogoError::UncaughtThrow)
                        .with_detail(format!("Can't find catch tag for {tag}")),
                );
            }
            Err(Unwind::Output(_)) => {
                outcome.fail(&LogoDiagnostic::new(LogoError::OutsideProcedure));
            }
            Err(Unwind::Error(diag)) => outcome.fail(&diag),
        }

        outcome.text_output = self.io.take_text();
        let (graphics, used) = self.io.take_graphics();
        outcome.graphics = graphics;
        outcome.graphics_used = used;
        outcome
    }
}

impl Outcome {
    fn fail(&mut self, diag: &LogoDiagnostic) {
        tracing::debug!(code = diag.error.number(), error = %diag, "execute failed");
        self.succeeded = false;
        self.error_message = Some(diag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn seeded() -> Interpreter {
        Interpreter::with_config(Config {
            seed: Some(7),
            ..Config::default()
        })
    }

    #[test]
    fn produced_value_and_text() {
        let mut logo = seeded();
        let out = logo.execute("print [hello world]\nsum 2 3");
        assert!(out.succeeded);
        assert_eq!(out.text_output, "hello world\n");
        assert_eq!(out.produced_value.unwrap().to_string(), "5");
        assert_eq!(out.control_signal, ControlSignal::None);
    }

    #[test]
    fn workspace_persists_after_failure() {
        let mut logo = seeded();
        logo.execute("to twice :x\noutput :x * 2\nend");
        let out = logo.execute("make \"a 1\nprint :nothing");
        assert!(!out.succeeded);
        assert_eq!(out.error_message.as_deref(), Some("nothing has no value"));
        let out = logo.execute("twice :a");
        assert_eq!(out.produced_value.unwrap().to_string(), "2");
    }

    #[test]
    fn bye_requests_stop() {
        let mut logo = seeded();
        let out = logo.execute("print 1 bye print 2");
        assert!(out.succeeded);
        assert_eq!(out.text_output, "1\n");
        assert_eq!(out.control_signal, ControlSignal::StopRequested);
    }

    #[test]
    fn uncaught_throw() {
        let mut logo = seeded();
        let out = logo.execute("throw \"oops");
        assert_eq!(out.error_message.as_deref(), Some("Can't find catch tag for oops"));
        let out = logo.execute("print 1 throw \"toplevel print 2");
        assert!(out.succeeded);
        assert_eq!(out.text_output, "1\n");
    }

    #[test]
    fn graphics_are_collected() {
        let mut logo = seeded();
        let out = logo.execute("print 1");
        assert!(!out.graphics_used);
        let out = logo.execute("fd 10 rt 90");
        assert!(out.graphics_used);
        assert_eq!(out.graphics.len(), 2);
    }

    #[test]
    fn sinks_stream_output() {
        let mut logo = seeded();
        let text = Rc::new(RefCell::new(String::new()));
        let events = Rc::new(RefCell::new(0usize));
        let t = Rc::clone(&text);
        logo.set_text_sink(Box::new(move |s| t.borrow_mut().push_str(s)));
        let e = Rc::clone(&events);
        logo.set_graphics_sink(Box::new(move |_| *e.borrow_mut() += 1));
        let out = logo.execute("print \"hi fd 5");
        assert_eq!(out.text_output, "");
        assert!(out.graphics.is_empty());
        assert!(out.graphics_used);
        assert_eq!(*text.borrow(), "hi\n");
        assert_eq!(*events.borrow(), 1);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut logo = seeded();
        logo.execute("to f\nend\nmake \"x 1\nfd 50");
        logo.reset();
        assert!(logo.workspace().procedure("f").is_none());
        assert!(logo.execute(":x").error_message.is_some());
        assert_eq!(logo.turtle().position.y, 0.0);
    }

    #[test]
    fn load_file_runs_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.logo"), "to hi\nprint \"hi\nend\n").unwrap();
        let mut logo = Interpreter::with_config(Config {
            base_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });
        assert!(logo.load_file("lib").succeeded);
        assert_eq!(logo.execute("hi").text_output, "hi\n");
    }
}
