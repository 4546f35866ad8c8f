//! File streams: OPENREAD/OPENWRITE and the reader/writer redirection
//! used by PRINT, TYPE, SHOW and the READ primitives.
//!
//! Files are named by the word the program opened them with. Relative
//! names are resolved against the interpreter's base directory.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::builtins::{Primitive, word_arg};
use crate::error::{LogoDiagnostic, LogoError, bad_input, file_error};
use crate::eval::Evaluator;
use crate::loader;
use crate::parser::{parse_list, parse_program};
use crate::signal::LogoResult;
use crate::value::{Value, Word};
use crate::workspace::Arity;

enum OpenFile {
    Read(BufReader<File>),
    Write(BufWriter<File>),
}

/// Open files plus the current reader and writer.
#[derive(Default)]
pub struct FileTable {
    base_dir: Option<PathBuf>,
    open: HashMap<String, OpenFile>,
    reader: Option<String>,
    writer: Option<String>,
}

impl FileTable {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            ..Self::default()
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) if Path::new(name).is_relative() => dir.join(name),
            _ => PathBuf::from(name),
        }
    }

    pub fn open_read(&mut self, procedure: &str, name: &str) -> Result<(), LogoDiagnostic> {
        let file = File::open(self.resolve(name)).map_err(|e| file_error(procedure, name, &e))?;
        tracing::debug!(name, "open for reading");
        self.open
            .insert(name.to_string(), OpenFile::Read(BufReader::new(file)));
        Ok(())
    }

    pub fn open_write(
        &mut self,
        procedure: &str,
        name: &str,
        append: bool,
    ) -> Result<(), LogoDiagnostic> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(self.resolve(name))
            .map_err(|e| file_error(procedure, name, &e))?;
        tracing::debug!(name, append, "open for writing");
        self.open
            .insert(name.to_string(), OpenFile::Write(BufWriter::new(file)));
        Ok(())
    }

    pub fn close(&mut self, procedure: &str, name: &str) -> Result<(), LogoDiagnostic> {
        let file = self.open.remove(name).ok_or_else(|| not_open(procedure, name))?;
        if self.reader.as_deref() == Some(name) {
            self.reader = None;
        }
        if self.writer.as_deref() == Some(name) {
            self.writer = None;
        }
        tracing::debug!(name, "close");
        if let OpenFile::Write(mut w) = file {
            w.flush().map_err(|e| file_error(procedure, name, &e))?;
        }
        Ok(())
    }

    pub fn close_all(&mut self) {
        for (name, file) in self.open.drain() {
            if let OpenFile::Write(mut w) = file
                && let Err(e) = w.flush()
            {
                tracing::warn!(name, error = %e, "flush failed on close");
            }
        }
        self.reader = None;
        self.writer = None;
    }

    pub fn set_reader(&mut self, procedure: &str, name: Option<&str>) -> Result<(), LogoDiagnostic> {
        if let Some(name) = name
            && !matches!(self.open.get(name), Some(OpenFile::Read(_)))
        {
            return Err(not_open(procedure, name));
        }
        self.reader = name.map(str::to_string);
        Ok(())
    }

    pub fn set_writer(&mut self, procedure: &str, name: Option<&str>) -> Result<(), LogoDiagnostic> {
        if let Some(name) = name
            && !matches!(self.open.get(name), Some(OpenFile::Write(_)))
        {
            return Err(not_open(procedure, name));
        }
        self.writer = name.map(str::to_string);
        Ok(())
    }

    pub fn reader(&self) -> Option<&str> {
        self.reader.as_deref()
    }

    pub fn writer(&self) -> Option<&str> {
        self.writer.as_deref()
    }

    /// Write to the current writer. Returns `false` when there is none and
    /// the text should go to the host instead.
    pub fn write(&mut self, text: &str) -> Result<bool, LogoDiagnostic> {
        let Some(name) = self.writer.as_deref() else {
            return Ok(false);
        };
        match self.open.get_mut(name) {
            Some(OpenFile::Write(w)) => {
                w.write_all(text.as_bytes())
                    .map_err(|e| file_error("print", name, &e))?;
                Ok(true)
            }
            _ => Err(not_open("print", name)),
        }
    }

    /// Run `f` on the current reader, or on standard input without one.
    fn with_reader<T>(
        &mut self,
        procedure: &str,
        f: impl FnOnce(&mut dyn BufRead) -> std::io::Result<T>,
    ) -> Result<T, LogoDiagnostic> {
        match self.reader.as_deref() {
            Some(name) => match self.open.get_mut(name) {
                Some(OpenFile::Read(r)) => f(r).map_err(|e| file_error(procedure, name, &e)),
                _ => Err(not_open(procedure, name)),
            },
            None => {
                let stdin = std::io::stdin();
                let mut lock = stdin.lock();
                f(&mut lock).map_err(|e| file_error(procedure, "stdin", &e))
            }
        }
    }

    /// One line without its terminator, or `None` at end of file.
    pub fn read_line(&mut self, procedure: &str) -> Result<Option<String>, LogoDiagnostic> {
        self.with_reader(procedure, |r| {
            let mut line = String::new();
            if r.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']).len();
            line.truncate(trimmed);
            Ok(Some(line))
        })
    }

    pub fn read_char(&mut self, procedure: &str) -> Result<Option<char>, LogoDiagnostic> {
        self.with_reader(procedure, |r| {
            let mut first = [0u8; 1];
            if r.read(&mut first)? == 0 {
                return Ok(None);
            }
            let width = match first[0] {
                b if b < 0x80 => 1,
                b if b >= 0xF0 => 4,
                b if b >= 0xE0 => 3,
                _ => 2,
            };
            let mut bytes = vec![first[0]];
            if width > 1 {
                let mut rest = vec![0u8; width - 1];
                r.read_exact(&mut rest)?;
                bytes.extend(rest);
            }
            Ok(String::from_utf8_lossy(&bytes).chars().next())
        })
    }

    pub fn at_eof(&mut self, procedure: &str) -> Result<bool, LogoDiagnostic> {
        self.with_reader(procedure, |r| Ok(r.fill_buf()?.is_empty()))
    }
}

fn not_open(procedure: &str, name: &str) -> LogoDiagnostic {
    LogoDiagnostic::new(LogoError::FileSystem)
        .with_detail(format!("{procedure}: file {name} is not open"))
}

// ── Primitives ──────────────────────────────────────────────────────

pub static PRIMITIVES: &[Primitive] = &[
    Primitive::cmd(&["openread"], Arity::fixed(1), openread),
    Primitive::cmd(&["openwrite"], Arity::fixed(1), openwrite),
    Primitive::cmd(&["openappend"], Arity::fixed(1), openappend),
    Primitive::cmd(&["close"], Arity::fixed(1), close),
    Primitive::cmd(&["closeall"], Arity::fixed(0), closeall),
    Primitive::cmd(&["erasefile", "erf"], Arity::fixed(1), erasefile),
    Primitive::cmd(&["filep", "file?"], Arity::fixed(1), filep),
    Primitive::cmd(&["setread"], Arity::fixed(1), setread),
    Primitive::cmd(&["setwrite"], Arity::fixed(1), setwrite),
    Primitive::cmd(&["reader"], Arity::fixed(0), reader),
    Primitive::cmd(&["writer"], Arity::fixed(0), writer),
    Primitive::cmd(&["readlist", "rl"], Arity::fixed(0), readlist),
    Primitive::cmd(&["readword", "rw"], Arity::fixed(0), readword),
    Primitive::cmd(&["readchar", "rc"], Arity::fixed(0), readchar),
    Primitive::cmd(&["eofp", "eof?"], Arity::fixed(0), eofp),
    Primitive::cmd(&["load"], Arity::fixed(1), load),
];

fn file_name(name: &str, value: &Value) -> Result<String, LogoDiagnostic> {
    let word = word_arg(name, value)?;
    if word.is_empty() {
        return Err(bad_input(name, value));
    }
    Ok(word.as_str().into_owned())
}

/// SETREAD and SETWRITE take a file name, or `[]` for the terminal.
fn stream_name(name: &str, value: &Value) -> Result<Option<String>, LogoDiagnostic> {
    match value {
        Value::List(l) if l.is_empty() => Ok(None),
        other => file_name(name, other).map(Some),
    }
}

fn name_or_empty(name: Option<&str>) -> Value {
    name.map_or_else(Value::empty_list, Value::word)
}

fn openread(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    ev.io.files.open_read(name, &file)?;
    Ok(None)
}

fn openwrite(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    ev.io.files.open_write(name, &file, false)?;
    Ok(None)
}

fn openappend(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    ev.io.files.open_write(name, &file, true)?;
    Ok(None)
}

fn close(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    ev.io.files.close(name, &file)?;
    Ok(None)
}

fn closeall(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    ev.io.files.close_all();
    Ok(None)
}

fn erasefile(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    fs::remove_file(ev.io.files.resolve(&file)).map_err(|e| file_error(name, &file, &e))?;
    Ok(None)
}

fn filep(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    Ok(Some(Value::boolean(ev.io.files.resolve(&file).is_file())))
}

fn setread(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let stream = stream_name(name, &args[0])?;
    ev.io.files.set_reader(name, stream.as_deref())?;
    Ok(None)
}

fn setwrite(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let stream = stream_name(name, &args[0])?;
    ev.io.files.set_writer(name, stream.as_deref())?;
    Ok(None)
}

fn reader(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(name_or_empty(ev.io.files.reader())))
}

fn writer(ev: &mut Evaluator<'_>, _name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(name_or_empty(ev.io.files.writer())))
}

/// A line read as a list; the empty word at end of file.
fn readlist(ev: &mut Evaluator<'_>, name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(match ev.io.files.read_line(name)? {
        Some(line) => Value::List(parse_list(&line)?),
        None => Value::word(""),
    }))
}

/// A line read as one word; the empty list at end of file.
fn readword(ev: &mut Evaluator<'_>, name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(match ev.io.files.read_line(name)? {
        Some(line) => Value::Word(Word::from(line)),
        None => Value::empty_list(),
    }))
}

fn readchar(ev: &mut Evaluator<'_>, name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(match ev.io.files.read_char(name)? {
        Some(c) => Value::Word(Word::from(c.to_string())),
        None => Value::empty_list(),
    }))
}

fn eofp(ev: &mut Evaluator<'_>, name: &str, _args: &[Value]) -> LogoResult<Option<Value>> {
    Ok(Some(Value::boolean(ev.io.files.at_eof(name)?)))
}

/// Run a source file as if its lines were typed at top level.
fn load(ev: &mut Evaluator<'_>, name: &str, args: &[Value]) -> LogoResult<Option<Value>> {
    let file = file_name(name, &args[0])?;
    let (source, _) = loader::read_source(name, &file, ev.io.files.base_dir())?;
    let lines = parse_program(&source)?;
    ev.run_program(&lines)?;
    Ok(None)
}
