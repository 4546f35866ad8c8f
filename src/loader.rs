//! Source file resolution for LOAD and `Interpreter::load_file`.

use std::path::{Path, PathBuf};

use crate::error::{LogoDiagnostic, LogoError};

const EXTENSIONS: [&str; 2] = ["logo", "lg"];

/// Search for a Logo source file matching `name`.
///
/// Search path (in order):
/// 1. The interpreter's base directory
/// 2. Entries from the `LOGOPATH` environment variable (platform path separator)
/// 3. Current working directory
///
/// Candidate filenames for `shapes`: `shapes`, `shapes.logo`, `shapes.lg`.
/// An absolute path is only tried as given and with the extensions.
pub fn resolve(name: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(name)];
    for ext in EXTENSIONS {
        candidates.push(PathBuf::from(format!("{name}.{ext}")));
    }

    if Path::new(name).is_absolute() {
        return candidates.into_iter().find(|c| c.is_file());
    }

    let mut search_dirs: Vec<PathBuf> = Vec::new();
    if let Some(dir) = base_dir {
        search_dirs.push(dir.to_path_buf());
    }
    if let Ok(logopath) = std::env::var("LOGOPATH") {
        for entry in std::env::split_paths(&logopath) {
            if entry.is_dir() {
                search_dirs.push(entry);
            }
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        search_dirs.push(cwd);
    }

    for dir in &search_dirs {
        for candidate in &candidates {
            let full = dir.join(candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

/// Resolve and read a source file.
pub fn read_source(
    procedure: &str,
    name: &str,
    base_dir: Option<&Path>,
) -> Result<(String, PathBuf), LogoDiagnostic> {
    let path = resolve(name, base_dir).ok_or_else(|| {
        LogoDiagnostic::new(LogoError::FileSystem)
            .with_detail(format!("{procedure}: can't find file {name}"))
    })?;
    let source = std::fs::read_to_string(&path).map_err(|e| {
        crate::error::file_error(procedure, &path.display().to_string(), &e)
    })?;
    tracing::debug!(path = %path.display(), "load");
    Ok((source, path))
}
