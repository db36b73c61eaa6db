//! Operating-system services used during evaluation and synthesis.
//!
//! Paths are plain strings: project files may use either separator and the
//! generated documents target Windows regardless of the host platform.

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::Mutex;

/// File system and environment access.
pub trait Host {
    /// Open `path` for streamed reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;

    /// `true` if `path` exists.
    fn exists(&self, path: &str) -> bool;

    /// Environment variable lookup; `None` when undefined.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Create or overwrite `path` with `contents`.
    fn write(&self, path: &str, contents: &str) -> io::Result<()>;
}

/// The real file system and process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsHost;

impl Host for OsHost {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }

    fn write(&self, path: &str, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// An in-memory host for tests and dry runs.
///
/// Reads see files added with [`MemHost::add_file`] plus anything written
/// through [`Host::write`].
#[derive(Debug, Default)]
pub struct MemHost {
    files: Mutex<HashMap<String, String>>,
    env: HashMap<String, String>,
}

impl MemHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<String>, contents: impl Into<String>) -> &Self {
        self.lock().insert(path.into(), contents.into());
        self
    }

    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    /// Contents of a file, if present.
    pub fn file(&self, path: &str) -> Option<String> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a usable map.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Host for MemHost {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.file(path) {
            Some(contents) => Ok(Box::new(io::Cursor::new(contents.into_bytes()))),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn exists(&self, path: &str) -> bool {
        let files = self.lock();
        let dir = format!("{}/", path.trim_end_matches('/'));
        files.contains_key(path) || files.keys().any(|k| k.starts_with(&dir))
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn write(&self, path: &str, contents: &str) -> io::Result<()> {
        self.lock().insert(path.to_owned(), contents.to_owned());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
