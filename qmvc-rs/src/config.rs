//! Tool settings and the settings-file loader.
//!
//! Settings carry everything that would otherwise be process-wide state:
//! the `CONFIG` flags every root file starts with, the property table behind
//! `$$[name]`, file extensions, and the nesting bound.
//!
//! Settings file format (`#` starts a comment):
//!
//! | Line                         | Effect                                   |
//! |------------------------------|------------------------------------------|
//! | `config = debug win32 ...`   | replace the default `CONFIG` flags       |
//! | `property.NAME = value`      | add or override a `$$[NAME]` property    |
//! | `extension = pro`            | project file extension for `SUBDIRS`     |
//! | `output_extension = vcxproj` | extension of generated project files     |
//! | `targets_dir = path`         | where the build-step `.targets` live     |
//! | `max_depth = 64`             | include / subproject nesting bound       |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A non-fatal problem on one line of a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `CONFIG` values every root file starts with.
    pub default_config: Vec<String>,
    /// `$$[name]` lookup table.
    pub properties: BTreeMap<String, String>,
    /// Extension (without dot) of project files named by `SUBDIRS`.
    pub project_extension: String,
    /// Extension (without dot) of generated project files.
    pub output_extension: String,
    /// Appended to the project path to name the filters document.
    pub filters_suffix: String,
    /// Directory, relative to the generated project, holding the
    /// `QtMoc` / `QtRcCompile` / `QtTsCompile` / `QtUICompile` targets.
    pub targets_dir: String,
    /// Maximum include / `infile` / subproject nesting.
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let properties = [
            ("QT_INSTALL_HEADER", "c:\\QtSDK\\Desktop\\Qt\\4.8.1\\msvc2010\\include"),
            ("QT_INSTALL_LIB", "c:\\QtSDK\\Desktop\\Qt\\4.8.1\\msvc2010\\lib"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Settings {
            default_config: ["debug", "win32", "win32-msvc*"].map(String::from).to_vec(),
            properties,
            project_extension: "pro".to_owned(),
            output_extension: "vcxproj".to_owned(),
            filters_suffix: ".filters".to_owned(),
            targets_dir: "..\\..\\qmake_parser\\props".to_owned(),
            max_depth: 64,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Property value for `$$[name]`; unknown names are empty.
    pub fn property(&self, name: &str) -> &str {
        self.properties.get(name).map(String::as_str).unwrap_or("")
    }

    /// Apply a settings file on top of the defaults.
    ///
    /// Lines that cannot be understood are reported and skipped; the rest of
    /// the file still applies.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut settings = Settings::default();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError { line: lineno, message: format!("expected key = value: {line}") });
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            if let Err(message) = settings.apply(key, value) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (settings, errors)
    }

    /// Read and apply a settings file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        if let Some(name) = key.strip_prefix("property.") {
            if name.is_empty() {
                return Err("property name missing".into());
            }
            self.properties.insert(name.to_owned(), value.to_owned());
            return Ok(());
        }

        match key {
            "config" => {
                self.default_config = value.split_whitespace().map(String::from).collect();
            }
            "extension" => self.project_extension = non_empty(key, value)?.trim_start_matches('.').to_owned(),
            "output_extension" => {
                self.output_extension = non_empty(key, value)?.trim_start_matches('.').to_owned();
            }
            "targets_dir" => self.targets_dir = value.to_owned(),
            "max_depth" => {
                self.max_depth = value
                    .parse()
                    .map_err(|_| format!("max_depth: not a number: {value}"))?;
            }
            other => return Err(format!("unknown setting: {other}")),
        }
        Ok(())
    }
}

fn non_empty<'a>(key: &str, value: &'a str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("{key}: value required"))
    } else {
        Ok(value)
    }
}

/// Per-user settings file (`<config dir>/qmvc/settings.conf`), if it exists.
pub fn find_user_settings() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "qmvc")?;
    let path = dirs.config_dir().join("settings.conf");
    path.exists().then_some(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
