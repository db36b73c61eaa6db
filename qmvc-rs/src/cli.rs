//! Command-line argument parsing.
//!
//! Usage:
//!   qmvc generate <FILE> [--seed N] [-c FLAG]... [--settings PATH] [-v]
//!   qmvc dump <FILE> [-c FLAG]... [--settings PATH] [-v]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "qmvc", version)]
#[command(about = "Evaluate qmake project files and generate Visual Studio projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: the per-user settings file, if any)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Log progress to stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a project tree and write a .vcxproj for every app project
    Generate {
        #[command(flatten)]
        input: Input,

        /// Seed for generated project GUIDs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Evaluate one project file and print every variable
    Dump {
        #[command(flatten)]
        input: Input,
    },
}

/// Arguments shared by every subcommand.
#[derive(Debug, Args)]
pub struct Input {
    /// Root project file
    pub file: PathBuf,

    /// Extra CONFIG flag (repeatable)
    #[arg(short = 'c', long = "config", value_name = "FLAG")]
    pub config: Vec<String>,
}

impl Command {
    pub fn input(&self) -> &Input {
        match self {
            Command::Generate { input, .. } | Command::Dump { input } => input,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Settings file to load: the explicit `--settings` path, else the per-user
/// file if one exists.
pub fn resolve_settings_path(cli_override: Option<&PathBuf>) -> Option<PathBuf> {
    cli_override.cloned().or_else(crate::config::find_user_settings)
}

/// Default log filter when `RUST_LOG` is unset.
pub fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("qmvc").chain(args.iter().copied()))
    }

    #[test]
    fn generate_minimal() {
        let cli = parse(&["generate", "app.pro"]).unwrap();
        let Command::Generate { input, seed } = &cli.command else {
            panic!("expected generate");
        };
        assert_eq!(input.file, PathBuf::from("app.pro"));
        assert!(input.config.is_empty());
        assert_eq!(*seed, None);
        assert!(!cli.verbose);
        assert!(cli.settings.is_none());
    }

    #[test]
    fn generate_all_options() {
        let cli = parse(&[
            "generate", "all.pro", "--seed", "42", "-c", "release", "--config", "x64", "-v",
            "--settings", "s.conf",
        ])
        .unwrap();
        let Command::Generate { input, seed } = &cli.command else {
            panic!("expected generate");
        };
        assert_eq!(*seed, Some(42));
        assert_eq!(input.config, vec!["release", "x64"]);
        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("s.conf")));
    }

    #[test]
    fn dump_with_flags() {
        let cli = parse(&["dump", "-c", "unix", "app.pro"]).unwrap();
        assert!(matches!(cli.command, Command::Dump { .. }));
        assert_eq!(cli.command.input().config, vec!["unix"]);
        assert_eq!(cli.command.input().file, PathBuf::from("app.pro"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse(&["generate"]).is_err());
    }

    #[test]
    fn bad_seed_is_an_error() {
        assert!(parse(&["generate", "a.pro", "--seed", "many"]).is_err());
    }

    #[test]
    fn unknown_subcommand() {
        assert!(parse(&["build", "a.pro"]).is_err());
    }

    #[test]
    fn explicit_settings_path_wins() {
        let p = PathBuf::from("/etc/qmvc.conf");
        assert_eq!(resolve_settings_path(Some(&p)), Some(p));
    }

    #[test]
    fn verbose_raises_level() {
        assert_eq!(log_level(false), "warn");
        assert_eq!(log_level(true), "debug");
    }
}
