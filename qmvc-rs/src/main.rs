use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use qmvc::cli::{self, Cli, Command};
use qmvc::config::Settings;
use qmvc::host::OsHost;
use qmvc::project::process_project;
use qmvc::relpath;
use qmvc::script::Evaluator;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn load_settings(cli: &Cli) -> Result<Settings, String> {
    let Some(path) = cli::resolve_settings_path(cli.settings.as_ref()) else {
        return Ok(Settings::default());
    };
    let (settings, errors) = Settings::load_file(&path)
        .map_err(|e| format!("cannot read settings {}: {e}", path.display()))?;
    for e in &errors {
        warn!(file = %path.display(), "{e}");
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = load_settings(&cli)?;
    let input = cli.command.input();
    let cwd = std::env::current_dir().map_err(|e| format!("cannot determine working directory: {e}"))?;
    let file = relpath::absolutize(&input.file.to_string_lossy(), &cwd.to_string_lossy());
    let mut eval = Evaluator::new(&OsHost, &settings).with_config(input.config.iter().cloned());

    match &cli.command {
        Command::Generate { seed, .. } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            let written = process_project(&mut eval, &file, &mut rng).map_err(|e| e.to_string())?;
            for path in written {
                println!("{path}");
            }
        }
        Command::Dump { .. } => {
            let env = eval.process_root_file(&file).map_err(|e| e.to_string())?;
            for (name, values) in env.iter() {
                println!("{name}:");
                for v in values {
                    println!("    {v}");
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli::log_level(cli.verbose));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("qmvc: {e}");
            ExitCode::FAILURE
        }
    }
}
