use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{edit, import, list, scan, status, tick, util};
use wl_cli::{Cli, Commands, Config};

/// Load config and make sure the database directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so command output stays machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_path = cli.config.as_deref();
    let mut stdout = io::stdout();

    match command {
        Commands::Scan {
            format,
            json,
            files,
        } => {
            // Scan doesn't need config - it only reads the given files
            scan::run(&mut stdout, files, (*format).into(), *json)?;
        }
        Commands::Import { work, break_ } => {
            let config = load_config(config_path)?;
            let work_default = if *work {
                Some(true)
            } else if *break_ {
                Some(false)
            } else {
                None
            };
            import::run(&mut stdout, &config, work_default)?;
        }
        Commands::List { date, json } => {
            let date = date.as_deref().map(util::parse_date).transpose()?;
            let config = load_config(config_path)?;
            let db = util::open_database(&config)?;
            let data = db.load_worklog().context("failed to load work log")?;
            list::run(&mut stdout, &data, date, *json)?;
        }
        Commands::Add {
            start,
            end,
            work,
            description,
        } => {
            let start = util::parse_datetime(start)?;
            let end = util::parse_datetime(end)?;
            let config = load_config(config_path)?;
            util::with_worklog(&config, |data| {
                edit::add(&mut stdout, data, start, end, *work, description)
            })?;
        }
        Commands::Remove { index } => {
            let config = load_config(config_path)?;
            util::with_worklog(&config, |data| edit::remove(&mut stdout, data, *index))?;
        }
        Commands::Join { index, direction } => {
            let config = load_config(config_path)?;
            util::with_worklog(&config, |data| {
                edit::join(&mut stdout, data, *index, *direction)
            })?;
        }
        Commands::Merge { index, direction } => {
            let config = load_config(config_path)?;
            util::with_worklog(&config, |data| {
                edit::merge(&mut stdout, data, *index, *direction)
            })?;
        }
        Commands::Tick => {
            let config = load_config(config_path)?;
            let now = Local::now().naive_local();
            util::with_worklog(&config, |data| {
                tick::run(&mut stdout, data, now, config.tick_max_gap())
            })?;
        }
        Commands::Status => {
            let config = load_config(config_path)?;
            status::run(&mut stdout, &config, Local::now().date_naive())?;
        }
    }

    Ok(())
}
