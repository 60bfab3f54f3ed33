use std::{env, fs::OpenOptions, str::FromStr, sync::Mutex};

use config::{Config, Environment, File};
use eyre::WrapErr;
use serde::Deserialize;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
    pub wal: bool,
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
    pub source_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub ingest: Ingest,
}

pub fn init_logging(log_file_path: &str, level: &str) -> eyre::Result<()> {
    let level = Level::from_str(level).wrap_err_with(|| format!("invalid log level: {}", level))?;
    let file_appender = OpenOptions::new().create(true).append(true).open(log_file_path)
        .wrap_err_with(|| format!("could not open log file {}", log_file_path))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file_appender))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

pub fn init_config(filename: &str, env_prefix: &str) -> eyre::Result<Settings> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .set_default("database.wal", true)?
        .add_source(File::with_name(filename))
        .add_source(File::with_name(&format!("{}_{}", filename, run_mode)).required(false))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()?
        .try_deserialize()
        .wrap_err_with(|| format!("failed to create Settings from config provided: {}", &filename))
}
