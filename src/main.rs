use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use dhtadmin::{ingest, init_config, init_logging, log_and_fail, query};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// base name of the settings file, without extension
    #[arg(long, default_value = "config/settings")]
    config: String,

    #[arg(long, default_value = "dhtadmin.log")]
    log_file: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store every metadata file of a directory
    Ingest {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the first stored torrent with the given name
    Query {
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    stable_eyre::install().unwrap_or_else(|e| log_and_fail(e.into(), 1));
    init_logging(&args.log_file, &args.log_level).unwrap_or_else(|e| log_and_fail(e, 1));
    info!("executing command {:?}", &args.command);

    let cfg = init_config(&args.config, "DHT").unwrap_or_else(|e| log_and_fail(e, 1));
    let cfg = Arc::new(cfg);

    match args.command {
        Command::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&cfg.ingest.source_dir));
            ingest(cfg, dir).await.unwrap_or_else(|e| log_and_fail(e, 1));
        }
        Command::Query { name } => {
            let record = query(cfg, &name).unwrap_or_else(|e| log_and_fail(e, 1));
            let document = serde_json::to_string_pretty(&record).unwrap_or_else(|e| log_and_fail(e.into(), 1));
            println!("{}", document);
        }
    }

    info!("command completed succesfully!");
}
