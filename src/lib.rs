use std::{path::PathBuf, sync::Arc};

use eyre::{Result, WrapErr};
use futures::try_join;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{store::{DocumentStore, SqliteStore}, torrents::TorrentRecord};

pub mod config;
pub mod ingest;
pub mod metadata;
pub mod source;
pub mod store;
pub mod torrents;

pub use crate::config::{init_config, init_logging, Settings};

/// Imports every metadata file in `dir` into the configured store.
///
/// The directory feed runs as its own task and the ingestion worker drains its
/// channel. A storage failure aborts the import with an error.
pub async fn ingest(cfg: Arc<Settings>, dir: PathBuf) -> Result<()> {
    info!("ingesting metadata from {:?}", &dir);

    let mut store = SqliteStore::open(&cfg.database.path, cfg.database.wal)
        .wrap_err_with(|| format!("could not open torrent store {}", &cfg.database.path))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let feed = tokio::spawn(source::feed_directory(dir, tx));

    let (fed, stats) = try_join!(
        async { feed.await? },
        async { ingest::run(&mut rx, &mut store).await.wrap_err("ingestion stopped on a storage failure") },
    )?;

    info!("fed {} events, stats: {:?}", fed, stats);
    store.close()?;

    Ok(())
}

pub fn query(cfg: Arc<Settings>, name: &str) -> Result<TorrentRecord> {
    let store = SqliteStore::open(&cfg.database.path, cfg.database.wal)
        .wrap_err_with(|| format!("could not open torrent store {}", &cfg.database.path))?;

    let record = store.query_by_name(name)?;
    info!("found torrent {} for name {}", record.info_hash, name);

    store.close()?;
    Ok(record)
}

pub fn log_and_fail(err: eyre::Report, code: i32) -> ! {
    error!("{:?}", err);
    eprintln!("Error: {:?}", err);
    std::process::exit(code)
}
