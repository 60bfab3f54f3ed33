use std::path::PathBuf;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::torrents::InfoHash;

/// One metadata fragment fetched by the crawler.
#[derive(Debug, Clone)]
pub struct MetadataEvent {
    pub info_hash: InfoHash,
    pub metadata: Vec<u8>,
}

#[async_trait]
pub trait MetadataSource {
    /// Waits for the next event; `None` once every producer is gone.
    async fn next_event(&mut self) -> Option<MetadataEvent>;
}

#[async_trait]
impl MetadataSource for UnboundedReceiver<MetadataEvent> {
    async fn next_event(&mut self) -> Option<MetadataEvent> {
        self.recv().await
    }
}

/// Pushes every regular file under `dir` as a raw info dictionary, in path order.
///
/// Stands in for the crawler when importing dumped metadata. Returns how many
/// events were sent; stops early if the receiving side has been dropped.
pub async fn feed_directory(dir: PathBuf, events: UnboundedSender<MetadataEvent>) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .wrap_err_with(|| format!("could not read metadata directory {:?}", &dir))?;

    let mut paths = vec![];
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut sent = 0;
    for path in paths {
        let metadata = tokio::fs::read(&path)
            .await
            .wrap_err_with(|| format!("could not read metadata file {:?}", &path))?;
        let event = MetadataEvent {
            info_hash: InfoHash::of_metadata(&metadata),
            metadata,
        };

        if events.send(event).is_err() {
            warn!("ingestion worker is gone, stopping feed after {} events", sent);
            return Ok(sent);
        }
        sent += 1;
    }

    info!("fed {} metadata files from {:?}", sent, &dir);
    Ok(sent)
}
