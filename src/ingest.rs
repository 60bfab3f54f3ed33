use tracing::{debug, error, warn};

use crate::metadata::decode;
use crate::source::MetadataSource;
use crate::store::{DocumentStore, PersistenceError};
use crate::torrents::normalize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub received: u64,
    pub stored: u64,
    pub malformed: u64,
    pub rejected: u64,
}

/// Drains `source` one event at a time: decode, normalize, insert.
///
/// Undecodable or invalid metadata is logged and dropped. A failed insert
/// stops the loop and is returned to the caller, nothing after it is stored.
/// Returns the counters once the source is exhausted.
pub async fn run<S, D>(source: &mut S, store: &mut D) -> Result<WorkerStats, PersistenceError>
where
    S: MetadataSource + ?Sized,
    D: DocumentStore + ?Sized,
{
    let mut stats = WorkerStats::default();

    while let Some(event) = source.next_event().await {
        stats.received += 1;

        let metadata = match decode(&event.metadata) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("dropping metadata for {}: {}", event.info_hash, e);
                stats.malformed += 1;
                continue;
            }
        };

        let record = match normalize(event.info_hash, &metadata) {
            Ok(record) => record,
            Err(e) => {
                warn!("rejecting metadata for {}: {}", event.info_hash, e);
                stats.rejected += 1;
                continue;
            }
        };

        debug!("storing {} {:?} ({} bytes)", record.info_hash, &record.name, record.total_size());
        if let Err(e) = store.insert(record) {
            error!("could not store torrent {}: {}", event.info_hash, e);
            return Err(e);
        }
        stats.stored += 1;
    }

    Ok(stats)
}
