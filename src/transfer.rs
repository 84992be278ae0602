//! Moving records into an import sink in fixed-size requests.
//!
//! Nothing here retries. A request that fails counts every record it
//! carried as an error and the run moves on to the next chunk.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::admin::{ExportSource, ImportSink};
use crate::directory::{PageOutcome, PluginSource};
use crate::record::Record;
use crate::util::chunk_count;

/// Platform tag attached to records pulled straight from the directory.
pub const DIRECTORY_PLATFORM: &str = "claude";

pub const SYNC_SOURCE: &str = "db_sync";
pub const SYNC_PLATFORM: &str = "global";

/// Running totals for one transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub imported: usize,
    pub errors: usize,
    /// Records the sink reported receiving. Falls back to the chunk
    /// length when the sink omits `total`; zero for failed requests.
    pub received: usize,
    /// Requests sent to the sink, successful or not.
    pub chunks: usize,
}

impl TransferReport {
    fn absorb(&mut self, other: TransferReport) {
        self.imported += other.imported;
        self.errors += other.errors;
        self.received += other.received;
        self.chunks += other.chunks;
    }
}

/// Tag describing where records came from and which platform they belong to.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub import_source: &'a str,
    pub platform: &'a str,
}

async fn send_chunk(sink: &dyn ImportSink, chunk: &[Record], tag: Provenance<'_>) -> TransferReport {
    match sink.import(chunk, tag.import_source, tag.platform).await {
        Ok(summary) => {
            let received = summary.total.unwrap_or(chunk.len());
            if received != chunk.len() {
                warn!(
                    "Sink reported {} records received for a chunk of {}",
                    received,
                    chunk.len()
                );
            }
            TransferReport {
                imported: summary.imported,
                errors: summary.errors,
                received,
                chunks: 1,
            }
        }
        Err(e) => {
            warn!("Failed to push chunk of {} records: {:#}", chunk.len(), e);
            TransferReport {
                imported: 0,
                errors: chunk.len(),
                received: 0,
                chunks: 1,
            }
        }
    }
}

/// Send `records` to `sink` in order, `chunk_size` at a time.
pub async fn push_in_chunks(
    sink: &dyn ImportSink,
    records: &[Record],
    chunk_size: usize,
    tag: Provenance<'_>,
    delay: Duration,
) -> Result<TransferReport> {
    if chunk_size == 0 {
        bail!("chunk size must be at least 1");
    }

    let total_chunks = chunk_count(records.len(), chunk_size);
    let mut report = TransferReport::default();

    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        let start = index * chunk_size;
        info!(
            "Sending chunk {}/{} (records {} to {})",
            index + 1,
            total_chunks,
            start,
            start + chunk.len()
        );

        report.absorb(send_chunk(sink, chunk, tag).await);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        "Import result for {}: {} imported, {} errors",
        tag.import_source, report.imported, report.errors
    );
    Ok(report)
}

/// Stream the directory straight into the sink, one page per request.
///
/// Stops on an empty page, a blocked or failed fetch, a page shorter
/// than `page_size`, or once `offset` reaches `max_records`.
pub async fn bulk_import(
    source: &dyn PluginSource,
    sink: &dyn ImportSink,
    page_size: usize,
    max_records: usize,
    delay: Duration,
) -> Result<TransferReport> {
    if page_size == 0 {
        bail!("page size must be at least 1");
    }

    let tag = Provenance {
        import_source: source.source_url(),
        platform: DIRECTORY_PLATFORM,
    };
    let mut report = TransferReport::default();
    let mut offset = 0;

    while offset < max_records {
        info!("Fetching batch: offset={}, limit={}", offset, page_size);
        let records = match source.fetch_page(offset, page_size).await {
            Ok(PageOutcome::Page(records)) if !records.is_empty() => records,
            Ok(PageOutcome::Page(_)) => {
                info!("No more data, stopping");
                break;
            }
            Ok(PageOutcome::Blocked) => {
                warn!("Directory blocked the request at offset {}, stopping", offset);
                break;
            }
            Err(e) => {
                warn!("Error fetching batch at offset {}: {:#}", offset, e);
                break;
            }
        };

        let batch_count = records.len();
        let batch = send_chunk(sink, &records, tag).await;
        report.absorb(batch);
        info!(
            "Batch result: {} imported, {} errors (running total: {}/{})",
            batch.imported, batch.errors, report.imported, report.errors
        );

        offset += batch_count;
        if batch_count < page_size {
            info!("Reached last page");
            break;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(report)
}

/// Copy every record from one admin API to another.
///
/// A failed export aborts the sync; nothing is pushed in that case.
pub async fn sync_databases(
    from: &dyn ExportSource,
    to: &dyn ImportSink,
    chunk_size: usize,
    delay: Duration,
) -> Result<TransferReport> {
    let records = from.export().await?;
    info!("Fetched {} skills from source", records.len());

    if records.is_empty() {
        info!("Source is empty, nothing to sync");
        return Ok(TransferReport::default());
    }

    push_in_chunks(
        to,
        &records,
        chunk_size,
        Provenance {
            import_source: SYNC_SOURCE,
            platform: SYNC_PLATFORM,
        },
        delay,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::ImportSummary;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| json!({ "name": format!("skill {}", i) }).as_object().cloned().unwrap())
            .collect()
    }

    /// Records every call; fails the calls whose index is listed.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(usize, String, String)>>,
        fail_on: Vec<usize>,
    }

    #[async_trait]
    impl ImportSink for RecordingSink {
        async fn import(
            &self,
            records: &[Record],
            import_source: &str,
            platform: &str,
        ) -> Result<ImportSummary> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push((records.len(), import_source.into(), platform.into()));
            if self.fail_on.contains(&index) {
                bail!("sink unavailable");
            }
            Ok(ImportSummary {
                imported: records.len() - 1,
                errors: 1,
                total: Some(records.len()),
            })
        }
    }

    struct PagedSource {
        pages: Vec<Result<PageOutcome, String>>,
        requested: Mutex<Vec<(usize, usize)>>,
    }

    impl PagedSource {
        fn new(pages: Vec<Result<PageOutcome, String>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PluginSource for PagedSource {
        fn source_url(&self) -> &str {
            "https://directory.test/api/plugins"
        }

        async fn fetch_page(&self, offset: usize, limit: usize) -> Result<PageOutcome> {
            let mut requested = self.requested.lock().unwrap();
            let index = requested.len();
            requested.push((offset, limit));
            match self.pages.get(index) {
                Some(Ok(outcome)) => Ok(outcome.clone()),
                Some(Err(msg)) => bail!("{}", msg),
                None => Ok(PageOutcome::Page(Vec::new())),
            }
        }
    }

    struct FixedExport(Result<Vec<Record>, String>);

    #[async_trait]
    impl ExportSource for FixedExport {
        async fn export(&self) -> Result<Vec<Record>> {
            match &self.0 {
                Ok(records) => Ok(records.clone()),
                Err(msg) => bail!("{}", msg),
            }
        }
    }

    const TAG: Provenance<'static> = Provenance {
        import_source: "marketplace",
        platform: "global",
    };

    #[tokio::test]
    async fn test_push_in_chunks_splits_in_order() {
        let sink = RecordingSink::default();
        let report = push_in_chunks(&sink, &records(7), 3, TAG, Duration::ZERO)
            .await
            .unwrap();

        let calls = sink.calls.lock().unwrap();
        let sizes: Vec<usize> = calls.iter().map(|c| c.0).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert!(calls
            .iter()
            .all(|c| c.1 == "marketplace" && c.2 == "global"));
        assert_eq!(
            report,
            TransferReport {
                imported: 4,
                errors: 3,
                received: 7,
                chunks: 3
            }
        );
    }

    #[tokio::test]
    async fn test_push_in_chunks_failed_chunk_counts_all_as_errors() {
        let sink = RecordingSink {
            fail_on: vec![1],
            ..Default::default()
        };
        let report = push_in_chunks(&sink, &records(10), 4, TAG, Duration::ZERO)
            .await
            .unwrap();

        // chunks: 4 (3 ok, 1 err), 4 (failed), 2 (1 ok, 1 err)
        assert_eq!(report.imported, 4);
        assert_eq!(report.received, 6);
        assert_eq!(report.errors, 1 + 4 + 1);
        assert_eq!(report.chunks, 3);
    }

    struct FixedSummarySink(ImportSummary);

    #[async_trait]
    impl ImportSink for FixedSummarySink {
        async fn import(&self, _: &[Record], _: &str, _: &str) -> Result<ImportSummary> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_push_in_chunks_uses_reported_total() {
        let sink = FixedSummarySink(ImportSummary {
            imported: 1,
            errors: 0,
            total: Some(1),
        });
        let report = push_in_chunks(&sink, &records(4), 2, TAG, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.received, 2);
        assert_eq!(report.imported, 2);

        let sink = FixedSummarySink(ImportSummary {
            imported: 2,
            errors: 0,
            total: None,
        });
        let report = push_in_chunks(&sink, &records(3), 2, TAG, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.received, 3);
    }

    #[tokio::test]
    async fn test_push_in_chunks_empty_input() {
        let sink = RecordingSink::default();
        let report = push_in_chunks(&sink, &[], 500, TAG, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report, TransferReport::default());
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_in_chunks_rejects_zero_chunk_size() {
        let sink = RecordingSink::default();
        assert!(push_in_chunks(&sink, &records(1), 0, TAG, Duration::ZERO)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_bulk_import_stops_on_short_page() {
        let source = PagedSource::new(vec![
            Ok(PageOutcome::Page(records(2))),
            Ok(PageOutcome::Page(records(1))),
            Ok(PageOutcome::Page(records(2))),
        ]);
        let sink = RecordingSink::default();
        let report = bulk_import(&source, &sink, 2, 100, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(*source.requested.lock().unwrap(), vec![(0, 2), (2, 2)]);
        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, "https://directory.test/api/plugins");
        assert_eq!(calls[0].2, "claude");
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors, 2);
    }

    #[tokio::test]
    async fn test_bulk_import_respects_max_records() {
        let source = PagedSource::new(vec![
            Ok(PageOutcome::Page(records(2))),
            Ok(PageOutcome::Page(records(2))),
            Ok(PageOutcome::Page(records(2))),
        ]);
        let sink = RecordingSink::default();
        bulk_import(&source, &sink, 2, 4, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(*source.requested.lock().unwrap(), vec![(0, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_bulk_import_stops_on_fetch_error_and_block() {
        let source = PagedSource::new(vec![
            Ok(PageOutcome::Page(records(2))),
            Err("connection reset".into()),
        ]);
        let sink = RecordingSink::default();
        let report = bulk_import(&source, &sink, 2, 100, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.chunks, 1);

        let source = PagedSource::new(vec![Ok(PageOutcome::Blocked)]);
        let report = bulk_import(&source, &sink, 2, 100, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report, TransferReport::default());
    }

    #[tokio::test]
    async fn test_bulk_import_failed_import_keeps_paging() {
        let source = PagedSource::new(vec![
            Ok(PageOutcome::Page(records(2))),
            Ok(PageOutcome::Page(records(2))),
        ]);
        let sink = RecordingSink {
            fail_on: vec![0],
            ..Default::default()
        };
        let report = bulk_import(&source, &sink, 2, 100, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.errors, 2 + 1);
        assert_eq!(report.imported, 1);
        assert_eq!(source.requested.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sync_databases_tags_records() {
        let from = FixedExport(Ok(records(3)));
        let sink = RecordingSink::default();
        let report = sync_databases(&from, &sink, 2, Duration::ZERO)
            .await
            .unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.1 == "db_sync" && c.2 == "global"));
        assert_eq!(report.chunks, 2);
    }

    #[tokio::test]
    async fn test_sync_databases_export_failure_aborts() {
        let from = FixedExport(Err("Expected list of skills".into()));
        let sink = RecordingSink::default();
        let err = sync_databases(&from, &sink, 2, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Expected list"));
        assert!(sink.calls.lock().unwrap().is_empty());
    }
}
