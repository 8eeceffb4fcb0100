//! Store worker
//!
//! Buffers embedded chunks and writes them in batches: chunks first, then the
//! embedding rows zipped with the returned ids. Batch writes retry with
//! exponential backoff; a final failure is logged and recorded, and the
//! worker moves on. On shutdown, whether by channel closure or cancellation,
//! any remaining buffered items are flushed without observing the
//! cancellation token.

use crate::constants::{
    OPTIMIZE_EVERY_BATCHES, OPTIMIZE_TIMEOUT, STORE_MAX_RETRIES, STORE_RETRY_INITIAL_DELAY,
    STORE_RETRY_MAX_DELAY,
};
use crate::pipeline::backoff::BackoffPolicy;
use crate::pipeline::{EmbedResult, PipelineCounters};
use semdex_domain::ports::SharedDatabaseProvider;
use semdex_domain::{Chunk, EmbedChunk, EmbeddingData, EmbeddingStatus, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Dependencies shared by every store worker in a run
pub struct StoreWorkerContext {
    /// Store handle
    pub database: SharedDatabaseProvider,
    /// Items buffered per write
    pub batch_size: usize,
    /// Batches between `optimize_tables` invocations
    pub optimize_every: usize,
    /// Batches written across all store workers
    pub batches_written: AtomicUsize,
}

impl StoreWorkerContext {
    /// Create a context with the default optimization cadence
    pub fn new(database: SharedDatabaseProvider, batch_size: usize) -> Self {
        Self {
            database,
            batch_size,
            optimize_every: OPTIMIZE_EVERY_BATCHES,
            batches_written: AtomicUsize::new(0),
        }
    }
}

/// Run one store worker until the embedded channel closes
pub async fn run_store_worker(
    worker_id: usize,
    context: Arc<StoreWorkerContext>,
    embedded_rx: Arc<Mutex<mpsc::Receiver<EmbedResult>>>,
    cancel: CancellationToken,
    counters: Arc<PipelineCounters>,
) {
    tracing::debug!(worker_id, "store worker started");
    let mut buffer: Vec<EmbedResult> = Vec::with_capacity(context.batch_size);
    let cancelled = loop {
        let received = {
            let mut rx = embedded_rx.lock().await;
            tokio::select! {
                () = cancel.cancelled() => break true,
                item = rx.recv() => item,
            }
        };
        match received {
            Some(item) => {
                buffer.push(item);
                if buffer.len() >= context.batch_size {
                    let drained = std::mem::take(&mut buffer);
                    write_with_retry(&context, drained, &counters).await;
                }
            }
            None => break false,
        }
    };

    // Final flush runs to completion even when the run was cancelled
    if !buffer.is_empty() {
        tracing::debug!(
            worker_id,
            remaining = buffer.len(),
            cancelled,
            "flushing buffered items"
        );
        write_with_retry(&context, buffer, &counters).await;
    }
    tracing::debug!(worker_id, "store worker finished");
}

/// Write one batch, retrying with exponential backoff
async fn write_with_retry(
    context: &StoreWorkerContext,
    batch: Vec<EmbedResult>,
    counters: &PipelineCounters,
) {
    let policy = BackoffPolicy {
        initial: STORE_RETRY_INITIAL_DELAY,
        max: STORE_RETRY_MAX_DELAY,
    };
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match write_batch(context, &batch).await {
            Ok(stored) => {
                counters.chunks_stored.fetch_add(stored, Ordering::SeqCst);
                let batches = context.batches_written.fetch_add(1, Ordering::SeqCst) + 1;
                if context.optimize_every > 0 && batches % context.optimize_every == 0 {
                    match tokio::time::timeout(OPTIMIZE_TIMEOUT, context.database.optimize_tables())
                        .await
                    {
                        Ok(Err(error)) => tracing::warn!(%error, "store optimization failed"),
                        Err(_) => tracing::warn!("store optimization timed out"),
                        Ok(Ok(())) => {}
                    }
                }
                return;
            }
            Err(error) if attempt < STORE_MAX_RETRIES => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(attempt, ?delay, %error, "store batch failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                tracing::error!(%error, batch_len = batch.len(), "store batch failed permanently");
                counters.record_error("store", error.to_string());
                return;
            }
        }
    }
}

/// Insert one batch of chunks plus their embedding rows
async fn write_batch(context: &StoreWorkerContext, batch: &[EmbedResult]) -> Result<usize> {
    let chunks: Vec<Chunk> = batch.iter().map(|item| item.chunk().clone()).collect();
    let ids = context.database.insert_chunks_batch(&chunks).await?;

    let mut success_ids: Vec<i64> = Vec::new();
    let mut successes: Vec<EmbedChunk> = Vec::new();
    let mut failure_rows: Vec<EmbeddingData> = Vec::new();
    let mut statuses: HashMap<i64, EmbeddingStatus> = HashMap::new();

    for (id, item) in ids.iter().zip(batch) {
        match item {
            EmbedResult::Embedded(embedded) => {
                success_ids.push(*id);
                successes.push(embedded.clone());
            }
            EmbedResult::Failed {
                provider,
                model,
                status,
                ..
            } => {
                failure_rows.push(EmbeddingData {
                    chunk_id: *id,
                    provider: provider.clone(),
                    model: model.clone(),
                    dimensions: 0,
                    vector: Vec::new(),
                    status: *status,
                });
                statuses.insert(*id, *status);
            }
            EmbedResult::Unembedded(_) => {}
        }
    }

    if !success_ids.is_empty() {
        context
            .database
            .insert_embeddings_batch(&success_ids, &successes)
            .await?;
    }
    if !failure_rows.is_empty() {
        context
            .database
            .upsert_embedding_rows(&failure_rows, &statuses)
            .await?;
    }
    Ok(chunks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use semdex_domain::ports::DatabaseProvider;
    use semdex_domain::{ChunkType, Error, Language, SourceFile};
    use std::sync::Mutex as StdMutex;

    /// Store stub that can fail a configurable number of leading inserts
    #[derive(Default)]
    struct StubStore {
        chunks: StdMutex<Vec<Chunk>>,
        embeddings: StdMutex<Vec<(i64, String)>>,
        failure_rows: StdMutex<Vec<EmbeddingData>>,
        optimizations: AtomicUsize,
        fail_inserts: AtomicUsize,
    }

    #[async_trait]
    impl DatabaseProvider for StubStore {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }
        async fn upsert_file(&self, _file: &SourceFile) -> Result<i64> {
            Ok(1)
        }
        async fn get_file_by_path(&self, _path: &str) -> Result<Option<SourceFile>> {
            Ok(None)
        }
        async fn get_chunks_by_file_path(&self, _path: &str) -> Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
        async fn get_chunks_by_ids(&self, _ids: &[i64]) -> Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
        async fn insert_chunks_batch(&self, chunks: &[Chunk]) -> Result<Vec<i64>> {
            if self
                .fail_inserts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(Error::transient("store timeout"));
            }
            let mut stored = self.chunks.lock().unwrap();
            let first_id = stored.len() as i64 + 1;
            stored.extend_from_slice(chunks);
            Ok((first_id..first_id + chunks.len() as i64).collect())
        }
        async fn insert_embeddings_batch(
            &self,
            chunk_ids: &[i64],
            embeddings: &[EmbedChunk],
        ) -> Result<usize> {
            let mut stored = self.embeddings.lock().unwrap();
            for (id, embedded) in chunk_ids.iter().zip(embeddings) {
                stored.push((*id, embedded.provider.clone()));
            }
            Ok(chunk_ids.len())
        }
        async fn upsert_embedding_rows(
            &self,
            rows: &[EmbeddingData],
            _statuses: &HashMap<i64, EmbeddingStatus>,
        ) -> Result<()> {
            self.failure_rows.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }
        async fn filter_existing_embeddings(
            &self,
            _chunk_ids: &[i64],
            _provider: &str,
            _model: &str,
        ) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }
        async fn delete_embeddings_for_chunks(
            &self,
            _chunk_ids: &[i64],
            _provider: &str,
            _model: &str,
        ) -> Result<()> {
            Ok(())
        }
        async fn optimize_tables(&self) -> Result<()> {
            self.optimizations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn clear_all_data(&self) -> Result<()> {
            Ok(())
        }
    }

    fn chunk(code: &str) -> Chunk {
        Chunk::builder()
            .lines(1, 1)
            .code(code)
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap()
    }

    fn embedded(code: &str) -> EmbedResult {
        EmbedResult::Embedded(EmbedChunk::new(
            chunk(code),
            vec![0.5, 0.5],
            "null",
            "null-test",
        ))
    }

    async fn drive(
        store: Arc<StubStore>,
        batch_size: usize,
        items: Vec<EmbedResult>,
        cancel: CancellationToken,
    ) -> Arc<PipelineCounters> {
        let context = Arc::new(StoreWorkerContext {
            database: store,
            batch_size,
            optimize_every: 2,
            batches_written: AtomicUsize::new(0),
        });
        let counters = Arc::new(PipelineCounters::default());
        let (tx, rx) = mpsc::channel(64);
        for item in items {
            tx.send(item).await.unwrap();
        }
        drop(tx);
        run_store_worker(
            0,
            context,
            Arc::new(Mutex::new(rx)),
            cancel,
            Arc::clone(&counters),
        )
        .await;
        counters
    }

    #[tokio::test]
    async fn stores_chunks_and_embeddings() {
        let store = Arc::new(StubStore::default());
        let counters = drive(
            Arc::clone(&store),
            10,
            vec![embedded("a"), embedded("b")],
            CancellationToken::new(),
        )
        .await;
        assert_eq!(store.chunks.lock().unwrap().len(), 2);
        assert_eq!(store.embeddings.lock().unwrap().len(), 2);
        assert_eq!(counters.chunks_stored.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_status_rows_are_upserted() {
        let store = Arc::new(StubStore::default());
        let failed = EmbedResult::Failed {
            chunk: chunk("broken"),
            provider: "null".to_string(),
            model: "null-test".to_string(),
            status: EmbeddingStatus::PermanentFailure,
        };
        drive(Arc::clone(&store), 10, vec![failed], CancellationToken::new()).await;
        let rows = store.failure_rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, EmbeddingStatus::PermanentFailure);
        assert!(rows[0].vector.is_empty());
    }

    #[tokio::test]
    async fn unembedded_chunks_are_stored_without_rows() {
        let store = Arc::new(StubStore::default());
        drive(
            Arc::clone(&store),
            10,
            vec![EmbedResult::Unembedded(chunk("plain"))],
            CancellationToken::new(),
        )
        .await;
        assert_eq!(store.chunks.lock().unwrap().len(), 1);
        assert!(store.embeddings.lock().unwrap().is_empty());
        assert!(store.failure_rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transient_store_failure_is_retried() {
        let store = Arc::new(StubStore {
            fail_inserts: AtomicUsize::new(1),
            ..StubStore::default()
        });
        let counters = drive(
            Arc::clone(&store),
            10,
            vec![embedded("a")],
            CancellationToken::new(),
        )
        .await;
        assert_eq!(store.chunks.lock().unwrap().len(), 1);
        assert_eq!(counters.chunks_stored.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn final_failure_is_recorded_and_swallowed() {
        let store = Arc::new(StubStore {
            fail_inserts: AtomicUsize::new(usize::MAX),
            ..StubStore::default()
        });
        let counters = drive(
            Arc::clone(&store),
            10,
            vec![embedded("a")],
            CancellationToken::new(),
        )
        .await;
        assert_eq!(counters.chunks_stored.load(Ordering::SeqCst), 0);
        assert_eq!(counters.errors_snapshot().count("store"), 1);
    }

    #[tokio::test]
    async fn cancellation_still_flushes_buffered_items() {
        let store = Arc::new(StubStore::default());
        let context = Arc::new(StoreWorkerContext {
            database: Arc::clone(&store) as SharedDatabaseProvider,
            batch_size: 100,
            optimize_every: 0,
            batches_written: AtomicUsize::new(0),
        });
        let counters = Arc::new(PipelineCounters::default());
        let (tx, rx) = mpsc::channel(8);
        tx.send(embedded("pending")).await.unwrap();

        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_store_worker(
            0,
            context,
            Arc::new(Mutex::new(rx)),
            cancel.clone(),
            Arc::clone(&counters),
        ));
        // give the worker time to buffer the item, then cancel mid-run
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cancel.cancel();
        worker.await.unwrap();
        drop(tx);

        assert_eq!(store.chunks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn optimize_runs_on_cadence() {
        let store = Arc::new(StubStore::default());
        let items: Vec<EmbedResult> = (0..4).map(|i| embedded(&format!("c{}", i))).collect();
        drive(Arc::clone(&store), 1, items, CancellationToken::new()).await;
        // 4 batches with optimize_every = 2
        assert_eq!(store.optimizations.load(Ordering::SeqCst), 2);
    }
}
