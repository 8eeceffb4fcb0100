//! Indexing coordinator
//!
//! Owns one run end to end: discovery, change detection against the store,
//! the three bounded channels, and the worker pools. Downstream channels
//! close when every upstream worker has finished; on cancellation the store
//! workers still flush what they buffered. The coordinator also exposes the
//! single-file path, which serializes on a per-file lock and stores
//! diff-aware.

use crate::batching::{BatchLimits, TokenAwareBatcher};
use crate::chunking::{diff_chunks, fallback};
use crate::constants::{
    CHUNK_CHANNEL_CAPACITY, DEFAULT_DATABASE_BATCH_SIZE, DEFAULT_EMBEDDING_BATCH_SIZE,
    DEFAULT_EMBED_WORKERS, DEFAULT_PARSE_WORKERS, DEFAULT_RECOMMENDED_CONCURRENCY,
    DEFAULT_STORE_WORKERS, EMBED_CHANNEL_CAPACITY, FILE_CHANNEL_CAPACITY,
    OPTIMIZE_EVERY_BATCHES,
};
use crate::discovery::{self, DiscoveryOptions};
use crate::pipeline::embed_worker::{
    embed_batch_with_retry, run_embed_worker, EmbedWorkerContext,
};
use crate::pipeline::parse_worker::{run_parse_worker, ParseWorkerContext};
use crate::pipeline::store_worker::{run_store_worker, StoreWorkerContext};
use crate::pipeline::{
    EmbedResult, IndexingRunResult, PipelineCounters, RunState, RunStatus,
};
use crate::ports::{
    NullCircuitBreaker, NullRateLimiter, SharedCircuitBreaker, SharedFileLockProvider,
    SharedRateLimiter,
};
use semdex_domain::content;
use semdex_domain::ports::{
    NullProgressSink, ParserRegistry, SharedDatabaseProvider, SharedEmbeddingProvider,
    SharedProgressSink,
};
use futures::future::join_all;
use semdex_domain::{Chunk, EmbedChunk, Error, Language, Result, SourceFile};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sizing of the pipeline's pools, channels, and batches
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parse worker count
    pub parse_workers: usize,
    /// Embed worker count (ignored when no provider is configured)
    pub embed_workers: usize,
    /// Store worker count
    pub store_workers: usize,
    /// Files queue capacity
    pub file_channel_capacity: usize,
    /// Chunks queue capacity
    pub chunk_channel_capacity: usize,
    /// Embedded-chunks queue capacity
    pub embed_channel_capacity: usize,
    /// Chunks buffered per embedding call
    pub embedding_batch_size: usize,
    /// Items buffered per store write
    pub database_batch_size: usize,
    /// Store batches between optimization passes
    pub optimize_every_batches: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parse_workers: DEFAULT_PARSE_WORKERS,
            embed_workers: DEFAULT_EMBED_WORKERS,
            store_workers: DEFAULT_STORE_WORKERS,
            file_channel_capacity: FILE_CHANNEL_CAPACITY,
            chunk_channel_capacity: CHUNK_CHANNEL_CAPACITY,
            embed_channel_capacity: EMBED_CHANNEL_CAPACITY,
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            database_batch_size: DEFAULT_DATABASE_BATCH_SIZE,
            optimize_every_batches: OPTIMIZE_EVERY_BATCHES,
        }
    }
}

/// Builder for [`IndexingCoordinator`]
pub struct IndexingCoordinatorBuilder {
    database: SharedDatabaseProvider,
    parsers: Arc<ParserRegistry>,
    locks: SharedFileLockProvider,
    embedding: Option<SharedEmbeddingProvider>,
    breaker: SharedCircuitBreaker,
    limiter: SharedRateLimiter,
    progress: SharedProgressSink,
    pipeline: PipelineConfig,
    discovery: DiscoveryOptions,
}

impl IndexingCoordinatorBuilder {
    /// Attach an embedding provider; without one, chunks are stored unembedded
    pub fn embedding(mut self, provider: SharedEmbeddingProvider) -> Self {
        self.embedding = Some(provider);
        self
    }

    /// Replace the default (always-closed) circuit breaker
    pub fn circuit_breaker(mut self, breaker: SharedCircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    /// Replace the default (unlimited) rate limiter
    pub fn rate_limiter(mut self, limiter: SharedRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replace the default (silent) progress sink
    pub fn progress(mut self, progress: SharedProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Override pipeline sizing
    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline = config;
        self
    }

    /// Override discovery filters
    pub fn discovery_options(mut self, options: DiscoveryOptions) -> Self {
        self.discovery = options;
        self
    }

    /// Finish building
    pub fn build(self) -> IndexingCoordinator {
        IndexingCoordinator {
            database: self.database,
            parsers: self.parsers,
            locks: self.locks,
            embedding: self.embedding,
            breaker: self.breaker,
            limiter: self.limiter,
            progress: self.progress,
            pipeline: self.pipeline,
            discovery: self.discovery,
        }
    }
}

/// Drives indexing runs over a directory tree
pub struct IndexingCoordinator {
    database: SharedDatabaseProvider,
    parsers: Arc<ParserRegistry>,
    locks: SharedFileLockProvider,
    embedding: Option<SharedEmbeddingProvider>,
    breaker: SharedCircuitBreaker,
    limiter: SharedRateLimiter,
    progress: SharedProgressSink,
    pipeline: PipelineConfig,
    discovery: DiscoveryOptions,
}

impl IndexingCoordinator {
    /// Start building a coordinator
    pub fn builder(
        database: SharedDatabaseProvider,
        parsers: Arc<ParserRegistry>,
        locks: SharedFileLockProvider,
    ) -> IndexingCoordinatorBuilder {
        IndexingCoordinatorBuilder {
            database,
            parsers,
            locks,
            embedding: None,
            breaker: Arc::new(NullCircuitBreaker::new("embedding")),
            limiter: Arc::new(NullRateLimiter),
            progress: Arc::new(NullProgressSink),
            pipeline: PipelineConfig::default(),
            discovery: DiscoveryOptions::default(),
        }
    }

    /// Index a directory tree incrementally
    pub async fn run(&self, root: &Path, cancel: CancellationToken) -> Result<IndexingRunResult> {
        let started = std::time::Instant::now();
        let run_id = uuid::Uuid::new_v4();
        tracing::info!(%run_id, root = %root.display(), "indexing run starting");
        let mut state = RunState::Created;

        self.database.initialize().await?;

        state = self.transition(state, RunState::Discovering);
        self.progress.report(0.0, "discovering files", 0, 0);
        let discovered = discovery::discover(root, &self.discovery).await?;
        tracing::info!(
            files = discovered.files.len(),
            skipped = discovered.skipped,
            bytes = discovered.total_bytes,
            "discovery complete"
        );

        state = self.transition(state, RunState::Filtering);
        let mut to_index: Vec<SourceFile> = Vec::new();
        for file in &discovered.files {
            if cancel.is_cancelled() {
                break;
            }
            let known = self.database.get_file_by_path(&file.relative_path).await?;
            let changed = match known {
                Some(existing) => {
                    if existing.mtime != file.mtime {
                        true
                    } else {
                        // Equal mtimes: the stored content hash settles it.
                        // A rewrite that restores the old mtime still reindexes.
                        match &existing.content_hash {
                            Some(stored_hash) => {
                                match tokio::fs::read_to_string(&file.absolute_path).await {
                                    Ok(raw) => content::content_hash(&raw) != *stored_hash,
                                    Err(error) => {
                                        tracing::debug!(
                                            path = %file.relative_path,
                                            %error,
                                            "hash check read failed, treating as changed"
                                        );
                                        true
                                    }
                                }
                            }
                            None => false,
                        }
                    }
                }
                None => true,
            };
            if changed {
                to_index.push(file.to_source_file()?);
            }
        }
        let attempted = to_index.len();
        tracing::info!(
            attempted,
            unchanged = discovered.files.len() - attempted,
            "change detection complete"
        );

        if cancel.is_cancelled() {
            self.transition(state, RunState::Cancelled);
            let mut result = IndexingRunResult::no_files(started.elapsed());
            result.status = RunStatus::Cancelled;
            return Ok(result);
        }
        if to_index.is_empty() {
            self.transition(state, RunState::NoFiles);
            self.progress.report(1.0, "nothing to index", 0, 0);
            return Ok(IndexingRunResult::no_files(started.elapsed()));
        }

        state = self.transition(state, RunState::Running);
        let counters = Arc::new(PipelineCounters::default());
        self.run_pipeline(root, to_index, &cancel, Arc::clone(&counters))
            .await;

        let files_processed = counters.files_processed.load(Ordering::SeqCst);
        let chunks_parsed = counters.chunks_parsed.load(Ordering::SeqCst);
        let chunks_stored = counters.chunks_stored.load(Ordering::SeqCst);

        // Errored covers both total-failure shapes: every parse failed, or
        // chunks were parsed and the store rejected all of them.
        let final_state = if cancel.is_cancelled() {
            RunState::Cancelled
        } else if files_processed == 0 || (chunks_parsed > 0 && chunks_stored == 0) {
            RunState::Errored
        } else {
            RunState::Succeeded
        };
        self.transition(state, final_state);

        self.progress.report(
            1.0,
            "indexing complete",
            files_processed,
            attempted,
        );
        Ok(IndexingRunResult {
            status: match final_state {
                RunState::Cancelled => RunStatus::Cancelled,
                RunState::Errored => RunStatus::Error,
                _ => RunStatus::Success,
            },
            files_attempted: attempted,
            files_processed,
            files_failed: counters.files_failed.load(Ordering::SeqCst),
            chunks_stored,
            duration: started.elapsed(),
            errors: counters.errors_snapshot(),
        })
    }

    /// Wire the channels, spawn the pools, feed the files, and drain
    async fn run_pipeline(
        &self,
        root: &Path,
        files: Vec<SourceFile>,
        cancel: &CancellationToken,
        counters: Arc<PipelineCounters>,
    ) {
        let total_files = files.len();
        let (files_tx, files_rx) = mpsc::channel::<SourceFile>(self.pipeline.file_channel_capacity);
        let (chunks_tx, chunks_rx) = mpsc::channel::<Chunk>(self.pipeline.chunk_channel_capacity);
        let (embedded_tx, embedded_rx) =
            mpsc::channel::<EmbedResult>(self.pipeline.embed_channel_capacity);
        let files_rx = Arc::new(Mutex::new(files_rx));
        let chunks_rx = Arc::new(Mutex::new(chunks_rx));
        let embedded_rx = Arc::new(Mutex::new(embedded_rx));

        let parse_context = Arc::new(ParseWorkerContext {
            root: root.to_path_buf(),
            parsers: Arc::clone(&self.parsers),
            database: Arc::clone(&self.database),
            embedding_key: self.embedding.as_ref().map(|provider| {
                (
                    provider.provider_name().to_string(),
                    provider.model_name().to_string(),
                )
            }),
            progress: Arc::clone(&self.progress),
            total_files,
        });
        let mut parse_handles: Vec<JoinHandle<()>> = Vec::new();
        for worker_id in 0..self.pipeline.parse_workers.max(1) {
            parse_handles.push(tokio::spawn(run_parse_worker(
                worker_id,
                Arc::clone(&parse_context),
                Arc::clone(&files_rx),
                chunks_tx.clone(),
                cancel.clone(),
                Arc::clone(&counters),
            )));
        }
        drop(chunks_tx);

        let mut embed_handles: Vec<JoinHandle<()>> = Vec::new();
        match &self.embedding {
            Some(provider) => {
                let worker_count = self
                    .pipeline
                    .embed_workers
                    .max(1)
                    .min(provider.recommended_concurrency().unwrap_or(DEFAULT_RECOMMENDED_CONCURRENCY));
                let embed_context = Arc::new(EmbedWorkerContext {
                    provider: Arc::clone(provider),
                    breaker: Arc::clone(&self.breaker),
                    limiter: Arc::clone(&self.limiter),
                    batch_size: self.pipeline.embedding_batch_size,
                });
                for worker_id in 0..worker_count {
                    embed_handles.push(tokio::spawn(run_embed_worker(
                        worker_id,
                        Arc::clone(&embed_context),
                        Arc::clone(&chunks_rx),
                        embedded_tx.clone(),
                        cancel.clone(),
                        Arc::clone(&counters),
                    )));
                }
            }
            None => {
                // No provider: chunks pass straight through to the store
                let forward_tx = embedded_tx.clone();
                let forward_rx = Arc::clone(&chunks_rx);
                embed_handles.push(tokio::spawn(async move {
                    loop {
                        let chunk = {
                            let mut rx = forward_rx.lock().await;
                            rx.recv().await
                        };
                        match chunk {
                            Some(chunk) => {
                                if forward_tx.send(EmbedResult::Unembedded(chunk)).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }));
            }
        }
        drop(embedded_tx);

        let store_context = Arc::new(StoreWorkerContext {
            database: Arc::clone(&self.database),
            batch_size: self.pipeline.database_batch_size,
            optimize_every: self.pipeline.optimize_every_batches,
            batches_written: AtomicUsize::new(0),
        });
        let mut store_handles: Vec<JoinHandle<()>> = Vec::new();
        for worker_id in 0..self.pipeline.store_workers.max(1) {
            store_handles.push(tokio::spawn(run_store_worker(
                worker_id,
                Arc::clone(&store_context),
                Arc::clone(&embedded_rx),
                cancel.clone(),
                Arc::clone(&counters),
            )));
        }

        for file in files {
            tokio::select! {
                () = cancel.cancelled() => break,
                sent = files_tx.send(file) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        drop(files_tx);

        // Each pool drains before its downstream channel closes
        join_all(parse_handles).await;
        join_all(embed_handles).await;
        join_all(store_handles).await;
    }

    /// Index one file, serialized on its canonical-path lock
    ///
    /// Looks up or creates the file row, parses, diffs against the stored
    /// chunks, deletes stale embeddings, and stores only added content.
    /// Returns the number of chunks written.
    pub async fn index_file(&self, path: &Path) -> Result<usize> {
        let canonical = path
            .canonicalize()
            .map_err(|e| Error::io_with_source(format!("canonicalize {}", path.display()), e))?;
        let key = canonical.to_string_lossy().replace('\\', "/");

        let guard = self.locks.acquire_lock(&key).await?;
        let outcome = self.index_file_locked(&canonical, &key).await;
        let released = self.locks.release_lock(guard).await;
        // the indexing error wins over a release error
        let stored = outcome?;
        released?;
        Ok(stored)
    }

    async fn index_file_locked(&self, absolute: &Path, stored_path: &str) -> Result<usize> {
        let raw = tokio::fs::read_to_string(absolute).await?;
        let metadata = tokio::fs::metadata(absolute).await?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let extension = absolute.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut file = SourceFile::new(
            stored_path,
            mtime,
            Language::from_extension(extension),
            metadata.len(),
        )?
        .with_content_hash(content::content_hash(&raw));
        let file_id = self.database.upsert_file(&file).await?;
        file.id = Some(file_id);

        if raw.trim().is_empty() {
            return Ok(0);
        }
        let parsed = match self.parsers.get(&file.language) {
            Some(parser) => parser.parse(&file, &raw).await?,
            None => fallback::chunk_content(&file, &raw)?,
        };
        let existing = self.database.get_chunks_by_file_path(stored_path).await?;
        let diff = diff_chunks(&parsed, &existing);

        if let Some(provider) = &self.embedding {
            let stale_ids: Vec<i64> = diff.deleted.iter().filter_map(|c| c.id).collect();
            if !stale_ids.is_empty() {
                self.database
                    .delete_embeddings_for_chunks(
                        &stale_ids,
                        provider.provider_name(),
                        provider.model_name(),
                    )
                    .await?;
            }
        }
        if diff.added.is_empty() {
            return Ok(0);
        }

        let ids = self.database.insert_chunks_batch(&diff.added).await?;
        if let Some(provider) = &self.embedding {
            let embed_context = EmbedWorkerContext {
                provider: Arc::clone(provider),
                breaker: Arc::clone(&self.breaker),
                limiter: Arc::clone(&self.limiter),
                batch_size: self.pipeline.embedding_batch_size,
            };
            let embedded: Vec<EmbedChunk> =
                embed_batch_with_retry(&embed_context, &diff.added, &CancellationToken::new())
                    .await?;
            self.database
                .insert_embeddings_batch(&ids, &embedded)
                .await?;
        }
        Ok(diff.added.len())
    }

    /// Embed stored chunks that lack an embedding for the current provider
    ///
    /// Useful after switching providers or models: chunk rows survive, and
    /// this fills in the missing (provider, model) embeddings without
    /// re-parsing anything. Returns the number of embeddings written.
    pub async fn backfill_embeddings(&self, chunk_ids: &[i64]) -> Result<usize> {
        let provider = self
            .embedding
            .as_ref()
            .ok_or_else(|| Error::validation("no embedding provider configured"))?;

        let covered = self
            .database
            .filter_existing_embeddings(chunk_ids, provider.provider_name(), provider.model_name())
            .await?;
        let missing: Vec<i64> = chunk_ids
            .iter()
            .filter(|id| !covered.contains(id))
            .copied()
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let chunks = self.database.get_chunks_by_ids(&missing).await?;
        let embed_context = EmbedWorkerContext {
            provider: Arc::clone(provider),
            breaker: Arc::clone(&self.breaker),
            limiter: Arc::clone(&self.limiter),
            batch_size: self.pipeline.embedding_batch_size,
        };
        let batcher = TokenAwareBatcher::new(Some(BatchLimits::from_provider(provider.as_ref())));
        let cancel = CancellationToken::new();
        let mut written = 0usize;
        for batch in batcher.pack(chunks) {
            let ids: Vec<i64> = batch.iter().filter_map(|chunk| chunk.id).collect();
            let embedded = embed_batch_with_retry(&embed_context, &batch, &cancel).await?;
            written += self
                .database
                .insert_embeddings_batch(&ids, &embedded)
                .await?;
        }
        tracing::info!(written, "embedding backfill complete");
        Ok(written)
    }

    /// Remove every indexed row, for full re-index flows
    pub async fn clear(&self) -> Result<()> {
        tracing::info!("clearing all indexed data");
        self.database.clear_all_data().await
    }

    fn transition(&self, from: RunState, to: RunState) -> RunState {
        if from != to {
            tracing::info!(from = %from, to = %to, "run state transition");
        }
        to
    }
}
