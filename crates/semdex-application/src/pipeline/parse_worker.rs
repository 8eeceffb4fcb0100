//! Parse worker
//!
//! Drains the files queue and turns each descriptor into chunks: the
//! registered parser for the file's language when one exists, the keyword
//! fallback chunker otherwise. Freshly parsed chunks are diffed against the
//! store so only added content travels downstream and unchanged chunks keep
//! their prior embeddings. Per-file failures are logged and swallowed; the
//! worker only stops when its input channel closes or the run is cancelled.

use crate::chunking::{diff_chunks, fallback};
use crate::pipeline::PipelineCounters;
use semdex_domain::content;
use semdex_domain::ports::{ParserRegistry, SharedDatabaseProvider, SharedProgressSink};
use semdex_domain::{Chunk, Result, SourceFile};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Dependencies shared by every parse worker in a run
pub struct ParseWorkerContext {
    /// Root the relative paths are resolved against
    pub root: PathBuf,
    /// Parsers keyed by language
    pub parsers: Arc<ParserRegistry>,
    /// Store handle for diff reads and file upserts
    pub database: SharedDatabaseProvider,
    /// (provider, model) pair for pruning stale embeddings, when embedding is on
    pub embedding_key: Option<(String, String)>,
    /// Progress sink for per-file reports
    pub progress: SharedProgressSink,
    /// Total files in this run, for progress ratios
    pub total_files: usize,
}

/// Run one parse worker until the files channel closes
pub async fn run_parse_worker(
    worker_id: usize,
    context: Arc<ParseWorkerContext>,
    files_rx: Arc<Mutex<mpsc::Receiver<SourceFile>>>,
    chunks_tx: mpsc::Sender<Chunk>,
    cancel: CancellationToken,
    counters: Arc<PipelineCounters>,
) {
    tracing::debug!(worker_id, "parse worker started");
    loop {
        let file = {
            let mut rx = files_rx.lock().await;
            tokio::select! {
                () = cancel.cancelled() => break,
                file = rx.recv() => match file {
                    Some(file) => file,
                    None => break,
                },
            }
        };

        match process_file(&context, file).await {
            Ok(chunks) => {
                let processed = counters.files_processed.fetch_add(1, Ordering::SeqCst) + 1;
                counters.chunks_parsed.fetch_add(chunks.len(), Ordering::SeqCst);
                if context.total_files > 0 {
                    context.progress.report(
                        processed as f64 / context.total_files as f64,
                        "parsed",
                        processed,
                        context.total_files,
                    );
                }
                for chunk in chunks {
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        sent = chunks_tx.send(chunk) => {
                            if sent.is_err() {
                                // downstream gone, nothing left to do
                                return;
                            }
                        }
                    }
                }
            }
            Err(error) => {
                counters.files_failed.fetch_add(1, Ordering::SeqCst);
                counters.record_error("parse", error.to_string());
                tracing::warn!(worker_id, %error, "file parse failed");
            }
        }
    }
    tracing::debug!(worker_id, "parse worker finished");
}

/// Parse one file and return only the chunks the store does not have yet
async fn process_file(context: &ParseWorkerContext, file: SourceFile) -> Result<Vec<Chunk>> {
    let absolute = context.root.join(&file.path);
    let raw = tokio::fs::read_to_string(&absolute).await?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut file = file.with_content_hash(content::content_hash(&raw));
    let file_id = context.database.upsert_file(&file).await?;
    file.id = Some(file_id);

    let parsed = match context.parsers.get(&file.language) {
        Some(parser) => parser.parse(&file, &raw).await?,
        None => fallback::chunk_content(&file, &raw)?,
    };

    let existing = context.database.get_chunks_by_file_path(&file.path).await?;
    let diff = diff_chunks(&parsed, &existing);

    if !diff.deleted.is_empty() {
        let stale_ids: Vec<i64> = diff.deleted.iter().filter_map(|c| c.id).collect();
        if let Some((provider, model)) = &context.embedding_key {
            if !stale_ids.is_empty() {
                if let Err(error) = context
                    .database
                    .delete_embeddings_for_chunks(&stale_ids, provider, model)
                    .await
                {
                    tracing::warn!(%error, path = %file.path, "stale embedding cleanup failed");
                }
            }
        }
    }

    tracing::debug!(
        path = %file.path,
        parsed = parsed.len(),
        added = diff.added.len(),
        unchanged = diff.unchanged.len(),
        deleted = diff.deleted.len(),
        "file parsed"
    );
    Ok(diff.added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use semdex_domain::ports::{DatabaseProvider, NullProgressSink};
    use semdex_domain::{EmbedChunk, EmbeddingData, EmbeddingStatus, Error, Language};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Minimal store stub recording upserts and serving canned chunks
    #[derive(Default)]
    struct StubDatabase {
        existing: StdMutex<Vec<Chunk>>,
        files: StdMutex<Vec<SourceFile>>,
        deleted: StdMutex<Vec<i64>>,
    }

    #[async_trait]
    impl DatabaseProvider for StubDatabase {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }
        async fn upsert_file(&self, file: &SourceFile) -> Result<i64> {
            self.files.lock().unwrap().push(file.clone());
            Ok(1)
        }
        async fn get_file_by_path(&self, _path: &str) -> Result<Option<SourceFile>> {
            Ok(None)
        }
        async fn get_chunks_by_file_path(&self, _path: &str) -> Result<Vec<Chunk>> {
            Ok(self.existing.lock().unwrap().clone())
        }
        async fn get_chunks_by_ids(&self, _ids: &[i64]) -> Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
        async fn insert_chunks_batch(&self, chunks: &[Chunk]) -> Result<Vec<i64>> {
            Ok((0..chunks.len() as i64).collect())
        }
        async fn insert_embeddings_batch(
            &self,
            chunk_ids: &[i64],
            _embeddings: &[EmbedChunk],
        ) -> Result<usize> {
            Ok(chunk_ids.len())
        }
        async fn upsert_embedding_rows(
            &self,
            _rows: &[EmbeddingData],
            _statuses: &HashMap<i64, EmbeddingStatus>,
        ) -> Result<()> {
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
            chunk_ids: &[i64],
            _provider: &str,
            _model: &str,
        ) -> Result<()> {
            self.deleted.lock().unwrap().extend_from_slice(chunk_ids);
            Ok(())
        }
        async fn optimize_tables(&self) -> Result<()> {
            Ok(())
        }
        async fn clear_all_data(&self) -> Result<()> {
            Err(Error::permanent("not supported"))
        }
    }

    fn context(root: PathBuf, database: Arc<StubDatabase>) -> Arc<ParseWorkerContext> {
        Arc::new(ParseWorkerContext {
            root,
            parsers: Arc::new(ParserRegistry::new()),
            database,
            embedding_key: Some(("null".to_string(), "null-test".to_string())),
            progress: Arc::new(NullProgressSink),
            total_files: 1,
        })
    }

    #[tokio::test]
    async fn parses_a_file_into_added_chunks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sample.rs"),
            "fn sample() {\n    let value = 1;\n    assert!(value > 0);\n}",
        )
        .unwrap();
        let database = Arc::new(StubDatabase::default());
        let context = context(dir.path().to_path_buf(), Arc::clone(&database));
        let file = SourceFile::new("sample.rs", 1_700_000_000, Language::Rust, 64).unwrap();

        let chunks = process_file(&context, file).await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.file_id == 1));
        // upsert captured the content hash
        let stored = database.files.lock().unwrap();
        assert!(stored[0].content_hash.is_some());
    }

    #[tokio::test]
    async fn unchanged_content_produces_no_added_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let code = "fn sample() {\n    let value = 1;\n    assert!(value > 0);\n}";
        std::fs::write(dir.path().join("sample.rs"), code).unwrap();

        let database = Arc::new(StubDatabase::default());
        let context = context(dir.path().to_path_buf(), Arc::clone(&database));
        let file = SourceFile::new("sample.rs", 1_700_000_000, Language::Rust, 64).unwrap();

        // First parse tells us what the store would hold
        let first = process_file(&context, file.clone()).await.unwrap();
        *database.existing.lock().unwrap() = first;

        let second = process_file(&context, file).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn stale_chunks_trigger_embedding_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.rs"), "fn replacement() {}\n").unwrap();

        let stale = Chunk::builder()
            .lines(1, 1)
            .code("fn obsolete() {}")
            .chunk_type(semdex_domain::ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .id(99)
            .build()
            .unwrap();
        let database = Arc::new(StubDatabase::default());
        *database.existing.lock().unwrap() = vec![stale];

        let context = context(dir.path().to_path_buf(), Arc::clone(&database));
        let file = SourceFile::new("sample.rs", 1_700_000_000, Language::Rust, 64).unwrap();
        process_file(&context, file).await.unwrap();

        assert_eq!(*database.deleted.lock().unwrap(), vec![99]);
    }

    #[tokio::test]
    async fn empty_file_produces_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.rs"), "   \n  ").unwrap();
        let database = Arc::new(StubDatabase::default());
        let context = context(dir.path().to_path_buf(), database);
        let file = SourceFile::new("empty.rs", 1_700_000_000, Language::Rust, 8).unwrap();
        let chunks = process_file(&context, file).await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn worker_survives_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.rs"), "fn good() {}\n").unwrap();

        let database = Arc::new(StubDatabase::default());
        let context = context(dir.path().to_path_buf(), database);
        let counters = Arc::new(PipelineCounters::default());
        let (files_tx, files_rx) = mpsc::channel(8);
        let (chunks_tx, mut chunks_rx) = mpsc::channel(8);

        let missing = SourceFile::new("missing.rs", 1_700_000_000, Language::Rust, 8).unwrap();
        let good = SourceFile::new("good.rs", 1_700_000_000, Language::Rust, 8).unwrap();
        files_tx.send(missing).await.unwrap();
        files_tx.send(good).await.unwrap();
        drop(files_tx);

        run_parse_worker(
            0,
            context,
            Arc::new(Mutex::new(files_rx)),
            chunks_tx,
            CancellationToken::new(),
            Arc::clone(&counters),
        )
        .await;

        assert_eq!(counters.files_failed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.files_processed.load(Ordering::SeqCst), 1);
        assert!(chunks_rx.recv().await.is_some());
    }
}
