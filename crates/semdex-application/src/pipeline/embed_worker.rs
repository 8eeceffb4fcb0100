//! Embed worker
//!
//! Buffers chunks into provider-compliant batches, consults the circuit
//! breaker and rate limiter before every call, and retries transient batch
//! failures with exponential backoff. Within a batch the provider's result is
//! order-aligned: `embeddings[i]` belongs to `batch[i]`, and that alignment is
//! preserved in the emitted [`EmbedResult`]s. Breaker and limiter rejections
//! never reach the provider and are not recorded as provider failures.

use crate::batching::{BatchLimits, TokenAwareBatcher};
use crate::constants::EMBED_MAX_ATTEMPTS;
use crate::pipeline::backoff::embed_retry_delay;
use crate::pipeline::{EmbedResult, PipelineCounters};
use crate::ports::{SharedCircuitBreaker, SharedRateLimiter};
use semdex_domain::ports::SharedEmbeddingProvider;
use semdex_domain::{Chunk, EmbedChunk, EmbeddingStatus, Error, FailureKind, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Dependencies shared by every embed worker in a run
pub struct EmbedWorkerContext {
    /// The embedding provider
    pub provider: SharedEmbeddingProvider,
    /// Breaker guarding the provider
    pub breaker: SharedCircuitBreaker,
    /// Request rate limiter
    pub limiter: SharedRateLimiter,
    /// Chunks buffered before packing into provider batches
    pub batch_size: usize,
}

/// Run one embed worker until the chunks channel closes
pub async fn run_embed_worker(
    worker_id: usize,
    context: Arc<EmbedWorkerContext>,
    chunks_rx: Arc<Mutex<mpsc::Receiver<Chunk>>>,
    embedded_tx: mpsc::Sender<EmbedResult>,
    cancel: CancellationToken,
    counters: Arc<PipelineCounters>,
) {
    tracing::debug!(worker_id, "embed worker started");
    let mut buffer: Vec<Chunk> = Vec::with_capacity(context.batch_size);
    loop {
        let received = {
            let mut rx = chunks_rx.lock().await;
            tokio::select! {
                () = cancel.cancelled() => return,
                chunk = rx.recv() => chunk,
            }
        };

        match received {
            Some(chunk) => {
                buffer.push(chunk);
                if buffer.len() >= context.batch_size {
                    let drained = std::mem::take(&mut buffer);
                    if !process_buffer(&context, drained, &embedded_tx, &cancel, &counters).await {
                        return;
                    }
                }
            }
            None => {
                if !buffer.is_empty() {
                    process_buffer(&context, buffer, &embedded_tx, &cancel, &counters).await;
                }
                break;
            }
        }
    }
    tracing::debug!(worker_id, "embed worker finished");
}

/// Pack and embed a full buffer; `false` means downstream is gone
async fn process_buffer(
    context: &EmbedWorkerContext,
    buffer: Vec<Chunk>,
    embedded_tx: &mpsc::Sender<EmbedResult>,
    cancel: &CancellationToken,
    counters: &PipelineCounters,
) -> bool {
    let limits = BatchLimits::from_provider(context.provider.as_ref());
    let batcher = TokenAwareBatcher::new(Some(limits));
    for batch in batcher.pack(buffer) {
        let outcome = embed_batch_with_retry(context, &batch, cancel).await;
        let results = match outcome {
            Ok(embedded) => embedded.into_iter().map(EmbedResult::Embedded).collect::<Vec<_>>(),
            Err(error) => {
                let status = match error.failure_kind() {
                    FailureKind::Transient => {
                        counters.record_error("transient", error.to_string());
                        EmbeddingStatus::Failed
                    }
                    FailureKind::Permanent => {
                        counters.record_error("permanent", error.to_string());
                        EmbeddingStatus::PermanentFailure
                    }
                };
                tracing::warn!(%error, batch_len = batch.len(), "embed batch failed");
                batch
                    .into_iter()
                    .map(|chunk| EmbedResult::Failed {
                        chunk,
                        provider: context.provider.provider_name().to_string(),
                        model: context.provider.model_name().to_string(),
                        status,
                    })
                    .collect()
            }
        };
        for result in results {
            tokio::select! {
                () = cancel.cancelled() => return false,
                sent = embedded_tx.send(result) => {
                    if sent.is_err() {
                        return false;
                    }
                }
            }
        }
    }
    true
}

enum CallOutcome {
    /// Provider was invoked and returned
    Called(Result<Vec<Vec<f32>>>),
    /// Breaker or limiter refused; the provider was never invoked
    Rejected(Error),
}

async fn try_call(context: &EmbedWorkerContext, codes: &[String]) -> CallOutcome {
    if !context.breaker.is_call_permitted() {
        return CallOutcome::Rejected(Error::circuit_open());
    }
    if !context.limiter.try_acquire() {
        return CallOutcome::Rejected(Error::rate_limited());
    }
    CallOutcome::Called(context.provider.embed(codes).await)
}

/// Embed one batch, retrying transient failures
///
/// Up to [`EMBED_MAX_ATTEMPTS`] attempts with `min(2^attempt, 5)`-second
/// backoff between them. A length mismatch between the provider's result and
/// the batch is a permanent failure.
pub async fn embed_batch_with_retry(
    context: &EmbedWorkerContext,
    batch: &[Chunk],
    cancel: &CancellationToken,
) -> Result<Vec<EmbedChunk>> {
    let codes: Vec<String> = batch.iter().map(|chunk| chunk.code.clone()).collect();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let error = match try_call(context, &codes).await {
            CallOutcome::Called(Ok(vectors)) => {
                if vectors.len() != batch.len() {
                    context.breaker.record_failure().await;
                    return Err(Error::permanent(format!(
                        "provider returned {} embeddings for {} texts",
                        vectors.len(),
                        batch.len()
                    )));
                }
                context.breaker.record_success().await;
                let embedded = batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| {
                        EmbedChunk::new(
                            chunk.clone(),
                            vector,
                            context.provider.provider_name(),
                            context.provider.model_name(),
                        )
                    })
                    .collect();
                return Ok(embedded);
            }
            CallOutcome::Called(Err(error)) => {
                context.breaker.record_failure().await;
                error
            }
            CallOutcome::Rejected(error) => error,
        };

        if error.failure_kind() == FailureKind::Permanent || attempt >= EMBED_MAX_ATTEMPTS {
            return Err(error);
        }
        let delay = embed_retry_delay(attempt);
        tracing::debug!(attempt, ?delay, %error, "retrying embed batch");
        tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        CircuitBreakerBackend, CircuitBreakerState, NullCircuitBreaker, NullRateLimiter,
        RateLimiterBackend,
    };
    use async_trait::async_trait;
    use semdex_domain::ports::EmbeddingProvider;
    use semdex_domain::{ChunkType, Language};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider failing a configurable number of leading calls
    struct FlakyProvider {
        calls: AtomicUsize,
        fail_first: usize,
        permanent: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return if self.permanent {
                    Err(Error::http_status(400, "bad request"))
                } else {
                    Err(Error::http_status(503, "service unavailable"))
                };
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
        fn provider_name(&self) -> &str {
            "flaky"
        }
        fn model_name(&self) -> &str {
            "flaky-1"
        }
    }

    /// Provider returning a short result list
    struct MisalignedProvider;

    #[async_trait]
    impl EmbeddingProvider for MisalignedProvider {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
        fn provider_name(&self) -> &str {
            "misaligned"
        }
        fn model_name(&self) -> &str {
            "misaligned-1"
        }
    }

    /// Breaker that rejects every call
    struct OpenBreaker;

    #[async_trait]
    impl CircuitBreakerBackend for OpenBreaker {
        fn is_call_permitted(&self) -> bool {
            false
        }
        async fn record_success(&self) {}
        async fn record_failure(&self) {}
        fn state(&self) -> CircuitBreakerState {
            CircuitBreakerState::Open
        }
        fn name(&self) -> &str {
            "open"
        }
    }

    /// Limiter that always refuses
    struct ExhaustedLimiter;

    impl RateLimiterBackend for ExhaustedLimiter {
        fn try_acquire(&self) -> bool {
            false
        }
    }

    fn chunk(index: u32, code: &str) -> Chunk {
        Chunk::builder()
            .lines(index, index)
            .code(code)
            .chunk_type(ChunkType::Function)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap()
    }

    fn context(provider: Arc<dyn EmbeddingProvider>) -> EmbedWorkerContext {
        EmbedWorkerContext {
            provider,
            breaker: Arc::new(NullCircuitBreaker::new("test")),
            limiter: Arc::new(NullRateLimiter),
            batch_size: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn alignment_is_preserved() {
        let context = context(Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            permanent: false,
        }));
        let batch = vec![chunk(1, "a"), chunk(2, "bb"), chunk(3, "ccc")];
        let embedded = embed_batch_with_retry(&context, &batch, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(embedded.len(), 3);
        for (result, input) in embedded.iter().zip(&batch) {
            assert_eq!(&result.chunk, input);
            assert_eq!(result.embedding[0], input.code.len() as f32);
            assert_eq!(result.provider, "flaky");
            assert_eq!(result.model, "flaky-1");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_once() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: 1,
            permanent: false,
        });
        let context = context(Arc::clone(&provider) as Arc<dyn EmbeddingProvider>);
        let batch = vec![chunk(1, "a")];
        let embedded = embed_batch_with_retry(&context, &batch, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(embedded.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_exhaust_after_three_attempts() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: usize::MAX,
            permanent: false,
        });
        let context = context(Arc::clone(&provider) as Arc<dyn EmbeddingProvider>);
        let error = embed_batch_with_retry(&context, &[chunk(1, "a")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Transient);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: usize::MAX,
            permanent: true,
        });
        let context = context(Arc::clone(&provider) as Arc<dyn EmbeddingProvider>);
        let error = embed_batch_with_retry(&context, &[chunk(1, "a")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Permanent);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn length_mismatch_is_permanent() {
        let context = context(Arc::new(MisalignedProvider));
        let batch = vec![chunk(1, "a"), chunk(2, "b")];
        let error = embed_batch_with_retry(&context, &batch, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(error.failure_kind(), FailureKind::Permanent);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_rejects_without_calling_provider() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            permanent: false,
        });
        let mut context = context(Arc::clone(&provider) as Arc<dyn EmbeddingProvider>);
        context.breaker = Arc::new(OpenBreaker);
        let error = embed_batch_with_retry(&context, &[chunk(1, "a")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("circuit breaker"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_limiter_rejects_without_calling_provider() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            permanent: false,
        });
        let mut context = context(Arc::clone(&provider) as Arc<dyn EmbeddingProvider>);
        context.limiter = Arc::new(ExhaustedLimiter);
        let error = embed_batch_with_retry(&context, &[chunk(1, "a")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("rate limit"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_batch_flows_downstream_with_failure_status() {
        let provider = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_first: usize::MAX,
            permanent: true,
        });
        let context = Arc::new(context(provider as Arc<dyn EmbeddingProvider>));
        let counters = Arc::new(PipelineCounters::default());
        let (chunks_tx, chunks_rx) = mpsc::channel(8);
        let (embedded_tx, mut embedded_rx) = mpsc::channel(8);

        chunks_tx.send(chunk(1, "a")).await.unwrap();
        drop(chunks_tx);

        run_embed_worker(
            0,
            context,
            Arc::new(Mutex::new(chunks_rx)),
            embedded_tx,
            CancellationToken::new(),
            Arc::clone(&counters),
        )
        .await;

        match embedded_rx.recv().await.unwrap() {
            EmbedResult::Failed { status, .. } => {
                assert_eq!(status, EmbeddingStatus::PermanentFailure);
            }
            other => panic!("expected failed result, got {:?}", other),
        }
        assert_eq!(counters.errors_snapshot().count("permanent"), 1);
    }
}
