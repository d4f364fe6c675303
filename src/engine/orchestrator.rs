//! Per-query pipeline: cache check, concurrent fetch, generate, score, gated write.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::batch::BatchRunner;
use super::config::EngineConfig;
use super::error::{QueryError, QueryOutcome};
use super::metrics::{EngineCacheStats, MetricsAccumulator, PerformanceStats};
use super::types::{CachedAnswer, QueryResult};
use crate::backend::{Embedder, Generator, Retriever};
use crate::cache::{CacheSweeper, ContextCacheValue, Sweepable, TimedCache};
use crate::gate::ConcurrencyGate;
use crate::hashing::{answer_key, context_key, embedding_key, relevance_key};
use crate::scoring::{QualityScorer, passage_relevance};

/// Answers questions through a gate, two caches and three injected backends.
///
/// Every public entry point returns a [`QueryResult`]; pipeline failures are folded
/// into `source = error` results and never escape to the caller.
pub struct QueryEngine {
    retriever: Arc<dyn Retriever>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    answer_cache: Arc<TimedCache<CachedAnswer>>,
    context_cache: Arc<TimedCache<ContextCacheValue>>,
    scorer: QualityScorer,
    gate: ConcurrencyGate,
    metrics: Mutex<MetricsAccumulator>,
    config: EngineConfig,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("answer_cache", &self.answer_cache)
            .field("context_cache", &self.context_cache)
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    pub fn new(
        config: EngineConfig,
        retriever: Arc<dyn Retriever>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            retriever,
            embedder,
            generator,
            answer_cache: Arc::new(TimedCache::new(config.cache_capacity, config.cache_ttl)),
            context_cache: Arc::new(TimedCache::new(config.cache_capacity, config.cache_ttl)),
            scorer: QualityScorer::default(),
            gate: ConcurrencyGate::new(config.max_concurrent, config.rate_limit),
            metrics: Mutex::new(MetricsAccumulator::default()),
            config,
        }
    }

    /// Replaces the default scorer (and with it the relevance vocabulary).
    pub fn with_scorer(mut self, scorer: QualityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn answer_cache(&self) -> &TimedCache<CachedAnswer> {
        &self.answer_cache
    }

    pub fn context_cache(&self) -> &TimedCache<ContextCacheValue> {
        &self.context_cache
    }

    /// A sweeper over both caches using the configured interval. Not started.
    pub fn sweeper(&self) -> CacheSweeper {
        let answers: Arc<dyn Sweepable> = self.answer_cache.clone();
        let contexts: Arc<dyn Sweepable> = self.context_cache.clone();
        CacheSweeper::new(self.config.sweep_interval)
            .with_target("answer", answers)
            .with_target("context", contexts)
    }

    /// Answers one question.
    ///
    /// Empty questions return `source = empty` without taking a gate slot.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str) -> QueryResult {
        self.metrics.lock().record_request();

        let question = match validate(question) {
            Ok(question) => question,
            Err(_) => {
                debug!("Empty question, skipping pipeline");
                return QueryResult::empty();
            }
        };

        let admitted = AssertUnwindSafe(self.gate.run(move || async move {
            let started = Instant::now();
            let outcome = self.pipeline(question, started).await;
            (outcome, started.elapsed())
        }))
        .catch_unwind()
        .await;

        match admitted {
            Ok(Ok((Ok(result), _))) => result,
            Ok(Ok((Err(err), elapsed))) => self.fail(err, elapsed),
            Ok(Err(err)) => self.fail(err.into(), Duration::ZERO),
            Err(panic) => self.fail(
                QueryError::TaskFailed(format!("pipeline panicked: {}", panic_message(&*panic))),
                Duration::ZERO,
            ),
        }
    }

    /// Answers every question concurrently; results keep input order.
    pub async fn ask_batch<I, S>(self: &Arc<Self>, questions: I) -> Vec<QueryResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BatchRunner::new(Arc::clone(self)).run(questions).await
    }

    /// Blocking form of [`ask`](Self::ask) for callers outside any async runtime.
    ///
    /// Runs the same gated pipeline on a private current-thread runtime. Called from
    /// inside a runtime it returns an error result instead of blocking that runtime.
    pub fn ask_blocking(&self, question: &str) -> QueryResult {
        if tokio::runtime::Handle::try_current().is_ok() {
            self.metrics.lock().record_request();
            return self.fail(
                QueryError::TaskFailed("ask_blocking called from within an async runtime".into()),
                Duration::ZERO,
            );
        }

        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.ask(question)),
            Err(e) => {
                self.metrics.lock().record_request();
                self.fail(
                    QueryError::TaskFailed(format!("failed to start runtime: {e}")),
                    Duration::ZERO,
                )
            }
        }
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.metrics.lock().snapshot()
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            answer: self.answer_cache.stats(),
            context: self.context_cache.stats(),
        }
    }

    /// Empties both caches. Metrics are kept.
    pub fn clear_caches(&self) {
        self.answer_cache.clear();
        self.context_cache.clear();
        info!("Cleared answer and context caches");
    }

    /// Records a failure and converts it into an error result.
    pub(crate) fn fail(&self, err: QueryError, elapsed: Duration) -> QueryResult {
        self.metrics.lock().record_error();
        error!(error = %err, elapsed_ms = elapsed.as_millis() as u64, "Query failed");
        QueryResult::failed(err.to_string(), elapsed)
    }

    async fn pipeline(&self, question: &str, started: Instant) -> QueryOutcome<QueryResult> {
        let key = answer_key(question);
        if let Some(entry) = self.answer_cache.get(&key) {
            self.metrics.lock().record_cache_hit();
            info!("Answer cache hit");
            return Ok(QueryResult::cached(entry, started.elapsed()));
        }

        debug!("Answer cache miss, fetching context and embedding");
        let (context, embedding) = tokio::join!(
            self.fetch_context(question),
            self.fetch_embedding(question)
        );
        let context = context?;
        let embedding = embedding?;
        let context_length = context.chars().count();
        debug!(context_length, embedding_dim = embedding.len(), "Fetch complete");

        let generation = self.generator.generate(question, &context).await?;
        if generation.answer.trim().is_empty() {
            return Err(QueryError::EmptyAnswer);
        }

        let quality = self.scorer.score(&generation.answer);
        if self.config.quality_gate.admits(&quality) {
            self.answer_cache.set(
                key,
                CachedAnswer {
                    answer: generation.answer.clone(),
                    quality,
                    context_length,
                },
            );
            info!(
                completeness = quality.completeness,
                relevance = quality.relevance,
                "Answer cached"
            );
        } else {
            warn!(
                completeness = quality.completeness,
                relevance = quality.relevance,
                "Answer below quality gate, not cached"
            );
        }

        let execution_time = started.elapsed();
        let (avg_execution_time, cache_hit_rate) = {
            let mut metrics = self.metrics.lock();
            metrics.record_answer(execution_time, quality);
            (metrics.avg_execution_time(), metrics.cache_hit_rate())
        };
        info!(
            execution_ms = execution_time.as_millis() as u64,
            avg_execution_secs = avg_execution_time,
            cache_hit_rate,
            "Query answered"
        );

        Ok(QueryResult::direct(
            generation.answer,
            quality,
            execution_time,
            context_length,
        ))
    }

    async fn fetch_context(&self, question: &str) -> QueryOutcome<String> {
        let key = context_key(question);
        if let Some(ContextCacheValue::Context(context)) = self.context_cache.get(&key) {
            self.metrics.lock().record_fetch_cache_hit();
            debug!("Context cache hit");
            return Ok(context);
        }

        let passages = self.retriever.retrieve(question).await?;
        let contents: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        let context = self.assemble_context(question, &contents);
        self.context_cache
            .set(key, ContextCacheValue::Context(context.clone()));
        Ok(context)
    }

    async fn fetch_embedding(&self, question: &str) -> QueryOutcome<Arc<[f32]>> {
        let key = embedding_key(question);
        if let Some(ContextCacheValue::Embedding(vector)) = self.context_cache.get(&key) {
            self.metrics.lock().record_fetch_cache_hit();
            debug!("Embedding cache hit");
            return Ok(vector);
        }

        let vector: Arc<[f32]> = self.embedder.embed(question).await?.into();
        self.context_cache
            .set(key, ContextCacheValue::Embedding(Arc::clone(&vector)));
        Ok(vector)
    }

    /// Joins the distinct passages relevant to `question`, best first.
    ///
    /// Falls back to the best passage when none clears the threshold.
    fn assemble_context(&self, question: &str, passages: &[&str]) -> String {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = passages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty() && seen.insert(*p))
            .collect();

        let relevant: Vec<&str> = unique
            .iter()
            .copied()
            .filter(|p| self.relevance(p, question) >= self.config.relevance_threshold)
            .collect();

        let joined = if !relevant.is_empty() {
            relevant.join("\n\n")
        } else if let Some(best) = unique.first() {
            warn!(
                retrieved = passages.len(),
                "No passage cleared the relevance threshold, using the best one"
            );
            (*best).to_string()
        } else {
            String::new()
        };

        truncate_chars(&joined, self.config.max_context_chars).to_string()
    }

    fn relevance(&self, passage: &str, question: &str) -> f32 {
        let key = relevance_key(passage, question);
        if let Some(ContextCacheValue::Relevance(score)) = self.context_cache.get(&key) {
            return score;
        }
        let score = passage_relevance(passage, question, self.scorer.vocabulary());
        self.context_cache.set(key, ContextCacheValue::Relevance(score));
        score
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn validate(question: &str) -> QueryOutcome<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QueryError::EmptyQuestion);
    }
    Ok(question)
}

/// Longest prefix of `text` holding at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
