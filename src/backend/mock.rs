//! Instrumented in-memory collaborators for tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{BackendError, BackendResult};
use super::types::{Generation, Passage};
use super::{Embedder, Generator, Retriever};

/// Returns a fixed passage list and counts calls.
#[derive(Debug, Default)]
pub struct MockRetriever {
    passages: Vec<Passage>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockRetriever {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            ..Default::default()
        }
    }

    pub fn from_contents(contents: &[&str]) -> Self {
        Self::new(contents.iter().map(|c| Passage::new(*c)).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, _question: &str) -> BackendResult<Vec<Passage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Retrieval("mock retriever failure".to_string()));
        }
        Ok(self.passages.clone())
    }
}

/// Returns a constant vector and counts calls.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> BackendResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Embedding("mock embedder failure".to_string()));
        }
        Ok(vec![0.5; self.dim])
    }
}

type Responder = Arc<dyn Fn(&str, &str) -> BackendResult<String> + Send + Sync>;

/// Scriptable generator that tracks call count and peak concurrency.
pub struct MockGenerator {
    responder: Responder,
    delay: Duration,
    failing_questions: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    last_context: Mutex<Option<String>>,
}

impl MockGenerator {
    /// Always answers with `answer`.
    pub fn with_answer(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self::with_responder(move |_, _| Ok(answer.clone()))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> BackendResult<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: Duration::ZERO,
            failing_questions: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            last_context: Mutex::new(None),
        }
    }

    /// Sleeps this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes calls for exactly this question fail.
    pub fn fail_on(&self, question: &str) {
        self.failing_questions.lock().insert(question.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Context passed to the most recent call.
    pub fn last_context(&self) -> Option<String> {
        self.last_context.lock().clone()
    }
}

impl std::fmt::Debug for MockGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGenerator")
            .field("delay", &self.delay)
            .field("calls", &self.calls())
            .finish()
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, question: &str, context: &str) -> BackendResult<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);
        *self.last_context.lock() = Some(context.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing_questions.lock().contains(question) {
            return Err(BackendError::Generation(format!(
                "mock generator refused: {question}"
            )));
        }

        (self.responder)(question, context).map(Generation::new)
    }
}
