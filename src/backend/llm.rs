//! Chat-model generator backed by `genai`.
//!
//! Each attempt is bounded by [`RetryPolicy::timeout`]; failed or timed-out attempts
//! are retried up to [`RetryPolicy::retries`] more times with a fixed backoff. The
//! engine only sees the final outcome.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::{debug, warn};

use super::error::{BackendError, BackendResult};
use super::types::Generation;
use super::Generator;
use crate::constants::{DEFAULT_GENERATION_RETRIES, DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_MODEL};

const SYSTEM_PROMPT: &str = "당신은 한식 전문 요리사입니다. 다음 형식에 맞춰 상세하게 답변해주세요.

1. 기본 정보
   - 필수 재료
   - 조리 시간
   - 난이도

2. 상세 내용
   - 구체적인 수치와 시간
   - 단계별 명확한 설명
   - 중요 포인트 강조

3. 전문가 팁
   - 실수하기 쉬운 부분 주의사항
   - 맛있게 만드는 비법
   - 활용 아이디어

위 형식을 반드시 지켜 답변해주세요.";

/// Per-attempt timeout and retry budget for a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first.
    pub retries: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            retries: DEFAULT_GENERATION_RETRIES,
            backoff: Duration::from_millis(750),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> usize {
        self.retries + 1
    }
}

/// Runs `op` until it succeeds or the policy is exhausted.
pub(crate) async fn call_with_retries<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> BackendResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut attempt = 0usize;
    loop {
        attempt += 1;

        let err = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(reason)) => BackendError::RetriesExhausted {
                attempts: attempt,
                last_error: reason,
            },
            Err(_) => BackendError::Timeout {
                after: policy.timeout,
            },
        };

        if attempt >= policy.attempts() {
            return Err(err);
        }

        warn!(label, attempt, error = %err, "Backend call failed, retrying");
        tokio::time::sleep(policy.backoff).await;
    }
}

pub struct LlmGenerator {
    client: Client,
    model: String,
    policy: RetryPolicy,
}

impl LlmGenerator {
    pub fn new(model: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            policy,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn build_request(question: &str, context: &str) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("질문: {question}\n\n컨텍스트: {context}")),
        ])
    }
}

impl Default for LlmGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, RetryPolicy::default())
    }
}

impl std::fmt::Debug for LlmGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGenerator")
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, question: &str, context: &str) -> BackendResult<Generation> {
        let request = Self::build_request(question, context);
        debug!(model = %self.model, context_len = context.len(), "Calling chat model");

        let answer = call_with_retries(&self.policy, "chat", || {
            let request = request.clone();
            async move {
                self.client
                    .exec_chat(&self.model, request, None)
                    .await
                    .map(|resp| resp.first_text().unwrap_or_default().to_string())
                    .map_err(|e| e.to_string())
            }
        })
        .await?;

        Ok(Generation::new(answer))
    }
}
