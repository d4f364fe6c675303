//! Local answer renderer used when no chat provider is configured.
//!
//! Lays the retrieved context out in the same three-part shape the chat model is
//! prompted for, so answers score and cache like real ones.

use async_trait::async_trait;

use super::error::BackendResult;
use super::types::Generation;
use super::Generator;

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn render(question: &str, context: &str) -> String {
        let question = question.trim();
        let mut lines = context
            .split("\n\n")
            .map(str::trim)
            .filter(|part| !part.is_empty());

        let ingredients = lines.next().unwrap_or("관련 레시피를 찾지 못했습니다");
        let details: Vec<&str> = lines.collect();

        let mut answer = format!("1. 기본 정보\n- 질문: {question}\n- 필수 재료: {ingredients}\n\n");
        answer.push_str("2. 조리 방법\n");
        if details.is_empty() {
            answer.push_str("- 재료를 손질한 뒤 순서대로 조리하세요.\n");
        } else {
            for detail in details {
                answer.push_str("- ");
                answer.push_str(detail);
                answer.push('\n');
            }
        }
        answer.push_str("\n3. 전문가 팁\n- 간은 마지막에 맞추는 것이 중요합니다.");
        answer
    }
}

#[async_trait]
impl Generator for TemplateGenerator {
    async fn generate(&self, question: &str, context: &str) -> BackendResult<Generation> {
        Ok(Generation::new(Self::render(question, context)))
    }
}
