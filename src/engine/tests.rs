use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::backend::{Embedder, Generator, MockEmbedder, MockGenerator, MockRetriever, Retriever};
use crate::constants::{EMPTY_QUESTION_ANSWER, ERROR_ANSWER};
use crate::scoring::QualityMetrics;

const GOOD_ANSWER: &str = "1. 재료: 김치, 돼지고기\n\n2. 조리 방법: 김치를 볶기\n\n3. 팁: 간은 마지막에";
const WEAK_ANSWER: &str = "재료는 김치입니다";

struct Harness {
    engine: Arc<QueryEngine>,
    retriever: Arc<MockRetriever>,
    embedder: Arc<MockEmbedder>,
    generator: Arc<MockGenerator>,
}

fn unpaced() -> EngineConfig {
    EngineConfig::default().gate(4, f64::INFINITY)
}

fn harness_with(
    config: EngineConfig,
    retriever: MockRetriever,
    generator: MockGenerator,
) -> Harness {
    let retriever = Arc::new(retriever);
    let embedder = Arc::new(MockEmbedder::default());
    let generator = Arc::new(generator);
    let engine = QueryEngine::new(
        config,
        Arc::clone(&retriever) as Arc<dyn Retriever>,
        Arc::clone(&embedder) as Arc<dyn Embedder>,
        Arc::clone(&generator) as Arc<dyn Generator>,
    );
    Harness {
        engine: Arc::new(engine),
        retriever,
        embedder,
        generator,
    }
}

fn harness(config: EngineConfig, generator: MockGenerator) -> Harness {
    harness_with(
        config,
        MockRetriever::from_contents(&["김치찌개 레시피 재료", "완전히 무관한 문장"]),
        generator,
    )
}

#[tokio::test]
async fn test_second_identical_question_hits_answer_cache() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    let first = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(first.source, QuerySource::Direct);
    assert_eq!(first.answer, GOOD_ANSWER);
    assert_eq!(first.error, None);

    let second = h.engine.ask("  김치찌개   레시피 ").await;
    assert_eq!(second.source, QuerySource::Cache);
    assert_eq!(second.answer, GOOD_ANSWER);
    assert_eq!(second.quality, first.quality);
    assert_eq!(second.context_length, first.context_length);

    assert_eq!(h.retriever.calls(), 1);
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.generator.calls(), 1);

    let stats = h.engine.performance_stats();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_hit_rate, 0.5);
}

#[tokio::test]
async fn test_answer_below_quality_gate_is_not_cached() {
    let h = harness(unpaced(), MockGenerator::with_answer(WEAK_ANSWER));

    let first = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(first.source, QuerySource::Direct);
    assert!(first.quality.completeness < 0.5);

    let second = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(second.source, QuerySource::Direct);
    assert_eq!(h.generator.calls(), 2);
    assert!(h.engine.answer_cache().is_empty());

    // Context and embedding are still served from the fetch-stage cache.
    assert_eq!(h.retriever.calls(), 1);
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.engine.performance_stats().fetch_cache_hits, 2);
}

#[tokio::test]
async fn test_custom_quality_gate_controls_caching() {
    let strict = crate::scoring::QualityGate {
        min_completeness: 1.0,
        min_relevance: 1.0,
    };
    let h = harness(
        unpaced().quality_gate(strict),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    h.engine.ask("김치찌개 레시피").await;
    let again = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(again.source, QuerySource::Direct);
}

#[tokio::test]
async fn test_empty_question_skips_everything() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    for question in ["", "   ", "\n\t"] {
        let result = h.engine.ask(question).await;
        assert_eq!(result.source, QuerySource::Empty);
        assert_eq!(result.answer, EMPTY_QUESTION_ANSWER);
        assert_eq!(result.quality, QualityMetrics::ZERO);
    }

    assert_eq!(h.retriever.calls(), 0);
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.engine.gate().stats().admitted, 0);

    let stats = h.engine.performance_stats();
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.error_count, 0);
}

#[tokio::test]
async fn test_generator_failure_becomes_error_result() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));
    h.generator.fail_on("김치찌개 레시피");

    let result = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(result.source, QuerySource::Error);
    assert_eq!(result.answer, ERROR_ANSWER);
    assert_eq!(result.quality, QualityMetrics::ZERO);
    assert!(
        result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("mock generator refused"))
    );
    assert!(h.engine.answer_cache().is_empty());
    assert_eq!(h.engine.performance_stats().error_count, 1);
    assert_eq!(h.engine.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_retrieval_and_embedding_failures_become_error_results() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    h.retriever.set_fail(true);
    let result = h.engine.ask("김치찌개 레시피").await;
    assert!(result.is_error());
    assert!(result.error.as_deref().is_some_and(|e| e.contains("retrieval")));

    h.retriever.set_fail(false);
    h.embedder.set_fail(true);
    let result = h.engine.ask("된장찌개 레시피").await;
    assert!(result.is_error());
    assert!(result.error.as_deref().is_some_and(|e| e.contains("embedding")));

    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.engine.performance_stats().error_count, 2);
}

#[tokio::test]
async fn test_empty_generated_answer_is_an_error() {
    let h = harness(unpaced(), MockGenerator::with_answer("   "));

    let result = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(result.source, QuerySource::Error);
    assert!(result.error.as_deref().is_some_and(|e| e.contains("empty answer")));
    assert!(h.engine.answer_cache().is_empty());
}

#[tokio::test]
async fn test_context_drops_irrelevant_and_duplicate_passages() {
    let h = harness_with(
        unpaced(),
        MockRetriever::from_contents(&[
            "김치찌개 레시피 재료",
            "  김치찌개 레시피 재료  ",
            "완전히 무관한 문장",
            "김치찌개 레시피 순서",
        ]),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    let result = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(
        h.generator.last_context().as_deref(),
        Some("김치찌개 레시피 재료\n\n김치찌개 레시피 순서")
    );
    assert_eq!(
        result.context_length,
        "김치찌개 레시피 재료\n\n김치찌개 레시피 순서".chars().count()
    );
}

#[tokio::test]
async fn test_context_falls_back_to_best_passage() {
    let h = harness_with(
        unpaced(),
        MockRetriever::from_contents(&["무관한 문장 하나", "무관한 문장 둘"]),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    h.engine.ask("김치찌개").await;
    assert_eq!(h.generator.last_context().as_deref(), Some("무관한 문장 하나"));
}

#[tokio::test]
async fn test_context_is_empty_without_passages() {
    let h = harness_with(
        unpaced(),
        MockRetriever::default(),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    let result = h.engine.ask("김치찌개").await;
    assert_eq!(result.source, QuerySource::Direct);
    assert_eq!(result.context_length, 0);
    assert_eq!(h.generator.last_context().as_deref(), Some(""));
}

#[tokio::test]
async fn test_context_truncated_on_char_boundary() {
    let h = harness(
        unpaced().max_context_chars(5),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    let result = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(h.generator.last_context().as_deref(), Some("김치찌개 "));
    assert_eq!(result.context_length, 5);
}

#[tokio::test(start_paused = true)]
async fn test_cached_answer_expires_after_ttl() {
    let h = harness(
        unpaced().cache(100, Duration::from_secs(60)),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    h.engine.ask("김치찌개 레시피").await;
    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(h.engine.ask("김치찌개 레시피").await.source, QuerySource::Cache);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(h.engine.ask("김치찌개 레시피").await.source, QuerySource::Direct);
    assert_eq!(h.retriever.calls(), 2);
}

#[tokio::test]
async fn test_clear_caches_forces_full_pipeline() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    h.engine.ask("김치찌개 레시피").await;
    h.engine.clear_caches();
    assert_eq!(h.engine.cache_stats().answer.valid_entries, 0);
    assert_eq!(h.engine.cache_stats().context.valid_entries, 0);

    assert_eq!(h.engine.ask("김치찌개 레시피").await.source, QuerySource::Direct);
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_batch_respects_gate_width() {
    let h = harness(
        unpaced().gate(2, f64::INFINITY),
        MockGenerator::with_answer(GOOD_ANSWER).with_delay(Duration::from_millis(50)),
    );

    let questions: Vec<String> = (0..6).map(|i| format!("질문 {i}")).collect();
    let results = h.engine.ask_batch(questions).await;

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.source == QuerySource::Direct));
    assert_eq!(h.generator.peak_concurrency(), 2);
    assert_eq!(h.engine.gate().stats().admitted, 6);
}

#[tokio::test(start_paused = true)]
async fn test_batch_is_paced() {
    let h = harness(
        EngineConfig::default().gate(10, 5.0),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    let begin = Instant::now();
    let results = h
        .engine
        .ask_batch(["질문 1", "질문 2", "질문 3", "질문 4"])
        .await;
    let elapsed = begin.elapsed();

    assert_eq!(results.len(), 4);
    assert!(elapsed >= Duration::from_millis(600), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let generator = MockGenerator::with_responder(|question, _| {
        Ok(format!("{GOOD_ANSWER}\n\n- 질문: {question}"))
    });
    generator.fail_on("실패 질문");
    let h = harness(unpaced(), generator);

    let results = h
        .engine
        .ask_batch(["김치찌개 레시피", "", "실패 질문", "된장찌개 레시피"])
        .await;

    let sources: Vec<QuerySource> = results.iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![
            QuerySource::Direct,
            QuerySource::Empty,
            QuerySource::Error,
            QuerySource::Direct
        ]
    );
    assert!(results[0].answer.ends_with("김치찌개 레시피"));
    assert!(results[3].answer.ends_with("된장찌개 레시피"));
}

#[tokio::test]
async fn test_batch_survives_panicking_item() {
    let generator = MockGenerator::with_responder(|question, _| {
        if question == "폭발" {
            panic!("responder exploded");
        }
        Ok(GOOD_ANSWER.to_string())
    });
    let h = harness(unpaced().gate(1, f64::INFINITY), generator);

    let results = BatchRunner::new(Arc::clone(&h.engine))
        .run(vec![
            "김치찌개 레시피".to_string(),
            "폭발".to_string(),
            "된장찌개 레시피".to_string(),
        ])
        .await;

    assert_eq!(results[0].source, QuerySource::Direct);
    assert_eq!(results[1].source, QuerySource::Error);
    assert!(results[1].error.as_deref().is_some_and(|e| e.contains("batch item 1")));
    assert_eq!(results[2].source, QuerySource::Direct);
    assert_eq!(h.engine.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_panicking_generator_becomes_error_result() {
    let generator = MockGenerator::with_responder(|question, _| {
        if question == "폭발" {
            panic!("responder exploded");
        }
        Ok(GOOD_ANSWER.to_string())
    });
    let h = harness(unpaced().gate(1, f64::INFINITY), generator);

    let result = tokio::spawn({
        let engine = Arc::clone(&h.engine);
        async move { engine.ask("폭발").await }
    })
    .await
    .expect("ask must not panic");

    assert_eq!(result.source, QuerySource::Error);
    assert_eq!(result.answer, ERROR_ANSWER);
    assert!(result.error.as_deref().is_some_and(|e| e.contains("responder exploded")));
    assert_eq!(h.engine.performance_stats().error_count, 1);
    assert_eq!(h.engine.gate().in_flight(), 0);

    assert_eq!(h.engine.ask("김치찌개 레시피").await.source, QuerySource::Direct);
}

#[tokio::test]
async fn test_closed_gate_yields_error_results() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));
    h.engine.gate().close();

    let result = h.engine.ask("김치찌개 레시피").await;
    assert_eq!(result.source, QuerySource::Error);
    assert_eq!(h.generator.calls(), 0);
}

#[test]
fn test_ask_blocking_runs_the_same_pipeline() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    assert_eq!(h.engine.ask_blocking("김치찌개 레시피").source, QuerySource::Direct);
    assert_eq!(h.engine.ask_blocking("김치찌개 레시피").source, QuerySource::Cache);
    assert_eq!(h.engine.ask_blocking(" ").source, QuerySource::Empty);
}

#[test]
fn test_ask_blocking_gates_cache_writes() {
    let h = harness(unpaced(), MockGenerator::with_answer(WEAK_ANSWER));

    h.engine.ask_blocking("김치찌개 레시피");
    assert_eq!(h.engine.ask_blocking("김치찌개 레시피").source, QuerySource::Direct);
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn test_ask_blocking_inside_runtime_reports_error() {
    let h = harness(unpaced(), MockGenerator::with_answer(GOOD_ANSWER));

    let result = h.engine.ask_blocking("김치찌개 레시피");
    assert_eq!(result.source, QuerySource::Error);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_covers_both_caches() {
    let h = harness(
        unpaced().cache(100, Duration::from_secs(10)),
        MockGenerator::with_answer(GOOD_ANSWER),
    );

    h.engine.ask("김치찌개 레시피").await;
    let before = h.engine.cache_stats();
    assert_eq!(before.answer.total_entries, 1);
    assert!(before.context.total_entries >= 2);

    tokio::time::advance(Duration::from_secs(11)).await;
    let removed = h.engine.sweeper().sweep_once();
    assert_eq!(removed, before.answer.total_entries + before.context.total_entries);
    assert_eq!(h.engine.cache_stats().context.total_entries, 0);
}

#[test]
fn test_query_source_labels() {
    assert_eq!(QuerySource::Cache.to_string(), "cache");
    assert_eq!(QuerySource::Direct.as_str(), "direct");
    assert_eq!(
        serde_json::to_string(&QuerySource::Empty).expect("serialize"),
        "\"empty\""
    );
}
