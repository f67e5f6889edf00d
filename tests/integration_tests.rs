//! End-to-end tests of the matching and classification pipelines with mock models

use async_trait::async_trait;
use cv_matcher::llm::analyst::{AnalystOpinion, CareerAnalyst};
use cv_matcher::processing::classifier::CategoryModel;
use cv_matcher::processing::embeddings::EmbeddingProvider;
use cv_matcher::processing::semantic::{EmbeddingPair, Reranker};
use cv_matcher::processing::text_processor::TextProcessor;
use cv_matcher::{
    AnalysisEngine, Candidate, ClassifyOptions, Config, DecisionMethod, DecisionReason,
    MatchMethod, MatchOptions, MatcherError, Result, RuleTable,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DIM: usize = 512;

/// Deterministic bag-of-words embedding: each lowercase token bumps one hashed slot
struct HashingEmbedder;

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

impl HashingEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[(fnv1a(token) % DIM as u64) as usize] += 1.0;
        }
        v
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing-mock"
    }
}

struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(MatcherError::DependencyUnavailable("model offline".to_string()))
    }

    fn name(&self) -> &str {
        "failing-mock"
    }
}

struct SlowEmbedder;

impl EmbeddingProvider for SlowEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(Duration::from_millis(500));
        HashingEmbedder.embed(texts)
    }

    fn name(&self) -> &str {
        "slow-mock"
    }
}

/// NaN embedding for any text containing "corrupt"
struct CorruptingEmbedder;

impl EmbeddingProvider for CorruptingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("corrupt") {
                    vec![f32::NAN; DIM]
                } else {
                    HashingEmbedder::vector(t)
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "corrupting-mock"
    }
}

/// Probability = dot / (1 + dot); NaN for jobs with exactly `poison_job_len` tokens
struct DotReranker {
    poison_job_len: Option<usize>,
    fail: bool,
}

impl Reranker for DotReranker {
    fn score_pairs(&self, pairs: &[EmbeddingPair]) -> Result<Vec<f32>> {
        if self.fail {
            return Err(MatcherError::DependencyUnavailable("re-ranker offline".to_string()));
        }
        Ok(pairs
            .iter()
            .map(|(cv, job)| {
                let job_tokens: f32 = job.iter().sum();
                if Some(job_tokens as usize) == self.poison_job_len {
                    return f32::NAN;
                }
                let dot: f32 = cv.iter().zip(job).map(|(a, b)| a * b).sum();
                dot / (1.0 + dot)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "dot-mock"
    }
}

/// Fixed distribution regardless of input
struct StubModel {
    labels: Vec<String>,
    probabilities: Vec<f32>,
}

impl StubModel {
    fn new(entries: &[(&str, f32)]) -> Self {
        Self {
            labels: entries.iter().map(|(l, _)| l.to_string()).collect(),
            probabilities: entries.iter().map(|(_, p)| *p).collect(),
        }
    }
}

impl CategoryModel for StubModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, _embedding: &[f32]) -> Result<Vec<f32>> {
        Ok(self.probabilities.clone())
    }

    fn method(&self) -> DecisionMethod {
        DecisionMethod::MlModel
    }

    fn name(&self) -> &str {
        "stub-model"
    }
}

struct StubAnalyst {
    label: String,
    confidence: f32,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubAnalyst {
    fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CareerAnalyst for StubAnalyst {
    fn name(&self) -> &str {
        "stub-analyst"
    }

    fn available(&self) -> bool {
        true
    }

    async fn analyze(&self, _text: &str, labels: &[String]) -> Result<AnalystOpinion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!labels.is_empty());
        tokio::time::sleep(self.delay).await;
        Ok(AnalystOpinion {
            label: self.label.clone(),
            confidence: self.confidence,
            reasoning: "mentions patient care".to_string(),
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.classification.semantic_prototypes = false;
    config
}

fn bundled_rules() -> RuleTable {
    let processor = TextProcessor::new().unwrap();
    RuleTable::bundled(&processor).unwrap()
}

fn engine_with(provider: Arc<dyn EmbeddingProvider>) -> AnalysisEngine {
    AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(provider)
        .build()
        .unwrap()
}

fn scenario_jobs() -> Vec<Candidate> {
    vec![
        Candidate::new("python", "Python backend developer needed"),
        Candidate::new("designer", "Graphic designer with Photoshop skills"),
        Candidate::new("chef", "Chef position, culinary arts"),
    ]
}

const SCENARIO_CV: &str = "5 years Python Django REST API PostgreSQL Docker AWS";

fn top(k: usize) -> MatchOptions {
    MatchOptions {
        top_k: Some(k),
        use_hybrid: None,
    }
}

#[tokio::test]
async fn test_python_cv_ranks_python_job_first() {
    let engine = engine_with(Arc::new(HashingEmbedder));
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), top(2))
        .await
        .unwrap();

    assert_eq!(report.method, MatchMethod::Hybrid);
    assert!(!report.degraded);
    assert_eq!(report.matches.len(), 2);
    assert_eq!(report.matches[0].source_id, "python");
    assert_eq!(report.matches[0].rank, 1);
    assert!(report.matches[0].similarity_score > report.matches[1].similarity_score + 20.0);
    assert_eq!(report.matches[0].matched_skills, vec!["python".to_string()]);
    assert!(report
        .matches
        .iter()
        .all(|m| (0.0..=100.0).contains(&m.similarity_score)));
}

#[tokio::test]
async fn test_scores_are_non_increasing() {
    let engine = engine_with(Arc::new(HashingEmbedder));
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), top(10))
        .await
        .unwrap();

    assert_eq!(report.matches.len(), 3);
    for pair in report.matches.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
        assert_eq!(pair[0].rank + 1, pair[1].rank);
    }
}

#[tokio::test]
async fn test_missing_skills_reported() {
    let engine = engine_with(Arc::new(HashingEmbedder));
    let jobs = vec![Candidate::new("platform", "Python engineer, Kubernetes and Docker on AWS")];
    let report = engine.match_jobs("Python and Docker", &jobs, top(1)).await.unwrap();

    let m = &report.matches[0];
    assert!(m.matched_skills.contains(&"python".to_string()));
    assert!(m.matched_skills.contains(&"docker".to_string()));
    assert!(m.missing_skills.contains(&"kubernetes".to_string()));
    assert!(m.missing_skills.contains(&"aws".to_string()));
}

#[tokio::test]
async fn test_failing_embedder_degrades_to_keywords() {
    let engine = engine_with(Arc::new(FailingEmbedder));
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), top(3))
        .await
        .unwrap();

    assert!(report.degraded);
    assert_eq!(report.method, MatchMethod::Keyword);
    assert_eq!(report.matches[0].source_id, "python");
    assert_eq!(report.matches[0].similarity_score, 100.0);
    assert_eq!(report.matches[1].similarity_score, 0.0);
    assert!(report.matches.iter().all(|m| m.method == MatchMethod::Keyword));
}

#[tokio::test]
async fn test_no_embedder_degrades_to_keywords() {
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .build()
        .unwrap();
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), top(1))
        .await
        .unwrap();
    assert!(report.degraded);
    assert_eq!(report.matches[0].source_id, "python");
}

#[tokio::test]
async fn test_embedding_timeout_degrades() {
    let mut config = test_config();
    config.processing.inference_timeout_ms = 50;
    let engine = AnalysisEngine::builder(config, bundled_rules())
        .embedding_provider(Arc::new(SlowEmbedder))
        .build()
        .unwrap();

    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), top(3))
        .await
        .unwrap();
    assert!(report.degraded);
    assert_eq!(report.method, MatchMethod::Keyword);
}

#[tokio::test]
async fn test_corrupt_candidate_is_skipped() {
    let engine = engine_with(Arc::new(CorruptingEmbedder));
    let mut jobs = scenario_jobs();
    jobs.push(Candidate::new("broken", "corrupt python listing"));

    let report = engine.match_jobs(SCENARIO_CV, &jobs, top(10)).await.unwrap();
    assert!(!report.degraded);
    assert_eq!(report.skipped, vec!["broken".to_string()]);
    assert_eq!(report.matches.len(), 3);
    assert!(report.matches.iter().all(|m| m.source_id != "broken"));
}

#[tokio::test]
async fn test_all_candidates_corrupt_degrades() {
    let engine = engine_with(Arc::new(CorruptingEmbedder));
    let jobs = vec![
        Candidate::new("a", "corrupt python job"),
        Candidate::new("b", "corrupt chef job"),
    ];
    let report = engine.match_jobs(SCENARIO_CV, &jobs, top(2)).await.unwrap();
    assert!(report.degraded);
    assert!(report.skipped.is_empty());
    assert_eq!(report.matches[0].source_id, "a");
}

#[tokio::test]
async fn test_semantic_only_without_reranker() {
    let engine = engine_with(Arc::new(HashingEmbedder));
    let options = MatchOptions {
        top_k: Some(3),
        use_hybrid: Some(false),
    };
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), options)
        .await
        .unwrap();

    assert_eq!(report.method, MatchMethod::Semantic);
    assert_eq!(report.matches[0].source_id, "python");
    // no shared tokens: cosine 0 maps to the middle of the scale
    assert!((report.matches[2].similarity_score - 50.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_reranker_mode() {
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .reranker(Arc::new(DotReranker {
            poison_job_len: None,
            fail: false,
        }))
        .build()
        .unwrap();
    let options = MatchOptions {
        top_k: Some(3),
        use_hybrid: Some(false),
    };
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), options)
        .await
        .unwrap();

    assert_eq!(report.method, MatchMethod::Reranker);
    assert_eq!(report.matches[0].source_id, "python");
    assert!((report.matches[0].similarity_score - 50.0).abs() < 1e-3);
    assert_eq!(report.matches[2].similarity_score, 0.0);
}

#[tokio::test]
async fn test_reranker_non_finite_output_skips_candidate() {
    // only the designer job has five tokens
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .reranker(Arc::new(DotReranker {
            poison_job_len: Some(5),
            fail: false,
        }))
        .build()
        .unwrap();
    let options = MatchOptions {
        top_k: Some(3),
        use_hybrid: Some(false),
    };
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), options)
        .await
        .unwrap();

    assert_eq!(report.skipped, vec!["designer".to_string()]);
    assert_eq!(report.matches.len(), 2);
}

#[tokio::test]
async fn test_reranker_failure_degrades() {
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .reranker(Arc::new(DotReranker {
            poison_job_len: None,
            fail: true,
        }))
        .build()
        .unwrap();
    let options = MatchOptions {
        top_k: Some(3),
        use_hybrid: Some(false),
    };
    let report = engine
        .match_jobs(SCENARIO_CV, &scenario_jobs(), options)
        .await
        .unwrap();
    assert!(report.degraded);
    assert_eq!(report.method, MatchMethod::Keyword);
}

#[tokio::test]
async fn test_match_cvs_agrees_with_match_jobs() {
    let engine = engine_with(Arc::new(HashingEmbedder));
    let job = "Python backend developer with Docker";
    let cvs = vec![
        Candidate::new("chef-cv", "Head chef, pastry and menu planning"),
        Candidate::new("python-cv", SCENARIO_CV),
    ];

    let report = engine.match_cvs(job, &cvs, top(2)).await.unwrap();
    assert_eq!(report.matches[0].source_id, "python-cv");
    assert_eq!(report.matches[0].candidate_index, 1);

    let forward = engine
        .match_jobs(SCENARIO_CV, &[Candidate::new("job", job)], top(1))
        .await
        .unwrap();
    let delta = forward.matches[0].similarity_score - report.matches[0].similarity_score;
    assert!(delta.abs() < 1e-4);
    assert_eq!(forward.matches[0].missing_skills, report.matches[0].missing_skills);
}

#[tokio::test]
async fn test_invalid_match_requests() {
    let engine = engine_with(Arc::new(HashingEmbedder));

    let err = engine.match_jobs("", &scenario_jobs(), top(2)).await.unwrap_err();
    assert!(err.is_input_error());

    let err = engine.match_jobs(SCENARIO_CV, &[], top(2)).await.unwrap_err();
    assert!(err.is_input_error());

    let jobs = vec![Candidate::new("ok", "Python"), Candidate::new("empty", "   ")];
    let err = engine.match_jobs(SCENARIO_CV, &jobs, top(2)).await.unwrap_err();
    assert!(matches!(&err, MatcherError::InvalidInput(msg) if msg == "job 'empty' has empty text"));

    let cvs = vec![Candidate::new("blank-cv", "")];
    let err = engine.match_cvs(SCENARIO_CV, &cvs, top(2)).await.unwrap_err();
    assert!(matches!(&err, MatcherError::InvalidInput(msg) if msg.contains("CV 'blank-cv'")));

    let err = engine.match_cvs("\n\t", &scenario_jobs(), top(2)).await.unwrap_err();
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_low_model_confidence_falls_back_to_keywords() {
    let confident = AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .category_model(Arc::new(StubModel::new(&[("Data Analyst", 0.3), ("Chef", 0.7)])))
        .build()
        .unwrap();
    let low = AnalysisEngine::builder(test_config(), bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .category_model(Arc::new(StubModel::new(&[
            ("Data Analyst", 0.3),
            ("Chef", 0.25),
            ("Sales", 0.25),
            ("Nurse", 0.2),
        ])))
        .build()
        .unwrap();

    let text = "Software developer and software engineer, git and algorithms";
    let result = low.classify(text, ClassifyOptions::default()).await.unwrap();
    assert_eq!(result.predicted_label, "Software Developer");
    assert_eq!(result.decision_method, DecisionMethod::Keyword);
    assert_eq!(result.decision_reason, DecisionReason::LowModelConfidence);

    let result = confident.classify(text, ClassifyOptions::default()).await.unwrap();
    assert_eq!(result.predicted_label, "Software Developer");
    assert_eq!(result.decision_reason, DecisionReason::KeywordMargin);
}

#[tokio::test]
async fn test_classification_precedence_with_model() {
    let chef_text = "Head chef with ten years of kitchen management";
    let build = |entries: &[(&str, f32)]| {
        AnalysisEngine::builder(test_config(), bundled_rules())
            .embedding_provider(Arc::new(HashingEmbedder))
            .category_model(Arc::new(StubModel::new(entries)))
            .build()
            .unwrap()
    };

    // keyword 0.95 is not more than 0.1 above 0.9
    let result = build(&[("Sales", 0.9), ("Chef", 0.1)])
        .classify(chef_text, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Sales");
    assert_eq!(result.decision_method, DecisionMethod::MlModel);
    assert_eq!(result.decision_reason, DecisionReason::ModelPreferred);

    let result = build(&[("Sales", 0.6), ("Chef", 0.4)])
        .classify(chef_text, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Chef");
    assert_eq!(result.decision_method, DecisionMethod::Keyword);
    assert_eq!(result.decision_reason, DecisionReason::KeywordMargin);

    let result = build(&[("Chef", 0.8), ("Sales", 0.2)])
        .classify(chef_text, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Chef");
    assert_eq!(result.decision_method, DecisionMethod::Hybrid);
    assert_eq!(result.decision_reason, DecisionReason::Agreement);
    assert!((result.confidence - 0.95).abs() < 1e-6);

    let result = build(&[("Other", 0.99), ("Chef", 0.01)])
        .classify(chef_text, ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Chef");
    assert_eq!(result.decision_reason, DecisionReason::SentinelLabel);
}

#[tokio::test]
async fn test_fallback_default_and_analyst() {
    let text = "lorem ipsum dolor sit amet";

    let plain = AnalysisEngine::builder(test_config(), bundled_rules())
        .build()
        .unwrap();
    let result = plain.classify(text, ClassifyOptions::default()).await.unwrap();
    assert_eq!(result.predicted_label, "Unclassified");
    assert_eq!(result.decision_method, DecisionMethod::FallbackDefault);
    assert_eq!(result.decision_reason, DecisionReason::NoUsableSignal);
    assert!((result.confidence - 0.3).abs() < 1e-6);

    let analyst = Arc::new(StubAnalyst::new("Nurse", 0.8));
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .analyst(analyst.clone())
        .build()
        .unwrap();

    let result = engine.classify(text, ClassifyOptions::default()).await.unwrap();
    assert_eq!(result.predicted_label, "Nurse");
    assert_eq!(result.decision_method, DecisionMethod::LlmAnalysis);
    assert_eq!(result.analyst_reasoning.as_deref(), Some("mentions patient care"));
    assert_eq!(analyst.calls.load(Ordering::SeqCst), 1);

    let result = engine
        .classify(text, ClassifyOptions { use_analyst: false })
        .await
        .unwrap();
    assert_eq!(result.decision_method, DecisionMethod::FallbackDefault);
    assert_eq!(analyst.calls.load(Ordering::SeqCst), 1);

    // a usable keyword verdict never reaches the analyst
    let result = engine
        .classify("Registered nurse, patient care", ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.decision_method, DecisionMethod::Keyword);
    assert_eq!(analyst.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unqualified_analyst_opinions_are_ignored() {
    let text = "lorem ipsum dolor sit amet";

    for analyst in [
        StubAnalyst::new("Astronaut", 0.9),
        StubAnalyst::new("Nurse", 0.4),
    ] {
        let engine = AnalysisEngine::builder(test_config(), bundled_rules())
            .analyst(Arc::new(analyst))
            .build()
            .unwrap();
        let result = engine.classify(text, ClassifyOptions::default()).await.unwrap();
        assert_eq!(result.decision_method, DecisionMethod::FallbackDefault);
    }

    let mut config = test_config();
    config.analyst.timeout_ms = 20;
    let mut slow = StubAnalyst::new("Nurse", 0.9);
    slow.delay = Duration::from_millis(500);
    let engine = AnalysisEngine::builder(config, bundled_rules())
        .analyst(Arc::new(slow))
        .build()
        .unwrap();
    let result = engine.classify(text, ClassifyOptions::default()).await.unwrap();
    assert_eq!(result.decision_method, DecisionMethod::FallbackDefault);
}

#[tokio::test]
async fn test_negative_terms_block_graphic_designer() {
    let engine = AnalysisEngine::builder(test_config(), bundled_rules())
        .build()
        .unwrap();
    let result = engine
        .classify(
            "Graphic design hobbyist working as a backend developer",
            ClassifyOptions::default(),
        )
        .await
        .unwrap();
    assert_ne!(result.predicted_label, "Graphic Designer");
    assert!(result
        .top_k_alternatives
        .iter()
        .all(|a| a.label != "Graphic Designer"));
}

#[tokio::test]
async fn test_semantic_prototypes_built_from_rules() {
    let mut config = test_config();
    config.classification.semantic_prototypes = true;
    let engine = AnalysisEngine::builder(config, bundled_rules())
        .embedding_provider(Arc::new(HashingEmbedder))
        .build()
        .unwrap();

    let status = engine.status();
    assert_eq!(status.category_method, Some(DecisionMethod::Semantic));
    assert_eq!(status.embedding_model.as_deref(), Some("hashing-mock"));

    let result = engine
        .classify("Head chef with ten years of kitchen management", ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Chef");
}

#[tokio::test]
async fn test_custom_rule_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    std::fs::write(
        &path,
        r#"
version = "test-1"

[scoring]
primary_weight = 25.0
secondary_weight = 5.0
negative_penalty = 15.0

[[confidence_tiers]]
min_score = 20.0
confidence = 0.9

[[confidence_tiers]]
min_score = 0.0
confidence = 0.6

[[rules]]
label = "Beekeeper"
weight = 1.0
primary = ["beekeeper", "apiarist"]
secondary = ["honey"]
"#,
    )
    .unwrap();

    let processor = TextProcessor::new().unwrap();
    let rules = RuleTable::load(&path, &processor).unwrap();
    let engine = AnalysisEngine::builder(test_config(), rules).build().unwrap();
    assert_eq!(engine.status().rules_version, "test-1");
    assert_eq!(engine.status().rule_count, 1);

    let result = engine
        .classify("Apiarist selling HONEY", ClassifyOptions::default())
        .await
        .unwrap();
    assert_eq!(result.predicted_label, "Beekeeper");
    assert!(result.matched_terms.contains(&"apiarist".to_string()));
    assert!(result.matched_terms.contains(&"honey".to_string()));
    assert!((result.confidence - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn test_invalid_rule_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    std::fs::write(&path, "version = \"x\"\nrules = []\n").unwrap();

    let mut config = test_config();
    config.classification.rules_path = Some(path);
    assert!(matches!(
        AnalysisEngine::from_config(&config),
        Err(MatcherError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_engine_is_shareable_across_tasks() {
    let engine = Arc::new(engine_with(Arc::new(HashingEmbedder)));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .match_jobs(SCENARIO_CV, &scenario_jobs(), top(1))
                    .await
                    .map(|r| r.matches[0].source_id.clone())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "python");
    }
}
