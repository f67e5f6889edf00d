//! Analysis engine: the shared context that runs matching and classification

use crate::config::Config;
use crate::error::{MatcherError, Result};
use crate::llm::analyst::{resolve_label, CareerAnalyst, ChatCompletionAnalyst};
use crate::processing::classifier::{
    predict_with_timeout, CandleCategoryModel, CategoryModel, ModelVerdict, PrototypeCategoryModel,
};
use crate::processing::combiner::{
    combine, ArbitrationPolicy, ClassificationResult, DecisionMethod, MatchMethod, MatchWeights,
};
use crate::processing::document::{Candidate, Document, DocumentRole};
use crate::processing::embeddings::{
    check_embedding, embed_with_timeout, EmbeddingProvider, Model2VecProvider,
};
use crate::processing::keyword_rules::RuleTable;
use crate::processing::keyword_scorer::KeywordScorer;
use crate::processing::network::select_device;
use crate::processing::ranker::rank;
use crate::processing::semantic::{
    rerank_with_timeout, rescale_probability, similarity, CandleReranker, Reranker,
};
use crate::processing::skill_matcher::{SkillMatcher, SkillOverlap};
use crate::processing::text_processor::TextProcessor;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One ranked candidate; `similarity_score` is on the 0..100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_index: usize,
    pub source_id: String,
    pub similarity_score: f32,
    pub rank: usize,
    pub method: MatchMethod,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matches: Vec<MatchResult>,
    pub method: MatchMethod,
    /// The semantic path was requested but unusable
    pub degraded: bool,
    /// Candidates left out because their inference failed
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub top_k: Option<usize>,
    pub use_hybrid: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    pub use_analyst: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self { use_analyst: true }
    }
}

/// Which collaborators are live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub embedding_model: Option<String>,
    pub reranker: Option<String>,
    pub category_model: Option<String>,
    pub category_method: Option<DecisionMethod>,
    pub analyst: Option<String>,
    pub rules_version: String,
    pub rule_count: usize,
    pub skill_lexicon_size: usize,
}

/// Immutable after construction and safe to share across concurrent requests.
pub struct AnalysisEngine {
    config: Config,
    processor: TextProcessor,
    rules: Arc<RuleTable>,
    keyword_scorer: KeywordScorer,
    skill_matcher: SkillMatcher,
    policy: ArbitrationPolicy,
    weights: MatchWeights,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    reranker: Option<Arc<dyn Reranker>>,
    category_model: Option<Arc<dyn CategoryModel>>,
    analyst: Option<Arc<dyn CareerAnalyst>>,
}

pub struct AnalysisEngineBuilder {
    config: Config,
    rules: RuleTable,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    reranker: Option<Arc<dyn Reranker>>,
    category_model: Option<Arc<dyn CategoryModel>>,
    analyst: Option<Arc<dyn CareerAnalyst>>,
}

impl AnalysisEngineBuilder {
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn category_model(mut self, model: Arc<dyn CategoryModel>) -> Self {
        self.category_model = Some(model);
        self
    }

    pub fn analyst(mut self, analyst: Arc<dyn CareerAnalyst>) -> Self {
        self.analyst = Some(analyst);
        self
    }

    /// Fails only on invalid configuration or rules; missing models just narrow the pipeline
    pub fn build(self) -> Result<AnalysisEngine> {
        self.config.validate()?;
        self.rules
            .ensure_label_absent(&self.config.classification.sentinel_label)?;
        self.rules
            .ensure_label_absent(&self.config.classification.default_label)?;

        let processor = TextProcessor::new()?;
        let rules = Arc::new(self.rules);
        let keyword_scorer = KeywordScorer::new(rules.clone())?;
        let skill_matcher = SkillMatcher::new(&self.config.matching.skill_lexicon, &processor)?;

        let mut category_model = self.category_model;
        if let Some(model) = &category_model {
            let known: HashSet<&str> = rules.labels().collect();
            let sentinel = &self.config.classification.sentinel_label;
            let unknown = model
                .labels()
                .iter()
                .filter(|l| !known.contains(l.as_str()) && *l != sentinel)
                .count();
            if unknown > 0 {
                warn!(
                    "Category model '{}' has {} labels outside the rule table; \
                     those predictions will be discarded",
                    model.name(),
                    unknown
                );
            }
        }

        if category_model.is_none() && self.config.classification.semantic_prototypes {
            if let Some(embedder) = &self.embedder {
                match PrototypeCategoryModel::build(
                    &rules,
                    embedder.as_ref(),
                    self.config.classification.prototype_temperature,
                ) {
                    Ok(model) => category_model = Some(Arc::new(model)),
                    Err(e) => warn!("Semantic prototypes unavailable: {}", e),
                }
            }
        }

        Ok(AnalysisEngine {
            policy: ArbitrationPolicy::from(&self.config.classification),
            weights: MatchWeights::from(&self.config.matching),
            config: self.config,
            processor,
            rules,
            keyword_scorer,
            skill_matcher,
            embedder: self.embedder,
            reranker: self.reranker,
            category_model,
            analyst: self.analyst,
        })
    }
}

/// Matching direction: which side of each pair the fixed document is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    CvToJobs,
    JobToCvs,
}

impl AnalysisEngine {
    pub fn builder(config: Config, rules: RuleTable) -> AnalysisEngineBuilder {
        AnalysisEngineBuilder {
            config,
            rules,
            embedder: None,
            reranker: None,
            category_model: None,
            analyst: None,
        }
    }

    /// Load every configured collaborator; load failures are logged and the
    /// collaborator left out
    pub fn from_config(config: &Config) -> Result<Self> {
        let start_time = Instant::now();
        let processor = TextProcessor::new()?;
        let rules =
            RuleTable::load_or_bundled(config.classification.rules_path.as_deref(), &processor)?;
        let mut builder = Self::builder(config.clone(), rules);

        let embedding_model = &config.models.embedding_model;
        match Model2VecProvider::load(embedding_model, config.processing.batch_size) {
            Ok(provider) => builder = builder.embedding_provider(Arc::new(provider)),
            Err(e) => warn!("Semantic scoring disabled: {}", e),
        }

        if config.models.reranker_path.is_some() || config.models.category_model_path.is_some() {
            let device = select_device();
            if let Some(dir) = &config.models.reranker_path {
                match CandleReranker::load(dir, &device) {
                    Ok(reranker) => builder = builder.reranker(Arc::new(reranker)),
                    Err(e) => warn!("Re-ranker disabled: {}", e),
                }
            }
            if let Some(dir) = &config.models.category_model_path {
                match CandleCategoryModel::load(dir, &device) {
                    Ok(model) => builder = builder.category_model(Arc::new(model)),
                    Err(e) => warn!("Trained category model disabled: {}", e),
                }
            }
        }

        if config.analyst.enabled {
            match ChatCompletionAnalyst::from_config(&config.analyst) {
                Ok(analyst) if analyst.available() => builder = builder.analyst(Arc::new(analyst)),
                Ok(_) => {}
                Err(e) => warn!("Analyst disabled: {}", e),
            }
        }

        let engine = builder.build()?;
        info!("Analysis engine ready in {:.2?}", start_time.elapsed());
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            embedding_model: self.embedder.as_ref().map(|e| e.name().to_string()),
            reranker: self.reranker.as_ref().map(|r| r.name().to_string()),
            category_model: self.category_model.as_ref().map(|m| m.name().to_string()),
            category_method: self.category_model.as_ref().map(|m| m.method()),
            analyst: self.analyst.as_ref().map(|a| a.name().to_string()),
            rules_version: self.rules.version.clone(),
            rule_count: self.rules.rules.len(),
            skill_lexicon_size: self.skill_matcher.lexicon_size(),
        }
    }

    /// Rank job descriptions for one CV
    pub async fn match_jobs(
        &self,
        cv_text: &str,
        jobs: &[Candidate],
        options: MatchOptions,
    ) -> Result<MatchReport> {
        self.run_matching(cv_text, jobs, options, Direction::CvToJobs)
            .await
    }

    /// Rank CVs for one job description, scoring each pair CV-first
    pub async fn match_cvs(
        &self,
        job_text: &str,
        cvs: &[Candidate],
        options: MatchOptions,
    ) -> Result<MatchReport> {
        self.run_matching(job_text, cvs, options, Direction::JobToCvs)
            .await
    }

    /// Assign one category label to a document
    pub async fn classify(
        &self,
        text: &str,
        options: ClassifyOptions,
    ) -> Result<ClassificationResult> {
        let doc = Document::new(DocumentRole::Cv, "input", text, &self.processor);
        if doc.is_blank() {
            return Err(MatcherError::InvalidInput("CV text is empty".to_string()));
        }

        let cls = &self.config.classification;
        let keyword = self.keyword_scorer.verdict(
            &doc.normalized,
            &cls.default_label,
            cls.default_confidence,
            cls.top_k_alternatives,
        );
        debug!(
            "Keyword verdict: '{}' ({:.2}, matched={})",
            keyword.label, keyword.confidence, keyword.matched
        );

        let model = self.model_verdict(&doc).await;

        let mut result = self
            .policy
            .arbitrate(model.as_ref(), &keyword, None, &self.rules);

        if result.decision_method == DecisionMethod::FallbackDefault && options.use_analyst {
            if let Some(analyst) = self.analyst.as_ref().filter(|a| a.available()) {
                let labels: Vec<String> = self.rules.labels().map(str::to_string).collect();
                let timeout = Duration::from_millis(self.config.analyst.timeout_ms);
                match tokio::time::timeout(timeout, analyst.analyze(&doc.raw, &labels)).await {
                    Ok(Ok(mut opinion)) => {
                        if let Some(label) = resolve_label(&opinion.label, &labels) {
                            opinion.label = label;
                        }
                        result = self.policy.arbitrate(
                            model.as_ref(),
                            &keyword,
                            Some(&opinion),
                            &self.rules,
                        );
                    }
                    Ok(Err(e)) => warn!("Analyst '{}' failed: {}", analyst.name(), e),
                    Err(_) => warn!("Analyst '{}' timed out after {:?}", analyst.name(), timeout),
                }
            }
        }

        Ok(result)
    }

    fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.config.processing.inference_timeout_ms)
    }

    /// Category model verdict, or None when the model path is unavailable
    async fn model_verdict(&self, doc: &Document) -> Option<ModelVerdict> {
        let model = self.category_model.as_ref()?;
        let Some(embedder) = &self.embedder else {
            debug!("Category model '{}' needs embeddings; none loaded", model.name());
            return None;
        };

        let text = self.processor.normalize_for_embedding(&doc.raw);
        let verdict: Result<ModelVerdict> = async {
            let mut embeddings =
                embed_with_timeout(embedder.clone(), vec![text], self.inference_timeout()).await?;
            let embedding = embeddings.pop().unwrap_or_default();
            check_embedding(&embedding, embedding.len())?;
            doc.set_embedding(embedding.clone());
            predict_with_timeout(
                model.clone(),
                embedding,
                self.config.classification.top_k_alternatives,
                self.inference_timeout(),
            )
            .await
        }
        .await;

        match verdict {
            Ok(v) => {
                debug!("Model verdict: '{}' ({:.2}) via {:?}", v.label, v.confidence, v.method);
                Some(v)
            }
            Err(e) => {
                warn!("Category model unavailable for this request: {}", e);
                None
            }
        }
    }

    async fn run_matching(
        &self,
        anchor_text: &str,
        candidates: &[Candidate],
        options: MatchOptions,
        direction: Direction,
    ) -> Result<MatchReport> {
        let (anchor_role, candidate_role) = match direction {
            Direction::CvToJobs => (DocumentRole::Cv, DocumentRole::Job),
            Direction::JobToCvs => (DocumentRole::Job, DocumentRole::Cv),
        };

        let top_k = options.top_k.unwrap_or(self.config.matching.top_k);
        if top_k == 0 {
            return Err(MatcherError::InvalidInput("top_k must be at least 1".to_string()));
        }
        if candidates.is_empty() {
            return Err(MatcherError::InvalidInput("candidate list is empty".to_string()));
        }

        let anchor = Document::new(anchor_role, "anchor", anchor_text, &self.processor);
        if anchor.is_blank() {
            return Err(MatcherError::InvalidInput(format!(
                "{} text is empty",
                role_name(anchor.role)
            )));
        }
        let docs: Vec<Document> = candidates
            .iter()
            .map(|c| Document::new(candidate_role, c.id.clone(), &c.text, &self.processor))
            .collect();
        if let Some(blank) = docs.iter().find(|d| d.is_blank()) {
            return Err(MatcherError::InvalidInput(format!(
                "{} '{}' has empty text",
                role_name(blank.role),
                blank.id
            )));
        }

        let overlaps: Vec<SkillOverlap> = docs
            .iter()
            .map(|doc| match direction {
                Direction::CvToJobs => {
                    self.skill_matcher.overlap(&anchor.normalized, &doc.normalized)
                }
                Direction::JobToCvs => {
                    self.skill_matcher.overlap(&doc.normalized, &anchor.normalized)
                }
            })
            .collect();

        let use_hybrid = options.use_hybrid.unwrap_or(self.config.matching.use_hybrid);
        let requested = if use_hybrid {
            MatchMethod::Hybrid
        } else if self.reranker.is_some() {
            MatchMethod::Reranker
        } else {
            MatchMethod::Semantic
        };

        let mut skipped: Vec<usize> = Vec::new();
        let mut method = requested;
        let mut scores: Vec<Option<f32>> = vec![None; docs.len()];

        match self.embed_documents(&anchor, &docs).await {
            Ok(invalid) => {
                skipped = invalid;
                let usable: Vec<usize> = (0..docs.len()).filter(|i| !skipped.contains(i)).collect();
                match self
                    .semantic_scores(&anchor, &docs, &usable, &overlaps, requested, direction)
                    .await
                {
                    Ok(per_candidate) => {
                        for (i, score) in per_candidate {
                            match score {
                                Some(s) => scores[i] = Some(s),
                                None => skipped.push(i),
                            }
                        }
                        if skipped.len() == docs.len() {
                            warn!("Inference failed for every candidate; using keyword scores");
                            method = MatchMethod::Keyword;
                            skipped.clear();
                        }
                    }
                    Err(e) if e.is_degradable() => {
                        warn!("Semantic scoring unavailable: {}; using keyword scores", e);
                        method = MatchMethod::Keyword;
                        skipped.clear();
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) if e.is_degradable() => {
                warn!("Semantic scoring unavailable: {}; using keyword scores", e);
                method = MatchMethod::Keyword;
            }
            Err(e) => return Err(e),
        }

        if method == MatchMethod::Keyword {
            for (score, overlap) in scores.iter_mut().zip(&overlaps) {
                *score = Some(overlap.boost);
            }
        }

        skipped.sort_unstable();
        skipped.dedup();

        let ranked = rank(
            scores
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.map(|score| (i, score, ()))),
            top_k,
        );

        let matches = ranked
            .into_iter()
            .map(|r| MatchResult {
                candidate_index: r.index,
                source_id: candidates[r.index].id.clone(),
                similarity_score: r.score,
                rank: r.rank,
                method,
                matched_skills: overlaps[r.index].matched_skills.clone(),
                missing_skills: overlaps[r.index].missing_skills.clone(),
            })
            .collect();

        Ok(MatchReport {
            matches,
            method,
            degraded: method == MatchMethod::Keyword,
            skipped: skipped.iter().map(|&i| candidates[i].id.clone()).collect(),
        })
    }

    /// One embedding call for the anchor and every candidate.
    ///
    /// Returns indices of candidates whose embedding is unusable; an error means the
    /// whole semantic path is down.
    async fn embed_documents(&self, anchor: &Document, docs: &[Document]) -> Result<Vec<usize>> {
        let embedder = self.embedder.as_ref().ok_or_else(|| {
            MatcherError::DependencyUnavailable("no embedding model loaded".to_string())
        })?;

        let texts: Vec<String> = std::iter::once(anchor)
            .chain(docs)
            .map(|d| self.processor.normalize_for_embedding(&d.raw))
            .collect();
        let mut embeddings =
            embed_with_timeout(embedder.clone(), texts, self.inference_timeout()).await?;

        let anchor_embedding = embeddings.remove(0);
        let dim = anchor_embedding.len();
        check_embedding(&anchor_embedding, dim).map_err(|e| {
            MatcherError::DependencyUnavailable(format!("anchor embedding unusable: {}", e))
        })?;
        anchor.set_embedding(anchor_embedding);

        let mut invalid = Vec::new();
        for (i, (doc, embedding)) in docs.iter().zip(embeddings).enumerate() {
            match check_embedding(&embedding, dim) {
                Ok(()) => {
                    doc.set_embedding(embedding);
                }
                Err(e) => {
                    warn!("Skipping candidate '{}': {}", doc.id, e);
                    invalid.push(i);
                }
            }
        }
        Ok(invalid)
    }

    /// Scores for `usable` candidates under a semantic method; `None` marks a failed pair
    async fn semantic_scores(
        &self,
        anchor: &Document,
        docs: &[Document],
        usable: &[usize],
        overlaps: &[SkillOverlap],
        method: MatchMethod,
        direction: Direction,
    ) -> Result<Vec<(usize, Option<f32>)>> {
        let anchor_embedding = anchor.embedding().unwrap_or_default();
        let embedding_of = |i: usize| docs[i].embedding().unwrap_or_default();

        if method == MatchMethod::Reranker {
            let reranker = self.reranker.clone().ok_or_else(|| {
                MatcherError::DependencyUnavailable("no re-ranker loaded".to_string())
            })?;
            let pairs = usable
                .iter()
                .map(|&i| {
                    let (cv, job) = match direction {
                        Direction::CvToJobs => (anchor_embedding, embedding_of(i)),
                        Direction::JobToCvs => (embedding_of(i), anchor_embedding),
                    };
                    (cv.to_vec(), job.to_vec())
                })
                .collect();
            let probabilities =
                rerank_with_timeout(reranker, pairs, self.inference_timeout()).await?;

            return Ok(usable
                .iter()
                .zip(probabilities)
                .map(|(&i, p)| {
                    if p.is_finite() {
                        (i, Some(rescale_probability(p)))
                    } else {
                        warn!(
                            "Skipping candidate '{}': re-ranker output is not finite",
                            docs[i].id
                        );
                        (i, None)
                    }
                })
                .collect());
        }

        Ok(usable
            .iter()
            .map(|&i| {
                let score = similarity(anchor_embedding, embedding_of(i)).map(|semantic| {
                    if method == MatchMethod::Hybrid {
                        combine(semantic, overlaps[i].boost, self.weights)
                    } else {
                        semantic
                    }
                });
                match score {
                    Ok(s) if s.is_finite() => (i, Some(s)),
                    Ok(_) | Err(_) => {
                        warn!(
                            "Skipping candidate '{}': similarity could not be computed",
                            docs[i].id
                        );
                        (i, None)
                    }
                }
            })
            .collect())
    }
}

fn role_name(role: DocumentRole) -> &'static str {
    match role {
        DocumentRole::Cv => "CV",
        DocumentRole::Job => "job",
    }
}
