use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::config::OrchestratorConfig;
use super::dialogue::{DialogueStream, trim_history};
use super::error::{BranchKind, OrchestratorError, OrchestratorResult};
use super::parse::parse_reply;
use super::prompts;
use super::scoring::{decide_next_difficulty, suspicious_score};
use super::types::{
    AuthenticityAssessment, CodeStyleAnalysis, Difficulty, EmbeddingAssessment, EvaluationKey,
    GeneratedTask, InterviewContext, QualityAssessment, SimilarSolution, Submission,
    SuspicionVerdict, Task,
};
use crate::cache::{CacheNamespace, CacheStore, MemoryStore, ResultCache};
use crate::gateway::{ChatMessage, ChatReply, ChatRequest, ChatStream, InferenceBackend};
use crate::similarity::{
    EmbeddingRecord, SimilarMatch, SimilarityError, SimilarityIndex, SolutionMetadata,
};

const QUALITY_TEMPERATURE: f32 = 0.3;
const QUALITY_MAX_TOKENS: u32 = 1500;
const AUTHENTICITY_TEMPERATURE: f32 = 0.2;
const AUTHENTICITY_MAX_TOKENS: u32 = 800;
const HINT_TEMPERATURE: f32 = 0.5;
const HINT_MAX_TOKENS: u32 = 200;
const STYLE_TEMPERATURE: f32 = 0.2;
const STYLE_MAX_TOKENS: u32 = 500;
const TASK_TEMPERATURE: f32 = 0.8;
const TASK_MAX_TOKENS: u32 = 2000;
const DIALOGUE_TEMPERATURE: f32 = 0.7;
const DIALOGUE_MAX_TOKENS: u32 = 500;

/// Evaluation pipeline over a shared backend, cache and similarity index.
///
/// `evaluate_submission` checks the cache, then runs the quality, authenticity and
/// embedding branches concurrently in one task. The first branch error drops the
/// others, which aborts their HTTP calls and abandons any rate-limit wait.
pub struct Orchestrator<B: InferenceBackend, S: CacheStore = MemoryStore> {
    backend: Arc<B>,
    cache: Arc<ResultCache<S>>,
    index: Arc<SimilarityIndex<B>>,
    config: OrchestratorConfig,
}

impl<B, S> Orchestrator<B, S>
where
    B: InferenceBackend + 'static,
    S: CacheStore + 'static,
{
    pub fn new(
        backend: Arc<B>,
        cache: Arc<ResultCache<S>>,
        index: Arc<SimilarityIndex<B>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            backend,
            cache,
            index,
            config,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn cache(&self) -> &Arc<ResultCache<S>> {
        &self.cache
    }

    pub fn index(&self) -> &Arc<SimilarityIndex<B>> {
        &self.index
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Produces the verdict for one submission, from cache when possible.
    ///
    /// Either every branch succeeds and the verdict is cached, or the first branch
    /// error is returned and nothing is cached.
    #[instrument(
        skip(self, task, submission),
        fields(task_id = %task.id, language = %submission.language)
    )]
    pub async fn evaluate_submission(
        &self,
        task: &Task,
        submission: &Submission,
    ) -> OrchestratorResult<SuspicionVerdict> {
        let key = EvaluationKey {
            task_id: &task.id,
            code: &submission.code,
            language: &submission.language,
        };

        if let Some(verdict) = self
            .cache
            .get_evaluation::<_, SuspicionVerdict>(&key)
            .await
        {
            info!("Evaluation served from cache");
            return Ok(verdict);
        }

        let started = Instant::now();
        let branches = tokio::try_join!(
            self.quality_branch(task, submission),
            self.authenticity_branch(task, submission),
            self.embedding_branch(&submission.code),
        );

        let (quality, authenticity, embedding) = match branches {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    branch = e.branch_kind().map(|b| b.as_str()),
                    error = %e,
                    "Evaluation failed"
                );
                return Err(e);
            }
        };

        let verdict = aggregate(task, submission, quality, authenticity, embedding);
        self.cache.cache_evaluation(&key, &verdict).await;

        info!(
            overall = verdict.overall,
            suspicious_score = verdict.suspicious_score,
            exact_match = verdict.exact_match,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Evaluation complete"
        );
        Ok(verdict)
    }

    async fn quality_branch(
        &self,
        task: &Task,
        submission: &Submission,
    ) -> OrchestratorResult<QualityAssessment> {
        let messages = prompts::quality_messages(
            task,
            &submission.code,
            &submission.language,
            submission.execution.as_ref(),
        );
        let request = ChatRequest::new(&self.config.chat_model, messages)
            .temperature(QUALITY_TEMPERATURE)
            .max_tokens(QUALITY_MAX_TOKENS);

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::Quality))?;

        let assessment: QualityAssessment = parse_reply(BranchKind::Quality, &reply)?;
        assessment
            .validate()
            .map_err(|reason| OrchestratorError::InvalidAssessment {
                branch: BranchKind::Quality,
                reason,
            })?;

        debug!(overall = assessment.overall_score, "Quality branch complete");
        Ok(assessment)
    }

    async fn authenticity_branch(
        &self,
        task: &Task,
        submission: &Submission,
    ) -> OrchestratorResult<AuthenticityAssessment> {
        let messages =
            prompts::authenticity_messages(task, &submission.code, &submission.language);
        let request = ChatRequest::new(&self.config.coder_model, messages)
            .temperature(AUTHENTICITY_TEMPERATURE)
            .max_tokens(AUTHENTICITY_MAX_TOKENS);

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::Authenticity))?;

        let assessment: AuthenticityAssessment = parse_reply(BranchKind::Authenticity, &reply)?;
        assessment
            .validate()
            .map_err(|reason| OrchestratorError::InvalidAssessment {
                branch: BranchKind::Authenticity,
                reason,
            })?;

        debug!(
            similarity = assessment.similarity_score,
            suspicious = assessment.is_suspicious,
            "Authenticity branch complete"
        );
        Ok(assessment)
    }

    async fn embedding_branch(&self, code: &str) -> OrchestratorResult<EmbeddingAssessment> {
        if let Some(record) = self.index.find_exact_match(code) {
            debug!(source = %record.metadata.source, "Exact match in similarity index");
            let exact = SimilarMatch {
                record,
                similarity: 1.0,
            };
            return Ok(EmbeddingAssessment {
                best_similarity: 1.0,
                exact_match: true,
                matches: vec![SimilarSolution::from(&exact)],
            });
        }

        let matches = self
            .index
            .find_similar(
                code,
                self.config.similarity_threshold,
                self.config.max_similar_results,
            )
            .await
            .map_err(|e| match e {
                SimilarityError::Embedding(source) => OrchestratorError::Branch {
                    branch: BranchKind::Embedding,
                    source,
                },
            })?;

        let best_similarity = matches.first().map(|m| m.similarity).unwrap_or(0.0);
        debug!(matches = matches.len(), best_similarity, "Embedding branch complete");

        Ok(EmbeddingAssessment {
            best_similarity,
            exact_match: false,
            matches: matches.iter().map(SimilarSolution::from).collect(),
        })
    }

    /// One short hint for the candidate's current code. Never cached.
    #[instrument(skip(self, task, code), fields(task_id = %task.id))]
    pub async fn provide_hint(
        &self,
        task: &Task,
        code: &str,
        language: &str,
    ) -> OrchestratorResult<String> {
        let request = ChatRequest::new(
            &self.config.chat_model,
            prompts::hint_messages(task, code, language),
        )
        .temperature(HINT_TEMPERATURE)
        .max_tokens(HINT_MAX_TOKENS);

        let hint = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::Hint))?;

        debug!(chars = hint.len(), "Hint generated");
        Ok(hint.trim().to_string())
    }

    /// Style profile of `code` from the coder model. Never cached.
    #[instrument(skip(self, code), fields(code_len = code.len()))]
    pub async fn analyze_code_style(
        &self,
        code: &str,
        language: &str,
    ) -> OrchestratorResult<CodeStyleAnalysis> {
        let request = ChatRequest::new(
            &self.config.coder_model,
            prompts::style_messages(code, language),
        )
        .temperature(STYLE_TEMPERATURE)
        .max_tokens(STYLE_MAX_TOKENS);

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::StyleAnalysis))?;

        let analysis: CodeStyleAnalysis = parse_reply(BranchKind::StyleAnalysis, &reply)?;
        debug!(
            coding_level = %analysis.coding_level,
            external_help = analysis.suggests_external_help,
            "Style analysis complete"
        );
        Ok(analysis)
    }

    /// Embeds `code` and adds it to the shared similarity index.
    pub async fn add_known_solution(
        &self,
        code: &str,
        metadata: SolutionMetadata,
    ) -> OrchestratorResult<Arc<EmbeddingRecord>> {
        Ok(self.index.add_known_solution(code, metadata).await?)
    }

    /// See [`decide_next_difficulty`].
    pub fn decide_next_difficulty(&self, score: f64, time_spent_secs: u64) -> Difficulty {
        decide_next_difficulty(score, time_spent_secs)
    }

    /// Returns a task for `level` and `domain`, generating one on a cache miss.
    ///
    /// `previous_score` steers difficulty, so a call carrying one skips the cache lookup.
    /// The fresh task still replaces the cached entry for `{level, domain}`.
    #[instrument(skip(self))]
    pub async fn generate_task(
        &self,
        level: &str,
        domain: &str,
        previous_score: Option<f64>,
    ) -> OrchestratorResult<GeneratedTask> {
        if previous_score.is_none()
            && let Some(task) = self.cache.get_task::<GeneratedTask>(level, domain).await
        {
            info!(title = %task.title, "Task served from cache");
            return Ok(task);
        }

        let request = ChatRequest::new(
            &self.config.chat_model,
            prompts::task_messages(level, domain, previous_score),
        )
        .temperature(TASK_TEMPERATURE)
        .max_tokens(TASK_MAX_TOKENS);

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::TaskGeneration))?;

        let task = parse_task(BranchKind::TaskGeneration, &reply)?;
        self.cache.cache_task(level, domain, &task).await;
        info!(title = %task.title, "Task generated");
        Ok(task)
    }

    /// Rewrites `original` for a candidate who scored `score` on it. Never cached.
    ///
    /// `>= 90` asks for a significantly harder task, `>= 70` slightly harder, `>= 50`
    /// the same difficulty, anything lower an easier one.
    #[instrument(skip(self, original), fields(title = %original.title))]
    pub async fn adapt_task(
        &self,
        original: &GeneratedTask,
        score: f64,
    ) -> OrchestratorResult<GeneratedTask> {
        let request = ChatRequest::new(
            &self.config.chat_model,
            prompts::adapt_messages(original, score),
        )
        .temperature(TASK_TEMPERATURE)
        .max_tokens(TASK_MAX_TOKENS);

        let reply = self
            .backend
            .complete(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::TaskAdaptation))?;

        let task = parse_task(BranchKind::TaskAdaptation, &reply)?;
        info!(title = %task.title, adjustment = prompts::adjustment(score), "Task adapted");
        Ok(task)
    }

    /// Sends one candidate message to the interviewer and streams the reply.
    #[instrument(skip(self, message, context), fields(session_id = %session_id))]
    pub async fn send_message(
        &self,
        session_id: &str,
        message: &str,
        context: &InterviewContext,
    ) -> OrchestratorResult<DialogueStream> {
        let mut history = self.cache.get_conversation(session_id).await;
        history.push(ChatMessage::user(message));
        trim_history(&mut history);

        let request = ChatRequest::new(
            &self.config.chat_model,
            prompts::dialogue_messages(context, &history),
        )
        .temperature(DIALOGUE_TEMPERATURE)
        .max_tokens(DIALOGUE_MAX_TOKENS)
        .streaming(true);

        let reply = self
            .backend
            .chat(request)
            .await
            .map_err(OrchestratorError::branch(BranchKind::Dialogue))?;

        let stream = match reply {
            ChatReply::Streaming { stream, .. } => stream,
            ChatReply::Complete { content, .. } => ChatStream::from_fragments(vec![Ok(content)]),
        };

        Ok(DialogueStream::new(
            stream,
            history,
            Arc::clone(&self.cache),
            session_id.to_string(),
        ))
    }

    /// Forgets the dialogue history of `session_id`.
    pub async fn reset_conversation(&self, session_id: &str) {
        self.cache
            .delete(CacheNamespace::Conversation, session_id)
            .await;
        info!(session_id, "Conversation reset");
    }
}

fn parse_task(branch: BranchKind, reply: &str) -> OrchestratorResult<GeneratedTask> {
    let task: GeneratedTask = parse_reply(branch, reply)?;
    if task.title.trim().is_empty() {
        return Err(OrchestratorError::InvalidAssessment {
            branch,
            reason: "generated task has no title".to_string(),
        });
    }
    Ok(task)
}

fn aggregate(
    task: &Task,
    submission: &Submission,
    quality: QualityAssessment,
    authenticity: AuthenticityAssessment,
    embedding: EmbeddingAssessment,
) -> SuspicionVerdict {
    let llm_similarity = authenticity.similarity_score;
    let embedding_similarity = f64::from(embedding.best_similarity) * 100.0;

    SuspicionVerdict {
        task_id: task.id.clone(),
        correctness: quality.correctness_score,
        code_quality: quality.code_quality_score,
        efficiency: quality.efficiency_score,
        edge_cases: quality.edge_cases_score,
        overall: quality.overall_score,
        suspicious_score: suspicious_score(
            &submission.telemetry,
            llm_similarity,
            embedding_similarity,
        ),
        llm_similarity,
        embedding_similarity,
        is_suspicious: authenticity.is_suspicious,
        likely_source: authenticity.likely_source,
        recommendation: authenticity.recommendation,
        feedback: quality.feedback,
        similar_solutions: embedding.matches,
        exact_match: embedding.exact_match,
        next_challenge_level: quality.next_challenge_level,
        evaluated_at: Utc::now(),
    }
}
