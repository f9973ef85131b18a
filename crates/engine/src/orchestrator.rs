//! Orchestrator - runs one question through every stage and emits a record
//!
//! Classify -> Gather -> Reason -> Draft -> Verify -> (Refine -> Verify)* -> Emit

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use claimforge_common::metrics::AnswerMetrics;
use claimforge_common::models::{
    AnswerRecord, DraftAnswer, Page, ProcessingMetadata, ProcessingMode, Stage,
};
use claimforge_common::text::{EntityExtractor, SimilarityProvider};
use claimforge_common::{
    EngineConfig, EngineError, LexicalEntityExtractor, LexicalSimilarity, Result,
};
use tracing::{debug, info, instrument, warn};

use crate::classifier::QuestionClassifier;
use crate::context::QuestionContext;
use crate::gatherer::gather;
use crate::reasoner::reason;
use crate::refinement::RefinementLoop;
use crate::scorer;
use crate::verifier::verify_concurrent;

/// Answers questions against document slices.
///
/// Holds no per-question state; clone it or share it behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    extractor: Arc<dyn EntityExtractor>,
    similarity: Arc<dyn SimilarityProvider>,
    refinement: RefinementLoop,
}

impl Orchestrator {
    /// Create an orchestrator with the lexical fallbacks
    pub fn new(config: EngineConfig) -> Self {
        let refinement = RefinementLoop::new(&config.refinement);
        Self {
            config: Arc::new(config),
            extractor: Arc::new(LexicalEntityExtractor::new()),
            similarity: Arc::new(LexicalSimilarity::new()),
            refinement,
        }
    }

    /// Use an injected similarity capability (e.g. embedding-backed)
    pub fn with_similarity(mut self, similarity: Arc<dyn SimilarityProvider>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Use an injected entity extractor
    pub fn with_entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer a question using the configured refinement timeout, if any
    pub async fn answer(&self, question: &str, pages: Vec<Page>) -> Result<AnswerRecord> {
        self.run(question, pages, self.config.refinement_timeout()).await
    }

    /// Answer a question, emitting the best attempt once `deadline` has elapsed
    pub async fn answer_with_deadline(
        &self,
        question: &str,
        pages: Vec<Page>,
        deadline: Duration,
    ) -> Result<AnswerRecord> {
        self.run(question, pages, Some(deadline)).await
    }

    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    async fn run(
        &self,
        question: &str,
        pages: Vec<Page>,
        timeout: Option<Duration>,
    ) -> Result<AnswerRecord> {
        // A timeout past the clock's range is no deadline at all
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut metrics = AnswerMetrics::start("unclassified");

        match validate_input(question, &pages) {
            Err(defect) if defect.is_input_defect() => {
                warn!(error = %defect, code = defect.code().as_code(), "Rejecting malformed input");
                let record = defect_record(question, &defect);
                metrics.finish(record.status.as_str(), 0.0, 0);
                return Ok(record);
            }
            Err(e) => return Err(e),
            Ok(()) => {}
        }

        // Classify
        let classified = QuestionClassifier::new(Arc::clone(&self.extractor)).classify(question);
        let mode = classified.mode;
        metrics.set_mode(mode.as_str());
        let mut metadata = ProcessingMetadata::new(mode);
        metadata.record_stage(Stage::Classify);
        info!(
            mode = mode.as_str(),
            question_type = ?classified.question_type,
            scope = ?classified.scope,
            entities = classified.entities.len(),
            "Question classified"
        );

        let context = Arc::new(QuestionContext::new(
            classified,
            pages,
            Arc::clone(&self.extractor),
            Arc::clone(&self.similarity),
            self.config.gathering.clone(),
        ));

        // Gather
        let gathered = gather(Arc::clone(&context)).await?;
        metadata.record_stage(Stage::Gather);

        // Reason
        let reasoned = reason(&context, &gathered);
        metadata.record_stage(Stage::Reason);

        // Draft
        let mut draft = scorer::score(reasoned, &context.question);
        for reference in gathered.detections.cross_references.iter().filter(|r| !r.in_slice) {
            draft.push_suggestion(format!(
                "Provide {} (referenced on page {})",
                reference.target, reference.source_page
            ));
        }
        let draft = scorer::attach_indicators(draft);
        metadata.record_stage(Stage::Draft);
        debug!(
            status = draft.status.as_str(),
            certainty = draft.certainty_score,
            completeness = draft.completeness,
            "Draft scored"
        );

        // Verify
        let report = verify_concurrent(Arc::new(draft.clone()), Arc::clone(&context)).await?;
        metadata.record_stage(Stage::Verify);
        info!(
            score = report.verification_score,
            failed = report.failed.len(),
            "Draft verified"
        );

        // Refine
        let refinement = self.refinement.clone();
        let refine_context = Arc::clone(&context);
        let outcome = tokio::task::spawn_blocking(move || {
            refinement.run(draft, report, &refine_context, deadline)
        })
        .await
        .map_err(|e| EngineError::TaskFailed {
            message: format!("refinement worker failed: {}", e),
        })?;
        if outcome.timed_out {
            let timeout_ms = timeout.map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
            let err = EngineError::Timeout { timeout_ms };
            warn!(error = %err, code = err.code().as_code(), "Emitting best attempt at the deadline");
        }
        for stage in &outcome.stages {
            metadata.record_stage(*stage);
        }
        metadata.verification_score = outcome.report.verification_score;
        metadata.refinement_iterations = outcome.iterations;

        // Emit
        metadata.record_stage(Stage::Emit);
        let record = AnswerRecord::from_draft(outcome.draft, metadata);
        if let Err(e) = record.validate() {
            warn!(error = %e, "Emitted record violates the record contract");
        }

        metrics.finish(
            record.status.as_str(),
            record.processing_metadata.verification_score,
            record.processing_metadata.refinement_iterations,
        );
        info!(
            status = record.status.as_str(),
            certainty = record.certainty.as_str(),
            verification_score = record.processing_metadata.verification_score,
            refinement_iterations = record.processing_metadata.refinement_iterations,
            degraded = outcome.degraded,
            "Answer emitted"
        );

        Ok(record)
    }
}

/// Reject input that cannot be answered at all
fn validate_input(question: &str, pages: &[Page]) -> Result<()> {
    if question.trim().is_empty() {
        return Err(EngineError::InvalidInput {
            message: "question is empty".to_string(),
        });
    }
    if pages.is_empty() {
        return Err(EngineError::InvalidInput {
            message: "page slice is empty".to_string(),
        });
    }
    let mut seen = BTreeSet::new();
    for page in pages {
        if !seen.insert(page.number) {
            return Err(EngineError::DuplicatePage { page: page.number });
        }
    }
    Ok(())
}

/// Immediate not_found record for an input defect; no verification runs
fn defect_record(question: &str, defect: &EngineError) -> AnswerRecord {
    let mut draft = DraftAnswer::not_found(question.trim(), format!("{}.", defect));
    let suggestion = match defect {
        EngineError::DuplicatePage { .. } => "Provide each page of the slice exactly once",
        _ if question.trim().is_empty() => "Provide a non-empty question",
        _ => "Provide at least one page of the document",
    };
    draft.push_suggestion(suggestion);
    let draft = scorer::attach_indicators(draft);

    let mut metadata = ProcessingMetadata::new(ProcessingMode::Standard);
    metadata.record_stage(Stage::Emit);
    AnswerRecord::from_draft(draft, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimforge_common::models::{AnswerStatus, CertaintyCategory};

    fn pages(pages: &[(u32, &str)]) -> Vec<Page> {
        pages.iter().map(|(n, t)| Page::new(*n, *t)).collect()
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(EngineConfig::default())
    }

    #[tokio::test]
    async fn test_aggregate_end_to_end() {
        let record = orchestrator()
            .answer(
                "What is the total funding for Program Alpha and Program Beta?",
                pages(&[
                    (1, "Program Alpha received $10M in funding."),
                    (2, "Program Beta received $15M in funding."),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(record.status, AnswerStatus::Complete);
        assert_eq!(record.inference_chain.len(), 3);
        assert!(record.answer.contains("$25M"));
        assert_eq!(record.certainty_score, 0.85);
        assert_eq!(record.certainty, CertaintyCategory::High);
        assert_eq!(record.processing_metadata.verification_score, 1.0);
        assert_eq!(record.processing_metadata.refinement_iterations, 0);
        assert_eq!(
            record.processing_metadata.stages_executed,
            vec![
                Stage::Classify,
                Stage::Gather,
                Stage::Reason,
                Stage::Draft,
                Stage::Verify,
                Stage::Emit
            ]
        );
        record.validate().unwrap();
    }

    #[tokio::test]
    async fn test_year_in_aggregate_question_stays_out_of_the_answer() {
        let record = orchestrator()
            .answer(
                "What is the total 2024 funding for Program Alpha and Program Beta?",
                pages(&[
                    (1, "Program Alpha received $10M in funding."),
                    (2, "Program Beta received $15M in funding."),
                ]),
            )
            .await
            .unwrap();

        assert!(record
            .answer
            .starts_with("The total funding for Program Alpha and Program Beta is $25M"));
        assert!(!record.answer.contains("2024"));
        assert_eq!(record.status, AnswerStatus::Complete);
        assert_eq!(record.processing_metadata.verification_score, 1.0);
    }

    #[tokio::test]
    async fn test_contradiction_end_to_end() {
        let record = orchestrator()
            .answer(
                "How did funding for Program Alpha change?",
                pages(&[
                    (3, "Funding for Program Alpha increased in 2024."),
                    (7, "Funding for Program Alpha decreased in 2024."),
                ]),
            )
            .await
            .unwrap();

        assert!(!record.contradictions.is_empty());
        assert_eq!(record.certainty_score, 0.70);
        assert_eq!(record.certainty, CertaintyCategory::Medium);
    }

    #[tokio::test]
    async fn test_input_defects_yield_not_found() {
        let orchestrator = orchestrator();

        let empty_slice = orchestrator.answer("Who funds it?", Vec::new()).await.unwrap();
        assert_eq!(empty_slice.status, AnswerStatus::NotFound);
        assert_eq!(empty_slice.processing_metadata.stages_executed, vec![Stage::Emit]);
        assert!(empty_slice.reasoning.contains("page slice is empty"));

        let duplicate = orchestrator
            .answer("Who funds it?", pages(&[(1, "One."), (1, "Again.")]))
            .await
            .unwrap();
        assert_eq!(duplicate.status, AnswerStatus::NotFound);
        assert!(duplicate.reasoning.contains("Duplicate page"));

        let blank = orchestrator
            .answer("   ", pages(&[(1, "Program Alpha received $10M.")]))
            .await
            .unwrap();
        assert_eq!(blank.status, AnswerStatus::NotFound);
        blank.validate().unwrap();
    }

    #[tokio::test]
    async fn test_out_of_slice_reference_becomes_suggestion() {
        let record = orchestrator()
            .answer(
                "What is the budget of Program Alpha?",
                pages(&[
                    (1, "The budget of Program Alpha is $4M."),
                    (2, "Program Alpha budget details are described in Appendix C."),
                ]),
            )
            .await
            .unwrap();

        assert!(record.suggestions.iter().any(|s| s.contains("referenced on page 2")));
    }

    #[tokio::test]
    async fn test_unbounded_deadline_is_accepted() {
        let record = orchestrator()
            .answer_with_deadline(
                "How much funding did Program Alpha receive?",
                pages(&[(1, "Program Alpha received $10M in funding.")]),
                Duration::MAX,
            )
            .await
            .unwrap();
        assert_eq!(record.status, AnswerStatus::Complete);
    }

    #[test]
    fn test_sync_callers_can_block_on_answer() {
        let record = tokio_test::block_on(orchestrator().answer(
            "How much funding did Program Alpha receive?",
            pages(&[(1, "Program Alpha received $10M in funding.")]),
        ))
        .unwrap();
        assert_eq!(record.status, AnswerStatus::Complete);
    }
}
