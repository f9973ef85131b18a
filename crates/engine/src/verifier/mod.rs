//! Verifier - registry of pure checks over a scored draft
//!
//! Checks never trust stored detections: the three completeness checks
//! re-run the streaming detector over the draft's evidence and diff.

mod checks;

pub(crate) use checks::{claim_is_backed, fits_type, unsourced_numbers};

use std::sync::Arc;

use claimforge_common::constants::PASS_THRESHOLD;
use claimforge_common::models::DraftAnswer;
use claimforge_common::{EngineError, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::QuestionContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    PageValidity,
    ClaimEvidenceAlignment,
    NumberSourcing,
    ScopeAlignment,
    CompletenessValidation,
    EvidenceClassification,
    ContradictionCompleteness,
    CrossReferenceCompleteness,
    AmbiguityCompleteness,
    CertaintyCalibration,
    InlineIndicators,
}

impl CheckId {
    /// Registry order
    pub const ALL: [CheckId; 11] = [
        CheckId::PageValidity,
        CheckId::ClaimEvidenceAlignment,
        CheckId::NumberSourcing,
        CheckId::ScopeAlignment,
        CheckId::CompletenessValidation,
        CheckId::EvidenceClassification,
        CheckId::ContradictionCompleteness,
        CheckId::CrossReferenceCompleteness,
        CheckId::AmbiguityCompleteness,
        CheckId::CertaintyCalibration,
        CheckId::InlineIndicators,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckId::PageValidity => "page_validity",
            CheckId::ClaimEvidenceAlignment => "claim_evidence_alignment",
            CheckId::NumberSourcing => "number_sourcing",
            CheckId::ScopeAlignment => "scope_alignment",
            CheckId::CompletenessValidation => "completeness_validation",
            CheckId::EvidenceClassification => "evidence_classification",
            CheckId::ContradictionCompleteness => "contradiction_completeness",
            CheckId::CrossReferenceCompleteness => "cross_reference_completeness",
            CheckId::AmbiguityCompleteness => "ambiguity_completeness",
            CheckId::CertaintyCalibration => "certainty_calibration",
            CheckId::InlineIndicators => "inline_indicators",
        }
    }

    fn check(&self) -> fn(&DraftAnswer, &QuestionContext) -> checks::CheckResult {
        match self {
            CheckId::PageValidity => checks::page_validity,
            CheckId::ClaimEvidenceAlignment => checks::claim_evidence_alignment,
            CheckId::NumberSourcing => checks::number_sourcing,
            CheckId::ScopeAlignment => checks::scope_alignment,
            CheckId::CompletenessValidation => checks::completeness_validation,
            CheckId::EvidenceClassification => checks::evidence_classification,
            CheckId::ContradictionCompleteness => checks::contradiction_completeness,
            CheckId::CrossReferenceCompleteness => checks::cross_reference_completeness,
            CheckId::AmbiguityCompleteness => checks::ambiguity_completeness,
            CheckId::CertaintyCalibration => checks::certainty_calibration,
            CheckId::InlineIndicators => checks::inline_indicators,
        }
    }

    /// Run this check against a draft
    pub fn run(&self, draft: &DraftAnswer, context: &QuestionContext) -> CheckOutcome {
        let (passed, detail) = match (self.check())(draft, context) {
            Ok(()) => (true, None),
            Err(detail) => (false, Some(detail)),
        };
        debug!(check = self.as_str(), passed, detail = ?detail, "Check evaluated");
        CheckOutcome {
            id: *self,
            passed,
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutcome {
    pub id: CheckId,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Result of one full verification pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationReport {
    pub outcomes: Vec<CheckOutcome>,
    /// Passed checks over total checks
    pub verification_score: f64,
    pub failed: Vec<CheckId>,
}

impl VerificationReport {
    fn from_outcomes(outcomes: Vec<CheckOutcome>) -> Self {
        let total = outcomes.len().max(1);
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let failed = outcomes.iter().filter(|o| !o.passed).map(|o| o.id).collect();
        Self {
            verification_score: passed as f64 / total as f64,
            outcomes,
            failed,
        }
    }

    pub fn passed(&self) -> bool {
        self.verification_score >= PASS_THRESHOLD
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run every registered check sequentially
pub fn verify(draft: &DraftAnswer, context: &QuestionContext) -> VerificationReport {
    let outcomes = CheckId::ALL
        .iter()
        .map(|id| id.run(draft, context))
        .collect();
    VerificationReport::from_outcomes(outcomes)
}

/// Run every registered check on the blocking pool and reduce once all finish
pub async fn verify_concurrent(
    draft: Arc<DraftAnswer>,
    context: Arc<QuestionContext>,
) -> Result<VerificationReport> {
    let handles = CheckId::ALL.iter().map(|id| {
        let id = *id;
        let draft = Arc::clone(&draft);
        let context = Arc::clone(&context);
        tokio::task::spawn_blocking(move || id.run(&draft, &context))
    });

    let mut outcomes = Vec::with_capacity(CheckId::ALL.len());
    for result in join_all(handles).await {
        let outcome = result.map_err(|e| EngineError::TaskFailed {
            message: format!("verification worker failed: {}", e),
        })?;
        outcomes.push(outcome);
    }

    Ok(VerificationReport::from_outcomes(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::tests::reasoned;
    use crate::scorer;
    use claimforge_common::models::{EvidenceQuality, EvidenceItem, EvidenceType};

    fn drafted(question: &str, pages: &[(u32, &str)]) -> (QuestionContext, DraftAnswer) {
        let (ctx, draft) = reasoned(question, pages);
        let draft = scorer::attach_indicators(scorer::score(draft, &ctx.question));
        (ctx, draft)
    }

    const ALPHA_BETA: &[(u32, &str)] = &[
        (1, "Program Alpha received $10M in funding."),
        (2, "Program Beta received $15M in funding."),
    ];

    #[test]
    fn test_clean_aggregate_passes_every_check() {
        let (ctx, draft) = drafted(
            "What is the total funding for Program Alpha and Program Beta?",
            ALPHA_BETA,
        );
        let report = verify(&draft, &ctx);
        assert!(report.is_clean(), "failed: {:?}", report.outcomes);
        assert_eq!(report.verification_score, 1.0);
        assert!(report.passed());
    }

    #[test]
    fn test_out_of_slice_page_fails_page_validity() {
        let (ctx, mut draft) = drafted(
            "What is the total funding for Program Alpha and Program Beta?",
            ALPHA_BETA,
        );
        draft.evidence.push(EvidenceItem {
            quote: "Program Delta received $3M.".to_string(),
            page: 99,
            quality: EvidenceQuality::Direct,
            evidence_type: EvidenceType::ExplicitStatement,
            relevance_score: 0.9,
            essential: false,
        });
        let report = verify(&draft, &ctx);
        assert!(report.failed.contains(&CheckId::PageValidity));
    }

    #[test]
    fn test_unsourced_number_fails() {
        let (ctx, mut draft) = drafted(
            "How much funding did Program Alpha receive?",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        let trailer = scorer::indicator_line(&draft);
        draft.answer = format!("Program Alpha received $12M in funding. (p. 1)\n{}", trailer);
        let outcome = CheckId::NumberSourcing.run(&draft, &ctx);
        assert!(!outcome.passed);
        assert!(outcome.detail.unwrap().contains("$12M"));
    }

    #[test]
    fn test_number_restated_from_question_is_sourced() {
        let page: &[(u32, &str)] = &[(1, "Program Alpha received $10M in funding.")];
        let body = "In 2024 Program Alpha received $10M in funding. (p. 1)";

        let (ctx, mut draft) = drafted("How much funding did Program Alpha receive in 2024?", page);
        draft.answer = format!("{}\n{}", body, scorer::indicator_line(&draft));
        assert!(CheckId::NumberSourcing.run(&draft, &ctx).passed);

        let (ctx, mut draft) = drafted("How much funding did Program Alpha receive?", page);
        draft.answer = format!("{}\n{}", body, scorer::indicator_line(&draft));
        let outcome = CheckId::NumberSourcing.run(&draft, &ctx);
        assert!(!outcome.passed);
        assert!(outcome.detail.unwrap().contains("2024"));
    }

    #[test]
    fn test_stale_trailer_and_miscalibration() {
        let (ctx, mut draft) = drafted(
            "How much funding did Program Alpha receive?",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        draft.certainty = claimforge_common::models::CertaintyCategory::Low;
        let report = verify(&draft, &ctx);
        assert!(report.failed.contains(&CheckId::CertaintyCalibration));
        assert!(report.failed.contains(&CheckId::InlineIndicators));
    }

    #[test]
    fn test_missing_detection_is_caught() {
        let (ctx, mut draft) = drafted(
            "How did funding for Program Alpha change?",
            &[
                (3, "Funding for Program Alpha increased in 2024."),
                (7, "Funding for Program Alpha decreased in 2024."),
            ],
        );
        draft.contradictions.clear();
        let outcome = CheckId::ContradictionCompleteness.run(&draft, &ctx);
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let (ctx, draft) = drafted(
            "What is the total funding for Program Alpha and Program Beta?",
            ALPHA_BETA,
        );
        let sequential = verify(&draft, &ctx);
        let concurrent = verify_concurrent(Arc::new(draft), Arc::new(ctx)).await.unwrap();
        assert_eq!(sequential, concurrent);
    }
}
