//! Refinement loop - bounded fix / rescore / re-verify cycles
//!
//! Each iteration applies the fix registered for every failed check, in
//! registry order, then rescores and runs a full verification pass. The loop
//! stops on a passing report, at a fixed point, at the iteration cap or at
//! the caller's deadline. Whatever stops it, the best attempt is emitted.

mod fixes;

pub use fixes::{fix_for, Fix, FixContext};

use std::time::Instant;

use claimforge_common::config::RefinementConfig;
use claimforge_common::models::{AnswerStatus, DraftAnswer, Stage};
use tracing::{debug, info, warn};

use crate::context::QuestionContext;
use crate::scorer;
use crate::verifier::{verify, VerificationReport};

#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub draft: DraftAnswer,
    pub report: VerificationReport,
    /// Fix passes actually executed
    pub iterations: u32,
    /// Stages executed by the loop, in order
    pub stages: Vec<Stage>,
    /// Emitted without a passing verification
    pub degraded: bool,
    /// Stopped by the caller's deadline
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct RefinementLoop {
    max_iterations: u32,
}

impl RefinementLoop {
    pub fn new(config: &RefinementConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
        }
    }

    /// Refine a scored, verified draft
    pub fn run(
        &self,
        draft: DraftAnswer,
        report: VerificationReport,
        context: &QuestionContext,
        deadline: Option<Instant>,
    ) -> RefinementOutcome {
        let fx = FixContext { question: context };
        let mut stages = Vec::new();
        let mut iterations = 0;
        let mut timed_out = false;

        let mut current = draft;
        let mut current_report = report;
        let mut best = (current.clone(), current_report.clone());

        while iterations < self.max_iterations && !current_report.passed() {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                debug!(iterations, "Refinement deadline reached");
                timed_out = true;
                break;
            }

            let mut fixed = current.clone();
            for id in &current_report.failed {
                fixed = fix_for(*id)(&fixed, &fx);
            }
            let fixed = scorer::attach_indicators(scorer::score(fixed, &context.question));
            iterations += 1;
            stages.push(Stage::Refine);

            if fixed == current {
                debug!(iteration = iterations, "Fixes reached a fixed point");
                break;
            }

            let report = verify(&fixed, context);
            stages.push(Stage::Verify);
            debug!(
                iteration = iterations,
                score = report.verification_score,
                failed = report.failed.len(),
                "Refinement iteration verified"
            );

            current = fixed;
            current_report = report;
            if current_report.verification_score >= best.1.verification_score {
                best = (current.clone(), current_report.clone());
            }
        }

        let (mut draft, mut report) = best;
        let degraded = !report.passed();

        if degraded {
            if draft.status == AnswerStatus::Complete {
                draft.status = AnswerStatus::Partial;
            }
            for id in &report.failed {
                draft.push_suggestion(format!("Verification check failed: {}", id.as_str()));
            }
            if timed_out {
                draft.push_reasoning("Refinement stopped at the deadline; the best attempt is reported.");
            }
            draft = scorer::attach_indicators(scorer::score(draft, &context.question));
            report = verify(&draft, context);
            stages.push(Stage::Verify);
            warn!(
                score = report.verification_score,
                failed = ?report.failed.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
                "Emitting answer below the verification threshold"
            );
        } else if iterations > 0 {
            info!(iterations, score = report.verification_score, "Refinement converged");
        }

        RefinementOutcome {
            draft,
            report,
            iterations,
            stages,
            degraded,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::tests::reasoned;
    use crate::verifier::CheckId;
    use claimforge_common::models::{EvidenceItem, EvidenceQuality, EvidenceType};

    fn injected() -> (QuestionContext, DraftAnswer) {
        let (ctx, draft) = reasoned(
            "How much funding did Program Alpha receive?",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        let mut draft = scorer::attach_indicators(scorer::score(draft, &ctx.question));
        draft.evidence.push(EvidenceItem {
            quote: "Program Alpha received $12M in funding.".to_string(),
            page: 99,
            quality: EvidenceQuality::Direct,
            evidence_type: EvidenceType::ExplicitStatement,
            relevance_score: 0.95,
            essential: false,
        });
        draft.answer = format!("Program Alpha received $12M in funding. (p. 99)\n{}", draft.answer);
        (ctx, draft)
    }

    fn config(max_iterations: u32) -> RefinementConfig {
        RefinementConfig {
            max_iterations,
            timeout_ms: None,
        }
    }

    #[test]
    fn test_foreign_page_is_removed() {
        let (ctx, draft) = injected();
        let report = verify(&draft, &ctx);
        assert!(report.failed.contains(&CheckId::PageValidity));
        assert!(!report.passed());

        let outcome = RefinementLoop::new(&config(2)).run(draft, report, &ctx, None);
        assert!(outcome.iterations >= 1);
        assert!(outcome.iterations <= 2);
        assert!(outcome.draft.evidence.iter().all(|e| e.page != 99));
        assert!(!outcome.draft.answer.contains("(p. 99)"));
        assert!(outcome.report.passed());
        assert!(!outcome.degraded);
        assert_eq!(outcome.stages.first(), Some(&Stage::Refine));
    }

    #[test]
    fn test_zero_cap_degrades_without_iterating() {
        let (ctx, draft) = injected();
        let report = verify(&draft, &ctx);

        let outcome = RefinementLoop::new(&config(0)).run(draft, report, &ctx, None);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.degraded);
        assert_eq!(outcome.draft.status, AnswerStatus::Partial);
        assert!(outcome
            .draft
            .suggestions
            .iter()
            .any(|s| s == "Verification check failed: page_validity"));
    }

    #[test]
    fn test_expired_deadline_emits_best_attempt() {
        let (ctx, draft) = injected();
        let report = verify(&draft, &ctx);
        let deadline = Instant::now();

        let outcome = RefinementLoop::new(&config(2)).run(draft, report, &ctx, Some(deadline));
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.degraded);
        assert!(outcome.timed_out);
        assert!(outcome.draft.reasoning.iter().any(|r| r.contains("deadline")));
    }

    #[test]
    fn test_passing_draft_is_untouched() {
        let (ctx, draft) = reasoned(
            "How much funding did Program Alpha receive?",
            &[(1, "Program Alpha received $10M in funding.")],
        );
        let draft = scorer::attach_indicators(scorer::score(draft, &ctx.question));
        let report = verify(&draft, &ctx);
        let outcome = RefinementLoop::new(&config(2)).run(draft.clone(), report, &ctx, None);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.stages.is_empty());
        assert_eq!(outcome.draft, draft);
    }
}
