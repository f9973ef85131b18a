//! Evidence gathering
//!
//! Pages are scored and mined for passages on tokio's blocking pool with
//! ordered buffering, so results come back in slice order. Detection then
//! runs single-threaded over the accumulated items.

mod classify;
mod detector;

pub use classify::{classify_passage, extract_passages};
pub use detector::{find_references, Detections, ReferenceMatch, SliceIndex, StreamingDetector};

use std::sync::Arc;

use claimforge_common::metrics::record_pages_cut;
use claimforge_common::models::EvidenceItem;
use claimforge_common::{EngineError, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::context::QuestionContext;
use crate::relevance::{score_page, PageScore};

/// Everything the Gather stage produces
#[derive(Debug, Clone, Default)]
pub struct GatherOutcome {
    /// Sorted by relevance, descending; ties keep gathering order
    pub evidence: Vec<EvidenceItem>,
    pub detections: Detections,
    pub page_scores: Vec<PageScore>,
    pub pages_cut: usize,
}

fn process_page(context: &QuestionContext, index: usize) -> (PageScore, Vec<EvidenceItem>) {
    let page = &context.pages[index];
    let score = score_page(&context.question, page, Some(context.similarity.as_ref()));
    let items = if score.passes() {
        extract_passages(&context.question, page, score.score, &context.gathering)
    } else {
        Vec::new()
    };
    (score, items)
}

/// Gather evidence for the question across every page of the slice
pub async fn gather(context: Arc<QuestionContext>) -> Result<GatherOutcome> {
    let limit = context.gathering.worker_limit();

    let results: Vec<_> = stream::iter(0..context.pages.len())
        .map(|index| {
            let context = Arc::clone(&context);
            tokio::task::spawn_blocking(move || process_page(&context, index))
        })
        .buffered(limit)
        .collect()
        .await;

    let mut page_results = Vec::with_capacity(results.len());
    for result in results {
        let page_result = result.map_err(|e| EngineError::TaskFailed {
            message: format!("page worker failed: {}", e),
        })?;
        page_results.push(page_result);
    }

    Ok(assemble(&context, page_results))
}

/// Sequential equivalent of [`gather`]
pub fn gather_blocking(context: &QuestionContext) -> GatherOutcome {
    let page_results = (0..context.pages.len())
        .map(|index| process_page(context, index))
        .collect();
    assemble(context, page_results)
}

fn assemble(
    context: &QuestionContext,
    page_results: Vec<(PageScore, Vec<EvidenceItem>)>,
) -> GatherOutcome {
    let mut detector = context.detector();
    let mut evidence = Vec::new();
    let mut page_scores = Vec::with_capacity(page_results.len());
    let mut pages_cut = 0;

    for (score, items) in page_results {
        debug!(
            page = score.page,
            score = score.score,
            passages = items.len(),
            "Page scored"
        );
        if !score.passes() {
            pages_cut += 1;
        }
        for item in items {
            detector.push(&item);
            evidence.push(item);
        }
        page_scores.push(score);
    }

    // Vec::sort_by is stable, so ties keep gathering order
    evidence.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    let detections = detector.finish();
    record_pages_cut(pages_cut);

    info!(
        items = evidence.len(),
        pages_cut,
        contradictions = detections.contradictions.len(),
        cross_references = detections.cross_references.len(),
        ambiguities = detections.ambiguities.len(),
        "Evidence gathered"
    );

    GatherOutcome {
        evidence,
        detections,
        page_scores,
        pages_cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::QuestionClassifier;
    use claimforge_common::config::GatheringConfig;
    use claimforge_common::models::Page;
    use claimforge_common::text::{LexicalEntityExtractor, LexicalSimilarity};

    fn context(question: &str, pages: Vec<Page>) -> Arc<QuestionContext> {
        let extractor = Arc::new(LexicalEntityExtractor::new());
        let question = QuestionClassifier::new(extractor.clone()).classify(question);
        Arc::new(QuestionContext::new(
            question,
            pages,
            extractor,
            Arc::new(LexicalSimilarity::new()),
            GatheringConfig::default(),
        ))
    }

    fn pages() -> Vec<Page> {
        vec![
            Page::new(3, "Funding for Program Alpha increased in 2024."),
            Page::new(5, "The cafeteria menu changed."),
            Page::new(7, "Funding for Program Alpha decreased in 2024."),
        ]
    }

    #[tokio::test]
    async fn test_gather_cuts_and_detects() {
        let ctx = context("How did funding for Program Alpha change?", pages());
        let outcome = gather(ctx).await.unwrap();

        assert_eq!(outcome.pages_cut, 1);
        assert_eq!(outcome.evidence.len(), 2);
        assert_eq!(outcome.evidence[0].page, 3);
        assert_eq!(outcome.detections.contradictions.len(), 1);
        assert_eq!(outcome.page_scores.len(), 3);
    }

    #[tokio::test]
    async fn test_gathering_is_deterministic() {
        let ctx = context("How did funding for Program Alpha change?", pages());
        let concurrent = gather(Arc::clone(&ctx)).await.unwrap();
        let again = gather(Arc::clone(&ctx)).await.unwrap();
        let sequential = gather_blocking(&ctx);

        assert_eq!(concurrent.evidence, again.evidence);
        assert_eq!(concurrent.evidence, sequential.evidence);
        assert_eq!(concurrent.detections, sequential.detections);
    }

    #[tokio::test]
    async fn test_empty_relevance_yields_no_evidence() {
        let ctx = context(
            "Who chairs the oversight board?",
            vec![Page::new(1, "Program Alpha received $10M.")],
        );
        let outcome = gather(ctx).await.unwrap();
        assert!(outcome.evidence.is_empty());
        assert_eq!(outcome.pages_cut, 1);
    }
}
