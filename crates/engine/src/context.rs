//! Per-question execution context shared by every stage

use std::collections::BTreeSet;
use std::sync::Arc;

use claimforge_common::config::GatheringConfig;
use claimforge_common::models::{page_numbers, EvidenceItem, Page, Question};
use claimforge_common::text::{EntityExtractor, SimilarityProvider};

use crate::gatherer::{Detections, SliceIndex, StreamingDetector};

/// Immutable inputs for answering one question.
///
/// Built once after classification and shared through an `Arc` with
/// blocking-pool workers.
pub struct QuestionContext {
    pub question: Question,
    pub pages: Vec<Page>,
    pub page_numbers: BTreeSet<u32>,
    pub slice: SliceIndex,
    pub extractor: Arc<dyn EntityExtractor>,
    pub similarity: Arc<dyn SimilarityProvider>,
    pub gathering: GatheringConfig,
}

impl QuestionContext {
    pub fn new(
        question: Question,
        pages: Vec<Page>,
        extractor: Arc<dyn EntityExtractor>,
        similarity: Arc<dyn SimilarityProvider>,
        gathering: GatheringConfig,
    ) -> Self {
        let page_numbers = page_numbers(&pages);
        let slice = SliceIndex::new(&pages);
        Self {
            question,
            pages,
            page_numbers,
            slice,
            extractor,
            similarity,
            gathering,
        }
    }

    pub fn page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == number)
    }

    pub fn detector(&self) -> StreamingDetector<'_> {
        StreamingDetector::new(
            &self.question,
            &self.slice,
            self.extractor.as_ref(),
            self.gathering.numeric_tolerance,
        )
    }

    /// Run detection over a fixed evidence list
    pub fn detect(&self, items: &[EvidenceItem]) -> Detections {
        let mut detector = self.detector();
        for item in items {
            detector.push(item);
        }
        detector.finish()
    }
}

impl std::fmt::Debug for QuestionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionContext")
            .field("question", &self.question.text)
            .field("pages", &self.page_numbers)
            .finish()
    }
}
