//! Data model shared by the engine stages and the emitted record

mod answer;
mod evidence;
mod markup;
mod question;
mod record;

pub use answer::{
    AnswerStatus, CertaintyCategory, Component, DraftAnswer, InferenceStep, NumericalMetadata,
    PartAnswer, Precision, ScopeAlignment, ScopeRecord, NOT_FOUND_ANSWER,
};
pub use evidence::{
    AmbiguityFlag, AmbiguityType, Contradiction, ContradictionType, CrossReference, EvidenceItem,
    EvidenceQuality, EvidenceRef, EvidenceType,
};
pub use markup::{
    cite, cited_pages, has_stray_indicators, parse_indicators, render_indicators,
    retain_citations, split_indicators, strip_citations, strip_indicators, Indicators,
};
pub use question::{page_numbers, Page, ProcessingMode, Question, QuestionScope, QuestionType};
pub use record::{
    strip_code_fence, AmbiguitySummary, AnswerRecord, ProcessingMetadata, Stage,
};
