//! Question and page models

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Question type derived at classification time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Factual,
    Quantitative,
    Temporal,
    Comparative,
    MultiPart,
    Causal,
    Complex,
}

/// How much of the subject the question asks about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionScope {
    Specific,
    Aggregate,
    Comprehensive,
}

/// Reasoner strategy selected for a question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    SimpleFactual,
    QuantitativeSingle,
    QuantitativeAggregate,
    MultiPartDecompose,
    Comparative,
    ComplexReasoning,
    Standard,
}

impl ProcessingMode {
    /// Derive the mode from type and scope
    pub fn select(question_type: QuestionType, scope: QuestionScope) -> Self {
        match (question_type, scope) {
            (QuestionType::Quantitative, QuestionScope::Specific) => ProcessingMode::QuantitativeSingle,
            (QuestionType::Quantitative, _) => ProcessingMode::QuantitativeAggregate,
            (QuestionType::MultiPart, _) => ProcessingMode::MultiPartDecompose,
            (QuestionType::Comparative, _) => ProcessingMode::Comparative,
            (QuestionType::Causal, _) | (QuestionType::Complex, _) => ProcessingMode::ComplexReasoning,
            (QuestionType::Factual, _) => ProcessingMode::SimpleFactual,
            (QuestionType::Temporal, _) => ProcessingMode::Standard,
        }
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::SimpleFactual => "simple_factual",
            ProcessingMode::QuantitativeSingle => "quantitative_single",
            ProcessingMode::QuantitativeAggregate => "quantitative_aggregate",
            ProcessingMode::MultiPartDecompose => "multi_part_decompose",
            ProcessingMode::Comparative => "comparative",
            ProcessingMode::ComplexReasoning => "complex_reasoning",
            ProcessingMode::Standard => "standard",
        }
    }
}

/// A classified question. Immutable once built by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    /// Original question text
    pub text: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub scope: QuestionScope,

    pub mode: ProcessingMode,

    /// Entities named by the question (lowercased)
    pub entities: Vec<String>,

    /// Stemmed key terms
    pub terms: BTreeSet<String>,
}

impl Question {
    pub fn is_quantitative(&self) -> bool {
        self.question_type == QuestionType::Quantitative
    }

    pub fn is_multi_part(&self) -> bool {
        self.mode == ProcessingMode::MultiPartDecompose
    }
}

/// One numbered page of the document slice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Page numbers present in a slice
pub fn page_numbers(pages: &[Page]) -> BTreeSet<u32> {
    pages.iter().map(|p| p.number).collect()
}
