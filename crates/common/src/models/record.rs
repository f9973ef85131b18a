//! The emitted answer record (wire contract)

use serde::{Deserialize, Serialize};

use super::answer::{
    AnswerStatus, CertaintyCategory, DraftAnswer, InferenceStep, NumericalMetadata, ScopeRecord,
};
use super::evidence::{AmbiguityType, Contradiction, CrossReference, EvidenceItem};
use super::question::ProcessingMode;
use crate::errors::{EngineError, Result};

/// Orchestrator stages, in execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Gather,
    Reason,
    Draft,
    Verify,
    Refine,
    Emit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Gather => "gather",
            Stage::Reason => "reason",
            Stage::Draft => "draft",
            Stage::Verify => "verify",
            Stage::Refine => "refine",
            Stage::Emit => "emit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingMetadata {
    pub mode: ProcessingMode,
    pub stages_executed: Vec<Stage>,
    pub verification_score: f64,
    pub refinement_iterations: u32,
}

impl ProcessingMetadata {
    pub fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            stages_executed: Vec::new(),
            verification_score: 0.0,
            refinement_iterations: 0,
        }
    }

    pub fn record_stage(&mut self, stage: Stage) {
        self.stages_executed.push(stage);
    }
}

/// Collapsed view of the ambiguity flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbiguitySummary {
    pub detected: bool,
    #[serde(rename = "type")]
    pub kind: Option<AmbiguityType>,
    pub note: String,
}

/// Final structured answer record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    pub answer: String,
    pub evidence: Vec<EvidenceItem>,
    pub completeness: f64,
    pub certainty: CertaintyCategory,
    pub certainty_score: f64,
    pub status: AnswerStatus,
    pub reasoning: String,
    pub scope: ScopeRecord,
    pub contradictions: Vec<Contradiction>,
    pub inference_chain: Vec<InferenceStep>,
    pub numerical_metadata: Vec<NumericalMetadata>,
    pub cross_references: Vec<CrossReference>,
    pub ambiguity: AmbiguitySummary,
    pub suggestions: Vec<String>,
    pub processing_metadata: ProcessingMetadata,
}

impl AnswerRecord {
    /// Flatten a scored draft into the wire record
    pub fn from_draft(draft: DraftAnswer, metadata: ProcessingMetadata) -> Self {
        let mut notes = draft.reasoning;
        notes.extend(
            draft
                .assumptions
                .iter()
                .map(|a| format!("Assumption: {}", a)),
        );

        let ambiguity = AmbiguitySummary {
            detected: !draft.ambiguities.is_empty(),
            kind: draft.ambiguities.first().map(|a| a.kind),
            note: draft
                .ambiguities
                .iter()
                .map(|a| a.note.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        };

        Self {
            answer: draft.answer,
            evidence: draft.evidence,
            completeness: draft.completeness,
            certainty: draft.certainty,
            certainty_score: draft.certainty_score,
            status: draft.status,
            reasoning: notes.join(" "),
            scope: draft.scope,
            contradictions: draft.contradictions,
            inference_chain: draft.inference_chain,
            numerical_metadata: draft.numerical_metadata,
            cross_references: draft.cross_references,
            ambiguity,
            suggestions: draft.suggestions,
            processing_metadata: metadata,
        }
    }

    /// Parse a record from raw JSON, tolerating a surrounding code fence.
    ///
    /// Missing required fields and contract violations are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let json = strip_code_fence(raw);
        let record: AnswerRecord = serde_json::from_str(json).map_err(|e| {
            match missing_field_name(&e.to_string()) {
                Some(field) => EngineError::MissingField { field },
                None => EngineError::Serialization(e),
            }
        })?;
        record.validate()?;
        Ok(record)
    }

    /// Check value ranges and certainty calibration
    pub fn validate(&self) -> Result<()> {
        if self.answer.trim().is_empty() {
            return Err(EngineError::InvalidRecord {
                message: "answer is empty".to_string(),
            });
        }

        check_unit("certainty_score", self.certainty_score)?;
        check_unit("completeness", self.completeness)?;
        check_unit(
            "processing_metadata.verification_score",
            self.processing_metadata.verification_score,
        )?;

        for (i, item) in self.evidence.iter().enumerate() {
            if item.quote.trim().is_empty() {
                return Err(EngineError::InvalidRecord {
                    message: format!("evidence[{}].quote is empty", i),
                });
            }
            check_unit(&format!("evidence[{}].relevance_score", i), item.relevance_score)?;
        }

        if CertaintyCategory::from_score(self.certainty_score) != self.certainty {
            return Err(EngineError::CalibrationViolation {
                category: self.certainty.as_str().to_string(),
                score: self.certainty_score,
            });
        }

        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidRecord {
            message: format!("{} out of range: {}", field, value),
        })
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```)
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn missing_field_name(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
