//! Per-session log of answer records, kept both structured and raw

use chrono::{DateTime, Utc};
use claimforge_common::models::AnswerRecord;
use claimforge_common::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// One logged record. `record` is absent when the raw text failed to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub raw: String,
    pub record: Option<AnswerRecord>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordLog {
    entries: Vec<LoggedRecord>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a record emitted by the engine
    pub fn push_record(&mut self, question: &str, record: &AnswerRecord) -> Result<Uuid> {
        let raw = serde_json::to_string_pretty(record)?;
        let id = Uuid::new_v4();
        self.entries.push(LoggedRecord {
            id,
            timestamp: Utc::now(),
            question: question.to_string(),
            raw,
            record: Some(record.clone()),
            error: None,
        });
        debug!(%id, "Record logged");
        Ok(id)
    }

    /// Log raw record text from outside the engine.
    ///
    /// Text that fails to parse or validate is kept verbatim with the error
    /// and the error is returned.
    pub fn ingest_raw(&mut self, question: &str, raw: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let parsed = AnswerRecord::parse(raw);

        let (record, error) = match &parsed {
            Ok(record) => (Some(record.clone()), None),
            Err(e) => {
                warn!(%id, error = %e, "Ingested record rejected");
                (None, Some(e.to_string()))
            }
        };
        self.entries.push(LoggedRecord {
            id,
            timestamp: Utc::now(),
            question: question.to_string(),
            raw: raw.to_string(),
            record,
            error,
        });

        parsed.map(|_| id)
    }

    /// Successfully parsed records, in log order
    pub fn structured(&self) -> Vec<&AnswerRecord> {
        self.entries.iter().filter_map(|e| e.record.as_ref()).collect()
    }

    /// Every raw text, newline-joined
    pub fn raw(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> &[LoggedRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
