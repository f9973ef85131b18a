//! Metrics and observability utilities
//!
//! Engine metrics go through the `metrics` facade; installing an exporter is
//! left to the embedding application.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ClaimForge metrics
pub const METRICS_PREFIX: &str = "claimforge";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_answers_total", METRICS_PREFIX),
        Unit::Count,
        "Total answer records emitted"
    );

    describe_histogram!(
        format!("{}_answer_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time from question intake to record emission"
    );

    describe_histogram!(
        format!("{}_verification_score", METRICS_PREFIX),
        Unit::Count,
        "Final verification score of emitted records"
    );

    describe_counter!(
        format!("{}_refinement_iterations_total", METRICS_PREFIX),
        Unit::Count,
        "Refinement iterations executed"
    );

    describe_counter!(
        format!("{}_pages_cut_total", METRICS_PREFIX),
        Unit::Count,
        "Pages excluded by the relevance threshold"
    );

    tracing::info!("Metrics registered");
}

/// Tracks one question from intake to emission
pub struct AnswerMetrics {
    start: Instant,
    mode: String,
}

impl AnswerMetrics {
    pub fn start(mode: &str) -> Self {
        Self {
            start: Instant::now(),
            mode: mode.to_string(),
        }
    }

    /// Processing mode is only known after classification
    pub fn set_mode(&mut self, mode: &str) {
        self.mode = mode.to_string();
    }

    /// Record emission of a record
    pub fn finish(self, status: &str, verification_score: f64, refinement_iterations: u32) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_answers_total", METRICS_PREFIX),
            "mode" => self.mode.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_answer_duration_seconds", METRICS_PREFIX),
            "mode" => self.mode.clone()
        )
        .record(duration);

        histogram!(
            format!("{}_verification_score", METRICS_PREFIX),
            "mode" => self.mode
        )
        .record(verification_score);

        if refinement_iterations > 0 {
            counter!(format!("{}_refinement_iterations_total", METRICS_PREFIX))
                .increment(refinement_iterations as u64);
        }
    }
}

/// Helper to record relevance cuts
pub fn record_pages_cut(count: usize) {
    if count > 0 {
        counter!(format!("{}_pages_cut_total", METRICS_PREFIX)).increment(count as u64);
    }
}
