use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::orchestrator::types::JobStatus;
use crate::scoring::EvaluationResult;

pub(crate) const TARGET: &str = "telemetry::job";
pub(crate) const EVENT_TRANSITION: &str = "job_transition";
pub(crate) const EVENT_PROGRESS: &str = "job_progress";
pub(crate) const EVENT_EVALUATION: &str = "job_evaluation";

#[derive(Debug, Serialize)]
pub struct JobTransitionEvent<'a> {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JobProgressEvent<'a> {
    pub job_id: Uuid,
    pub progress: u8,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JobEvaluationEvent<'a> {
    pub job_id: Uuid,
    pub overall_score: f64,
    pub label: &'static str,
    pub degraded: bool,
    pub script_segments: Option<usize>,
    pub model_used: Option<&'a str>,
}

pub fn record_job_transition(job_id: Uuid, from: JobStatus, to: JobStatus, message: &str) {
    let event = JobTransitionEvent {
        job_id,
        from,
        to,
        message,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_TRANSITION,
            %job_id,
            from = from.as_str(),
            to = to.as_str(),
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_TRANSITION,
            %err,
            "failed to encode job transition event"
        ),
    }
}

pub fn record_job_progress(job_id: Uuid, progress: u8, message: &str) {
    let event = JobProgressEvent {
        job_id,
        progress,
        message,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_PROGRESS,
            %job_id,
            progress,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_PROGRESS,
            %err,
            "failed to encode job progress event"
        ),
    }
}

pub fn record_evaluation(job_id: Uuid, evaluation: &EvaluationResult) {
    let event = JobEvaluationEvent {
        job_id,
        overall_score: evaluation.overall_score,
        label: evaluation.label().as_str(),
        degraded: evaluation.is_degraded(),
        script_segments: evaluation.script_segments,
        model_used: evaluation.model_used.as_deref(),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_EVALUATION,
            %job_id,
            overall_score = event.overall_score,
            degraded = event.degraded,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_EVALUATION,
            %err,
            "failed to encode evaluation event"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_event_serializes_lowercase_states() {
        let event = JobTransitionEvent {
            job_id: Uuid::nil(),
            from: JobStatus::Pending,
            to: JobStatus::Processing,
            message: "Initializing podcast generation...",
        };
        let payload = serde_json::to_value(&event).expect("encode");
        assert_eq!(payload["from"], "pending");
        assert_eq!(payload["to"], "processing");
    }

    #[test]
    fn evaluation_event_flags_degraded_results() {
        let evaluation = EvaluationResult::empty_script();
        let event = JobEvaluationEvent {
            job_id: Uuid::nil(),
            overall_score: evaluation.overall_score,
            label: evaluation.label().as_str(),
            degraded: evaluation.is_degraded(),
            script_segments: None,
            model_used: None,
        };
        let payload = serde_json::to_value(&event).expect("encode");
        assert_eq!(payload["degraded"], true);
        assert_eq!(payload["overall_score"], 0.0);
    }
}
