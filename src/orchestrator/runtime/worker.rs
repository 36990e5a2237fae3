use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::error::PipelineError;
use crate::orchestrator::types::{ImprovementPrompt, ScriptSequence};
use crate::progress::{ProgressSink, ProgressStage};
use crate::prosody::ProsodyGenerator;
use crate::scoring::{format_summary, parse_evaluation, EvaluationResult};
use crate::script::ScriptNormalizer;
use crate::synthesis::{render_script, ArtifactStore};
use crate::telemetry::events::record_evaluation;

use super::reporter::JobReporter;
use super::Collaborators;

pub(crate) struct PipelineWorker {
    job_id: Uuid,
    topic: String,
    config: Arc<PipelineConfig>,
    collaborators: Arc<Collaborators>,
    artifacts: ArtifactStore,
    reporter: JobReporter,
}

impl PipelineWorker {
    pub(crate) fn new(
        job_id: Uuid,
        topic: String,
        config: Arc<PipelineConfig>,
        collaborators: Arc<Collaborators>,
        artifacts: ArtifactStore,
        reporter: JobReporter,
    ) -> Self {
        Self {
            job_id,
            topic,
            config,
            collaborators,
            artifacts,
            reporter,
        }
    }

    /// Runs the job on its own task. A supervising task fails the job if the
    /// worker panics or is cancelled, so the record never stays `Processing`.
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        let job_id = self.job_id;
        let supervisor = self.reporter.clone();
        tokio::spawn(async move {
            let Err(err) = tokio::spawn(self.run()).await else {
                return;
            };
            let failure = PipelineError::WorkerAborted(abort_reason(err));
            error!(
                target: "pipeline_worker",
                job_id = %job_id,
                kind = failure.kind(),
                error = %failure,
                "job worker aborted"
            );
            if let Some(change) = supervisor
                .registry()
                .fail(job_id, failure.job_message())
                .await
            {
                supervisor.publish(&change);
            }
        })
    }

    async fn run(mut self) {
        info!(
            target: "pipeline_worker",
            job_id = %self.job_id,
            topic = %self.topic,
            "job started"
        );

        match self.execute().await {
            Ok(evaluation) => {
                info!(
                    target: "pipeline_worker",
                    job_id = %self.job_id,
                    "job completed"
                );
                self.draft_improvement_prompt(&evaluation).await;
            }
            Err(err) => {
                error!(
                    target: "pipeline_worker",
                    job_id = %self.job_id,
                    kind = err.kind(),
                    error = %err,
                    "job failed"
                );
                if let Some(change) = self
                    .reporter
                    .registry()
                    .fail(self.job_id, err.job_message())
                    .await
                {
                    self.reporter.publish(&change);
                }
            }
        }
    }

    /// Runs every stage up to and including completion. Returns the
    /// evaluation so the best-effort prompt drafting can follow.
    async fn execute(&mut self) -> Result<EvaluationResult, PipelineError> {
        self.reporter.report(ProgressStage::Initializing).await;
        self.reporter.report(ProgressStage::FetchingContent).await;
        let content = self
            .collaborators
            .content
            .fetch(&self.topic, &self.config.content_lang)
            .await?;

        self.reporter.report(ProgressStage::AnalyzingContent).await;
        self.reporter.report(ProgressStage::PreparingScript).await;
        self.reporter.report(ProgressStage::GeneratingScript).await;
        let payload = self
            .collaborators
            .generator
            .generate(&content)
            .await
            .map_err(PipelineError::ScriptGeneration)?;
        let script = ScriptNormalizer::from_config(&self.config).normalize(&payload)?;
        self.reporter
            .report(ProgressStage::ScriptReady {
                segments: script.len(),
            })
            .await;

        self.reporter.report(ProgressStage::Evaluating).await;
        let evaluation = self.evaluate(&script).await;
        if let Some(change) = self
            .reporter
            .registry()
            .attach_evaluation(self.job_id, evaluation.clone())
            .await
        {
            self.reporter.publish(&change);
        }

        self.reporter.report(ProgressStage::StartingAudio).await;
        let reservation = self.artifacts.reserve(&self.topic).await?;
        let mut prosody = ProsodyGenerator::from_config(&self.config);
        render_script(
            &script,
            self.collaborators.synthesizer.as_ref(),
            &mut prosody,
            &self.config,
            reservation.path(),
            &mut self.reporter,
        )
        .await?;

        if !self.artifacts.is_present(&reservation).await {
            return Err(PipelineError::MissingArtifact(
                reservation.filename().to_string(),
            ));
        }

        self.reporter.report(ProgressStage::Ready).await;
        if let Some(change) = self
            .reporter
            .registry()
            .complete(self.job_id, reservation.filename().to_string())
            .await
        {
            self.reporter.publish(&change);
        }

        Ok(evaluation)
    }

    async fn evaluate(&self, script: &ScriptSequence) -> EvaluationResult {
        let critic = &self.collaborators.critic;
        let mut evaluation = if script.is_empty() {
            EvaluationResult::empty_script()
        } else {
            match critic.evaluate(script).await {
                Ok(payload) => parse_evaluation(&payload),
                Err(err) => {
                    warn!(
                        target: "pipeline_worker",
                        job_id = %self.job_id,
                        error = %err,
                        "script evaluation call failed"
                    );
                    EvaluationResult::call_failed(&err)
                }
            }
        };
        evaluation.model_used = critic.model_name();
        evaluation.script_segments = Some(script.len());

        record_evaluation(self.job_id, &evaluation);
        info!(
            target: "scoring",
            job_id = %self.job_id,
            "{}",
            format_summary(&evaluation)
        );
        evaluation
    }

    async fn draft_improvement_prompt(&self, evaluation: &EvaluationResult) {
        let Some(drafter) = self.collaborators.drafter.as_ref() else {
            return;
        };
        if evaluation.is_degraded() {
            info!(
                target: "pipeline_worker",
                job_id = %self.job_id,
                "skipping improvement prompt for degraded evaluation"
            );
            return;
        }

        let prompt = match drafter.draft(evaluation).await {
            Ok(text) => ImprovementPrompt {
                prompt: Some(text),
                model_used: drafter.model_name(),
                based_on_score: evaluation.overall_score,
                error: None,
            },
            Err(err) => {
                warn!(
                    target: "pipeline_worker",
                    job_id = %self.job_id,
                    error = %err,
                    "improvement prompt drafting failed"
                );
                ImprovementPrompt {
                    prompt: None,
                    model_used: drafter.model_name(),
                    based_on_score: evaluation.overall_score,
                    error: Some(err.to_string()),
                }
            }
        };

        if let Some(change) = self
            .reporter
            .registry()
            .attach_improvement_prompt(self.job_id, prompt)
            .await
        {
            self.reporter.publish(&change);
        }
    }
}

fn abort_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return "worker task was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
