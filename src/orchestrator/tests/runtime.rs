use crate::job::lifecycle::JobLifecycleUpdate;
use crate::orchestrator::*;
use crate::scoring::{EvaluationResult, PARSE_FAILURE_FEEDBACK};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

const NOT_FOUND: &str = "Topic not found: 'Xyzzy' is not available on Wikipedia. Please try a different topic or check the spelling.";

const SCRIPT: &str = r#"{
    "conversation": [
        {"speaker": "Priya", "text": "Namaste doston, aaj hum chai ki baat karenge."},
        {"speaker": "Amit", "text": "Arre wah, mera favourite topic."},
        {"speaker": "Amit", "text": "Arre wah, mera favourite topic."},
        {"speaker": "Priya", "text": "Chai India mein kab aayi, pata hai?"}
    ]
}"#;

const EVALUATION: &str = r#"{
    "scores": {
        "hinglish_quality": {"natural_code_switching": 4, "authentic_expressions": 4},
        "conversational_naturalness": {"turn_taking": 5, "fillers": 3},
        "emotional_expression": {"reactions": 4},
        "content_coherence": {"accuracy": 4, "flow": 4},
        "host_chemistry": {"rapport": 5}
    },
    "strengths": ["Lively banter"],
    "improvements": ["More pauses"],
    "feedback": "Solid episode."
}"#;

struct StaticContent {
    missing: bool,
    calls: AtomicUsize,
}

impl StaticContent {
    fn found() -> Self {
        Self {
            missing: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn missing() -> Self {
        Self {
            missing: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentProvider for StaticContent {
    async fn fetch(&self, topic: &str, lang: &str) -> Result<String, ContentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(lang, "en");
        if self.missing {
            return Err(ContentError::TopicNotFound(NOT_FOUND.to_string()));
        }
        Ok(format!("Title: {topic}\n\nContent:\nA hot beverage."))
    }
}

struct FixedGenerator {
    payload: Result<String, String>,
}

impl FixedGenerator {
    fn ok(payload: &str) -> Self {
        Self {
            payload: Ok(payload.to_string()),
        }
    }
}

#[async_trait]
impl ScriptGenerator for FixedGenerator {
    async fn generate(&self, content: &str) -> Result<String> {
        assert!(content.starts_with("Title: "));
        sleep(Duration::from_millis(5)).await;
        self.payload.clone().map_err(|message| anyhow!(message))
    }
}

struct FixedCritic {
    payload: Result<String, String>,
}

impl FixedCritic {
    fn ok(payload: &str) -> Self {
        Self {
            payload: Ok(payload.to_string()),
        }
    }
}

#[async_trait]
impl ScriptCritic for FixedCritic {
    async fn evaluate(&self, script: &ScriptSequence) -> Result<String> {
        assert!(!script.is_empty());
        self.payload.clone().map_err(|message| anyhow!(message))
    }

    fn model_name(&self) -> Option<String> {
        Some("mock-critic".to_string())
    }
}

struct RecordingSynthesizer {
    fail_at: Option<usize>,
    panic_at: Option<usize>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl RecordingSynthesizer {
    fn new() -> Self {
        Self {
            fail_at: None,
            panic_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::new()
        }
    }

    fn panicking_at(call: usize) -> Self {
        Self {
            panic_at: Some(call),
            ..Self::new()
        }
    }

    fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }
}

fn rendered(request: &SynthesisRequest) -> String {
    format!("<{}|{}>", request.voice, request.text)
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes> {
        let call = {
            let mut requests = self.requests.lock().expect("requests lock poisoned");
            requests.push(request.clone());
            requests.len()
        };
        sleep(Duration::from_millis(2)).await;
        if self.fail_at == Some(call) {
            return Err(anyhow!("voice unavailable"));
        }
        if self.panic_at == Some(call) {
            panic!("voice engine crashed");
        }
        Ok(Bytes::from(rendered(request)))
    }
}

struct MockDrafter {
    fail: bool,
    calls: AtomicUsize,
}

impl MockDrafter {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PromptDrafter for MockDrafter {
    async fn draft(&self, evaluation: &EvaluationResult) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("rate limited"));
        }
        Ok(format!("Improve on {:.2}", evaluation.overall_score))
    }

    fn model_name(&self) -> Option<String> {
        Some("mock-drafter".to_string())
    }
}

struct Fixture {
    dir: TempDir,
    content: Arc<StaticContent>,
    synthesizer: Arc<RecordingSynthesizer>,
    drafter: Arc<MockDrafter>,
    orchestrator: PodcastOrchestrator,
}

struct FixtureBuilder {
    content: StaticContent,
    generator: FixedGenerator,
    critic: FixedCritic,
    synthesizer: RecordingSynthesizer,
    drafter: MockDrafter,
    policy: CollisionPolicy,
}

impl FixtureBuilder {
    fn new() -> Self {
        Self {
            content: StaticContent::found(),
            generator: FixedGenerator::ok(SCRIPT),
            critic: FixedCritic::ok(EVALUATION),
            synthesizer: RecordingSynthesizer::new(),
            drafter: MockDrafter::new(false),
            policy: CollisionPolicy::Overwrite,
        }
    }

    fn build(self) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            collision_policy: self.policy,
            prosody_seed: Some(42),
            ..PipelineConfig::default()
        };
        let content = Arc::new(self.content);
        let synthesizer = Arc::new(self.synthesizer);
        let drafter = Arc::new(self.drafter);
        let orchestrator = PodcastOrchestrator::with_components(
            config,
            content.clone(),
            Arc::new(self.generator),
            Arc::new(self.critic),
            synthesizer.clone(),
            Some(drafter.clone() as Arc<dyn PromptDrafter>),
        );
        Fixture {
            dir,
            content,
            synthesizer,
            drafter,
            orchestrator,
        }
    }
}

async fn finish(handle: JobHandle) -> JobRecord {
    timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("job finishes in time")
        .expect("job is registered")
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read output dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn completes_with_artifact_evaluation_and_prompt() {
    let fixture = FixtureBuilder::new().build();
    let handle = fixture.orchestrator.start_job("Chai Culture").await;
    let id = handle.id();
    let record = finish(handle).await;

    assert_eq!(record.id, id);
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert_eq!(record.message, "Podcast ready!");
    assert_eq!(record.filename.as_deref(), Some("chai_culture.mp3"));

    let evaluation = record.evaluation.expect("evaluation attached");
    assert!(evaluation.error.is_none());
    assert_eq!(evaluation.model_used.as_deref(), Some("mock-critic"));
    assert_eq!(evaluation.script_segments, Some(3));
    // 4*0.25 + 4*0.30 + 4*0.20 + 4*0.15 + 5*0.10
    assert_eq!(evaluation.overall_score, 4.1);

    let prompt = record.improvement_prompt.expect("prompt attached");
    assert_eq!(prompt.prompt.as_deref(), Some("Improve on 4.10"));
    assert_eq!(prompt.model_used.as_deref(), Some("mock-drafter"));
    assert_eq!(prompt.based_on_score, 4.1);
    assert!(prompt.error.is_none());

    assert_eq!(dir_entries(fixture.dir.path()), vec!["chai_culture.mp3"]);
    assert_eq!(fixture.content.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn segments_are_synthesized_and_appended_in_script_order() {
    let fixture = FixtureBuilder::new().build();
    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Completed);

    let requests = fixture.synthesizer.requests();
    assert_eq!(requests.len(), 3);

    let config = PipelineConfig::default();
    assert_eq!(requests[0].voice, config.host_a.voice);
    assert_eq!(requests[1].voice, config.host_b.voice);
    assert_eq!(requests[2].voice, config.host_a.voice);
    assert!(requests[0]
        .text
        .ends_with("Namaste doston, aaj hum chai ki baat karenge."));
    assert!(requests[1].text.ends_with("Arre wah, mera favourite topic."));
    assert!(requests[2].text.contains("Chai India mein kab aayi"));
    for request in &requests {
        assert!(request.rate.ends_with('%'));
        assert!(request.pitch.ends_with("Hz"));
    }

    let expected: String = requests.iter().map(rendered).collect();
    let artifact = std::fs::read(fixture.dir.path().join("chai.mp3")).expect("artifact");
    assert_eq!(artifact, expected.as_bytes());
}

#[tokio::test]
async fn topic_not_found_is_reported_verbatim() {
    let mut builder = FixtureBuilder::new();
    builder.content = StaticContent::missing();
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Xyzzy").await).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.message, NOT_FOUND);
    assert!(record.filename.is_none());
    assert!(record.evaluation.is_none());
    assert!(fixture.synthesizer.requests().is_empty());
}

#[tokio::test]
async fn malformed_script_fails_the_job() {
    for payload in ["not json at all", r#"{"conversation": []}"#, r#"{"title": "x"}"#] {
        let mut builder = FixtureBuilder::new();
        builder.generator = FixedGenerator::ok(payload);
        let fixture = builder.build();

        let record = finish(fixture.orchestrator.start_job("Chai").await).await;
        assert_eq!(record.status, JobStatus::Failed, "payload {payload}");
        assert!(
            record.message.contains("Failed to generate script"),
            "{}",
            record.message
        );
        assert!(record.message.starts_with("Error: "));
        assert!(fixture.synthesizer.requests().is_empty());
    }
}

#[tokio::test]
async fn generator_error_fails_the_job() {
    let mut builder = FixtureBuilder::new();
    builder.generator = FixedGenerator {
        payload: Err("upstream 503".to_string()),
    };
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(
        record.message,
        "Error: Failed to generate script from LLM: upstream 503"
    );
}

#[tokio::test]
async fn malformed_evaluation_still_completes() {
    let mut builder = FixtureBuilder::new();
    builder.critic = FixedCritic::ok("{ definitely not json");
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Completed);

    let evaluation = record.evaluation.expect("evaluation attached");
    assert!(evaluation.error.is_some());
    assert_eq!(evaluation.overall_score, 0.0);
    assert_eq!(evaluation.feedback, PARSE_FAILURE_FEEDBACK);

    assert!(record.improvement_prompt.is_none());
    assert_eq!(fixture.drafter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn array_evaluation_reply_is_degraded() {
    let mut builder = FixtureBuilder::new();
    builder.critic = FixedCritic::ok("[]");
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Completed);
    let evaluation = record.evaluation.expect("evaluation attached");
    assert!(evaluation.error.is_some());
    assert!(record.improvement_prompt.is_none());
    assert_eq!(fixture.drafter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn critic_call_failure_is_recorded_on_the_evaluation() {
    let mut builder = FixtureBuilder::new();
    builder.critic = FixedCritic {
        payload: Err("critic offline".to_string()),
    };
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Completed);
    let evaluation = record.evaluation.expect("evaluation attached");
    assert_eq!(evaluation.feedback, "Evaluation failed: critic offline");
    assert_eq!(evaluation.error.as_deref(), Some("critic offline"));
    assert_eq!(evaluation.model_used.as_deref(), Some("mock-critic"));
}

#[tokio::test]
async fn improvement_prompt_failure_never_flips_completed() {
    let mut builder = FixtureBuilder::new();
    builder.drafter = MockDrafter::new(true);
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    let prompt = record.improvement_prompt.expect("failure recorded");
    assert!(prompt.prompt.is_none());
    assert_eq!(prompt.error.as_deref(), Some("rate limited"));
    assert_eq!(prompt.based_on_score, 4.1);
}

#[tokio::test]
async fn synthesis_failure_fails_and_cleans_up() {
    let mut builder = FixtureBuilder::new();
    builder.synthesizer = RecordingSynthesizer::failing_at(2);
    let fixture = builder.build();

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(
        record.message,
        "Error: Audio synthesis failed at segment 2: voice unavailable"
    );
    assert!(record.filename.is_none());
    // Evaluation happened before synthesis and stays on the record.
    assert!(record.evaluation.is_some());
    assert!(dir_entries(fixture.dir.path()).is_empty());
    assert_eq!(fixture.synthesizer.requests().len(), 2);
}

#[tokio::test]
async fn failed_rerun_keeps_the_earlier_artifact() {
    let mut builder = FixtureBuilder::new();
    builder.synthesizer = RecordingSynthesizer::failing_at(2);
    let fixture = builder.build();
    std::fs::write(fixture.dir.path().join("chai.mp3"), b"previous").expect("seed artifact");

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(dir_entries(fixture.dir.path()), vec!["chai.mp3"]);
    assert_eq!(
        std::fs::read(fixture.dir.path().join("chai.mp3")).expect("untouched"),
        b"previous"
    );
}

#[tokio::test]
async fn panicking_collaborator_fails_the_job() {
    let mut builder = FixtureBuilder::new();
    builder.synthesizer = RecordingSynthesizer::panicking_at(2);
    let fixture = builder.build();
    let mut updates = fixture.orchestrator.subscribe();

    let handle = fixture.orchestrator.start_job("Chai").await;
    let id = handle.id();
    let record = finish(handle).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(
        record.message,
        "Error: Pipeline worker stopped unexpectedly: panicked: voice engine crashed"
    );
    assert!(record.filename.is_none());
    assert!(dir_entries(fixture.dir.path()).is_empty());

    let polled = fixture.orchestrator.job(id).await.expect("registered");
    assert_eq!(polled.status, JobStatus::Failed);

    let mut last = None;
    while let Ok(update) = updates.try_recv() {
        last = Some(update);
    }
    let last = last.expect("lifecycle updates published");
    assert_eq!(last.status, JobStatus::Failed);
    assert!(last.is_terminal());
}

#[tokio::test]
async fn reject_policy_fails_before_synthesis() {
    let mut builder = FixtureBuilder::new();
    builder.policy = CollisionPolicy::Reject;
    let fixture = builder.build();
    std::fs::write(fixture.dir.path().join("chai.mp3"), b"previous").expect("seed artifact");

    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.message, "Error: artifact 'chai.mp3' already exists");
    assert!(fixture.synthesizer.requests().is_empty());
    assert_eq!(
        std::fs::read(fixture.dir.path().join("chai.mp3")).expect("untouched"),
        b"previous"
    );
}

#[tokio::test]
async fn uniquify_policy_keeps_both_artifacts() {
    let mut builder = FixtureBuilder::new();
    builder.policy = CollisionPolicy::Uniquify;
    let fixture = builder.build();

    let first = finish(fixture.orchestrator.start_job("Chai").await).await;
    let second = finish(fixture.orchestrator.start_job("Chai").await).await;
    assert_eq!(first.filename.as_deref(), Some("chai.mp3"));
    assert_eq!(second.filename.as_deref(), Some("chai_2.mp3"));
    assert_eq!(dir_entries(fixture.dir.path()), vec!["chai.mp3", "chai_2.mp3"]);
}

#[tokio::test]
async fn lifecycle_updates_are_monotonic_and_start_pending() {
    let fixture = FixtureBuilder::new().build();
    let mut updates = fixture.orchestrator.subscribe();
    let handle = fixture.orchestrator.start_job("Chai").await;
    let id = handle.id();

    let mut seen: Vec<JobLifecycleUpdate> = Vec::new();
    timeout(Duration::from_secs(5), async {
        loop {
            let update = updates.recv().await.expect("lifecycle channel open");
            if update.job_id != id {
                continue;
            }
            let done = update.is_terminal() && update.progress == 100;
            seen.push(update);
            if done {
                break;
            }
        }
    })
    .await
    .expect("terminal update arrives");
    finish(handle).await;

    assert_eq!(seen.first().map(|update| update.status), Some(JobStatus::Pending));
    assert_eq!(seen[1].status, JobStatus::Processing);
    assert!(seen
        .windows(2)
        .all(|pair| pair[0].progress <= pair[1].progress));
    let last = seen.last().expect("updates");
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.filename.as_deref(), Some("chai.mp3"));
    assert!(seen
        .iter()
        .any(|update| update.message == "Priya's segment is ready!"));
}

#[tokio::test]
async fn polling_is_side_effect_free() {
    let fixture = FixtureBuilder::new().build();
    let handle = fixture.orchestrator.start_job("Chai").await;
    let id = handle.id();
    let record = finish(handle).await;

    let first = fixture.orchestrator.job(id).await.expect("known job");
    let second = fixture.orchestrator.job(id).await.expect("known job");
    assert_eq!(first, record);
    assert_eq!(first, second);
    assert!(fixture.orchestrator.job(uuid::Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn concurrent_jobs_do_not_interfere() {
    let fixture = FixtureBuilder::new().build();
    let topics = ["Chai", "Samosa", "Monsoon"];
    let mut handles = Vec::new();
    for topic in topics {
        handles.push(fixture.orchestrator.start_job(topic).await);
    }

    let mut filenames = Vec::new();
    for handle in handles {
        let record = finish(handle).await;
        assert_eq!(record.status, JobStatus::Completed);
        filenames.push(record.filename.expect("filename"));
    }
    filenames.sort();
    assert_eq!(filenames, vec!["chai.mp3", "monsoon.mp3", "samosa.mp3"]);
    assert_eq!(fixture.synthesizer.requests().len(), 9);
    assert_eq!(fixture.orchestrator.registry().len().await, 3);
    assert_eq!(dir_entries(fixture.dir.path()).len(), 3);
}

#[tokio::test]
async fn completed_artifacts_resolve_by_name() {
    let fixture = FixtureBuilder::new().build();
    let record = finish(fixture.orchestrator.start_job("Chai").await).await;
    let filename = record.filename.expect("filename");

    let path = fixture
        .orchestrator
        .artifact_path(&filename)
        .await
        .expect("artifact resolves");
    assert_eq!(path, fixture.dir.path().join("chai.mp3"));
    assert!(fixture.orchestrator.artifact_path("../chai.mp3").await.is_err());
}
