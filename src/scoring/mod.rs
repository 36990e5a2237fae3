//! 评审结果聚合：逐项评分 → 分类均分 → 加权总分。

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Category weights expressed in whole percent so the table sums to exactly 100.
pub const CATEGORY_WEIGHTS: [(&str, u32); 5] = [
    ("hinglish_quality", 25),
    ("conversational_naturalness", 30),
    ("emotional_expression", 20),
    ("content_coherence", 15),
    ("host_chemistry", 10),
];

pub const MIN_CRITERION_SCORE: u8 = 1;
pub const MAX_CRITERION_SCORE: u8 = 5;

pub const DEFAULT_FEEDBACK: &str = "No feedback provided.";
pub const PARSE_FAILURE_FEEDBACK: &str = "Failed to parse evaluation response.";
pub const EMPTY_SCRIPT_FEEDBACK: &str = "Cannot evaluate empty script.";

pub type CategoryBreakdown = BTreeMap<String, u8>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub score: f64,
    pub breakdown: CategoryBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall_score: f64,
    pub categories: BTreeMap<String, CategoryResult>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_segments: Option<usize>,
}

impl EvaluationResult {
    /// A zero-score result flagged with `error`, used whenever the critic stage degrades.
    pub fn degraded(feedback: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            overall_score: 0.0,
            categories: BTreeMap::new(),
            strengths: Vec::new(),
            improvements: Vec::new(),
            feedback: feedback.into(),
            error: Some(error.into()),
            model_used: None,
            script_segments: None,
        }
    }

    pub fn empty_script() -> Self {
        Self::degraded(EMPTY_SCRIPT_FEEDBACK, "Empty script provided")
    }

    pub fn call_failed(err: &anyhow::Error) -> Self {
        Self::degraded(format!("Evaluation failed: {err}"), err.to_string())
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    pub fn label(&self) -> ScoreLabel {
        ScoreLabel::for_score(self.overall_score)
    }

    pub fn category_score(&self, category: &str) -> f64 {
        self.categories
            .get(category)
            .map(|result| result.score)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreLabel {
    Excellent,
    Great,
    Good,
    Average,
    BelowAverage,
    NeedsImprovement,
}

impl ScoreLabel {
    pub fn for_score(score: f64) -> Self {
        if score >= 4.5 {
            ScoreLabel::Excellent
        } else if score >= 4.0 {
            ScoreLabel::Great
        } else if score >= 3.5 {
            ScoreLabel::Good
        } else if score >= 3.0 {
            ScoreLabel::Average
        } else if score >= 2.0 {
            ScoreLabel::BelowAverage
        } else {
            ScoreLabel::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLabel::Excellent => "Excellent",
            ScoreLabel::Great => "Great",
            ScoreLabel::Good => "Good",
            ScoreLabel::Average => "Average",
            ScoreLabel::BelowAverage => "Below Average",
            ScoreLabel::NeedsImprovement => "Needs Improvement",
        }
    }
}

pub fn category_weight(category: &str) -> f64 {
    CATEGORY_WEIGHTS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, percent)| f64::from(*percent) / 100.0)
        .unwrap_or(0.0)
}

pub fn category_display_name(category: &str) -> &'static str {
    match category {
        "hinglish_quality" => "Hinglish Quality",
        "conversational_naturalness" => "Conversational Flow",
        "emotional_expression" => "Emotional Expression",
        "content_coherence" => "Content & Coherence",
        "host_chemistry" => "Host Chemistry",
        _ => "Other",
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn category_score(breakdown: &CategoryBreakdown) -> f64 {
    if breakdown.is_empty() {
        return 0.0;
    }
    let total: u32 = breakdown.values().map(|score| u32::from(*score)).sum();
    round2(f64::from(total) / breakdown.len() as f64)
}

pub fn overall_score(categories: &BTreeMap<String, CategoryResult>) -> f64 {
    let weighted: f64 = CATEGORY_WEIGHTS
        .iter()
        .map(|(name, percent)| {
            let score = categories.get(*name).map(|c| c.score).unwrap_or(0.0);
            score * f64::from(*percent)
        })
        .sum();
    round2(weighted / 100.0)
}

/// Parses an untrusted critic payload. Never fails: anything that is not a
/// JSON object yields a degraded result with `error` populated and an overall
/// score of zero. Inside the object each field falls back on its own.
pub fn parse_evaluation(payload: &str) -> EvaluationResult {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(target: "scoring", %err, "failed to parse evaluation response");
            return EvaluationResult::degraded(PARSE_FAILURE_FEEDBACK, err.to_string());
        }
    };
    let Some(object) = value.as_object() else {
        let kind = json_kind(&value);
        warn!(target: "scoring", kind, "evaluation response is not an object");
        return EvaluationResult::degraded(
            PARSE_FAILURE_FEEDBACK,
            format!("expected a JSON object, got {kind}"),
        );
    };

    let scores = object.get("scores").and_then(Value::as_object);
    let mut categories = BTreeMap::new();
    for (name, _) in CATEGORY_WEIGHTS {
        let breakdown = scores
            .and_then(|scores| scores.get(name))
            .map(extract_breakdown)
            .unwrap_or_default();
        let score = category_score(&breakdown);
        categories.insert(name.to_string(), CategoryResult { score, breakdown });
    }

    EvaluationResult {
        overall_score: overall_score(&categories),
        categories,
        strengths: string_list(object.get("strengths")),
        improvements: string_list(object.get("improvements")),
        feedback: object
            .get("feedback")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FEEDBACK)
            .to_string(),
        error: None,
        model_used: None,
        script_segments: None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// String entries of an array field; anything else is skipped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_breakdown(value: &Value) -> CategoryBreakdown {
    let Some(object) = value.as_object() else {
        return CategoryBreakdown::new();
    };

    object
        .iter()
        .filter_map(|(criterion, score)| {
            let score = score.as_f64()?;
            let clamped = score
                .round()
                .clamp(f64::from(MIN_CRITERION_SCORE), f64::from(MAX_CRITERION_SCORE));
            Some((criterion.clone(), clamped as u8))
        })
        .collect()
}

pub fn format_summary(evaluation: &EvaluationResult) -> String {
    let mut summary = String::new();
    let _ = writeln!(summary, "PODCAST EVALUATION RESULTS");
    let _ = writeln!(
        summary,
        "Overall Score: {}/5.0 - {}",
        evaluation.overall_score,
        evaluation.label().as_str()
    );
    let _ = writeln!(summary, "Category Scores:");
    for (name, _) in CATEGORY_WEIGHTS {
        let _ = writeln!(
            summary,
            "  - {}: {}/5.0",
            category_display_name(name),
            evaluation.category_score(name)
        );
    }

    if !evaluation.strengths.is_empty() {
        let _ = writeln!(summary, "Strengths:");
        for strength in evaluation.strengths.iter().take(3) {
            let _ = writeln!(summary, "  - {strength}");
        }
    }

    if !evaluation.improvements.is_empty() {
        let _ = writeln!(summary, "Areas to Improve:");
        for improvement in evaluation.improvements.iter().take(3) {
            let _ = writeln!(summary, "  - {improvement}");
        }
    }

    if !evaluation.feedback.is_empty() {
        let _ = writeln!(summary, "Feedback:\n{}", evaluation.feedback);
    }

    summary
}
