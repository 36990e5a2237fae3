//! 各角色的提示词模板。

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::orchestrator::types::{ScriptSequence, Speaker};
use crate::scoring::EvaluationResult;

pub const SCRIPT_SYSTEM_PROMPT: &str = r#"You are a scriptwriter for a Hinglish podcast featuring two best friends, [Priya] and [Amit], chatting casually like they are sitting at a chai tapri. Write natural, flowing Hindi-English conversation the way real Indian friends talk.

HOSTS:
1. Priya (Female): curious and expressive, asks "kyun?" and "kaise?", says "yaar", "accha accha", "haan bola na".
2. Amit (Male): knowledgeable but chill, explains simply, says "dekh", "samajh", "simple hai", "pata hai na".

STYLE:
- Roughly 70% Hindi in Roman script and 30% English.
- Hindi sentence structure with the verb at the end.
- Real back-and-forth with interruptions, reactions before answers and friendly teasing. Never a lecture.
- Short turns of at most two or three sentences. At most 280 words in total, under two minutes spoken.
- End naturally ("Accha chal, baad mein aur bataunga").

OUTPUT:
Return JSON with a "conversation" key holding 15 to 20 dialogue objects (never more than 20):
{"conversation": [
  {"speaker": "Amit", "text": "Arre yaar, tune NASA wala news dekha kya?"},
  {"speaker": "Priya", "text": "Haan haan, space wala? Kya hua usme?"}
]}"#;

pub fn script_user_prompt(content: &str) -> String {
    format!("Topic Content:\n{content}\n\nGenerate the Gen-Z Hinglish podcast script now.")
}

pub const CRITIC_SYSTEM_PROMPT: &str = "You are an expert evaluator for Hinglish podcast conversations. \
Critically assess the naturalness and quality of dialogue between two podcast hosts. \
You understand Hindi and English and are familiar with Gen-Z Indian communication patterns. \
Be fair but critical and give specific, actionable feedback. \
Always respond with valid JSON in the exact format requested.";

/// Every rated criterion, grouped by category.
pub const CRITIC_RUBRIC: [(&str, &[(&str, &str)]); 5] = [
    (
        "hinglish_quality",
        &[
            ("code_mixing_naturalness", "How naturally Hindi and English are blended"),
            ("cultural_appropriateness", "Reflects Gen-Z Indian communication patterns"),
            ("romanized_hindi_fluency", "Natural handling and spelling of romanized Hindi"),
        ],
    ),
    (
        "conversational_naturalness",
        &[
            ("human_likeness", "Sounds like real people talking, not robotic or formal"),
            ("natural_imperfections", "Includes ums, hmms and self-corrections"),
            ("filler_words_usage", "Appropriate use of yaar, bhai, like, basically"),
            ("turn_taking_flow", "Hosts respond to each other instead of monologuing"),
        ],
    ),
    (
        "emotional_expression",
        &[
            ("emotional_variation", "Excitement, humor, curiosity and surprise where fitting"),
            ("pacing_markers", "Pauses, emphasis and varied sentence lengths"),
        ],
    ),
    (
        "content_coherence",
        &[
            ("topic_coherence", "Stays on topic while allowing natural tangents"),
            ("information_accuracy", "Content seems factually reasonable"),
            ("avoids_ai_telltales", "No repetitive phrasing or typical AI patterns"),
        ],
    ),
    (
        "host_chemistry",
        &[
            ("distinct_personalities", "Each host has a recognisable voice"),
            ("playful_banter", "Teasing, jokes and friendly interplay"),
        ],
    ),
];

pub fn critic_user_prompt(script: &ScriptSequence, host_a: &str, host_b: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Evaluate the following Hinglish podcast conversation between {host_a} and {host_b}."
    );
    let _ = writeln!(prompt, "\n=== PODCAST SCRIPT ===");
    for line in script {
        let name = match line.speaker {
            Speaker::HostA => host_a,
            Speaker::HostB => host_b,
        };
        let _ = writeln!(prompt, "{name}: {}", line.text);
    }
    let _ = writeln!(prompt, "=== END SCRIPT ===\n");
    let _ = writeln!(
        prompt,
        "Score every criterion from 1 (poor, robotic) to 5 (indistinguishable from human)."
    );

    let mut index = 1;
    for (category, criteria) in CRITIC_RUBRIC {
        let _ = writeln!(prompt, "\n[{category}]");
        for (criterion, description) in criteria {
            let _ = writeln!(prompt, "{index}. {criterion}: {description}");
            index += 1;
        }
    }

    let _ = writeln!(
        prompt,
        "\nReturn a JSON object shaped as {{\"scores\": {{<category>: {{<criterion>: <1-5>}}}}, \
\"strengths\": [3 items], \"improvements\": [3 items], \"feedback\": \"2-3 sentences\"}}."
    );
    prompt
}

pub const DRAFTER_SYSTEM_PROMPT: &str = "You are an expert prompt engineer for conversational AI. \
Write a single XML-structured prompt that an AI assistant can use to improve a Hinglish podcast generation system. \
Never mention file names, function names or code. \
Describe conceptual improvements in natural language, prioritise them by evaluation score, \
include concrete examples of desired Hinglish dialogue and preserve the listed strengths. \
Output only the prompt itself.";

pub fn improvement_user_prompt(evaluation: &EvaluationResult) -> String {
    let mut categories = String::new();
    for (name, result) in &evaluation.categories {
        let breakdown = result
            .breakdown
            .iter()
            .map(|(criterion, score)| format!("{criterion}: {score}/5"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(categories, "- {name}: {}/5.0 ({breakdown})", result.score);
    }
    if categories.is_empty() {
        categories.push_str("No category data available\n");
    }

    let bullets = |items: &[String]| {
        if items.is_empty() {
            "- None identified\n".to_string()
        } else {
            items.iter().map(|item| format!("- {item}\n")).collect()
        }
    };

    format!(
        "Generate an AI-assistant-style improvement prompt using XML structure.\n\n\
<current_evaluation>\n  <overall_score>{score}/5.0</overall_score>\n  <category_scores>\n{categories}  </category_scores>\n  \
<strengths>\n{strengths}  </strengths>\n  <improvements_needed>\n{improvements}  </improvements_needed>\n  \
<critic_feedback>{feedback}</critic_feedback>\n</current_evaluation>\n\n\
Structure the answer as <objective>, <context>, <current_issues>, <desired_improvements> \
(each <improvement priority=\"high|medium|low\"> with <area>, <description>, <examples>), \
<constraints> and <success_criteria>. Keep it reusable for any podcast topic.",
        score = evaluation.overall_score,
        strengths = bullets(&evaluation.strengths),
        improvements = bullets(&evaluation.improvements),
        feedback = evaluation.feedback,
    )
}

fn think_block() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").ok())
        .as_ref()
}

/// Drops `<think>...</think>` reasoning blocks from a model reply.
pub fn strip_think_blocks(text: &str) -> String {
    match think_block() {
        Some(pattern) if text.contains("<think>") => pattern.replace_all(text, "").trim().to_string(),
        _ => text.trim().to_string(),
    }
}
