//! 逐句合成参数：语速、音高与口语化文本。

mod lexicon;

use std::ops::RangeInclusive;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Serialize;

use crate::orchestrator::config::{HostProfile, PipelineConfig};
use crate::orchestrator::types::{DialogueLine, Speaker};

pub use lexicon::{CONFIRMATION_SUFFIX, FILLERS, PHONETIC_SUBSTITUTIONS};

pub const RATE_JITTER: RangeInclusive<i32> = -2..=5;
pub const PITCH_JITTER: RangeInclusive<i32> = -2..=4;
pub const SHORT_REACTION_WORDS: usize = 5;
pub const SHORT_REACTION_RATE_BOOST: i32 = 10;
pub const FILLER_PROBABILITY: f64 = 0.4;
pub const CONFIRMATION_PROBABILITY: f64 = 0.3;

const RATE_LIMIT: RangeInclusive<i32> = -50..=100;
const PITCH_LIMIT: RangeInclusive<i32> = -50..=50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProsodyParams {
    pub rate_percent: i32,
    pub pitch_hz: i32,
    pub spoken_text: String,
}

impl ProsodyParams {
    /// Signed rate string such as `+22%`.
    pub fn rate_arg(&self) -> String {
        format!("{:+}%", self.rate_percent)
    }

    /// Signed pitch string such as `-3Hz`.
    pub fn pitch_arg(&self) -> String {
        format!("{:+}Hz", self.pitch_hz)
    }
}

pub struct ProsodyGenerator<R = StdRng> {
    rng: R,
    host_a: HostProfile,
    host_b: HostProfile,
    last_filler: Option<usize>,
}

impl ProsodyGenerator<StdRng> {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let rng = match config.prosody_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, config.host_a.clone(), config.host_b.clone())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(
            StdRng::seed_from_u64(seed),
            HostProfile::host_a(),
            HostProfile::host_b(),
        )
    }
}

impl<R: Rng> ProsodyGenerator<R> {
    pub fn with_rng(rng: R, host_a: HostProfile, host_b: HostProfile) -> Self {
        Self {
            rng,
            host_a,
            host_b,
            last_filler: None,
        }
    }

    fn profile(&self, speaker: Speaker) -> &HostProfile {
        match speaker {
            Speaker::HostA => &self.host_a,
            Speaker::HostB => &self.host_b,
        }
    }

    /// Inclusive range every `rate_percent` for `speaker` falls into.
    pub fn rate_bounds(&self, speaker: Speaker) -> RangeInclusive<i32> {
        let base = self.profile(speaker).base_rate_percent;
        let low = (base + RATE_JITTER.start()).clamp(*RATE_LIMIT.start(), *RATE_LIMIT.end());
        let high = (base + RATE_JITTER.end() + SHORT_REACTION_RATE_BOOST)
            .clamp(*RATE_LIMIT.start(), *RATE_LIMIT.end());
        low..=high
    }

    pub fn pitch_bounds(&self, speaker: Speaker) -> RangeInclusive<i32> {
        let base = self.profile(speaker).base_pitch_hz;
        let low = (base + PITCH_JITTER.start()).clamp(*PITCH_LIMIT.start(), *PITCH_LIMIT.end());
        let high = (base + PITCH_JITTER.end()).clamp(*PITCH_LIMIT.start(), *PITCH_LIMIT.end());
        low..=high
    }

    pub fn generate(&mut self, line: &DialogueLine) -> ProsodyParams {
        let (base_rate, base_pitch) = {
            let profile = self.profile(line.speaker);
            (profile.base_rate_percent, profile.base_pitch_hz)
        };

        let mut rate = base_rate + self.rng.gen_range(RATE_JITTER);
        if line.word_count() < SHORT_REACTION_WORDS {
            rate += SHORT_REACTION_RATE_BOOST;
        }
        let pitch = base_pitch + self.rng.gen_range(PITCH_JITTER);

        let mut spoken_text = substitute(&line.text);

        if spoken_text.ends_with('?')
            && !spoken_text.ends_with(CONFIRMATION_SUFFIX)
            && self.rng.gen_bool(CONFIRMATION_PROBABILITY)
        {
            spoken_text.pop();
            spoken_text.push(' ');
            spoken_text.push_str(CONFIRMATION_SUFFIX);
        }

        if self.rng.gen_bool(FILLER_PROBABILITY) {
            let filler = self.next_filler();
            spoken_text = format!("{filler}, {spoken_text}");
        }

        ProsodyParams {
            rate_percent: rate.clamp(*RATE_LIMIT.start(), *RATE_LIMIT.end()),
            pitch_hz: pitch.clamp(*PITCH_LIMIT.start(), *PITCH_LIMIT.end()),
            spoken_text,
        }
    }

    // Never hands out the same filler twice in a row.
    fn next_filler(&mut self) -> &'static str {
        let index = match self.last_filler {
            Some(last) => {
                let drawn = self.rng.gen_range(0..FILLERS.len() - 1);
                if drawn >= last {
                    drawn + 1
                } else {
                    drawn
                }
            }
            None => self.rng.gen_range(0..FILLERS.len()),
        };
        self.last_filler = Some(index);
        FILLERS[index]
    }
}

fn substitution_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        PHONETIC_SUBSTITUTIONS
            .iter()
            .filter_map(|(word, replacement)| {
                Regex::new(&format!(r"(?i)\b{word}\b"))
                    .ok()
                    .map(|pattern| (pattern, *replacement))
            })
            .collect()
    })
}

/// Rewrites words the speech engine mispronounces into unambiguous script.
/// Replacements never match a rule again, so applying this twice is a no-op.
pub fn substitute(text: &str) -> String {
    let mut output = text.to_string();
    for (pattern, replacement) in substitution_rules() {
        if pattern.is_match(&output) {
            output = pattern.replace_all(&output, *replacement).into_owned();
        }
    }
    output
}
