use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::orchestrator::constants::{
    DEFAULT_CONTENT_LANG, DEFAULT_OUTPUT_DIR, DEFAULT_PROGRESS_ACCELERATION, MAX_SEGMENTS,
};
use crate::orchestrator::types::Speaker;

/// What to do when a topic maps onto an artifact filename that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    Overwrite,
    Reject,
    Uniquify,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Reject => "reject",
            CollisionPolicy::Uniquify => "uniquify",
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "reject" => Ok(CollisionPolicy::Reject),
            "uniquify" => Ok(CollisionPolicy::Uniquify),
            other => Err(format!("unknown collision policy: {other}")),
        }
    }
}

/// Voice and base prosody for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostProfile {
    pub name: String,
    pub voice: String,
    pub base_rate_percent: i32,
    pub base_pitch_hz: i32,
}

impl HostProfile {
    pub fn host_a() -> Self {
        Self {
            name: "Priya".to_string(),
            voice: "hi-IN-SwaraNeural".to_string(),
            base_rate_percent: 20,
            base_pitch_hz: 4,
        }
    }

    pub fn host_b() -> Self {
        Self {
            name: "Amit".to_string(),
            voice: "hi-IN-MadhurNeural".to_string(),
            base_rate_percent: 15,
            base_pitch_hz: -2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub content_lang: String,
    pub max_segments: usize,
    pub progress_acceleration: f64,
    pub collision_policy: CollisionPolicy,
    pub prosody_seed: Option<u64>,
    pub host_a: HostProfile,
    pub host_b: HostProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            content_lang: DEFAULT_CONTENT_LANG.to_string(),
            max_segments: MAX_SEGMENTS,
            progress_acceleration: DEFAULT_PROGRESS_ACCELERATION,
            collision_policy: CollisionPolicy::default(),
            prosody_seed: None,
            host_a: HostProfile::host_a(),
            host_b: HostProfile::host_b(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("RADIOHOST_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }

        if let Ok(lang) = std::env::var("RADIOHOST_CONTENT_LANG") {
            if !lang.trim().is_empty() {
                config.content_lang = lang.trim().to_string();
            }
        }

        if let Ok(value) = std::env::var("RADIOHOST_ARTIFACT_COLLISION") {
            match value.parse() {
                Ok(policy) => config.collision_policy = policy,
                Err(err) => warn!(target: "pipeline_config", %err, "ignoring collision policy"),
            }
        }

        if let Ok(value) = std::env::var("RADIOHOST_PROSODY_SEED") {
            match value.trim().parse::<u64>() {
                Ok(seed) => config.prosody_seed = Some(seed),
                Err(err) => warn!(target: "pipeline_config", %err, "ignoring prosody seed"),
            }
        }

        config
    }

    pub fn profile(&self, speaker: Speaker) -> &HostProfile {
        match speaker {
            Speaker::HostA => &self.host_a,
            Speaker::HostB => &self.host_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_policy_parses_case_insensitively() {
        assert_eq!("Reject".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Reject));
        assert_eq!(" uniquify ".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Uniquify));
        assert!("keep".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn defaults_match_pipeline_bounds() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_segments, 20);
        assert_eq!(config.collision_policy, CollisionPolicy::Overwrite);
        assert!(config.progress_acceleration > 1.0);
        assert_eq!(config.profile(Speaker::HostB).name, "Amit");
    }
}
