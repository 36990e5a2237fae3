pub(crate) const MAX_SEGMENTS: usize = 20;
pub(crate) const CANONICAL_DIALOGUE_FIELD: &str = "conversation";
pub(crate) const ARTIFACT_EXTENSION: &str = "mp3";
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "output";
pub(crate) const DEFAULT_CONTENT_LANG: &str = "en";
pub(crate) const DEFAULT_PROGRESS_ACCELERATION: f64 = 1.4;
pub(crate) const LIFECYCLE_CHANNEL_CAPACITY: usize = 64;
