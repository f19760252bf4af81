use serde::Deserialize;

/// Exception pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Write log records inline instead of through the background writer
    #[serde(default)]
    pub eager_mode: bool,
    /// Language of caller-facing messages and hints
    #[serde(default)]
    pub language: Language,
    /// Records buffered for the background writer before new ones are dropped
    #[serde(default = "default_log_queue_capacity")]
    pub log_queue_capacity: usize,
    /// Attach a stack capture to unhandled-error log records
    #[serde(default = "default_true")]
    pub capture_stack: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            eager_mode: false,
            language: Language::default(),
            log_queue_capacity: default_log_queue_capacity(),
            capture_stack: true,
        }
    }
}

/// Deployment language for envelope messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Russian
    Ru,
}

const fn default_log_queue_capacity() -> usize {
    10_000
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}
