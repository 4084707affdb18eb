//! Per-orchestrator knobs.

use std::time::Duration;

use bon::Builder;

use crate::config::{QuillConfig, DEFAULT_MAX_ROUNDS};

/// System instruction prepended to every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a warm, attentive personal assistant. \
You can help the user keep a diary and make plans.\n\n\
When the user talks about their day, an activity, or how they feel, call the \
generate_diary tool to write it up as a diary entry.\n\
When the user asks for a plan or help organizing a goal, call the create_plan \
tool to draft a detailed plan.\n\n\
After a tool returns, reply briefly and kindly; do not repeat the tool output.";

/// Settings for one [`Orchestrator`](super::Orchestrator).
///
/// ```rust
/// use std::time::Duration;
/// use quill::agent::AgentSettings;
///
/// let settings = AgentSettings::builder()
///     .max_rounds(3)
///     .stream_idle_timeout(Duration::from_secs(30))
///     .build();
/// assert_eq!(settings.max_rounds, 3);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct AgentSettings {
    /// Upper bound on streaming calls per request.
    #[builder(default = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: usize,
    #[builder(default = DEFAULT_SYSTEM_PROMPT.to_string(), into)]
    pub system_prompt: String,
    /// Longest gap tolerated between upstream frames; `None` waits forever.
    pub stream_idle_timeout: Option<Duration>,
    #[builder(default = Duration::from_secs(120))]
    pub tool_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AgentSettings {
    pub fn from_config(config: &QuillConfig) -> Self {
        Self {
            max_rounds: config.max_rounds,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            stream_idle_timeout: config.stream_idle_timeout(),
            tool_timeout: config.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = AgentSettings::default();
        assert_eq!(settings.max_rounds, 5);
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(settings.stream_idle_timeout, None);
    }

    #[test]
    fn from_config_honors_prompt_override() {
        let config = QuillConfig::default()
            .with_max_rounds(2)
            .with_system_prompt("be terse");
        let settings = AgentSettings::from_config(&config);
        assert_eq!(settings.max_rounds, 2);
        assert_eq!(settings.system_prompt, "be terse");
        assert_eq!(settings.stream_idle_timeout, Some(Duration::from_secs(120)));
        assert_eq!(settings.tool_timeout, Duration::from_secs(120));
    }
}
