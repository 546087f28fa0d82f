use std::collections::BTreeMap;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CalcuError, Result};

pub const DEFAULT_TRIGGER_CHANNEL: &str = "calcu";
pub const DEFAULT_EVALUATION_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_SESSION_CAPACITY: usize = 1024;
pub const DEFAULT_MAX_DENOMINATOR: u64 = 10_000;
pub const DEFAULT_MAX_DEPTH: usize = 64;

const ACK: &str = "\u{2705}"; // ✅
const NACK: &str = "\u{274c}"; // ❌
const TOGGLE: &str = "\u{1f501}"; // 🔁

/// Top-level config (calcu.toml + CALCU_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalcuConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub reactions: ReactionsConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: Option<String>,
    /// Path to a file holding the token. Used when `bot_token` is unset.
    pub bot_token_file: Option<String>,
    /// Messages in a channel with this name (case-insensitive) trigger a
    /// calculation without an @mention.
    #[serde(default = "default_trigger_channel")]
    pub trigger_channel: String,
    /// When true, direct messages (DMs) are treated as calculation requests.
    /// Defaults to true.
    #[serde(default = "bool_true")]
    pub dm_allowed: bool,
    /// Online status: "online", "idle", "dnd", "invisible".
    #[serde(default = "default_status")]
    pub status: String,
    /// Activity kind: "playing", "listening", "watching", "competing", "custom".
    pub activity_type: Option<String>,
    #[serde(default = "default_activity_name")]
    pub activity_name: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_token_file: None,
            trigger_channel: default_trigger_channel(),
            dm_allowed: true,
            status: default_status(),
            activity_type: None,
            activity_name: default_activity_name(),
        }
    }
}

impl DiscordConfig {
    /// Resolve the bot token: inline value first, then the token file.
    pub fn token(&self) -> Result<String> {
        if let Some(token) = self.bot_token.as_deref().map(str::trim) {
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
        let Some(ref path) = self.bot_token_file else {
            return Err(CalcuError::NoToken);
        };
        let token = std::fs::read_to_string(path)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(CalcuError::NoToken);
        }
        Ok(token.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock budget for a single evaluation; expiry counts as a failure.
    #[serde(default = "default_evaluation_timeout_ms")]
    pub evaluation_timeout_ms: u64,
    /// Maximum number of calculations kept for reaction toggling (LRU).
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,
    /// Largest denominator considered when looking for an exact ratio.
    #[serde(default = "default_max_denominator")]
    pub max_denominator: u64,
    /// Maximum parenthesis nesting depth of an expression.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout_ms: DEFAULT_EVALUATION_TIMEOUT_MS,
            session_capacity: DEFAULT_SESSION_CAPACITY,
            max_denominator: DEFAULT_MAX_DENOMINATOR,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Emoji glyphs used for the reaction protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionsConfig {
    #[serde(default = "default_ack")]
    pub ack: String,
    #[serde(default = "default_nack")]
    pub nack: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            ack: default_ack(),
            nack: default_nack(),
            toggle: default_toggle(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluatorConfig {
    /// Extra named constants added to the evaluation environment.
    /// Built-ins (`pi`, `π`, `e`) and `ans` cannot be overridden.
    #[serde(default)]
    pub constants: BTreeMap<String, f64>,
}

fn bool_true() -> bool {
    true
}
fn default_trigger_channel() -> String {
    DEFAULT_TRIGGER_CHANNEL.to_string()
}
fn default_status() -> String {
    "online".to_string()
}
fn default_activity_name() -> Option<String> {
    Some("with numbers, @ me!".to_string())
}
fn default_evaluation_timeout_ms() -> u64 {
    DEFAULT_EVALUATION_TIMEOUT_MS
}
fn default_session_capacity() -> usize {
    DEFAULT_SESSION_CAPACITY
}
fn default_max_denominator() -> u64 {
    DEFAULT_MAX_DENOMINATOR
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_ack() -> String {
    ACK.to_string()
}
fn default_nack() -> String {
    NACK.to_string()
}
fn default_toggle() -> String {
    TOGGLE.to_string()
}

impl CalcuConfig {
    /// Load config from a TOML file with CALCU_* env var overrides.
    ///
    /// Nested keys use a double underscore: `CALCU_DISCORD__BOT_TOKEN`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading config");

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("CALCU_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: CalcuConfig = figment
            .extract()
            .map_err(|e| CalcuError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.session_capacity == 0 {
            return Err(CalcuError::Config(
                "engine.session_capacity must be at least 1".to_string(),
            ));
        }
        if self.engine.max_denominator < 2 {
            return Err(CalcuError::Config(
                "engine.max_denominator must be at least 2".to_string(),
            ));
        }
        if self.engine.max_depth == 0 {
            return Err(CalcuError::Config(
                "engine.max_depth must be at least 1".to_string(),
            ));
        }
        let glyphs = [&self.reactions.ack, &self.reactions.nack, &self.reactions.toggle];
        if glyphs.iter().any(|g| g.trim().is_empty()) {
            return Err(CalcuError::Config("reaction glyphs must not be empty".to_string()));
        }
        if self.reactions.toggle == self.reactions.ack || self.reactions.toggle == self.reactions.nack
        {
            return Err(CalcuError::Config(
                "reactions.toggle must differ from ack and nack".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.calcu/calcu.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = CalcuConfig::from_figment(Figment::new()).unwrap();
        assert_eq!(config.discord.trigger_channel, "calcu");
        assert!(config.discord.dm_allowed);
        assert_eq!(config.engine.session_capacity, DEFAULT_SESSION_CAPACITY);
        assert_eq!(config.reactions.toggle, "\u{1f501}");
        assert!(config.evaluator.constants.is_empty());
    }

    #[test]
    fn toml_overrides_are_applied() {
        let toml = r#"
            [discord]
            bot_token = "abc"
            trigger_channel = "maths"

            [engine]
            session_capacity = 8

            [evaluator.constants]
            x = 2.0
        "#;
        let config = CalcuConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.discord.token().unwrap(), "abc");
        assert_eq!(config.discord.trigger_channel, "maths");
        assert_eq!(config.engine.session_capacity, 8);
        assert_eq!(config.evaluator.constants.get("x"), Some(&2.0));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let toml = "[engine]\nsession_capacity = 0\n";
        let err = CalcuConfig::from_figment(Figment::new().merge(Toml::string(toml))).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn toggle_glyph_must_be_distinct() {
        let toml = "[reactions]\ntoggle = \"\u{2705}\"\n";
        assert!(CalcuConfig::from_figment(Figment::new().merge(Toml::string(toml))).is_err());
    }

    #[test]
    fn missing_token_is_reported() {
        let discord = DiscordConfig::default();
        assert!(matches!(discord.token(), Err(CalcuError::NoToken)));
    }
}
