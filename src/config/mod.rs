use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::board::{Behavior, ControlKind, DefaultTasks, Task, TaskId};
use crate::tui::ThemeConfig;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Overrides the built-in board when present.
    #[serde(default)]
    pub tasks: Option<Vec<TaskConfig>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Messages API endpoint. Default: Anthropic's public endpoint
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Environment variable holding the API key. Default: `ANTHROPIC_API_KEY`
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            endpoint: default_ai_endpoint(),
            model: default_ai_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SoundConfig {
    /// Whether sounds play at all. Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Player command; the resolved sound file is passed as the last argument.
    /// Default: "afplay" on macOS, "paplay" elsewhere
    #[serde(default = "default_sound_command")]
    pub command: String,

    /// Playback volume for afplay (0.0 - 1.0). Default: none (player default)
    #[serde(default)]
    pub volume: Option<f32>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig {
            enabled: true,
            command: default_sound_command(),
            volume: None,
        }
    }
}

/// One `[[tasks]]` entry.
#[derive(Debug, Deserialize, Clone)]
pub struct TaskConfig {
    pub id: TaskId,
    pub label: String,
    pub control: ControlKind,
    pub behavior: Behavior,
}

fn default_true() -> bool {
    true
}

fn default_ai_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_ai_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_sound_command() -> String {
    if cfg!(target_os = "macos") {
        "afplay".to_string()
    } else {
        "paplay".to_string()
    }
}

impl Config {
    /// The board layout to start from and reset to.
    pub fn default_tasks(&self) -> Result<DefaultTasks> {
        match &self.tasks {
            None => Ok(DefaultTasks::builtin()),
            Some(entries) => {
                let tasks = entries
                    .iter()
                    .map(|t| Task::new(t.id, &t.label, t.control, t.behavior))
                    .collect();
                DefaultTasks::new(tasks).context("invalid [[tasks]] in config.toml")
            }
        }
    }
}

/// Returns the base actionboard config directory: ~/.actionboard/
pub fn base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".actionboard"))
}

/// Returns the path to the `SQLite` database
pub fn db_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("actionboard.db"))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("actionboard.log"))
}

/// Returns the directory relative sound ids are resolved against
pub fn sounds_dir() -> Result<PathBuf> {
    Ok(base_dir()?.join("sounds"))
}

/// Ensure all required directories exist
pub fn ensure_dirs() -> Result<()> {
    let base = base_dir()?;
    fs::create_dir_all(&base).context("failed to create ~/.actionboard/")?;
    fs::create_dir_all(sounds_dir()?).context("failed to create ~/.actionboard/sounds/")?;
    Ok(())
}

/// Load config from ~/.actionboard/config.toml (or return defaults if it doesn't exist)
pub fn load() -> Result<Config> {
    let path = base_dir()?.join("config.toml");
    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.default_tasks()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.ai.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(cfg.ai.timeout_secs, 30);
        assert!(cfg.sound.enabled);
        assert_eq!(
            cfg.default_tasks().unwrap().to_collection(),
            DefaultTasks::builtin().to_collection()
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            r##"
            [ai]
            model = "claude-3-5-haiku-20241022"

            [sound]
            enabled = false

            [theme]
            banner = "#FF69B4"
            "##,
        )
        .unwrap();
        assert_eq!(cfg.ai.model, "claude-3-5-haiku-20241022");
        assert_eq!(cfg.theme.banner.as_deref(), Some("#FF69B4"));
        assert_eq!(cfg.ai.max_tokens, 1024);
        assert!(!cfg.sound.enabled);
        assert_eq!(cfg.sound.command, default_sound_command());
    }

    #[test]
    fn custom_tasks_replace_builtin_board() {
        let cfg = parse(
            r#"
            [[tasks]]
            id = 10
            label = "Ship it"
            control = "triggerable"
            behavior = "navigate_and_complete"

            [[tasks]]
            id = 11
            label = "Rank the rest"
            control = "triggerable"
            behavior = "ai_prioritize"
            "#,
        )
        .unwrap();
        let tasks = cfg.default_tasks().unwrap().to_collection();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 10);
        assert_eq!(tasks[1].behavior, Behavior::AiPrioritize);
    }

    #[test]
    fn duplicate_task_ids_are_rejected() {
        let err = parse(
            r#"
            [[tasks]]
            id = 1
            label = "a"
            control = "checkbox"
            behavior = "toggle"

            [[tasks]]
            id = 1
            label = "b"
            control = "checkbox"
            behavior = "toggle"
            "#,
        );
        assert!(err.is_err());
    }
}
