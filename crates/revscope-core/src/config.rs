//! Configuration for revscope.
//!
//! Configuration is loaded from multiple sources, in order of increasing
//! precedence:
//! 1. Global config file (`~/.config/revscope/config.json`)
//! 2. Environment variable: `REVSCOPE_CONFIG_CONTENT`
//! 3. Project config file (`revscope.jsonc` or `revscope.json`)
//! 4. Environment overrides: `REVSCOPE_TREE_VIEW`, `REVSCOPE_LOG_LEVEL`

use std::path::{Path, PathBuf};

use revscope_util::LogLevel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// History view settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Show the file tree next to the diff when a preview starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_view: Option<bool>,

    /// Fetch the version list as soon as a session starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_on_load: Option<bool>,

    /// Log level name (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl HistoryConfig {
    pub fn tree_view(&self) -> bool {
        self.tree_view.unwrap_or(false)
    }

    pub fn refresh_on_load(&self) -> bool {
        self.refresh_on_load.unwrap_or(true)
    }

    /// Effective log level; unknown names fall back to `info`.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    }

    /// Load configuration from all sources.
    pub async fn load(project_dir: Option<&Path>) -> Result<(Self, Vec<PathBuf>), ConfigError> {
        Self::load_with(project_dir, |key| std::env::var(key).ok()).await
    }

    /// Like [`load`](Self::load), reading environment variables through `lookup`.
    pub async fn load_with(
        project_dir: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let mut config = HistoryConfig::default();
        let mut sources = Vec::new();

        if let Some(global_dir) = revscope_util::config_dir() {
            let path = global_dir.join("config.json");
            if path.exists() {
                config = config.merge(Self::load_file(&path).await?);
                sources.push(path);
            }
        }

        if let Some(content) = lookup("REVSCOPE_CONFIG_CONTENT") {
            config = config.merge(Self::parse_jsonc(&content, "<env>")?);
        }

        if let Some(dir) = project_dir {
            for name in &["revscope.jsonc", "revscope.json"] {
                let path = dir.join(name);
                if path.exists() {
                    config = config.merge(Self::load_file(&path).await?);
                    sources.push(path);
                    break;
                }
            }
        }

        config.apply_env(lookup);
        debug!(?sources, "Loaded configuration");
        Ok((config, sources))
    }

    /// Load configuration from a single file.
    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Apply `REVSCOPE_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("REVSCOPE_TREE_VIEW") {
            match parse_bool(&value) {
                Some(on) => self.tree_view = Some(on),
                None => debug!(%value, "Ignoring invalid REVSCOPE_TREE_VIEW"),
            }
        }
        if let Some(level) = lookup("REVSCOPE_LOG_LEVEL") {
            self.log_level = Some(level);
        }
    }

    /// Merge another config into this one; fields set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            tree_view: other.tree_view.or(self.tree_view),
            refresh_on_load: other.refresh_on_load.or(self.refresh_on_load),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Parse JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> Result<Self, ConfigError> {
        let stripped = strip_comments(content);
        serde_json::from_str(&stripped).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Strip `//` and `/* */` comments outside of string literals.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
            result.push(c);
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // Keep line numbers stable for error messages.
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();
        assert!(!config.tree_view());
        assert!(config.refresh_on_load());
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_strip_comments() {
        let input = r#"{
            // line comment
            "log_level": "debug", /* block
            comment */ "tree_view": true,
            "note": "http://not-a-comment"
        }"#;
        let stripped = strip_comments(input);
        assert!(!stripped.contains("line comment"));
        assert!(!stripped.contains("block"));
        assert!(stripped.contains("http://not-a-comment"));
        assert_eq!(stripped.lines().count(), input.lines().count());
    }

    #[test]
    fn test_merge_later_wins() {
        let base = HistoryConfig {
            tree_view: Some(true),
            log_level: Some("warn".into()),
            ..Default::default()
        };
        let other = HistoryConfig {
            log_level: Some("debug".into()),
            refresh_on_load: Some(false),
            ..Default::default()
        };
        let merged = base.merge(other);
        assert_eq!(merged.tree_view, Some(true));
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
        assert!(!merged.refresh_on_load());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("REVSCOPE_TREE_VIEW", "yes"), ("REVSCOPE_LOG_LEVEL", "trace")]);
        let mut config = HistoryConfig {
            tree_view: Some(false),
            ..Default::default()
        };
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.tree_view());
        assert_eq!(config.log_level(), LogLevel::Trace);

        let mut config = HistoryConfig::default();
        config.apply_env(|key| (key == "REVSCOPE_TREE_VIEW").then(|| "maybe".to_string()));
        assert_eq!(config.tree_view, None);
    }

    #[tokio::test]
    async fn test_load_file_jsonc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revscope.jsonc");
        tokio::fs::write(&path, "{\n  // start with the tree open\n  \"tree_view\": true\n}\n")
            .await
            .unwrap();

        let config = HistoryConfig::load_file(&path).await.unwrap();
        assert!(config.tree_view());
        assert!(config.refresh_on_load());
    }

    #[tokio::test]
    async fn test_invalid_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revscope.json");
        tokio::fs::write(&path, "{ tree_view: }").await.unwrap();

        let err = HistoryConfig::load_file(&path).await.unwrap_err();
        match err {
            ConfigError::InvalidJson { path: p, .. } => assert!(p.ends_with("revscope.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_load_prefers_jsonc_in_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("revscope.jsonc"), r#"{"refresh_on_load": false}"#)
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("revscope.json"), r#"{"refresh_on_load": true}"#)
            .await
            .unwrap();

        let (config, sources) = HistoryConfig::load(Some(dir.path())).await.unwrap();
        assert!(!config.refresh_on_load());
        assert!(sources.iter().any(|p| p.ends_with("revscope.jsonc")));
    }

    #[tokio::test]
    async fn test_config_content_sits_below_project_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("revscope.json"), r#"{"log_level": "warn"}"#)
            .await
            .unwrap();
        let env: HashMap<&str, &str> = HashMap::from([(
            "REVSCOPE_CONFIG_CONTENT",
            "{ /* inline */ \"tree_view\": true, \"log_level\": \"trace\" }",
        )]);

        let (config, sources) =
            HistoryConfig::load_with(Some(dir.path()), |key| env.get(key).map(|v| v.to_string()))
                .await
                .unwrap();
        assert!(config.tree_view());
        assert_eq!(config.log_level(), LogLevel::Warn);
        assert!(sources.iter().any(|p| p.ends_with("revscope.json")));
    }

    #[tokio::test]
    async fn test_invalid_config_content_is_reported() {
        let err = HistoryConfig::load_with(None, |key| {
            (key == "REVSCOPE_CONFIG_CONTENT").then(|| "{ nope".to_string())
        })
        .await
        .unwrap_err();
        match err {
            ConfigError::InvalidJson { path, .. } => assert_eq!(path, "<env>"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
