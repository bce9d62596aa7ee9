use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

/// Value shipped in sample configuration files; never a usable key.
pub const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a friendly AI tutor who helps students understand concepts, \
     gives constructive feedback and suggests effective learning strategies.";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TutorConfig {
    pub llm: LlmConfig,
    pub analytics: AnalyticsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 30,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl LlmConfig {
    /// The API key, unless it is blank or still the sample placeholder.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub recent_history_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_history_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; records are kept in memory when unset.
    pub database_path: Option<String>,
}

pub trait VariableResolver: Send + Sync {
    fn is_resolvable(&self, key: &str) -> bool;
    fn resolve(&self, key: &str) -> Result<String>;
}

pub struct EnvVarResolver;

impl VariableResolver for EnvVarResolver {
    fn is_resolvable(&self, key: &str) -> bool {
        key.starts_with("ENV_") || (key.starts_with("${") && key.ends_with('}'))
    }

    fn resolve(&self, key: &str) -> Result<String> {
        let env_key = if let Some(name) = key.strip_prefix("ENV_") {
            name
        } else if let Some(name) = key.strip_prefix("${").and_then(|k| k.strip_suffix('}')) {
            name
        } else {
            return Err(anyhow!("Invalid environment variable format: {}", key));
        };

        debug!("Looking up environment variable: {}", env_key);
        env::var(env_key)
            .map_err(|e| anyhow!("Failed to find environment variable '{}': {}", env_key, e))
    }
}

pub struct CredentialResolver {
    credentials: HashMap<String, String>,
}

impl CredentialResolver {
    pub fn new(credentials: HashMap<String, String>) -> Self {
        CredentialResolver { credentials }
    }
}

impl VariableResolver for CredentialResolver {
    fn is_resolvable(&self, key: &str) -> bool {
        key.starts_with("CREDENTIAL_")
    }

    fn resolve(&self, key: &str) -> Result<String> {
        let credential_key = &key["CREDENTIAL_".len()..];
        debug!("Looking up credential: {}", credential_key);
        self.credentials
            .get(credential_key)
            .cloned()
            .ok_or_else(|| anyhow!("Failed to find credential '{}'", credential_key))
    }
}

/// Replaces `ENV_NAME`, `${NAME}` and `CREDENTIAL_NAME` string values.
///
/// Resolution is lenient: a value that cannot be resolved is dropped from its
/// object (or nulled inside arrays) so the field falls back to its default.
pub struct VariableResolverProcessor {
    resolvers: Vec<Arc<dyn VariableResolver>>,
}

impl VariableResolverProcessor {
    pub fn new(credentials: &HashMap<String, String>) -> Self {
        VariableResolverProcessor {
            resolvers: vec![
                Arc::new(EnvVarResolver),
                Arc::new(CredentialResolver::new(credentials.clone())),
            ],
        }
    }

    /// Returns false when `value` was a variable reference that did not resolve.
    pub fn resolve(&self, value: &mut Value) -> bool {
        match value {
            Value::String(s) => {
                let Some(resolver) = self.resolvers.iter().find(|r| r.is_resolvable(s)) else {
                    return true;
                };
                match resolver.resolve(s) {
                    Ok(resolved) => {
                        *s = resolved;
                        true
                    }
                    Err(e) => {
                        warn!("Leaving configuration value unset: {}", e);
                        false
                    }
                }
            }
            Value::Object(map) => {
                let unresolved: Vec<String> = map
                    .iter_mut()
                    .filter_map(|(k, v)| (!self.resolve(v)).then(|| k.clone()))
                    .collect();
                for key in unresolved {
                    map.remove(&key);
                }
                true
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if !self.resolve(item) {
                        *item = Value::Null;
                    }
                }
                true
            }
            _ => true,
        }
    }
}

pub fn parse_key_value_pair(pair: &str) -> Option<(String, String)> {
    let (key, value) = pair.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Applies `dotted.path=value` overrides; values are parsed as JSON when
/// possible and kept as strings otherwise.
pub fn apply_overrides(config: &mut Value, overrides: &[(String, String)]) -> Result<()> {
    for (key, raw) in overrides {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        set_path(config, key, value)?;
    }
    Ok(())
}

fn set_path(config: &mut Value, key: &str, value: Value) -> Result<()> {
    if !config.is_object() {
        *config = Value::Object(serde_json::Map::new());
    }
    let mut parts = key.split('.').peekable();
    let mut current = config
        .as_object_mut()
        .ok_or_else(|| anyhow!("Configuration root is not an object"))?;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            break;
        }
        let entry = current
            .entry(part)
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(serde_json::Map::new());
        }
        current = entry
            .as_object_mut()
            .ok_or_else(|| anyhow!("Failed to create nested object for '{}'", key))?;
    }
    debug!("Applied override for {}", key);
    Ok(())
}

// Applies overrides typed where the configuration accepts it, and as the raw
// string where the typed value would not deserialize (e.g. `path=2024`).
fn apply_typed_overrides(config: &mut Value, overrides: &[(String, String)]) -> Result<()> {
    for pair in overrides {
        let mut typed = config.clone();
        apply_overrides(&mut typed, std::slice::from_ref(pair))?;
        if serde_json::from_value::<TutorConfig>(typed.clone()).is_ok() {
            *config = typed;
        } else {
            set_path(config, &pair.0, Value::String(pair.1.clone()))?;
        }
    }
    Ok(())
}

/// Builds a [`TutorConfig`] from YAML or JSON text.
pub fn parse_config(
    content: &str,
    overrides: &[(String, String)],
    credentials: &HashMap<String, String>,
) -> Result<TutorConfig> {
    let mut value: Value = if content.trim().is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_yaml::from_str(content).context("Could not parse tutor configuration")?
    };
    if value.is_null() {
        value = Value::Object(serde_json::Map::new());
    }

    VariableResolverProcessor::new(credentials).resolve(&mut value);
    apply_typed_overrides(&mut value, overrides)?;

    let mut config: TutorConfig =
        serde_json::from_value(value).context("Invalid tutor configuration")?;

    if config.llm.credential().is_none() {
        if let Ok(key) = env::var(API_KEY_ENV_VAR) {
            debug!("Using API key from {}", API_KEY_ENV_VAR);
            config.llm.api_key = Some(key);
        }
    }
    Ok(config)
}

/// Loads configuration from `path`, or defaults when no file is given.
pub fn load_config(
    path: Option<&Path>,
    overrides: &[(String, String)],
    credentials: &HashMap<String, String>,
) -> Result<TutorConfig> {
    let content = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
        None => String::new(),
    };
    parse_config(&content, overrides, credentials)
}
