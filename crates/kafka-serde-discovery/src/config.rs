//! Configuration
//!
//! Two kinds of configuration meet here:
//!
//! - the application's messaging configuration, read through [`ConfigSource`]
//!   to detect explicit user settings ([`Properties`] is the file-backed
//!   implementation)
//! - the build-time switches of the discovery pass itself ([`DiscoveryConfig`])

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::names;
use crate::types::ChannelDirection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

/// Pre-compiled regex for environment variable expansion
/// Pattern: ${VAR} or ${VAR:-default}
static ENV_VAR_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var regex pattern is invalid - this is a bug")
});

/// Property switching default serde detection on or off
pub const AUTODETECTION_ENABLED_KEY: &str =
    "quarkus.reactive-messaging.kafka.serializer-autodetection.enabled";

/// Property switching orphan-channel connector attachment on or off
pub const AUTO_CONNECTOR_ATTACHMENT_KEY: &str = "quarkus.reactive-messaging.auto-connector-attachment";

/// Expand environment variables in the format ${VAR} or ${VAR:-default}
///
/// An unset variable without a default is left as written.
pub fn expand_env_vars(content: &str) -> String {
    ENV_VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match (std::env::var(var_name), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_string(),
                (Err(_), None) => caps[0].to_string(),
            }
        })
        .to_string()
}

// ============================================================================
// Config sources
// ============================================================================

/// Read-only key lookup into the application configuration
pub trait ConfigSource {
    /// The value as stored, blank or not
    fn raw_value(&self, key: &str) -> Option<String>;

    /// The value, with blank values treated as absent
    fn value(&self, key: &str) -> Option<String> {
        self.raw_value(key).filter(|v| !v.trim().is_empty())
    }

    /// Whether the key holds an explicit, non-blank value
    fn is_set(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Boolean value; anything other than `true`/`false` counts as absent
    fn bool_value(&self, key: &str) -> Option<bool> {
        match self.value(key)?.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl ConfigSource for HashMap<String, String> {
    fn raw_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn raw_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<C: ConfigSource + ?Sized> ConfigSource for &C {
    fn raw_value(&self, key: &str) -> Option<String> {
        (**self).raw_value(key)
    }
}

/// A snapshot of `application.properties`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `.properties` text
    ///
    /// Supports `#`/`!` comments, `=`, `:` and whitespace separators and
    /// backslash line continuations. Keys and values are unescaped
    /// (`\t`, `\n`, `\r`, `\f`, `\uXXXX`, `\=`, `\:`) and values then go
    /// through environment expansion. Later keys override earlier ones.
    pub fn parse(content: &str) -> DiscoveryResult<Self> {
        let mut entries = BTreeMap::new();
        let mut lines = content.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let line_number = index + 1;
            let mut logical = line.trim_start().to_string();
            if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
                continue;
            }

            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            if key.is_empty() {
                return Err(DiscoveryError::Properties {
                    line: line_number,
                    reason: "missing key".to_string(),
                });
            }
            let invalid = |reason: String| DiscoveryError::Properties {
                line: line_number,
                reason,
            };
            let key = unescape(key).map_err(invalid)?;
            let value = unescape(value.trim_end()).map_err(invalid)?;
            entries.insert(key, expand_env_vars(&value));
        }

        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> DiscoveryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set a value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigSource for Properties {
    fn raw_value(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (line[..i].trim_end(), line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

/// Resolve the escapes of a key or value; an escaped character without a
/// special meaning stands for itself
fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_utf16(&mut units, &mut out);
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        if escaped == 'u' {
            let hex: String = chars.by_ref().take(4).collect();
            if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                return Err(format!("malformed \\uXXXX escape '\\u{}'", hex));
            }
            let unit = u16::from_str_radix(&hex, 16).map_err(|e| e.to_string())?;
            // Surrogate pairs arrive as two consecutive escapes
            units.push(unit);
            continue;
        }
        flush_utf16(&mut units, &mut out);
        out.push(match escaped {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\u{c}',
            other => other,
        });
    }
    flush_utf16(&mut units, &mut out);
    Ok(out)
}

fn flush_utf16(units: &mut Vec<u16>, out: &mut String) {
    out.extend(
        char::decode_utf16(units.drain(..)).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

// ============================================================================
// Discovery switches
// ============================================================================

/// Build-time switches of the discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Generate serde defaults at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Attach orphan channels to the sole connector available for their direction
    #[serde(default = "default_true")]
    pub auto_connector_attachment: bool,

    /// Connectors available for incoming channels
    #[serde(default = "default_connectors")]
    pub incoming_connectors: Vec<String>,

    /// Connectors available for outgoing channels
    #[serde(default = "default_connectors")]
    pub outgoing_connectors: Vec<String>,

    /// Maximum number of reactive wrappers peeled from a signature (default: 4)
    #[serde(default = "default_max_wrapper_depth")]
    pub max_wrapper_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_connectors() -> Vec<String> {
    vec![names::KAFKA_CONNECTOR.to_string()]
}

fn default_max_wrapper_depth() -> usize {
    4
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_connector_attachment: true,
            incoming_connectors: default_connectors(),
            outgoing_connectors: default_connectors(),
            max_wrapper_depth: default_max_wrapper_depth(),
        }
    }
}

impl DiscoveryConfig {
    /// Load from a YAML file, expanding environment variables first
    pub fn load(path: impl AsRef<Path>) -> DiscoveryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> DiscoveryResult<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DiscoveryResult<()> {
        if self.max_wrapper_depth == 0 {
            return Err(DiscoveryError::Config(
                "max_wrapper_depth must be at least 1".to_string(),
            ));
        }
        for connector in self.incoming_connectors.iter().chain(&self.outgoing_connectors) {
            if connector.trim().is_empty() {
                return Err(DiscoveryError::Config(
                    "connector names must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Apply the switches found in the application configuration
    pub fn overlay(mut self, source: &dyn ConfigSource) -> Self {
        if let Some(enabled) = source.bool_value(AUTODETECTION_ENABLED_KEY) {
            self.enabled = enabled;
        }
        if let Some(attach) = source.bool_value(AUTO_CONNECTOR_ATTACHMENT_KEY) {
            self.auto_connector_attachment = attach;
        }
        self
    }

    pub fn connectors(&self, direction: ChannelDirection) -> &[String] {
        match direction {
            ChannelDirection::Incoming => &self.incoming_connectors,
            ChannelDirection::Outgoing => &self.outgoing_connectors,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_auto_connector_attachment(mut self, enabled: bool) -> Self {
        self.auto_connector_attachment = enabled;
        self
    }

    pub fn with_incoming_connectors(mut self, connectors: Vec<String>) -> Self {
        self.incoming_connectors = connectors;
        self
    }

    pub fn with_outgoing_connectors(mut self, connectors: Vec<String>) -> Self {
        self.outgoing_connectors = connectors;
        self
    }

    pub fn with_max_wrapper_depth(mut self, depth: usize) -> Self {
        self.max_wrapper_depth = depth;
        self
    }
}
