// Engine options and preloaded rule groups

use crate::{EngineError, FieldSpec, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Opening delimiter around each rendered error
    pub error_prefix: String,
    /// Closing delimiter around each rendered error
    pub error_suffix: String,
    /// Report unresolvable rule names as errors instead of failing the rule
    pub strict_rules: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            error_prefix: "<p>".to_string(),
            error_suffix: "</p>".to_string(),
            strict_rules: false,
        }
    }
}

impl EngineOptions {
    /// Defaults overridden by `FORMGUARD_ERROR_PREFIX`,
    /// `FORMGUARD_ERROR_SUFFIX` and `FORMGUARD_STRICT_RULES`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the same keys
    /// [`from_env`](Self::from_env) reads
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            error_prefix: lookup("FORMGUARD_ERROR_PREFIX").unwrap_or(defaults.error_prefix),
            error_suffix: lookup("FORMGUARD_ERROR_SUFFIX").unwrap_or(defaults.error_suffix),
            strict_rules: lookup("FORMGUARD_STRICT_RULES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.strict_rules),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_rules = strict;
        self
    }

    pub fn delimiters(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self.error_suffix = suffix.into();
        self
    }
}

/// Supported rule file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// Rule specifications loaded ahead of time.
///
/// Either one flat list of field specs, or named groups of them
/// (e.g. one group per form).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    Flat(Vec<FieldSpec>),
    Grouped(HashMap<String, Vec<FieldSpec>>),
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig::Flat(Vec::new())
    }
}

impl RuleConfig {
    /// Single group named `name`
    pub fn group(name: impl Into<String>, specs: Vec<FieldSpec>) -> Self {
        RuleConfig::Grouped(HashMap::from([(name.into(), specs)]))
    }

    /// Add a group, converting a flat config into a grouped one
    pub fn with_group(self, name: impl Into<String>, specs: Vec<FieldSpec>) -> Self {
        let mut groups = match self {
            RuleConfig::Grouped(groups) => groups,
            RuleConfig::Flat(flat) if flat.is_empty() => HashMap::new(),
            RuleConfig::Flat(flat) => HashMap::from([(String::new(), flat)]),
        };
        groups.insert(name.into(), specs);
        RuleConfig::Grouped(groups)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RuleConfig::Flat(specs) => specs.is_empty(),
            RuleConfig::Grouped(groups) => groups.is_empty(),
        }
    }

    /// Specs for `group`.
    ///
    /// A flat config answers every group. A grouped config without the
    /// requested group falls back to the unnamed (`""`) group.
    pub fn specs(&self, group: Option<&str>) -> Vec<FieldSpec> {
        match self {
            RuleConfig::Flat(specs) => specs.clone(),
            RuleConfig::Grouped(groups) => group
                .and_then(|g| groups.get(g))
                .or_else(|| groups.get(""))
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse `content` in the given format
    pub fn parse(content: &str, format: FileFormat) -> Result<Self> {
        match format {
            FileFormat::Json => Self::from_json_str(content),
            FileFormat::Toml => Self::from_toml_str(content),
        }
    }

    /// Load a `.json` or `.toml` rule file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| EngineError::Config("No file extension found".to_string()))?;
        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| EngineError::Config(format!("Unsupported format: {}", ext)))?;

        let content = fs::read_to_string(path)?;
        Self::parse(&content, format)
    }
}
