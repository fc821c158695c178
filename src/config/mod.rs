//! Configuration management for Param Link
//!
//! Handles loading, validating and parsing the YAML configuration file, and
//! building the parameter tree it declares.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::fs;

use crate::engine::DEFAULT_LINKS_FILE;
use crate::params::{ParameterGroup, PATH_SEPARATOR};

pub use watcher::LinksWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub midi: MidiConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

/// MIDI input configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Case-insensitive substrings of the input port names to open
    pub input_ports: Vec<String>,
}

/// Links file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinksConfig {
    #[serde(default = "default_links_path")]
    pub path: String,
    /// Load the links file at startup
    #[serde(default = "default_true")]
    pub autoload: bool,
    /// Save after every learned link and at shutdown
    #[serde(default = "default_true")]
    pub autosave: bool,
    /// Reload when the links file changes on disk
    #[serde(default)]
    pub watch: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            path: default_links_path(),
            autoload: true,
            autosave: true,
            watch: false,
        }
    }
}

/// Processing loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Interval between drains of the ingestion queue
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

/// Declaration of a parameter or group in the parameter tree
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamSpec {
    Group {
        name: String,
        #[serde(default)]
        children: Vec<ParamSpec>,
    },
    Float {
        name: String,
        #[serde(default)]
        min: f32,
        #[serde(default = "default_float_max")]
        max: f32,
        #[serde(default)]
        value: f32,
    },
    Int {
        name: String,
        #[serde(default)]
        min: i32,
        max: i32,
        #[serde(default)]
        value: i32,
    },
    Bool {
        name: String,
        #[serde(default)]
        value: bool,
    },
    Trigger {
        name: String,
    },
    Text {
        name: String,
        #[serde(default)]
        value: String,
    },
}

impl ParamSpec {
    pub fn name(&self) -> &str {
        match self {
            ParamSpec::Group { name, .. }
            | ParamSpec::Float { name, .. }
            | ParamSpec::Int { name, .. }
            | ParamSpec::Bool { name, .. }
            | ParamSpec::Trigger { name }
            | ParamSpec::Text { name, .. } => name,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {}", path))?;

        Ok(config)
    }

    /// Parse and validate YAML configuration
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.input_ports.is_empty() {
            anyhow::bail!("midi.input_ports must list at least one port");
        }
        if self.midi.input_ports.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("midi.input_ports cannot contain empty patterns");
        }
        if self.links.path.trim().is_empty() {
            anyhow::bail!("links.path cannot be empty");
        }
        if self.engine.tick_ms == 0 {
            anyhow::bail!("engine.tick_ms must be greater than 0");
        }

        validate_specs(&self.parameters, "")
    }

    /// Build the parameter tree declared under `parameters`
    pub fn build_parameters(&self) -> ParameterGroup {
        let mut root = ParameterGroup::root();
        add_specs(&mut root, &self.parameters);
        root
    }
}

fn validate_specs(specs: &[ParamSpec], parent: &str) -> Result<()> {
    let mut seen = HashSet::new();

    for spec in specs {
        let name = spec.name();
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}{}{}", parent, PATH_SEPARATOR, name)
        };

        if name.trim().is_empty() {
            anyhow::bail!("Parameter under '{}' has an empty name", parent);
        }
        if name.contains(PATH_SEPARATOR) {
            anyhow::bail!(
                "Parameter name '{}' cannot contain '{}'",
                path,
                PATH_SEPARATOR
            );
        }
        if !seen.insert(name) {
            anyhow::bail!("Duplicate parameter name: '{}'", path);
        }

        match spec {
            ParamSpec::Group { children, .. } => validate_specs(children, &path)?,
            ParamSpec::Float { min, max, value, .. } => {
                if !(min.is_finite() && max.is_finite() && value.is_finite()) {
                    anyhow::bail!("Parameter '{}': min, max and value must be finite numbers", path);
                }
                if min > max {
                    anyhow::bail!("Parameter '{}': min {} is greater than max {}", path, min, max);
                }
                if value < min || value > max {
                    anyhow::bail!("Parameter '{}': value {} is outside [{}, {}]", path, value, min, max);
                }
            }
            ParamSpec::Int { min, max, value, .. } => {
                if min > max {
                    anyhow::bail!("Parameter '{}': min {} is greater than max {}", path, min, max);
                }
                if value < min || value > max {
                    anyhow::bail!("Parameter '{}': value {} is outside [{}, {}]", path, value, min, max);
                }
            }
            ParamSpec::Bool { .. } | ParamSpec::Trigger { .. } | ParamSpec::Text { .. } => {}
        }
    }

    Ok(())
}

fn add_specs(group: &mut ParameterGroup, specs: &[ParamSpec]) {
    for spec in specs {
        match spec {
            ParamSpec::Group { name, children } => add_specs(group.group(name), children),
            ParamSpec::Float { name, min, max, value } => {
                group.float(name, *min, *max, *value);
            }
            ParamSpec::Int { name, min, max, value } => {
                group.int(name, *min, *max, *value);
            }
            ParamSpec::Bool { name, value } => {
                group.bool(name, *value);
            }
            ParamSpec::Trigger { name } => {
                group.trigger(name);
            }
            ParamSpec::Text { name, value } => {
                group.text(name, value);
            }
        }
    }
}

// Default value functions
fn default_links_path() -> String { DEFAULT_LINKS_FILE.to_string() }
fn default_true() -> bool { true }
fn default_tick_ms() -> u64 { 16 }
fn default_float_max() -> f32 { 1.0 }
