//! Mapper definition YAMLs and loader.
//!
//! Mapper definitions are also expressible as data. A YAML document nests
//! the definition under a top-level `mapper` key:
//!
//! ```yaml
//! mapper:
//!   attributes: [id, name]
//!   reject_unlisted: false
//!   wraps:
//!     - target: contacts
//!       prefix: contact
//!       sources:
//!         - email
//!         - name: main_skype
//!           from: skype_handle
//!       model: Contact
//! ```
//!
//! Delegate mappers and model builders are code, so configs reference them
//! by name; [`Bindings`] registers the implementations and
//! [`MapperConfig::bind`] resolves the names into a validated
//! [`MapperDef`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::wrap::spec::{DelegateMapper, MapperDef, ModelBuilder, SpecError, WrapSpec};

/// Mapper definition from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Declared top-level attributes
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Wrap declarations, in application order
    #[serde(default)]
    pub wraps: Vec<WrapConfig>,

    /// Restrict top-level output to declared attributes and wrap targets
    #[serde(default)]
    pub reject_unlisted: bool,
}

/// One wrap declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapConfig {
    /// Name the nested result is stored under
    pub target: String,

    /// Attributes to extract; empty with a prefix means every matching key
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Prefix configuration
    #[serde(default)]
    pub prefix: Option<PrefixConfig>,

    /// Registered delegate mapper name
    #[serde(default)]
    pub delegate: Option<String>,

    /// Registered model builder name
    #[serde(default)]
    pub model: Option<String>,

    /// Nested wrap declarations
    #[serde(default)]
    pub wraps: Vec<WrapConfig>,
}

/// A source attribute declaration.
///
/// Either a bare name, or a name with an explicit source-key rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Name(String),
    Renamed { name: String, from: String },
}

/// Prefix configuration.
///
/// Either a literal prefix string, or an options map selecting the
/// auto-derived prefix (the target key) and/or a custom separator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefixConfig {
    Literal(String),
    Options {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        auto: bool,
        #[serde(default)]
        separator: Option<String>,
    },
}

/// Registry of named delegate mappers and model builders available to
/// configuration binding.
#[derive(Default)]
pub struct Bindings {
    delegates: HashMap<String, Arc<dyn DelegateMapper>>,
    models: HashMap<String, Arc<dyn ModelBuilder>>,
}

impl Bindings {
    /// Create an empty bindings registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate mapper under a name.
    pub fn register_delegate(
        &mut self,
        name: impl Into<String>,
        delegate: Arc<dyn DelegateMapper>,
    ) {
        self.delegates.insert(name.into(), delegate);
    }

    /// Register a model builder under a name.
    pub fn register_model(&mut self, name: impl Into<String>, model: Arc<dyn ModelBuilder>) {
        self.models.insert(name.into(), model);
    }

    /// Look up a registered delegate mapper.
    pub fn delegate(&self, name: &str) -> Option<Arc<dyn DelegateMapper>> {
        self.delegates.get(name).cloned()
    }

    /// Look up a registered model builder.
    pub fn model(&self, name: &str) -> Option<Arc<dyn ModelBuilder>> {
        self.models.get(name).cloned()
    }
}

impl MapperConfig {
    /// Parse a mapper definition from a YAML string.
    ///
    /// # Errors
    /// Returns error if the document is not valid YAML or lacks the
    /// top-level `mapper` field.
    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse YAML: {}", e))?;

        let mapper_yaml = yaml
            .get("mapper")
            .ok_or_else(|| "Mapper YAML missing 'mapper' field".to_string())?;

        serde_yaml::from_value(mapper_yaml.clone())
            .map_err(|e| format!("Failed to parse mapper definition: {}", e))
    }

    /// Load a mapper definition from a YAML file.
    ///
    /// # Arguments
    /// * `path` - Path to mapper YAML file
    ///
    /// # Errors
    /// Returns error if the file doesn't exist or has invalid format
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read mapper file {}: {}", path.display(), e))?;

        Self::from_yaml_str(&contents)
    }

    /// Resolve delegate and model names and build a validated [`MapperDef`].
    ///
    /// # Errors
    /// Returns error if a referenced delegate or model is not registered, or
    /// if the resulting definition fails validation (see
    /// [`MapperDefBuilder::build`](crate::wrap::spec::MapperDefBuilder::build)).
    pub fn bind(&self, bindings: &Bindings) -> Result<MapperDef, SpecError> {
        let mut builder = MapperDef::builder().reject_unlisted(self.reject_unlisted);

        for attribute in &self.attributes {
            builder = builder.attribute(attribute);
        }
        for wrap in &self.wraps {
            builder = builder.wrap(build_spec(wrap, bindings)?);
        }

        builder.build()
    }
}

/// Build one wrap specification from its configuration, recursively.
fn build_spec(config: &WrapConfig, bindings: &Bindings) -> Result<WrapSpec, SpecError> {
    let mut builder = WrapSpec::builder(&config.target);

    for source in &config.sources {
        builder = match source {
            SourceConfig::Name(name) => builder.attr(name),
            SourceConfig::Renamed { name, from } => builder.attr_from(name, from),
        };
    }

    match &config.prefix {
        Some(PrefixConfig::Literal(prefix)) => {
            builder = builder.prefix(prefix);
        }
        Some(PrefixConfig::Options {
            value,
            auto,
            separator,
        }) => {
            if let Some(separator) = separator {
                builder = builder.separator(separator);
            }
            if let Some(prefix) = value {
                builder = builder.prefix(prefix);
            } else if *auto {
                builder = builder.auto_prefix();
            }
        }
        None => {}
    }

    if let Some(name) = &config.delegate {
        let delegate = bindings
            .delegate(name)
            .ok_or_else(|| SpecError::UnknownDelegate { name: name.clone() })?;
        builder = builder.delegate(delegate);
    }

    if let Some(name) = &config.model {
        let model = bindings
            .model(name)
            .ok_or_else(|| SpecError::UnknownModel { name: name.clone() })?;
        builder = builder.model(model);
    }

    for child in &config.wraps {
        builder = builder.wrap(build_spec(child, bindings)?);
    }

    Ok(builder.build())
}

/// Load all mapper definitions from a directory.
///
/// Only `.yaml` and `.yml` files are considered. Files that fail to parse
/// are skipped with a logged warning so one bad file doesn't take down the
/// rest.
///
/// # Arguments
/// * `dir_path` - Path to directory containing mapper YAMLs
///
/// # Returns
/// The loaded mapper configurations
pub fn load_mappers_from_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<MapperConfig>, String> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(format!(
            "Mapper directory does not exist: {}",
            dir_path.display()
        ));
    }

    if !dir_path.is_dir() {
        return Err(format!("Path is not a directory: {}", dir_path.display()));
    }

    let entries = fs::read_dir(dir_path)
        .map_err(|e| format!("Failed to read directory {}: {}", dir_path.display(), e))?;

    let mut configs = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();

        if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                match MapperConfig::load_from_file(&path) {
                    Ok(config) => configs.push(config),
                    Err(e) => {
                        warn!(
                            file = %path.display(),
                            error = %e,
                            "failed to load mapper definition, skipping"
                        );
                    }
                }
            }
        }
    }

    Ok(configs)
}
