//! Wrap specifications and mapper definitions.
//!
//! A wrap specification describes one wrapping operation: which attributes to
//! extract from a record, how to name them in the nested result, and what to
//! do with the nested result (keep it as a sub-record, hand it to a delegate
//! mapper, or construct a model instance from it). Specifications are fixed
//! at definition time and applied fresh on every record transformation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::record::Record;
use crate::value::{ModelInstance, Value};
use crate::wrap::transform::WrapError;

/// An external transformation applied to an extracted sub-record in place of
/// direct copy/rename handling.
///
/// Implementations must be `Send + Sync` so an immutable specification tree
/// can be shared across threads.
pub trait DelegateMapper: Send + Sync {
    /// Transform the extracted sub-record into the nested result.
    fn transform(&self, record: Record) -> Result<Record, WrapError>;
}

/// A factory converting a nested record into a richer constructed value.
pub trait ModelBuilder: Send + Sync {
    /// Construct a value from the nested attributes.
    fn construct(&self, attributes: Record) -> Result<Value, WrapError>;
}

/// Model builder producing a [`Value::Model`] tagged with a fixed model name.
pub struct NamedModel {
    name: String,
}

impl NamedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ModelBuilder for NamedModel {
    fn construct(&self, attributes: Record) -> Result<Value, WrapError> {
        Ok(Value::Model(ModelInstance::new(self.name.clone(), attributes)))
    }
}

/// Error type for definition-time validation and binding
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    EmptyTargetKey,
    OverlappingSources {
        key: String,
        first_target: String,
        second_target: String,
    },
    UnknownDelegate {
        name: String,
    },
    UnknownModel {
        name: String,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::EmptyTargetKey => write!(f, "Wrap target key cannot be empty"),
            SpecError::OverlappingSources {
                key,
                first_target,
                second_target,
            } => write!(
                f,
                "Source key '{}' is claimed by both wrap '{}' and wrap '{}'",
                key, first_target, second_target
            ),
            SpecError::UnknownDelegate { name } => {
                write!(f, "No delegate mapper registered under '{}'", name)
            }
            SpecError::UnknownModel { name } => {
                write!(f, "No model builder registered under '{}'", name)
            }
        }
    }
}

impl std::error::Error for SpecError {}

/// One attribute extracted by a wrap.
///
/// `local` is the name in the nested result; `from` names the source key in
/// the input record when it differs from the prefix-derived or identity name.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttr {
    pub local: String,
    pub from: Option<String>,
}

/// Describes one wrapping operation.
///
/// Built via [`WrapSpec::builder`], fixed afterwards. Holds no per-record
/// state, so concurrent callers may share one specification.
#[derive(Clone)]
pub struct WrapSpec {
    pub(crate) target_key: String,
    pub(crate) sources: Vec<SourceAttr>,
    pub(crate) prefix: Option<String>,
    pub(crate) prefix_separator: String,
    pub(crate) delegate: Option<Arc<dyn DelegateMapper>>,
    pub(crate) model: Option<Arc<dyn ModelBuilder>>,
    pub(crate) wraps: Vec<WrapSpec>,
}

impl WrapSpec {
    /// Start building a wrap specification storing its result under `target_key`.
    pub fn builder(target_key: impl Into<String>) -> WrapSpecBuilder {
        WrapSpecBuilder {
            target_key: target_key.into(),
            sources: Vec::new(),
            prefix: None,
            auto_prefix: false,
            prefix_separator: "_".to_string(),
            delegate: None,
            model: None,
            wraps: Vec::new(),
        }
    }

    /// Name under which the nested result is stored.
    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Check if a delegate mapper is configured.
    pub fn has_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    /// Check if a model builder is configured.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Resolve the input-record key a source attribute is read from.
    ///
    /// Precedence: explicit `from` rename, then prefix-derived name, then
    /// the local name itself.
    pub(crate) fn source_key(&self, attr: &SourceAttr) -> String {
        if let Some(from) = &attr.from {
            return from.clone();
        }
        match &self.prefix {
            Some(prefix) => format!("{}{}{}", prefix, self.prefix_separator, attr.local),
            None => attr.local.clone(),
        }
    }
}

impl fmt::Debug for WrapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapSpec")
            .field("target_key", &self.target_key)
            .field("sources", &self.sources)
            .field("prefix", &self.prefix)
            .field("prefix_separator", &self.prefix_separator)
            .field("delegate", &self.delegate.as_ref().map(|_| "<delegate>"))
            .field("model", &self.model.as_ref().map(|_| "<model>"))
            .field("wraps", &self.wraps)
            .finish()
    }
}

/// Builder for [`WrapSpec`].
pub struct WrapSpecBuilder {
    target_key: String,
    sources: Vec<SourceAttr>,
    prefix: Option<String>,
    auto_prefix: bool,
    prefix_separator: String,
    delegate: Option<Arc<dyn DelegateMapper>>,
    model: Option<Arc<dyn ModelBuilder>>,
    wraps: Vec<WrapSpec>,
}

impl WrapSpecBuilder {
    /// Declare an attribute of the nested result.
    ///
    /// Its source key is derived from the prefix (if any), otherwise it is
    /// the local name itself.
    pub fn attr(mut self, local: impl Into<String>) -> Self {
        self.sources.push(SourceAttr {
            local: local.into(),
            from: None,
        });
        self
    }

    /// Declare an attribute of the nested result read from a differently
    /// named source key.
    pub fn attr_from(mut self, local: impl Into<String>, from: impl Into<String>) -> Self {
        self.sources.push(SourceAttr {
            local: local.into(),
            from: Some(from.into()),
        });
        self
    }

    /// Declare extraction of the given keys as-is (local name = source key).
    pub fn source_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.sources.push(SourceAttr {
                local: key.into(),
                from: None,
            });
        }
        self
    }

    /// Look up source keys under `prefix + separator + local_name` and store
    /// them under the stripped local name.
    ///
    /// With no declared attributes, every input key matching the prefix is
    /// extracted.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Use the target key itself as the prefix.
    pub fn auto_prefix(mut self) -> Self {
        self.auto_prefix = true;
        self
    }

    /// Override the prefix separator (default `"_"`).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.prefix_separator = separator.into();
        self
    }

    /// Hand the extracted sub-record to an external mapper instead of
    /// keeping it as-is.
    ///
    /// Nested wrap declarations under the same specification become inert.
    pub fn delegate(mut self, delegate: Arc<dyn DelegateMapper>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Construct a model instance from the nested record.
    pub fn model(mut self, model: Arc<dyn ModelBuilder>) -> Self {
        self.model = Some(model);
        self
    }

    /// Apply a further wrap to the intermediate nested record.
    pub fn wrap(mut self, spec: WrapSpec) -> Self {
        self.wraps.push(spec);
        self
    }

    /// Finish building the specification.
    pub fn build(self) -> WrapSpec {
        if self.delegate.is_some() && !self.wraps.is_empty() {
            warn!(
                target_key = %self.target_key,
                "wrap declares both a delegate mapper and nested wraps; the delegate wins and the nested wraps are ignored"
            );
        }

        let prefix = match self.prefix {
            Some(prefix) => Some(prefix),
            None if self.auto_prefix => Some(self.target_key.clone()),
            None => None,
        };

        WrapSpec {
            target_key: self.target_key,
            sources: self.sources,
            prefix,
            prefix_separator: self.prefix_separator,
            delegate: self.delegate,
            model: self.model,
            wraps: self.wraps,
        }
    }
}

/// A mapper definition: declared top-level attributes, wrap specifications,
/// and the unlisted-attribute policy.
///
/// This is the unit applied to records; see
/// [`MapperDef::apply`](crate::wrap::transform) for the transformation
/// semantics.
#[derive(Debug, Clone)]
pub struct MapperDef {
    pub(crate) attributes: Vec<String>,
    pub(crate) specs: Vec<WrapSpec>,
    pub(crate) reject_unlisted: bool,
}

impl MapperDef {
    /// Start building a mapper definition.
    pub fn builder() -> MapperDefBuilder {
        MapperDefBuilder {
            attributes: Vec::new(),
            specs: Vec::new(),
            reject_unlisted: false,
        }
    }

    /// Declared top-level attribute names, in declaration order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Wrap specifications, in declaration order.
    pub fn specs(&self) -> &[WrapSpec] {
        &self.specs
    }

    /// Whether only declared attributes and wrap targets survive at the top
    /// level of the output.
    pub fn rejects_unlisted(&self) -> bool {
        self.reject_unlisted
    }
}

/// Builder for [`MapperDef`].
pub struct MapperDefBuilder {
    attributes: Vec<String>,
    specs: Vec<WrapSpec>,
    reject_unlisted: bool,
}

impl MapperDefBuilder {
    /// Declare a top-level attribute.
    ///
    /// Only meaningful together with `reject_unlisted`: declared attributes
    /// survive the top-level filter. Declaring an attribute does not protect
    /// it from removal when a wrap consumes it as a source.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// Add a wrap specification.
    pub fn wrap(mut self, spec: WrapSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Restrict top-level output to declared attributes and wrap targets.
    pub fn reject_unlisted(mut self, reject: bool) -> Self {
        self.reject_unlisted = reject;
        self
    }

    /// Validate and finish building the definition.
    ///
    /// # Errors
    /// Returns an error if a wrap (at any depth) has an empty target key, or
    /// if two sibling wraps claim the same statically known source key.
    /// Duplicate target keys across siblings are accepted with a warning;
    /// application is last-write-wins.
    pub fn build(self) -> Result<MapperDef, SpecError> {
        validate_siblings(&self.specs)?;

        Ok(MapperDef {
            attributes: self.attributes,
            specs: self.specs,
            reject_unlisted: self.reject_unlisted,
        })
    }
}

/// Validate one sibling group of wrap specifications, then recurse.
///
/// Source-set overlap is only checked between specs whose source keys are
/// statically known; prefix-glob specs depend on the record's keys and are
/// exempt.
fn validate_siblings(specs: &[WrapSpec]) -> Result<(), SpecError> {
    let mut seen_targets: HashSet<&str> = HashSet::new();
    let mut claimed: HashMap<String, &str> = HashMap::new();

    for spec in specs {
        if spec.target_key.is_empty() {
            return Err(SpecError::EmptyTargetKey);
        }

        if !seen_targets.insert(&spec.target_key) {
            warn!(
                target_key = %spec.target_key,
                "duplicate wrap target among siblings; the last wrap wins"
            );
        }

        for attr in &spec.sources {
            let key = spec.source_key(attr);
            if let Some(first_target) = claimed.get(&key) {
                return Err(SpecError::OverlappingSources {
                    key,
                    first_target: (*first_target).to_string(),
                    second_target: spec.target_key.clone(),
                });
            }
            claimed.insert(key, &spec.target_key);
        }
    }

    for spec in specs {
        validate_siblings(&spec.wraps)?;
    }

    Ok(())
}
