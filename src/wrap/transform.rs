//! The wrap transformer.
//!
//! Applies wrap specifications to records: consumed attributes are removed
//! from the top level and re-inserted as a single nested value under the
//! wrap's target key. The transformation is pure and synchronous; given the
//! same record and the same specifications it always produces the same
//! output.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::record::Record;
use crate::value::Value;
use crate::wrap::spec::{MapperDef, WrapSpec};

/// Error type for transform-time failures.
///
/// The transformer itself is total; these errors originate from delegate
/// mappers and model builders.
#[derive(Debug, Clone, PartialEq)]
pub enum WrapError {
    /// A delegate mapper rejected the extracted sub-record.
    Delegate { reason: String },
    /// A model builder could not construct its value.
    ModelConstruction { model: String, reason: String },
    /// An attribute a delegate or builder requires was absent.
    MissingAttribute { field: String },
}

impl fmt::Display for WrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapError::Delegate { reason } => {
                write!(f, "Delegate mapper failed: {}", reason)
            }
            WrapError::ModelConstruction { model, reason } => {
                write!(f, "Failed to construct model '{}': {}", model, reason)
            }
            WrapError::MissingAttribute { field } => {
                write!(f, "Required attribute '{}' is missing", field)
            }
        }
    }
}

impl std::error::Error for WrapError {}

impl MapperDef {
    /// Apply this mapper definition to a record.
    ///
    /// Wraps run in declaration order. When `reject_unlisted` is set, the
    /// top-level output is then filtered down to the declared attributes and
    /// the wrap target keys; attributes consumed as wrap sources are gone
    /// either way.
    ///
    /// # Example
    /// ```
    /// use rewrap::{MapperDef, Record, WrapSpec};
    ///
    /// let mapper = MapperDef::builder()
    ///     .wrap(
    ///         WrapSpec::builder("contact")
    ///             .source_keys(["contact_email", "contact_skype"])
    ///             .build(),
    ///     )
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut record = Record::new();
    /// record.insert("id", 1);
    /// record.insert("contact_email", "a@b.com");
    /// record.insert("contact_skype", "joe");
    ///
    /// let output = mapper.apply(&record).unwrap();
    ///
    /// assert!(output.get("contact").unwrap().as_record().is_some());
    /// assert!(!output.contains("contact_email"));
    /// ```
    pub fn apply(&self, record: &Record) -> Result<Record, WrapError> {
        let mut output = record.clone();

        for spec in &self.specs {
            apply_spec(record, &mut output, spec)?;
        }

        if self.reject_unlisted {
            let keep: HashSet<&str> = self
                .attributes
                .iter()
                .map(String::as_str)
                .chain(self.specs.iter().map(|spec| spec.target_key.as_str()))
                .collect();
            output.retain(|key, _| keep.contains(key));
        }

        Ok(output)
    }
}

/// Apply an ordered sequence of wrap specifications to a record.
///
/// This is the bare transformation without a mapper definition's top-level
/// attribute filtering; [`MapperDef::apply`] builds on it. Also used
/// recursively for nested wraps.
pub fn apply_wraps(record: &Record, specs: &[WrapSpec]) -> Result<Record, WrapError> {
    let mut output = record.clone();
    for spec in specs {
        apply_spec(record, &mut output, spec)?;
    }
    Ok(output)
}

/// Run one wrap specification against `output`.
///
/// Values are read from the original `record`, not from the mutating
/// `output`, so sibling wraps cannot alias each other's intermediate state.
/// The target key is inserted only after every removal for this spec, so a
/// wrap whose target is also one of its sources ends up holding the nested
/// value rather than the stale scalar.
fn apply_spec(record: &Record, output: &mut Record, spec: &WrapSpec) -> Result<(), WrapError> {
    let mut nested = Record::new();

    if spec.sources.is_empty() {
        if let Some(prefix) = &spec.prefix {
            let lead = format!("{}{}", prefix, spec.prefix_separator);
            for (key, value) in record.iter() {
                let local = match key.strip_prefix(lead.as_str()) {
                    Some(local) if !local.is_empty() => local,
                    _ => continue,
                };
                nested.insert(local, value.clone());
                output.remove(key);
            }
        }
    } else {
        for attr in &spec.sources {
            let source_key = spec.source_key(attr);
            match record.get(&source_key) {
                Some(value) => {
                    nested.insert(attr.local.clone(), value.clone());
                }
                None => {
                    debug!(
                        key = %source_key,
                        target_key = %spec.target_key,
                        "wrap source key absent from record, skipping"
                    );
                }
            }
            output.remove(&source_key);
        }
    }

    // Delegate substitution makes nested wrap declarations inert.
    let nested = match &spec.delegate {
        Some(delegate) => delegate.transform(nested)?,
        None => apply_wraps(&nested, &spec.wraps)?,
    };

    let value = match &spec.model {
        Some(model) => model.construct(nested)?,
        None => Value::Record(nested),
    };

    output.insert(spec.target_key.clone(), value);
    Ok(())
}
