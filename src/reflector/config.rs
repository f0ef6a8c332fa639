//! Reflector configuration.
//!
//! Two ways in: the typed builder ([`ReflectorConfig::new`]) for Rust
//! callers, and [`ReflectorConfig::from_value`] for options that arrive as a
//! dynamic record (for example decoded from JSON). Both end up in the same
//! validation, which runs before anything is instrumented.

use crate::error::{ConfigError, Result};
use crate::record::Record;
use crate::types::Value;

/// Options record keys, preferred name first.
const PARENT_KEYS: [&str; 2] = ["parent", "object"];
const PROPERTY_KEYS: [&str; 2] = ["propertyNames", "properties"];
const REFLECT_BACK_KEYS: [&str; 2] = ["reflectBack", "enableChildReflection"];

/// Construction options for a [`Reflector`](super::Reflector).
///
/// Fields hold raw values so that malformed dynamic options survive until
/// validation and produce a proper [`ConfigError`].
///
/// # Example
///
/// ```
/// use object_reflector::{Record, Reflector, ReflectorConfig};
///
/// let parent = Record::from_pairs([("x", 1)]);
/// let reflector = Reflector::create(
///     ReflectorConfig::new(&parent).with_properties(["x"]).with_reflect_back(true),
/// )
/// .unwrap();
/// assert!(reflector.reflects_back());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReflectorConfig {
    /// Required. Must be a record.
    pub parent: Option<Value>,
    /// Optional. Must be an array of strings.
    pub properties: Option<Value>,
    /// Let children write mirrored properties back to the parent.
    pub reflect_back: bool,
}

impl ReflectorConfig {
    /// Options for `parent` with no properties and reflect-back off.
    pub fn new(parent: &Record) -> Self {
        Self {
            parent: Some(Value::from(parent)),
            ..Self::default()
        }
    }

    /// Set the mirrored property names.
    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(Value::array(names.into_iter().map(|name| Value::String(name.into()))));
        self
    }

    pub fn with_reflect_back(mut self, enabled: bool) -> Self {
        self.reflect_back = enabled;
        self
    }

    /// Read options from a dynamic options record.
    ///
    /// Missing options, or options that are not a record, read as an empty
    /// record. Each field accepts two spellings: `parent`/`object`,
    /// `propertyNames`/`properties`, `reflectBack`/`enableChildReflection`.
    /// The reflect-back flag is taken by truthiness.
    pub fn from_value(options: Option<&Value>) -> Self {
        let Some(options) = options.and_then(Value::as_record) else {
            return Self::default();
        };
        Self {
            parent: lookup(options, &PARENT_KEYS),
            properties: lookup(options, &PROPERTY_KEYS),
            reflect_back: lookup(options, &REFLECT_BACK_KEYS).is_some_and(|v| v.is_truthy()),
        }
    }

    /// Check the options, returning the parent and the property names.
    pub(crate) fn validate(&self) -> Result<(Record, Option<Vec<String>>)> {
        let parent = match &self.parent {
            None => return Err(ConfigError::MissingParent),
            Some(Value::Null) => return Err(ConfigError::NullParent),
            Some(Value::Object(record)) => record.clone(),
            Some(other) => {
                return Err(ConfigError::InvalidParent {
                    found: other.type_name(),
                });
            }
        };
        let names = self.properties.as_ref().map(property_names).transpose()?;
        Ok((parent, names))
    }
}

/// First key of `keys` present on `options` (present-but-undefined counts).
fn lookup(options: &Record, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find(|key| options.has(key))
        .map(|key| options.get(key))
}

/// Turn a dynamic property list into names, rejecting non-arrays and
/// non-string entries.
pub(crate) fn property_names(value: &Value) -> Result<Vec<String>> {
    let items = value.as_array().ok_or(ConfigError::InvalidProperties {
        found: value.type_name(),
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(ConfigError::InvalidPropertyName {
                    found: item.type_name(),
                })
        })
        .collect()
}
