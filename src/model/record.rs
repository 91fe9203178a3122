//! Model instances built from API records
//!
//! A [`Record`] keeps the data exactly as the API returned it (`original`)
//! next to the attribute map callers read from (`attributes`). Attributes are
//! derived once, at construction, from the model's [`AttributeSchema`]:
//! date casting first, then appended accessors.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Date format used when a model declares none
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

const CANONICAL_DATE: &str = "%Y-%m-%d";
const CANONICAL_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Computes a derived attribute from the record's attributes
pub type Accessor = Arc<dyn Fn(&Map<String, Value>) -> Value + Send + Sync>;

/// Reshapes raw API data before a record is built from it
pub type Formatter = Arc<dyn Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync>;

/// Casting and accessor rules shared by every record of one model
#[derive(Clone, Default)]
pub struct AttributeSchema {
    pub(crate) dates: Vec<String>,
    pub(crate) date_format: Option<String>,
    pub(crate) appends: Vec<String>,
    pub(crate) accessors: BTreeMap<String, Accessor>,
    pub(crate) formatter: Option<Formatter>,
}

impl AttributeSchema {
    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn is_date(&self, key: &str) -> bool {
        self.dates.iter().any(|date| date == key)
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn appends(&self) -> &[String] {
        &self.appends
    }

    pub fn has_accessor(&self, key: &str) -> bool {
        self.accessors.contains_key(key)
    }

    fn cast(&self, key: &str, value: &Value) -> Value {
        if !self.is_date(key) {
            return value.clone();
        }

        let Some(text) = value.as_str() else {
            return value.clone();
        };

        let format = self.date_format();
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Value::String(datetime.format(CANONICAL_DATETIME).to_string());
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Value::String(date.format(CANONICAL_DATE).to_string());
        }

        tracing::warn!(
            "Attribute `{}` value {:?} does not match date format {:?}",
            key,
            text,
            format
        );
        value.clone()
    }
}

impl fmt::Debug for AttributeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSchema")
            .field("dates", &self.dates)
            .field("date_format", &self.date_format())
            .field("appends", &self.appends)
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// A single result of the API
#[derive(Clone)]
pub struct Record {
    original: Map<String, Value>,
    attributes: Map<String, Value>,
    schema: Arc<AttributeSchema>,
}

impl Record {
    /// Build a record with no casting rules
    pub fn new(data: Map<String, Value>) -> Self {
        Self::build(data, Arc::new(AttributeSchema::default()))
    }

    /// Build a record, applying the schema's formatter, casts and appends
    pub fn build(data: Map<String, Value>, schema: Arc<AttributeSchema>) -> Self {
        if data.is_empty() {
            return Self {
                original: Map::new(),
                attributes: Map::new(),
                schema,
            };
        }

        let data = match &schema.formatter {
            Some(formatter) => formatter(data),
            None => data,
        };

        let mut attributes: Map<String, Value> = data
            .iter()
            .map(|(key, value)| (key.clone(), schema.cast(key, value)))
            .collect();

        for name in &schema.appends {
            let value = match schema.accessors.get(name) {
                Some(accessor) => accessor(&attributes),
                None => attributes.get(name).cloned().unwrap_or(Value::Null),
            };
            attributes.insert(name.clone(), value);
        }

        Self {
            original: data,
            attributes,
            schema,
        }
    }

    /// Read an attribute, preferring a registered accessor
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(accessor) = self.schema.accessors.get(key) {
            return Some(accessor(&self.attributes));
        }
        self.attributes.get(key).cloned()
    }

    /// Borrow a stored attribute without consulting accessors
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Read a string attribute
    pub fn str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Read a casted date attribute
    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        let text = self.attributes.get(key)?.as_str()?;
        if let Ok(datetime) = text.parse::<NaiveDateTime>() {
            return Some(datetime);
        }
        NaiveDate::parse_from_str(text, CANONICAL_DATE)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN))
    }

    /// Data as returned by the API
    pub fn original(&self) -> &Map<String, Value> {
        &self.original
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Convert the attributes into a typed value
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.attributes.clone()))
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original && self.attributes == other.attributes
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("original", &self.original)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
