//! Items and attribute values of the single table

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::error::{Error, Result};

/// Attribute name of the partition key
pub const PARTITION_KEY: &str = "pk";

/// Attribute name of the sort key
pub const SORT_KEY: &str = "sk";

/// Open attribute map of an item
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Scalar attribute value
///
/// Serialized externally tagged, so a string is `{"S":"abc"}`, a number is
/// `{"N":"75000"}` (decimal text, no float round trip) and null is `"NULL"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(Decimal),
    #[serde(rename = "NULL")]
    Null,
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AttributeValue::N(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<Decimal> for AttributeValue {
    fn from(value: Decimal) -> Self {
        AttributeValue::N(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::N(Decimal::from(value))
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::S(value.to_rfc3339())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

/// One row of the table: a composite key plus free-form attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Partition key
    pub pk: String,
    /// Sort key
    pub sk: String,
    /// Non-key attributes
    pub attributes: Attributes,
}

impl Item {
    /// Create an item with no attributes
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Merge attribute changes into this item, overwriting existing names
    pub fn merge(&mut self, changes: Attributes) {
        self.attributes.extend(changes);
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.pk, self.sk)
    }

    /// Present, non-null string attribute
    pub fn require_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(AttributeValue::S(s)) => Ok(s),
            Some(AttributeValue::Null) | None => Err(Error::MalformedItem(format!(
                "{} is missing attribute '{}'",
                self.describe(),
                name
            ))),
            Some(other) => Err(Error::MalformedItem(format!(
                "{} attribute '{}' is not a string: {:?}",
                self.describe(),
                name,
                other
            ))),
        }
    }

    /// String attribute that may be absent or null
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(_) => self.require_str(name).map(Some),
        }
    }

    /// Present numeric attribute
    ///
    /// Numbers written as strings are accepted as long as they parse.
    pub fn require_decimal(&self, name: &str) -> Result<Decimal> {
        match self.get(name) {
            Some(AttributeValue::N(n)) => Ok(*n),
            Some(AttributeValue::S(s)) => Decimal::from_str(s).map_err(|e| {
                Error::MalformedItem(format!(
                    "{} attribute '{}' is not a number: {}",
                    self.describe(),
                    name,
                    e
                ))
            }),
            Some(AttributeValue::Null) | None => Err(Error::MalformedItem(format!(
                "{} is missing attribute '{}'",
                self.describe(),
                name
            ))),
        }
    }

    /// Parsed attribute via `FromStr`
    pub fn require_parsed<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.require_str(name)?;
        raw.parse::<T>().map_err(|e| {
            Error::MalformedItem(format!("{} attribute '{}': {}", self.describe(), name, e))
        })
    }

    /// Timestamp attribute; absent means "now"
    ///
    /// Accepts RFC 3339 as well as naive ISO-8601 text, which is read as UTC.
    pub fn timestamp_or_now(&self, name: &str) -> Result<DateTime<Utc>> {
        match self.optional_str(name)? {
            Some(raw) => parse_timestamp(raw).ok_or_else(|| {
                Error::MalformedItem(format!(
                    "{} attribute '{}' is not a timestamp: {}",
                    self.describe(),
                    name,
                    raw
                ))
            }),
            None => Ok(Utc::now()),
        }
    }

    /// Timestamp attribute that must be present
    pub fn require_timestamp(&self, name: &str) -> Result<DateTime<Utc>> {
        self.require_str(name)?;
        self.timestamp_or_now(name)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
