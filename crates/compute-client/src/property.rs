//! Metadata property values and pixel precision tags.

use serde::{Deserialize, Serialize};

/// A metadata property attached to an image or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Number(f64),
    Text(String),
    /// Tag lists (e.g. `product_tags` on collections).
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text form used for substring matching: lists are joined with
    /// `-`, scalars render naturally.
    pub fn match_text(&self) -> String {
        match self {
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::List(items) => items.join("-"),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Number(n) => n.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

/// Numeric precision for pixel values, applied via a server-side cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelPrecision {
    Double,
    Float,
    Int,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_serde() {
        let v: PropertyValue = serde_json::from_str("\"S2X_MSIL2A\"").unwrap();
        assert_eq!(v.as_text(), Some("S2X_MSIL2A"));

        let v: PropertyValue = serde_json::from_str("42").unwrap();
        assert_eq!(v.as_integer(), Some(42));

        let v: PropertyValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(v.as_number(), Some(3.5));

        let v: PropertyValue = serde_json::from_str("[\"msi\", \"reflectance\"]").unwrap();
        assert_eq!(v.match_text(), "msi-reflectance");
    }
}
