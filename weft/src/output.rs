//! # Output Formatting
//!
//! Small wrappers turning results into printable strings, so `main` stays a
//! thin dispatcher.
use std::fmt::Display;

/// A wrapper struct for a formatted string. Implements `Display` so it can be
/// printed directly.
pub struct FormattedString(pub String);

pub struct ServiceList(pub Vec<String>);

impl Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<ServiceList> for FormattedString {
    fn from(list: ServiceList) -> Self {
        FormattedString(list.0.join("\n"))
    }
}
