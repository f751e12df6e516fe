//! Config file formats and the parser registry.
//!
//! The format of a config file is decided by its extension alone. Data
//! formats map text to a [`serde_json::Value`]; code configs are handed to a
//! [`ModuleLoader`](crate::module::ModuleLoader) instead.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::path::Path;

use crate::error::ParseError;

/// A function turning config text into a structured value.
pub type ParseFn = fn(&str) -> Result<Value, ParseError>;

/// Format of a discovered config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// `.json` / `.json5`, parsed with the JSON5 grammar
    Json,
    /// `.toml`
    Toml,
    /// `.js`, evaluated by a module loader
    Code,
    /// Any other extension (including none); falls back to JSON5
    Other,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "json" | "json5" => ConfigFormat::Json,
            "toml" => ConfigFormat::Toml,
            "js" => ConfigFormat::Code,
            _ => ConfigFormat::Other,
        }
    }

    /// Format of `path`, judged by the text after its last dot.
    ///
    /// Dotfiles such as `.babelrc` have no extension and land on `Other`.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(ConfigFormat::Other)
    }

    /// True when the file must be executed rather than parsed.
    pub fn is_code(self) -> bool {
        matches!(self, ConfigFormat::Code)
    }

    /// The parser for this format, or `None` for code configs.
    pub fn parser(self) -> Option<ParseFn> {
        match self {
            ConfigFormat::Json | ConfigFormat::Other => Some(parse_json5),
            ConfigFormat::Toml => Some(parse_toml),
            ConfigFormat::Code => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "json"),
            ConfigFormat::Toml => write!(f, "toml"),
            ConfigFormat::Code => write!(f, "code"),
            ConfigFormat::Other => write!(f, "json5"),
        }
    }
}

/// Look up the parser registered for `ext`, defaulting to JSON5.
pub fn parser_for(ext: &str) -> ParseFn {
    ConfigFormat::from_extension(ext)
        .parser()
        .unwrap_or(parse_json5)
}

/// Parse JSON5 text (a superset of JSON: comments, trailing commas, unquoted keys).
pub fn parse_json5(text: &str) -> Result<Value, ParseError> {
    Ok(json5::from_str::<Value>(text)?)
}

/// Parse a TOML document into a JSON value.
///
/// Datetimes become their RFC 3339 string form. Non-finite floats have no
/// JSON representation and become strings as well.
pub fn parse_toml(text: &str) -> Result<Value, ParseError> {
    let table = toml::from_str::<toml::Table>(text)?;
    Ok(toml_table_to_json(table))
}

fn toml_table_to_json(table: toml::Table) -> Value {
    let map: Map<String, Value> = table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect();
    Value::Object(map)
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => toml_table_to_json(table),
    }
}
