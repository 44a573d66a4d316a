//! OpenAPI primitive types.

use serde::Serialize;
use std::fmt;

/// OpenAPI primitive type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl fmt::Display for SwaggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwaggerKind::String => "string",
            SwaggerKind::Integer => "integer",
            SwaggerKind::Number => "number",
            SwaggerKind::Boolean => "boolean",
        })
    }
}

/// An OpenAPI `{type, format?}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SwaggerType {
    #[serde(rename = "type")]
    pub kind: SwaggerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
}

impl SwaggerType {
    pub const STRING: SwaggerType = SwaggerType::plain(SwaggerKind::String);
    pub const INTEGER: SwaggerType = SwaggerType::plain(SwaggerKind::Integer);
    pub const BOOLEAN: SwaggerType = SwaggerType::plain(SwaggerKind::Boolean);
    pub const FLOAT: SwaggerType = SwaggerType::formatted(SwaggerKind::Number, "float");
    pub const DOUBLE: SwaggerType = SwaggerType::formatted(SwaggerKind::Number, "double");
    pub const BINARY: SwaggerType = SwaggerType::formatted(SwaggerKind::String, "binary");
    pub const UUID: SwaggerType = SwaggerType::formatted(SwaggerKind::String, "uuid");
    pub const DATE: SwaggerType = SwaggerType::formatted(SwaggerKind::String, "date");
    pub const DATE_TIME: SwaggerType = SwaggerType::formatted(SwaggerKind::String, "date-time");

    pub const fn plain(kind: SwaggerKind) -> Self {
        Self { kind, format: None }
    }

    pub const fn formatted(kind: SwaggerKind, format: &'static str) -> Self {
        Self {
            kind,
            format: Some(format),
        }
    }
}

impl Default for SwaggerType {
    fn default() -> Self {
        Self::STRING
    }
}
