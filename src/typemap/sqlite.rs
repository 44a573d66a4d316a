//! SQLite type table.

use super::{AbstractType, SwaggerType};

pub fn abstract_type(dt: &str, _dtxp: Option<&str>) -> AbstractType {
    match dt {
        "date" => AbstractType::Date,
        "datetime" | "timestamp" => AbstractType::DateTime,
        "integer" | "int" | "tinyint" | "smallint" | "mediumint" | "bigint" | "int2"
        | "int8" => AbstractType::Integer,
        "text" => AbstractType::Text,
        "boolean" => AbstractType::Boolean,
        "real" | "double" | "double precision" | "float" | "numeric" | "decimal" => {
            AbstractType::Float
        }
        "blob sub_type text" | "blob" => AbstractType::Blob,
        "json" => AbstractType::Json,
        _ => AbstractType::String,
    }
}

pub fn swagger_type(dt: &str) -> SwaggerType {
    match dt {
        "integer" | "int" | "tinyint" | "smallint" | "mediumint" | "bigint" | "int2"
        | "int8" => SwaggerType::INTEGER,
        "boolean" => SwaggerType::BOOLEAN,
        "float" => SwaggerType::FLOAT,
        "real" | "double" | "double precision" | "numeric" | "decimal" => SwaggerType::DOUBLE,
        "date" => SwaggerType::DATE,
        "datetime" | "timestamp" => SwaggerType::DATE_TIME,
        "blob" => SwaggerType::BINARY,
        _ => SwaggerType::STRING,
    }
}
