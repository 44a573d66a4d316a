//! MySQL and MariaDB type table.

use super::{AbstractType, SwaggerType};

pub fn abstract_type(dt: &str, dtxp: Option<&str>) -> AbstractType {
    match dt {
        "int" | "smallint" | "mediumint" | "bigint" | "bit" => AbstractType::Integer,
        "tinyint" if dtxp == Some("1") => AbstractType::Boolean,
        "tinyint" => AbstractType::Integer,
        "boolean" | "bool" => AbstractType::Boolean,
        "float" | "decimal" | "double" | "serial" => AbstractType::Float,
        "date" => AbstractType::Date,
        "datetime" | "timestamp" => AbstractType::DateTime,
        "time" => AbstractType::Time,
        "year" => AbstractType::Year,
        "char" | "varchar" | "nchar" | "binary" => AbstractType::String,
        "text" | "tinytext" | "mediumtext" | "longtext" | "varbinary" => AbstractType::Text,
        "blob" | "tinyblob" | "mediumblob" | "longblob" => AbstractType::Blob,
        "enum" => AbstractType::Enum,
        "set" => AbstractType::Set,
        "geometry" | "point" | "linestring" | "polygon" | "multipoint" | "multilinestring"
        | "multipolygon" | "geometrycollection" => AbstractType::Geometry,
        "json" => AbstractType::Json,
        _ => AbstractType::String,
    }
}

pub fn swagger_type(dt: &str) -> SwaggerType {
    match dt {
        "int" | "smallint" | "mediumint" | "bigint" | "bit" | "tinyint" | "year" => {
            SwaggerType::INTEGER
        }
        "boolean" | "bool" => SwaggerType::BOOLEAN,
        "float" => SwaggerType::FLOAT,
        "decimal" | "double" | "serial" => SwaggerType::DOUBLE,
        "date" => SwaggerType::DATE,
        "datetime" | "timestamp" => SwaggerType::DATE_TIME,
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
            SwaggerType::BINARY
        }
        _ => SwaggerType::STRING,
    }
}
