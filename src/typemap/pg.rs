//! PostgreSQL type table.

use super::{AbstractType, SwaggerType};

pub fn abstract_type(dt: &str, _dtxp: Option<&str>) -> AbstractType {
    match dt {
        "anyenum" | "enum" => AbstractType::Enum,
        "set" => AbstractType::Set,
        "bit" | "int" | "int2" | "int4" | "int8" | "integer" | "bigint" | "bigserial"
        | "serial" | "serial2" | "serial4" | "serial8" | "smallint" | "smallserial"
        | "tinyint" | "mediumint" => AbstractType::Integer,
        "bool" | "boolean" => AbstractType::Boolean,
        "float4" | "float8" | "double precision" | "real" | "float" | "decimal" | "double" => {
            AbstractType::Float
        }
        "date" => AbstractType::Date,
        "time" | "time without time zone" | "timetz" | "time with time zone" => {
            AbstractType::Time
        }
        "timestamp"
        | "timestamp without time zone"
        | "timestamptz"
        | "timestamp with time zone"
        | "datetime" => AbstractType::DateTime,
        "text" | "tinytext" | "mediumtext" | "longtext" => AbstractType::Text,
        "blob" | "tinyblob" | "mediumblob" | "longblob" => AbstractType::Blob,
        "json" | "jsonb" => AbstractType::Json,
        "geometry" | "linestring" | "multipoint" | "multilinestring" | "multipolygon" => {
            AbstractType::Geometry
        }
        _ => AbstractType::String,
    }
}

pub fn swagger_type(dt: &str) -> SwaggerType {
    match dt {
        "bit" | "int" | "int2" | "int4" | "int8" | "integer" | "bigint" | "bigserial"
        | "serial" | "serial2" | "serial4" | "serial8" | "smallint" | "smallserial"
        | "tinyint" | "mediumint" => SwaggerType::INTEGER,
        "bool" | "boolean" => SwaggerType::BOOLEAN,
        "float4" | "real" | "float" => SwaggerType::FLOAT,
        "float8" | "double precision" | "double" | "numeric" | "decimal" | "money" => {
            SwaggerType::DOUBLE
        }
        "date" => SwaggerType::DATE,
        "timestamp"
        | "timestamp without time zone"
        | "timestamptz"
        | "timestamp with time zone"
        | "datetime" => SwaggerType::DATE_TIME,
        "bytea" | "blob" => SwaggerType::BINARY,
        "uuid" => SwaggerType::UUID,
        _ => SwaggerType::STRING,
    }
}
