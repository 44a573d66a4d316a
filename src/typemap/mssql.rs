//! SQL Server type table.

use super::{AbstractType, SwaggerType};

pub fn abstract_type(dt: &str, _dtxp: Option<&str>) -> AbstractType {
    match dt {
        "bigint" | "smallint" | "bit" | "tinyint" | "int" => AbstractType::Integer,
        "date" => AbstractType::Date,
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => AbstractType::DateTime,
        "decimal" | "float" | "numeric" | "real" => AbstractType::Float,
        "ntext" | "text" => AbstractType::Text,
        "json" => AbstractType::Json,
        "time" => AbstractType::Time,
        "geography" | "geometry" => AbstractType::Geometry,
        // rowversion, not a point in time
        "timestamp" => AbstractType::String,
        _ => AbstractType::String,
    }
}

pub fn swagger_type(dt: &str) -> SwaggerType {
    match dt {
        "bigint" | "smallint" | "tinyint" | "int" => SwaggerType::INTEGER,
        "bit" => SwaggerType::BOOLEAN,
        "real" => SwaggerType::FLOAT,
        "decimal" | "float" | "numeric" | "money" | "smallmoney" => SwaggerType::DOUBLE,
        "date" => SwaggerType::DATE,
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => SwaggerType::DATE_TIME,
        "binary" | "varbinary" | "image" => SwaggerType::BINARY,
        "uniqueidentifier" => SwaggerType::UUID,
        _ => SwaggerType::STRING,
    }
}
