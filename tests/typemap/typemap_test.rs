//! Tests for column type classification across dialects.

use nocometa::config::Dialect;
use nocometa::introspect::LiveColumn;
use nocometa::meta::UiType;
use nocometa::typemap::{
    map_abstract_type, map_swagger_type, map_ui_type, ui_type_for_column, AbstractType,
    SwaggerKind, SwaggerType,
};

const DIALECTS: [Dialect; 5] = [
    Dialect::MySql,
    Dialect::MySql2,
    Dialect::Postgres,
    Dialect::MsSql,
    Dialect::Sqlite,
];

#[test]
fn test_every_dialect_is_total() {
    for dialect in DIALECTS {
        for dt in ["geography_v2", "user_defined", "VARCHAR(255)", "\u{0}"] {
            let uidt = map_ui_type(dialect, dt, None);
            assert_eq!(uidt, UiType::SingleLineText, "{} {:?}", dialect, dt);
            assert_eq!(map_swagger_type(dialect, dt).kind, SwaggerKind::String);
        }
    }
}

#[test]
fn test_type_names_are_case_insensitive() {
    for dialect in DIALECTS {
        assert_eq!(
            map_ui_type(dialect, " Date ", None),
            map_ui_type(dialect, "date", None)
        );
    }
    assert_eq!(map_ui_type(Dialect::Postgres, "TIMESTAMPTZ", None), UiType::DateTime);
}

#[test]
fn test_mysql_types() {
    let cases = [
        ("int", None, UiType::Number),
        ("tinyint", Some("1"), UiType::Checkbox),
        ("tinyint", Some(" 1 "), UiType::Checkbox),
        ("tinyint", Some("3"), UiType::Number),
        ("tinyint", None, UiType::Number),
        ("decimal", None, UiType::Decimal),
        ("year", None, UiType::Year),
        ("varchar", None, UiType::SingleLineText),
        ("longtext", None, UiType::LongText),
        ("blob", None, UiType::Attachment),
        ("enum", Some("'a','b'"), UiType::SingleSelect),
        ("set", Some("'a','b'"), UiType::MultiSelect),
        ("point", None, UiType::Geometry),
        ("json", None, UiType::JSON),
    ];
    for (dt, dtxp, expected) in cases {
        assert_eq!(map_ui_type(Dialect::MySql, dt, dtxp), expected, "{}", dt);
        assert_eq!(map_ui_type(Dialect::MySql2, dt, dtxp), expected, "{}", dt);
    }
}

#[test]
fn test_postgres_types() {
    let cases = [
        ("int4", UiType::Number),
        ("serial8", UiType::Number),
        ("bigint", UiType::Number),
        ("bigserial", UiType::Number),
        ("bool", UiType::Checkbox),
        ("float8", UiType::Decimal),
        ("double precision", UiType::Decimal),
        ("time with time zone", UiType::Time),
        ("timestamp without time zone", UiType::DateTime),
        ("text", UiType::LongText),
        ("json", UiType::JSON),
        ("jsonb", UiType::JSON),
        ("uuid", UiType::SingleLineText),
    ];
    for (dt, expected) in cases {
        assert_eq!(map_ui_type(Dialect::Postgres, dt, None), expected, "{}", dt);
    }
}

#[test]
fn test_mssql_timestamp_is_not_a_date() {
    assert_eq!(
        map_abstract_type(Dialect::MsSql, "timestamp", None),
        AbstractType::String
    );
    assert_eq!(
        map_abstract_type(Dialect::MsSql, "datetimeoffset", None),
        AbstractType::DateTime
    );
    assert_eq!(
        map_abstract_type(Dialect::MsSql, "geography", None),
        AbstractType::Geometry
    );
}

#[test]
fn test_sqlite_types() {
    assert_eq!(map_ui_type(Dialect::Sqlite, "integer", None), UiType::Number);
    assert_eq!(map_ui_type(Dialect::Sqlite, "real", None), UiType::Decimal);
    assert_eq!(map_ui_type(Dialect::Sqlite, "text", None), UiType::LongText);
    assert_eq!(map_ui_type(Dialect::Sqlite, "varchar", None), UiType::SingleLineText);
}

#[test]
fn test_swagger_formats() {
    assert_eq!(map_swagger_type(Dialect::MySql, "year"), SwaggerType::INTEGER);
    assert_eq!(map_swagger_type(Dialect::MsSql, "bit"), SwaggerType::BOOLEAN);
    assert_eq!(map_swagger_type(Dialect::MsSql, "uniqueidentifier"), SwaggerType::UUID);
    assert_eq!(map_swagger_type(Dialect::Sqlite, "blob"), SwaggerType::BINARY);

    let pg: Vec<(&str, SwaggerType)> = ["int8", "real", "numeric", "date", "timestamptz", "bytea", "uuid", "inet"]
        .into_iter()
        .map(|dt| (dt, map_swagger_type(Dialect::Postgres, dt)))
        .collect();

    insta::assert_json_snapshot!(pg, @r###"
    [
      [
        "int8",
        {
          "type": "integer"
        }
      ],
      [
        "real",
        {
          "type": "number",
          "format": "float"
        }
      ],
      [
        "numeric",
        {
          "type": "number",
          "format": "double"
        }
      ],
      [
        "date",
        {
          "type": "string",
          "format": "date"
        }
      ],
      [
        "timestamptz",
        {
          "type": "string",
          "format": "date-time"
        }
      ],
      [
        "bytea",
        {
          "type": "string",
          "format": "binary"
        }
      ],
      [
        "uuid",
        {
          "type": "string",
          "format": "uuid"
        }
      ],
      [
        "inet",
        {
          "type": "string"
        }
      ]
    ]
    "###);
}

#[test]
fn test_client_reported_ui_type_wins() {
    let mut column = LiveColumn::new("status", "varchar");
    assert_eq!(
        ui_type_for_column(Dialect::Postgres, &column),
        UiType::SingleLineText
    );

    column.uidt = Some(UiType::SingleSelect);
    assert_eq!(ui_type_for_column(Dialect::Postgres, &column), UiType::SingleSelect);
}
