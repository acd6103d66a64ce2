//! Record schemas for JSON input.
//!
//! A schema file names the record type and declares the type of each
//! member that queries may refer to:
//!
//! ```toml
//! name = "User"
//!
//! [fields]
//! FirstName = "string"
//! Score = "integer"
//! Birthday = "datetime"
//! Tags = { list = "string" }
//! NullableInt = { optional = "integer" }
//! Status = { enum = ["Offline", "Online", "Away"] }
//! Team = { optional = { record = { Name = "string" } } }
//! ```
//!
//! Enum variants listed as an array take their index as discriminant; a
//! table such as `{ enum = { Low = 1, High = 10 } }` sets them explicitly.
//! Nested records are named after the member that holds them.

use std::fs;
use std::path::Path;

use recfilter::record::EnumType;
use recfilter::{FieldType, RecordType};
use serde::Deserialize;
use toml::Value as TomlValue;

use crate::commands::{CommandError, Result};

const TYPE_NAMES: &str = "bool, integer, float, string, datetime";

/// Schema file contents.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    /// Record type name, used in error messages.
    #[serde(default = "default_name")]
    name: String,

    /// Member declarations.
    #[serde(default)]
    fields: toml::Table,
}

fn default_name() -> String {
    "Record".to_string()
}

/// Reads a schema file.
pub fn load_schema(path: &Path) -> Result<RecordType> {
    let content = fs::read_to_string(path)?;
    parse_schema(&content)
}

/// Parses schema TOML into a record type.
pub fn parse_schema(content: &str) -> Result<RecordType> {
    let file: SchemaFile =
        toml::from_str(content).map_err(|e| CommandError::Schema(e.to_string()))?;
    record_type(file.name, &file.fields)
}

fn record_type(name: String, fields: &toml::Table) -> Result<RecordType> {
    fields
        .iter()
        .try_fold(RecordType::new(name), |record, (field, declared)| {
            Ok(record.field(field.as_str(), field_type(field, declared)?))
        })
}

fn field_type(field: &str, declared: &TomlValue) -> Result<FieldType> {
    match declared {
        TomlValue::String(name) => scalar_type(field, name),
        TomlValue::Table(table) => {
            let mut entries = table.iter();
            let (Some((kind, inner)), None) = (entries.next(), entries.next()) else {
                return Err(schema_error(
                    field,
                    "expected a table with exactly one of list, optional, enum or record",
                ));
            };
            match kind.as_str() {
                "list" => Ok(FieldType::list(field_type(field, inner)?)),
                "optional" => Ok(FieldType::optional(field_type(field, inner)?)),
                "enum" => enum_type(field, inner).map(FieldType::Enum),
                "record" => match inner {
                    TomlValue::Table(members) => {
                        record_type(field.to_string(), members).map(FieldType::record)
                    }
                    _ => Err(schema_error(field, "`record` must be a table of members")),
                },
                other => Err(schema_error(field, format!("unknown type constructor `{other}`"))),
            }
        }
        other => Err(schema_error(
            field,
            format!("expected a type name or table, found {}", other.type_str()),
        )),
    }
}

fn scalar_type(field: &str, name: &str) -> Result<FieldType> {
    match name.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => Ok(FieldType::Bool),
        "integer" | "int" => Ok(FieldType::Integer),
        "float" | "number" => Ok(FieldType::Float),
        "string" => Ok(FieldType::String),
        "datetime" | "date" => Ok(FieldType::DateTime),
        _ => Err(schema_error(
            field,
            format!("unknown type `{name}` (expected one of {TYPE_NAMES})"),
        )),
    }
}

fn enum_type(field: &str, declared: &TomlValue) -> Result<EnumType> {
    let empty = EnumType::new(field);
    match declared {
        TomlValue::Array(variants) => {
            variants
                .iter()
                .zip(0..)
                .try_fold(empty, |enum_type, (variant, index)| match variant {
                    TomlValue::String(name) => Ok(enum_type.variant(name.as_str(), index)),
                    _ => Err(schema_error(field, "enum variants must be strings")),
                })
        }
        TomlValue::Table(variants) => {
            variants
                .iter()
                .try_fold(empty, |enum_type, (name, discriminant)| {
                    match discriminant {
                        TomlValue::Integer(value) => Ok(enum_type.variant(name.as_str(), *value)),
                        _ => Err(schema_error(
                            field,
                            format!("discriminant of `{name}` must be an integer"),
                        )),
                    }
                })
        }
        _ => Err(schema_error(field, "`enum` must be an array or table of variants")),
    }
}

fn schema_error(field: &str, message: impl std::fmt::Display) -> CommandError {
    CommandError::Schema(format!("field `{field}`: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_fields() {
        let record = parse_schema(
            r#"
            name = "Entry"

            [fields]
            Name = "string"
            Score = "float"
            Count = "int"
            Active = "bool"
            Created = "datetime"
            "#,
        )
        .unwrap();

        assert_eq!(record.name(), "Entry");
        assert_eq!(record.lookup("Name").unwrap().1, &FieldType::String);
        assert_eq!(record.lookup("Score").unwrap().1, &FieldType::Float);
        assert_eq!(record.lookup("Count").unwrap().1, &FieldType::Integer);
        assert_eq!(record.lookup("Active").unwrap().1, &FieldType::Bool);
        assert_eq!(record.lookup("Created").unwrap().1, &FieldType::DateTime);
    }

    #[test]
    fn test_parse_compound_fields() {
        let record = parse_schema(
            r#"
            [fields]
            Tags = { list = "string" }
            NullableInt = { optional = "integer" }
            Team = { optional = { record = { Name = "string", Size = "integer" } } }
            "#,
        )
        .unwrap();

        assert_eq!(record.name(), "Record");
        assert_eq!(
            record.lookup("Tags").unwrap().1,
            &FieldType::list(FieldType::String)
        );
        assert_eq!(
            record.lookup("NullableInt").unwrap().1,
            &FieldType::optional(FieldType::Integer)
        );

        let team = record.lookup("Team").unwrap().1.record_type().unwrap();
        assert_eq!(team.name(), "Team");
        assert_eq!(team.lookup("Size").unwrap().1, &FieldType::Integer);
    }

    #[test]
    fn test_parse_enum_fields() {
        let record = parse_schema(
            r#"
            [fields]
            Status = { enum = ["Offline", "Online", "Away"] }
            Priority = { enum = { Low = 1, High = 10 } }
            "#,
        )
        .unwrap();

        let FieldType::Enum(status) = record.lookup("Status").unwrap().1 else {
            panic!("expected an enum");
        };
        assert_eq!(status.discriminant_of("away"), Some(2));

        let FieldType::Enum(priority) = record.lookup("Priority").unwrap().1 else {
            panic!("expected an enum");
        };
        assert_eq!(priority.discriminant_of("High"), Some(10));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = parse_schema("[fields]\nName = \"strng\"\n").unwrap_err();
        assert!(matches!(err, CommandError::Schema(_)));
        assert!(err.to_string().contains("unknown type `strng`"));
    }

    #[test]
    fn test_malformed_constructors_are_rejected() {
        for content in [
            "[fields]\nTags = { list = \"string\", optional = \"string\" }\n",
            "[fields]\nTags = { set = \"string\" }\n",
            "[fields]\nStatus = { enum = [1, 2] }\n",
            "[fields]\nTeam = { record = \"Team\" }\n",
            "[fields]\nScore = 3\n",
        ] {
            assert!(
                matches!(parse_schema(content), Err(CommandError::Schema(_))),
                "schema: {content}"
            );
        }
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        assert!(matches!(
            parse_schema("title = \"x\"\n"),
            Err(CommandError::Schema(_))
        ));
    }
}
