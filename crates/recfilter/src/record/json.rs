//! JSON-backed records.
//!
//! [`JsonRecord`] exposes a JSON object through a [`RecordType`], converting
//! members on read according to their declared types. Date/time members are
//! parsed with the same [`CompilerConfig`] rules as query literals, so a
//! string means the same instant on both sides of a comparison.

use std::sync::Arc;

use serde_json::Value as Json;

use super::{Field, FieldType, Record, RecordType, Value};
use crate::config::CompilerConfig;

static NULL: Json = Json::Null;

/// A JSON object read through a record type.
#[derive(Debug, Clone)]
pub struct JsonRecord {
    value: Json,
    record_type: Arc<RecordType>,
    config: Arc<CompilerConfig>,
}

impl JsonRecord {
    /// Wraps a JSON value. Non-object values expose no members.
    ///
    /// Date/time members are read with the default configuration.
    pub fn new(value: Json, record_type: Arc<RecordType>) -> Self {
        Self::with_config(value, record_type, Arc::default())
    }

    /// Wraps a JSON value, reading date/time members with `config`.
    pub fn with_config(
        value: Json,
        record_type: Arc<RecordType>,
        config: Arc<CompilerConfig>,
    ) -> Self {
        Self {
            value,
            record_type,
            config,
        }
    }

    /// Wraps every element of a JSON array, or a single object as one record.
    pub fn from_document(document: Json, record_type: Arc<RecordType>) -> Vec<JsonRecord> {
        Self::from_document_with_config(document, record_type, Arc::default())
    }

    /// Like [`JsonRecord::from_document`], reading date/time members with `config`.
    pub fn from_document_with_config(
        document: Json,
        record_type: Arc<RecordType>,
        config: Arc<CompilerConfig>,
    ) -> Vec<JsonRecord> {
        match document {
            Json::Array(items) => items
                .into_iter()
                .map(|item| {
                    JsonRecord::with_config(item, Arc::clone(&record_type), Arc::clone(&config))
                })
                .collect(),
            other => vec![JsonRecord::with_config(other, record_type, config)],
        }
    }

    /// Returns the underlying JSON value.
    pub fn json(&self) -> &Json {
        &self.value
    }

    /// Consumes the record, returning the underlying JSON value.
    pub fn into_json(self) -> Json {
        self.value
    }

    /// Returns the record type.
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Returns the configuration used to read date/time members.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn view(&self) -> JsonView<'_> {
        JsonView {
            value: &self.value,
            record_type: Arc::clone(&self.record_type),
            config: &self.config,
        }
    }
}

impl Record for JsonRecord {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.view().member(name)
    }
}

/// A borrowed JSON object read through a record type.
struct JsonView<'a> {
    value: &'a Json,
    record_type: Arc<RecordType>,
    config: &'a CompilerConfig,
}

impl<'a> JsonView<'a> {
    fn member(&self, name: &str) -> Option<Field<'a>> {
        let (declared, field_type) = self.record_type.lookup(name)?;
        let member = self.value.get(declared).unwrap_or(&NULL);
        Some(read_member(member, field_type, self.config))
    }
}

impl Record for JsonView<'_> {
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.member(name)
    }
}

fn read_member<'a>(
    member: &'a Json,
    field_type: &FieldType,
    config: &'a CompilerConfig,
) -> Field<'a> {
    if member.is_null() {
        return Field::Value(Value::Null);
    }
    match field_type.record_type() {
        Some(record_type) if member.is_object() => Field::record(JsonView {
            value: member,
            record_type,
            config,
        }),
        Some(_) => Field::Value(Value::Null),
        None => Field::Value(to_value(member, field_type, config)),
    }
}

/// Converts a JSON value to a runtime value of the given type.
///
/// Strings of date/time members are parsed with
/// [`CompilerConfig::parse_datetime`]. Values that do not fit the declared
/// type read as null.
pub fn to_value(json: &Json, field_type: &FieldType, config: &CompilerConfig) -> Value {
    match (field_type.unwrap_optional(), json) {
        (_, Json::Null) => Value::Null,
        (FieldType::Bool, Json::Bool(b)) => Value::Bool(*b),
        (FieldType::Integer, Json::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        (FieldType::Float, Json::Number(n)) => n.as_f64().map_or(Value::Null, Value::Float),
        (FieldType::String, Json::String(s)) => Value::String(s.clone()),
        (FieldType::DateTime, Json::String(s)) => config
            .parse_datetime(s)
            .map_or(Value::Null, Value::DateTime),
        (FieldType::Enum(enum_type), Json::String(s)) => enum_type
            .discriminant_of(s)
            .map_or(Value::Null, Value::Integer),
        (FieldType::Enum(_), Json::Number(n)) => n.as_i64().map_or(Value::Null, Value::Integer),
        (FieldType::List(element), Json::Array(items)) => Value::List(
            items
                .iter()
                .map(|item| to_value(item, element, config))
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EnumType;
    use serde_json::json;

    fn user_type() -> Arc<RecordType> {
        let team = RecordType::new("Team")
            .field("Name", FieldType::String)
            .field("Size", FieldType::Integer);
        Arc::new(
            RecordType::new("User")
                .field("Name", FieldType::String)
                .field(
                    "Status",
                    FieldType::Enum(
                        EnumType::new("Status")
                            .variant("Offline", 0)
                            .variant("Online", 1),
                    ),
                )
                .field("Tags", FieldType::list(FieldType::String))
                .field("Joined", FieldType::DateTime)
                .field("Team", FieldType::optional(FieldType::record(team))),
        )
    }

    fn read(record: &JsonRecord, name: &str) -> Value {
        match record.field(name) {
            Some(Field::Value(value)) => value,
            other => panic!("expected value for {name}, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_declared_members() {
        let record = JsonRecord::new(
            json!({"Name": "Ann", "Status": "online", "Tags": ["x", "y"]}),
            user_type(),
        );

        assert_eq!(read(&record, "Name"), Value::from("Ann"));
        assert_eq!(read(&record, "Status"), Value::Integer(1));
        assert_eq!(read(&record, "Tags"), Value::from(vec!["x", "y"]));
        assert!(record.field("Unknown").is_none());
    }

    #[test]
    fn test_absent_and_mistyped_members_are_null() {
        let record = JsonRecord::new(json!({"Name": 42}), user_type());
        assert_eq!(read(&record, "Name"), Value::Null);
        assert_eq!(read(&record, "Joined"), Value::Null);
        assert_eq!(read(&record, "Team"), Value::Null);
    }

    #[test]
    fn test_reads_dates() {
        let record = JsonRecord::new(json!({"Joined": "2000-01-01"}), user_type());
        let Value::DateTime(joined) = read(&record, "Joined") else {
            panic!("expected date/time");
        };
        assert_eq!(joined.to_rfc3339(), "2000-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_reads_dates_with_configured_formats() {
        let record = JsonRecord::new(json!({"Joined": "1999/01/01"}), user_type());
        let Value::DateTime(joined) = read(&record, "Joined") else {
            panic!("expected date/time");
        };
        assert_eq!(joined.to_rfc3339(), "1999-01-01T00:00:00+00:00");

        let config = Arc::new(CompilerConfig {
            date_formats: vec!["%d.%m.%Y".to_string()],
            default_offset: "+02:00".to_string(),
            ..CompilerConfig::default()
        });
        let record = JsonRecord::with_config(json!({"Joined": "24.12.2021"}), user_type(), config);
        let Value::DateTime(joined) = read(&record, "Joined") else {
            panic!("expected date/time");
        };
        assert_eq!(joined.to_rfc3339(), "2021-12-24T00:00:00+02:00");
        assert_eq!(record.config().default_offset, "+02:00");
    }

    #[test]
    fn test_nested_records_share_config() {
        let team = RecordType::new("Team").field("Founded", FieldType::DateTime);
        let record_type =
            Arc::new(RecordType::new("User").field("Team", FieldType::record(team)));
        let config = Arc::new(CompilerConfig {
            default_offset: "-05:00".to_string(),
            ..CompilerConfig::default()
        });
        let record = JsonRecord::with_config(
            json!({"Team": {"Founded": "2020-05-17 13:45:00"}}),
            record_type,
            config,
        );

        let Some(Field::Record(team)) = record.field("Team") else {
            panic!("expected nested record");
        };
        match team.field("Founded") {
            Some(Field::Value(Value::DateTime(founded))) => {
                assert_eq!(founded.to_rfc3339(), "2020-05-17T13:45:00-05:00");
            }
            other => panic!("unexpected member: {other:?}"),
        };
    }

    #[test]
    fn test_nested_objects_are_records() {
        let record = JsonRecord::new(json!({"Team": {"Name": "Frenchies"}}), user_type());
        let Some(Field::Record(team)) = record.field("Team") else {
            panic!("expected nested record");
        };
        match team.field("Name") {
            Some(Field::Value(value)) => assert_eq!(value, Value::from("Frenchies")),
            other => panic!("unexpected member: {other:?}"),
        };
    }

    #[test]
    fn test_from_document() {
        let records = JsonRecord::from_document(json!([{"Name": "a"}, {"Name": "b"}]), user_type());
        assert_eq!(records.len(), 2);
        assert_eq!(JsonRecord::from_document(json!({"Name": "a"}), user_type()).len(), 1);
    }

    #[test]
    fn test_from_document_with_config_shares_config() {
        let config = Arc::new(CompilerConfig {
            default_offset: "+01:00".to_string(),
            ..CompilerConfig::default()
        });
        let records = JsonRecord::from_document_with_config(
            json!([{"Joined": "2000-01-01"}, {"Joined": "2000-01-02"}]),
            user_type(),
            Arc::clone(&config),
        );
        assert_eq!(Arc::strong_count(&config), 3);
        for record in &records {
            let Value::DateTime(joined) = read(record, "Joined") else {
                panic!("expected date/time");
            };
            assert_eq!(joined.offset().local_minus_utc(), 3600);
        }
    }
}
