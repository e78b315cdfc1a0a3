use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::value::{fields_from_json, fields_to_json, Fields};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "holiday")]
pub struct Model {
    /// `YYYYMMDD`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub attributes: Json,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A holiday as the API sees it: `{"_id": "20250101", ...attributes}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HolidayDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl HolidayDocument {
    /// Split a raw request body into identifier and attributes.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        let serde_json::Value::Object(mut map) = value else {
            return Err(ModelError::Validation("request body must be a JSON object".into()));
        };
        let id = match map.remove("_id") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            _ => return Err(ModelError::Validation("missing or invalid _id".into())),
        };
        let fields = fields_from_json(serde_json::Value::Object(map))?;
        Ok(Self { id, fields })
    }
}

impl TryFrom<Model> for HolidayDocument {
    type Error = ModelError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self { id: m.id, fields: fields_from_json(m.attributes)? })
    }
}

pub fn active_model(id: &str, fields: &Fields) -> ActiveModel {
    ActiveModel {
        id: Set(id.to_string()),
        attributes: Set(fields_to_json(fields)),
        updated_at: Set(chrono::Utc::now().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;
    use serde_json::json;

    #[test]
    fn document_requires_string_id() {
        assert!(HolidayDocument::from_json(json!({"name": "x"})).is_err());
        assert!(HolidayDocument::from_json(json!({"_id": 20250101})).is_err());
        assert!(HolidayDocument::from_json(json!({"_id": "  "})).is_err());
    }

    #[test]
    fn document_serializes_flat_with_underscore_id() {
        let doc = HolidayDocument::from_json(json!({"_id": "20250101", "name": "New Year", "isHoliday": true})).unwrap();
        assert_eq!(doc.fields["name"], FieldValue::Text("New Year".into()));
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v, json!({"_id": "20250101", "name": "New Year", "isHoliday": true}));
    }
}
