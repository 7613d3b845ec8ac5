#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Complaint record types for the Traffy Fondue civic-complaints API.
//!
//! The upstream API answers in two shapes. The structured (JSON) format is
//! a [`RecordBatch`] envelope wrapping geo-tagged [`Feature`]s; the
//! delimited-text (CSV) export flattens every ticket into an all-string
//! [`Complaint`]. Both are stored as-is in the document collection.
//!
//! Upstream fields are loosely typed: most may be missing, `null`, or of a
//! different type than usual. Every field here defaults when absent or
//! `null`, and the fields known to change shape use [`LooseValue`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One page of structured results as returned by the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordBatch {
    /// Upstream status word (e.g. `"success"`).
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    /// Upstream status message.
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    /// Server-side execution time, as reported.
    #[serde(deserialize_with = "null_as_default")]
    pub exec_time: String,
    /// Upstream data source label.
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    /// Total number of records matching the query.
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
    /// Tally of records by ticket state.
    #[serde(deserialize_with = "null_as_default")]
    pub sum_state: SumState,
    /// Total count as reported by the counting query.
    #[serde(deserialize_with = "null_as_default")]
    pub count_total: u64,
    /// Number of records returned in this page.
    #[serde(deserialize_with = "null_as_default")]
    pub count: u64,
    /// `GeoJSON` collection type (usually `"FeatureCollection"`).
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Records in this page, in upstream order.
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
}

impl RecordBatch {
    /// Returns `true` if this page carries no features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Number of tickets per workflow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SumState {
    #[serde(deserialize_with = "null_as_default")]
    pub finish: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub follow: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub forward: u64,
    #[serde(rename = "inprogress", deserialize_with = "null_as_default")]
    pub in_progress: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub irrelevant: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub start: u64,
}

/// A single geo-tagged complaint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    /// `GeoJSON` object type (usually `"Feature"`).
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Location of the complaint, if the reporter supplied one.
    pub geometry: Option<Geometry>,
    /// Free-form ticket attributes.
    #[serde(deserialize_with = "null_as_default")]
    pub properties: Properties,
    /// When the ticket was created.
    pub created_at: Option<DateTime<Utc>>,
}

/// `GeoJSON` geometry.
///
/// A geometry missing its type or coordinates still decodes, with empty
/// values in their place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Geometry type (e.g. `"Point"`).
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Coordinates in `[longitude, latitude]` order.
    #[serde(deserialize_with = "null_as_default")]
    pub coordinates: Coordinates,
}

/// Either a single position or a path of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// A single `[longitude, latitude]` pair.
    Position(Vec<f64>),
    /// An ordered sequence of positions.
    Path(Vec<Vec<f64>>),
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::Position(Vec::new())
    }
}

/// Attributes attached to a [`Feature`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    #[serde(deserialize_with = "null_as_default")]
    pub problem_type_fondue: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub org: Vec<String>,
    pub description: Option<String>,
    pub ticket_id: Option<String>,
    pub photo_url: Option<String>,
    pub after_photo: Option<String>,
    pub address: Option<String>,
    pub subdistrict: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub timestamp: Option<String>,
    pub problem_type_abdul: Option<LooseValue>,
    pub star: Option<LooseValue>,
    pub count_reopen: Option<i64>,
    pub note: Option<LooseValue>,
    pub description_reporter: Option<LooseValue>,
    pub state: Option<String>,
    pub state_type_latest: Option<String>,
    pub last_activity: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub see_info: Option<bool>,
    /// Upstream keys not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A value whose primitive type varies between upstream records.
///
/// `null` and missing values are represented by the surrounding `Option`.
/// Nested objects are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
    Object(BTreeMap<String, serde_json::Value>),
}

impl LooseValue {
    /// Returns the value as text, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float when it is numeric or numeric text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) | Self::List(_) | Self::Object(_) => None,
        }
    }
}

/// A complaint as exported by the upstream CSV endpoint.
///
/// Every field is text, exactly as exported. Columns absent from the
/// export deserialize to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Complaint {
    pub address: String,
    pub comment: String,
    /// `"longitude,latitude"` as exported.
    pub coords: String,
    pub count_reopen: String,
    pub district: String,
    pub last_activity: String,
    pub organization: String,
    pub organization_action: String,
    /// Photo taken by the reporter.
    pub photo: String,
    /// Photo taken after resolution.
    pub photo_after: String,
    pub province: String,
    pub star: String,
    pub state: String,
    pub subdistrict: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ticket_id: String,
}

/// Deserializes `null` as the type's default instead of failing.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "success",
        "message": "ok",
        "total": 2500,
        "count_total": 2500,
        "count": 2,
        "sum_state": {"finish": 10, "inprogress": 3},
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [100.5, 13.7]},
                "properties": {
                    "ticket_id": "2023-ABC",
                    "problem_type_fondue": ["road", "light"],
                    "org": null,
                    "star": 4,
                    "note": null,
                    "count_reopen": 1,
                    "photo_url": "https://example.invalid/a.jpg",
                    "unknown_field": {"nested": true}
                },
                "created_at": "2023-06-01T08:00:00+07:00"
            },
            {
                "type": "Feature",
                "properties": {"star": "n/a", "problem_type_abdul": ["x", 1]}
            }
        ]
    }"#;

    #[test]
    fn decodes_record_batch() {
        let batch: RecordBatch = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(batch.total, 2500);
        assert_eq!(batch.sum_state.finish, 10);
        assert_eq!(batch.sum_state.in_progress, 3);
        assert_eq!(batch.sum_state.follow, 0);
        assert_eq!(batch.kind, "FeatureCollection");
        assert_eq!(batch.features.len(), 2);
    }

    #[test]
    fn tolerates_heterogeneous_properties() {
        let batch: RecordBatch = serde_json::from_str(SAMPLE).unwrap();
        let first = &batch.features[0].properties;
        assert_eq!(first.star, Some(LooseValue::Integer(4)));
        assert_eq!(first.note, None);
        assert!(first.org.is_empty());
        assert_eq!(first.problem_type_fondue, vec!["road", "light"]);

        let second = &batch.features[1].properties;
        assert_eq!(second.star.as_ref().and_then(LooseValue::as_str), Some("n/a"));
        assert_eq!(
            second.problem_type_abdul,
            Some(LooseValue::List(vec![
                LooseValue::Text("x".to_string()),
                LooseValue::Integer(1),
            ]))
        );
    }

    #[test]
    fn keeps_unknown_property_keys() {
        let batch: RecordBatch = serde_json::from_str(SAMPLE).unwrap();
        let extra = &batch.features[0].properties.extra;
        assert_eq!(
            extra.get("unknown_field"),
            Some(&serde_json::json!({"nested": true}))
        );
    }

    #[test]
    fn geometry_is_optional() {
        let batch: RecordBatch = serde_json::from_str(SAMPLE).unwrap();
        assert!(matches!(
            batch.features[0].geometry.as_ref().map(|g| &g.coordinates),
            Some(Coordinates::Position(p)) if p.len() == 2
        ));
        assert!(batch.features[1].geometry.is_none());
        assert!(batch.features[1].created_at.is_none());
    }

    #[test]
    fn created_at_is_normalized_to_utc() {
        let batch: RecordBatch = serde_json::from_str(SAMPLE).unwrap();
        let created = batch.features[0].created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2023-06-01T01:00:00+00:00");
    }

    #[test]
    fn decodes_path_geometry() {
        let geometry: Geometry = serde_json::from_str(
            r#"{"type": "LineString", "coordinates": [[100.0, 13.0], [100.1, 13.1]]}"#,
        )
        .unwrap();
        assert!(matches!(geometry.coordinates, Coordinates::Path(ref p) if p.len() == 2));
    }

    #[test]
    fn loose_value_numeric_text() {
        assert_eq!(LooseValue::Text(" 3.5 ".to_string()).as_f64(), Some(3.5));
        assert_eq!(LooseValue::Integer(2).as_f64(), Some(2.0));
        assert_eq!(LooseValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn complaint_missing_columns_default_to_empty() {
        let complaint: Complaint =
            serde_json::from_value(serde_json::json!({"ticket_id": "T-1", "type": "{road}"}))
                .unwrap();
        assert_eq!(complaint.ticket_id, "T-1");
        assert_eq!(complaint.kind, "{road}");
        assert_eq!(complaint.address, "");
    }

    #[test]
    fn empty_object_is_an_empty_batch() {
        let batch: RecordBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.total, 0);
    }

    #[test]
    fn null_envelope_fields_default() {
        let batch: RecordBatch = serde_json::from_str(
            r#"{"status": null, "message": null, "exec_time": null, "source": null,
                "total": null, "count": null, "count_total": null, "type": null,
                "sum_state": {"finish": null}, "features": null}"#,
        )
        .unwrap();
        assert_eq!(batch.message, "");
        assert_eq!(batch.total, 0);
        assert_eq!(batch.sum_state.finish, 0);
        assert!(batch.is_empty());
    }

    #[test]
    fn null_properties_default() {
        let batch: RecordBatch = serde_json::from_str(
            r#"{"total": 1, "features": [{"type": null, "properties": null, "geometry": null}]}"#,
        )
        .unwrap();
        let feature = &batch.features[0];
        assert_eq!(feature.kind, "");
        assert_eq!(feature.properties, Properties::default());
        assert!(feature.geometry.is_none());
    }

    #[test]
    fn partial_geometry_decodes() {
        let feature: Feature =
            serde_json::from_str(r#"{"geometry": {"coordinates": [100.5, 13.7]}}"#).unwrap();
        let geometry = feature.geometry.unwrap();
        assert_eq!(geometry.kind, "");
        assert_eq!(geometry.coordinates, Coordinates::Position(vec![100.5, 13.7]));

        let geometry: Geometry = serde_json::from_str(r#"{"type": "Point"}"#).unwrap();
        assert_eq!(geometry.coordinates, Coordinates::default());
    }

    #[test]
    fn object_valued_loose_fields_are_kept() {
        let properties: Properties =
            serde_json::from_str(r#"{"note": {"text": "x"}, "star": {"score": 4}}"#).unwrap();
        assert!(matches!(
            properties.note,
            Some(LooseValue::Object(ref map)) if map.get("text") == Some(&serde_json::json!("x"))
        ));
        assert_eq!(properties.star.as_ref().and_then(LooseValue::as_f64), None);
    }
}
