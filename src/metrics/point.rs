//! Data points and the pure helpers that build their tag and field sets.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Tag key/value pairs, sorted by key.
pub type Tags = BTreeMap<String, String>;

/// Field name to value.
pub type Fields = BTreeMap<String, FieldValue>;

/// Tag key added to every point of a bucketed metric.
pub const BUCKET_TAG: &str = "bucket";

/// Numeric field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Value as a float
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::Integer(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

/// One data point destined for the time-series database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub measurement: String,
    pub tags: Option<Tags>,
    pub fields: Fields,
}

/// Build a point. No validation is performed.
pub fn make_point(measurement: &str, fields: Fields, tags: Option<Tags>) -> Point {
    Point {
        measurement: measurement.to_string(),
        tags,
        fields,
    }
}

/// Overlay `overlay` onto `base`; overlay wins on conflicting keys.
///
/// Returns `None` when both sides are absent or empty, so "no tags" stays
/// distinguishable from an empty tag set downstream.
pub fn merge_tags(base: Option<&Tags>, overlay: Option<&Tags>) -> Option<Tags> {
    let base = base.filter(|t| !t.is_empty());
    let overlay = overlay.filter(|t| !t.is_empty());
    if base.is_none() && overlay.is_none() {
        return None;
    }

    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overlay) = overlay {
        merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Some(merged)
}

/// `tags` plus `bucket=<bucket>`, or `tags` unchanged for an empty bucket.
pub fn bucket_tags(bucket: &str, tags: Option<&Tags>) -> Option<Tags> {
    if bucket.is_empty() {
        return tags.cloned();
    }

    let mut out = tags.cloned().unwrap_or_default();
    out.insert(BUCKET_TAG.to_string(), bucket.to_string());
    Some(out)
}

/// One tag set per bucket name, see [`bucket_tags`].
pub fn bucket_tag_sets(buckets: &[&str], tags: Option<&Tags>) -> HashMap<String, Option<Tags>> {
    buckets
        .iter()
        .map(|bucket| (bucket.to_string(), bucket_tags(bucket, tags)))
        .collect()
}

/// One field template `{field_key: 0.0}` per bucket name.
pub fn bucket_field_shells(buckets: &[&str], field_key: &str) -> HashMap<String, Fields> {
    buckets
        .iter()
        .map(|bucket| {
            let mut fields = Fields::new();
            fields.insert(field_key.to_string(), FieldValue::Float(0.0));
            (bucket.to_string(), fields)
        })
        .collect()
}
