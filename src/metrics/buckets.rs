//! Bucket expansion for multi-valued metrics.
//!
//! Tag sets and field templates are built once per metric. A snapshot only
//! fills in the numbers.

use super::naming::Descriptor;
use super::point::{bucket_field_shells, bucket_tag_sets, make_point, FieldValue, Fields, Point, Tags};
use std::collections::HashMap;

pub const COUNT: &str = "count";
pub const MAX: &str = "max";
pub const MEAN: &str = "mean";
pub const MIN: &str = "min";
pub const P50: &str = "p50";
pub const P75: &str = "p75";
pub const P95: &str = "p95";
pub const P99: &str = "p99";
pub const P999: &str = "p999";
pub const P9999: &str = "p9999";
pub const STDDEV: &str = "stddev";
pub const VARIANCE: &str = "variance";
pub const M1: &str = "m1";
pub const M5: &str = "m5";
pub const M15: &str = "m15";
pub const MEANRATE: &str = "meanrate";

/// Quantiles reported as `p50` .. `p9999`, in that order
pub const PERCENTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.99, 0.999, 0.9999];

pub const HISTOGRAM_BUCKETS: [&str; 12] = [
    COUNT, MAX, MEAN, MIN, P50, P75, P95, P99, P999, P9999, STDDEV, VARIANCE,
];

pub const METER_BUCKETS: [&str; 5] = [COUNT, M1, M5, M15, MEAN];

pub const TIMER_BUCKETS: [&str; 16] = [
    COUNT, MAX, MEAN, MIN, P50, P75, P95, P99, P999, P9999, STDDEV, VARIANCE, M1, M5, M15,
    MEANRATE,
];

/// Position of a percentile bucket in [`PERCENTILES`].
pub(crate) fn percentile_index(bucket: &str) -> Option<usize> {
    match bucket {
        P50 => Some(0),
        P75 => Some(1),
        P95 => Some(2),
        P99 => Some(3),
        P999 => Some(4),
        P9999 => Some(5),
        _ => None,
    }
}

/// Precomputed per-bucket tags and field templates of one metric.
#[derive(Debug, Clone)]
pub(crate) struct BucketLayout {
    buckets: &'static [&'static str],
    measurement: String,
    field_name: String,
    tags: HashMap<String, Option<Tags>>,
    fields: HashMap<String, Fields>,
}

impl BucketLayout {
    pub(crate) fn new(buckets: &'static [&'static str], desc: &Descriptor) -> Self {
        Self {
            buckets,
            measurement: desc.measurement.clone(),
            field_name: desc.field_name.clone(),
            tags: bucket_tag_sets(buckets, desc.tags.as_ref()),
            fields: bucket_field_shells(buckets, &desc.field_name),
        }
    }

    /// Append one point per bucket, valued by `value(bucket)`.
    pub(crate) fn emit(&self, points: &mut Vec<Point>, value: impl Fn(&str) -> f64) {
        points.reserve(self.buckets.len());
        for bucket in self.buckets {
            let (Some(shell), Some(tags)) = (self.fields.get(*bucket), self.tags.get(*bucket)) else {
                continue;
            };
            let mut fields = shell.clone();
            fields.insert(self.field_name.clone(), FieldValue::Float(value(bucket)));
            points.push(make_point(&self.measurement, fields, tags.clone()));
        }
    }
}
