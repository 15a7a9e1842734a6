//! InfluxDB line protocol encoding.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`
//!
//! Tags with an empty key or value are dropped, as are non-finite float
//! fields. A point left without fields is not written at all.

use super::client::BatchPoints;
use crate::metrics::{FieldValue, Point};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Encode every point of `batch`, one per line, stamped with the batch time.
pub fn encode_batch(batch: &BatchPoints) -> String {
    let mut out = String::with_capacity(batch.points.len() * 64);
    for point in &batch.points {
        if let Some(line) = encode_point(point, batch.time) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Encode a single point, or `None` when it has no writable field.
pub fn encode_point(point: &Point, time: DateTime<Utc>) -> Option<String> {
    let mut fields = point
        .fields
        .iter()
        .filter(|(_, value)| match value {
            FieldValue::Float(v) => v.is_finite(),
            FieldValue::Integer(_) => true,
        })
        .peekable();
    fields.peek()?;

    let mut line = String::new();
    escape_into(&mut line, &point.measurement, &[',', ' ']);

    if let Some(tags) = &point.tags {
        for (key, value) in tags {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            line.push(',');
            escape_into(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            escape_into(&mut line, value, &[',', '=', ' ']);
        }
    }

    line.push(' ');
    for (i, (key, value)) in fields.enumerate() {
        if i > 0 {
            line.push(',');
        }
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        // Writing to a String cannot fail.
        let _ = match value {
            FieldValue::Integer(v) => write!(line, "{}i", v),
            FieldValue::Float(v) => write!(line, "{}", v),
        };
    }

    if let Some(nanos) = time.timestamp_nanos_opt() {
        let _ = write!(line, " {}", nanos);
    }
    Some(line)
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
