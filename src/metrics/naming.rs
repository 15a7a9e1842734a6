//! Registration keys and the register-or-get protocol.
//!
//! A metric is stored under `measurement/name<suffix>`. When that key is
//! already held by a metric of a different kind, a numeric disambiguator is
//! put in front of the suffix (`measurement/name1.gauge`, `name2.gauge`, ...)
//! until a free key or a metric of the same kind is found.

use super::options::MetricOptions;
use super::point::{merge_tags, Tags};
use super::Metric;
use crate::registry::{default_registry, Entry};
use crate::reporter::Reporter;
use parking_lot::{const_mutex, Mutex};
use std::sync::Arc;
use tracing::{debug, warn};

/// Measurement used when none is given
pub const DEFAULT_MEASUREMENT: &str = "default";

/// The known metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    GaugeF64,
    Histogram,
    Meter,
    Timer,
}

static REGISTRATION_LOCKS: [Mutex<()>; 6] = [
    const_mutex(()),
    const_mutex(()),
    const_mutex(()),
    const_mutex(()),
    const_mutex(()),
    const_mutex(()),
];

impl MetricKind {
    /// Suffix appended to the metric name in keys and field names
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricKind::Counter => ".count",
            MetricKind::Gauge | MetricKind::GaugeF64 => ".gauge",
            MetricKind::Histogram => ".histogram",
            MetricKind::Meter => ".meter",
            MetricKind::Timer => ".timer",
        }
    }

    /// Lock serializing registrations of this kind
    fn registration_lock(self) -> &'static Mutex<()> {
        let idx = match self {
            MetricKind::Counter => 0,
            MetricKind::Gauge => 1,
            MetricKind::GaugeF64 => 2,
            MetricKind::Histogram => 3,
            MetricKind::Meter => 4,
            MetricKind::Timer => 5,
        };
        &REGISTRATION_LOCKS[idx]
    }
}

/// `measurement/name<suffix>`, with the disambiguator in front of the suffix when non-zero.
pub fn registration_key(measurement: &str, name: &str, suffix: &str, disambiguator: u32) -> String {
    if disambiguator > 0 {
        format!("{}/{}{}{}", measurement, name, disambiguator, suffix)
    } else {
        format!("{}/{}{}", measurement, name, suffix)
    }
}

/// Identity and labelling shared by all adapters.
#[derive(Debug, Clone)]
pub(crate) struct Descriptor {
    pub(crate) name: String,
    pub(crate) kind: MetricKind,
    pub(crate) measurement: String,
    pub(crate) tags: Option<Tags>,
    pub(crate) field_name: String,
}

impl Descriptor {
    pub(crate) fn new(
        name: String,
        kind: MetricKind,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let measurement = options
            .measurement
            .clone()
            .unwrap_or_else(|| DEFAULT_MEASUREMENT.to_string());
        let tags = match reporter {
            Some(reporter) => merge_tags(reporter.tags(), options.tags.as_ref()),
            None => options.tags.clone(),
        };
        let field_name = format!("{}{}", name, kind.suffix());

        Self {
            name,
            kind,
            measurement,
            tags,
            field_name,
        }
    }

    fn key(&self, disambiguator: u32) -> String {
        registration_key(&self.measurement, &self.name, self.kind.suffix(), disambiguator)
    }
}

/// Adapters that can go through [`register_or_get`].
pub(crate) trait Registrable: Metric + Sized {
    fn descriptor(&self) -> &Descriptor;
}

/// Register `candidate` or return the live metric of the same kind under its key.
///
/// Without a reporter the candidate goes into the default registry
/// best-effort and is always returned.
pub(crate) fn register_or_get<M: Registrable>(
    candidate: Arc<M>,
    reporter: Option<&Arc<Reporter>>,
) -> Arc<M> {
    let desc = candidate.descriptor();
    let _guard = desc.kind.registration_lock().lock();

    let Some(reporter) = reporter else {
        warn!(metric = %desc.name, "no (default) metrics reporter set");
        let entry = Arc::clone(&candidate) as Arc<dyn Metric>;
        if let Err(e) = default_registry().register(desc.key(0), Entry::Metric(entry)) {
            warn!(error = %e, "default registry: metric could not be registered");
        }
        return Arc::clone(&candidate);
    };

    let registry = reporter.registry();
    let mut disambiguator = 0;
    loop {
        let key = desc.key(disambiguator);
        match registry.get(&key) {
            None => {
                let entry = Arc::clone(&candidate) as Arc<dyn Metric>;
                match registry.register(key.clone(), Entry::Metric(entry)) {
                    Ok(()) => return Arc::clone(&candidate),
                    Err(e) => {
                        // Taken by another kind between lookup and insert.
                        debug!(key = %key, error = %e, "registration raced, retrying");
                        continue;
                    },
                }
            },
            Some(Entry::Metric(existing)) => {
                if let Ok(existing) = existing.as_any().downcast::<M>() {
                    return existing;
                }
            },
            Some(_) => {},
        }
        disambiguator += 1;
    }
}
