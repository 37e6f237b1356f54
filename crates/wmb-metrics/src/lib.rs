//! Metrics for the WMB link layer.
//!
//! This crate declares every metric emitted while talking to WMB devices as
//! structured [`Metric`] constants, and provides a small label helper. It
//! re-exports the `metrics` crate; installing a recorder/exporter is left to
//! the application.
//!
//! # Example
//!
//! ```rust
//! use wmb_metrics::{describe_metrics, metric_defs, LinkLabels};
//!
//! // Register descriptions once at startup (no-op without a recorder).
//! describe_metrics();
//!
//! let labels = LinkLabels::new(0x00AB_CDEF, "structured");
//! metrics::counter!(metric_defs::FRAMES_SENT.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// # Example
///
/// ```rust
/// use wmb_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const RETRIES: Metric = Metric::counter("wmb.example.retries")
///     .with_description("Retried sends")
///     .with_unit(Unit::Count)
///     .with_labels(&["destination"]);
///
/// assert_eq!(RETRIES.name, "wmb.example.retries");
/// assert_eq!(RETRIES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "wmb.link.frames_sent").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the link layer.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Label Keys
    // ========================================================================

    /// Labels present on every link metric.
    pub const STANDARD_LABELS: &[&str] = &["destination", "framing"];

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Frames handed to the transport.
    ///
    /// Labels: destination, framing, command
    pub const FRAMES_SENT: Metric = Metric::counter("wmb.link.frames_sent")
        .with_description("Frames handed to the transport")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing", "command"]);

    /// Bytes handed to the transport, checksum included.
    ///
    /// Labels: destination, framing
    pub const BYTES_SENT: Metric = Metric::counter("wmb.link.bytes_sent")
        .with_description("Bytes handed to the transport")
        .with_unit(Unit::Bytes)
        .with_labels(&["destination", "framing"]);

    /// Commands rejected before any bytes were produced.
    ///
    /// Labels: destination, framing, kind
    pub const ENCODE_FAILURES: Metric = Metric::counter("wmb.link.encode_failures")
        .with_description("Commands rejected by the codec")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing", "kind"]);

    /// Size of sent frames.
    ///
    /// Labels: destination, framing
    pub const FRAME_SIZE: Metric = Metric::histogram("wmb.link.frame_size_bytes")
        .with_description("Size of sent frames in bytes")
        .with_unit(Unit::Bytes)
        .with_labels(&["destination", "framing"]);

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Frames received on the controller's endpoint.
    ///
    /// Labels: destination, framing
    pub const FRAMES_RECEIVED: Metric = Metric::counter("wmb.link.frames_received")
        .with_description("Frames received on the controller endpoint")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing"]);

    /// Frames received on other endpoints and dropped.
    ///
    /// Labels: destination, framing
    pub const FRAMES_IGNORED: Metric = Metric::counter("wmb.link.frames_ignored")
        .with_description("Frames received on other endpoints")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing"]);

    /// Received frames that failed verification or decoding.
    ///
    /// Labels: destination, framing, kind
    ///
    /// `kind` is the codec error label (`checksum_mismatch`,
    /// `deserialization`, ...), separating corruption from schema problems.
    pub const DECODE_FAILURES: Metric = Metric::counter("wmb.link.decode_failures")
        .with_description("Received frames that failed verification or decoding")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing", "kind"]);

    // ========================================================================
    // Request/Reply
    // ========================================================================

    /// Replies matched to an outstanding request.
    ///
    /// Labels: destination, framing, command
    pub const REPLIES_MATCHED: Metric = Metric::counter("wmb.link.replies_matched")
        .with_description("Replies matched to an outstanding request")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing", "command"]);

    /// Requests that saw no matching reply before the deadline.
    ///
    /// Labels: destination, framing, command
    pub const REQUEST_TIMEOUTS: Metric = Metric::counter("wmb.link.request_timeouts")
        .with_description("Requests without a matching reply")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing", "command"]);

    /// Time from send to matching reply.
    ///
    /// Labels: destination, framing, command
    pub const REPLY_LATENCY: Metric = Metric::histogram("wmb.link.reply_latency_ms")
        .with_description("Time from send to matching reply in milliseconds")
        .with_unit(Unit::Milliseconds)
        .with_labels(&["destination", "framing", "command"]);

    /// Requests awaiting a reply.
    pub const PENDING_REQUESTS: Metric = Metric::gauge("wmb.link.pending_requests")
        .with_description("Requests awaiting a reply")
        .with_unit(Unit::Count)
        .with_labels(&["destination", "framing"]);

    /// Every metric declared above.
    pub const ALL: &[&Metric] = &[
        &FRAMES_SENT,
        &BYTES_SENT,
        &ENCODE_FAILURES,
        &FRAME_SIZE,
        &FRAMES_RECEIVED,
        &FRAMES_IGNORED,
        &DECODE_FAILURES,
        &REPLIES_MATCHED,
        &REQUEST_TIMEOUTS,
        &REPLY_LATENCY,
        &PENDING_REQUESTS,
    ];
}

/// Standard labels for one controller/device pairing.
///
/// # Example
///
/// ```rust
/// use wmb_metrics::LinkLabels;
///
/// let labels = LinkLabels::new(42, "length-prefixed");
/// let extended = labels.with(&[("command", "device_reset".to_string())]);
/// assert_eq!(extended.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLabels {
    /// Mesh address of the device.
    pub destination: u32,
    /// Framing scheme in use.
    pub framing: String,
}

impl LinkLabels {
    /// Creates labels for the given device and framing name.
    pub fn new(destination: u32, framing: impl Into<String>) -> Self {
        Self {
            destination,
            framing: framing.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("destination", self.destination.to_string()),
            ("framing", self.framing.clone()),
        ]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all link metrics.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_labels() {
        let labels = LinkLabels::new(0x00AB_CDEF, "structured");
        let list = labels.to_labels();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&("destination", "11259375".to_string())));
        assert!(list.contains(&("framing", "structured".to_string())));
    }

    #[test]
    fn test_with_extra_labels() {
        let labels = LinkLabels::new(1, "structured");
        let extended = labels.with(&[("kind", "checksum_mismatch".to_string())]);
        assert_eq!(extended.len(), 3);
        assert!(extended.contains(&("kind", "checksum_mismatch".to_string())));
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::FRAMES_SENT.name, "wmb.link.frames_sent");
        assert_eq!(metric_defs::FRAMES_SENT.kind, MetricKind::Counter);
        assert_eq!(metric_defs::BYTES_SENT.unit, Some(Unit::Bytes));
        assert_eq!(metric_defs::REPLY_LATENCY.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::PENDING_REQUESTS.kind, MetricKind::Gauge);
        assert!(metric_defs::DECODE_FAILURES.labels.contains(&"kind"));
    }

    #[test]
    fn test_all_metrics() {
        assert_eq!(metric_defs::ALL.len(), 11);

        let mut names: Vec<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len(), "duplicate metric name");

        for metric in metric_defs::ALL {
            assert!(metric.name.starts_with("wmb.link."));
            assert!(!metric.description.is_empty());
            for key in metric_defs::STANDARD_LABELS {
                assert!(metric.labels.contains(key), "{} lacks {key}", metric.name);
            }
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::counter("minimal");

        assert_eq!(MINIMAL.kind, MetricKind::Counter);
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
        assert_eq!(MetricKind::Histogram.to_string(), "histogram");
    }
}
