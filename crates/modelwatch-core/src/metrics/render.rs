//! Prometheus text exposition (format 0.0.4) writers.

use std::fmt::Write;

use super::{HistogramSeries, Snapshot};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// HELP text escapes backslash and newline only.
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value the way scrapers expect (`+Inf`, `-Inf`, `NaN`).
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn label_block(keys: &[String], values: &[String], extra: Option<(&str, &str)>) -> String {
    let mut parts: Vec<String> = keys
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some((k, v)) = extra {
        parts.push(format!("{}=\"{}\"", k, escape_label(v)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

pub(crate) fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

pub(crate) fn counter(out: &mut String, name: &str, snap: &Snapshot<u64>) {
    for (values, v) in &snap.series {
        let _ = writeln!(out, "{}{} {}", name, label_block(&snap.label_keys, values, None), v);
    }
}

pub(crate) fn gauge(out: &mut String, name: &str, snap: &Snapshot<f64>) {
    for (values, v) in &snap.series {
        let _ = writeln!(
            out,
            "{}{} {}",
            name,
            label_block(&snap.label_keys, values, None),
            format_value(*v)
        );
    }
}

pub(crate) fn histogram(out: &mut String, name: &str, snap: &Snapshot<HistogramSeries>) {
    let keys = &snap.label_keys;
    for (values, h) in &snap.series {
        for (le, count) in &h.buckets {
            let le = format_value(*le);
            let _ = writeln!(
                out,
                "{}_bucket{} {}",
                name,
                label_block(keys, values, Some(("le", &le))),
                count
            );
        }
        let _ = writeln!(
            out,
            "{}_bucket{} {}",
            name,
            label_block(keys, values, Some(("le", "+Inf"))),
            h.count
        );
        let labels = label_block(keys, values, None);
        let _ = writeln!(out, "{}_sum{} {}", name, labels, format_value(h.sum));
        let _ = writeln!(out, "{}_count{} {}", name, labels, h.count);
    }
}
