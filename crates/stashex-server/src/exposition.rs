use std::{collections::BTreeMap, sync::Arc};

use stashex_collector::{MetricDescriptor, MetricSample, MetricValue};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct Family {
    descriptor: Arc<MetricDescriptor>,
    samples: Vec<MetricSample>,
}

/// Renders drained samples in the Prometheus text format, one block per family name.
/// Families and the series inside them are sorted so repeated scrapes diff cleanly.
pub fn render(samples: Vec<MetricSample>) -> String {
    let mut families = BTreeMap::<String, Family>::new();
    for sample in samples {
        families
            .entry(sample.descriptor.name.clone())
            .or_insert_with(|| Family {
                descriptor: Arc::clone(&sample.descriptor),
                samples: Vec::new(),
            })
            .samples
            .push(sample);
    }

    let mut output = String::new();
    for (name, mut family) in families {
        let Some(first) = family.samples.first() else {
            continue;
        };

        output.push_str("# HELP ");
        output.push_str(&name);
        output.push(' ');
        output.push_str(&escape_help(&family.descriptor.help));
        output.push('\n');

        output.push_str("# TYPE ");
        output.push_str(&name);
        output.push(' ');
        output.push_str(first.metric_type().as_prometheus_type());
        output.push('\n');

        family.samples.sort_by(|left, right| left.label_values.cmp(&right.label_values));
        for sample in &family.samples {
            let labels = sample.labels().collect::<Vec<_>>();
            match sample.value {
                MetricValue::Counter(value) | MetricValue::Gauge(value) => {
                    output.push_str(&render_sample_line(&name, &labels, value));
                }
                MetricValue::Summary { count, sum } => {
                    output.push_str(&render_sample_line(&format!("{name}_sum"), &labels, sum));
                    output.push_str(&render_sample_line(
                        &format!("{name}_count"),
                        &labels,
                        count as f64,
                    ));
                }
            }
        }
    }

    output
}

fn render_sample_line(name: &str, labels: &[(&str, &str)], value: f64) -> String {
    let mut rendered = String::from(name);

    if !labels.is_empty() {
        rendered.push('{');
        for (index, (key, value)) in labels.iter().enumerate() {
            if index > 0 {
                rendered.push(',');
            }
            rendered.push_str(key);
            rendered.push_str("=\"");
            rendered.push_str(&escape_label_value(value));
            rendered.push('"');
        }
        rendered.push('}');
    }

    rendered.push(' ');
    rendered.push_str(&format_metric_value(value));
    rendered.push('\n');
    rendered
}

fn format_metric_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
