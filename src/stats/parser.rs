//! Extraction of metrics from the raw text of a stat source.
//!
//! The functions here never fail: malformed lines are skipped, as the kernel
//! occasionally adds fields the sink has no use for.

use super::Metric;

/// `memory.stat` style content, one `key value` pair per line.
pub(super) fn extract_table(content: &str, prefix: &str, timestamp: u64, out: &mut Vec<Metric>) {
    for (lineno, line) in content.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(key), Some(value)) => {
                out.push(Metric::new(format!("{prefix}.{key}"), value, timestamp));
            }
            (Some(key), None) => {
                log::debug!("skipping key `{key}` without value at line {}", lineno + 1);
            }
            _ => {}
        }
    }
}

/// `cpuacct.usage_percpu` style content, one metric per position.
pub(super) fn extract_array(
    file_name: &str,
    content: &str,
    prefix: &str,
    timestamp: u64,
    out: &mut Vec<Metric>,
) {
    let file_name = sanitize(file_name);
    for (index, value) in content.split_whitespace().enumerate() {
        out.push(Metric::new(
            format!("{prefix}.{file_name}.{index}"),
            value,
            timestamp,
        ));
    }
}

/// `cpuacct.usage` style content, the trimmed file is the value.
pub(super) fn extract_scalar(
    file_name: &str,
    content: &str,
    prefix: &str,
    timestamp: u64,
    out: &mut Vec<Metric>,
) {
    out.push(Metric::new(
        format!("{prefix}.{}", sanitize(file_name)),
        content.trim(),
        timestamp,
    ));
}

#[inline]
fn sanitize(file_name: &str) -> String {
    file_name.replace('.', "_")
}

#[cfg(test)]
mod tests {
    use super::super::StatShape;
    use super::*;

    fn pairs(metrics: &[Metric]) -> Vec<(&str, &str)> {
        metrics.iter().map(|m| (m.name(), m.value())).collect()
    }

    #[test]
    fn test_table() {
        let mut out = Vec::new();
        StatShape::Table.extract("memory.stat", "a 1\nb 2\n", "demo.memory", 10, &mut out);
        assert_eq!(pairs(&out), vec![("demo.memory.a", "1"), ("demo.memory.b", "2")]);
        assert!(out.iter().all(|m| m.timestamp() == 10));
    }

    #[test]
    fn test_table_skips_blank_and_incomplete_lines() {
        let data = "\
cache 4096

rss
  mapped_file   512
";
        let mut out = Vec::new();
        extract_table(data, "c.memory", 1, &mut out);
        assert_eq!(
            pairs(&out),
            vec![("c.memory.cache", "4096"), ("c.memory.mapped_file", "512")]
        );
    }

    #[test]
    fn test_table_keeps_value_literal() {
        let mut out = Vec::new();
        extract_table("hierarchical_memory_limit 9223372036854771712\n", "c.memory", 1, &mut out);
        assert_eq!(out[0].value(), "9223372036854771712");
    }

    #[test]
    fn test_scalar() {
        let mut out = Vec::new();
        StatShape::Scalar.extract("usage", "42\n", "demo.cpuacct", 7, &mut out);
        assert_eq!(out, vec![Metric::new("demo.cpuacct.usage", "42", 7)]);
    }

    #[test]
    fn test_scalar_replaces_dots() {
        let mut out = Vec::new();
        extract_scalar("cpuacct.usage", "  1234567 \n", "demo.cpuacct", 7, &mut out);
        assert_eq!(pairs(&out), vec![("demo.cpuacct.cpuacct_usage", "1234567")]);
    }

    #[test]
    fn test_array() {
        let mut out = Vec::new();
        StatShape::Array.extract("usage_percpu", "10 20 30\n", "demo.cpuacct", 7, &mut out);
        assert_eq!(
            pairs(&out),
            vec![
                ("demo.cpuacct.usage_percpu.0", "10"),
                ("demo.cpuacct.usage_percpu.1", "20"),
                ("demo.cpuacct.usage_percpu.2", "30"),
            ]
        );
    }

    #[test]
    fn test_array_replaces_dots_and_handles_trailing_space() {
        let mut out = Vec::new();
        extract_array("cpuacct.usage_percpu", "5 6 \n", "x.cpuacct", 7, &mut out);
        assert_eq!(
            pairs(&out),
            vec![
                ("x.cpuacct.cpuacct_usage_percpu.0", "5"),
                ("x.cpuacct.cpuacct_usage_percpu.1", "6"),
            ]
        );
    }

    #[test]
    fn test_array_empty() {
        let mut out = Vec::new();
        extract_array("cpuacct.usage_percpu", "\n", "x.cpuacct", 7, &mut out);
        assert!(out.is_empty());
    }
}
