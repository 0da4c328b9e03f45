use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{BriefView, ChartData, DerivedRecord, GroupKey, GroupSummary, Summary};
use crate::stats;

const EMPTY_MESSAGE: &str = "No records to analyze.";

pub fn render_global(summary: &Summary) -> String {
    if summary.total == 0 {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let mut output = String::new();
    let _ = writeln!(output, "General statistics");
    let _ = writeln!(output, "------------------");
    write_summary(&mut output, summary, "");
    output
}

pub fn render_grouped(key: GroupKey, groups: &[GroupSummary]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Statistics by {key}");
    let _ = writeln!(output, "------------------------------------");

    if groups.is_empty() {
        let _ = writeln!(output, "{EMPTY_MESSAGE}");
        return output;
    }

    for group in groups {
        let _ = writeln!(output);
        let _ = writeln!(output, "{key}: {}", group.key);
        write_summary(&mut output, &group.summary, "  ");
    }
    output
}

fn write_summary(output: &mut String, summary: &Summary, indent: &str) {
    let _ = writeln!(output, "{indent}Students: {}", summary.total);
    let _ = writeln!(output, "{indent}Passed: {}", summary.pass_count);
    let _ = writeln!(output, "{indent}Pass rate: {:.2}%", summary.pass_rate);
    let _ = writeln!(output, "{indent}Mean score: {:.2}", summary.mean_score);
}

/// Every source column of the record, followed by the computed age.
pub fn render_record(derived: &DerivedRecord) -> String {
    let mut output = String::new();
    for (column, value) in &derived.record.attributes {
        let _ = writeln!(output, "{column}: {value}");
    }
    match derived.age {
        Some(age) => {
            let _ = writeln!(output, "Age: {age}");
        }
        None => {
            let _ = writeln!(output, "Age: N/A");
        }
    }
    output
}

pub fn render_brief(view: &BriefView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Name: {}", view.name);
    let _ = writeln!(output, "Score: {}", view.score);
    let _ = writeln!(output, "Decision: {}", view.decision);
    output
}

pub fn decision_chart(distribution: &[(String, usize)]) -> ChartData {
    ChartData {
        title: "Decision distribution".to_string(),
        labels: distribution.iter().map(|(label, _)| label.clone()).collect(),
        values: distribution.iter().map(|(_, count)| *count as f64).collect(),
    }
}

/// Pass rate per group. Age charts keep every bucket; categorical charts keep
/// the `top_n` most populous groups.
pub fn pass_rate_chart(key: GroupKey, groups: &[GroupSummary], top_n: usize) -> ChartData {
    let (title, kept) = if key.is_ordinal() {
        (format!("Pass rate by {key}"), groups)
    } else {
        (
            format!("Pass rate by {key} (top {top_n})"),
            &groups[..groups.len().min(top_n)],
        )
    };

    ChartData {
        title,
        labels: kept.iter().map(|group| group.key.to_string()).collect(),
        values: kept.iter().map(|group| group.summary.pass_rate).collect(),
    }
}

/// Writes the chart data files into `out_dir` and returns their paths.
pub fn write_charts(records: &[DerivedRecord], out_dir: &Path, top_n: usize) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create chart directory {}", out_dir.display()))?;

    let mut charts = vec![(
        "decision_distribution.json".to_string(),
        decision_chart(&stats::decision_distribution(records)),
    )];
    for key in [GroupKey::Region, GroupKey::Age] {
        let groups = stats::grouped_stats(records, key);
        charts.push((
            format!("pass_rate_by_{key}.json"),
            pass_rate_chart(key, &groups, top_n),
        ));
    }

    let mut written = Vec::with_capacity(charts.len());
    for (file_name, chart) in charts {
        let path = out_dir.join(file_name);
        let json = serde_json::to_string_pretty(&chart).context("Failed to serialize chart data")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write chart data to {}", path.display()))?;
        info!("Chart data saved: {}", path.display());
        written.push(path);
    }
    Ok(written)
}
