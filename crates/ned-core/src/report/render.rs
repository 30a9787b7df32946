//! Report renderers: JSON, summary lines, Markdown and LaTeX tables.

use std::fmt::Write;

use ned_common::{OutputFormat, Result};

use super::{LambdaReport, StudyReport, SystemReport};

/// Render a report in the requested format.
pub fn render(report: &StudyReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Summary => Ok(render_summary(report)),
        OutputFormat::Md => Ok(render_markdown(report)),
        OutputFormat::Latex => Ok(render_latex(report)),
    }
}

fn estimate_cells(lambda: &LambdaReport) -> (String, String) {
    match (lambda.estimate.epsilon(), lambda.estimate.delta()) {
        (Some(epsilon), Some(delta)) => (format!("{:.10}", epsilon), format!("{:.10}", delta)),
        _ => ("n/a".to_string(), "n/a".to_string()),
    }
}

/// One line per system and lambda.
pub fn render_summary(report: &StudyReport) -> String {
    let mut out = String::new();
    for system in &report.systems {
        if let Some(error) = &system.error {
            let _ = writeln!(
                out,
                "[{}] system {}: failed ({})",
                report.run_id, system.system, error.message
            );
            continue;
        }
        for lambda in &system.lambdas {
            let (epsilon, delta) = estimate_cells(lambda);
            let _ = write!(
                out,
                "[{}] system {} lambda={:.6}: TI={:.2} epsilon={} delta={} samples={}/{}",
                report.run_id,
                system.system,
                lambda.lambda,
                lambda.traffic_increase,
                epsilon,
                delta,
                lambda.samples.achieved,
                lambda.samples.target
            );
            if lambda.samples.timed_out {
                out.push_str(" (timed out)");
            }
            if let Some(error) = &lambda.error {
                let _ = write!(out, " error: {}", error.message);
            }
            out.push('\n');
        }
    }
    out
}

/// Markdown document with one table per system.
pub fn render_markdown(report: &StudyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# ned study {}", report.run_id);
    out.push('\n');
    let _ = writeln!(
        out,
        "Sample duration: {} s, config {} ({})",
        report.sample_duration_secs,
        report.config.short_id(),
        report.config.study_source
    );

    for system in &report.systems {
        out.push('\n');
        render_markdown_system(&mut out, system);
    }
    out
}

fn render_markdown_system(out: &mut String, system: &SystemReport) {
    let _ = writeln!(out, "## System {}", system.system);
    out.push('\n');
    if let Some(error) = &system.error {
        let _ = writeln!(out, "Failed: {}", error.message);
        return;
    }
    let _ = writeln!(
        out,
        "{} genuine events, {} interactions",
        system.genuine_events, system.interactions
    );
    out.push('\n');
    out.push_str("| lambda | description | traffic increase | epsilon | delta | samples | notes |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for lambda in &system.lambdas {
        let (epsilon, delta) = estimate_cells(lambda);
        let mut notes = Vec::new();
        if lambda.samples.timed_out {
            notes.push("timed out".to_string());
        }
        if let Some(error) = &lambda.error {
            notes.push(error.message.clone());
        }
        let _ = writeln!(
            out,
            "| {:.6} | {} | {:.2} | {} | {} | {}/{} | {} |",
            lambda.lambda,
            lambda.label,
            lambda.traffic_increase,
            epsilon,
            delta,
            lambda.samples.achieved,
            lambda.samples.target,
            notes.join("; ")
        );
    }
}

/// LaTeX tabular rows: a two-line header with one column pair per lambda,
/// then one row per system with the traffic increase and (ε, δ).
pub fn render_latex(report: &StudyReport) -> String {
    let lambdas = report.lambdas();
    let mut out = String::from("System");
    for lambda in &lambdas {
        let _ = write!(out, " & \\multicolumn{{2}}{{c}}{{$\\lambda={:.6}$}}", lambda);
    }
    out.push_str(" \\\\\n");
    for _ in &lambdas {
        out.push_str("& TI & $\\varepsilon,\\delta$");
    }
    out.push_str(" \\\\\n");

    for system in &report.systems {
        out.push_str(&system.system);
        if system.error.is_some() {
            for _ in &lambdas {
                out.push_str(" & -- & --");
            }
        } else {
            for lambda in &system.lambdas {
                match (lambda.estimate.epsilon(), lambda.estimate.delta()) {
                    (Some(epsilon), Some(delta)) => {
                        let _ = write!(
                            out,
                            " & \\num{{{:.2}}} & $\\varepsilon={:.10}$ $\\delta={:.10}$",
                            lambda.traffic_increase, epsilon, delta
                        );
                    }
                    _ => {
                        let _ = write!(out, " & \\num{{{:.2}}} & --", lambda.traffic_increase);
                    }
                }
            }
        }
        out.push_str(" \\\\\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::Estimate;
    use crate::report::{LambdaReport, SystemReport};
    use chrono::Utc;
    use ned_common::{Error, SystemView};
    use ned_config::{ConfigSnapshot, LambdaSpec};

    fn report() -> StudyReport {
        let mut system = SystemReport::new(SystemView::unbounded("1"));
        system.genuine_events = 10;
        let mut lambda = LambdaReport::new(&LambdaSpec::new(0.5, "~1 packet per 2 seconds"), 4);
        lambda.traffic_increase = 1.25;
        lambda.estimate = Estimate::Defined {
            epsilon: 0.25,
            delta: 0.01,
        };
        lambda.samples.achieved = 4;
        system.lambdas.push(lambda);

        let mut failed = SystemReport::new(SystemView::unbounded("3"));
        failed.fail(&Error::EmptyTrace {
            system: "3".into(),
            reason: "no events".into(),
        });

        StudyReport {
            schema_version: ned_common::SCHEMA_VERSION.to_string(),
            run_id: "run-abc".into(),
            host_id: "host".into(),
            generated_at: Utc::now(),
            sample_duration_secs: 10.0,
            config: ConfigSnapshot::defaults_only(),
            systems: vec![system, failed],
        }
    }

    #[test]
    fn summary_lines() {
        let text = render_summary(&report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "[run-abc] system 1 lambda=0.500000: TI=1.25 epsilon=0.2500000000 delta=0.0100000000 samples=4/4"
        );
        assert!(lines[1].contains("system 3: failed"));
    }

    #[test]
    fn markdown_table() {
        let text = render_markdown(&report());
        assert!(text.contains("## System 1"));
        assert!(text.contains("| 0.500000 | ~1 packet per 2 seconds | 1.25 | 0.2500000000 | 0.0100000000 | 4/4 |  |"));
        assert!(text.contains("Failed: system 3 has no usable events"));
    }

    #[test]
    fn latex_layout() {
        let text = render_latex(&report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "System & \\multicolumn{2}{c}{$\\lambda=0.500000$} \\\\"
        );
        assert_eq!(lines[1], "& TI & $\\varepsilon,\\delta$ \\\\");
        assert_eq!(
            lines[2],
            "1 & \\num{1.25} & $\\varepsilon=0.2500000000$ $\\delta=0.0100000000$ \\\\"
        );
        assert_eq!(lines[3], "3 & -- & -- \\\\");
    }

    #[test]
    fn json_is_default() {
        let text = render(&report(), OutputFormat::default()).unwrap();
        assert!(text.contains("\"run_id\": \"run-abc\""));
    }
}
