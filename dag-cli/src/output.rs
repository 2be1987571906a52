//! Output Formatting
//!
//! Utilities for formatting CLI output in various formats.

use serde::Serialize;

use dag_core::ChainSummary;
use dag_verifier::{DeliveryReport, RunReport, VerifierConfig};

use crate::commands::OutputFormat;

/// Print as JSON
fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

/// Summary as a two-column table
pub fn summary_table(summary: &ChainSummary) -> String {
    let rows = [
        ("Projects tracked", summary.projects_tracked_count.to_string()),
        ("With issues", summary.projects_with_issues_count.to_string()),
        ("Stuck", summary.projects_with_stuck_chain_count.to_string()),
        ("Incomplete walks", summary.projects_with_incomplete_walk_count.to_string()),
        ("Min head height", summary.current_min_chain_height.to_string()),
        ("Issues", summary.overall_issue_count.to_string()),
        ("Gaps", summary.overall_dag_chain_gaps.to_string()),
        ("Duplicates", summary.overall_dag_chain_duplicates.to_string()),
    ];

    let mut out = String::from("Chain Summary\n=============\n");
    for (label, value) in rows {
        out.push_str(&format!("{:<18} {}\n", format!("{}:", label), value));
    }
    out
}

/// One line per project
pub fn project_table(report: &RunReport) -> String {
    let mut out = format!(
        "{:<20} {:>10} {:>8} {:<18} {:>6}\n",
        "PROJECT", "HEAD", "WALKED", "STOP", "ISSUES"
    );
    for project in &report.projects {
        let head = project
            .head_height
            .map_or_else(|| "-".to_string(), |h| h.to_string());
        out.push_str(&format!(
            "{:<20} {:>10} {:>8} {:<18} {:>6}\n",
            project.project_id,
            head,
            project.nodes_walked,
            project.stop,
            project.issues.len()
        ));
        for issue in &project.issues {
            out.push_str(&format!(
                "    {} at {} (missing {}..={})\n",
                issue.issue_type,
                issue.dag_block_height,
                issue.missing_height_start,
                issue.missing_height_end
            ));
        }
        if let Some(error) = &project.error {
            out.push_str(&format!("    error: {}\n", error));
        }
    }
    for project_id in &report.cancelled {
        out.push_str(&format!("{:<20} {:>10} {:>8} {:<18} {:>6}\n", project_id, "-", "-", "cancelled", "-"));
    }
    out
}

/// Print a verification pass
pub fn print_run_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            print!("{}", summary_table(&report.summary));
            println!();
            print!("{}", project_table(report));
        }
        OutputFormat::Plain => match report.summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error formatting JSON: {}", e),
        },
    }
}

/// Print a successful delivery
pub fn print_delivery(delivery: &DeliveryReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let decisions: Vec<String> = delivery.decisions.iter().map(|d| d.to_string()).collect();
            print_json(&serde_json::json!({
                "delivered": true,
                "attempts": delivery.attempts,
                "decisions": decisions,
            }))
        }
        OutputFormat::Table | OutputFormat::Plain => {
            eprintln!("Summary delivered after {} attempt(s)", delivery.attempts);
        }
    }
}

/// Configuration with the webhook URL masked
pub fn redacted_config(config: &VerifierConfig) -> VerifierConfig {
    let mut config = config.clone();
    if let Some(url) = config.webhook.url.as_mut() {
        *url = redact_url(url);
    }
    config
}

/// Keep scheme and host, hide the path that usually carries the secret
fn redact_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (format!("{}://", scheme), rest),
        None => (String::new(), url),
    };
    match rest.split_once('/') {
        Some((host, _)) => format!("{}{}/***", scheme, host),
        None => format!("{}{}", scheme, rest),
    }
}

/// Print the effective configuration
pub fn print_config(config: &VerifierConfig, format: OutputFormat) {
    let config = redacted_config(config);
    match format {
        OutputFormat::Json => print_json(&config),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("Verifier Configuration");
            println!("======================");
            println!("Store:           {}", config.store.url);
            println!("Store timeout:   {}s", config.store.timeout_secs);
            if config.store.requests_per_sec < 0.0 {
                println!("Rate limit:      unlimited");
            } else {
                println!(
                    "Rate limit:      {}/s (burst {})",
                    config.store.requests_per_sec, config.store.burst
                );
            }
            println!(
                "Webhook:         {}",
                config.webhook.url.as_deref().unwrap_or("(disabled)")
            );
            println!(
                "Notify attempts: {} (delay {}ms)",
                config.webhook.max_attempts, config.webhook.retry_delay_ms
            );
            println!(
                "Head API:        {}",
                config.head_api_url.as_deref().unwrap_or("(none)")
            );
            println!("Workers:         {}", config.worker_count);
            println!("Max depth:       {}", config.max_depth);
            println!("Stuck after:     {}s", config.stuck_threshold_secs);
            println!("Run timeout:     {}s", config.run_timeout_secs);
            println!("Interval:        {}s", config.interval_secs);
            println!("Projects:");
            for project in &config.projects {
                match &project.head_cid {
                    Some(cid) => println!("  - {} (head {})", project.id, cid),
                    None => println!("  - {}", project.id),
                }
            }
        }
    }
}

/// Print info message
pub fn print_info(message: &str) {
    eprintln!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dag_core::ChainIssue;
    use dag_verifier::ProjectReport;

    #[test]
    fn test_summary_table() {
        let summary = ChainSummary {
            projects_tracked_count: 3,
            overall_dag_chain_gaps: 1,
            ..Default::default()
        };
        let table = summary_table(&summary);
        assert!(table.contains("Projects tracked:  3"));
        assert!(table.contains("Gaps:              1"));
    }

    #[test]
    fn test_project_table() {
        let report = RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            summary: ChainSummary::default(),
            projects: vec![ProjectReport {
                project_id: "b".to_string(),
                head_cid: Some("b-7".to_string()),
                head_height: Some(7),
                nodes_walked: 2,
                stop: "genesis".to_string(),
                complete: true,
                issues: vec![ChainIssue::gap(6, 6, 0)],
                error: None,
            }],
            cancelled: vec!["slow".to_string()],
        };

        let table = project_table(&report);
        assert!(table.contains("GAP at 7 (missing 6..=6)"));
        assert!(table.contains("cancelled"));
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://hooks.example.com/services/T00/B00/secret"),
            "https://hooks.example.com/***"
        );
        assert_eq!(redact_url("http://localhost:8080"), "http://localhost:8080");
    }
}
