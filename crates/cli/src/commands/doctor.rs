use dinebot_agent::component_statuses;
use dinebot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const COMPONENTS: [&str; 3] = ["router", "fulfillment", "worker"];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(component_statuses(&config).into_iter().map(|component| DoctorCheck {
                name: component.name,
                status: if component.configured { CheckStatus::Pass } else { CheckStatus::Fail },
                details: component.detail.unwrap_or_else(|| "settings complete".to_string()),
            }));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(COMPONENTS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all components are configured".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
