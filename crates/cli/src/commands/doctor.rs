use coffeebot_core::config::{AppConfig, LoadOptions};
use coffeebot_db::migrations;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::connect;

/// Tables a migrated coffeebot database must contain.
const COFFEE_TABLES: [&str; 5] =
    ["drink_preference", "shop_preference", "order", "user_order", "test_user"];

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

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
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
            checks.push(check_slack_token(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slack_token_readiness", "database_connectivity", "coffee_schema"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_slack_token(config: &AppConfig) -> DoctorCheck {
    let token = config.slack.bot_token.expose_secret();
    let status = if token.starts_with("xoxb-") { CheckStatus::Pass } else { CheckStatus::Fail };
    DoctorCheck {
        name: "slack_token_readiness",
        status,
        details: format!("bot token present, api base `{}`", config.slack.api_base_url),
    }
}

/// Connectivity, then whether migrations have created the coffee tables.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("coffee_schema", "no async runtime"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect(config).await {
            Ok(pool) => pool,
            Err(details) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details,
                    },
                    DoctorCheck::skipped("coffee_schema", "the database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };

        let mut present = Vec::new();
        let mut schema_error = None;
        for table in COFFEE_TABLES {
            match migrations::table_exists(&pool, table).await {
                Ok(true) => present.push(table),
                Ok(false) => {}
                Err(error) => {
                    schema_error = Some(format!("schema lookup failed: {error}"));
                    break;
                }
            }
        }
        pool.close().await;

        let schema = match schema_error {
            Some(details) => {
                DoctorCheck { name: "coffee_schema", status: CheckStatus::Fail, details }
            }
            None if present.len() == COFFEE_TABLES.len() => DoctorCheck {
                name: "coffee_schema",
                status: CheckStatus::Pass,
                details: "all coffee tables present".to_string(),
            },
            None => {
                let missing: Vec<_> = COFFEE_TABLES
                    .iter()
                    .filter(|table| !present.contains(*table))
                    .copied()
                    .collect();
                DoctorCheck {
                    name: "coffee_schema",
                    status: CheckStatus::Fail,
                    details: format!(
                        "missing tables: {}; run `coffeebot migrate`",
                        missing.join(", ")
                    ),
                }
            }
        };

        vec![connectivity, schema]
    })
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
