//! CLI output styling for rpcdial

use colored::Colorize;
use rpcdial::DialError;
use serde::Serialize;
use std::time::Duration;

/// Outcome of a `probe`, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub endpoint: String,
    pub ok: bool,
    pub phase: Option<&'static str>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ProbeReport {
    pub fn new(endpoint: &str, result: Result<(), &DialError>, elapsed: Duration) -> Self {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(()) => Self {
                endpoint: endpoint.to_string(),
                ok: true,
                phase: None,
                error: None,
                elapsed_ms,
            },
            Err(e) => Self {
                endpoint: endpoint.to_string(),
                ok: false,
                phase: Some(e.phase()),
                error: Some(e.to_string()),
                elapsed_ms,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Print a probe outcome in human-readable form.
pub fn print_probe(report: &ProbeReport, silent: bool) {
    if silent {
        return;
    }

    if report.ok {
        eprintln!(
            "{} {} {}",
            "Tunnel established:".green().bold(),
            report.endpoint.white(),
            format!("({} ms)", report.elapsed_ms).truecolor(150, 150, 150)
        );
    } else {
        eprintln!(
            "{} {} {}",
            "Tunnel failed:".red().bold(),
            report.endpoint.white(),
            format!("[{}]", report.phase.unwrap_or("dial-http")).yellow()
        );
    }
}

/// Announce that `pipe` is bridging stdin/stdout.
pub fn print_piping(endpoint: &str, silent: bool) {
    if silent {
        return;
    }
    eprintln!(
        "{} {}",
        "Connected, piping stdin/stdout to".green(),
        endpoint.white()
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_report_json() {
        let report = ProbeReport::new("http://p:1/_goRPC_", Ok(()), Duration::from_millis(12));
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["endpoint"], "http://p:1/_goRPC_");
        assert_eq!(value["ok"], true);
        assert!(value["phase"].is_null());
        assert!(value["error"].is_null());
        assert_eq!(value["elapsed_ms"], 12);
    }

    #[tokio::test]
    async fn test_failure_report_carries_phase() {
        let err = rpcdial::dial_tunnel("ftp://proxy.example/_goRPC_")
            .await
            .unwrap_err();
        let report = ProbeReport::new(
            "ftp://proxy.example/_goRPC_",
            Err(&err),
            Duration::from_millis(1),
        );
        assert!(!report.ok);
        assert_eq!(report.phase, Some("unsupported-scheme"));
        assert!(report
            .error
            .as_deref()
            .unwrap()
            .starts_with("dial-http ftp://proxy.example/_goRPC_"));
    }
}
