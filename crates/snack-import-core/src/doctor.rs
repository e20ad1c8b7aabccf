use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{
    EffectiveConfig, SERVICE_URL_ENV, SnackImportConfig, load_config, merge_config,
    resolve_config_path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

const CONFIG_CHECK: &str = "config parses and validates";
const SERVICE_CHECK: &str = "import service configured";
const WEBSITE_CHECK: &str = "redirect base";
const TELEMETRY_CHECK: &str = "telemetry log writable";

pub fn run_doctor() -> DoctorReport {
    let env_service_url = env::var(SERVICE_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    run_doctor_with(resolve_config_path(), env_service_url)
}

pub fn run_doctor_with(
    config_path: anyhow::Result<PathBuf>,
    env_service_url: Option<String>,
) -> DoctorReport {
    let mut checks = Vec::new();

    let config_path = match config_path {
        Ok(path) => {
            checks.push(pass_check(
                "config path resolves",
                path.display().to_string(),
            ));
            path
        }
        Err(error) => {
            checks.push(fail_check("config path resolves", error.to_string()));
            push_skipped_checks(
                &mut checks,
                &[CONFIG_CHECK, SERVICE_CHECK, WEBSITE_CHECK, TELEMETRY_CHECK],
                "config path could not be resolved",
            );
            return DoctorReport { checks };
        }
    };

    let loaded = match load_optional(&config_path) {
        Ok(Some(config)) => {
            checks.push(pass_check(CONFIG_CHECK, "config is valid"));
            Some((config_path, config))
        }
        Ok(None) => {
            checks.push(pass_check(
                CONFIG_CHECK,
                "no config file; defaults apply",
            ));
            None
        }
        Err(message) => {
            checks.push(fail_check(CONFIG_CHECK, message));
            push_skipped_checks(
                &mut checks,
                &[SERVICE_CHECK, WEBSITE_CHECK, TELEMETRY_CHECK],
                "config is invalid",
            );
            return DoctorReport { checks };
        }
    };

    match merge_config(loaded, env_service_url) {
        Ok(effective) => {
            checks.push(check_service(&effective));
            checks.push(check_website(&effective));
            checks.push(check_telemetry_log(&effective));
        }
        Err(error) => {
            checks.push(fail_check(SERVICE_CHECK, error.to_string()));
            push_skipped_checks(
                &mut checks,
                &[WEBSITE_CHECK, TELEMETRY_CHECK],
                "effective config is invalid",
            );
        }
    }

    DoctorReport { checks }
}

fn load_optional(path: &Path) -> Result<Option<SnackImportConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    load_config(path).map(Some).map_err(|error| error.to_string())
}

fn check_service(effective: &EffectiveConfig) -> DoctorCheck {
    match (&effective.service_url, effective.service_url_source) {
        (Some(url), Some(source)) => {
            pass_check(SERVICE_CHECK, format!("{url} (from {})", source.label()))
        }
        _ => fail_check(
            SERVICE_CHECK,
            format!("set import.service_url in the config file or {SERVICE_URL_ENV}"),
        ),
    }
}

fn check_website(effective: &EffectiveConfig) -> DoctorCheck {
    match &effective.website_url {
        Some(url) => pass_check(WEBSITE_CHECK, format!("redirects resolve against {url}")),
        None => pass_check(WEBSITE_CHECK, "redirects are shown as relative paths"),
    }
}

fn check_telemetry_log(effective: &EffectiveConfig) -> DoctorCheck {
    let Some(path) = &effective.telemetry_log else {
        return pass_check(TELEMETRY_CHECK, "no telemetry log configured");
    };

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if parent.is_dir() {
        pass_check(TELEMETRY_CHECK, path.display().to_string())
    } else {
        fail_check(
            TELEMETRY_CHECK,
            format!("directory {} does not exist", parent.display()),
        )
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::anyhow;

    use super::*;

    fn check<'a>(report: &'a DoctorReport, name: &str) -> &'a DoctorCheck {
        report
            .checks
            .iter()
            .find(|check| check.name == name)
            .unwrap_or_else(|| panic!("missing check {name}"))
    }

    #[test]
    fn check_state_display_is_uppercase_label() {
        assert_eq!(CheckState::Pass.to_string(), "PASS");
        assert_eq!(CheckState::Fail.to_string(), "FAIL");
    }

    #[test]
    fn doctor_summary_counts_pass_and_fail() {
        let report = DoctorReport {
            checks: vec![
                pass_check("a", "ok"),
                fail_check("b", "no"),
                pass_check("c", "ok"),
            ],
        };

        assert_eq!(report.summary(), "2 passed, 1 failed");
        assert!(report.has_failures());
    }

    #[test]
    fn missing_config_without_env_fails_service_check_only() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = run_doctor_with(Ok(dir.path().join("config.toml")), None);

        assert_eq!(check(&report, CONFIG_CHECK).state, CheckState::Pass);
        assert_eq!(check(&report, SERVICE_CHECK).state, CheckState::Fail);
        assert!(check(&report, SERVICE_CHECK).details.contains(SERVICE_URL_ENV));
        assert_eq!(report.summary(), "4 passed, 1 failed");
    }

    #[test]
    fn env_service_url_satisfies_service_check() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = run_doctor_with(
            Ok(dir.path().join("config.toml")),
            Some("https://import.example.com".to_string()),
        );

        let service = check(&report, SERVICE_CHECK);
        assert_eq!(service.state, CheckState::Pass);
        assert!(service.details.contains(SERVICE_URL_ENV));
        assert!(!report.has_failures());
    }

    #[test]
    fn invalid_config_skips_remaining_checks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "version = 7\n").expect("write config");

        let report = run_doctor_with(Ok(path), None);

        assert_eq!(check(&report, CONFIG_CHECK).state, CheckState::Fail);
        assert!(
            check(&report, TELEMETRY_CHECK)
                .details
                .starts_with("skipped because")
        );
    }

    #[test]
    fn telemetry_log_in_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        let log_path = dir.path().join("missing").join("events.jsonl");
        fs::write(
            &path,
            format!(
                "version = 1\n\n[import]\nservice_url = \"https://import.example.com\"\n\n[telemetry]\nlog_path = {:?}\n",
                log_path.display().to_string()
            ),
        )
        .expect("write config");

        let report = run_doctor_with(Ok(path), None);

        assert_eq!(check(&report, SERVICE_CHECK).state, CheckState::Pass);
        assert_eq!(check(&report, TELEMETRY_CHECK).state, CheckState::Fail);
    }

    #[test]
    fn unresolvable_config_path_skips_everything() {
        let report = run_doctor_with(Err(anyhow!("no home")), None);

        assert_eq!(report.checks.len(), 5);
        assert_eq!(report.summary(), "0 passed, 5 failed");
    }
}
