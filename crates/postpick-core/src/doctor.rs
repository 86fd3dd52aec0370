use std::fmt;
use std::path::Path;

use crate::config::{PostpickConfig, load_config_or_default, resolve_config_path};
use crate::source::{HttpListSource, ListSource};
use crate::store::{FileSelectionStore, SelectionStore};

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

pub fn run_doctor() -> DoctorReport {
    match resolve_config_path() {
        Ok(config_path) => run_doctor_at(&config_path),
        Err(error) => {
            let mut checks = vec![fail_check("config path resolves", error.to_string())];
            push_skipped_checks(
                &mut checks,
                &[
                    "config file",
                    "config parses and validates",
                    "selection store readable",
                    "endpoint returns posts",
                ],
                "config path could not be resolved",
            );
            DoctorReport { checks }
        }
    }
}

pub fn run_doctor_at(config_path: &Path) -> DoctorReport {
    let mut checks = Vec::new();

    checks.push(if config_path.exists() {
        pass_check("config file", format!("found at {}", config_path.display()))
    } else {
        pass_check("config file", format!("not found at {}, using defaults", config_path.display()))
    });

    let config = match load_config_or_default(config_path) {
        Ok(config) => {
            checks.push(pass_check("config parses and validates", "config is valid"));
            config
        }
        Err(error) => {
            checks.push(fail_check("config parses and validates", error.to_string()));
            push_skipped_checks(
                &mut checks,
                &["selection store readable", "endpoint returns posts"],
                "config is invalid",
            );
            return DoctorReport { checks };
        }
    };

    checks.push(check_store(&config));
    checks.push(check_endpoint(&config));

    DoctorReport { checks }
}

fn check_store(config: &PostpickConfig) -> DoctorCheck {
    let path = match config.store_path() {
        Ok(path) => path,
        Err(error) => return fail_check("selection store readable", error.to_string()),
    };

    let store = FileSelectionStore::new(&path);
    match store.load() {
        Ok(Some(item)) => pass_check(
            "selection store readable",
            format!("post {} selected in {}", item.id, path.display()),
        ),
        Ok(None) => pass_check(
            "selection store readable",
            format!("no selection saved in {}", path.display()),
        ),
        Err(error) => fail_check("selection store readable", error.to_string()),
    }
}

fn check_endpoint(config: &PostpickConfig) -> DoctorCheck {
    let source = match HttpListSource::new(config.source.endpoint.clone()) {
        Ok(source) => source,
        Err(error) => return fail_check("endpoint returns posts", error.to_string()),
    };

    match source.fetch_all() {
        Ok(items) => pass_check(
            "endpoint returns posts",
            format!("{} posts from {}", items.len(), source.endpoint()),
        ),
        Err(error) => fail_check("endpoint returns posts", error.to_string()),
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

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .map(|name| fail_check(name, format!("skipped because {reason}"))),
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::serve_once;

    fn write_config(dir: &Path, endpoint: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.toml");
        let store_path = dir.join("store.json");
        fs::write(
            &config_path,
            format!(
                "version = 1\n\n[source]\nendpoint = \"{endpoint}\"\n\n[store]\npath = \"{}\"\n",
                store_path.display()
            ),
        )
        .expect("write config");
        config_path
    }

    #[test]
    fn check_state_display_is_uppercase_label() {
        assert_eq!(CheckState::Pass.to_string(), "PASS");
        assert_eq!(CheckState::Fail.to_string(), "FAIL");
    }

    #[test]
    fn doctor_passes_with_reachable_endpoint() {
        let temp = tempfile::tempdir().expect("temp dir");
        let endpoint = serve_once("200 OK", r#"[{"id":1,"title":"a","body":"b"}]"#);
        let config_path = write_config(temp.path(), &endpoint);

        let report = run_doctor_at(&config_path);

        assert!(!report.has_failures(), "{report:?}");
        assert_eq!(report.summary(), "4 passed, 0 failed");
        assert!(report.checks[3].details.starts_with("1 posts from"));
    }

    #[test]
    fn doctor_fails_endpoint_check_on_bad_status() {
        let temp = tempfile::tempdir().expect("temp dir");
        let endpoint = serve_once("500 Internal Server Error", "boom");
        let config_path = write_config(temp.path(), &endpoint);

        let report = run_doctor_at(&config_path);

        assert!(report.has_failures());
        let endpoint_check = report
            .checks
            .iter()
            .find(|check| check.name == "endpoint returns posts")
            .expect("endpoint check");
        assert_eq!(endpoint_check.state, CheckState::Fail);
        assert!(endpoint_check.details.contains("500"));
    }

    #[test]
    fn doctor_skips_runtime_checks_for_invalid_config() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "version = 9\n").expect("write config");

        let report = run_doctor_at(&config_path);

        assert_eq!(report.summary(), "1 passed, 3 failed");
        assert!(report.checks[2].details.contains("skipped because config is invalid"));
    }
}
