// src/validate.rs

//! External validation helpers
//!
//! AppData files can be checked by an external validator binary, and corrupt
//! PNG icons handed to a repair tool. Both are advisory: a failing or missing
//! tool never changes what the pipeline emits, it only changes what gets
//! logged. Runs are bounded by a timeout so one wedged subprocess cannot
//! stall a batch.

use crate::config::ValidatorConfig;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Outcome of one advisory validator run
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub ok: bool,
    /// Combined stdout of the validator, for the log
    pub output: String,
}

/// Run the configured AppData validator against `path`
///
/// Returns `None` when no validator is configured or the run itself could not
/// complete (spawn failure, timeout). The caller logs the report and moves on.
pub fn validate_appdata(cfg: &ValidatorConfig, path: &Path) -> Option<ValidationReport> {
    let command = cfg.command.as_deref()?;

    let child = Command::new(command)
        .args(&cfg.args)
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            warn!(command, "failed to spawn validator: {e}");
            return None;
        }
    };

    let timeout = std::time::Duration::from_secs(cfg.timeout_secs);
    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            warn!(command, file = %path.display(), "validator timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }
        Err(e) => {
            warn!(command, "failed to wait for validator: {e}");
            return None;
        }
    };

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        use std::io::Read;
        let _ = stdout.read_to_string(&mut output);
    }
    debug!(file = %path.display(), ok = status.success(), "validator finished");
    Some(ValidationReport {
        ok: status.success(),
        output,
    })
}

/// Try a single lossless repair of a corrupt PNG, in place
///
/// Returns true when the repair tool ran and succeeded; the caller re-reads
/// the file afterwards.
pub fn repair_png(cfg: &ValidatorConfig, path: &Path) -> bool {
    let Some(command) = cfg.png_repair_command.as_deref() else {
        return false;
    };
    let status = Command::new(command)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => {
            debug!(file = %path.display(), "repaired PNG");
            true
        }
        Ok(_) => false,
        Err(e) => {
            warn!(command, "failed to run PNG repair tool: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_validator_configured_means_no_report() {
        let cfg = ValidatorConfig::default();
        assert!(validate_appdata(&cfg, Path::new("/nonexistent")).is_none());
    }

    #[test]
    fn validator_exit_status_is_reported() {
        let cfg = ValidatorConfig {
            command: Some("true".into()),
            ..Default::default()
        };
        let report = validate_appdata(&cfg, Path::new("/nonexistent")).unwrap();
        assert!(report.ok);

        let cfg = ValidatorConfig {
            command: Some("false".into()),
            ..Default::default()
        };
        let report = validate_appdata(&cfg, Path::new("/nonexistent")).unwrap();
        assert!(!report.ok);
    }

    #[test]
    fn missing_validator_binary_is_advisory() {
        let cfg = ValidatorConfig {
            command: Some("/does/not/exist".into()),
            ..Default::default()
        };
        assert!(validate_appdata(&cfg, Path::new("/nonexistent")).is_none());
    }

    #[test]
    fn repair_without_tool_is_a_noop() {
        let cfg = ValidatorConfig::default();
        assert!(!repair_png(&cfg, Path::new("/nonexistent")));
    }
}
