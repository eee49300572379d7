use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Callsite {
    pub file: String,
    pub line: u32,
}

/// Contents of `<stem>.provenance.json` next to an exported table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    pub code_rev: String,
    pub engine_version: String,
    pub callsite: Callsite,
    pub command: String,
    pub params: Value,
    pub outputs: Vec<String>,
}

/// Write the sidecar for `artifact`; the callsite is the caller's location.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, command: &str, params: Value) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = sidecar_path(artifact);
    let caller = Location::caller();
    let doc = Sidecar {
        code_rev: current_git_rev(),
        engine_version: edgecurve::VERSION.to_string(),
        callsite: Callsite {
            file: caller.file().to_string(),
            line: caller.line(),
        },
        command: command.to_string(),
        params,
        outputs: vec![artifact.to_string_lossy().into_owned()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Build-time `GIT_COMMIT`, then the runtime variable, then `git rev-parse`.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|s| !s.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_table() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/run/points.csv")),
            Path::new("/tmp/run/points.provenance.json")
        );
    }

    #[test]
    fn sidecar_records_params_and_output() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("ticks.csv");
        fs::write(&artifact, "tick\n").unwrap();
        let path = write_sidecar(&artifact, "simulate", json!({"seed": 7})).unwrap();
        let doc: Sidecar = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(doc.command, "simulate");
        assert_eq!(doc.params["seed"], 7);
        assert_eq!(doc.outputs, vec![artifact.to_string_lossy().into_owned()]);
        assert!(doc.callsite.file.ends_with("sidecar.rs"));
        assert_eq!(doc.engine_version, edgecurve::VERSION);
    }
}
