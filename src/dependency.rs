//! Runtime dependency probing.
//!
//! A declared dependency counts as present when `<program> --version` runs and
//! exits 0. For `python` the probe walks a short candidate list; any other name
//! is probed as a program of that name.

use crate::error::{FormulaError, Result};
use crate::formula::{Dependency, DependencyKind, Formula};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Env var naming the interpreter to use for `python`
pub const PYTHON_ENV: &str = "GYP_FORMULA_PYTHON";

const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// A resolved runtime that answered its version probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: PathBuf,
    pub version: String,
}

/// Run `<program> --version`; `None` if it cannot start or exits non-zero
pub fn probe(program: &Path) -> Option<Interpreter> {
    let output = Command::new(program).arg("--version").output().ok()?;

    if !output.status.success() {
        debug!(program = %program.display(), status = %output.status, "version probe failed");
        return None;
    }

    // Python 2 prints its version on stderr
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let version = if stdout.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    };

    Some(Interpreter {
        program: program.to_path_buf(),
        version,
    })
}

/// Explicit interpreter from the environment, if any
pub fn python_override_from_env() -> Option<PathBuf> {
    std::env::var_os(PYTHON_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Resolve one dependency. An explicit override never falls back to the defaults.
pub fn resolve(dep: &Dependency, python_override: Option<&Path>) -> Result<Interpreter> {
    let candidates: Vec<PathBuf> = match (dep.name.as_str(), python_override) {
        ("python", Some(program)) => vec![program.to_path_buf()],
        ("python", None) => PYTHON_CANDIDATES.iter().map(PathBuf::from).collect(),
        (name, _) => vec![PathBuf::from(name)],
    };

    for candidate in &candidates {
        if let Some(found) = probe(candidate) {
            debug!(
                dependency = %dep.name,
                program = %found.program.display(),
                version = %found.version,
                "dependency resolved"
            );
            return Ok(found);
        }
    }

    Err(FormulaError::DependencyMissing(dep.name.clone()))
}

/// Resolve every runtime dependency of a formula; returns the Python interpreter if declared
pub fn resolve_runtime(
    formula: &Formula,
    python_override: Option<&Path>,
) -> Result<Option<Interpreter>> {
    let mut python = None;

    for dep in formula
        .dependencies
        .iter()
        .filter(|d| d.kind == DependencyKind::Runtime)
    {
        let found = resolve(dep, python_override)?;
        if dep.name == "python" {
            python = Some(found);
        }
    }

    Ok(python)
}
