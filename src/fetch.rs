//! Head fetch - check out the latest revision of a formula's source

use crate::error::{FormulaError, Result};
use crate::formula::{FetchMethod, Source};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{info, warn};

/// A checked-out source tree and the revision it holds
#[derive(Debug, Clone)]
pub struct FetchedTree {
    pub path: PathBuf,
    pub revision: Option<String>,
}

/// Fetch the head revision of `source` into `dest`, which must not exist yet
pub fn fetch_head(source: &Source, dest: &Path) -> Result<FetchedTree> {
    if dest.exists() {
        return Err(FormulaError::FetchFailed(format!(
            "{} already exists",
            dest.display()
        )));
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let dest_str = dest.to_string_lossy();
    info!(url = %source.url, method = %source.method, dest = %dest.display(), "fetching head");

    let output = match source.method {
        FetchMethod::Git => run_vcs(
            "git",
            &["clone", "--depth", "1", &source.url, dest_str.as_ref()],
        )?,
        FetchMethod::Svn => run_vcs(
            "svn",
            &["checkout", "--quiet", &source.url, dest_str.as_ref()],
        )?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FormulaError::FetchFailed(format!(
            "{} exited with {}: {}",
            source.method,
            output.status,
            stderr.trim()
        )));
    }

    let revision = head_revision(source.method, dest);
    if revision.is_none() {
        warn!(dest = %dest.display(), "could not determine fetched revision");
    }

    Ok(FetchedTree {
        path: dest.to_path_buf(),
        revision,
    })
}

/// Revision of an existing checkout, if the VCS tool reports one
pub fn head_revision(method: FetchMethod, checkout: &Path) -> Option<String> {
    let checkout = checkout.to_string_lossy();
    let output = match method {
        FetchMethod::Git => run_vcs("git", &["-C", checkout.as_ref(), "rev-parse", "HEAD"]),
        FetchMethod::Svn => run_vcs(
            "svn",
            &["info", "--show-item", "revision", checkout.as_ref()],
        ),
    }
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if revision.is_empty() {
        None
    } else {
        Some(revision)
    }
}

fn run_vcs(program: &str, args: &[&str]) -> Result<Output> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| FormulaError::FetchFailed(format!("Failed to execute {}: {}", program, e)))?;
    Ok(output)
}
