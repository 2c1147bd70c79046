//! The install procedure.
//!
//! Steps run strictly in declaration order and the first failure aborts the
//! whole install. There are no retries and no rollback: a failed copy after a
//! successful setup leaves the package tree installed without its entry points,
//! and running the install again repairs it.
//!
//! [`uninstall`] matches the binary directory by file name alone; it removes a
//! `gyp` it did not put there just the same.
//!
//! ```text
//! source/                       bin/
//!   setup.py   --(1) python setup.py install
//!   gyp        --(2) copy, 0755 -->  gyp
//!   gyp_main.py --(2) copy, 0755 --> gyp_main.py
//! ```

use crate::dependency::{self, Interpreter};
use crate::error::{FormulaError, Result};
use crate::formula::{Formula, InstallStep};
use crate::layout::InstallLayout;
use anyhow::Context;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

const BIN_MODE: u32 = 0o755;

/// Everything the procedure needs beyond the formula itself
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Root of the fetched source tree; the setup script runs here
    pub source_dir: PathBuf,
    pub layout: InstallLayout,
    /// Explicit interpreter for the `python` dependency
    pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    pub path: PathBuf,
    /// Destination already held identical, executable content
    pub unchanged: bool,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub formula: String,
    pub interpreter: Option<Interpreter>,
    pub placed: Vec<PlacedFile>,
}

/// Hook invoked before each step starts; the CLI uses it to drive its spinner
pub trait StepObserver {
    fn step_started(&mut self, _index: usize, _step: &InstallStep) {}
}

impl StepObserver for () {}

/// Validate, probe dependencies, then run every install step in order
pub fn install(formula: &Formula, options: &InstallOptions) -> Result<InstallReport> {
    install_with_observer(formula, options, &mut ())
}

pub fn install_with_observer(
    formula: &Formula,
    options: &InstallOptions,
    observer: &mut dyn StepObserver,
) -> Result<InstallReport> {
    formula.validate()?;

    if !options.source_dir.is_dir() {
        return Err(FormulaError::FileNotFound(options.source_dir.clone()));
    }

    let interpreter = dependency::resolve_runtime(formula, options.python.as_deref())?;

    let mut report = InstallReport {
        formula: formula.name.clone(),
        interpreter: interpreter.clone(),
        placed: Vec::new(),
    };

    for (index, step) in formula.install_steps.iter().enumerate() {
        observer.step_started(index, step);
        match step {
            InstallStep::RunSetup { script, args } => {
                let interpreter = interpreter.as_ref().ok_or_else(|| {
                    FormulaError::DependencyMissing(format!(
                        "python (required to run {})",
                        script
                    ))
                })?;
                run_setup(
                    interpreter,
                    &options.source_dir,
                    script,
                    args,
                    options.layout.destdir.as_deref(),
                )?;
            }
            InstallStep::CopyToBin { files } => {
                let placed =
                    copy_to_bin(&options.source_dir, files, &options.layout.staged_bin_dir())?;
                report.placed.extend(placed);
            }
        }
    }

    info!(formula = %formula.name, files = report.placed.len(), "install complete");
    Ok(report)
}

/// Step 1: run the external setup script and propagate its exit status
pub fn run_setup(
    interpreter: &Interpreter,
    source_dir: &Path,
    script: &str,
    args: &[String],
    destdir: Option<&Path>,
) -> Result<()> {
    let mut command = Command::new(&interpreter.program);
    command.arg(script).args(args).current_dir(source_dir);

    if let Some(root) = destdir {
        command.arg("--root").arg(root);
    }

    info!(
        interpreter = %interpreter.program.display(),
        script,
        dir = %source_dir.display(),
        "running setup"
    );

    let output = command
        .output()
        .with_context(|| format!("Failed to execute {}", interpreter.program.display()))?;

    if !output.stdout.is_empty() {
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        warn!("{}", stderr.trim_end());
    }

    let status = match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    Err(FormulaError::ExternalInstallFailure {
        script: script.to_string(),
        status,
    })
}

/// Step 2: copy `files` from the source root into `bin_dir` as executables.
///
/// Every source is checked before anything is written, so a missing file leaves
/// `bin_dir` exactly as it was.
pub fn copy_to_bin(
    source_dir: &Path,
    files: &[String],
    bin_dir: &Path,
) -> Result<Vec<PlacedFile>> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let source = source_dir.join(file);
        if !source.is_file() {
            return Err(FormulaError::FileNotFound(source));
        }
        sources.push((source, bin_dir.join(file)));
    }

    if !bin_dir.exists() {
        fs::create_dir_all(bin_dir)
            .with_context(|| format!("Failed to create directory: {}", bin_dir.display()))?;
        fs::set_permissions(bin_dir, fs::Permissions::from_mode(BIN_MODE))?;
    }

    let mut placed = Vec::with_capacity(sources.len());
    for (source, target) in sources {
        let unchanged = place_executable(&source, &target)?;
        debug!(target = %target.display(), unchanged, "placed");
        placed.push(PlacedFile {
            path: target,
            unchanged,
        });
    }

    Ok(placed)
}

/// Copy one file into place; returns true when the target was already identical.
///
/// The copy is staged next to the target and renamed over it, so the target is
/// never opened for writing: a symlink is replaced rather than followed, a hard
/// link to the source (or the source itself) is not truncated, and a read-only
/// target does not block a reinstall.
fn place_executable(source: &Path, target: &Path) -> Result<bool> {
    match target.symlink_metadata() {
        Ok(meta) if meta.file_type().is_symlink() => {}
        Ok(meta) if meta.is_file() => {
            let executable = meta.permissions().mode() & 0o111 == 0o111;
            if executable && file_digest(source)? == file_digest(target)? {
                return Ok(true);
            }
        }
        Ok(_) => {
            return Err(FormulaError::Other(anyhow::anyhow!(
                "{} exists and is not a regular file",
                target.display()
            )));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(".gyp-formula-")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

    let mut reader = fs::File::open(source)
        .with_context(|| format!("Failed to open {}", source.display()))?;
    io::copy(&mut reader, staged.as_file_mut()).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    staged
        .as_file()
        .set_permissions(fs::Permissions::from_mode(BIN_MODE))?;

    staged
        .persist(target)
        .map_err(|e| FormulaError::IoError(e.error))?;
    Ok(false)
}

fn file_digest(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Remove the formula's files from the binary directory. Absent files are skipped.
///
/// Files are matched by name only. No receipt records what was installed, so a
/// `gyp` or `gyp_main.py` placed in the binary directory by something else is
/// removed too. Directories with those names are left alone.
pub fn uninstall(formula: &Formula, layout: &InstallLayout) -> Result<Vec<PathBuf>> {
    formula.validate()?;
    let bin_dir = layout.staged_bin_dir();
    let mut removed = Vec::new();

    for file in formula.bin_files() {
        let target = bin_dir.join(file);
        match target.symlink_metadata() {
            Ok(meta) if meta.is_dir() => {
                warn!(target = %target.display(), "skipping directory");
            }
            Ok(_) => {
                fs::remove_file(&target)
                    .with_context(|| format!("Failed to remove {}", target.display()))?;
                removed.push(target);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(target = %target.display(), "not installed");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(removed)
}
