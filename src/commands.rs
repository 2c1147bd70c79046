//! Command implementations for the gyp-formula CLI

use crate::dependency;
use crate::error::Result;
use crate::fetch;
use crate::formula::{DependencyKind, Formula, InstallStep};
use crate::install::{self, InstallOptions};
use crate::layout::InstallLayout;
use crate::progress::StepSpinner;
use colored::Colorize;
use std::path::Path;

pub fn info(formula: &Formula, json: bool) -> Result<()> {
    if json {
        println!("{}", formula.to_json()?);
        return Ok(());
    }

    println!("{}", format!("==> {}: HEAD", formula.name).bold().green());
    println!("{}: {}", "Homepage".bold(), formula.homepage);
    println!(
        "{}: {} ({})",
        "Source".bold(),
        formula.source.url,
        formula.source.method
    );

    if !formula.dependencies.is_empty() {
        let deps: Vec<String> = formula
            .dependencies
            .iter()
            .map(|d| match d.kind {
                DependencyKind::Runtime => d.name.clone(),
                DependencyKind::Build => format!("{} (build)", d.name),
            })
            .collect();
        println!("{}: {}", "Dependencies".bold(), deps.join(", "));
    }

    println!("{}", "==> Install steps".bold().green());
    for (i, step) in formula.install_steps.iter().enumerate() {
        match step {
            InstallStep::RunSetup { script, args } => {
                println!("  {}. python {} {}", i + 1, script, args.join(" "));
            }
            InstallStep::CopyToBin { files } => {
                println!("  {}. bin.install {}", i + 1, files.join(" "));
            }
        }
    }

    Ok(())
}

/// Probe every declared dependency; errors on the first missing runtime one
pub fn check(formula: &Formula, python: Option<&Path>) -> Result<()> {
    let mut missing = None;

    for dep in &formula.dependencies {
        print!("checking for {}...", dep.name);
        match dependency::resolve(dep, python) {
            Ok(found) => println!(" {} ({})", "ok".green(), found.version),
            Err(e) => {
                println!(" {}", "missing".red());
                if dep.kind == DependencyKind::Runtime && missing.is_none() {
                    missing = Some(e);
                }
            }
        }
    }

    match missing {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn fetch(formula: &Formula, dest: &Path) -> Result<()> {
    println!(
        "Fetching {} from {}...",
        formula.name.bold(),
        formula.source.url.cyan()
    );

    let tree = fetch::fetch_head(&formula.source, dest)?;

    match &tree.revision {
        Some(rev) => println!(
            "  {} Checked out {} at {}",
            "✓".green(),
            tree.path.display(),
            rev.bold()
        ),
        None => println!("  {} Checked out {}", "✓".green(), tree.path.display()),
    }
    println!(
        "  {} HEAD is unpinned; the revision above is what will be installed",
        "⚠".yellow()
    );

    Ok(())
}

pub fn install(formula: &Formula, options: &InstallOptions) -> Result<()> {
    println!(
        "Installing {} from {}...",
        formula.name.bold(),
        options.source_dir.display()
    );

    let mut spinner = StepSpinner::new(&formula.name);
    let result = install::install_with_observer(formula, options, &mut spinner);
    spinner.finish();

    match result {
        Ok(report) => {
            if let Some(interp) = &report.interpreter {
                println!(
                    "  {} Ran setup with {} ({})",
                    "✓".green(),
                    interp.program.display(),
                    interp.version
                );
            }
            for placed in &report.placed {
                let note = if placed.unchanged { " (unchanged)" } else { "" };
                println!("  {} {}{}", "✓".green(), placed.path.display(), note.dimmed());
            }
            println!(
                "{} Installed {}",
                "==>".bold().green(),
                report.formula.bold()
            );
            Ok(())
        }
        Err(e) => {
            println!("  {} Failed to install {}: {}", "✗".red(), formula.name.bold(), e);
            Err(e)
        }
    }
}

pub fn uninstall(formula: &Formula, layout: &InstallLayout) -> Result<()> {
    let removed = install::uninstall(formula, layout)?;

    if removed.is_empty() {
        println!(
            "{} {} is not installed in {}",
            "⚠".yellow(),
            formula.name.bold(),
            layout.staged_bin_dir().display()
        );
        return Ok(());
    }

    for path in &removed {
        println!("  {} Removed {}", "✓".green(), path.display());
    }
    println!("{} Uninstalled {}", "==>".bold().green(), formula.name.bold());
    Ok(())
}
