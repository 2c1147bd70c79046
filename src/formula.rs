//! The formula record: declarative metadata plus an ordered list of install steps.
//!
//! A formula is static data. It is built once (either [`Formula::gyp`] or loaded
//! from JSON), validated, and then interpreted by [`crate::install`]. Nothing in
//! the install path mutates it.
//!
//! # Examples
//!
//! ```
//! use gyp_formula::formula::{Formula, InstallStep};
//!
//! let formula = Formula::gyp();
//! assert_eq!(formula.name, "gyp");
//! assert!(matches!(formula.install_steps[0], InstallStep::RunSetup { .. }));
//! formula.validate().unwrap();
//! ```

use crate::error::{FormulaError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path};

/// Version-control tool used to fetch the head revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Git,
    Svn,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMethod::Git => write!(f, "git"),
            FetchMethod::Svn => write!(f, "svn"),
        }
    }
}

/// Unpinned head source. There is deliberately no version or tag field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub method: FetchMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed when the install steps run
    Runtime,
    Build,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
}

/// One action of the install procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum InstallStep {
    /// Run `<interpreter> <script> <args...>` inside the source tree
    RunSetup { script: String, args: Vec<String> },
    /// Copy files from the source tree root into the binary directory
    CopyToBin { files: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    pub homepage: String,
    pub source: Source,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub install_steps: Vec<InstallStep>,
}

impl Formula {
    /// The built-in gyp formula
    pub fn gyp() -> Self {
        Self {
            name: "gyp".to_string(),
            homepage: "https://gyp.gsrc.io".to_string(),
            source: Source {
                url: "https://chromium.googlesource.com/external/gyp".to_string(),
                method: FetchMethod::Git,
            },
            dependencies: vec![Dependency {
                name: "python".to_string(),
                kind: DependencyKind::Runtime,
            }],
            install_steps: vec![
                InstallStep::RunSetup {
                    script: "setup.py".to_string(),
                    args: vec!["install".to_string()],
                },
                InstallStep::CopyToBin {
                    files: vec!["gyp".to_string(), "gyp_main.py".to_string()],
                },
            ],
        }
    }

    /// Load and validate a formula from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read formula: {}", path.display()))?;
        let formula: Self = serde_json::from_str(&contents)?;
        formula.validate()?;
        Ok(formula)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::Runtime)
    }

    /// All file names placed into the binary directory, in step order
    pub fn bin_files(&self) -> Vec<&str> {
        self.install_steps
            .iter()
            .filter_map(|step| match step {
                InstallStep::CopyToBin { files } => Some(files),
                InstallStep::RunSetup { .. } => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Reject formulae the install procedure cannot safely interpret
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            return Err(invalid(format!("bad name '{}'", self.name)));
        }

        if self.install_steps.is_empty() {
            return Err(invalid(format!("{} has no install steps", self.name)));
        }

        for step in &self.install_steps {
            match step {
                InstallStep::RunSetup { script, .. } => {
                    if !is_plain_relative(script) {
                        return Err(invalid(format!(
                            "setup script '{}' escapes the source tree",
                            script
                        )));
                    }
                }
                InstallStep::CopyToBin { files } => {
                    if files.is_empty() {
                        return Err(invalid("copy step lists no files".to_string()));
                    }
                    for file in files {
                        if !is_bare_file_name(file) {
                            return Err(invalid(format!(
                                "'{}' is not a bare file name",
                                file
                            )));
                        }
                    }
                }
            }
        }

        let pythons = self
            .runtime_dependencies()
            .filter(|d| d.name == "python")
            .count();
        if pythons > 1 {
            return Err(invalid("python declared more than once".to_string()));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> FormulaError {
    FormulaError::InvalidFormula(msg)
}

fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gyp_formula_shape() {
        let formula = Formula::gyp();
        assert_eq!(formula.name, "gyp");
        assert_eq!(formula.source.method, FetchMethod::Git);
        assert_eq!(formula.runtime_dependencies().count(), 1);
        assert_eq!(formula.bin_files(), vec!["gyp", "gyp_main.py"]);
        assert!(formula.validate().is_ok());
    }

    #[test]
    fn test_steps_run_setup_first() {
        let formula = Formula::gyp();
        match &formula.install_steps[0] {
            InstallStep::RunSetup { script, args } => {
                assert_eq!(script, "setup.py");
                assert_eq!(args, &vec!["install".to_string()]);
            }
            other => panic!("unexpected first step: {:?}", other),
        }
        assert!(matches!(
            formula.install_steps[1],
            InstallStep::CopyToBin { .. }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let formula = Formula::gyp();
        let json = formula.to_json().unwrap();
        assert!(json.contains("\"step\": \"run_setup\""));
        assert!(json.contains("\"method\": \"git\""));
        let parsed: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, formula);
    }

    #[test]
    fn test_from_json_file_rejects_invalid() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        let mut formula = Formula::gyp();
        formula.install_steps = vec![InstallStep::CopyToBin {
            files: vec!["../escape".to_string()],
        }];
        fs::write(&path, formula.to_json().unwrap()).unwrap();

        let err = Formula::from_json_file(&path).unwrap_err();
        assert!(matches!(err, FormulaError::InvalidFormula(_)));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let mut formula = Formula::gyp();
        formula.name = "a/b".to_string();
        assert!(formula.validate().is_err());

        let mut formula = Formula::gyp();
        formula.install_steps.clear();
        assert!(formula.validate().is_err());

        let mut formula = Formula::gyp();
        formula.install_steps[0] = InstallStep::RunSetup {
            script: "/usr/bin/setup.py".to_string(),
            args: vec![],
        };
        assert!(formula.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_python() {
        let mut formula = Formula::gyp();
        formula.dependencies.push(Dependency {
            name: "python".to_string(),
            kind: DependencyKind::Runtime,
        });
        assert!(formula.validate().is_err());
    }

    #[test]
    fn test_bare_file_name() {
        assert!(is_bare_file_name("gyp"));
        assert!(is_bare_file_name("gyp_main.py"));
        assert!(!is_bare_file_name(""));
        assert!(!is_bare_file_name("bin/gyp"));
        assert!(!is_bare_file_name("/gyp"));
        assert!(!is_bare_file_name(".."));
    }
}
