// Test helpers for isolated install testing
// Everything lives under a temp dir; nothing on the host is touched
#![allow(dead_code)]

use gyp_formula::{InstallLayout, InstallOptions};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated install environment, cleaned up on drop
///
/// Layout:
/// - temp/
///   - prefix/        (install prefix; bin/ is created by the install)
///   - src/           (fetched source tree)
///   - tools/python   (fake interpreter: answers --version, runs scripts with sh)
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub prefix: PathBuf,
    pub bin: PathBuf,
    pub source: PathBuf,
    pub python: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        let prefix = root.join("prefix");
        let bin = prefix.join("bin");
        let source = root.join("src");
        let tools = root.join("tools");

        fs::create_dir_all(&prefix).unwrap();
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&tools).unwrap();

        let python = tools.join("python");
        write_executable(
            &python,
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo \"Python 3.12.0\"; exit 0; fi\n\
             exec /bin/sh \"$@\"\n",
        );

        Self {
            temp_dir,
            prefix,
            bin,
            source,
            python,
        }
    }

    /// Write a source tree whose setup.py logs its arguments and exits with `setup_exit`
    pub fn write_source_tree(&self, setup_exit: i32, files: &[&str]) {
        fs::write(
            self.source.join("setup.py"),
            format!("echo \"$@\" > setup.log\nexit {}\n", setup_exit),
        )
        .unwrap();

        for file in files {
            let contents = if file.ends_with(".py") {
                "import sys\nsys.exit(0)\n".to_string()
            } else {
                format!("#!/bin/sh\nexec python \"$(dirname \"$0\")/{}_main.py\" \"$@\"\n", file)
            };
            fs::write(self.source.join(file), contents).unwrap();
        }
    }

    /// Arguments the fake setup.py was run with, if it ran
    pub fn setup_log(&self) -> Option<String> {
        fs::read_to_string(self.source.join("setup.log"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(&self.prefix)
    }

    pub fn options(&self) -> InstallOptions {
        InstallOptions {
            source_dir: self.source.clone(),
            layout: self.layout(),
            python: Some(self.python.clone()),
        }
    }

    /// Sorted names of everything in the binary directory
    pub fn bin_entries(&self) -> Vec<String> {
        list_dir(&self.bin)
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 == 0o111)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_directories() {
        let env = TestEnvironment::new();

        assert!(env.prefix.exists());
        assert!(env.source.exists());
        assert!(is_executable(&env.python));
        assert!(!env.bin.exists());
    }

    #[test]
    fn test_environment_cleanup() {
        let prefix = {
            let env = TestEnvironment::new();
            env.prefix.clone()
        };

        assert!(!prefix.exists());
    }
}
