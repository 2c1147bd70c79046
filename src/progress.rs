//! Terminal spinner for the install steps

use crate::formula::InstallStep;
use crate::install::StepObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct StepSpinner {
    bar: ProgressBar,
    formula: String,
}

impl StepSpinner {
    /// Spinner on a TTY, hidden otherwise
    pub fn new(formula: &str) -> Self {
        let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());

        let bar = if is_tty {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            formula: formula.to_string(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StepObserver for StepSpinner {
    fn step_started(&mut self, _index: usize, step: &InstallStep) {
        let msg = match step {
            InstallStep::RunSetup { script, args } => {
                format!("{}: running {} {}", self.formula, script, args.join(" "))
            }
            InstallStep::CopyToBin { files } => {
                format!("{}: placing {}", self.formula, files.join(", "))
            }
        };
        self.bar.set_message(msg);
    }
}

impl Drop for StepSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
