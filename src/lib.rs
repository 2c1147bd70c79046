//! Library interface for gyp-formula
//!
//! The [`formula::Formula`] record describes how gyp is fetched and installed;
//! [`install::install`] interprets it.

pub mod commands;
pub mod dependency;
pub mod error;
pub mod fetch;
pub mod formula;
pub mod install;
pub mod layout;

mod colors;
mod progress;

pub use colors::init_colors;
pub use error::{FormulaError, Result};
pub use formula::Formula;
pub use install::{InstallOptions, InstallReport, install};
pub use layout::InstallLayout;
