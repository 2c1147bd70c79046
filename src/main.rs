use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use gyp_formula::dependency;
use gyp_formula::{Formula, InstallLayout, InstallOptions, commands};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gyp-formula")]
#[command(author, version, about = "Fetch and install the gyp build-configuration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read the formula from a JSON file instead of the built-in one
    #[arg(long, global = true, value_name = "FILE")]
    formula: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct LayoutArgs {
    /// Install prefix (default: $GYP_FORMULA_PREFIX, $HOMEBREW_PREFIX, or platform default)
    #[arg(long)]
    prefix: Option<PathBuf>,

    /// Binary directory (default: <prefix>/bin)
    #[arg(long)]
    bin_dir: Option<PathBuf>,

    /// Stage all writes under this root (default: $DESTDIR)
    #[arg(long)]
    destdir: Option<PathBuf>,
}

impl LayoutArgs {
    fn into_layout(self) -> InstallLayout {
        InstallLayout::resolve(self.prefix, self.bin_dir, self.destdir)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the formula
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that declared dependencies are available
    Check {
        /// Python interpreter to use (default: $GYP_FORMULA_PYTHON, python3, python)
        #[arg(long)]
        python: Option<PathBuf>,
    },

    /// Fetch the HEAD revision of the source
    Fetch {
        /// Checkout directory (default: ./<formula name>)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Run the install steps against a fetched source tree
    Install {
        /// Root of the fetched source tree
        #[arg(long, default_value = ".")]
        source: PathBuf,

        /// Python interpreter to use (default: $GYP_FORMULA_PYTHON, python3, python)
        #[arg(long)]
        python: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Remove installed files from the binary directory
    Uninstall {
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Generate shell completion scripts
    Completions {
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    gyp_formula::init_colors();

    let formula = match &cli.formula {
        Some(path) => Formula::from_json_file(path)?,
        None => Formula::gyp(),
    };

    match cli.command {
        Commands::Info { json } => {
            commands::info(&formula, json)?;
        }
        Commands::Check { python } => {
            let python = python.or_else(dependency::python_override_from_env);
            commands::check(&formula, python.as_deref())?;
        }
        Commands::Fetch { dest } => {
            let dest = dest.unwrap_or_else(|| PathBuf::from(&formula.name));
            commands::fetch(&formula, &dest)?;
        }
        Commands::Install {
            source,
            python,
            layout,
        } => {
            let options = InstallOptions {
                source_dir: source,
                layout: layout.into_layout(),
                python: python.or_else(dependency::python_override_from_env),
            };
            commands::install(&formula, &options)?;
        }
        Commands::Uninstall { layout } => {
            commands::uninstall(&formula, &layout.into_layout())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "gyp-formula",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
