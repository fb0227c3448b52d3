use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod list;
mod validate;

#[derive(Parser)]
#[command(
    name = "preflight",
    version,
    about = "Declarative pre-flight validation of benchmark plugin configurations"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log filter when RUST_LOG is unset (e.g. warn, debug, preflight=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Show project information
    #[arg(long)]
    about: bool,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

/// Validation tier selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tier {
    /// Argument and configuration checks
    Syntax,
    /// Credential requirements
    Platform,
    /// Composite validators
    Semantic,
}

impl Tier {
    fn as_str(self) -> &'static str {
        match self {
            Tier::Syntax => "syntax",
            Tier::Platform => "platform",
            Tier::Semantic => "semantic",
        }
    }
}

#[derive(Subcommand)]
#[command(next_display_order = None)]
enum Commands {
    /// Validate every workload of a task file
    Validate {
        /// Path to the task file (YAML or JSON)
        task: PathBuf,
        /// Catalog of plugins, bases, and validator declarations
        #[arg(long, default_value = "catalog.yaml")]
        catalog: PathBuf,
        /// Deployment credentials (platform -> {admin, users})
        #[arg(long)]
        credentials: Option<PathBuf>,
        /// Run only these tiers (repeatable) [default: all]
        #[arg(long, value_enum)]
        vtype: Vec<Tier>,
        /// Namespace used for workloads that do not name one
        #[arg(long)]
        namespace: Option<String>,
        /// Allow hidden plugins
        #[arg(long)]
        allow_hidden: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List registered validators
    Validators {
        /// Also load validator declarations from this catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List plugins of a catalog
    Plugins {
        /// Catalog of plugins, bases, and validator declarations
        #[arg(long, default_value = "catalog.yaml")]
        catalog: PathBuf,
        /// Include hidden plugins
        #[arg(long)]
        all: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

pub fn run(cli: Cli) {
    init_tracing(&cli.log_level);

    if cli.about {
        print_about();
        return;
    }

    match cli.command {
        Some(Commands::Validate {
            task,
            catalog,
            credentials,
            vtype,
            namespace,
            allow_hidden,
            format,
        }) => validate::run(validate::Args {
            task,
            catalog,
            credentials,
            vtype: vtype.into_iter().map(|t| t.as_str().to_string()).collect(),
            namespace,
            allow_hidden,
            format,
        }),
        Some(Commands::Validators { catalog, format }) => list::validators(catalog, format),
        Some(Commands::Plugins {
            catalog,
            all,
            format,
        }) => list::plugins(catalog, all, format),
        None => {
            eprintln!("Usage: preflight <command> [args]");
            eprintln!("Run `preflight --help` for details.");
            std::process::exit(1);
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_about() {
    println!(
        "preflight: declarative validation for benchmark plugins\n\
         ├─ version:    {}\n\
         └─ licence:    {} https://www.apache.org/licenses/LICENSE-2.0",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE"),
    );
}

/// Load a catalog or exit with `preflight <command>: <error>`.
fn load_catalog(command: &str, path: &std::path::Path) -> preflight::Catalog {
    match preflight::Catalog::from_file(path) {
        Ok(catalog) => catalog,
        Err(e) => fail(command, format!("{}: {e}", path.display())),
    }
}

/// Print a configuration error and exit 1.
fn fail(command: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("preflight {command}: {message}");
    std::process::exit(1);
}
