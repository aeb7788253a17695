// ordercheck - validate affiliate-partner order reports against the ERP export

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_INPUT, EXIT_OUTPUT, EXIT_POLICY, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "ordercheck")]
#[command(about = "Validate affiliate-partner order reports against the ERP order export")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log detail on stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every partner row and write the annotated partner table
    #[command(after_help = "\
Examples:
  ordercheck run --erp sale_order.xlsx --partner linkwise_september.xlsx
  ordercheck run --erp erp.csv --partner partner.csv --output checked.csv
  ordercheck run --erp erp.xlsx --erp-sheet Orders --partner feed.xlsx --json
  ordercheck run --erp erp.xlsx --partner feed.xlsx --policy shop.toml --report run.json")]
    Run {
        /// ERP order-line export (.xlsx, .xls, .ods, .csv, .tsv)
        #[arg(long)]
        erp: PathBuf,

        /// Affiliate-partner report (.xlsx, .xls, .ods, .csv, .tsv)
        #[arg(long)]
        partner: PathBuf,

        /// Output file (.xlsx or .csv). Default: <partner>_validated.xlsx next to the partner file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Policy file (TOML). Default: <config dir>/ordercheck/policy.toml, else built-in
        #[arg(long, env = "ORDERCHECK_POLICY")]
        policy: Option<PathBuf>,

        /// Worksheet to read from the ERP workbook (default: first sheet)
        #[arg(long, value_name = "NAME")]
        erp_sheet: Option<String>,

        /// Worksheet to read from the partner workbook (default: first sheet)
        #[arg(long, value_name = "NAME")]
        partner_sheet: Option<String>,

        /// Print the run result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON run result to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Suppress the human summary on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Parse and validate a policy file without running
    #[command(after_help = "\
Examples:
  ordercheck validate shop.toml")]
    Validate {
        /// Path to the policy TOML file
        policy: PathBuf,
    },

    /// Print the effective policy as TOML
    #[command(after_help = "\
Examples:
  ordercheck policy > shop.toml
  ordercheck policy --policy shop.toml")]
    Policy {
        /// Policy file to resolve instead of the default location
        #[arg(long, env = "ORDERCHECK_POLICY")]
        policy: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  ordercheck-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init also bridges the `log` records emitted by the library crates
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: ordercheck <command> [options]");
            eprintln!("       ordercheck --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            erp,
            partner,
            output,
            policy,
            erp_sheet,
            partner_sheet,
            json,
            report,
            quiet,
        }) => recon::cmd_run(recon::RunArgs {
            erp,
            partner,
            output,
            policy,
            erp_sheet,
            partner_sheet,
            json,
            report,
            quiet,
        }),
        Some(Commands::Validate { policy }) => recon::cmd_validate(policy),
        Some(Commands::Policy { policy }) => recon::cmd_policy(policy),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn policy(msg: impl Into<String>) -> Self {
        Self { code: EXIT_POLICY, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
