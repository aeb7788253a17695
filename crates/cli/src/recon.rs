//! `ordercheck run|validate|policy`: policy resolution, table loading, and output.

use std::path::{Path, PathBuf};

use serde::Serialize;

use ordercheck_io::TableFormat;
use ordercheck_recon::{ReconError, ReconPolicy, ReconResult};

use crate::exit_codes::recon_exit_code;
use crate::CliError;

pub struct RunArgs {
    pub erp: PathBuf,
    pub partner: PathBuf,
    pub output: Option<PathBuf>,
    pub policy: Option<PathBuf>,
    pub erp_sheet: Option<String>,
    pub partner_sheet: Option<String>,
    pub json: bool,
    pub report: Option<PathBuf>,
    pub quiet: bool,
}

/// JSON document for `--json` / `--report`.
#[derive(Serialize)]
struct RunReport<'a> {
    erp_file: String,
    partner_file: String,
    output_file: String,
    policy_source: String,
    #[serde(flatten)]
    result: &'a ReconResult,
}

// ---------------------------------------------------------------------------
// Policy resolution
// ---------------------------------------------------------------------------

/// Where the effective policy came from.
#[derive(Debug, Clone, PartialEq)]
enum PolicySource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for PolicySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Builtin => write!(f, "built-in"),
        }
    }
}

fn default_policy_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ordercheck").join("policy.toml"))
}

fn policy_err(err: ReconError, path: &Path) -> CliError {
    CliError {
        code: recon_exit_code(&err),
        message: format!("{}: {err}", path.display()),
        hint: Some("run `ordercheck policy` for a complete, valid policy file".into()),
    }
}

fn read_policy(path: &Path) -> Result<ReconPolicy, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::policy(format!("cannot read policy {}: {e}", path.display())))?;
    ReconPolicy::from_toml(&text).map_err(|e| policy_err(e, path))
}

/// Explicit path (flag or env) → default config location → built-in.
fn resolve_policy(explicit: Option<&Path>) -> Result<(ReconPolicy, PolicySource), CliError> {
    if let Some(path) = explicit {
        return Ok((read_policy(path)?, PolicySource::File(path.to_path_buf())));
    }

    if let Some(path) = default_policy_path().filter(|p| p.is_file()) {
        log::info!("using policy {}", path.display());
        return Ok((read_policy(&path)?, PolicySource::File(path)));
    }

    Ok((ReconPolicy::default(), PolicySource::Builtin))
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// `<partner-stem>_validated.xlsx` in the partner file's directory.
fn default_output_path(partner: &Path) -> PathBuf {
    let stem = partner
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "partner".into());
    partner.with_file_name(format!("{stem}_validated.xlsx"))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn load(path: &Path, sheet: Option<&str>, role: &str) -> Result<ordercheck_recon::Table, CliError> {
    ordercheck_io::load_table(path, sheet)
        .map_err(|e| CliError::input(format!("cannot load {role} table: {e}")))
}

fn column_hint(err: &ReconError) -> Option<String> {
    match err {
        ReconError::MissingColumn { table, .. } => Some(format!(
            "map the header under [columns.{table}] in a policy file (see `ordercheck policy`)"
        )),
        ReconError::EmptyTable { .. } => Some("is the header row on another sheet? try --erp-sheet / --partner-sheet".into()),
        _ => None,
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.partner));

    if !matches!(TableFormat::from_path(&output), Some(TableFormat::Csv | TableFormat::Tsv))
        && !output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
    {
        return Err(CliError::args(format!(
            "unsupported output file: {} (expected .xlsx or .csv)",
            output.display()
        )));
    }
    if same_file(&output, &args.erp) || same_file(&output, &args.partner) {
        return Err(CliError::args(format!(
            "output {} would overwrite an input file",
            output.display()
        ))
        .with_hint("pass a different --output"));
    }

    let (policy, source) = resolve_policy(args.policy.as_deref())?;
    log::debug!("policy '{}' from {}", policy.name, source);

    let erp = load(&args.erp, args.erp_sheet.as_deref(), "ERP")?;
    let partner = load(&args.partner, args.partner_sheet.as_deref(), "partner")?;

    let result = ordercheck_recon::run(&policy, &erp, &partner).map_err(|e| {
        let hint = column_hint(&e);
        CliError { code: recon_exit_code(&e), message: e.to_string(), hint }
    })?;

    ordercheck_io::save_table(&result.output, &output)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", output.display())))?;

    if args.json || args.report.is_some() {
        let report = RunReport {
            erp_file: args.erp.display().to_string(),
            partner_file: args.partner.display().to_string(),
            output_file: output.display().to_string(),
            policy_source: source.to_string(),
            result: &result,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.report {
            std::fs::write(path, &json).map_err(|e| {
                CliError::output(format!("cannot write report {}: {e}", path.display()))
            })?;
            if !args.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if args.json {
            println!("{json}");
        }
    }

    if !args.quiet {
        eprintln!("{}", result.summary.line());
        eprintln!("wrote {}", output.display());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// validate / policy
// ---------------------------------------------------------------------------

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let policy = read_policy(&path)?;
    println!(
        "{}: ok (policy '{}', rules: {})",
        path.display(),
        policy.name,
        policy
            .rules
            .order
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

pub fn cmd_policy(explicit: Option<PathBuf>) -> Result<(), CliError> {
    let (policy, source) = resolve_policy(explicit.as_deref())?;
    let text = policy
        .to_toml()
        .map_err(|e| CliError::general(format!("cannot render policy: {e}")))?;
    println!("# source: {source}");
    print!("{text}");
    Ok(())
}
