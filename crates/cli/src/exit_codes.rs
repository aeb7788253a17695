//! CLI Exit Code Registry
//!
//! Single source of truth for `ordercheck` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args, conflicting flags)            |
//! | 3    | Input error (unreadable table, missing required column)  |
//! | 4    | Invalid policy file                                      |
//! | 5    | Output could not be written                              |
//!
//! Classification outcomes (unmatched, cancel, ...) never change the exit
//! code; they are data, reported in the output file.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, output path equal to an input, etc.
pub const EXIT_USAGE: u8 = 2;

/// An input table could not be read, or lacks a required column.
pub const EXIT_INPUT: u8 = 3;

/// Policy file is unreadable, malformed, or fails validation.
pub const EXIT_POLICY: u8 = 4;

/// Annotated table, report, or JSON could not be written.
pub const EXIT_OUTPUT: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ordercheck_recon::ReconError) -> u8 {
    use ordercheck_recon::ReconError;
    match err {
        ReconError::PolicyParse(_) | ReconError::PolicyValidation(_) => EXIT_POLICY,
        ReconError::MissingColumn { .. } | ReconError::EmptyTable { .. } => EXIT_INPUT,
    }
}
