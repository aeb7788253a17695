use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    PolicyParse(String),
    /// Policy validation error (duplicate rule, negative tolerance, etc.).
    PolicyValidation(String),
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// Input table has no header row at all.
    EmptyTable { table: String },
}

impl ReconError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolicyParse(msg) => write!(f, "policy parse error: {msg}"),
            Self::PolicyValidation(msg) => write!(f, "policy validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table} table: missing column '{column}'")
            }
            Self::EmptyTable { table } => write!(f, "{table} table: no header row"),
        }
    }
}

impl std::error::Error for ReconError {}
