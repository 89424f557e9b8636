use super::classify::Mode;

/// Conditions that abort a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Input ended inside a table, trigger or view definition
    UnterminatedBlock {
        mode: Mode,
        start_line: usize,
        table: Option<String>,
    },
    /// `--strict` and at least one warning was raised
    StrictWarnings { count: usize },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::UnterminatedBlock {
                mode,
                start_line,
                table,
            } => {
                write!(f, "unterminated {} statement", mode)?;
                if let Some(t) = table.as_deref().filter(|t| !t.is_empty()) {
                    write!(f, " for table '{}'", t)?;
                }
                write!(
                    f,
                    " starting at line {}: input ended before its terminator",
                    start_line
                )
            }
            ConvertError::StrictWarnings { count } => {
                write!(f, "Strict mode: {} warnings generated", count)
            }
        }
    }
}

impl std::error::Error for ConvertError {}
