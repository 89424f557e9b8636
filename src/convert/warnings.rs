//! Warning system for the converter.
//!
//! Warnings never stop a run on their own; they flag output that converted
//! but deserves a look (or fails the run under `--strict`).

use serde::Serialize;

/// Warning types that can occur during conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvertWarning {
    /// Foreign key captured inside a table whose name could not be read
    UnnamedTableConstraint { line: usize },
    /// Foreign key line outside any table definition, dropped
    OrphanForeignKey { line: usize },
    /// Field declared without a datatype, patched to TEXT
    MissingDatatypePatched { line: usize, column: String },
    /// AUTOINCREMENT survived table finalization
    UnresolvedAutoincrement { table: String, line: usize },
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertWarning::UnnamedTableConstraint { line } => write!(
                f,
                "line {}: foreign key in a table with no readable name, emitted as ALTER TABLE without a table",
                line
            ),
            ConvertWarning::OrphanForeignKey { line } => {
                write!(f, "line {}: foreign key outside CREATE TABLE dropped", line)
            }
            ConvertWarning::MissingDatatypePatched { line, column } => write!(
                f,
                "line {}: column '{}' had no datatype, declared as TEXT",
                line, column
            ),
            ConvertWarning::UnresolvedAutoincrement { table, line } => write!(
                f,
                "line {}: AUTOINCREMENT in table '{}' not converted to SERIAL",
                line, table
            ),
        }
    }
}

/// Collects warnings during conversion
#[derive(Debug)]
pub struct WarningCollector {
    warnings: Vec<ConvertWarning>,
    max_warnings: usize,
    total: usize,
}

impl Default for WarningCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: limit,
            total: 0,
        }
    }

    /// Add a warning. Every warning is counted; only the first
    /// `max_warnings` are kept.
    pub fn add(&mut self, warning: ConvertWarning) {
        tracing::warn!("{}", warning);
        self.total += 1;
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        }
    }

    /// Get all collected warnings
    pub fn warnings(&self) -> &[ConvertWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ConvertWarning> {
        self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        self.total > 0
    }

    /// Total warnings raised, including any beyond the storage limit
    pub fn count(&self) -> usize {
        self.total
    }

    pub fn is_truncated(&self) -> bool {
        self.total > self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_keeps_counting() {
        let mut collector = WarningCollector::with_limit(2);
        for line in 1..=5 {
            collector.add(ConvertWarning::OrphanForeignKey { line });
        }
        assert_eq!(collector.count(), 5);
        assert_eq!(collector.warnings().len(), 2);
        assert!(collector.is_truncated());
    }

    #[test]
    fn test_display() {
        let w = ConvertWarning::MissingDatatypePatched {
            line: 12,
            column: "special_features".to_string(),
        };
        assert_eq!(
            w.to_string(),
            "line 12: column 'special_features' had no datatype, declared as TEXT"
        );
    }
}
