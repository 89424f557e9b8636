//! Statements held back until the whole input has been written.
//!
//! Foreign keys are lifted out of `CREATE TABLE` blocks and replayed as
//! `ALTER TABLE ... ADD` once every table exists and every row is loaded.
//! Sequence resets for `SERIAL` keys follow the same late emission.

use std::io::Write;

/// A foreign key constraint removed from its table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyEntry {
    pub table_name: String,
    pub constraint: String,
}

impl ForeignKeyEntry {
    /// The `ALTER TABLE` statement for this constraint, terminated by `;`.
    pub fn to_statement(&self) -> String {
        let constraint = self.constraint.strip_suffix(',').unwrap_or(&self.constraint);
        let terminator = if constraint.ends_with(';') { "" } else { ";" };
        format!(
            "ALTER TABLE {} ADD {}{}",
            self.table_name, constraint, terminator
        )
    }
}

/// Foreign keys in capture order.
#[derive(Debug, Default)]
pub struct ForeignKeyQueue {
    entries: Vec<ForeignKeyEntry>,
}

impl ForeignKeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a constraint line for `table_name`.
    ///
    /// Lines from the transducer are already trimmed; raw dump lines passed
    /// in directly lose one leading tab.
    pub fn push(&mut self, table_name: &str, line: &str) {
        let constraint = line.strip_prefix('\t').unwrap_or(line);
        self.entries.push(ForeignKeyEntry {
            table_name: table_name.to_string(),
            constraint: constraint.to_string(),
        });
    }

    pub fn entries(&self) -> &[ForeignKeyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every queued constraint as an `ALTER TABLE` statement.
    pub fn write_all<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<u64> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_statement())?;
        }
        Ok(self.entries.len() as u64)
    }
}

/// Resets the sequence behind a `SERIAL` column to the highest loaded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReset {
    pub table_name: String,
    pub column: String,
}

impl SequenceReset {
    /// PostgreSQL names the implicit sequence `<table>_<column>_seq`.
    pub fn to_statement(&self, schema: &str) -> String {
        format!(
            "SELECT SETVAL('{schema}.{table}_{column}_seq', COALESCE(MAX({column}), 1)) FROM {schema}.{table};",
            schema = schema,
            table = self.table_name,
            column = self.column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_comma_becomes_semicolon() {
        let mut queue = ForeignKeyQueue::new();
        queue.push(
            "rental",
            "FOREIGN KEY (cust_id) REFERENCES customer(id),",
        );
        assert_eq!(
            queue.entries()[0].to_statement(),
            "ALTER TABLE rental ADD FOREIGN KEY (cust_id) REFERENCES customer(id);"
        );
    }

    #[test]
    fn test_missing_terminator_added() {
        let entry = ForeignKeyEntry {
            table_name: "payment".to_string(),
            constraint: "FOREIGN KEY (rental_id) REFERENCES rental (rental_id)".to_string(),
        };
        assert!(entry.to_statement().ends_with("(rental_id);"));
    }

    #[test]
    fn test_leading_tab_stripped() {
        let mut queue = ForeignKeyQueue::new();
        queue.push("t", "\tFOREIGN KEY (a) REFERENCES b (a),");
        assert_eq!(queue.entries()[0].constraint, "FOREIGN KEY (a) REFERENCES b (a),");
    }

    #[test]
    fn test_write_all_preserves_order() {
        let mut queue = ForeignKeyQueue::new();
        queue.push("a", "FOREIGN KEY (x) REFERENCES x (id),");
        queue.push("b", "FOREIGN KEY (y) REFERENCES y (id)");
        queue.push("a", "FOREIGN KEY (z) REFERENCES z (id)");

        let mut out = Vec::new();
        assert_eq!(queue.write_all(&mut out).unwrap(), 3);
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ALTER TABLE a ADD FOREIGN KEY (x) REFERENCES x (id);",
                "ALTER TABLE b ADD FOREIGN KEY (y) REFERENCES y (id);",
                "ALTER TABLE a ADD FOREIGN KEY (z) REFERENCES z (id);",
            ]
        );
    }

    #[test]
    fn test_sequence_reset_statement() {
        let reset = SequenceReset {
            table_name: "actor".to_string(),
            column: "actor_id".to_string(),
        };
        assert_eq!(
            reset.to_statement("public"),
            "SELECT SETVAL('public.actor_actor_id_seq', COALESCE(MAX(actor_id), 1)) FROM public.actor;"
        );
    }
}
