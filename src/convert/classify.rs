//! Statement classification for rewritten lines.
//!
//! Detection is prefix/suffix based on the shapes SQLite dump tools emit;
//! there is no SQL parser behind it.

/// Which multi-line construct the transducer is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    InTable,
    InTrigger,
    InView,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Normal => write!(f, "statement"),
            Mode::InTable => write!(f, "CREATE TABLE"),
            Mode::InTrigger => write!(f, "CREATE TRIGGER"),
            Mode::InView => write!(f, "CREATE VIEW"),
        }
    }
}

/// What a line means for the transducer, given the current mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `CREATE TABLE` header; `name` is empty when it could not be extracted
    TableStart { name: String },
    /// `);` closing the open table block
    TableEnd,
    /// Table-level foreign key constraint
    ForeignKey,
    /// `CREATE TRIGGER`; `terminated` when the body ends on the same line
    TriggerStart { terminated: bool },
    TriggerEnd,
    /// `CREATE VIEW`; `terminated` when the statement ends on the same line
    ViewStart { terminated: bool },
    ViewEnd,
    /// Source transaction commit (`COMMIT;` or `END TRANSACTION;`)
    Commit,
    Other,
}

const CREATE_TABLE: &str = "CREATE TABLE";
const CREATE_TRIGGER: &str = "CREATE TRIGGER";
const CREATE_VIEW: &str = "CREATE VIEW";
const TABLE_END: &str = ");";
const TRIGGER_END: &str = "END;";
const VIEW_END: &str = ";";

/// Classify a rewritten line.
pub fn classify(line: &str, mode: Mode) -> LineKind {
    match mode {
        Mode::Normal => {
            if line.starts_with(CREATE_TABLE) {
                LineKind::TableStart {
                    name: table_name(line),
                }
            } else if line.starts_with(CREATE_TRIGGER) {
                LineKind::TriggerStart {
                    terminated: is_trigger_end(line),
                }
            } else if line.starts_with(CREATE_VIEW) {
                LineKind::ViewStart {
                    terminated: is_view_end(line),
                }
            } else if is_foreign_key(line) {
                LineKind::ForeignKey
            } else if is_commit(line) {
                LineKind::Commit
            } else {
                LineKind::Other
            }
        }
        Mode::InTable => {
            if is_foreign_key(line) {
                LineKind::ForeignKey
            } else if is_table_end(line) {
                LineKind::TableEnd
            } else {
                LineKind::Other
            }
        }
        Mode::InTrigger if is_trigger_end(line) => LineKind::TriggerEnd,
        Mode::InView if is_view_end(line) => LineKind::ViewEnd,
        Mode::InTrigger | Mode::InView => LineKind::Other,
    }
}

/// Extract the table name from a `CREATE TABLE` header.
///
/// Prefers the text between `EXISTS ` and ` (`; falls back to the token after
/// `CREATE TABLE`. Returns an empty string when neither shape is present.
pub fn table_name(line: &str) -> String {
    if let Some(pos) = line.find("EXISTS ") {
        let rest = &line[pos + "EXISTS ".len()..];
        if let Some(end) = rest.find(" (") {
            if end > 0 {
                return rest[..end].trim().to_string();
            }
        }
        return String::new();
    }

    let Some(rest) = line.strip_prefix(CREATE_TABLE) else {
        return String::new();
    };
    let rest = rest.trim_start();
    match rest.find('(') {
        Some(end) => rest[..end].trim().to_string(),
        None => String::new(),
    }
}

pub fn is_table_end(line: &str) -> bool {
    line.starts_with(TABLE_END)
}

pub fn is_trigger_end(line: &str) -> bool {
    line.ends_with(TRIGGER_END)
}

pub fn is_view_end(line: &str) -> bool {
    line.ends_with(VIEW_END)
}

/// Table-level `FOREIGN KEY (...)`, optionally named via `CONSTRAINT x`.
pub fn is_foreign_key(line: &str) -> bool {
    line.starts_with("FOREIGN KEY")
        || (line.starts_with("CONSTRAINT") && line.contains("FOREIGN KEY"))
}

fn is_commit(line: &str) -> bool {
    line == "COMMIT;" || line == "END TRANSACTION;"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_after_exists() {
        assert_eq!(table_name("CREATE TABLE IF NOT EXISTS actor ("), "actor");
    }

    #[test]
    fn test_table_name_without_exists() {
        assert_eq!(table_name("CREATE TABLE t (id INTEGER);"), "t");
        assert_eq!(table_name("CREATE TABLE rental("), "rental");
    }

    #[test]
    fn test_table_name_missing() {
        assert_eq!(table_name("CREATE TABLE"), "");
        assert_eq!(table_name("CREATE TABLE IF NOT EXISTS ("), "");
    }

    #[test]
    fn test_classify_normal() {
        assert_eq!(
            classify("CREATE TABLE IF NOT EXISTS film (", Mode::Normal),
            LineKind::TableStart {
                name: "film".to_string()
            }
        );
        assert_eq!(
            classify("CREATE TRIGGER upd AFTER UPDATE ON film", Mode::Normal),
            LineKind::TriggerStart { terminated: false }
        );
        assert_eq!(
            classify("CREATE VIEW v AS SELECT 1;", Mode::Normal),
            LineKind::ViewStart { terminated: true }
        );
        assert_eq!(classify("COMMIT;", Mode::Normal), LineKind::Commit);
        assert_eq!(
            classify("INSERT INTO film VALUES (1);", Mode::Normal),
            LineKind::Other
        );
    }

    #[test]
    fn test_classify_in_table() {
        assert_eq!(
            classify(
                "CONSTRAINT fk_city FOREIGN KEY (city_id) REFERENCES city (city_id),",
                Mode::InTable
            ),
            LineKind::ForeignKey
        );
        assert_eq!(classify(");", Mode::InTable), LineKind::TableEnd);
        assert_eq!(classify("name TEXT,", Mode::InTable), LineKind::Other);
    }

    #[test]
    fn test_table_mode_takes_precedence() {
        assert_eq!(
            classify("CREATE TRIGGER x", Mode::InTable),
            LineKind::Other
        );
    }

    #[test]
    fn test_trigger_and_view_terminators() {
        assert_eq!(classify("END;", Mode::InTrigger), LineKind::TriggerEnd);
        assert_eq!(classify("UPDATE t SET x = 1;", Mode::InTrigger), LineKind::Other);
        assert_eq!(classify("FROM t;", Mode::InView), LineKind::ViewEnd);
        assert_eq!(classify("SELECT a,", Mode::InView), LineKind::Other);
    }
}
