//! Buffering and finalization of one `CREATE TABLE` statement.
//!
//! Lines are held until the terminating `);` arrives, then the whole block is
//! rewritten at once: an autoincrementing primary key becomes `SERIAL PRIMARY
//! KEY`, and a dangling comma before the terminator is removed.

use super::classify::is_table_end;

const AUTOINCREMENT: &str = "AUTOINCREMENT";
const SERIAL_PRIMARY_KEY: &str = "SERIAL PRIMARY KEY";

/// An open `CREATE TABLE` block.
#[derive(Debug, Clone)]
pub struct TableBlock {
    name: String,
    start_line: usize,
    /// `None` marks a line deleted during finalization
    lines: Vec<Option<String>>,
}

/// A table block after rewriting, ready to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTable {
    pub name: String,
    pub lines: Vec<String>,
    /// Column rewritten to `SERIAL PRIMARY KEY`, if any
    pub serial_column: Option<String>,
}

impl FinalizedTable {
    /// True if any emitted line still carries `AUTOINCREMENT`.
    pub fn has_unresolved_autoincrement(&self) -> bool {
        self.lines.iter().any(|l| l.contains(AUTOINCREMENT))
    }
}

impl TableBlock {
    /// Open a block from its `CREATE TABLE` header, the first piece of
    /// [`split_header`].
    pub fn open(header: String, name: String, start_line: usize) -> Self {
        Self {
            name,
            start_line,
            lines: vec![Some(header)],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(Some(line));
    }

    /// Apply statement-wide rewrites and return the lines to emit.
    pub fn finalize(mut self) -> FinalizedTable {
        let serial_column = self.rewrite_primary_key();
        self.remove_trailing_comma();

        FinalizedTable {
            name: self.name,
            lines: self
                .lines
                .into_iter()
                .flatten()
                .filter(|l| !l.is_empty())
                .collect(),
            serial_column,
        }
    }

    /// Find the single autoincrementing primary key column and rewrite its
    /// declaration. Returns the column name when a rewrite happened.
    fn rewrite_primary_key(&mut self) -> Option<String> {
        let (column, constraint_idx) = self.find_autoincrement_key()?;
        let decl_idx = self.declaration_index(&column)?;

        if let Some(idx) = constraint_idx {
            self.lines[idx] = None;
        }
        if let Some(decl) = self.lines[decl_idx].as_mut() {
            let comma = if decl.ends_with(',') { "," } else { "" };
            *decl = format!("{} {}{}", column, SERIAL_PRIMARY_KEY, comma);
        }

        Some(column)
    }

    /// Returns the key column and, for table-level constraints, the index of
    /// the constraint line to delete. First match wins.
    fn find_autoincrement_key(&self) -> Option<(String, Option<usize>)> {
        for (idx, line) in self.body() {
            if let Some(column) = constraint_column(line) {
                let autoincrement = line.contains(AUTOINCREMENT)
                    || self
                        .declaration_index(&column)
                        .and_then(|d| self.lines[d].as_deref())
                        .is_some_and(|d| d.contains(AUTOINCREMENT));
                if autoincrement {
                    return Some((column, Some(idx)));
                }
            } else if line.contains("PRIMARY KEY AUTOINCREMENT") {
                if let Some(column) = first_token(line) {
                    return Some((column.to_string(), None));
                }
            }
        }
        None
    }

    /// Index of the first line declaring `column`.
    fn declaration_index(&self, column: &str) -> Option<usize> {
        self.body()
            .find(|(_, line)| {
                constraint_column(line).is_none() && first_token(line) == Some(column)
            })
            .map(|(idx, _)| idx)
    }

    /// Live lines between the header and the terminator, with their indices.
    fn body(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(idx, l)| l.as_deref().map(|l| (idx, l)))
            .filter(|(_, l)| !is_table_end(l))
    }

    /// Drop the trailing comma from the last content line before `);`.
    fn remove_trailing_comma(&mut self) {
        for line in self.lines.iter_mut().skip(1).rev().flatten() {
            if line.trim().is_empty() || is_table_end(line) {
                continue;
            }
            if line.ends_with(',') {
                line.pop();
            }
            break;
        }
    }
}

/// Column named by a single-column `PRIMARY KEY(col ...)` constraint.
fn constraint_column(line: &str) -> Option<String> {
    let pos = line.find("PRIMARY KEY")?;
    let rest = line[pos + "PRIMARY KEY".len()..].trim_start();
    let inner = rest.strip_prefix('(')?;
    let inner = &inner[..inner.find(')')?];
    if inner.contains(',') {
        return None;
    }
    first_token(inner).map(str::to_string)
}

fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Split a `CREATE TABLE` line carrying inline definitions into the header,
/// one piece per definition and the `);` terminator when present. A header
/// without definitions comes back as a single piece.
pub fn split_header(header: &str) -> Vec<String> {
    let Some(open) = header.find('(') else {
        return vec![header.to_string()];
    };
    let body = &header[open + 1..];
    if body.trim().is_empty() {
        return vec![header.to_string()];
    }

    let mut lines = vec![header[..=open].trim_end().to_string()];
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    for (i, c) in body.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string && depth == 0 => {
                push_piece(&mut lines, &current);
                lines.push(body[i..].trim().to_string());
                return lines;
            }
            ')' if !in_string => depth -= 1,
            ',' if !in_string && depth == 0 => {
                current.push(c);
                push_piece(&mut lines, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    push_piece(&mut lines, &current);
    lines
}

fn push_piece(lines: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        lines.push(piece.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> TableBlock {
        let mut pieces = split_header(lines[0]).into_iter();
        let mut block = TableBlock::open(pieces.next().unwrap(), "t".to_string(), 1);
        for line in pieces.chain(lines[1..].iter().map(|l| l.to_string())) {
            block.push(line);
        }
        block
    }

    #[test]
    fn test_constraint_line_with_autoincrement() {
        let table = block(&[
            "CREATE TABLE IF NOT EXISTS actor (",
            "actor_id INTEGER NOT NULL,",
            "first_name VARCHAR(45) NOT NULL,",
            "PRIMARY KEY(actor_id AUTOINCREMENT)",
            ");",
        ])
        .finalize();

        assert_eq!(table.serial_column.as_deref(), Some("actor_id"));
        assert_eq!(
            table.lines,
            vec![
                "CREATE TABLE IF NOT EXISTS actor (",
                "actor_id SERIAL PRIMARY KEY,",
                "first_name VARCHAR(45) NOT NULL",
                ");",
            ]
        );
    }

    #[test]
    fn test_constraint_line_with_autoincrement_on_column() {
        let table = block(&[
            "CREATE TABLE t (",
            "id INTEGER NOT NULL AUTOINCREMENT,",
            "name TEXT,",
            "PRIMARY KEY(id)",
            ");",
        ])
        .finalize();

        assert_eq!(table.lines[1], "id SERIAL PRIMARY KEY,");
        assert_eq!(table.lines[2], "name TEXT");
        assert!(!table.lines.iter().any(|l| l.contains("PRIMARY KEY(")));
    }

    #[test]
    fn test_plain_primary_key_untouched() {
        let table = block(&[
            "CREATE TABLE t (",
            "code TEXT NOT NULL,",
            "PRIMARY KEY(code)",
            ");",
        ])
        .finalize();

        assert_eq!(table.serial_column, None);
        assert_eq!(table.lines[2], "PRIMARY KEY(code)");
    }

    #[test]
    fn test_composite_primary_key_untouched() {
        let table = block(&[
            "CREATE TABLE film_actor (",
            "actor_id INTEGER NOT NULL,",
            "film_id INTEGER NOT NULL,",
            "PRIMARY KEY(actor_id,film_id),",
            ");",
        ])
        .finalize();

        assert_eq!(table.serial_column, None);
        assert_eq!(table.lines[3], "PRIMARY KEY(actor_id,film_id)");
    }

    #[test]
    fn test_trailing_comma_only_last_line() {
        let table = block(&["CREATE TABLE t (", "a TEXT,", "b TEXT,", "", ");"]).finalize();
        assert_eq!(table.lines, vec!["CREATE TABLE t (", "a TEXT,", "b TEXT", ");"]);
    }

    #[test]
    fn test_single_line_statement_is_split() {
        let table = block(&["CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);"])
            .finalize();

        assert_eq!(
            table.lines,
            vec!["CREATE TABLE t (", "id SERIAL PRIMARY KEY,", "name TEXT", ");"]
        );
        assert!(!table.has_unresolved_autoincrement());
    }

    #[test]
    fn test_split_respects_nesting_and_strings() {
        let lines = split_header("CREATE TABLE t (a NUMERIC(4,2), b TEXT DEFAULT 'x,y');");
        assert_eq!(
            lines,
            vec!["CREATE TABLE t (", "a NUMERIC(4,2),", "b TEXT DEFAULT 'x,y'", ");"]
        );
    }

    #[test]
    fn test_split_header_without_definitions() {
        assert_eq!(split_header("CREATE TABLE t ("), vec!["CREATE TABLE t ("]);
        assert_eq!(
            split_header("CREATE TABLE r (id INTEGER, FOREIGN KEY (c) REFERENCES c(id));"),
            vec![
                "CREATE TABLE r (",
                "id INTEGER,",
                "FOREIGN KEY (c) REFERENCES c(id)",
                ");"
            ]
        );
    }
}
