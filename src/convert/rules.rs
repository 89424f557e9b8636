//! Token rewriting rules applied to every input line.
//!
//! The rules run in the order they appear in [`RULES`]. Order matters: the
//! `int-default` rule must see `INT DEFAULT` before any integer renames run,
//! and the `missing-datatype` rule relies on quotes already being stripped.
//!
//! Keyword rules are case-sensitive and match whole words only, so column
//! names such as `release_year` are left alone.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// A named, context-free line rewrite.
pub struct Rule {
    pub name: &'static str,
    apply: fn(&str) -> Cow<'_, str>,
}

impl Rule {
    /// Apply this rule alone. Returns `Cow::Borrowed` when nothing changed.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        (self.apply)(line)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub const WHITESPACE: &str = "whitespace";
pub const STRIP_DOUBLE_QUOTES: &str = "strip-double-quotes";
pub const DATETIME: &str = "datetime";
pub const UNSIGNED: &str = "unsigned";
pub const BOOLEAN: &str = "boolean";
pub const ENUM_YEAR: &str = "enum-year";
pub const INT_DEFAULT: &str = "int-default";
pub const MEDIUMINT: &str = "mediumint";
pub const TINYINT: &str = "tinyint";
pub const BLOB: &str = "blob";
pub const MISSING_DATATYPE: &str = "missing-datatype";

/// The rewrite table, in application order.
pub static RULES: &[Rule] = &[
    Rule {
        name: WHITESPACE,
        apply: normalize_whitespace,
    },
    Rule {
        name: STRIP_DOUBLE_QUOTES,
        apply: strip_double_quotes,
    },
    Rule {
        name: DATETIME,
        apply: datetime_to_timestamp,
    },
    Rule {
        name: UNSIGNED,
        apply: drop_unsigned,
    },
    Rule {
        name: BOOLEAN,
        apply: boolean_to_integer,
    },
    Rule {
        name: ENUM_YEAR,
        apply: enum_year_to_text,
    },
    Rule {
        name: INT_DEFAULT,
        apply: int_default_to_integer,
    },
    Rule {
        name: MEDIUMINT,
        apply: mediumint_to_integer,
    },
    Rule {
        name: TINYINT,
        apply: tinyint_to_smallint,
    },
    Rule {
        name: BLOB,
        apply: blob_to_bytea,
    },
    Rule {
        name: MISSING_DATATYPE,
        apply: insert_missing_datatype,
    },
];

/// Result of running the full rule table over one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten line, without a line terminator
    pub text: String,
    /// Names of the rules that changed the line, in order
    pub fired: Vec<&'static str>,
}

impl Rewrite {
    pub fn fired(&self, rule: &str) -> bool {
        self.fired.iter().any(|r| *r == rule)
    }
}

/// Rewrite one raw input line through every rule in [`RULES`].
pub fn rewrite_line(raw: &str) -> Rewrite {
    let mut text = raw.to_string();
    let mut fired = Vec::new();

    for rule in RULES {
        if let Cow::Owned(changed) = rule.apply(&text) {
            if changed != text {
                fired.push(rule.name);
            }
            text = changed;
        }
    }

    Rewrite { text, fired }
}

static RE_DATETIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bDATETIME\b").unwrap());
static RE_UNSIGNED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\bUNSIGNED\b").unwrap());
static RE_BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBOOLEAN\b").unwrap());
static RE_TRUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTRUE\b").unwrap());
static RE_FALSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFALSE\b").unwrap());
// `ENUM(...)` takes its value list along; `YEAR` only a directly attached width.
static RE_ENUM_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bENUM\b(?:\s*\([^)]*\))?|\bYEAR\b(?:\(\d+\))?").unwrap());
static RE_INT_DEFAULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bINT DEFAULT\b").unwrap());
static RE_MEDIUMINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bMEDIUMINT\b").unwrap());
static RE_TINYINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTINYINT\b").unwrap());
static RE_BLOB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:TINY|MEDIUM|LONG)?BLOB\b").unwrap());
// A field name followed by two spaces and DEFAULT: the datatype is missing.
static RE_MISSING_DATATYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[^\s]+)  (?P<default>DEFAULT\b)").unwrap());

fn normalize_whitespace(line: &str) -> Cow<'_, str> {
    if !line.contains(['\r', '\t', '\n']) && line.trim() == line {
        return Cow::Borrowed(line);
    }
    let cleaned = line.replace('\r', "").replace('\t', " ");
    Cow::Owned(cleaned.trim().to_string())
}

fn strip_double_quotes(line: &str) -> Cow<'_, str> {
    if line.contains('"') {
        Cow::Owned(line.replace('"', ""))
    } else {
        Cow::Borrowed(line)
    }
}

/// `BOOLEAN` becomes `INTEGER`. Only one literal kind is rewritten: `TRUE`
/// wins when both appear on the same line.
fn boolean_to_integer(line: &str) -> Cow<'_, str> {
    if !RE_BOOLEAN.is_match(line) {
        return Cow::Borrowed(line);
    }
    let line = RE_BOOLEAN.replace_all(line, "INTEGER").into_owned();
    let line = if RE_TRUE.is_match(&line) {
        RE_TRUE.replace_all(&line, "1").into_owned()
    } else {
        RE_FALSE.replace_all(&line, "0").into_owned()
    };
    Cow::Owned(line)
}

fn datetime_to_timestamp(line: &str) -> Cow<'_, str> {
    RE_DATETIME.replace_all(line, "TIMESTAMP")
}

fn drop_unsigned(line: &str) -> Cow<'_, str> {
    RE_UNSIGNED.replace_all(line, "")
}

fn enum_year_to_text(line: &str) -> Cow<'_, str> {
    RE_ENUM_YEAR.replace_all(line, "TEXT")
}

fn int_default_to_integer(line: &str) -> Cow<'_, str> {
    RE_INT_DEFAULT.replace_all(line, "INTEGER DEFAULT")
}

fn mediumint_to_integer(line: &str) -> Cow<'_, str> {
    RE_MEDIUMINT.replace_all(line, "INTEGER")
}

fn tinyint_to_smallint(line: &str) -> Cow<'_, str> {
    RE_TINYINT.replace_all(line, "SMALLINT")
}

fn blob_to_bytea(line: &str) -> Cow<'_, str> {
    RE_BLOB.replace_all(line, "BYTEA")
}

fn insert_missing_datatype(line: &str) -> Cow<'_, str> {
    RE_MISSING_DATATYPE.replace(line, "$name TEXT $default")
}
