//! Database kinds and their constraint naming conventions.
//!
//! Some databases assign constraint names themselves when the schema author
//! leaves them out. Those names are not stable across introspections, so the
//! constraint differs must not use them as identities. The rules live in one
//! table keyed by [`DatabaseKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::differ::ConstraintKind;
use crate::error::DiffError;

/// Database product a snapshot was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Oracle Database.
    Oracle,
    /// IBM DB2.
    Db2,
    /// Apache Derby.
    Derby,
    /// MySQL (and MariaDB).
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// Microsoft SQL Server.
    SqlServer,
    /// H2.
    H2,
    /// SQLite.
    Sqlite,
    /// Unknown product; no auto-generated name rules apply.
    #[default]
    Unknown,
}

/// Lexical pattern identifying a database-assigned constraint name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoNameRule {
    /// Name starts with the given prefix (case-insensitive).
    Prefix(&'static str),
    /// Name contains the given fragment (case-insensitive).
    Contains(&'static str),
}

impl AutoNameRule {
    /// Returns true if the name matches this rule.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        match self {
            Self::Prefix(prefix) => lower.starts_with(prefix),
            Self::Contains(fragment) => lower.contains(fragment),
        }
    }
}

/// Auto-generated name rules: database, constraint kind restriction
/// (`None` = every kind), rule.
const AUTO_NAME_RULES: &[(DatabaseKind, Option<ConstraintKind>, AutoNameRule)] = &[
    (DatabaseKind::Oracle, None, AutoNameRule::Prefix("sys_")),
    (DatabaseKind::Db2, None, AutoNameRule::Prefix("sql")),
    (DatabaseKind::Derby, None, AutoNameRule::Prefix("sql")),
    (
        DatabaseKind::MySql,
        Some(ConstraintKind::ForeignKey),
        AutoNameRule::Contains("_ibfk_"),
    ),
];

impl DatabaseKind {
    /// Returns the lowercase key used in snapshot documents and on the CLI.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Db2 => "db2",
            Self::Derby => "derby",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::SqlServer => "sqlserver",
            Self::H2 => "h2",
            Self::Sqlite => "sqlite",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the auto-generated name rules that apply to a constraint kind.
    pub fn auto_name_rules(
        self,
        kind: ConstraintKind,
    ) -> impl Iterator<Item = &'static AutoNameRule> {
        AUTO_NAME_RULES
            .iter()
            .filter(move |(database, only, _)| {
                *database == self && only.map_or(true, |only| only == kind)
            })
            .map(|(_, _, rule)| rule)
    }

    /// Returns true if the name looks assigned by this database rather than
    /// by the schema author.
    #[must_use]
    pub fn is_auto_generated_name(self, kind: ConstraintKind, name: &str) -> bool {
        self.auto_name_rules(kind).any(|rule| rule.matches(name))
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DatabaseKind {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "db2" => Ok(Self::Db2),
            "derby" => Ok(Self::Derby),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "h2" => Ok(Self::H2),
            "sqlite" => Ok(Self::Sqlite),
            "unknown" => Ok(Self::Unknown),
            _ => Err(DiffError::UnknownDatabase(s.to_string())),
        }
    }
}
