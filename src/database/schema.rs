//! Table and caching declarations.
//!
//! A [`TableSchema`] lists the columns of one relational table in declaration
//! order together with any table-level constraints. A [`CachingSchema`] opts
//! the table into an in-memory mirror keyed by one of its columns.

use crate::{
    database::value::{CacheValue, ColumnKind, KeyKind},
    errors::{Error, Result},
};
use std::collections::HashSet;

/// Column layout of one table, used verbatim in `CREATE TABLE IF NOT EXISTS`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<(String, String)>,
    constraints: Vec<String>,
}

impl TableSchema {
    /// Starts a schema for the table `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Appends a column with its SQL type/constraint declaration.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, declaration: impl Into<String>) -> Self {
        self.columns.push((name.into(), declaration.into()));
        self
    }

    /// Appends a table-level constraint such as `UNIQUE (serverid, role)`.
    #[must_use]
    pub fn constraint(mut self, clause: impl Into<String>) -> Self {
        self.constraints.push(clause.into());
        self
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared columns in order.
    #[must_use]
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// Whether `column` is declared on this table.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    /// Renders the `CREATE TABLE IF NOT EXISTS` statement.
    #[must_use]
    pub fn create_statement(&self) -> String {
        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(|(name, declaration)| format!("{name} {declaration}"))
            .chain(self.constraints.iter().cloned())
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            definitions.join(", ")
        )
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !is_identifier(&self.name) {
            return Err(self.invalid(format!("'{}' is not a valid table name", self.name)));
        }
        if self.columns.is_empty() {
            return Err(self.invalid("at least one column must be declared".to_string()));
        }

        let mut seen = HashSet::new();
        for (column, _) in &self.columns {
            if !is_identifier(column) {
                return Err(self.invalid(format!("'{column}' is not a valid column name")));
            }
            if !seen.insert(column.as_str()) {
                return Err(self.invalid(format!("column '{column}' is declared twice")));
            }
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> Error {
        Error::InvalidSchema {
            table: self.name.clone(),
            message,
        }
    }
}

/// How one cached column turns a stored value into its mirrored form.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRule {
    /// Convert to `kind`; `default` answers reads when the value is absent or null.
    Typed {
        /// Target type of the conversion
        kind: ColumnKind,
        /// Value returned for absent keys/columns
        default: Option<CacheValue>,
    },
    /// Keep the stored value as-is.
    Opaque,
}

impl CacheRule {
    /// A typed rule without default.
    #[must_use]
    pub const fn typed(kind: ColumnKind) -> Self {
        Self::Typed {
            kind,
            default: None,
        }
    }

    /// A typed rule with a default value.
    #[must_use]
    pub fn with_default(kind: ColumnKind, default: impl Into<CacheValue>) -> Self {
        Self::Typed {
            kind,
            default: Some(default.into()),
        }
    }

    /// The declared default, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&CacheValue> {
        match self {
            Self::Typed { default, .. } => default.as_ref(),
            Self::Opaque => None,
        }
    }
}

/// Declares the mirror of a table: which column keys it and which columns it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CachingSchema {
    key_column: String,
    key_kind: KeyKind,
    rules: Vec<(String, CacheRule)>,
}

impl CachingSchema {
    /// Mirror keyed by `key_column`, whose values are converted with `key_kind`.
    #[must_use]
    pub fn new(key_kind: KeyKind, key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            key_kind,
            rules: Vec::new(),
        }
    }

    /// Adds a mirrored column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, rule: CacheRule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// Column holding the mirror key.
    #[must_use]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Conversion applied to key values.
    #[must_use]
    pub const fn key_kind(&self) -> KeyKind {
        self.key_kind
    }

    /// Mirrored columns in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[(String, CacheRule)] {
        &self.rules
    }

    /// Rule for `column`, if it is mirrored.
    #[must_use]
    pub fn rule(&self, column: &str) -> Option<&CacheRule> {
        self.rules
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, rule)| rule)
    }

    pub(crate) fn validate(&self, table: &TableSchema) -> Result<()> {
        let invalid = |message: String| Error::InvalidSchema {
            table: table.name().to_string(),
            message,
        };

        if !table.has_column(&self.key_column) {
            return Err(invalid(format!(
                "cache key column '{}' is not declared",
                self.key_column
            )));
        }

        let mut seen = HashSet::new();
        for (column, _) in &self.rules {
            if column == &self.key_column {
                return Err(invalid(format!(
                    "cache key column '{column}' cannot also be a cached column"
                )));
            }
            if !table.has_column(column) {
                return Err(invalid(format!("cached column '{column}' is not declared")));
            }
            if !seen.insert(column.as_str()) {
                return Err(invalid(format!("cached column '{column}' is declared twice")));
            }
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`; names are spliced into SQL, values never are.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles_schema() -> TableSchema {
        TableSchema::new("roles")
            .column("serverid", "NUMERIC UNIQUE NOT NULL")
            .column("staff", "NUMERIC DEFAULT 0")
    }

    #[test]
    fn test_create_statement_keeps_declaration_order() {
        let schema = TableSchema::new("permissions")
            .column("serverid", "BIGINT NOT NULL")
            .column("role", "BIGINT DEFAULT 0")
            .constraint("UNIQUE (serverid, role)");

        assert_eq!(
            schema.create_statement(),
            "CREATE TABLE IF NOT EXISTS permissions (serverid BIGINT NOT NULL, role BIGINT DEFAULT 0, UNIQUE (serverid, role))"
        );
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let schema = TableSchema::new("roles; DROP TABLE x").column("serverid", "BIGINT");
        assert!(matches!(
            schema.validate(),
            Err(Error::InvalidSchema { .. })
        ));

        let schema = TableSchema::new("roles").column("server id", "BIGINT");
        assert!(matches!(
            schema.validate(),
            Err(Error::InvalidSchema { .. })
        ));

        assert!(TableSchema::new("empty").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_columns() {
        let schema = TableSchema::new("roles")
            .column("serverid", "BIGINT")
            .column("serverid", "BIGINT");
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_caching_key_must_be_declared() {
        let caching = CachingSchema::new(KeyKind::Int, "guild")
            .column("staff", CacheRule::with_default(ColumnKind::Int, 0));
        assert!(matches!(
            caching.validate(&roles_schema()),
            Err(Error::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_caching_columns_must_be_declared() {
        let caching = CachingSchema::new(KeyKind::Int, "serverid")
            .column("muted", CacheRule::typed(ColumnKind::Int));
        assert!(caching.validate(&roles_schema()).is_err());

        let caching = CachingSchema::new(KeyKind::Int, "serverid")
            .column("staff", CacheRule::with_default(ColumnKind::Int, 0));
        assert!(caching.validate(&roles_schema()).is_ok());
        assert_eq!(
            caching.rule("staff").and_then(CacheRule::default_value),
            Some(&CacheValue::Int(0))
        );
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("_default"));
        assert!(is_identifier("server_log2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
