//! # DDL translation
//!
//! Turns a raw DDL statement read from the log into zero or more structured
//! schema operations. The grammar itself is pluggable: the session picks a
//! [`DdlTranslator`] from the configured [`DdlDialect`], or the embedding
//! application injects its own.
//!
//! A single statement may fan out into several operations:
//!
//! ```ignore
//! let changes = BasicDdlTranslator
//!     .translate("ALTER TABLE t ADD COLUMN x INT, ADD COLUMN y INT", &catalog)?;
//! assert_eq!(changes.len(), 2);
//! ```

use crate::common::{CdcError, Result, TableCatalog};
use serde::{Deserialize, Serialize};
use sqlparser::ast as sp;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::sync::Arc;
use tracing::{debug, trace};

// ============================================================================
// Schema Change Types
// ============================================================================

/// Type of schema change (DDL operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaChangeType {
    /// CREATE TABLE
    Create,
    /// ALTER TABLE (add/drop/modify column)
    Alter,
    /// DROP TABLE
    Drop,
    /// TRUNCATE TABLE
    Truncate,
    /// RENAME TABLE
    Rename,
    /// CREATE INDEX
    CreateIndex,
    /// DROP INDEX
    DropIndex,
    /// Other DDL (comments, grants, etc.)
    Other,
}

impl SchemaChangeType {
    /// Classify a DDL statement by its leading keywords.
    pub fn from_sql(sql: &str) -> Self {
        let upper = sql.to_uppercase();
        let trimmed = upper.trim();

        if trimmed.starts_with("CREATE TABLE") || trimmed.starts_with("CREATE TEMPORARY TABLE") {
            SchemaChangeType::Create
        } else if trimmed.starts_with("ALTER TABLE")
            || trimmed.starts_with("ALTER ONLINE TABLE")
            || trimmed.starts_with("ALTER IGNORE TABLE")
        {
            SchemaChangeType::Alter
        } else if trimmed.starts_with("DROP TABLE") || trimmed.starts_with("DROP TEMPORARY TABLE")
        {
            SchemaChangeType::Drop
        } else if trimmed.starts_with("TRUNCATE") {
            SchemaChangeType::Truncate
        } else if trimmed.starts_with("RENAME TABLE") {
            SchemaChangeType::Rename
        } else if trimmed.starts_with("CREATE INDEX")
            || trimmed.starts_with("CREATE UNIQUE INDEX")
            || trimmed.starts_with("CREATE FULLTEXT INDEX")
        {
            SchemaChangeType::CreateIndex
        } else if trimmed.starts_with("DROP INDEX") {
            SchemaChangeType::DropIndex
        } else {
            SchemaChangeType::Other
        }
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            SchemaChangeType::Create => "CREATE TABLE",
            SchemaChangeType::Alter => "ALTER TABLE",
            SchemaChangeType::Drop => "DROP TABLE",
            SchemaChangeType::Truncate => "TRUNCATE TABLE",
            SchemaChangeType::Rename => "RENAME TABLE",
            SchemaChangeType::CreateIndex => "CREATE INDEX",
            SchemaChangeType::DropIndex => "DROP INDEX",
            SchemaChangeType::Other => "DDL",
        }
    }

    /// Whether the statement targets a whole table rather than an index or other object.
    pub fn is_table_level(&self) -> bool {
        matches!(
            self,
            SchemaChangeType::Create
                | SchemaChangeType::Alter
                | SchemaChangeType::Drop
                | SchemaChangeType::Truncate
                | SchemaChangeType::Rename
        )
    }
}

impl std::fmt::Display for SchemaChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Column Definition
// ============================================================================

/// Column definition carried by schema change operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// Database-native type (e.g., "varchar(255)", "int unsigned")
    pub type_name: String,
    /// Is nullable
    pub nullable: bool,
    /// Is part of primary key
    pub primary_key: bool,
    /// Default value expression (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            primary_key: false,
            default_value: None,
        }
    }

    /// Set nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set primary key.
    pub fn with_primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        self
    }

    /// Set default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }
}

// ============================================================================
// Schema Operations
// ============================================================================

/// One structural change to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaOperation {
    CreateTable {
        columns: Vec<ColumnDefinition>,
    },
    DropTable,
    TruncateTable,
    RenameTable {
        to: String,
    },
    AddColumn(ColumnDefinition),
    DropColumn {
        name: String,
    },
    ModifyColumn(ColumnDefinition),
    RenameColumn {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition: Option<ColumnDefinition>,
    },
    /// Statement forwarded without structural interpretation
    Raw {
        change_type: SchemaChangeType,
        ddl: String,
    },
}

impl SchemaOperation {
    pub fn change_type(&self) -> SchemaChangeType {
        match self {
            SchemaOperation::CreateTable { .. } => SchemaChangeType::Create,
            SchemaOperation::DropTable => SchemaChangeType::Drop,
            SchemaOperation::TruncateTable => SchemaChangeType::Truncate,
            SchemaOperation::RenameTable { .. } => SchemaChangeType::Rename,
            SchemaOperation::AddColumn(_)
            | SchemaOperation::DropColumn { .. }
            | SchemaOperation::ModifyColumn(_)
            | SchemaOperation::RenameColumn { .. } => SchemaChangeType::Alter,
            SchemaOperation::Raw { change_type, .. } => *change_type,
        }
    }
}

/// A schema operation bound to the table it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub table: String,
    pub operation: SchemaOperation,
}

impl SchemaChange {
    pub fn new(table: impl Into<String>, operation: SchemaOperation) -> Self {
        Self {
            table: table.into(),
            operation,
        }
    }
}

// ============================================================================
// Translators
// ============================================================================

/// Pluggable DDL grammar.
///
/// Implementations must be pure with respect to the catalog: it is a
/// read-only view of the table shapes *before* the statement applies.
pub trait DdlTranslator: Send + Sync {
    fn translate(&self, ddl: &str, catalog: &dyn TableCatalog) -> Result<Vec<SchemaChange>>;
}

/// Which built-in DDL translator a session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DdlDialect {
    /// Keyword-level MySQL/MariaDB translator with per-clause fan-out
    #[default]
    Basic,
    /// One raw event per statement
    Passthrough,
}

impl DdlDialect {
    pub fn translator(self) -> Arc<dyn DdlTranslator> {
        match self {
            DdlDialect::Basic => Arc::new(BasicDdlTranslator),
            DdlDialect::Passthrough => Arc::new(PassthroughDdlTranslator),
        }
    }
}

impl std::str::FromStr for DdlDialect {
    type Err = CdcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(DdlDialect::Basic),
            "passthrough" | "raw" => Ok(DdlDialect::Passthrough),
            other => Err(CdcError::config(format!("Unknown DDL dialect: {}", other))),
        }
    }
}

/// Emits a single [`SchemaOperation::Raw`] per table-level statement.
///
/// The statement text is forwarded exactly as read from the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDdlTranslator;

impl DdlTranslator for PassthroughDdlTranslator {
    fn translate(&self, ddl: &str, _catalog: &dyn TableCatalog) -> Result<Vec<SchemaChange>> {
        let tokens = lex(ddl)?;
        Ok(raw_change(ddl, &tokens)?.into_iter().collect())
    }
}

/// MySQL/MariaDB table DDL translator built on `sqlparser`.
///
/// CREATE TABLE carries its column list, DROP TABLE and TRUNCATE fan out per
/// table, and ALTER TABLE yields one operation per column or rename clause.
/// Index, constraint, partition and table option clauses produce nothing.
/// Table-level statements the parser does not understand are forwarded as
/// [`SchemaOperation::Raw`]; anything that is not table DDL produces no
/// change at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicDdlTranslator;

impl DdlTranslator for BasicDdlTranslator {
    fn translate(&self, ddl: &str, _catalog: &dyn TableCatalog) -> Result<Vec<SchemaChange>> {
        let statements = match Parser::parse_sql(&MySqlDialect {}, ddl) {
            Ok(statements) => statements,
            Err(e) => {
                debug!("Forwarding unparsed DDL ({}): {}", e, ddl.trim());
                let tokens = lex(ddl)?;
                return Ok(raw_change(ddl, &tokens)?.into_iter().collect());
            }
        };

        let single = statements.len() == 1;
        let mut changes = Vec::new();
        for statement in statements {
            let source = if single {
                ddl.to_string()
            } else {
                statement.to_string()
            };
            changes.extend(translate_statement(&source, statement)?);
        }
        Ok(changes)
    }
}

fn translate_statement(source: &str, statement: sp::Statement) -> Result<Vec<SchemaChange>> {
    match statement {
        sp::Statement::CreateTable(create) => {
            let table = table_name(&create.name)?;
            let primary_key: Vec<String> = create
                .constraints
                .iter()
                .filter_map(|constraint| match constraint {
                    sp::TableConstraint::PrimaryKey { columns, .. } => Some(columns),
                    _ => None,
                })
                .flatten()
                .map(|ident| ident.value.clone())
                .collect();

            let columns = create
                .columns
                .iter()
                .map(|col| {
                    let mut column = column_definition(
                        &col.name,
                        &col.data_type,
                        col.options.iter().map(|o| &o.option),
                    );
                    if primary_key.contains(&column.name) {
                        column.primary_key = true;
                        column.nullable = false;
                    }
                    column
                })
                .collect();

            Ok(vec![SchemaChange::new(
                table,
                SchemaOperation::CreateTable { columns },
            )])
        }
        sp::Statement::AlterTable {
            name, operations, ..
        } => {
            let table = table_name(&name)?;
            Ok(operations
                .into_iter()
                .filter_map(alter_operation)
                .map(|operation| SchemaChange::new(table.clone(), operation))
                .collect())
        }
        sp::Statement::Drop {
            object_type: sp::ObjectType::Table,
            names,
            ..
        } => names
            .iter()
            .map(|name| {
                table_name(name).map(|table| SchemaChange::new(table, SchemaOperation::DropTable))
            })
            .collect(),
        sp::Statement::Truncate { table_names, .. } => table_names
            .iter()
            .map(|target| {
                table_name(&target.name)
                    .map(|table| SchemaChange::new(table, SchemaOperation::TruncateTable))
            })
            .collect(),
        _ => {
            let tokens = lex(source)?;
            Ok(raw_change(source, &tokens)?.into_iter().collect())
        }
    }
}

fn alter_operation(operation: sp::AlterTableOperation) -> Option<SchemaOperation> {
    match operation {
        sp::AlterTableOperation::AddColumn { column_def, .. } => {
            Some(SchemaOperation::AddColumn(column_definition(
                &column_def.name,
                &column_def.data_type,
                column_def.options.iter().map(|o| &o.option),
            )))
        }
        sp::AlterTableOperation::DropColumn { column_name, .. } => {
            Some(SchemaOperation::DropColumn {
                name: column_name.value,
            })
        }
        sp::AlterTableOperation::ModifyColumn {
            col_name,
            data_type,
            options,
            ..
        } => Some(SchemaOperation::ModifyColumn(column_definition(
            &col_name,
            &data_type,
            options.iter(),
        ))),
        sp::AlterTableOperation::ChangeColumn {
            old_name,
            new_name,
            data_type,
            options,
            ..
        } => {
            let definition = column_definition(&new_name, &data_type, options.iter());
            if old_name.value == new_name.value {
                Some(SchemaOperation::ModifyColumn(definition))
            } else {
                Some(SchemaOperation::RenameColumn {
                    from: old_name.value,
                    to: new_name.value,
                    definition: Some(definition),
                })
            }
        }
        sp::AlterTableOperation::RenameColumn {
            old_column_name,
            new_column_name,
            ..
        } => Some(SchemaOperation::RenameColumn {
            from: old_column_name.value,
            to: new_column_name.value,
            definition: None,
        }),
        sp::AlterTableOperation::RenameTable { table_name: to, .. } => table_name(&to)
            .ok()
            .map(|to| SchemaOperation::RenameTable { to }),
        sp::AlterTableOperation::AlterColumn {
            column_name,
            op: sp::AlterColumnOperation::SetDataType { data_type, .. },
            ..
        } => Some(SchemaOperation::ModifyColumn(ColumnDefinition::new(
            column_name.value,
            data_type.to_string(),
        ))),
        other => {
            trace!("Ignoring ALTER TABLE clause: {}", other);
            None
        }
    }
}

fn column_definition<'a>(
    name: &sp::Ident,
    data_type: &sp::DataType,
    options: impl Iterator<Item = &'a sp::ColumnOption>,
) -> ColumnDefinition {
    let mut column = ColumnDefinition::new(name.value.clone(), data_type.to_string());
    for option in options {
        match option {
            sp::ColumnOption::NotNull => column.nullable = false,
            sp::ColumnOption::Null => column.nullable = true,
            sp::ColumnOption::Default(expr) => column.default_value = Some(expr.to_string()),
            sp::ColumnOption::Unique {
                is_primary: true, ..
            } => {
                column.primary_key = true;
                column.nullable = false;
            }
            _ => {}
        }
    }
    column
}

/// Unqualified table name: `shop.orders` is `orders`.
fn table_name(name: &sp::ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .ok_or_else(|| CdcError::schema(format!("Empty table name: {}", name)))
}

// ============================================================================
// Lexer-level classification
// ============================================================================

/// Significant tokens of `sql`. Whitespace and comments are dropped.
fn lex(sql: &str) -> Result<Vec<Token>> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql)
        .tokenize()
        .map_err(|e| CdcError::schema(format!("Cannot tokenize DDL: {}", e)))?;
    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect())
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(keyword))
}

/// Leading bare words, upper-cased, e.g. `ALTER ONLINE TABLE T`.
fn statement_head(tokens: &[Token]) -> String {
    tokens
        .iter()
        .take(4)
        .map_while(|t| match t {
            Token::Word(w) if w.quote_style.is_none() => Some(w.value.to_uppercase()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Table targeted by a table-level statement, unqualified.
fn target_table(change_type: SchemaChangeType, tokens: &[Token]) -> Option<String> {
    let anchor = match change_type {
        SchemaChangeType::Truncate => "TRUNCATE",
        _ => "TABLE",
    };
    let start = tokens.iter().position(|t| is_keyword(t, anchor))? + 1;
    let rest: Vec<&Token> = tokens[start..]
        .iter()
        .skip_while(|t| ["TABLE", "IF", "NOT", "EXISTS"].iter().any(|k| is_keyword(t, k)))
        .collect();

    let mut name = None;
    let mut expect_word = true;
    for token in rest {
        match token {
            Token::Word(w) if expect_word => {
                name = Some(w.value.clone());
                expect_word = false;
            }
            Token::Period if !expect_word => expect_word = true,
            _ => break,
        }
    }
    name
}

/// One raw change for a table-level statement, `None` for anything else.
fn raw_change(ddl: &str, tokens: &[Token]) -> Result<Option<SchemaChange>> {
    let change_type = SchemaChangeType::from_sql(&statement_head(tokens));
    if !change_type.is_table_level() {
        trace!("Ignoring {} statement: {}", change_type, ddl.trim());
        return Ok(None);
    }

    let table = target_table(change_type, tokens)
        .ok_or_else(|| CdcError::schema(format!("Missing table name in: {}", ddl.trim())))?;
    Ok(Some(SchemaChange::new(
        table,
        SchemaOperation::Raw {
            change_type,
            ddl: ddl.trim().to_string(),
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MemoryCatalog;
    use pretty_assertions::assert_eq;

    fn translate(sql: &str) -> Result<Vec<SchemaChange>> {
        BasicDdlTranslator.translate(sql, &MemoryCatalog::new())
    }

    fn passthrough(sql: &str) -> Result<Vec<SchemaChange>> {
        PassthroughDdlTranslator.translate(sql, &MemoryCatalog::new())
    }

    #[test]
    fn test_schema_change_type_from_sql() {
        assert_eq!(
            SchemaChangeType::from_sql("CREATE TABLE users (id INT)"),
            SchemaChangeType::Create
        );
        assert_eq!(
            SchemaChangeType::from_sql("alter table users add column x int"),
            SchemaChangeType::Alter
        );
        assert_eq!(
            SchemaChangeType::from_sql("DROP TABLE users"),
            SchemaChangeType::Drop
        );
        assert_eq!(
            SchemaChangeType::from_sql("TRUNCATE TABLE users"),
            SchemaChangeType::Truncate
        );
        assert_eq!(
            SchemaChangeType::from_sql("CREATE UNIQUE INDEX idx ON users (email)"),
            SchemaChangeType::CreateIndex
        );
        assert_eq!(
            SchemaChangeType::from_sql("GRANT SELECT ON db.* TO u"),
            SchemaChangeType::Other
        );
        assert!(SchemaChangeType::Rename.is_table_level());
        assert!(!SchemaChangeType::CreateIndex.is_table_level());
    }

    #[test]
    fn test_alter_fans_out_per_clause() {
        let changes = translate("ALTER TABLE t ADD COLUMN x INT, ADD COLUMN y INT").unwrap();

        assert_eq!(
            changes,
            vec![
                SchemaChange::new("t", SchemaOperation::AddColumn(ColumnDefinition::new("x", "INT"))),
                SchemaChange::new("t", SchemaOperation::AddColumn(ColumnDefinition::new("y", "INT"))),
            ]
        );
    }

    #[test]
    fn test_alter_mixed_clauses() {
        let changes = translate(
            "ALTER TABLE `shop`.`orders` DROP COLUMN legacy, MODIFY total BIGINT NOT NULL, \
             CHANGE `qty` quantity INT DEFAULT '0', RENAME COLUMN a TO b, ADD INDEX idx_a (a);",
        )
        .unwrap();

        let ops: Vec<_> = changes.iter().map(|c| c.operation.clone()).collect();
        assert!(changes.iter().all(|c| c.table == "orders"));
        assert_eq!(
            ops,
            vec![
                SchemaOperation::DropColumn {
                    name: "legacy".to_string()
                },
                SchemaOperation::ModifyColumn(
                    ColumnDefinition::new("total", "BIGINT").with_nullable(false)
                ),
                SchemaOperation::RenameColumn {
                    from: "qty".to_string(),
                    to: "quantity".to_string(),
                    definition: Some(ColumnDefinition::new("quantity", "INT").with_default("'0'")),
                },
                SchemaOperation::RenameColumn {
                    from: "a".to_string(),
                    to: "b".to_string(),
                    definition: None,
                },
            ]
        );
    }

    #[test]
    fn test_backslash_escaped_quote_in_default() {
        let changes =
            translate(r"ALTER TABLE t ADD COLUMN c VARCHAR(10) DEFAULT 'it\'s'").unwrap();

        assert_eq!(changes.len(), 1);
        match &changes[0].operation {
            SchemaOperation::AddColumn(column) => {
                assert_eq!(column.name, "c");
                assert_eq!(column.type_name, "VARCHAR(10)");
                assert!(column.default_value.as_deref().is_some_and(|d| d.contains("it")));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_leading_comment_is_ignored() {
        let sql = "/* ApplicationName=DBeaver */ ALTER TABLE t ADD COLUMN x INT";

        assert_eq!(
            translate(sql).unwrap(),
            vec![SchemaChange::new(
                "t",
                SchemaOperation::AddColumn(ColumnDefinition::new("x", "INT"))
            )]
        );

        let raw = passthrough(sql).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].table, "t");
        assert_eq!(raw[0].operation.change_type(), SchemaChangeType::Alter);
    }

    #[test]
    fn test_alter_rename_table() {
        let changes = translate("ALTER TABLE old_name RENAME TO new_name").unwrap();
        assert_eq!(
            changes,
            vec![SchemaChange::new(
                "old_name",
                SchemaOperation::RenameTable {
                    to: "new_name".to_string()
                }
            )]
        );
    }

    #[test]
    fn test_create_table_columns_and_primary_key() {
        let changes = translate(
            "CREATE TABLE IF NOT EXISTS users(\n  id BIGINT NOT NULL AUTO_INCREMENT,\n  \
             email VARCHAR(255) DEFAULT NULL,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB",
        )
        .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].table, "users");
        match &changes[0].operation {
            SchemaOperation::CreateTable { columns } => {
                assert_eq!(columns.len(), 2);
                assert_eq!(columns[0].name, "id");
                assert!(columns[0].primary_key);
                assert!(!columns[0].nullable);
                assert_eq!(columns[1].type_name, "VARCHAR(255)");
                assert!(columns[1].nullable);
                assert!(!columns[1].primary_key);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_drop_multiple_tables() {
        let changes = translate("DROP TABLE IF EXISTS a, `b`").unwrap();
        let tables: Vec<_> = changes.iter().map(|c| c.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b"]);
        assert!(changes
            .iter()
            .all(|c| c.operation == SchemaOperation::DropTable));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(
            translate("TRUNCATE TABLE logs").unwrap(),
            vec![SchemaChange::new("logs", SchemaOperation::TruncateTable)]
        );
    }

    #[test]
    fn test_unparsed_table_ddl_is_forwarded_raw() {
        let changes = translate("RENAME TABLE shop.a TO shop.b").unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].table, "a");
        assert_eq!(changes[0].operation.change_type(), SchemaChangeType::Rename);
    }

    #[test]
    fn test_non_table_statements_produce_nothing() {
        assert!(translate("CREATE INDEX idx ON t (a)").unwrap().is_empty());
        assert!(translate("GRANT ALL ON *.* TO 'u'@'%'").unwrap().is_empty());
        assert!(passthrough("DROP INDEX idx ON t").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_statements_fail() {
        assert!(translate("ALTER TABLE").is_err());
        assert!(translate("ALTER TABLE t COMMENT 'unterminated").is_err());
        assert!(passthrough("TRUNCATE").is_err());
    }

    #[test]
    fn test_passthrough_keeps_statement_text() {
        let sql = "ALTER TABLE t ADD COLUMN x INT DEFAULT 'a  b', ADD COLUMN y INT";
        let changes = passthrough(sql).unwrap();

        assert_eq!(
            changes,
            vec![SchemaChange::new(
                "t",
                SchemaOperation::Raw {
                    change_type: SchemaChangeType::Alter,
                    ddl: sql.to_string(),
                }
            )]
        );
    }

    #[test]
    fn test_passthrough_qualified_table() {
        let changes = passthrough("DROP TABLE IF EXISTS `shop`.`orders`").unwrap();
        assert_eq!(changes[0].table, "orders");
        assert_eq!(changes[0].operation.change_type(), SchemaChangeType::Drop);
    }

    #[test]
    fn test_dialect_selection() {
        assert_eq!("basic".parse::<DdlDialect>().unwrap(), DdlDialect::Basic);
        assert_eq!("RAW".parse::<DdlDialect>().unwrap(), DdlDialect::Passthrough);
        assert!("antlr".parse::<DdlDialect>().is_err());
        assert_eq!(DdlDialect::default(), DdlDialect::Basic);
    }
}
