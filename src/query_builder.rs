//! Dialect-agnostic construction of INSERT/UPDATE/DELETE statements from a
//! staged [`DmlChange`] and the active dialect's formatting rules.
//!
//! Staged values are folded into the statement as escaped literals, so the
//! text handed to the transaction executor is byte-identical to the preview
//! text shown for the same change.

use crate::error::DriverError;
use crate::models::{ArgValue, DmlChange, DmlType, Query};

/// The dialect-specific set of quoting, escaping, and placeholder rules.
///
/// Every driver implements this; the query builder is parameterized over it.
pub trait QueryFormatter {
    /// Render a staged value as a SQL literal.
    fn format_arg(&self, value: &ArgValue) -> String {
        default_format_arg(value)
    }

    /// Quote an identifier (table, column, database name).
    fn format_reference(&self, identifier: &str) -> String;

    /// Render the positional placeholder for a 1-based argument index.
    fn format_placeholder(&self, index: usize) -> String;

    /// Qualify and quote a table name.
    fn format_table_name(&self, database: &str, table: &str) -> String {
        format!(
            "{}.{}",
            self.format_reference(database),
            self.format_reference(table)
        )
    }
}

/// Which statement skeleton the dialect's mutations use.
///
/// ClickHouse has no native row UPDATE/DELETE and uses the
/// `ALTER TABLE .. UPDATE/DELETE` mutation form instead; the column/value and
/// WHERE construction is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationSyntax {
    Standard,
    AlterTable,
}

/// Shared literal rendering: integers verbatim, floats with trailing zeros
/// trimmed, strings and byte sequences quoted with embedded quotes doubled,
/// and the `NULL` / `DEFAULT` keywords passed through unquoted.
#[must_use]
pub fn default_format_arg(value: &ArgValue) -> String {
    match value {
        ArgValue::Int(i) => i.to_string(),
        ArgValue::Float(f) => format_float(*f),
        ArgValue::Text(s) if s == "NULL" || s == "DEFAULT" => s.clone(),
        ArgValue::Text(s) => quote_literal(s),
        ArgValue::Bytes(b) => quote_literal(&String::from_utf8_lossy(b)),
    }
}

/// Quote a string literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a float without scientific notation: six fractional digits,
/// trailing zeros trimmed, and a bare trailing `.` normalized to `.0`.
#[must_use]
pub fn format_float(value: f64) -> String {
    let mut s = format!("{value:.6}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

/// Build `INSERT INTO t (cols) VALUES (literals)` for a staged insert.
#[must_use]
pub fn build_insert_query(change: &DmlChange, formatter: &dyn QueryFormatter) -> Query {
    let table = formatter.format_table_name(&change.database, &change.table);

    let mut columns = Vec::with_capacity(change.values.len());
    let mut rendered = Vec::with_capacity(change.values.len());
    for (column, value) in &change.values {
        columns.push(formatter.format_reference(column));
        rendered.push(formatter.format_arg(value));
    }

    let statement = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        rendered.join(", ")
    );
    Query::new(statement, rendered)
}

/// Build an UPDATE (or ClickHouse `ALTER TABLE .. UPDATE`) for a staged edit.
///
/// # Errors
/// Returns `DriverError::Validation` if the change carries no primary-key
/// pairs; without them the WHERE predicate cannot identify a single row.
pub fn build_update_query(
    change: &DmlChange,
    formatter: &dyn QueryFormatter,
    syntax: MutationSyntax,
) -> Result<Query, DriverError> {
    let table = formatter.format_table_name(&change.database, &change.table);

    let mut args = Vec::with_capacity(change.values.len() + change.primary_key.len());
    let mut assignments = Vec::with_capacity(change.values.len());
    for (column, value) in &change.values {
        let rendered = formatter.format_arg(value);
        assignments.push(format!(
            "{} = {}",
            formatter.format_reference(column),
            rendered
        ));
        args.push(rendered);
    }

    let predicate = where_predicate(change, formatter, &mut args)?;

    let statement = match syntax {
        MutationSyntax::Standard => format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            predicate
        ),
        MutationSyntax::AlterTable => format!(
            "ALTER TABLE {} UPDATE {} WHERE {}",
            table,
            assignments.join(", "),
            predicate
        ),
    };
    Ok(Query::new(statement, args))
}

/// Build a DELETE (or ClickHouse `ALTER TABLE .. DELETE`) for a staged edit.
///
/// # Errors
/// Returns `DriverError::Validation` if the change carries no primary-key
/// pairs.
pub fn build_delete_query(
    change: &DmlChange,
    formatter: &dyn QueryFormatter,
    syntax: MutationSyntax,
) -> Result<Query, DriverError> {
    let table = formatter.format_table_name(&change.database, &change.table);

    let mut args = Vec::with_capacity(change.primary_key.len());
    let predicate = where_predicate(change, formatter, &mut args)?;

    let statement = match syntax {
        MutationSyntax::Standard => format!("DELETE FROM {table} WHERE {predicate}"),
        MutationSyntax::AlterTable => {
            format!("ALTER TABLE {table} DELETE WHERE {predicate}")
        }
    };
    Ok(Query::new(statement, args))
}

/// Build one query per change, preserving input order.
///
/// # Errors
/// Returns the first builder error (a malformed change fails the whole batch
/// before anything touches the engine).
pub fn build_queries(
    changes: &[DmlChange],
    formatter: &dyn QueryFormatter,
    syntax: MutationSyntax,
) -> Result<Vec<Query>, DriverError> {
    changes
        .iter()
        .map(|change| match change.kind {
            DmlType::Insert => Ok(build_insert_query(change, formatter)),
            DmlType::Update => build_update_query(change, formatter, syntax),
            DmlType::Delete => build_delete_query(change, formatter, syntax),
        })
        .collect()
}

/// Render a change as display text; identical to the executed statement.
///
/// # Errors
/// Returns `DriverError::Validation` for an Update/Delete without
/// primary-key pairs.
pub fn change_to_query_string(
    change: &DmlChange,
    formatter: &dyn QueryFormatter,
    syntax: MutationSyntax,
) -> Result<String, DriverError> {
    let query = match change.kind {
        DmlType::Insert => build_insert_query(change, formatter),
        DmlType::Update => build_update_query(change, formatter, syntax)?,
        DmlType::Delete => build_delete_query(change, formatter, syntax)?,
    };
    Ok(query.statement)
}

fn where_predicate(
    change: &DmlChange,
    formatter: &dyn QueryFormatter,
    args: &mut Vec<String>,
) -> Result<String, DriverError> {
    if change.primary_key.is_empty() {
        return Err(DriverError::Validation(format!(
            "primary key values are required to {} a row in {}",
            match change.kind {
                DmlType::Update => "update",
                _ => "delete",
            },
            change.table
        )));
    }

    let clauses: Vec<String> = change
        .primary_key
        .iter()
        .map(|(name, value)| {
            let rendered = formatter.format_arg(value);
            let clause = format!("{} = {}", formatter.format_reference(name), rendered);
            args.push(rendered);
            clause
        })
        .collect();
    Ok(clauses.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Backtick;

    impl QueryFormatter for Backtick {
        fn format_reference(&self, identifier: &str) -> String {
            format!("`{identifier}`")
        }

        fn format_placeholder(&self, _index: usize) -> String {
            "?".to_string()
        }
    }

    #[test]
    fn floats_trim_trailing_zeros_without_bare_point() {
        assert_eq!(format_float(3.10), "3.1");
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(100.0), "100.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-2.5), "-2.5");
    }

    #[test]
    fn string_literals_double_embedded_quotes() {
        assert_eq!(
            default_format_arg(&ArgValue::Text("O'Brien".into())),
            "'O''Brien'"
        );
        assert_eq!(default_format_arg(&ArgValue::Text(String::new())), "''");
    }

    #[test]
    fn null_and_default_keywords_pass_through_unquoted() {
        assert_eq!(default_format_arg(&ArgValue::Text("NULL".into())), "NULL");
        assert_eq!(
            default_format_arg(&ArgValue::Text("DEFAULT".into())),
            "DEFAULT"
        );
    }

    #[test]
    fn insert_statement_quotes_columns_and_values() {
        let change = DmlChange::insert(
            "shop",
            "users",
            vec![
                ("name".into(), ArgValue::from("Ada")),
                ("age".into(), ArgValue::Int(36)),
            ],
        );
        let query = build_insert_query(&change, &Backtick);
        assert_eq!(
            query.statement,
            "INSERT INTO `shop`.`users` (`name`, `age`) VALUES ('Ada', 36)"
        );
        assert_eq!(query.args, vec!["'Ada'", "36"]);
    }

    #[test]
    fn update_joins_primary_key_pairs_with_and_in_order() {
        let change = DmlChange::update(
            "shop",
            "users",
            vec![("name".into(), ArgValue::from("Ada"))],
            vec![
                ("id".into(), ArgValue::from("7")),
                ("region".into(), ArgValue::from("eu")),
            ],
        );
        let query =
            build_update_query(&change, &Backtick, MutationSyntax::Standard).unwrap();
        assert_eq!(
            query.statement,
            "UPDATE `shop`.`users` SET `name` = 'Ada' WHERE `id` = '7' AND `region` = 'eu'"
        );
    }

    #[test]
    fn update_without_primary_key_is_rejected() {
        let change = DmlChange::update(
            "shop",
            "users",
            vec![("name".into(), ArgValue::from("Ada"))],
            vec![],
        );
        let err =
            build_update_query(&change, &Backtick, MutationSyntax::Standard).unwrap_err();
        assert!(matches!(err, DriverError::Validation(_)));
    }

    #[test]
    fn delete_uses_same_where_construction() {
        let change =
            DmlChange::delete("shop", "users", vec![("id".into(), ArgValue::Int(7))]);
        let query =
            build_delete_query(&change, &Backtick, MutationSyntax::Standard).unwrap();
        assert_eq!(query.statement, "DELETE FROM `shop`.`users` WHERE `id` = 7");
    }

    #[test]
    fn alter_table_syntax_changes_only_the_skeleton() {
        let update = DmlChange::update(
            "metrics",
            "events",
            vec![("level".into(), ArgValue::from("warn"))],
            vec![("id".into(), ArgValue::Int(1))],
        );
        let query =
            build_update_query(&update, &Backtick, MutationSyntax::AlterTable).unwrap();
        assert_eq!(
            query.statement,
            "ALTER TABLE `metrics`.`events` UPDATE `level` = 'warn' WHERE `id` = 1"
        );

        let delete =
            DmlChange::delete("metrics", "events", vec![("id".into(), ArgValue::Int(1))]);
        let query =
            build_delete_query(&delete, &Backtick, MutationSyntax::AlterTable).unwrap();
        assert_eq!(
            query.statement,
            "ALTER TABLE `metrics`.`events` DELETE WHERE `id` = 1"
        );
    }

    #[test]
    fn batches_preserve_input_order() {
        let changes = vec![
            DmlChange::insert("d", "t", vec![("a".into(), ArgValue::Int(1))]),
            DmlChange::delete("d", "t", vec![("a".into(), ArgValue::Int(1))]),
        ];
        let queries =
            build_queries(&changes, &Backtick, MutationSyntax::Standard).unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].statement.starts_with("INSERT"));
        assert!(queries[1].statement.starts_with("DELETE"));
    }
}
