// src/db/statement.rs
//
// Montagem de SQL a partir das colunas declaradas em cada `Record`.
// Nomes de tabela e coluna são sempre `&'static str` do próprio código.

use crate::db::record::{Cascade, Record};

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bind: id, company_id, COLUMNS, INSERT_ONLY, created_at, created_by.
pub fn insert<R: Record>() -> String {
    let columns: Vec<&str> = ["id", "company_id"]
        .into_iter()
        .chain(R::COLUMNS.iter().copied())
        .chain(R::INSERT_ONLY.iter().copied())
        .chain(["created_at", "created_by"])
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        columns.join(", "),
        placeholders(1, columns.len())
    )
}

/// Bind: id, company_id, COLUMNS, updated_at, updated_by.
pub fn update<R: Record>() -> String {
    let assignments: Vec<String> = R::COLUMNS
        .iter()
        .copied()
        .chain(["updated_at", "updated_by"])
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 3))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE id = $1 AND company_id = $2",
        R::TABLE,
        assignments.join(", ")
    )
}

pub fn select_one<R: Record>() -> String {
    format!("SELECT * FROM {} WHERE id = $1 AND company_id = $2", R::TABLE)
}

/// Bind: id, company_id.
pub fn exists(table: &str) -> String {
    format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1 AND company_id = $2)")
}

pub fn select_all<R: Record>() -> String {
    format!(
        "SELECT * FROM {} WHERE company_id = $1 ORDER BY {}",
        R::TABLE,
        R::ORDER_BY
    )
}

pub fn select_page<R: Record>() -> String {
    format!(
        "SELECT * FROM {} WHERE company_id = $1 ORDER BY {} LIMIT $2 OFFSET $3",
        R::TABLE,
        R::ORDER_BY
    )
}

pub fn count_all<R: Record>() -> String {
    format!("SELECT COUNT(*) FROM {} WHERE company_id = $1", R::TABLE)
}

pub fn select_by<R: Record>(column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE company_id = $1 AND {column} = $2 ORDER BY {}",
        R::TABLE,
        R::ORDER_BY
    )
}

pub fn count_by<R: Record>(column: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE company_id = $1 AND {column} = $2",
        R::TABLE
    )
}

pub fn delete_one<R: Record>() -> String {
    format!("DELETE FROM {} WHERE id = $1 AND company_id = $2", R::TABLE)
}

pub fn delete_by<R: Record>(column: &str) -> String {
    format!("DELETE FROM {} WHERE company_id = $1 AND {column} = $2", R::TABLE)
}

/// Apaga os dependentes e devolve `(id, snapshot)` de cada linha removida.
/// Bind: company_id, id do pai.
pub fn delete_dependents(cascade: &Cascade) -> String {
    match cascade {
        Cascade::Direct { table, column } => format!(
            "DELETE FROM {table} AS t WHERE t.company_id = $1 AND t.{column} = $2 \
             RETURNING t.id, to_jsonb(t) AS snapshot"
        ),
        Cascade::Through { table, column, through, through_column } => format!(
            "DELETE FROM {table} AS t WHERE t.company_id = $1 AND t.{column} IN \
             (SELECT s.id FROM {through} s WHERE s.company_id = $1 AND s.{through_column} = $2) \
             RETURNING t.id, to_jsonb(t) AS snapshot"
        ),
    }
}
