//! Dialect-free query model.
//!
//! Everything stored here has already been compiled by a [`crate::sql_grammar`]
//! grammar: identifiers are wrapped and every `?` placeholder inside a fragment owns
//! exactly one entry of that fragment's `bindings`. Rendering walks the clauses in the
//! order they appear in the SQL text, so `to_sql()` and `bindings()` always line up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Positional bind value. Keys may be integers or strings, so the JSON value model is
/// used rather than a dedicated enum.
pub type Binding = serde_json::Value;

pub trait ToSql {
    fn to_sql(&self) -> String;

    /// Appends this item's bindings to `out`, in placeholder order.
    fn collect_bindings(&self, out: &mut Vec<Binding>);

    fn bindings(&self) -> Vec<Binding> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }
}

/// A piece of raw SQL together with the values for its placeholders.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct SqlFragment {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Fragment without placeholders
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Parenthesized subquery: `(SELECT ...)`
    pub fn subquery(query: &Query) -> Self {
        Self::new(format!("({})", query.to_sql()), query.bindings())
    }

    /// `column IN (?, ?, ...)`, or an always-false predicate for an empty key list.
    pub fn in_list(column: &str, values: &[Binding]) -> Self {
        if values.is_empty() {
            return Self::raw("1 = 0");
        }
        Self::new(
            format!("{} IN ({})", column, placeholders(values.len())),
            values.to_vec(),
        )
    }

    /// Appends ` AS alias`; `alias` must already be wrapped.
    pub fn aliased(mut self, alias: &str) -> Self {
        self.sql = format!("{} AS {}", self.sql, alias);
        self
    }

    pub fn negated(self) -> Self {
        Self::new(format!("NOT ({})", self.sql), self.bindings)
    }

    /// Joins fragments with ` OR `, parenthesizing each operand.
    pub fn disjunction(parts: Vec<SqlFragment>) -> Self {
        if parts.len() == 1 {
            return parts.into_iter().next().unwrap_or_default();
        }
        let mut sql = Vec::with_capacity(parts.len());
        let mut bindings = Vec::new();
        for part in parts {
            sql.push(format!("({})", part.sql));
            bindings.extend(part.bindings);
        }
        Self::new(sql.join(" OR "), bindings)
    }
}

impl From<&str> for SqlFragment {
    fn from(sql: &str) -> Self {
        SqlFragment::raw(sql)
    }
}

impl From<String> for SqlFragment {
    fn from(sql: String) -> Self {
        SqlFragment::raw(sql)
    }
}

impl ToSql for SqlFragment {
    fn to_sql(&self) -> String {
        self.sql.clone()
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        out.extend(self.bindings.iter().cloned());
    }
}

/// `?, ?, ?` with `count` placeholders
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Final SQL text plus its positional bindings, ready for a driver.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub ctes: CteItems,
    pub select: SelectItems,
    pub from: FromTableItem,
    pub joins: JoinItems,
    pub filters: FilterItems,
    pub union: UnionItems,
    pub order_by: OrderByItems,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT ... FROM <table>`; `table` must already be wrapped.
    pub fn from_table(table: impl Into<String>) -> Self {
        let mut query = Self::new();
        query.from = FromTableItem(Some(SqlFragment::raw(table)));
        query
    }

    pub fn add_select(&mut self, item: impl Into<SqlFragment>) -> &mut Self {
        self.select.items.push(item.into());
        self
    }

    pub fn set_from(&mut self, from: impl Into<SqlFragment>) -> &mut Self {
        self.from = FromTableItem(Some(from.into()));
        self
    }

    pub fn add_join(&mut self, join: Join) -> &mut Self {
        self.joins.0.push(join);
        self
    }

    /// Adds a predicate to the WHERE conjunction. Predicates containing OR must be
    /// parenthesized by the caller.
    pub fn add_filter(&mut self, filter: impl Into<SqlFragment>) -> &mut Self {
        self.filters.0.push(filter.into());
        self
    }

    pub fn add_order_by(&mut self, expression: impl Into<SqlFragment>) -> &mut Self {
        self.order_by.0.push(expression.into());
        self
    }

    pub fn add_cte(&mut self, keyword: &str, cte: Cte) -> &mut Self {
        self.ctes.keyword = keyword.to_string();
        self.ctes.items.push(cte);
        self
    }

    pub fn set_union(&mut self, union_type: UnionType, query: Query) -> &mut Self {
        self.union = UnionItems(Some(Union {
            union_type,
            input: Box::new(query),
        }));
        self
    }

    pub fn to_statement(&self) -> Statement {
        Statement {
            sql: self.to_sql(),
            bindings: self.bindings(),
        }
    }
}

impl ToSql for Query {
    fn to_sql(&self) -> String {
        let parts = [
            self.ctes.to_sql(),
            self.select.to_sql(),
            self.from.to_sql(),
            self.joins.to_sql(),
            self.filters.to_sql(),
            self.union.to_sql(),
            self.order_by.to_sql(),
        ];
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        self.ctes.collect_bindings(out);
        self.select.collect_bindings(out);
        self.from.collect_bindings(out);
        self.joins.collect_bindings(out);
        self.filters.collect_bindings(out);
        self.union.collect_bindings(out);
        self.order_by.collect_bindings(out);
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct CteItems {
    /// `WITH RECURSIVE` or `WITH`, chosen by the grammar
    pub keyword: String,
    pub items: Vec<Cte>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Cte {
    /// Wrapped expression name
    pub cte_name: String,
    pub content: Box<Query>,
}

impl Cte {
    pub fn new(cte_name: String, content: Query) -> Self {
        Self {
            cte_name,
            content: Box::new(content),
        }
    }
}

impl ToSql for CteItems {
    fn to_sql(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let body = self
            .items
            .iter()
            .map(|cte| cte.to_sql())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}", self.keyword, body)
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        for cte in &self.items {
            cte.collect_bindings(out);
        }
    }
}

impl ToSql for Cte {
    fn to_sql(&self) -> String {
        format!("{} AS ({})", self.cte_name, self.content.to_sql())
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        self.content.collect_bindings(out);
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct SelectItems {
    pub items: Vec<SqlFragment>,
}

impl ToSql for SelectItems {
    fn to_sql(&self) -> String {
        let columns = if self.items.is_empty() {
            "*".to_string()
        } else {
            self.items
                .iter()
                .map(|item| item.sql.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("SELECT {}", columns)
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        for item in &self.items {
            item.collect_bindings(out);
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct FromTableItem(pub Option<SqlFragment>);

impl ToSql for FromTableItem {
    fn to_sql(&self) -> String {
        match &self.0 {
            Some(from) => format!("FROM {}", from.sql),
            None => String::new(),
        }
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        if let Some(from) = &self.0 {
            from.collect_bindings(out);
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

impl ToSql for JoinType {
    fn to_sql(&self) -> String {
        match self {
            JoinType::Inner => "INNER JOIN".to_string(),
            JoinType::Left => "LEFT JOIN".to_string(),
        }
    }

    fn collect_bindings(&self, _out: &mut Vec<Binding>) {}
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Join {
    /// Wrapped table reference, with alias if any
    pub table_name: String,
    pub joining_on: SqlFragment,
    pub join_type: JoinType,
}

impl Join {
    pub fn inner(table_name: impl Into<String>, joining_on: impl Into<SqlFragment>) -> Self {
        Self {
            table_name: table_name.into(),
            joining_on: joining_on.into(),
            join_type: JoinType::Inner,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct JoinItems(pub Vec<Join>);

impl ToSql for JoinItems {
    fn to_sql(&self) -> String {
        self.0
            .iter()
            .map(|join| {
                format!(
                    "{} {} ON {}",
                    join.join_type.to_sql(),
                    join.table_name,
                    join.joining_on.sql
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        for join in &self.0 {
            join.joining_on.collect_bindings(out);
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct FilterItems(pub Vec<SqlFragment>);

impl ToSql for FilterItems {
    fn to_sql(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let predicates = self
            .0
            .iter()
            .map(|filter| filter.sql.as_str())
            .collect::<Vec<_>>()
            .join(" AND ");
        format!("WHERE {}", predicates)
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        for filter in &self.0 {
            filter.collect_bindings(out);
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct OrderByItems(pub Vec<SqlFragment>);

impl ToSql for OrderByItems {
    fn to_sql(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let items = self
            .0
            .iter()
            .map(|item| item.sql.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("ORDER BY {}", items)
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        for item in &self.0 {
            item.collect_bindings(out);
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum UnionType {
    Distinct,
    All,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Union {
    pub input: Box<Query>,
    pub union_type: UnionType,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct UnionItems(pub Option<Union>);

impl ToSql for UnionItems {
    fn to_sql(&self) -> String {
        match &self.0 {
            Some(union) => {
                let keyword = match union.union_type {
                    UnionType::All => "UNION ALL",
                    UnionType::Distinct => "UNION",
                };
                format!("{} {}", keyword, union.input.to_sql())
            }
            None => String::new(),
        }
    }

    fn collect_bindings(&self, out: &mut Vec<Binding>) {
        if let Some(union) = &self.0 {
            union.input.collect_bindings(out);
        }
    }
}
