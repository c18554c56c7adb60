use log::debug;

use crate::render_plan::{Query, SqlFragment, ToSql};
use crate::utils::cte_naming::{replace_table_hash, reserved_table_hash};

use super::{CompileError, RecursiveQueryBuilder, RootConstraint};

/// Correlated subquery over the rows related to an outer row.
///
/// Inside it the hierarchy table is aliased with `table_hash`, so an outer query on the
/// same table (a self relation) stays unambiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistenceQuery {
    pub query: Query,
    pub table_hash: String,
    pub expression_name: String,
}

impl ExistenceQuery {
    /// `EXISTS (...)`
    pub fn exists(&self) -> SqlFragment {
        let subquery = SqlFragment::subquery(&self.query);
        SqlFragment::new(format!("EXISTS {}", subquery.sql), subquery.bindings)
    }

    /// `(...)`, for aggregates compared against a value
    pub fn scalar(&self) -> SqlFragment {
        SqlFragment::subquery(&self.query)
    }

    /// Points references to the table hash at the expression instead.
    pub fn rebind(&self, sql: &str) -> String {
        replace_table_hash(sql, &self.table_hash, &self.expression_name)
    }
}

impl RecursiveQueryBuilder {
    /// Rows reached from each row of `outer_table`, e.g. "categories that have
    /// descendants" for a descending spec on `categories`.
    ///
    /// `aggregate` is written against the hierarchy table name (`MAX(categories.depth)`)
    /// and ends up reading from the expression.
    pub fn compile_existence(
        &self,
        outer_table: &str,
        aggregate: Option<&str>,
    ) -> Result<ExistenceQuery, CompileError> {
        if !self.grammar().supports_nested_recursive_expression() {
            return Err(CompileError::unsupported_feature(
                self.driver(),
                "recursive expressions inside existence subqueries",
            ));
        }

        let hash = reserved_table_hash();
        let builder = self
            .derive(self.spec().direction, 0)
            .aliased(hash.clone());
        let spec = builder.spec();
        let grammar = builder.grammar();

        let anchor = SqlFragment::raw(format!(
            "{} = {}",
            builder.column(&spec.local_key),
            grammar.wrap(&format!("{}.{}", outer_table, spec.local_key))
        ));
        let expression = builder.compile_expression(&RootConstraint::Raw(anchor))?;
        let name = expression.name.clone();

        let mut existence = ExistenceQuery {
            query: Query::from_table(grammar.wrap(&name)),
            table_hash: hash,
            expression_name: name,
        };

        if let Some(aggregate) = aggregate {
            let against_hash = replace_table_hash(aggregate, &spec.table, &existence.table_hash);
            let select = existence.rebind(&against_hash);
            existence.query.add_select(select);
        }
        existence.query.add_filter(format!(
            "{} <> 0",
            builder.expression_column(&spec.depth_column)
        ));
        existence
            .query
            .add_cte(grammar.recursive_keyword(), expression.into_cte(grammar));

        debug!(
            "compiled existence subquery for '{}' against '{}': {}",
            spec.table,
            outer_table,
            existence.query.to_sql()
        );
        Ok(existence)
    }
}
