//! Recursive expression assembly.
//!
//! A recursive expression is an anchor query `UNION ALL` a step query that joins the
//! hierarchy table back onto the expression:
//!
//! ```sql
//! WITH RECURSIVE adjacency_cte AS (
//!     SELECT t.*, 0 AS depth, <seeded path> FROM t WHERE <root constraint>
//!     UNION ALL
//!     SELECT t.*, adjacency_cte.depth + 1, <extended path>
//!     FROM t INNER JOIN adjacency_cte ON t.parent_id = adjacency_cte.id
//!     WHERE <max depth guard> AND <cycle check>
//! )
//! SELECT * FROM adjacency_cte
//! ```
//!
//! All dialect-specific SQL comes from the [`ExpressionGrammar`]; this module decides
//! which fragments go where. Each submodule adds one group of operations to
//! [`RecursiveQueryBuilder`]:
//!
//! - `anchor` / `step`: the two halves of the union
//! - `cycle`: the `would_cycle` predicate and the drop/retain policy
//! - `relation`: ancestors, descendants, bloodline and tree queries
//! - `batch`: one query for many requesting keys, with path lists
//! - `existence`: `EXISTS (...)` subqueries with a rebound self-join alias
//! - `write`: `UPDATE`/`DELETE` of every row the expression reaches

mod anchor;
mod batch;
mod cycle;
pub mod errors;
mod existence;
mod relation;
mod step;
mod write;

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::hierarchy_catalog::{Direction, HierarchySpec, SegmentKind};
use crate::render_plan::{Binding, Cte, Query, SqlFragment, ToSql, UnionType};
use crate::sql_grammar::{grammar_for, Driver, ExpressionGrammar};

pub use batch::{RelatedTable, PATH_LIST_COLUMN};
pub use errors::CompileError;
pub use existence::ExistenceQuery;
pub use relation::RelationKind;
pub use write::WriteOperation;

/// Keys a root constraint applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySet {
    /// Bound key values
    Values(Vec<Binding>),
    /// Unwrapped column reference, e.g. `categories.id` of a correlated outer query
    Column(String),
}

impl KeySet {
    /// `column IN (?, ...)` or `column = other`; `column` is already wrapped.
    fn compile(&self, grammar: &dyn ExpressionGrammar, column: &str) -> SqlFragment {
        match self {
            KeySet::Values(values) => SqlFragment::in_list(column, values),
            KeySet::Column(other) => SqlFragment::raw(format!("{} = {}", column, grammar.wrap(other))),
        }
    }
}

/// Which rows the anchor query starts from.
#[derive(Debug, Clone, PartialEq)]
pub enum RootConstraint {
    All,
    /// Rows without a parent
    IsRoot,
    /// The rows with these keys
    Keys(KeySet),
    /// The children (descending) or parents (ascending) of these keys
    AdjacentTo(KeySet),
    Raw(SqlFragment),
}

impl RootConstraint {
    pub fn keys<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Binding>,
    {
        RootConstraint::Keys(KeySet::Values(values.into_iter().map(Into::into).collect()))
    }

    pub fn adjacent_to<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Binding>,
    {
        RootConstraint::AdjacentTo(KeySet::Values(values.into_iter().map(Into::into).collect()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RootConstraint::All => "all",
            RootConstraint::IsRoot => "is_root",
            RootConstraint::Keys(_) => "keys",
            RootConstraint::AdjacentTo(_) => "adjacent_to",
            RootConstraint::Raw(_) => "raw",
        }
    }
}

pub type ConstraintFn = Arc<dyn Fn(&mut Query) + Send + Sync>;

/// Extra conditions for the anchor (`initial`) and step (`recursive`) queries.
#[derive(Clone, Default)]
pub struct Constraints {
    pub initial: Option<ConstraintFn>,
    pub recursive: Option<ConstraintFn>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial<F>(mut self, constraint: F) -> Self
    where
        F: Fn(&mut Query) + Send + Sync + 'static,
    {
        self.initial = Some(Arc::new(constraint));
        self
    }

    pub fn recursive<F>(mut self, constraint: F) -> Self
    where
        F: Fn(&mut Query) + Send + Sync + 'static,
    {
        self.recursive = Some(Arc::new(constraint));
        self
    }
}

impl fmt::Debug for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraints")
            .field("initial", &self.initial.is_some())
            .field("recursive", &self.recursive.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveExpression {
    /// Unwrapped expression name
    pub name: String,
    pub anchor: Query,
    pub step: Query,
    pub union_type: UnionType,
}

impl RecursiveExpression {
    pub fn into_cte(self, grammar: &dyn ExpressionGrammar) -> Cte {
        let mut body = self.anchor;
        body.set_union(self.union_type, self.step);
        Cte::new(grammar.wrap(&self.name), body)
    }
}

#[derive(Debug)]
pub struct RecursiveQueryBuilder {
    spec: HierarchySpec,
    grammar: Box<dyn ExpressionGrammar>,
    constraints: Constraints,
    /// Alias of the hierarchy table inside the expression, set for self-relation
    /// subqueries
    table_alias: Option<String>,
}

impl RecursiveQueryBuilder {
    /// Validates `spec` before anything is compiled.
    pub fn new(
        spec: HierarchySpec,
        grammar: Box<dyn ExpressionGrammar>,
    ) -> Result<Self, CompileError> {
        spec.validate_spec()?;
        Ok(Self {
            spec,
            grammar,
            constraints: Constraints::default(),
            table_alias: None,
        })
    }

    pub fn for_driver(spec: HierarchySpec, driver: Driver) -> Result<Self, CompileError> {
        Self::new(spec, grammar_for(driver))
    }

    pub fn from_driver_name(spec: HierarchySpec, driver: &str) -> Result<Self, CompileError> {
        let driver: Driver = driver.parse()?;
        Self::for_driver(spec, driver)
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn spec(&self) -> &HierarchySpec {
        &self.spec
    }

    pub fn grammar(&self) -> &dyn ExpressionGrammar {
        self.grammar.as_ref()
    }

    pub fn driver(&self) -> Driver {
        self.grammar.driver()
    }

    pub fn expression_name(&self) -> &str {
        &self.spec.expression_name
    }

    /// Anchor and step queries, not yet combined.
    pub fn compile_expression(
        &self,
        root: &RootConstraint,
    ) -> Result<RecursiveExpression, CompileError> {
        let anchor = self.compile_anchor(root)?;
        let step = self.compile_step();
        let union_type = if self.grammar.supports_union_all_in_recursive_expression() {
            UnionType::All
        } else {
            UnionType::Distinct
        };

        Ok(RecursiveExpression {
            name: self.spec.expression_name.clone(),
            anchor,
            step,
            union_type,
        })
    }

    /// `WITH RECURSIVE <expression> SELECT * FROM <expression>`
    pub fn compile(&self, root: &RootConstraint) -> Result<Query, CompileError> {
        let expression = self.compile_expression(root)?;
        let query = self.select_from_expression(expression);
        debug!(
            "compiled {} expression for '{}' ({}): {}",
            self.driver(),
            self.spec.table,
            root.name(),
            query.to_sql()
        );
        Ok(query)
    }

    /// Natural path ordering for the outer query, see
    /// [`crate::sql_grammar::natural_order`].
    ///
    /// SQLite, SQL Server and Firebird have no `REGEXP_REPLACE`, so there this is a
    /// plain lexicographic `path ASC` and `1.10` sorts before `1.2`. Run
    /// [`crate::path_matcher::sort_rows_naturally`] on the fetched rows to get the
    /// natural order on those backends.
    pub fn order_by_path_expression(&self) -> String {
        self.grammar.compile_order_by_path(
            &self.raw_expression_column(&self.spec.path_column),
            &self.spec.path_separator,
            self.local_kind(),
        )
    }

    fn select_from_expression(&self, expression: RecursiveExpression) -> Query {
        let mut query = Query::from_table(self.grammar.wrap(&expression.name));
        query.add_cte(
            self.grammar.recursive_keyword(),
            expression.into_cte(self.grammar()),
        );
        query
    }

    /// Same driver and constraints, different traversal.
    fn derive(&self, direction: Direction, initial_depth: i32) -> Self {
        let mut spec = self.spec.clone();
        spec.direction = direction;
        spec.initial_depth = initial_depth;
        Self {
            spec,
            grammar: grammar_for(self.driver()),
            constraints: self.constraints.clone(),
            table_alias: self.table_alias.clone(),
        }
    }

    fn aliased(mut self, alias: String) -> Self {
        self.table_alias = Some(alias);
        self
    }

    fn table_ref(&self) -> &str {
        self.table_alias.as_deref().unwrap_or(&self.spec.table)
    }

    fn from_clause(&self) -> String {
        match &self.table_alias {
            Some(alias) => format!(
                "{} AS {}",
                self.grammar.wrap(&self.spec.table),
                self.grammar.wrap_segment(alias)
            ),
            None => self.grammar.wrap(&self.spec.table),
        }
    }

    fn raw_column(&self, column: &str) -> String {
        format!("{}.{}", self.table_ref(), column)
    }

    fn column(&self, column: &str) -> String {
        self.grammar.wrap(&self.raw_column(column))
    }

    fn raw_expression_column(&self, column: &str) -> String {
        format!("{}.{}", self.spec.expression_name, column)
    }

    fn expression_column(&self, column: &str) -> String {
        self.grammar.wrap(&self.raw_expression_column(column))
    }

    fn local_kind(&self) -> SegmentKind {
        self.spec.segment_kind(&self.spec.local_key)
    }
}
