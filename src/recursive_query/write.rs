use log::debug;

use crate::render_plan::{Binding, CteItems, Query, SqlFragment, Statement, ToSql};

use super::{CompileError, RecursiveQueryBuilder, RootConstraint};

/// Write applied to every row the recursive expression reaches.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// `SET column = ?` per assignment
    Update(Vec<(String, Binding)>),
    Increment { column: String, amount: Binding },
    Decrement { column: String, amount: Binding },
    Delete,
}

impl RecursiveQueryBuilder {
    /// `UPDATE`/`DELETE ... WHERE local_key IN (SELECT local_key FROM expression)`.
    ///
    /// The expression goes in front of the statement where the backend accepts that,
    /// and inside the `IN (...)` subquery otherwise.
    pub fn compile_write(
        &self,
        root: &RootConstraint,
        operation: &WriteOperation,
    ) -> Result<Statement, CompileError> {
        let grammar = self.grammar();
        let spec = self.spec();
        let table = grammar.wrap(&spec.table);

        let (head, mut bindings) = match operation {
            WriteOperation::Update(assignments) => {
                if assignments.is_empty() {
                    return Err(CompileError::EmptyAssignment);
                }
                let sets = assignments
                    .iter()
                    .map(|(column, _)| format!("{} = ?", grammar.wrap_segment(column)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let values = assignments.iter().map(|(_, value)| value.clone()).collect();
                (format!("UPDATE {} SET {}", table, sets), values)
            }
            WriteOperation::Increment { column, amount } => {
                let column = grammar.wrap_segment(column);
                (
                    format!("UPDATE {} SET {} = {} + ?", table, column, column),
                    vec![amount.clone()],
                )
            }
            WriteOperation::Decrement { column, amount } => {
                let column = grammar.wrap_segment(column);
                (
                    format!("UPDATE {} SET {} = {} - ?", table, column, column),
                    vec![amount.clone()],
                )
            }
            WriteOperation::Delete => (format!("DELETE FROM {}", table), Vec::new()),
        };

        let expression = self.compile_expression(root)?;
        let cte = expression.into_cte(grammar);
        let mut reached = Query::from_table(grammar.wrap(&spec.expression_name));
        reached.add_select(self.expression_column(&spec.local_key));
        let local = self.column(&spec.local_key);

        let statement = if grammar.supports_expression_before_write() {
            let ctes = CteItems {
                keyword: grammar.recursive_keyword().to_string(),
                items: vec![cte],
            };
            let reached = SqlFragment::subquery(&reached);
            let mut all = ctes.bindings();
            all.append(&mut bindings);
            all.extend(reached.bindings);
            Statement {
                sql: format!(
                    "{} {} WHERE {} IN {}",
                    ctes.to_sql(),
                    head,
                    local,
                    reached.sql
                ),
                bindings: all,
            }
        } else {
            reached.add_cte(grammar.recursive_keyword(), cte);
            let reached = SqlFragment::subquery(&reached);
            bindings.extend(reached.bindings);
            Statement {
                sql: format!("{} WHERE {} IN {}", head, local, reached.sql),
                bindings,
            }
        };

        debug!("compiled {} write: {}", self.driver(), statement.sql);
        Ok(statement)
    }
}
