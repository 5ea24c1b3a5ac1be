//! Query execution: run the chosen plan and hand back an iterator.

use tracing::debug;

use docstore_core::{Error, Query, RawRow, Result};

use crate::backend::ops;
use crate::context::Context;
use crate::iter::DocumentIterator;
use crate::planner::{PointLookup, QueryExecutionPlan};
use crate::table::Table;

impl Table {
    /// Plan and execute a read query.
    ///
    /// A point lookup that finds no row, or whose row fails a non-key
    /// filter, yields an empty iterator.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedQuery`] if the filters do not pin the primary
    /// key. [`Error::Configuration`] if the pinned partition key is empty.
    /// A backend error if the read fails.
    pub async fn run_get_query(&self, ctx: &Context, query: &Query) -> Result<DocumentIterator> {
        let plan = self.planner().plan(query);
        debug!(target: "tablestore::query", table = %self.name, plan = %plan, "planned query");

        let mut rows = self.execute_plan(ctx, plan).await?;
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(DocumentIterator::new(rows))
    }

    async fn execute_plan(&self, ctx: &Context, plan: QueryExecutionPlan) -> Result<Vec<RawRow>> {
        match plan {
            QueryExecutionPlan::PointLookup(lookup) => self.run_point_lookup(ctx, lookup).await,
            QueryExecutionPlan::Unsupported { reason } => Err(Error::unsupported_query(reason)),
            other => Err(Error::unsupported_query(format!(
                "{} is not implemented",
                other.name()
            ))),
        }
    }

    async fn run_point_lookup(&self, ctx: &Context, lookup: PointLookup) -> Result<Vec<RawRow>> {
        self.keys.check_lookup_key(&lookup.request.primary_key)?;
        ctx.check()?;
        let row = self
            .backend
            .get_row(lookup.request)
            .await
            .map_err(|e| Error::backend(ops::GET_ROW, e))?;
        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let mut raw = row.into_raw_row();
        if !lookup
            .residual
            .iter()
            .all(|f| f.matches(raw.get(&f.field_path.joined())))
        {
            return Ok(Vec::new());
        }
        self.keys.retain_projected(&mut raw, &lookup.projection);
        Ok(vec![raw])
    }
}
