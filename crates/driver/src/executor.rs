//! Batched action execution
//!
//! A batch runs in two phases. Every write is executed, in batch order, on
//! one spawned task; the caller waits for that task to finish before running
//! the gets inline, in batch order. No get observes a partially applied
//! write phase. Each action's outcome lands in its own slot.

use std::sync::Arc;

use tracing::{debug, warn};

use docstore_core::{
    group_actions, group_by_field_paths, Action, Document, Error, Result, Value, ValueDecoder,
};

use crate::backend::{
    ops, AttributeColumn, Backend, GetRowRequest, PutRowRequest, ReturnType,
    RowExistenceExpectation,
};
use crate::config::MissingFieldPolicy;
use crate::context::Context;
use crate::planner::LATEST_VERSION_ONLY;
use crate::table::Table;

/// A write whose request was built before the write phase started.
struct PreparedWrite {
    index: usize,
    request: PutRowRequest,
}

impl Table {
    /// Execute a batch of gets and writes.
    ///
    /// Returns one outcome per action, in batch order. A failing action
    /// never affects its siblings.
    ///
    /// # Errors
    ///
    /// The outer error is returned only when nothing could be dispatched:
    /// `ctx` was already cancelled or past its deadline.
    pub async fn run_actions(
        &self,
        ctx: &Context,
        actions: &mut [Action<'_>],
    ) -> Result<Vec<Result<()>>> {
        ctx.check()?;

        let mut outcomes: Vec<Result<()>> = actions.iter().map(|_| Ok(())).collect();
        let grouped = group_actions(actions);
        debug!(
            target: "tablestore::actions",
            table = %self.name,
            gets = grouped.gets.len(),
            writes = grouped.writes.len(),
            "running actions"
        );

        let mut prepared = Vec::with_capacity(grouped.writes.len());
        for &index in &grouped.writes {
            match self.prepare_write(&*actions[index].doc) {
                Ok(request) => prepared.push(PreparedWrite { index, request }),
                Err(e) => {
                    warn!(target: "tablestore::actions", table = %self.name, action = index, error = %e, "skipping write");
                    outcomes[index] = Err(e);
                }
            }
        }

        if !prepared.is_empty() {
            let dispatched: Vec<usize> = prepared.iter().map(|w| w.index).collect();
            let handle = tokio::spawn(run_writes(
                Arc::clone(&self.backend),
                ctx.clone(),
                prepared,
            ));
            match handle.await {
                Ok(results) => {
                    for (index, result) in results {
                        outcomes[index] = result;
                    }
                }
                Err(e) => {
                    warn!(target: "tablestore::actions", table = %self.name, error = %e, "write task failed");
                    for index in dispatched {
                        outcomes[index] = Err(Error::internal(format!("write task failed: {}", e)));
                    }
                }
            }
        }

        if !grouped.gets.is_empty() {
            let groups = group_by_field_paths(actions, &grouped.gets);
            debug!(
                target: "tablestore::actions",
                table = %self.name,
                gets = grouped.gets.len(),
                projections = groups.len(),
                "running gets"
            );
        }
        for &index in &grouped.gets {
            let result = self.run_get(ctx, &mut actions[index]).await;
            if let Err(e) = &result {
                warn!(target: "tablestore::actions", table = %self.name, action = index, error = %e, "get failed");
            }
            outcomes[index] = result;
        }

        Ok(outcomes)
    }

    /// Write one document.
    pub async fn put(&self, ctx: &Context, doc: &dyn Document) -> Result<()> {
        let request = self.prepare_write(doc)?;
        ctx.check()?;
        self.backend
            .put_row(request)
            .await
            .map_err(|e| Error::backend(ops::PUT_ROW, e))
    }

    /// Read one document by the key fields it already holds.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no row has the document's key.
    pub async fn get(&self, ctx: &Context, doc: &mut dyn Document) -> Result<()> {
        self.run_get(ctx, &mut Action::get(doc)).await
    }

    /// Build the upsert for a document: its key plus every non-key field.
    fn prepare_write(&self, doc: &dyn Document) -> Result<PutRowRequest> {
        let primary_key = self.key(doc)?;
        let mut columns = Vec::new();
        for name in doc.field_names() {
            if self.keys.is_key_field(&name) {
                continue;
            }
            match doc.get_field(&name) {
                Ok(value) => columns.push(AttributeColumn { name, value }),
                Err(e) => match self.missing_field_policy {
                    MissingFieldPolicy::Skip => {
                        warn!(target: "tablestore::actions", table = %self.name, field = %name, error = %e, "skipping column");
                    }
                    MissingFieldPolicy::Abort => return Err(e),
                },
            }
        }
        Ok(PutRowRequest {
            table_name: self.name.clone(),
            primary_key,
            columns,
            condition: RowExistenceExpectation::Ignore,
            return_type: ReturnType::None,
        })
    }

    async fn run_get(&self, ctx: &Context, action: &mut Action<'_>) -> Result<()> {
        let primary_key = self.key(&*action.doc)?;
        let projection: Vec<String> = action.field_paths.iter().map(|p| p.joined()).collect();
        let columns_to_get = projection
            .iter()
            .filter(|c| !self.keys.is_key_field(c))
            .cloned()
            .collect();
        let request = GetRowRequest {
            table_name: self.name.clone(),
            primary_key: primary_key.clone(),
            columns_to_get,
            max_version: LATEST_VERSION_ONLY,
        };

        ctx.check()?;
        let row = self
            .backend
            .get_row(request)
            .await
            .map_err(|e| Error::backend(ops::GET_ROW, e))?;
        let Some(row) = row else {
            return Err(Error::NotFound {
                key: primary_key.to_string(),
            });
        };
        let mut raw = row.into_raw_row();
        // A key-only projection reads every column; trim back to what was asked.
        self.keys.retain_projected(&mut raw, &projection);
        let value = Value::Object(raw);
        action.doc.decode(ValueDecoder::new(&value))
    }
}

/// The write phase. Runs on its own task, so it owns everything it touches.
async fn run_writes(
    backend: Arc<dyn Backend>,
    ctx: Context,
    writes: Vec<PreparedWrite>,
) -> Vec<(usize, Result<()>)> {
    let mut results = Vec::with_capacity(writes.len());
    for write in writes {
        if let Err(e) = ctx.check() {
            results.push((write.index, Err(e)));
            continue;
        }
        let result = backend
            .put_row(write.request)
            .await
            .map_err(|e| Error::backend(ops::PUT_ROW, e));
        if let Err(e) = &result {
            warn!(target: "tablestore::actions", action = write.index, error = %e, "write failed");
        }
        results.push((write.index, result));
    }
    results
}
