//! Actions: units of work in a batch
//!
//! An [`Action`] pairs an [`ActionKind`] with the caller's document for the
//! duration of one batch call. [`group_actions`] splits a batch into its
//! get and write subsets, keeping each action's original index so outcomes
//! land in the right slot.

use std::fmt;

use crate::document::Document;
use crate::query::FieldPath;

/// Flavour of a write. The driver executes every flavour as an
/// unconditional upsert of the document's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// Insert or overwrite
    Put,
    /// Overwrite an existing document
    Replace,
    /// Remove a document
    Delete,
}

/// What an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Point read into the document
    Get,
    /// Write of the document
    Write(WriteKind),
}

impl ActionKind {
    /// True for every write flavour.
    pub fn is_write(&self) -> bool {
        matches!(self, ActionKind::Write(_))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Get => f.write_str("get"),
            ActionKind::Write(WriteKind::Put) => f.write_str("put"),
            ActionKind::Write(WriteKind::Replace) => f.write_str("replace"),
            ActionKind::Write(WriteKind::Delete) => f.write_str("delete"),
        }
    }
}

/// One unit of work against one document.
pub struct Action<'a> {
    /// What to do
    pub kind: ActionKind,
    /// Target document, borrowed for this call only
    pub doc: &'a mut dyn Document,
    /// Fields to read for a get; empty reads every column
    pub field_paths: Vec<FieldPath>,
}

impl<'a> Action<'a> {
    /// Read every column into `doc`.
    pub fn get(doc: &'a mut dyn Document) -> Self {
        Self {
            kind: ActionKind::Get,
            doc,
            field_paths: Vec::new(),
        }
    }

    /// Read only the listed fields into `doc`.
    pub fn get_fields<I, P>(doc: &'a mut dyn Document, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        Self {
            kind: ActionKind::Get,
            doc,
            field_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Write `doc`.
    pub fn put(doc: &'a mut dyn Document) -> Self {
        Self::write(WriteKind::Put, doc)
    }

    /// Write `doc` with an explicit write flavour.
    pub fn write(kind: WriteKind, doc: &'a mut dyn Document) -> Self {
        Self {
            kind: ActionKind::Write(kind),
            doc,
            field_paths: Vec::new(),
        }
    }
}

impl fmt::Debug for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("fields", &self.doc.field_names())
            .field("field_paths", &self.field_paths)
            .finish()
    }
}

/// Indices of a batch split by kind, each list in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedActions {
    /// Indices of get actions
    pub gets: Vec<usize>,
    /// Indices of write actions
    pub writes: Vec<usize>,
}

/// Split a batch into its get and write subsets.
pub fn group_actions(actions: &[Action<'_>]) -> GroupedActions {
    let mut grouped = GroupedActions::default();
    for (i, action) in actions.iter().enumerate() {
        match action.kind {
            ActionKind::Get => grouped.gets.push(i),
            ActionKind::Write(_) => grouped.writes.push(i),
        }
    }
    grouped
}

/// Gets that request the same set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetGroup {
    /// The shared projection, sorted; empty means every column
    pub field_paths: Vec<FieldPath>,
    /// Batch indices, in batch order
    pub indices: Vec<usize>,
}

/// Bucket gets by projection, the unit a batched multi-get can coalesce.
///
/// Projections compare as sets. Groups appear in order of their first
/// member.
pub fn group_by_field_paths(actions: &[Action<'_>], gets: &[usize]) -> Vec<GetGroup> {
    let mut groups: Vec<GetGroup> = Vec::new();
    for &i in gets {
        let mut paths = actions[i].field_paths.clone();
        paths.sort();
        paths.dedup();
        match groups.iter_mut().find(|g| g.field_paths == paths) {
            Some(group) => group.indices.push(i),
            None => groups.push(GetGroup {
                field_paths: paths,
                indices: vec![i],
            }),
        }
    }
    groups
}
