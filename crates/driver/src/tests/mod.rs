//! Test modules for the driver crate.


use std::sync::Arc;

use docstore_core::{Document, Error, Result, Value, ValueDecoder};

use crate::backend::{MemoryBackend, PrimaryKeyType, TableMeta};
use crate::config::{CollectionConfig, MissingFieldPolicy};
use crate::table::Table;

/// Leaderboard entry keyed by (periodId, userId).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub period_id: String,
    pub user_id: i64,
    pub nickname: String,
    pub is_win: bool,
}

impl Entry {
    pub fn new(period_id: &str, user_id: i64, nickname: &str, is_win: bool) -> Self {
        Self {
            period_id: period_id.to_string(),
            user_id,
            nickname: nickname.to_string(),
            is_win,
        }
    }

    /// Only the key fields set, ready to be read into.
    pub fn key(period_id: &str, user_id: i64) -> Self {
        Self {
            period_id: period_id.to_string(),
            user_id,
            ..Self::default()
        }
    }
}

impl Document for Entry {
    fn get_field(&self, name: &str) -> Result<Value> {
        match name {
            "periodId" => Ok(Value::from(self.period_id.as_str())),
            "userId" => Ok(Value::Int(self.user_id)),
            "nickname" => Ok(Value::from(self.nickname.as_str())),
            "isWin" => Ok(Value::Bool(self.is_win)),
            _ => Err(Error::FieldNotFound { field: name.into() }),
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match (name, value) {
            ("periodId", Value::String(s)) => self.period_id = s,
            ("userId", Value::Int(i)) => self.user_id = i,
            ("nickname", Value::String(s)) => self.nickname = s,
            ("isWin", Value::Bool(b)) => self.is_win = b,
            (name, value) => {
                return Err(Error::decode(format!(
                    "field {} cannot hold {}",
                    name,
                    value.type_name()
                )))
            }
        }
        Ok(())
    }

    fn field_names(&self) -> Vec<String> {
        ["periodId", "userId", "nickname", "isWin"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn decode(&mut self, decoder: ValueDecoder<'_>) -> Result<()> {
        let mut result = Ok(());
        decoder.for_each_map_entry(|key, child, _| {
            result = self.set_field(key, child.as_opaque().clone());
            result.is_ok()
        });
        result
    }
}

/// Wraps a document and fails to read one of its listed fields.
pub struct Unreadable<D> {
    pub inner: D,
    pub field: &'static str,
}

impl<D: Document> Document for Unreadable<D> {
    fn get_field(&self, name: &str) -> Result<Value> {
        if name == self.field {
            return Err(Error::FieldNotFound { field: name.into() });
        }
        self.inner.get_field(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.inner.set_field(name, value)
    }

    fn field_names(&self) -> Vec<String> {
        let mut names = self.inner.field_names();
        names.push(self.field.to_string());
        names
    }

    fn decode(&mut self, decoder: ValueDecoder<'_>) -> Result<()> {
        self.inner.decode(decoder)
    }
}

pub fn entries_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.create_table(
        TableMeta::new("entries")
            .with_key("periodId", PrimaryKeyType::String)
            .with_key("userId", PrimaryKeyType::Integer),
    );
    Arc::new(backend)
}

pub async fn open_entries(backend: &Arc<MemoryBackend>, policy: MissingFieldPolicy) -> Table {
    let config = CollectionConfig::new("entries", "periodId")
        .with_sort_key("userId")
        .with_missing_field_policy(policy);
    let table = Table::open(backend.clone(), &config).await.unwrap();
    backend.clear_calls();
    table
}
