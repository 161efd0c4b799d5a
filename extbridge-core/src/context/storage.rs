//! `storage.local` as seen from a context

use serde_json::Value;

use super::error::BridgeResult;
use super::ContextRuntime;
use crate::bridge::Action;
use crate::store::{StorageSelector, StoreRecord};

/// Borrowed view of a context's storage calls
pub struct StorageArea<'a> {
    runtime: &'a ContextRuntime,
}

impl<'a> StorageArea<'a> {
    pub(crate) fn new(runtime: &'a ContextRuntime) -> Self {
        Self { runtime }
    }

    pub async fn get(&self, selector: impl Into<StorageSelector>) -> BridgeResult<StoreRecord> {
        let selector = selector.into();
        let value = self
            .runtime
            .call(Action::StorageGet, Some(selector.to_data()))
            .await?;

        Ok(match value {
            Value::Object(record) => record,
            _ => StoreRecord::new(),
        })
    }

    /// Shallow-merge `items` into the store
    pub async fn set(&self, items: StoreRecord) -> BridgeResult<()> {
        let data = Value::Object(items).to_string();
        self.runtime.call(Action::StorageSet, Some(data)).await?;
        Ok(())
    }

    pub async fn remove<I, S>(&self, keys: I) -> BridgeResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let data = serde_json::to_string(&keys)?;
        self.runtime.call(Action::StorageRemove, Some(data)).await?;
        Ok(())
    }

    pub async fn clear(&self) -> BridgeResult<()> {
        self.runtime.call(Action::StorageClear, None).await?;
        Ok(())
    }
}
