//! [`SessionStore`] for `tower_sessions::Session`.

use async_trait::async_trait;
use serde_json::Value;
use tower_sessions::Session;

use super::{SessionStore, SessionStoreError};

impl From<tower_sessions::session::Error> for SessionStoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
impl SessionStore for Session {
    async fn load_value(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        Ok(Self::get_value(self, key).await?)
    }

    async fn store_value(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
        Self::insert_value(self, key, value).await?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<(), SessionStoreError> {
        Self::remove_value(self, key).await?;
        Ok(())
    }

    async fn rotate(&self) -> Result<(), SessionStoreError> {
        Ok(self.cycle_id().await?)
    }

    async fn flush_all(&self) -> Result<(), SessionStoreError> {
        Ok(self.flush().await?)
    }
}
