//! Preference store port (driven/secondary port)
//!
//! A plain string key-value store. Typed access and defaults live in
//! [`crate::preferences::Preferences`].

/// Port trait for persistent key-value preferences
#[async_trait::async_trait]
pub trait IPreferenceStore: Send + Sync {
    /// Reads a value, `Ok(None)` if the key is unset
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Deletes a key; removing an unset key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;

    /// Returns every stored key-value pair ordered by key
    async fn entries(&self) -> anyhow::Result<Vec<(String, String)>>;
}
