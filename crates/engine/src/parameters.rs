use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metaforge_core::AppResult;
use metaforge_domain::Parameter;
use tokio::sync::RwLock;

/// Persistence port for application parameters.
#[async_trait]
pub trait ParameterRepository: Send + Sync {
    /// Inserts or replaces a parameter by name.
    async fn save(&self, parameter: Parameter) -> AppResult<Parameter>;

    /// Looks up a parameter by name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Parameter>>;

    /// Lists every stored parameter.
    async fn list(&self) -> AppResult<Vec<Parameter>>;
}

/// Named-setting service with a read-through cache.
///
/// Only parameters marked cacheable enter the cache; the rest hit the
/// repository on every read. Writes keep the cache coherent.
pub struct ParameterService {
    repository: Arc<dyn ParameterRepository>,
    cache: RwLock<HashMap<String, String>>,
}

impl ParameterService {
    /// Creates a service over the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn ParameterRepository>) -> Self {
        Self {
            repository,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value of a parameter, serving cacheable reads from
    /// memory after the first hit.
    pub async fn value(&self, name: &str) -> AppResult<Option<String>> {
        if let Some(cached) = self.cache.read().await.get(name) {
            return Ok(Some(cached.clone()));
        }

        let Some(parameter) = self.repository.find_by_name(name).await? else {
            return Ok(None);
        };

        if parameter.is_cacheable() {
            self.cache
                .write()
                .await
                .insert(name.to_owned(), parameter.value().to_owned());
        }

        Ok(Some(parameter.value().to_owned()))
    }

    /// Returns the value of a parameter, or the default when absent.
    pub async fn value_or(&self, name: &str, default: &str) -> AppResult<String> {
        Ok(self.value(name).await?.unwrap_or_else(|| default.to_owned()))
    }

    /// Creates or updates a parameter, keeping the cache coherent.
    pub async fn set_value(&self, name: &str, value: &str) -> AppResult<Parameter> {
        let parameter = match self.repository.find_by_name(name).await? {
            Some(mut existing) => {
                existing.set_value(value);
                existing
            }
            None => Parameter::new(name, value)?,
        };

        let stored = self.repository.save(parameter).await?;

        let mut cache = self.cache.write().await;
        if stored.is_cacheable() {
            cache.insert(name.to_owned(), stored.value().to_owned());
        } else {
            cache.remove(name);
        }

        Ok(stored)
    }

    /// Drops one cached entry.
    pub async fn invalidate(&self, name: &str) {
        self.cache.write().await.remove(name);
    }

    /// Drops every cached entry.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}
