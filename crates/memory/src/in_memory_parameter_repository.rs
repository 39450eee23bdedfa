use std::collections::HashMap;

use async_trait::async_trait;
use metaforge_core::AppResult;
use metaforge_domain::Parameter;
use metaforge_engine::ParameterRepository;
use tokio::sync::RwLock;

/// In-memory [`ParameterRepository`] keyed by parameter name.
#[derive(Default)]
pub struct InMemoryParameterRepository {
    parameters: RwLock<HashMap<String, Parameter>>,
}

impl InMemoryParameterRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParameterRepository for InMemoryParameterRepository {
    async fn save(&self, parameter: Parameter) -> AppResult<Parameter> {
        self.parameters
            .write()
            .await
            .insert(parameter.name().to_owned(), parameter.clone());
        Ok(parameter)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Parameter>> {
        Ok(self.parameters.read().await.get(name).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Parameter>> {
        let mut parameters: Vec<Parameter> =
            self.parameters.read().await.values().cloned().collect();
        parameters.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(parameters)
    }
}
