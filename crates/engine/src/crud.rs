use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use metaforge_core::{AppError, AppResult};
use metaforge_domain::QueryParameters;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A typed record managed by a [`CrudService`].
///
/// Entities serialize to JSON objects; the assigned id lives in the `id`
/// field of the serialized form.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Fully qualified class name used as the storage key.
    fn class_name() -> &'static str;

    /// Returns the assigned id, when the entity has been persisted.
    fn id(&self) -> Option<i64>;
}

/// Lifecycle moments surrounding persistence operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudEventKind {
    /// Fired before a record is inserted.
    BeforeCreate,
    /// Fired after a record was inserted.
    AfterCreate,
    /// Fired before a record is updated.
    BeforeUpdate,
    /// Fired after a record was updated.
    AfterUpdate,
    /// Fired before a record is deleted.
    BeforeDelete,
    /// Fired after a record was deleted.
    AfterDelete,
}

/// Observer of record lifecycle events.
///
/// `Before*` events receive the record ahead of persistence and may mutate
/// it; returning an error aborts the operation. `After*` mutations are not
/// persisted.
pub trait CrudListener: Send + Sync {
    /// Handles one lifecycle event for the given entity class.
    fn handle(&self, event: CrudEventKind, class_name: &str, record: &mut Value) -> AppResult<()>;
}

/// Unit of work executed atomically by
/// [`CrudService::execute_within_transaction`].
pub type TransactionWork<'a> = Pin<Box<dyn Future<Output = AppResult<()>> + Send + 'a>>;

/// Storage-agnostic persistence port over JSON records.
///
/// Typed convenience methods live on [`CrudServiceExt`], which is
/// blanket-implemented for every service.
#[async_trait]
pub trait CrudService: Send + Sync {
    /// Inserts a record, assigning its id. Returns the stored record.
    async fn create_record(&self, class_name: &str, record: Value) -> AppResult<Value>;

    /// Replaces the record with the same id. Returns the stored record.
    async fn update_record(&self, class_name: &str, record: Value) -> AppResult<Value>;

    /// Deletes the record with the given id.
    async fn delete_record(&self, class_name: &str, id: i64) -> AppResult<()>;

    /// Deletes every record of the class.
    async fn delete_all(&self, class_name: &str) -> AppResult<()>;

    /// Looks up one record by id.
    async fn find_record(&self, class_name: &str, id: i64) -> AppResult<Option<Value>>;

    /// Lists records matching the query parameters, honoring sort and
    /// pagination.
    async fn find_records(
        &self,
        class_name: &str,
        parameters: &QueryParameters,
    ) -> AppResult<Vec<Value>>;

    /// Counts records matching the query parameters, ignoring pagination.
    async fn count(&self, class_name: &str, parameters: &QueryParameters) -> AppResult<u64>;

    /// Returns the distinct non-null values of one property across the
    /// class, in first-seen order.
    async fn property_values(&self, class_name: &str, property: &str) -> AppResult<Vec<Value>>;

    /// Atomically increments an integer counter field. Returns the new
    /// value.
    async fn increase_counter(&self, class_name: &str, id: i64, counter: &str) -> AppResult<i64>;

    /// Atomically decrements an integer counter field. Returns the new
    /// value.
    async fn decrease_counter(&self, class_name: &str, id: i64, counter: &str) -> AppResult<i64>;

    /// Runs the work atomically; on error every write inside it is rolled
    /// back.
    async fn execute_within_transaction<'a>(&'a self, work: TransactionWork<'a>)
    -> AppResult<()>;
}

fn encode<E: Entity>(entity: &E) -> AppResult<Value> {
    serde_json::to_value(entity)
        .map_err(|err| AppError::Internal(format!("entity serialization failed: {err}")))
}

fn decode<E: Entity>(record: Value) -> AppResult<E> {
    serde_json::from_value(record)
        .map_err(|err| AppError::Internal(format!("entity deserialization failed: {err}")))
}

/// Typed facade over [`CrudService`], bridging entities through JSON.
#[async_trait]
pub trait CrudServiceExt: CrudService {
    /// Inserts a typed entity and returns it with its assigned id.
    async fn create<E: Entity>(&self, entity: E) -> AppResult<E> {
        let stored = self.create_record(E::class_name(), encode(&entity)?).await?;
        decode(stored)
    }

    /// Updates a typed entity in place.
    async fn update<E: Entity>(&self, entity: E) -> AppResult<E> {
        let stored = self.update_record(E::class_name(), encode(&entity)?).await?;
        decode(stored)
    }

    /// Deletes a typed entity by its assigned id.
    async fn delete<E: Entity>(&self, entity: &E) -> AppResult<()> {
        let id = entity.id().ok_or_else(|| {
            AppError::Validation(format!(
                "cannot delete unpersisted entity of class '{}'",
                E::class_name()
            ))
        })?;
        self.delete_record(E::class_name(), id).await
    }

    /// Looks up a typed entity by id.
    async fn find_by_id<E: Entity>(&self, id: i64) -> AppResult<Option<E>> {
        match self.find_record(E::class_name(), id).await? {
            Some(record) => Ok(Some(decode(record)?)),
            None => Ok(None),
        }
    }

    /// Lists typed entities matching the query parameters.
    async fn find<E: Entity>(&self, parameters: &QueryParameters) -> AppResult<Vec<E>> {
        let records = self.find_records(E::class_name(), parameters).await?;
        records.into_iter().map(decode).collect()
    }

    /// Lists every entity of the class in storage order.
    async fn find_all<E: Entity>(&self) -> AppResult<Vec<E>> {
        self.find::<E>(&QueryParameters::new()).await
    }

    /// Returns the first stored entity of the class, if any.
    async fn find_first<E: Entity>(&self) -> AppResult<Option<E>> {
        let mut parameters = QueryParameters::new();
        parameters.paginate(1);
        Ok(self.find::<E>(&parameters).await?.into_iter().next())
    }

    /// Returns the first entity matching the query parameters, if any.
    async fn find_single<E: Entity>(&self, parameters: &QueryParameters) -> AppResult<Option<E>> {
        let mut limited = parameters.clone();
        limited.paginate(1);
        Ok(self.find::<E>(&limited).await?.into_iter().next())
    }
}

impl<S: CrudService + ?Sized> CrudServiceExt for S {}
