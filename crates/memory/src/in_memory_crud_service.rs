use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metaforge_core::{AppError, AppResult};
use metaforge_domain::{
    FieldConstraint, PropertyPath, QueryParameters, SortDirection, compare_values,
    validate_record,
};
use metaforge_engine::{CrudEventKind, CrudListener, CrudService, TransactionWork};
use serde_json::{Value, json};
use tokio::sync::RwLock;

fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

/// In-memory [`CrudService`] over JSON records.
///
/// Records are kept per class in insertion order; ids come from a per-class
/// sequence starting at 1. Listeners and constraints are wired before the
/// service is shared.
#[derive(Default)]
pub struct InMemoryCrudService {
    records: RwLock<HashMap<String, Vec<Value>>>,
    sequences: RwLock<HashMap<String, i64>>,
    constraints: HashMap<String, Vec<FieldConstraint>>,
    listeners: Vec<Arc<dyn CrudListener>>,
}

impl InMemoryCrudService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lifecycle listener. Listeners run in registration order.
    pub fn register_listener(&mut self, listener: Arc<dyn CrudListener>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    /// Declares validation constraints for one entity class.
    pub fn register_constraints(
        &mut self,
        class_name: impl Into<String>,
        constraints: Vec<FieldConstraint>,
    ) -> &mut Self {
        self.constraints.insert(class_name.into(), constraints);
        self
    }

    fn fire(&self, event: CrudEventKind, class_name: &str, record: &mut Value) -> AppResult<()> {
        for listener in &self.listeners {
            listener.handle(event, class_name, record)?;
        }
        Ok(())
    }

    fn validate(&self, class_name: &str, record: &Value) -> AppResult<()> {
        if !record.is_object() {
            return Err(AppError::Validation(format!(
                "record of class '{class_name}' must be a JSON object"
            )));
        }

        match self.constraints.get(class_name) {
            Some(constraints) => validate_record(record, constraints),
            None => Ok(()),
        }
    }

    async fn adjust_counter(
        &self,
        class_name: &str,
        id: i64,
        counter: &str,
        delta: i64,
    ) -> AppResult<i64> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(class_name)
            .and_then(|class| class.iter_mut().find(|record| record_id(record) == Some(id)))
            .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?;

        let object = record.as_object_mut().ok_or_else(|| {
            AppError::Validation(format!(
                "record of class '{class_name}' must be a JSON object"
            ))
        })?;

        let current = match object.get(counter) {
            Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                AppError::Validation(format!(
                    "field '{counter}' of class '{class_name}' is not an integer counter"
                ))
            })?,
            None => {
                return Err(AppError::Validation(format!(
                    "class '{class_name}' has no counter field '{counter}'"
                )));
            }
        };

        let next = current + delta;
        object.insert(counter.to_owned(), json!(next));
        Ok(next)
    }
}

#[async_trait]
impl CrudService for InMemoryCrudService {
    async fn create_record(&self, class_name: &str, mut record: Value) -> AppResult<Value> {
        self.validate(class_name, &record)?;
        self.fire(CrudEventKind::BeforeCreate, class_name, &mut record)?;
        self.validate(class_name, &record)?;

        let id = {
            let mut sequences = self.sequences.write().await;
            let sequence = sequences.entry(class_name.to_owned()).or_insert(0);
            *sequence += 1;
            *sequence
        };

        if let Some(object) = record.as_object_mut() {
            object.insert("id".to_owned(), json!(id));
        }

        {
            let mut records = self.records.write().await;
            records
                .entry(class_name.to_owned())
                .or_default()
                .push(record.clone());
        }

        let mut stored = record.clone();
        if let Err(err) = self.fire(CrudEventKind::AfterCreate, class_name, &mut stored) {
            let mut records = self.records.write().await;
            if let Some(class) = records.get_mut(class_name) {
                class.retain(|existing| record_id(existing) != Some(id));
            }
            return Err(err);
        }

        Ok(record)
    }

    async fn update_record(&self, class_name: &str, mut record: Value) -> AppResult<Value> {
        self.validate(class_name, &record)?;
        let id = record_id(&record).ok_or_else(|| {
            AppError::Validation(format!(
                "cannot update record of class '{class_name}' without an id"
            ))
        })?;

        self.fire(CrudEventKind::BeforeUpdate, class_name, &mut record)?;
        self.validate(class_name, &record)?;

        let previous = {
            let mut records = self.records.write().await;
            let class = records
                .get_mut(class_name)
                .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?;
            let index = class
                .iter()
                .position(|existing| record_id(existing) == Some(id))
                .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?;
            std::mem::replace(&mut class[index], record.clone())
        };

        let mut stored = record.clone();
        if let Err(err) = self.fire(CrudEventKind::AfterUpdate, class_name, &mut stored) {
            let mut records = self.records.write().await;
            if let Some(class) = records.get_mut(class_name)
                && let Some(index) = class
                    .iter()
                    .position(|existing| record_id(existing) == Some(id))
            {
                class[index] = previous;
            }
            return Err(err);
        }

        Ok(record)
    }

    async fn delete_record(&self, class_name: &str, id: i64) -> AppResult<()> {
        let mut doomed = {
            let records = self.records.read().await;
            records
                .get(class_name)
                .and_then(|class| {
                    class
                        .iter()
                        .find(|record| record_id(record) == Some(id))
                        .cloned()
                })
                .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?
        };

        self.fire(CrudEventKind::BeforeDelete, class_name, &mut doomed)?;

        let (index, removed) = {
            let mut records = self.records.write().await;
            let class = records
                .get_mut(class_name)
                .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?;
            let index = class
                .iter()
                .position(|record| record_id(record) == Some(id))
                .ok_or_else(|| AppError::NotFound(format!("{class_name} with id {id}")))?;
            (index, class.remove(index))
        };

        let mut removed_event = removed.clone();
        if let Err(err) = self.fire(CrudEventKind::AfterDelete, class_name, &mut removed_event) {
            let mut records = self.records.write().await;
            if let Some(class) = records.get_mut(class_name) {
                let index = index.min(class.len());
                class.insert(index, removed);
            }
            return Err(err);
        }

        Ok(())
    }

    async fn delete_all(&self, class_name: &str) -> AppResult<()> {
        self.records.write().await.remove(class_name);
        Ok(())
    }

    async fn find_record(&self, class_name: &str, id: i64) -> AppResult<Option<Value>> {
        let records = self.records.read().await;
        Ok(records.get(class_name).and_then(|class| {
            class
                .iter()
                .find(|record| record_id(record) == Some(id))
                .cloned()
        }))
    }

    async fn find_records(
        &self,
        class_name: &str,
        parameters: &QueryParameters,
    ) -> AppResult<Vec<Value>> {
        let records = self.records.read().await;
        let mut matches: Vec<Value> = records
            .get(class_name)
            .map(|class| {
                class
                    .iter()
                    .filter(|record| parameters.matches_record(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = parameters.sort() {
            let path = PropertyPath::parse(sort.field())?;
            let direction = sort.direction();
            matches.sort_by(|a, b| {
                let ordering = match (path.resolve(a), path.resolve(b)) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(left), Some(right)) => {
                        compare_values(left, right).unwrap_or(Ordering::Equal)
                    }
                };
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let offset = parameters.offset().min(matches.len());
        let mut page: Vec<Value> = matches.split_off(offset);
        if let Some(max_results) = parameters.max_results() {
            page.truncate(max_results);
        }

        Ok(page)
    }

    async fn count(&self, class_name: &str, parameters: &QueryParameters) -> AppResult<u64> {
        let records = self.records.read().await;
        let count = records
            .get(class_name)
            .map(|class| {
                class
                    .iter()
                    .filter(|record| parameters.matches_record(record))
                    .count()
            })
            .unwrap_or(0);

        Ok(count as u64)
    }

    async fn property_values(&self, class_name: &str, property: &str) -> AppResult<Vec<Value>> {
        let path = PropertyPath::parse(property)?;
        let records = self.records.read().await;
        let Some(class) = records.get(class_name) else {
            tracing::debug!(class_name, property, "no records for property value listing");
            return Ok(Vec::new());
        };

        let mut values = Vec::new();
        for record in class {
            if let Some(value) = path.resolve(record)
                && !values.contains(value)
            {
                values.push(value.clone());
            }
        }

        if values.is_empty() {
            tracing::debug!(class_name, property, "property has no values");
        }

        Ok(values)
    }

    async fn increase_counter(&self, class_name: &str, id: i64, counter: &str) -> AppResult<i64> {
        self.adjust_counter(class_name, id, counter, 1).await
    }

    async fn decrease_counter(&self, class_name: &str, id: i64, counter: &str) -> AppResult<i64> {
        self.adjust_counter(class_name, id, counter, -1).await
    }

    async fn execute_within_transaction<'a>(
        &'a self,
        work: TransactionWork<'a>,
    ) -> AppResult<()> {
        let records_snapshot = self.records.read().await.clone();
        let sequences_snapshot = self.sequences.read().await.clone();

        match work.await {
            Ok(()) => Ok(()),
            Err(err) => {
                *self.records.write().await = records_snapshot;
                *self.sequences.write().await = sequences_snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use metaforge_core::{AppError, AppResult};
    use metaforge_domain::{
        ConstraintRule, FieldConstraint, QueryCondition, QueryParameters, SortDirection,
    };
    use metaforge_engine::{
        CrudEventKind, CrudListener, CrudService, CrudServiceExt, Entity,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};

    use super::InMemoryCrudService;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Contact {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        name: String,
        birth_date: NaiveDate,
    }

    impl Entity for Contact {
        fn class_name() -> &'static str {
            "crm.Contact"
        }

        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    fn contact(name: &str, year: i32) -> Contact {
        Contact {
            id: None,
            name: name.to_owned(),
            birth_date: NaiveDate::from_ymd_opt(year, 6, 1)
                .unwrap_or_else(|| unreachable!()),
        }
    }

    #[tokio::test]
    async fn typed_round_trip_assigns_sequential_ids() {
        let service = InMemoryCrudService::new();

        let first = service
            .create(contact("Ada", 1980))
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = service
            .create(contact("Grace", 1975))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let mut renamed = first.clone();
        renamed.name = "Ada L.".to_owned();
        service
            .update(renamed.clone())
            .await
            .unwrap_or_else(|_| unreachable!());

        let found: Option<Contact> = service
            .find_by_id(1)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(found, Some(renamed));

        service
            .delete(&second)
            .await
            .unwrap_or_else(|_| unreachable!());
        let remaining: Vec<Contact> = service
            .find_all()
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn deleting_an_unpersisted_entity_is_rejected() {
        let service = InMemoryCrudService::new();
        let result = service.delete(&contact("Ghost", 1990)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn updates_require_an_existing_record() {
        let service = InMemoryCrudService::new();
        let mut entity = contact("Nobody", 1990);
        entity.id = Some(42);

        let result = service.update(entity).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn nested_filters_sort_and_paginate() {
        let service = InMemoryCrudService::new();
        for (name, city, age) in [
            ("Ada", "London", 36),
            ("Grace", "Arlington", 45),
            ("Edsger", "Austin", 52),
            ("Barbara", "London", 41),
        ] {
            service
                .create_record(
                    "crm.Contact",
                    json!({"name": name, "age": age, "address": {"city": city}}),
                )
                .await
                .unwrap_or_else(|_| unreachable!());
        }

        let mut parameters = QueryParameters::new();
        parameters
            .add("address.city", QueryCondition::eq(json!("London")))
            .order_by("age", SortDirection::Desc);

        let found = service
            .find_records("crm.Contact", &parameters)
            .await
            .unwrap_or_else(|_| unreachable!());
        let names: Vec<&str> = found
            .iter()
            .filter_map(|record| record.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["Barbara", "Ada"]);

        parameters.paginate(1).skip(1);
        let page = service
            .find_records("crm.Contact", &parameters)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get("name").and_then(Value::as_str), Some("Ada"));

        let total = service
            .count("crm.Contact", &parameters)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(total, 2);
    }

    struct MinimumAge;

    impl CrudListener for MinimumAge {
        fn handle(
            &self,
            event: CrudEventKind,
            _class_name: &str,
            record: &mut Value,
        ) -> AppResult<()> {
            if event == CrudEventKind::BeforeCreate
                && record.get("age").and_then(Value::as_i64) == Some(15)
                && let Some(object) = record.as_object_mut()
            {
                object.insert("age".to_owned(), json!(20));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn before_create_listeners_mutate_the_stored_record() {
        let mut service = InMemoryCrudService::new();
        service.register_listener(Arc::new(MinimumAge));

        let stored = service
            .create_record("crm.Contact", json!({"name": "Young", "age": 15}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(stored.get("age").and_then(Value::as_i64), Some(20));

        let found = service
            .find_record("crm.Contact", 1)
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!());
        assert_eq!(found.get("age").and_then(Value::as_i64), Some(20));
    }

    struct RejectAfterCreate;

    impl CrudListener for RejectAfterCreate {
        fn handle(
            &self,
            event: CrudEventKind,
            _class_name: &str,
            _record: &mut Value,
        ) -> AppResult<()> {
            if event == CrudEventKind::AfterCreate {
                return Err(AppError::Internal("downstream sync failed".to_owned()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn after_create_failures_remove_the_stored_record() {
        let mut service = InMemoryCrudService::new();
        service.register_listener(Arc::new(RejectAfterCreate));

        let result = service
            .create_record("crm.Contact", json!({"name": "Doomed"}))
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        let count = service
            .count("crm.Contact", &QueryParameters::new())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn constraints_collect_every_violation() {
        let mut service = InMemoryCrudService::new();
        service.register_constraints(
            "crm.Contact",
            vec![
                FieldConstraint::new("name", vec![ConstraintRule::Required])
                    .unwrap_or_else(|_| unreachable!()),
                FieldConstraint::new("age", vec![ConstraintRule::Min(0.0)])
                    .unwrap_or_else(|_| unreachable!()),
            ],
        );

        let result = service
            .create_record("crm.Contact", json!({"age": -3}))
            .await;
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("name"));
        assert!(message.contains("age"));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Visit {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        count: i64,
        total: i64,
        last_score: Option<i64>,
    }

    impl Entity for Visit {
        fn class_name() -> &'static str {
            "metrics.Visit"
        }

        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    #[tokio::test]
    async fn counters_adjust_integer_fields_of_every_shape() {
        let service = InMemoryCrudService::new();
        let visit = service
            .create(Visit {
                id: None,
                count: 0,
                total: 5,
                last_score: None,
            })
            .await
            .unwrap_or_else(|_| unreachable!());
        let id = visit.id.unwrap_or_else(|| unreachable!());

        for counter in ["count", "total", "last_score"] {
            for _ in 0..3 {
                service
                    .increase_counter("metrics.Visit", id, counter)
                    .await
                    .unwrap_or_else(|_| unreachable!());
            }
            service
                .decrease_counter("metrics.Visit", id, counter)
                .await
                .unwrap_or_else(|_| unreachable!());
        }

        let stored: Visit = service
            .find_by_id(id)
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!());
        assert_eq!(stored.count, 2);
        assert_eq!(stored.total, 7);
        // Null counters start from zero.
        assert_eq!(stored.last_score, Some(2));
    }

    #[tokio::test]
    async fn unknown_counter_fields_are_rejected() {
        let service = InMemoryCrudService::new();
        service
            .create_record("metrics.Visit", json!({"count": 0}))
            .await
            .unwrap_or_else(|_| unreachable!());

        let missing = service
            .increase_counter("metrics.Visit", 1, "absent")
            .await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        service
            .create_record("metrics.Visit", json!({"label": "text"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        let not_integer = service.increase_counter("metrics.Visit", 2, "label").await;
        assert!(matches!(not_integer, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn failed_transactions_roll_back_every_write() {
        let service = InMemoryCrudService::new();
        service
            .create_record("crm.Contact", json!({"name": "Keep"}))
            .await
            .unwrap_or_else(|_| unreachable!());

        let result = service
            .execute_within_transaction(Box::pin(async {
                service
                    .create_record("crm.Contact", json!({"name": "Temp"}))
                    .await?;
                service
                    .create_record("crm.Contact", json!({"name": "Also temp"}))
                    .await?;
                Err(AppError::Validation("abort".to_owned()))
            }))
            .await;
        assert!(result.is_err());

        let count = service
            .count("crm.Contact", &QueryParameters::new())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(count, 1);

        // The id sequence rolled back too, so the next id is still 2.
        let next = service
            .create_record("crm.Contact", json!({"name": "Next"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(next.get("id").and_then(Value::as_i64), Some(2));
    }

    #[tokio::test]
    async fn property_values_are_distinct_in_first_seen_order() {
        let service = InMemoryCrudService::new();
        for city in ["London", "Austin", "London", "Bogota"] {
            service
                .create_record("crm.Contact", json!({"address": {"city": city}}))
                .await
                .unwrap_or_else(|_| unreachable!());
        }
        service
            .create_record("crm.Contact", json!({"address": null}))
            .await
            .unwrap_or_else(|_| unreachable!());

        let values = service
            .property_values("crm.Contact", "address.city")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(values, vec![json!("London"), json!("Austin"), json!("Bogota")]);

        let none = service
            .property_values("crm.Unknown", "name")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn delete_all_clears_one_class_only() {
        let service = InMemoryCrudService::new();
        service
            .create_record("crm.Contact", json!({"name": "A"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        service
            .create_record("crm.Invoice", json!({"number": 1}))
            .await
            .unwrap_or_else(|_| unreachable!());

        service
            .delete_all("crm.Contact")
            .await
            .unwrap_or_else(|_| unreachable!());

        let contacts = service
            .count("crm.Contact", &QueryParameters::new())
            .await
            .unwrap_or_else(|_| unreachable!());
        let invoices = service
            .count("crm.Invoice", &QueryParameters::new())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(contacts, 0);
        assert_eq!(invoices, 1);
    }

    #[tokio::test]
    async fn find_single_returns_the_first_match() {
        let service = InMemoryCrudService::new();
        service
            .create(contact("Ada", 1980))
            .await
            .unwrap_or_else(|_| unreachable!());
        service
            .create(contact("Ada", 1990))
            .await
            .unwrap_or_else(|_| unreachable!());

        let parameters = QueryParameters::with("name", QueryCondition::eq(json!("Ada")));
        let found: Option<Contact> = service
            .find_single(&parameters)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(found.and_then(|entity| entity.id), Some(1));

        let missing: Option<Contact> = service
            .find_single(&QueryParameters::with(
                "name",
                QueryCondition::eq(json!("Nobody")),
            ))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn ten_creates_are_all_listed_and_find_first_returns_the_first_inserted() {
        let service = InMemoryCrudService::new();
        for index in 0..10 {
            let created = service
                .create(contact(&format!("Contact {index}"), 1970 + index))
                .await
                .unwrap_or_else(|_| unreachable!());
            assert!(created.id.is_some());
        }

        let all: Vec<Contact> = service
            .find_all()
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(all.len(), 10);

        let first: Option<Contact> = service
            .find_first()
            .await
            .unwrap_or_else(|_| unreachable!());
        let first = first.unwrap_or_else(|| unreachable!());
        assert_eq!(first.id, Some(1));
        assert_eq!(first.name, "Contact 0");
    }
}
