use std::collections::HashSet;

use metaforge_core::AppResult;
use metaforge_domain::{
    ConditionOperator, PropertyPath, QueryParameters, SortDirection, ViewDescriptor,
};

/// Builds a flat query-language projection from a table view descriptor.
///
/// The root entity is aliased `e`. Plain field names project directly;
/// dotted names and explicit path overrides become aliased sub-expressions
/// so related values land in flat result columns. `e.id` is always the
/// first column and duplicates are emitted once.
#[derive(Debug, Clone)]
pub struct QueryProjectionBuilder {
    entity_class: String,
    columns: Vec<String>,
    filters: Vec<String>,
    order_by: Option<String>,
}

impl QueryProjectionBuilder {
    /// Derives the projection columns from the descriptor's visible fields.
    pub fn from_view_descriptor(descriptor: &ViewDescriptor) -> AppResult<Self> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        columns.push("e.id".to_owned());
        seen.insert("e.id".to_owned());

        for field in descriptor.visible_fields() {
            let column = match field.path() {
                Some(path) => {
                    let alias = PropertyPath::parse(field.name())?.alias();
                    format!("({path}) as {alias}")
                }
                None if field.name().contains('.') => {
                    let path = PropertyPath::parse(field.name())?;
                    format!("(e.{}) as {}", path.as_str(), path.alias())
                }
                None => format!("e.{}", field.name()),
            };

            if seen.insert(column.clone()) {
                columns.push(column);
            }
        }

        Ok(Self {
            entity_class: descriptor.entity_class().to_owned(),
            columns,
            filters: Vec::new(),
            order_by: None,
        })
    }

    /// Translates query parameters into named-placeholder filter fragments
    /// and an order-by clause.
    pub fn with_parameters(mut self, parameters: &QueryParameters) -> AppResult<Self> {
        for (name, condition) in parameters.iter() {
            let key = PropertyPath::parse(name)?.alias();
            let fragment = match condition.operator() {
                ConditionOperator::Equals => format!("e.{name} = :{key}"),
                ConditionOperator::NotEquals => format!("e.{name} <> :{key}"),
                ConditionOperator::InList => format!("e.{name} in (:{key})"),
                ConditionOperator::NotInList => format!("e.{name} not in (:{key})"),
                ConditionOperator::Like => format!("e.{name} like :{key}"),
                ConditionOperator::IsNull => format!("e.{name} is null"),
                ConditionOperator::IsNotNull => format!("e.{name} is not null"),
                ConditionOperator::Range => {
                    format!("e.{name} between :{key}_from and :{key}_to")
                }
                ConditionOperator::GreaterThan => format!("e.{name} > :{key}"),
                ConditionOperator::GreaterOrEquals => format!("e.{name} >= :{key}"),
                ConditionOperator::LessThan => format!("e.{name} < :{key}"),
                ConditionOperator::LessOrEquals => format!("e.{name} <= :{key}"),
            };
            self.filters.push(fragment);
        }

        if let Some(sort) = parameters.sort() {
            self.order_by = Some(format!(
                "e.{} {}",
                sort.field(),
                match sort.direction() {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                }
            ));
        }

        Ok(self)
    }

    /// Returns the projected columns in output order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Renders the complete select statement.
    #[must_use]
    pub fn build(&self) -> String {
        let mut statement = format!(
            "select {} from {} as e",
            self.columns.join(", "),
            self.entity_class
        );

        if !self.filters.is_empty() {
            statement.push_str(" where ");
            statement.push_str(&self.filters.join(" and "));
        }

        if let Some(order_by) = &self.order_by {
            statement.push_str(" order by ");
            statement.push_str(order_by);
        }

        statement
    }
}

#[cfg(test)]
mod tests {
    use metaforge_domain::{
        FieldKind, QueryCondition, QueryParameters, SortDirection, ViewDescriptor, ViewField,
        ViewKind,
    };
    use serde_json::json;

    use super::QueryProjectionBuilder;

    fn field(name: &str, kind: FieldKind) -> ViewField {
        ViewField::new(name, kind).unwrap_or_else(|_| unreachable!())
    }

    fn contact_descriptor() -> ViewDescriptor {
        ViewDescriptor::new(
            "crm.Contact",
            ViewKind::Table,
            vec![
                field("name", FieldKind::Text),
                field("date", FieldKind::Date),
                field("description", FieldKind::Text),
                field("notes", FieldKind::Text),
                field("subentity", FieldKind::Reference),
                field("subentity.name", FieldKind::Text).with_path("sub.name"),
            ],
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn projects_visible_fields_with_aliased_relations() {
        let builder = QueryProjectionBuilder::from_view_descriptor(&contact_descriptor())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            builder.build(),
            "select e.id, e.name, e.date, e.description, e.notes, e.subentity, \
             (sub.name) as subentity_name from crm.Contact as e"
        );
    }

    #[test]
    fn hidden_fields_and_duplicates_are_skipped() {
        let descriptor = ViewDescriptor::new(
            "crm.Contact",
            ViewKind::Table,
            vec![
                field("id", FieldKind::Number),
                field("name", FieldKind::Text),
                field("secret", FieldKind::Text).hidden(),
            ],
        )
        .unwrap_or_else(|_| unreachable!());

        let builder = QueryProjectionBuilder::from_view_descriptor(&descriptor)
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(builder.columns(), &["e.id", "e.name"]);
    }

    #[test]
    fn parameters_become_named_placeholder_filters() {
        let mut parameters = QueryParameters::new();
        parameters
            .add("name", QueryCondition::like("Jo%"))
            .add("age", QueryCondition::between(json!(18), json!(65)))
            .add("subentity.name", QueryCondition::eq(json!("Acme")))
            .order_by("name", SortDirection::Desc);

        let statement = QueryProjectionBuilder::from_view_descriptor(&contact_descriptor())
            .unwrap_or_else(|_| unreachable!())
            .with_parameters(&parameters)
            .unwrap_or_else(|_| unreachable!())
            .build();

        assert!(statement.contains("where e.name like :name"));
        assert!(statement.contains("e.age between :age_from and :age_to"));
        assert!(statement.contains("e.subentity.name = :subentity_name"));
        assert!(statement.ends_with("order by e.name desc"));
    }
}
