use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::schema::ObjectType;

use super::AbstractType;
use super::abstract_type;
use super::located;
use super::object_types;
use crate::compose::ComposedSchema;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::field_set::FieldSelection;
use crate::validate::PostCompositionValidator;

fn key_locations(object: &ObjectType) -> Vec<Option<SourceSpan>> {
    object
        .directives
        .get_all(&KEY_DIRECTIVE_NAME)
        .map(|key| key.node.location())
        .collect()
}

/// Every top-level selection of every `@key`, with the service declaring it.
fn key_selections<'a>(
    composed: &'a ComposedSchema,
) -> impl Iterator<Item = (&'a Name, &'a Node<ObjectType>, &'a str, &'a FieldSelection)> {
    object_types(&composed.schema).flat_map(move |(type_name, object)| {
        composed
            .type_metadata(type_name)
            .and_then(|metadata| metadata.keys.as_ref())
            .into_iter()
            .flatten()
            .flat_map(move |(service_name, keys)| {
                keys.iter()
                    .flat_map(|key| key.iter())
                    .map(move |selection| (type_name, object, service_name.as_str(), selection))
            })
    })
}

/// A `@key` may only select fields that the owning service defines.
pub(crate) struct KeyFieldsMissingOnBase;

impl PostCompositionValidator for KeyFieldsMissingOnBase {
    fn name(&self) -> &'static str {
        "keyFieldsMissingOnBase"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, object, service_name, selection) in key_selections(composed) {
            let field_name = selection.field_name.as_str();
            if !object.fields.contains_key(field_name) {
                continue;
            }
            let Some(extending_service) = composed
                .field_metadata(type_name, field_name)
                .and_then(|field| field.service_name.as_deref())
            else {
                continue;
            };
            let error = CompositionError::new(
                ErrorCode::KeyFieldsMissingOnBase,
                format!(
                    "{}A @key selects {field_name}, but {type_name}.{field_name} was either created or overwritten by {extending_service}, not {service_name}",
                    log_service_and_type(service_name, type_name, None),
                ),
            );
            errors.push(located(composed, error, key_locations(object)));
        }
        Ok(errors)
    }
}

/// A `@key` must select existing fields, none of which may return an interface or a union.
pub(crate) struct KeyFieldsSelectInvalidType;

impl PostCompositionValidator for KeyFieldsSelectInvalidType {
    fn name(&self) -> &'static str {
        "keyFieldsSelectInvalidType"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, object, service_name, selection) in key_selections(composed) {
            let field_name = selection.field_name.as_str();
            let prefix = log_service_and_type(service_name, type_name, None);
            let message = match object.fields.get(field_name) {
                None => format!("{prefix}A @key selects {field_name}, but {type_name}.{field_name} could not be found"),
                Some(field) => match abstract_type(&composed.schema, &field.ty) {
                    Some(AbstractType::Interface) => format!(
                        "{prefix}A @key selects {type_name}.{field_name}, which is an interface type. Keys cannot select interfaces."
                    ),
                    Some(AbstractType::Union) => format!(
                        "{prefix}A @key selects {type_name}.{field_name}, which is a union type. Keys cannot select union types."
                    ),
                    None => continue,
                },
            };
            let error = CompositionError::new(ErrorCode::KeyFieldsSelectInvalidType, message);
            errors.push(located(composed, error, key_locations(object)));
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::validate::post_composition::test_helpers::run;

    #[test]
    fn reports_keys_on_fields_added_by_extensions() {
        let products = ("serviceA", r#"type Product @key(fields: "sku") { sku: String! }"#);
        let inventory = ("serviceB", r#"extend type Product { upc: String! }"#);
        let reviews = (
            "serviceC",
            r#"extend type Product @key(fields: "upc") { upc: String! @external reviews: [String] }"#,
        );
        assert_eq!(
            run(&KeyFieldsMissingOnBase, &[products, inventory, reviews]),
            ["KEY_FIELDS_MISSING_ON_BASE: [serviceC] Product -> A @key selects upc, but Product.upc was either created or overwritten by serviceB, not serviceC"]
        );
    }

    #[test]
    fn reports_keys_selecting_missing_and_abstract_fields() {
        let products = (
            "serviceA",
            r#"
            type Product @key(fields: "sku") @key(fields: "node") @key(fields: "media") @key(fields: "nodes") {
              node: Node!
              media: Media
              nodes: [Node]
            }
            interface Node { id: ID! }
            type Image { url: String }
            type Video { url: String }
            union Media = Image | Video
            "#,
        );
        assert_eq!(
            run(&KeyFieldsSelectInvalidType, &[products]),
            [
                "KEY_FIELDS_SELECT_INVALID_TYPE: [serviceA] Product -> A @key selects sku, but Product.sku could not be found",
                "KEY_FIELDS_SELECT_INVALID_TYPE: [serviceA] Product -> A @key selects Product.node, which is an interface type. Keys cannot select interfaces.",
                "KEY_FIELDS_SELECT_INVALID_TYPE: [serviceA] Product -> A @key selects Product.media, which is a union type. Keys cannot select union types.",
            ]
        );
    }
}
