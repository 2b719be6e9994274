use super::located;
use super::object_types;
use crate::compose::ComposedSchema;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::validate::PostCompositionValidator;

/// Every field a `@requires` selects must be declared `@external` by the requiring service.
pub(crate) struct RequiresFieldsMissingExternal;

impl PostCompositionValidator for RequiresFieldsMissingExternal {
    fn name(&self) -> &'static str {
        "requiresFieldsMissingExternal"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, object) in object_types(&composed.schema) {
            for (field_name, field) in &object.fields {
                let Some(metadata) = composed.field_metadata(type_name, field_name) else {
                    continue;
                };
                let (Some(service_name), Some(requires)) = (&metadata.service_name, &metadata.requires) else {
                    continue;
                };
                let externals = composed
                    .type_metadata(type_name)
                    .and_then(|type_metadata| type_metadata.externals.get(service_name));
                for selection in requires.iter() {
                    let is_external = externals.is_some_and(|externals| {
                        externals.iter().any(|external| external.field.name.as_str() == selection.field_name.as_str())
                    });
                    if is_external {
                        continue;
                    }
                    let error = CompositionError::new(
                        ErrorCode::RequiresFieldsMissingExternal,
                        format!(
                            "{}requires the field `{}` to be marked as @external.",
                            log_service_and_type(service_name, type_name, Some(field_name)),
                            selection.field_name,
                        ),
                    );
                    errors.push(located(composed, error, [field.node.location()]));
                }
            }
        }
        Ok(errors)
    }
}

/// A `@requires` may only select fields of the base type; fields added by an extension cannot
/// be required.
pub(crate) struct RequiresFieldsMissingOnBase;

impl PostCompositionValidator for RequiresFieldsMissingOnBase {
    fn name(&self) -> &'static str {
        "requiresFieldsMissingOnBase"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, object) in object_types(&composed.schema) {
            for (field_name, field) in &object.fields {
                let Some(metadata) = composed.field_metadata(type_name, field_name) else {
                    continue;
                };
                let (Some(service_name), Some(requires)) = (&metadata.service_name, &metadata.requires) else {
                    continue;
                };
                for selection in requires.iter() {
                    if !object.fields.contains_key(selection.field_name.as_str()) {
                        continue;
                    }
                    let selected_by_extension = composed
                        .field_metadata(type_name, &selection.field_name)
                        .is_some_and(|selected| selected.service_name.is_some());
                    if !selected_by_extension {
                        continue;
                    }
                    let error = CompositionError::new(
                        ErrorCode::RequiresFieldsMissingOnBase,
                        format!(
                            "{}requires the field `{}` to be @external. @external fields must exist on the base type, not an extension.",
                            log_service_and_type(service_name, type_name, Some(field_name)),
                            selection.field_name,
                        ),
                    );
                    errors.push(located(composed, error, [field.node.location()]));
                }
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::validate::post_composition::test_helpers::run;

    const PRODUCTS: (&str, &str) = (
        "serviceA",
        r#"
        type Product @key(fields: "sku") {
          sku: String!
          upc: String!
          weight: Int
        }
        "#,
    );

    #[test]
    fn reports_required_fields_not_marked_external() {
        let shipping = (
            "serviceB",
            r#"
            extend type Product @key(fields: "sku") {
              sku: String! @external
              weight: Int @external
              shippingEstimate: Int @requires(fields: "weight upc")
            }
            "#,
        );
        assert_eq!(
            run(&RequiresFieldsMissingExternal, &[PRODUCTS, shipping]),
            ["REQUIRES_FIELDS_MISSING_EXTERNAL: [serviceB] Product.shippingEstimate -> requires the field `upc` to be marked as @external."]
        );
    }

    #[test]
    fn reports_required_fields_added_by_extensions() {
        let inventory = ("serviceC", "extend type Product { inStock: Boolean }");
        let shipping = (
            "serviceB",
            r#"
            extend type Product @key(fields: "sku") {
              sku: String! @external
              inStock: Boolean @external
              shippingEstimate: Int @requires(fields: "inStock")
            }
            "#,
        );
        assert_eq!(
            run(&RequiresFieldsMissingOnBase, &[PRODUCTS, inventory, shipping]),
            ["REQUIRES_FIELDS_MISSING_ON_BASE: [serviceB] Product.shippingEstimate -> requires the field `inStock` to be @external. @external fields must exist on the base type, not an extension."]
        );
        assert!(run(&RequiresFieldsMissingExternal, &[PRODUCTS, inventory, shipping]).is_empty());
    }
}
