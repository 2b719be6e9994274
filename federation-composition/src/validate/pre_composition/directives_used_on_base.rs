use super::fields_of_base_types_using;
use crate::directives::EXTERNAL_DIRECTIVE_NAME;
use crate::directives::REQUIRES_DIRECTIVE_NAME;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::service::ServiceDefinition;
use crate::validate::PreCompositionValidator;

/// `@external` only makes sense on fields of a type another service owns.
pub(crate) struct ExternalUsedOnBase;

impl PreCompositionValidator for ExternalUsedOnBase {
    fn name(&self) -> &'static str {
        "externalUsedOnBase"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        Ok(fields_of_base_types_using(
            service,
            &EXTERNAL_DIRECTIVE_NAME,
            ErrorCode::ExternalUsedOnBase,
        ))
    }
}

/// The owning service resolves every field of its own types, so it never requires any.
pub(crate) struct RequiresUsedOnBase;

impl PreCompositionValidator for RequiresUsedOnBase {
    fn name(&self) -> &'static str {
        "requiresUsedOnBase"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        Ok(fields_of_base_types_using(
            service,
            &REQUIRES_DIRECTIVE_NAME,
            ErrorCode::RequiresUsedOnBase,
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn messages(validator: &dyn PreCompositionValidator, sdl: &str) -> Vec<String> {
        let service = ServiceDefinition::parse("serviceA", sdl).unwrap();
        validator
            .validate(&service)
            .unwrap()
            .into_iter()
            .map(|error| error.to_string())
            .collect()
    }

    #[test]
    fn reports_external_on_base_types() {
        let sdl = r#"
            type Product @key(fields: "sku") {
              sku: String! @external
              upc: String!
            }
            extend type Review { product: Product @external }
        "#;
        assert_eq!(
            messages(&ExternalUsedOnBase, sdl),
            ["EXTERNAL_USED_ON_BASE: [serviceA] Product.sku -> Found extraneous @external directive. @external cannot be used on base types."]
        );
    }

    #[test]
    fn reports_requires_on_base_types() {
        let sdl = r#"
            type Product {
              sku: String!
              price: Int @requires(fields: "sku")
            }
        "#;
        assert_eq!(
            messages(&RequiresUsedOnBase, sdl),
            ["REQUIRES_USED_ON_BASE: [serviceA] Product.price -> Found extraneous @requires directive. @requires cannot be used on base types."]
        );
        assert!(messages(&ExternalUsedOnBase, sdl).is_empty());
    }
}
