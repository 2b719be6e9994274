use apollo_compiler::ast::Definition;
use apollo_compiler::ast::OperationType;
use apollo_compiler::collections::IndexSet;

use super::PreNormalizationValidator;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;
use crate::normalize::default_root_operation_name;
use crate::normalize::is_default_root_operation_name;
use crate::service::ServiceDefinition;

/// Once a schema block maps an operation to a custom type, an object type named with that
/// operation's default name would be dropped by normalization.
pub(crate) struct RootFieldUsed;

fn root_used_code(operation_type: OperationType) -> ErrorCode {
    match operation_type {
        OperationType::Query => ErrorCode::RootQueryUsed,
        OperationType::Mutation => ErrorCode::RootMutationUsed,
        OperationType::Subscription => ErrorCode::RootSubscriptionUsed,
    }
}

impl PreNormalizationValidator for RootFieldUsed {
    fn name(&self) -> &'static str {
        "rootFieldUsed"
    }

    fn validate(&self, service: &ServiceDefinition) -> Vec<CompositionError> {
        let type_defs = &service.type_defs;
        let mut has_schema_definition = false;
        let mut disallowed = IndexSet::default();
        for definition in &type_defs.definitions {
            let root_operations = match definition {
                Definition::SchemaDefinition(schema) => &schema.root_operations,
                Definition::SchemaExtension(schema) => &schema.root_operations,
                _ => continue,
            };
            for root_operation in root_operations {
                has_schema_definition = true;
                let (operation_type, type_name) = &**root_operation;
                if !is_default_root_operation_name(type_name) {
                    disallowed.insert(*operation_type);
                }
            }
        }
        if !has_schema_definition {
            return Vec::new();
        }

        let mut errors = Vec::new();
        for definition in &type_defs.definitions {
            let name = match definition {
                Definition::ObjectTypeDefinition(object) => &object.name,
                Definition::ObjectTypeExtension(object) => &object.name,
                _ => continue,
            };
            let Some(operation_type) = disallowed
                .iter()
                .copied()
                .find(|operation_type| default_root_operation_name(*operation_type) == *name)
            else {
                continue;
            };
            let lowercase = operation_type.to_string();
            errors.push(
                CompositionError::new(
                    root_used_code(operation_type),
                    format!(
                        "{}Found invalid use of default root operation name `{name}`. `{name}` is disallowed when `Schema.{lowercase}` is set to a type other than `{name}`.",
                        log_service_and_type(&service.name, name, None),
                    ),
                )
                .with_location(definition.location(), &type_defs.sources),
            );
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn validate(sdl: &str) -> Vec<(ErrorCode, String)> {
        let service = ServiceDefinition::parse("serviceA", sdl).unwrap();
        RootFieldUsed
            .validate(&service)
            .into_iter()
            .map(|error| (error.code, error.message))
            .collect()
    }

    #[test]
    fn reports_default_names_shadowed_by_custom_roots() {
        let errors = validate(
            r#"
            schema { query: RootQuery mutation: RootMutation }
            type RootQuery { product: String }
            type Query { product: String }
            extend type Mutation { update: String }
            type RootMutation { update: String }
            "#,
        );
        assert_eq!(
            errors,
            [
                (
                    ErrorCode::RootQueryUsed,
                    "[serviceA] Query -> Found invalid use of default root operation name `Query`. `Query` is disallowed when `Schema.query` is set to a type other than `Query`.".to_owned()
                ),
                (
                    ErrorCode::RootMutationUsed,
                    "[serviceA] Mutation -> Found invalid use of default root operation name `Mutation`. `Mutation` is disallowed when `Schema.mutation` is set to a type other than `Mutation`.".to_owned()
                ),
            ]
        );
    }

    #[test]
    fn allows_default_names_without_schema_block() {
        assert!(validate("type Query { a: String }\ntype RootQuery { b: String }").is_empty());
        assert!(
            validate("schema { query: Query }\ntype Query { a: String }\ntype Mutation { b: String }")
                .is_empty()
        );
    }
}
