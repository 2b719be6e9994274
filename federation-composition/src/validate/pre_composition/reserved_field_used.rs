use apollo_compiler::ast::Definition;
use apollo_compiler::ast::OperationType;

use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::service::ServiceDefinition;
use crate::validate::PreCompositionValidator;

const RESERVED_FIELDS: [&str; 2] = ["_service", "_entities"];

/// `_service` and `_entities` are added to the query root by federation itself.
pub(crate) struct ReservedFieldUsed;

impl PreCompositionValidator for ReservedFieldUsed {
    fn name(&self) -> &'static str {
        "reservedFieldUsed"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        let definitions = &service.type_defs.definitions;
        let root_query_name = definitions
            .iter()
            .flat_map(|definition| match definition {
                Definition::SchemaDefinition(schema) => schema.root_operations.as_slice(),
                Definition::SchemaExtension(schema) => schema.root_operations.as_slice(),
                _ => &[],
            })
            .filter(|root_operation| root_operation.0 == OperationType::Query)
            .map(|root_operation| root_operation.1.as_str())
            .last()
            .unwrap_or("Query");

        let mut errors = Vec::new();
        for definition in definitions {
            let (name, fields) = match definition {
                Definition::ObjectTypeDefinition(object) => (&object.name, &object.fields),
                Definition::ObjectTypeExtension(object) => (&object.name, &object.fields),
                _ => continue,
            };
            if name != root_query_name {
                continue;
            }
            for field in fields.iter().filter(|field| RESERVED_FIELDS.contains(&field.name.as_str())) {
                errors.push(
                    CompositionError::new(
                        ErrorCode::ReservedFieldUsed,
                        format!(
                            "{}{} is a field reserved for federation and can't be used at the Query root.",
                            log_service_and_type(&service.name, root_query_name, Some(&field.name)),
                            field.name,
                        ),
                    )
                    .with_location(field.location(), &service.type_defs.sources),
                );
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn messages(sdl: &str) -> Vec<String> {
        let service = ServiceDefinition::parse("serviceA", sdl).unwrap();
        ReservedFieldUsed
            .validate(&service)
            .unwrap()
            .into_iter()
            .map(|error| error.to_string())
            .collect()
    }

    #[test]
    fn reports_reserved_fields_on_the_query_root() {
        assert_eq!(
            messages("type Query { product: String _service: String _entities: String }"),
            [
                "RESERVED_FIELD_USED: [serviceA] Query._service -> _service is a field reserved for federation and can't be used at the Query root.",
                "RESERVED_FIELD_USED: [serviceA] Query._entities -> _entities is a field reserved for federation and can't be used at the Query root.",
            ]
        );
    }

    #[test]
    fn follows_custom_query_root_names() {
        assert_eq!(
            messages("schema { query: RootQuery }\nextend type RootQuery { _service: String }\ntype Query { _entities: Int }"),
            ["RESERVED_FIELD_USED: [serviceA] RootQuery._service -> _service is a field reserved for federation and can't be used at the Query root."]
        );
    }
}
