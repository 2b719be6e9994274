use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::WithErrors;

use crate::directives::EXTERNAL_DIRECTIVE_NAME;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::directives::fields_argument;
use crate::directives::federation_directive_definitions;
use crate::directives::is_federation_directive;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::field_set::FieldSet;
use crate::service::ServiceDefinition;
use crate::validate::PreCompositionValidator;

/// A `@key` on an extension selects fields the owning service resolves, so this service must
/// declare each of them, nested selections included, as `@external`.
pub(crate) struct KeyFieldsMissingExternal;

impl PreCompositionValidator for KeyFieldsMissingExternal {
    fn name(&self) -> &'static str {
        "keyFieldsMissingExternal"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        let key_directive_name = KEY_DIRECTIVE_NAME;
        let keys: Vec<(&Name, &Node<ast::Directive>)> = service
            .type_defs
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::ObjectTypeExtension(object) => Some(object),
                _ => None,
            })
            .flat_map(|object| {
                object
                    .directives
                    .get_all(&key_directive_name)
                    .map(move |key| (&object.name, key))
            })
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut errors = Vec::new();
        let schema = build_service_schema(service, &mut errors);
        let mut walker = KeyWalker {
            schema: &schema,
            service,
            errors: &mut errors,
        };
        for (type_name, key) in keys {
            let Some(fields) = fields_argument(key) else {
                continue;
            };
            walker.visit(type_name, &FieldSet::parse(fields)?, key);
        }
        Ok(errors)
    }
}

/// Builds the schema of a single service. Extensions of types defined elsewhere are adopted as
/// definitions; anything else the builder rejects is reported.
fn build_service_schema(service: &ServiceDefinition, errors: &mut Vec<CompositionError>) -> Schema {
    let mut document = ast::Document::new();
    document.sources = service.type_defs.sources.clone();
    document.definitions.extend(federation_directive_definitions());
    document.definitions.extend(
        service
            .type_defs
            .definitions
            .iter()
            .filter(|definition| {
                !matches!(definition, Definition::DirectiveDefinition(directive) if is_federation_directive(&directive.name))
            })
            .cloned(),
    );
    match Schema::builder()
        .adopt_orphan_extensions()
        .add_ast(&document)
        .build()
    {
        Ok(schema) => schema,
        Err(WithErrors { partial, errors: diagnostics }) => {
            errors.extend(CompositionError::from_diagnostics(&diagnostics));
            partial
        }
    }
}

struct KeyWalker<'a> {
    schema: &'a Schema,
    service: &'a ServiceDefinition,
    errors: &'a mut Vec<CompositionError>,
}

impl KeyWalker<'_> {
    fn sources(&self) -> &SourceMap {
        &self.service.type_defs.sources
    }

    fn visit(&mut self, parent_type: &str, field_set: &FieldSet, key: &Node<ast::Directive>) {
        let schema = self.schema;
        let fields = match schema.types.get(parent_type) {
            Some(ExtendedType::Object(object)) => Some(&object.fields),
            Some(ExtendedType::Interface(interface)) => Some(&interface.fields),
            Some(ExtendedType::Union(_)) => None,
            _ => return,
        };
        for selection in field_set.iter() {
            let Some(field) = fields.and_then(|fields| fields.get(selection.field_name.as_str())) else {
                let error = CompositionError::new(
                    ErrorCode::KeyFieldsMissingExternal,
                    format!(
                        "{}A @key directive specifies a field which is not found in this service. Add a field to this type with @external.",
                        log_service_and_type(&self.service.name, parent_type, None),
                    ),
                )
                .with_location(key.location(), self.sources());
                self.errors.push(error);
                continue;
            };
            if !field.directives.iter().any(|d| d.name == EXTERNAL_DIRECTIVE_NAME) {
                let error = CompositionError::new(
                    ErrorCode::KeyFieldsMissingExternal,
                    format!(
                        "{}A @key directive specifies the `{}` field which has no matching @external field.",
                        log_service_and_type(&self.service.name, parent_type, None),
                        field.name,
                    ),
                )
                .with_location(field.node.location(), self.sources());
                self.errors.push(error);
            }
            if let Some(subselections) = &selection.subselections {
                let return_type = field.ty.inner_named_type().clone();
                self.visit(&return_type, subselections, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::normalize::normalize_type_defs;

    fn messages(sdl: &str) -> Vec<String> {
        let service = ServiceDefinition::parse("serviceA", sdl).unwrap();
        let service = service.with_type_defs(normalize_type_defs(&service.type_defs));
        KeyFieldsMissingExternal
            .validate(&service)
            .unwrap()
            .into_iter()
            .map(|error| error.to_string())
            .collect()
    }

    #[test]
    fn accepts_external_key_fields() {
        assert!(
            messages(
                r#"
                extend type Product @key(fields: "sku color { id }") {
                  sku: String! @external
                  color: Color @external
                  price: Int
                }
                extend type Color { id: ID! @external }
                "#
            )
            .is_empty()
        );
    }

    #[test]
    fn reports_missing_and_non_external_key_fields() {
        assert_eq!(
            messages(
                r#"
                extend type Product @key(fields: "sku upc color { id value }") {
                  sku: String! @external
                  color: Color @external
                }
                type Color { id: ID! }
                "#
            ),
            [
                "KEY_FIELDS_MISSING_EXTERNAL: [serviceA] Product -> A @key directive specifies a field which is not found in this service. Add a field to this type with @external.",
                "KEY_FIELDS_MISSING_EXTERNAL: [serviceA] Color -> A @key directive specifies the `id` field which has no matching @external field.",
                "KEY_FIELDS_MISSING_EXTERNAL: [serviceA] Color -> A @key directive specifies a field which is not found in this service. Add a field to this type with @external.",
            ]
        );
    }

    #[test]
    fn checks_types_marked_with_extends() {
        assert_eq!(
            messages(r#"type Product @extends @key(fields: "upc") { upc: String! }"#),
            ["KEY_FIELDS_MISSING_EXTERNAL: [serviceA] Product -> A @key directive specifies the `upc` field which has no matching @external field."]
        );
    }

    #[test]
    fn ignores_keys_on_base_types() {
        assert!(messages(r#"type Product @key(fields: "upc") { sku: String! }"#).is_empty());
    }
}
