//! Checks of the composed schema and its federation metadata.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;

use crate::compose::ComposedSchema;
use crate::directives::DirectiveApplications;
use crate::directives::fields_argument;
use crate::error::CompositionError;
use crate::error::FederationError;
use crate::field_set::FieldSet;

mod executable_directives;
mod external;
mod key_fields;
mod keys_match_base_service;
mod provides;
mod requires;

pub(crate) use executable_directives::ExecutableDirectivesIdentical;
pub(crate) use executable_directives::ExecutableDirectivesInAllServices;
pub(crate) use executable_directives::ExecutableDirectivesOnly;
pub(crate) use external::ExternalMissingOnBase;
pub(crate) use external::ExternalTypeMismatch;
pub(crate) use external::ExternalUnused;
pub(crate) use key_fields::KeyFieldsMissingOnBase;
pub(crate) use key_fields::KeyFieldsSelectInvalidType;
pub(crate) use keys_match_base_service::KeySelectionSetsDeclared;
pub(crate) use keys_match_base_service::KeysMatchBaseService;
pub(crate) use provides::ProvidesFieldsMissingExternal;
pub(crate) use provides::ProvidesFieldsSelectInvalidType;
pub(crate) use provides::ProvidesNotOnEntity;
pub(crate) use requires::RequiresFieldsMissingExternal;
pub(crate) use requires::RequiresFieldsMissingOnBase;

fn object_types(schema: &Schema) -> impl Iterator<Item = (&Name, &Node<ObjectType>)> {
    schema.types.iter().filter_map(|(name, ty)| match ty {
        ExtendedType::Object(object) => Some((name, object)),
        _ => None,
    })
}

/// Parses the `fields` argument of every application of `directive_name`.
fn parsed_field_sets(
    node: &impl DirectiveApplications,
    directive_name: &str,
) -> Result<Vec<FieldSet>, FederationError> {
    node.directives_named(directive_name)
        .into_iter()
        .filter_map(fields_argument)
        .map(FieldSet::parse)
        .collect()
}

/// Attaches every location to `error`, resolved against the composed schema's sources.
fn located(
    composed: &ComposedSchema,
    error: CompositionError,
    locations: impl IntoIterator<Item = Option<SourceSpan>>,
) -> CompositionError {
    locations.into_iter().fold(error, |error, location| {
        error.with_location(location, &composed.schema.sources)
    })
}

/// Named types a field may not return when selected by a `@key` or `@provides`.
enum AbstractType {
    Interface,
    Union,
}

fn abstract_type(schema: &Schema, ty: &ast::Type) -> Option<AbstractType> {
    if ty.is_list() {
        return None;
    }
    match schema.types.get(ty.inner_named_type()) {
        Some(ExtendedType::Interface(_)) => Some(AbstractType::Interface),
        Some(ExtendedType::Union(_)) => Some(AbstractType::Union),
        _ => None,
    }
}

#[cfg(test)]
mod test_helpers {
    use crate::compose::ComposedSchema;
    use crate::compose::compose_services;
    use crate::normalize::normalize_type_defs;
    use crate::service::ServiceDefinition;
    use crate::validate::PostCompositionValidator;

    /// Normalizes and composes the services, then runs a single rule on the result.
    pub(super) fn run(validator: &dyn PostCompositionValidator, services: &[(&str, &str)]) -> Vec<String> {
        let composed = compose(services);
        validator
            .validate(&composed)
            .unwrap()
            .into_iter()
            .map(|error| error.to_string())
            .collect()
    }

    pub(super) fn compose(services: &[(&str, &str)]) -> ComposedSchema {
        let services: Vec<ServiceDefinition> = services
            .iter()
            .map(|(name, sdl)| {
                let service = ServiceDefinition::parse(*name, sdl).unwrap();
                service.with_type_defs(normalize_type_defs(&service.type_defs))
            })
            .collect();
        compose_services(&services).unwrap().schema
    }
}
