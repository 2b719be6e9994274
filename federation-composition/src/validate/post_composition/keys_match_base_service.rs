use apollo_compiler::collections::IndexMap;
use itertools::Itertools;

use super::object_types;
use crate::compose::ComposedSchema;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::field_set::FieldSet;
use crate::utils::DefinitionExt;
use crate::validate::PostCompositionValidator;

/// Entities with an owning service, their owner and every service's keys.
fn entities(composed: &ComposedSchema) -> impl Iterator<Item = (&str, &str, &IndexMap<String, Vec<FieldSet>>)> {
    object_types(&composed.schema).filter_map(|(type_name, _)| {
        let metadata = composed.type_metadata(type_name)?;
        let owner = metadata.service_name.as_deref()?;
        let keys = metadata.keys.as_ref()?;
        Some((type_name.as_str(), owner, keys))
    })
}

/// Points a finding at the definition of `type_name` in the service that wrote it.
fn at_type_in_service(
    composed: &ComposedSchema,
    error: CompositionError,
    service_name: &str,
    type_name: &str,
) -> CompositionError {
    let Some(service) = composed.service_list.iter().find(|service| service.name == service_name) else {
        return error;
    };
    let definition = service
        .type_defs
        .definitions
        .iter()
        .find(|definition| definition.type_name().is_some_and(|name| name.as_str() == type_name));
    match definition {
        Some(definition) => error.with_location(definition.location(), &service.type_defs.sources),
        None => error,
    }
}

fn printed_keys<'a>(keys: impl IntoIterator<Item = &'a FieldSet>) -> String {
    keys.into_iter()
        .map(|key| format!("\t@key(fields: \"{key}\")"))
        .join("\n")
}

/// Entities need keys on their base definition, and each extension may use exactly one of them.
pub(crate) struct KeysMatchBaseService;

impl PostCompositionValidator for KeysMatchBaseService {
    fn name(&self) -> &'static str {
        "keysMatchBaseService"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, owner, keys) in entities(composed) {
            let Some(owner_keys) = keys.get(owner) else {
                let error = CompositionError::new(
                    ErrorCode::KeyMissingOnBase,
                    format!(
                        "{}appears to be an entity but no @key directives are specified on the originating type.",
                        log_service_and_type(owner, type_name, None),
                    ),
                );
                errors.push(at_type_in_service(composed, error, owner, type_name));
                continue;
            };
            let available: Vec<String> = owner_keys.iter().map(|key| key.to_string()).collect();

            for (service_name, service_keys) in keys {
                if service_name == owner {
                    continue;
                }
                if service_keys.len() > 1 {
                    let error = CompositionError::new(
                        ErrorCode::MultipleKeysOnExtension,
                        format!(
                            "{}is extended from service {owner} but specifies multiple @key directives. Extensions may only specify one @key.",
                            log_service_and_type(service_name, type_name, None),
                        ),
                    );
                    errors.push(at_type_in_service(composed, error, service_name, type_name));
                }
                let Some(extension_key) = service_keys.first() else {
                    continue;
                };
                if available.contains(&extension_key.to_string()) {
                    continue;
                }
                let error = CompositionError::new(
                    ErrorCode::KeyNotSpecified,
                    format!(
                        "{}extends from {owner} but specifies an invalid @key directive. Valid @key directives are specified by the originating type. Available @key directives for this type are:\n{}",
                        log_service_and_type(service_name, type_name, None),
                        printed_keys(owner_keys),
                    ),
                );
                errors.push(at_type_in_service(composed, error, service_name, type_name));
            }
        }
        Ok(errors)
    }
}

/// Every `@key` an extending service declares must select the same fields as one of the owning
/// service's keys, irrespective of selection order.
pub(crate) struct KeySelectionSetsDeclared;

impl PostCompositionValidator for KeySelectionSetsDeclared {
    fn name(&self) -> &'static str {
        "keySelectionSetsDeclared"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, owner, keys) in entities(composed) {
            let Some(owner_keys) = keys.get(owner) else {
                continue;
            };
            for (service_name, service_keys) in keys {
                if service_name == owner {
                    continue;
                }
                for key in service_keys {
                    if owner_keys.iter().any(|owner_key| owner_key.is_equivalent(key)) {
                        continue;
                    }
                    let error = CompositionError::new(
                        ErrorCode::KeyNotDeclared,
                        format!(
                            "{}declares @key(fields: \"{key}\"), which selects different fields than every @key declared by {owner}. Keys declared by {owner} are:\n{}",
                            log_service_and_type(service_name, type_name, None),
                            printed_keys(owner_keys),
                        ),
                    );
                    errors.push(at_type_in_service(composed, error, service_name, type_name));
                }
            }
        }
        Ok(errors)
    }
}
