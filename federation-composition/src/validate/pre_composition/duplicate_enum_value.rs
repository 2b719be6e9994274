use apollo_compiler::Name;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;

use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::service::ServiceDefinition;
use crate::validate::PreCompositionValidator;

/// An enum value may be declared only once across an enum's definition and extensions within a
/// service.
pub(crate) struct DuplicateEnumValue;

impl PreCompositionValidator for DuplicateEnumValue {
    fn name(&self) -> &'static str {
        "duplicateEnumValue"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        let mut enums: IndexMap<&Name, Vec<&Name>> = IndexMap::default();
        for definition in &service.type_defs.definitions {
            let (name, values) = match definition {
                Definition::EnumTypeDefinition(enum_) => (&enum_.name, &enum_.values),
                Definition::EnumTypeExtension(enum_) => (&enum_.name, &enum_.values),
                _ => continue,
            };
            let Some(known_values) = enums.get_mut(name).filter(|known| !known.is_empty()) else {
                enums.insert(name, values.iter().map(|value| &value.value).collect());
                continue;
            };
            for value in values {
                if !known_values.contains(&&value.value) {
                    known_values.push(&value.value);
                    continue;
                }
                errors.push(
                    CompositionError::new(
                        ErrorCode::DuplicateEnumValue,
                        format!(
                            "{}The enum, `{name}` has multiple definitions of the `{}` value.",
                            log_service_and_type(&service.name, name, Some(&value.value)),
                            value.value,
                        ),
                    )
                    .with_location(definition.location(), &service.type_defs.sources),
                );
            }
        }
        Ok(errors)
    }
}
