use std::collections::HashSet;

use apollo_compiler::Name;
use apollo_compiler::ast::Definition;

use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::service::ServiceDefinition;
use crate::validate::PreCompositionValidator;

/// Enums and scalars may be defined only once per service. Across services they are merged.
pub(crate) struct DuplicateEnumOrScalar;

impl PreCompositionValidator for DuplicateEnumOrScalar {
    fn name(&self) -> &'static str {
        "duplicateEnumOrScalar"
    }

    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        let mut enums: HashSet<&Name> = HashSet::new();
        let mut scalars: HashSet<&Name> = HashSet::new();
        for definition in &service.type_defs.definitions {
            let (name, seen, code, kind) = match definition {
                Definition::EnumTypeDefinition(enum_) => {
                    (&enum_.name, &mut enums, ErrorCode::DuplicateEnumDefinition, "enum")
                }
                Definition::ScalarTypeDefinition(scalar) => (
                    &scalar.name,
                    &mut scalars,
                    ErrorCode::DuplicateScalarDefinition,
                    "scalar",
                ),
                _ => continue,
            };
            if seen.insert(name) {
                continue;
            }
            errors.push(
                CompositionError::new(
                    code,
                    format!(
                        "{}The {kind}, `{name}` was defined multiple times in this service. Remove one of the definitions for `{name}`",
                        log_service_and_type(&service.name, name, None),
                    ),
                )
                .with_location(definition.location(), &service.type_defs.sources),
            );
        }
        Ok(errors)
    }
}
