//! Checks run on each normalized service on its own, before any merging.

use apollo_compiler::ast::Definition;

use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;
use crate::service::ServiceDefinition;

mod directives_used_on_base;
mod duplicate_enum_or_scalar;
mod duplicate_enum_value;
mod key_fields_missing_external;
mod reserved_field_used;

pub(crate) use directives_used_on_base::ExternalUsedOnBase;
pub(crate) use directives_used_on_base::RequiresUsedOnBase;
pub(crate) use duplicate_enum_or_scalar::DuplicateEnumOrScalar;
pub(crate) use duplicate_enum_value::DuplicateEnumValue;
pub(crate) use key_fields_missing_external::KeyFieldsMissingExternal;
pub(crate) use reserved_field_used::ReservedFieldUsed;

/// Reports every application of `directive_name` on a field of a base object type.
fn fields_of_base_types_using(
    service: &ServiceDefinition,
    directive_name: &str,
    code: ErrorCode,
) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for definition in &service.type_defs.definitions {
        let Definition::ObjectTypeDefinition(object) = definition else {
            continue;
        };
        for field in &object.fields {
            for directive in field.directives.get_all(directive_name) {
                errors.push(
                    CompositionError::new(
                        code,
                        format!(
                            "{}Found extraneous @{directive_name} directive. @{directive_name} cannot be used on base types.",
                            log_service_and_type(&service.name, &object.name, Some(&field.name)),
                        ),
                    )
                    .with_location(directive.location(), &service.type_defs.sources),
                );
            }
        }
    }
    errors
}
