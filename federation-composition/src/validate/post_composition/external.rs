use apollo_compiler::Name;
use apollo_compiler::Schema;

use super::located;
use super::object_types;
use super::parsed_field_sets;
use crate::compose::ComposedSchema;
use crate::directives::EXTERNAL_DIRECTIVE_NAME;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::directives::PROVIDES_DIRECTIVE_NAME;
use crate::directives::REQUIRES_DIRECTIVE_NAME;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::field_set::selection_includes_field;
use crate::validate::PostCompositionValidator;

/// Every `@external` field must be selected by some `@key`, `@provides` or `@requires`.
pub(crate) struct ExternalUnused;

impl ExternalUnused {
    fn is_used(schema: &Schema, type_name: &Name, field_name: &str) -> Result<bool, FederationError> {
        if let Some(object) = schema.get_object(type_name) {
            for key in parsed_field_sets(&object.directives, &KEY_DIRECTIVE_NAME)? {
                if key.selects(field_name) {
                    return Ok(true);
                }
            }
        }

        for (parent_name, parent) in object_types(schema) {
            for field in parent.fields.values() {
                if field.ty.inner_named_type() == type_name {
                    for provides in parsed_field_sets(&field.directives, &PROVIDES_DIRECTIVE_NAME)? {
                        if selection_includes_field(schema, &provides, type_name, type_name, field_name) {
                            return Ok(true);
                        }
                    }
                }
                for requires in parsed_field_sets(&field.directives, &REQUIRES_DIRECTIVE_NAME)? {
                    if selection_includes_field(schema, &requires, parent_name, type_name, field_name) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}

impl PostCompositionValidator for ExternalUnused {
    fn name(&self) -> &'static str {
        "externalUnused"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, metadata) in &composed.metadata.types {
            for (service_name, externals) in &metadata.externals {
                for external in externals {
                    if Self::is_used(&composed.schema, type_name, &external.field.name)? {
                        continue;
                    }
                    let error = CompositionError::new(
                        ErrorCode::ExternalUnused,
                        format!(
                            "{}is marked as @external but is not used by a @requires, @key, or @provides directive.",
                            log_service_and_type(service_name, type_name, Some(&external.field.name)),
                        ),
                    );
                    let location = external
                        .field
                        .directives
                        .get_all(&EXTERNAL_DIRECTIVE_NAME)
                        .next()
                        .and_then(|directive| directive.location());
                    errors.push(located(composed, error, [location]));
                }
            }
        }
        Ok(errors)
    }
}

/// An `@external` field must exist on the base definition of its type, in the owning service.
pub(crate) struct ExternalMissingOnBase;

impl PostCompositionValidator for ExternalMissingOnBase {
    fn name(&self) -> &'static str {
        "externalMissingOnBase"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, metadata) in &composed.metadata.types {
            let Some(object) = composed.schema.get_object(type_name) else {
                continue;
            };
            let owner = metadata.service_name.as_deref().unwrap_or("null");
            for (service_name, externals) in &metadata.externals {
                for external in externals {
                    let field_name = &external.field.name;
                    let prefix = log_service_and_type(service_name, type_name, Some(field_name));
                    let message = if !object.fields.contains_key(field_name) {
                        format!(
                            "{prefix}marked @external but {field_name} is not defined on the base service of {type_name} ({owner})"
                        )
                    } else if let Some(extending_service) = composed
                        .field_metadata(type_name, field_name)
                        .and_then(|field| field.service_name.as_deref())
                    {
                        format!(
                            "{prefix}marked @external but {field_name} was defined in {extending_service}, not in the service that owns {type_name} ({owner})"
                        )
                    } else {
                        continue;
                    };
                    let error = CompositionError::new(ErrorCode::ExternalMissingOnBase, message);
                    errors.push(located(composed, error, [external.field.location()]));
                }
            }
        }
        Ok(errors)
    }
}

/// An `@external` field must have the same type as the field it stands for.
pub(crate) struct ExternalTypeMismatch;

impl PostCompositionValidator for ExternalTypeMismatch {
    fn name(&self) -> &'static str {
        "externalTypeMismatch"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, metadata) in &composed.metadata.types {
            let Some(object) = composed.schema.get_object(type_name) else {
                continue;
            };
            let owner = metadata.service_name.as_deref().unwrap_or("null");
            for (service_name, externals) in &metadata.externals {
                for external in externals {
                    let field_name = &external.field.name;
                    let external_type = &external.field.ty;
                    let prefix = log_service_and_type(service_name, type_name, Some(field_name));
                    let message = if !composed.schema.types.contains_key(external_type.inner_named_type()) {
                        format!(
                            "{prefix}the type of the @external field does not exist in the resulting composed schema"
                        )
                    } else {
                        match object.fields.get(field_name) {
                            Some(base_field) if base_field.ty != *external_type => format!(
                                "{prefix}Type `{external_type}` does not match the type of the original field in {owner} (`{}`)",
                                base_field.ty,
                            ),
                            _ => continue,
                        }
                    };
                    let error = CompositionError::new(ErrorCode::ExternalTypeMismatch, message);
                    errors.push(located(composed, error, [external.field.location()]));
                }
            }
        }
        Ok(errors)
    }
}
