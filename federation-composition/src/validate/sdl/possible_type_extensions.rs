use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::compose::maps::ServiceNode;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;
use crate::utils::DefinitionExt;

/// Every extension needs a base definition of the matching kind somewhere.
pub(crate) struct PossibleTypeExtensions;

impl SdlValidator for PossibleTypeExtensions {
    fn name(&self) -> &'static str {
        "PossibleTypeExtensions"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let defined_types: IndexMap<&Name, &ServiceNode> = context
            .nodes
            .iter()
            .copied()
            .filter(|node| node.definition.is_type_definition())
            .filter_map(|node| Some((node.definition.type_name()?, node)))
            .collect();

        let mut errors = Vec::new();
        for node in context.nodes.iter().copied() {
            if !node.definition.is_type_extension() {
                continue;
            }
            let (Some(type_name), Some(kind), Some(service_name)) = (
                node.definition.type_name(),
                node.definition.type_kind(),
                node.service_name.as_deref(),
            ) else {
                continue;
            };
            let base = defined_types
                .get(type_name)
                .copied()
                .or_else(|| context.existing_types.get(type_name));
            let Some(base_kind) = base.and_then(|base| base.definition.type_kind()) else {
                errors.push(context.error_at(
                    CompositionError::new(
                        ErrorCode::ExtensionWithNoBase,
                        format!(
                            "{}`{type_name}` is an extension type, but `{type_name}` is not defined in any service",
                            log_service_and_type(service_name, type_name, None),
                        ),
                    ),
                    &[node],
                ));
                continue;
            };
            if base_kind != kind {
                errors.push(context.error_at(
                    CompositionError::new(
                        ErrorCode::ExtensionOfWrongKind,
                        format!(
                            "{}`{type_name}` was originally defined as a {} and can only be extended by a {}. {service_name} extends {type_name} with a {}",
                            log_service_and_type(service_name, type_name, None),
                            base_kind.definition_kind_name(),
                            base_kind.extension_kind_name(),
                            node.definition.kind_name(),
                        ),
                    ),
                    &[node],
                ));
            }
        }
        errors
    }
}
