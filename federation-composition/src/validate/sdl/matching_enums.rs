use apollo_compiler::Name;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use itertools::Itertools;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::compose::maps::ServiceNode;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;
use crate::utils::DefinitionExt;

/// Enums defined by several services must have the same values everywhere, and a name used for
/// an enum in one service must be an enum in all of them.
pub(crate) struct MatchingEnums;

impl SdlValidator for MatchingEnums {
    fn name(&self) -> &'static str {
        "MatchingEnums"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let mut definitions_by_name: IndexMap<&Name, Vec<&ServiceNode>> = IndexMap::default();
        for node in context.nodes.iter().copied() {
            if let (true, Some(type_name)) = (node.definition.is_type_definition(), node.definition.type_name()) {
                definitions_by_name.entry(type_name).or_default().push(node);
            }
        }

        let mut errors = Vec::new();
        for (type_name, nodes) in definitions_by_name {
            let is_enum = |node: &&ServiceNode| matches!(node.definition, Definition::EnumTypeDefinition(_));
            if nodes.iter().all(is_enum) {
                // sorted values -> services defining exactly those values
                let mut groups: IndexMap<Vec<&str>, Vec<&str>> = IndexMap::default();
                for node in &nodes {
                    let (Definition::EnumTypeDefinition(enum_), Some(service_name)) =
                        (&node.definition, node.service_name.as_deref())
                    else {
                        continue;
                    };
                    let values = enum_.values.iter().map(|value| value.value.as_str()).sorted().collect();
                    groups.entry(values).or_default().push(service_name);
                }
                if groups.len() > 1 {
                    let groups = groups
                        .values()
                        .map(|services| format!("[{}]", services.join(", ")))
                        .join(", ");
                    errors.push(context.error_at(
                        CompositionError::new(
                            ErrorCode::EnumMismatch,
                            format!(
                                "The `{type_name}` enum does not have identical values in all services. Groups of services with identical values are: {groups}"
                            ),
                        ),
                        &nodes,
                    ));
                }
            } else if nodes.iter().any(is_enum) {
                let (with_enum, without_enum): (Vec<&ServiceNode>, Vec<&ServiceNode>) =
                    nodes.iter().copied().partition(is_enum);
                let with_enum: Vec<&str> = with_enum.iter().filter_map(|node| node.service_name.as_deref()).collect();
                let without_enum: Vec<&str> = without_enum.iter().map(|node| node.service_name()).collect();
                errors.push(context.error_at(
                    CompositionError::new(
                        ErrorCode::EnumMismatchType,
                        format!(
                            "{}`{type_name}` is an enum in [{}], but not in [{}]",
                            log_service_and_type(with_enum.first().copied().unwrap_or_default(), type_name, None),
                            with_enum.join(", "),
                            without_enum.join(", "),
                        ),
                    ),
                    &nodes,
                ));
            }
        }
        errors
    }
}
