use apollo_compiler::Name;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use itertools::Itertools;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::compose::maps::ServiceNode;
use crate::compose::type_diff::diff_type_nodes;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;

/// Unions defined by several services must have the same members.
pub(crate) struct UniqueUnionTypes;

impl SdlValidator for UniqueUnionTypes {
    fn name(&self) -> &'static str {
        "UniqueUnionTypes"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let mut errors = Vec::new();
        let mut known_unions: IndexMap<&Name, &ServiceNode> = IndexMap::default();
        for node in context.nodes.iter().copied() {
            let Definition::UnionTypeDefinition(union_) = &node.definition else {
                continue;
            };
            let duplicate = context
                .existing_types
                .get(&union_.name)
                .or_else(|| known_unions.get(&union_.name).copied());
            let Some(duplicate) = duplicate else {
                known_unions.insert(&union_.name, node);
                continue;
            };
            let diff = diff_type_nodes(&node.definition, &duplicate.definition);
            if diff.union_types.is_empty() {
                continue;
            }
            let (plural, verb) = if diff.union_types.len() > 1 { ("s", "are") } else { ("", "is") };
            errors.push(context.error_at(
                CompositionError::new(
                    ErrorCode::ValueTypeUnionTypesMismatch,
                    format!(
                        "{}The union `{}` is defined in services `{}` and `{}`, however their types do not match. Union types with the same name must also consist of identical types. The type{plural} {} {verb} mismatched.",
                        log_service_and_type(duplicate.service_name(), &union_.name, None),
                        union_.name,
                        duplicate.service_name(),
                        node.service_name(),
                        diff.union_types.iter().join(", "),
                    ),
                ),
                &[node, duplicate],
            ));
        }
        errors
    }
}
