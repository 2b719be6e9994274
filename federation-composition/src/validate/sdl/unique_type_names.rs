use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::compose::maps::ServiceNode;
use crate::compose::type_diff::diff_type_nodes;
use crate::directives::DirectiveApplications;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::log_service_and_type;
use crate::utils::DefinitionExt;

/// A type name may be defined by several services only when every definition has the same kind
/// and the same fields, and none of them is an entity. Such types are value types.
pub(crate) struct UniqueTypeNamesWithFields;

impl SdlValidator for UniqueTypeNamesWithFields {
    fn name(&self) -> &'static str {
        "UniqueTypeNamesWithFields"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let mut errors = Vec::new();
        let mut known_types: IndexMap<&Name, &ServiceNode> = IndexMap::default();
        for node in context.nodes.iter().copied() {
            if !node.definition.is_type_definition() {
                continue;
            }
            let Some(type_name) = node.definition.type_name() else {
                continue;
            };
            let from_schema = context.existing_types.get(type_name);
            let Some(duplicate) = from_schema.or_else(|| known_types.get(type_name).copied()) else {
                known_types.insert(type_name, node);
                continue;
            };
            if let Some(value_type_errors) = check_value_type(context, type_name, node, duplicate) {
                errors.extend(value_type_errors);
                continue;
            }
            let message = if from_schema.is_some() {
                format!(
                    "Type \"{type_name}\" already exists in the schema. It cannot also be defined in this type definition."
                )
            } else {
                format!("There can be only one type named \"{type_name}\".")
            };
            errors.push(context.error_at(
                CompositionError::new(ErrorCode::DuplicateTypeName, message),
                &[duplicate, node],
            ));
        }
        errors
    }
}

fn is_entity(node: &ServiceNode) -> bool {
    node.definition
        .type_directives()
        .is_some_and(|directives| directives.has_directive(&KEY_DIRECTIVE_NAME))
}

/// Returns `None` when the two definitions do not even have the same shape, in which case they
/// are plain duplicates.
fn check_value_type(
    context: &SdlValidationContext,
    type_name: &Name,
    node: &ServiceNode,
    duplicate: &ServiceNode,
) -> Option<Vec<CompositionError>> {
    let diff = diff_type_nodes(&node.definition, &duplicate.definition);
    let (node_service, duplicate_service) = (node.service_name(), duplicate.service_name());
    let prefix = log_service_and_type(duplicate_service, type_name, None);
    let located = |code: ErrorCode, message: String| context.error_at(CompositionError::new(code, message), &[node, duplicate]);

    if let Some((kind, other_kind)) = diff.kind {
        return Some(vec![located(
            ErrorCode::ValueTypeKindMismatch,
            format!(
                "{prefix}Found kind mismatch on expected value type belonging to services `{duplicate_service}` and `{node_service}`. `{type_name}` is defined as both a `{kind}` and a `{other_kind}`. In order to define `{type_name}` in multiple places, the kinds must be identical."
            ),
        )]);
    }

    if !diff.has_same_field_shape() {
        return None;
    }

    let mut errors = Vec::new();
    for (field_name, types) in &diff.fields {
        let [node_type, duplicate_type] = types.as_slice() else {
            continue;
        };
        errors.push(located(
            ErrorCode::ValueTypeFieldTypeMismatch,
            format!(
                "{}A field was defined differently in different services. `{duplicate_service}` and `{node_service}` define `{type_name}.{field_name}` as a {duplicate_type} and {node_type} respectively. In order to define `{type_name}` in multiple places, the fields and their types must be identical.",
                log_service_and_type(duplicate_service, type_name, Some(field_name)),
            ),
        ));
    }
    for (input_name, types) in &diff.input_values {
        let mismatch = match types.as_slice() {
            [node_type, duplicate_type] => format!(
                "`{duplicate_service}` and `{node_service}` define `{type_name}.{input_name}` as a {duplicate_type} and {node_type} respectively."
            ),
            _ => format!(
                "`{type_name}.{input_name}` is only defined in one of `{duplicate_service}` and `{node_service}`."
            ),
        };
        errors.push(located(
            ErrorCode::ValueTypeInputValueMismatch,
            format!(
                "{prefix}An input value was defined differently in different services. {mismatch} In order to define `{type_name}` in multiple places, the input values and their types must be identical."
            ),
        ));
    }
    if is_entity(node) || is_entity(duplicate) {
        let entity = if is_entity(duplicate) { duplicate } else { node };
        errors.push(located(
            ErrorCode::ValueTypeNoEntity,
            format!(
                "{}Value types cannot be entities (using the `@key` directive). Please ensure that the `{type_name}` type is extended properly or remove the `@key` directive if this is not an entity.",
                log_service_and_type(entity.service_name(), type_name, None),
            ),
        ));
    }
    Some(errors)
}
