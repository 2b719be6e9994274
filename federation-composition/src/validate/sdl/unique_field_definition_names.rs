use apollo_compiler::Name;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::compose::maps::ServiceNode;
use crate::compose::type_diff::diff_type_nodes;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::utils::DefinitionExt;

/// A field can only be introduced once per type, across definitions and extensions. Repeated
/// definitions of a value type are exempt.
pub(crate) struct UniqueFieldDefinitionNames;

fn declared_field_names(definition: &Definition) -> Vec<&Name> {
    match definition {
        Definition::InputObjectTypeDefinition(input) => input.fields.iter().map(|f| &f.name).collect(),
        Definition::InputObjectTypeExtension(input) => input.fields.iter().map(|f| &f.name).collect(),
        other => other.field_definitions().iter().map(|f| &f.name).collect(),
    }
}

fn has_checked_fields(definition: &Definition) -> bool {
    matches!(
        definition,
        Definition::ObjectTypeDefinition(_)
            | Definition::ObjectTypeExtension(_)
            | Definition::InterfaceTypeDefinition(_)
            | Definition::InterfaceTypeExtension(_)
            | Definition::InputObjectTypeDefinition(_)
            | Definition::InputObjectTypeExtension(_)
    )
}

impl SdlValidator for UniqueFieldDefinitionNames {
    fn name(&self) -> &'static str {
        "UniqueFieldDefinitionNames"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let mut errors = Vec::new();
        let mut known_field_names: IndexMap<&Name, IndexSet<&Name>> = IndexMap::default();
        let mut possible_value_types: IndexMap<&Name, &ServiceNode> = IndexMap::default();

        for node in context.nodes.iter().copied() {
            if !has_checked_fields(&node.definition) {
                continue;
            }
            let Some(type_name) = node.definition.type_name() else {
                continue;
            };
            let existing = context.existing_types.get(type_name);

            if node.definition.is_type_definition() {
                let duplicate = existing.or_else(|| possible_value_types.get(type_name).copied());
                match duplicate {
                    Some(duplicate)
                        if diff_type_nodes(&node.definition, &duplicate.definition).has_same_field_shape() =>
                    {
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        possible_value_types.insert(type_name, node);
                    }
                }
            }

            let existing_fields = existing.map(|existing| declared_field_names(&existing.definition));
            let field_names = known_field_names.entry(type_name).or_default();
            for field_name in declared_field_names(&node.definition) {
                let message = if existing_fields
                    .as_ref()
                    .is_some_and(|fields| fields.contains(&field_name))
                {
                    format!(
                        "Field \"{type_name}.{field_name}\" already exists in the schema. It cannot also be defined in this type extension."
                    )
                } else if !field_names.insert(field_name) {
                    format!("Field \"{type_name}.{field_name}\" can only be defined once.")
                } else {
                    continue;
                };
                errors.push(context.error_at(
                    CompositionError::new(ErrorCode::DuplicateFieldName, message),
                    &[node],
                ));
            }
        }
        errors
    }
}
