use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexSet;

use super::SdlValidationContext;
use super::SdlValidator;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::utils::DefinitionExt;

const BUILT_IN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Every type referenced by a field, argument, interface list or union must be defined.
pub(crate) struct KnownTypeNames;

fn input_value_types(values: &[Node<ast::InputValueDefinition>]) -> impl Iterator<Item = &Name> {
    values.iter().map(|value| value.ty.inner_named_type())
}

fn field_types(fields: &[Node<ast::FieldDefinition>]) -> impl Iterator<Item = &Name> {
    fields.iter().flat_map(|field| {
        std::iter::once(field.ty.inner_named_type()).chain(input_value_types(&field.arguments))
    })
}

fn referenced_types(definition: &Definition) -> Vec<&Name> {
    let mut referenced = Vec::new();
    match definition {
        Definition::ObjectTypeDefinition(object) => {
            referenced.extend(field_types(&object.fields));
            referenced.extend(&object.implements_interfaces);
        }
        Definition::ObjectTypeExtension(object) => {
            referenced.extend(field_types(&object.fields));
            referenced.extend(&object.implements_interfaces);
        }
        Definition::InterfaceTypeDefinition(interface) => {
            referenced.extend(field_types(&interface.fields));
            referenced.extend(&interface.implements_interfaces);
        }
        Definition::InterfaceTypeExtension(interface) => {
            referenced.extend(field_types(&interface.fields));
            referenced.extend(&interface.implements_interfaces);
        }
        Definition::UnionTypeDefinition(union_) => referenced.extend(&union_.members),
        Definition::UnionTypeExtension(union_) => referenced.extend(&union_.members),
        Definition::InputObjectTypeDefinition(input) => referenced.extend(input_value_types(&input.fields)),
        Definition::InputObjectTypeExtension(input) => referenced.extend(input_value_types(&input.fields)),
        _ => {}
    }
    referenced
}

impl SdlValidator for KnownTypeNames {
    fn name(&self) -> &'static str {
        "KnownTypeNames"
    }

    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError> {
        let defined: IndexSet<&Name> = context
            .nodes
            .iter()
            .filter(|node| node.definition.is_type_definition())
            .filter_map(|node| node.definition.type_name())
            .chain(context.existing_types.keys())
            .collect();

        let mut errors = Vec::new();
        for node in context.nodes.iter().copied() {
            for type_name in referenced_types(&node.definition) {
                if defined.contains(type_name) || BUILT_IN_SCALARS.contains(&type_name.as_str()) {
                    continue;
                }
                errors.push(context.error_at(
                    CompositionError::new(ErrorCode::InvalidGraphql, format!("Unknown type \"{type_name}\".")),
                    &[node],
                ));
            }
        }
        errors
    }
}
