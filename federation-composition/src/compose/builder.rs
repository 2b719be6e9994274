//! Builds the composed schema from partitioned definitions and extensions.
//!
//! Base definitions are validated and merged first, extensions second. Where services disagree,
//! the last declaration of a type, field or enum value wins; interfaces and union members are
//! collected from every declaration.

use std::collections::HashMap;

use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::validation::WithErrors;
use tracing::debug;

use crate::compose::maps::ServiceMaps;
use crate::compose::maps::ServiceNode;
use crate::directives::FEDERATION_DIRECTIVE_NAMES;
use crate::directives::federation_directive_definitions;
use crate::directives::is_federation_directive;
use crate::directives::is_specified_directive;
use crate::error::CompositionError;
use crate::utils::DefinitionExt;
use crate::validate::sdl::SdlValidationContext;
use crate::validate::sdl::validate_sdl;

const BUILT_IN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

pub(crate) struct BuiltSchema {
    pub(crate) schema: Schema,
    pub(crate) errors: Vec<CompositionError>,
}

#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "build_schema_from_definitions_and_extensions")
)]
pub(crate) fn build_schema_from_definitions_and_extensions(maps: &ServiceMaps) -> BuiltSchema {
    let merged_definitions = merge_definitions(maps);

    let no_types = IndexMap::default();
    let mut errors = validate_sdl(&SdlValidationContext {
        nodes: maps.type_definitions.values().flatten().collect(),
        existing_types: &no_types,
        sources: &maps.sources,
    });
    let definition_errors = errors.len();
    errors.extend(validate_sdl(&SdlValidationContext {
        nodes: maps.type_extensions.values().flatten().collect(),
        existing_types: &merged_definitions,
        sources: &maps.sources,
    }));
    debug!(
        definition_errors,
        extension_errors = errors.len() - definition_errors,
        "validated definitions and extensions"
    );

    let mut document = ast::Document::new();
    document.sources = maps.sources.clone();
    document.definitions.extend(federation_directive_definitions());
    for (directive_name, definitions) in &maps.directive_definitions {
        if is_federation_directive(directive_name) || is_specified_directive(directive_name) {
            continue;
        }
        if let Some(definition) = definitions.values().next() {
            document
                .definitions
                .push(Definition::DirectiveDefinition(definition.clone()));
        }
    }

    let mut pieces_by_type: IndexMap<&Name, Vec<Definition>> = IndexMap::default();
    for (type_name, node) in &merged_definitions {
        if BUILT_IN_SCALARS.contains(&type_name.as_str()) {
            continue;
        }
        pieces_by_type.insert(type_name, vec![node.definition.clone()]);
    }
    for (type_name, extensions) in &maps.type_extensions {
        let Some(pieces) = pieces_by_type.get_mut(type_name) else {
            continue;
        };
        let base_kind = pieces.first().and_then(|base| base.type_kind());
        pieces.extend(
            extensions
                .iter()
                .filter(|extension| extension.definition.type_kind() == base_kind)
                .map(|extension| extension.definition.clone()),
        );
    }
    for mut pieces in pieces_by_type.into_values() {
        keep_last_declarations(&mut pieces);
        document.definitions.extend(pieces);
    }

    let mut schema = match Schema::builder().add_ast(&document).build() {
        Ok(schema) => schema,
        Err(WithErrors { partial, errors: diagnostics }) => {
            errors.extend(CompositionError::from_diagnostics(&diagnostics));
            partial
        }
    };

    for directive_name in FEDERATION_DIRECTIVE_NAMES {
        schema.directive_definitions.shift_remove(&directive_name);
    }
    schema.types.sort_keys();

    BuiltSchema { schema, errors }
}

/// One definition per type name: the last one declared, implementing every interface any of the
/// declarations implements.
pub(crate) fn merge_definitions(maps: &ServiceMaps) -> IndexMap<Name, ServiceNode> {
    maps.type_definitions
        .iter()
        .filter_map(|(type_name, nodes)| {
            let mut merged = nodes.last()?.clone();
            let interfaces: IndexSet<Name> = nodes
                .iter()
                .flat_map(|node| implemented_interfaces(&node.definition))
                .cloned()
                .collect();
            match &mut merged.definition {
                Definition::ObjectTypeDefinition(object) => {
                    object.make_mut().implements_interfaces = interfaces.into_iter().collect();
                }
                Definition::InterfaceTypeDefinition(interface) => {
                    interface.make_mut().implements_interfaces = interfaces.into_iter().collect();
                }
                _ => {}
            }
            Some((type_name.clone(), merged))
        })
        .collect()
}

fn implemented_interfaces(definition: &Definition) -> &[Name] {
    match definition {
        Definition::ObjectTypeDefinition(object) => &object.implements_interfaces,
        Definition::ObjectTypeExtension(object) => &object.implements_interfaces,
        Definition::InterfaceTypeDefinition(interface) => &interface.implements_interfaces,
        Definition::InterfaceTypeExtension(interface) => &interface.implements_interfaces,
        _ => &[],
    }
}

/// Names of the fields, input fields or enum values a definition or extension declares.
fn declared_members(definition: &Definition) -> Vec<&Name> {
    match definition {
        Definition::EnumTypeDefinition(enum_) => enum_.values.iter().map(|v| &v.value).collect(),
        Definition::EnumTypeExtension(enum_) => enum_.values.iter().map(|v| &v.value).collect(),
        Definition::InputObjectTypeDefinition(input) => input.fields.iter().map(|f| &f.name).collect(),
        Definition::InputObjectTypeExtension(input) => input.fields.iter().map(|f| &f.name).collect(),
        other => other.field_definitions().iter().map(|f| &f.name).collect(),
    }
}

/// Given the definition of a type followed by its extensions, removes every member declared again
/// by a later piece, and every interface or union member already listed by an earlier piece.
fn keep_last_declarations(pieces: &mut [Definition]) {
    let mut last_declared: HashMap<Name, usize> = HashMap::new();
    for (index, piece) in pieces.iter().enumerate() {
        for member in declared_members(piece) {
            last_declared.insert(member.clone(), index);
        }
    }

    let mut listed: IndexSet<Name> = IndexSet::default();
    for (index, piece) in pieces.iter_mut().enumerate() {
        let keep = |name: &Name| last_declared.get(name) == Some(&index);
        let mut first_listing = |name: &Name| listed.insert(name.clone());
        match piece {
            Definition::ObjectTypeDefinition(object) => {
                let object = object.make_mut();
                object.fields.retain(|field| keep(&field.name));
                object.implements_interfaces.retain(|name| first_listing(name));
            }
            Definition::ObjectTypeExtension(object) => {
                let object = object.make_mut();
                object.fields.retain(|field| keep(&field.name));
                object.implements_interfaces.retain(|name| first_listing(name));
            }
            Definition::InterfaceTypeDefinition(interface) => {
                let interface = interface.make_mut();
                interface.fields.retain(|field| keep(&field.name));
                interface.implements_interfaces.retain(|name| first_listing(name));
            }
            Definition::InterfaceTypeExtension(interface) => {
                let interface = interface.make_mut();
                interface.fields.retain(|field| keep(&field.name));
                interface.implements_interfaces.retain(|name| first_listing(name));
            }
            Definition::UnionTypeDefinition(union_) => {
                union_.make_mut().members.retain(|name| first_listing(name));
            }
            Definition::UnionTypeExtension(union_) => {
                union_.make_mut().members.retain(|name| first_listing(name));
            }
            Definition::EnumTypeDefinition(enum_) => {
                enum_.make_mut().values.retain(|value| keep(&value.value));
            }
            Definition::EnumTypeExtension(enum_) => {
                enum_.make_mut().values.retain(|value| keep(&value.value));
            }
            Definition::InputObjectTypeDefinition(input) => {
                input.make_mut().fields.retain(|field| keep(&field.name));
            }
            Definition::InputObjectTypeExtension(input) => {
                input.make_mut().fields.retain(|field| keep(&field.name));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compose::maps::build_maps_from_service_list;
    use crate::error::ErrorCode;
    use crate::service::ServiceDefinition;

    fn build(services: &[(&str, &str)]) -> BuiltSchema {
        let services: Vec<ServiceDefinition> = services
            .iter()
            .map(|(name, sdl)| ServiceDefinition::parse(*name, sdl).unwrap())
            .collect();
        build_schema_from_definitions_and_extensions(&build_maps_from_service_list(&services).unwrap())
    }

    #[test]
    fn merges_definitions_and_extensions() {
        let built = build(&[
            ("a", "extend type Query { products: [Product] }\ntype Product { sku: String! }"),
            ("b", "extend type Product { price: Int }"),
        ]);
        assert!(built.errors.is_empty(), "{:?}", built.errors);
        let product = built.schema.get_object("Product").unwrap();
        assert_eq!(
            product.fields.keys().map(|f| f.as_str()).collect::<Vec<_>>(),
            ["sku", "price"]
        );
        assert!(!built.schema.directive_definitions.contains_key("key"));
        assert_eq!(
            built
                .schema
                .types
                .iter()
                .filter(|(_, ty)| !ty.is_built_in())
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>(),
            ["Product", "Query"]
        );
    }

    #[test]
    fn unions_interfaces_across_definitions() {
        let built = build(&[
            ("a", "interface Node { id: ID! }\ninterface Named { name: String }\ntype Color implements Node { id: ID! name: String }"),
            ("b", "type Color implements Named { id: ID! name: String }\nextend type Color implements Node"),
        ]);
        let color = built.schema.get_object("Color").unwrap();
        let interfaces: Vec<&str> = color.implements_interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(interfaces, ["Node", "Named"]);
    }

    #[test]
    fn later_declarations_win() {
        let built = build(&[
            ("a", "type Product { sku: String! name: String! }"),
            ("b", "type Product { id: ID! name: String! price: Int }"),
        ]);
        let product = built.schema.get_object("Product").unwrap();
        assert_eq!(
            product.fields.keys().map(|f| f.as_str()).collect::<Vec<_>>(),
            ["id", "name", "price"]
        );
        let codes: Vec<ErrorCode> = built.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, [ErrorCode::DuplicateTypeName, ErrorCode::DuplicateFieldName]);
    }

    #[test]
    fn drops_orphan_and_mismatched_extensions() {
        let built = build(&[
            ("a", "type Product { sku: String! }\nextend interface Product { id: ID }\nextend type Missing { id: ID }"),
        ]);
        assert!(built.schema.types.get("Missing").is_none());
        assert_eq!(built.schema.get_object("Product").unwrap().fields.len(), 1);
        let codes: Vec<ErrorCode> = built.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, [ErrorCode::ExtensionOfWrongKind, ErrorCode::ExtensionWithNoBase]);
    }
}
