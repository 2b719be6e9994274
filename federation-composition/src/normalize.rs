//! Rewrites of a single service's SDL that make services comparable before composition.
//!
//! Every pass returns a new document. Definitions that are not rewritten are shared with the
//! input, and rewritten ones keep the source location of the node they replace.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::ast::OperationType;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::name;

use crate::directives::DirectiveApplications;
use crate::directives::EXTENDS_DIRECTIVE_NAME;
use crate::directives::is_federation_directive;

const DEFAULT_ROOT_OPERATION_NAMES: [Name; 3] =
    [name!("Query"), name!("Mutation"), name!("Subscription")];

const FEDERATION_SCALARS: [&str; 2] = ["_Any", "_FieldSet"];
const SERVICE_TYPE_NAME: &str = "_Service";
const ENTITY_UNION_NAME: &str = "_Entity";
const RESERVED_ROOT_FIELDS: [&str; 2] = ["_service", "_entities"];

pub(crate) fn default_root_operation_name(operation_type: OperationType) -> Name {
    match operation_type {
        OperationType::Query => name!("Query"),
        OperationType::Mutation => name!("Mutation"),
        OperationType::Subscription => name!("Subscription"),
    }
}

pub(crate) fn is_default_root_operation_name(name: &str) -> bool {
    DEFAULT_ROOT_OPERATION_NAMES.iter().any(|n| n == name)
}

/// Runs every normalization pass over a service's SDL, in order.
pub fn normalize_type_defs(type_defs: &ast::Document) -> ast::Document {
    let type_defs = replace_extended_definitions_with_extensions(type_defs);
    let type_defs = default_root_operation_types(&type_defs);
    strip_common_primitives(&type_defs)
}

fn with_definitions(document: &ast::Document, definitions: Vec<Definition>) -> ast::Document {
    let mut output = ast::Document::new();
    output.sources = document.sources.clone();
    output.definitions = definitions;
    output
}

fn without_directive(directives: &ast::DirectiveList, name: &str) -> ast::DirectiveList {
    ast::DirectiveList(
        directives
            .iter()
            .filter(|directive| directive.name != name)
            .cloned()
            .collect(),
    )
}

/// Object and interface definitions marked `@extends` become syntactic extensions, without the
/// `@extends` application.
pub fn replace_extended_definitions_with_extensions(type_defs: &ast::Document) -> ast::Document {
    let definitions = type_defs
        .definitions
        .iter()
        .map(|definition| match definition {
            Definition::ObjectTypeDefinition(object)
                if object.directives.has_directive(&EXTENDS_DIRECTIVE_NAME) =>
            {
                Definition::ObjectTypeExtension(object.same_location(ast::ObjectTypeExtension {
                    name: object.name.clone(),
                    implements_interfaces: object.implements_interfaces.clone(),
                    directives: without_directive(&object.directives, &EXTENDS_DIRECTIVE_NAME),
                    fields: object.fields.clone(),
                }))
            }
            Definition::InterfaceTypeDefinition(interface)
                if interface.directives.has_directive(&EXTENDS_DIRECTIVE_NAME) =>
            {
                Definition::InterfaceTypeExtension(interface.same_location(
                    ast::InterfaceTypeExtension {
                        name: interface.name.clone(),
                        implements_interfaces: interface.implements_interfaces.clone(),
                        directives: without_directive(
                            &interface.directives,
                            &EXTENDS_DIRECTIVE_NAME,
                        ),
                        fields: interface.fields.clone(),
                    },
                ))
            }
            other => other.clone(),
        })
        .collect();
    with_definitions(type_defs, definitions)
}

/// Renames custom root operation types to `Query`, `Mutation` and `Subscription` and turns root
/// type definitions into extensions. `schema` blocks are absorbed by the renaming and removed.
///
/// When a `schema` block maps an operation to a custom type, types using a default root name that
/// no operation maps to are dropped, as are fields returning them.
pub fn default_root_operation_types(type_defs: &ast::Document) -> ast::Document {
    // custom root type name -> default name
    let mut root_names: IndexMap<Name, Name> = IndexMap::default();
    for definition in &type_defs.definitions {
        let root_operations = match definition {
            Definition::SchemaDefinition(schema) => &schema.root_operations,
            Definition::SchemaExtension(schema) => &schema.root_operations,
            _ => continue,
        };
        for root_operation in root_operations {
            let (operation_type, type_name) = &**root_operation;
            root_names.insert(type_name.clone(), default_root_operation_name(*operation_type));
        }
    }

    let has_schema_block = !root_names.is_empty();
    let dropped: IndexSet<Name> = if has_schema_block {
        DEFAULT_ROOT_OPERATION_NAMES
            .into_iter()
            .filter(|name| !root_names.contains_key(name))
            .collect()
    } else {
        root_names = DEFAULT_ROOT_OPERATION_NAMES
            .into_iter()
            .map(|name| (name.clone(), name))
            .collect();
        IndexSet::default()
    };

    let rewriter = RootTypeRewriter {
        root_names: &root_names,
        dropped: &dropped,
    };
    let definitions = type_defs
        .definitions
        .iter()
        .filter_map(|definition| rewriter.rewrite(definition))
        .collect();
    with_definitions(type_defs, definitions)
}

struct RootTypeRewriter<'a> {
    root_names: &'a IndexMap<Name, Name>,
    dropped: &'a IndexSet<Name>,
}

impl RootTypeRewriter<'_> {
    fn rewrite(&self, definition: &Definition) -> Option<Definition> {
        let rewritten = match definition {
            Definition::SchemaDefinition(_) | Definition::SchemaExtension(_) => return None,
            Definition::ObjectTypeDefinition(object) => {
                if self.dropped.contains(&object.name) {
                    return None;
                }
                let fields = self.rewrite_fields(&object.fields);
                let implements_interfaces = self.rename_all(&object.implements_interfaces);
                match self.root_names.get(&object.name) {
                    Some(root_name) => {
                        Definition::ObjectTypeExtension(object.same_location(ast::ObjectTypeExtension {
                            name: root_name.clone(),
                            implements_interfaces,
                            directives: object.directives.clone(),
                            fields,
                        }))
                    }
                    None => {
                        let mut object = object.clone();
                        let object_mut = object.make_mut();
                        object_mut.fields = fields;
                        object_mut.implements_interfaces = implements_interfaces;
                        Definition::ObjectTypeDefinition(object)
                    }
                }
            }
            Definition::ObjectTypeExtension(object) => {
                if self.dropped.contains(&object.name) {
                    return None;
                }
                let mut object = object.clone();
                let object_mut = object.make_mut();
                object_mut.fields = self.rewrite_fields(&object_mut.fields);
                object_mut.implements_interfaces = self.rename_all(&object_mut.implements_interfaces);
                if let Some(root_name) = self.root_names.get(&object_mut.name) {
                    object_mut.name = root_name.clone();
                }
                Definition::ObjectTypeExtension(object)
            }
            Definition::InterfaceTypeDefinition(interface) => {
                let mut interface = interface.clone();
                let interface_mut = interface.make_mut();
                interface_mut.fields = self.rewrite_fields(&interface_mut.fields);
                interface_mut.implements_interfaces = self.rename_all(&interface_mut.implements_interfaces);
                Definition::InterfaceTypeDefinition(interface)
            }
            Definition::InterfaceTypeExtension(interface) => {
                let mut interface = interface.clone();
                let interface_mut = interface.make_mut();
                interface_mut.fields = self.rewrite_fields(&interface_mut.fields);
                interface_mut.implements_interfaces = self.rename_all(&interface_mut.implements_interfaces);
                Definition::InterfaceTypeExtension(interface)
            }
            Definition::UnionTypeDefinition(union_) => {
                let mut union_ = union_.clone();
                let union_mut = union_.make_mut();
                union_mut.members = self.rename_all(&union_mut.members);
                Definition::UnionTypeDefinition(union_)
            }
            Definition::UnionTypeExtension(union_) => {
                let mut union_ = union_.clone();
                let union_mut = union_.make_mut();
                union_mut.members = self.rename_all(&union_mut.members);
                Definition::UnionTypeExtension(union_)
            }
            Definition::InputObjectTypeDefinition(input) => {
                let mut input = input.clone();
                let input_mut = input.make_mut();
                input_mut.fields = self.rewrite_input_values(&input_mut.fields);
                Definition::InputObjectTypeDefinition(input)
            }
            Definition::InputObjectTypeExtension(input) => {
                let mut input = input.clone();
                let input_mut = input.make_mut();
                input_mut.fields = self.rewrite_input_values(&input_mut.fields);
                Definition::InputObjectTypeExtension(input)
            }
            other => other.clone(),
        };
        Some(rewritten)
    }

    fn rename(&self, name: &Name) -> Name {
        self.root_names.get(name).cloned().unwrap_or_else(|| name.clone())
    }

    fn rename_all(&self, names: &[Name]) -> Vec<Name> {
        names.iter().map(|name| self.rename(name)).collect()
    }

    fn rename_type(&self, ty: &ast::Type) -> ast::Type {
        match ty {
            ast::Type::Named(name) => ast::Type::Named(self.rename(name)),
            ast::Type::NonNullNamed(name) => ast::Type::NonNullNamed(self.rename(name)),
            ast::Type::List(inner) => ast::Type::List(Box::new(self.rename_type(inner))),
            ast::Type::NonNullList(inner) => ast::Type::NonNullList(Box::new(self.rename_type(inner))),
        }
    }

    fn rewrite_fields(&self, fields: &[Node<ast::FieldDefinition>]) -> Vec<Node<ast::FieldDefinition>> {
        fields
            .iter()
            .filter(|field| !self.dropped.contains(field.ty.inner_named_type()))
            .map(|field| {
                let mut field = field.clone();
                let field_mut = field.make_mut();
                field_mut.ty = self.rename_type(&field_mut.ty);
                field_mut.arguments = self.rewrite_input_values(&field_mut.arguments);
                field
            })
            .collect()
    }

    fn rewrite_input_values(
        &self,
        values: &[Node<ast::InputValueDefinition>],
    ) -> Vec<Node<ast::InputValueDefinition>> {
        values
            .iter()
            .map(|value| {
                let mut value = value.clone();
                let value_mut = value.make_mut();
                value_mut.ty = Node::new(self.rename_type(&value_mut.ty));
                value
            })
            .collect()
    }
}

/// Removes what the federation library adds to a service's schema: the federation directive
/// definitions, `_Any`, `_FieldSet`, `_Entity`, `_Service`, and the `_service`/`_entities` root
/// fields. A `Query` left without fields is removed as well.
pub fn strip_common_primitives(type_defs: &ast::Document) -> ast::Document {
    let definitions = type_defs
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::ObjectTypeDefinition(object) if object.name == SERVICE_TYPE_NAME => None,
            Definition::ObjectTypeExtension(object) if object.name == SERVICE_TYPE_NAME => None,
            Definition::ObjectTypeDefinition(object) if object.name == "Query" => {
                let mut object = object.clone();
                let object_mut = object.make_mut();
                object_mut
                    .fields
                    .retain(|field| !RESERVED_ROOT_FIELDS.contains(&field.name.as_str()));
                (!object_mut.fields.is_empty()).then(|| Definition::ObjectTypeDefinition(object))
            }
            Definition::ObjectTypeExtension(object) if object.name == "Query" => {
                let mut object = object.clone();
                let object_mut = object.make_mut();
                object_mut
                    .fields
                    .retain(|field| !RESERVED_ROOT_FIELDS.contains(&field.name.as_str()));
                (!object_mut.fields.is_empty()).then(|| Definition::ObjectTypeExtension(object))
            }
            Definition::DirectiveDefinition(directive) if is_federation_directive(&directive.name) => {
                None
            }
            Definition::ScalarTypeDefinition(scalar)
                if FEDERATION_SCALARS.contains(&scalar.name.as_str()) =>
            {
                None
            }
            Definition::UnionTypeDefinition(union_) if union_.name == ENTITY_UNION_NAME => None,
            other => Some(other.clone()),
        })
        .collect();
    with_definitions(type_defs, definitions)
}
