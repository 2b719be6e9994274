//! Splits every service's definitions into base definitions, extensions and directive
//! definitions, recording along the way which service owns which type and field.

use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::name;
use apollo_compiler::parser::SourceMap;
use tracing::trace;

use crate::compose::metadata::ExternalFieldDefinition;
use crate::compose::type_diff::type_nodes_are_equivalent;
use crate::directives::DirectiveApplications;
use crate::directives::EXTERNAL_DIRECTIVE_NAME;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::directives::fields_argument;
use crate::directives::is_federation_directive;
use crate::directives::with_executable_locations_only;
use crate::error::FederationError;
use crate::field_set::FieldSet;
use crate::service::ServiceDefinition;
use crate::utils::DefinitionExt;
use crate::utils::logging::snapshot;

/// A definition or extension together with the service that declared it. Synthesized definitions
/// have no service.
#[derive(Debug, Clone)]
pub(crate) struct ServiceNode {
    pub(crate) definition: Definition,
    pub(crate) service_name: Option<String>,
}

impl ServiceNode {
    pub(crate) fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TypeOwnership {
    /// The last service that supplied a base definition.
    pub(crate) owning_service: Option<String>,
    /// Fields and enum values added by extensions, mapped to the last service adding them.
    pub(crate) extension_fields_to_owning_service: IndexMap<Name, String>,
}

/// type name -> service name -> one selection set per `@key`
pub type KeyDirectivesMap = IndexMap<Name, IndexMap<String, Vec<FieldSet>>>;

pub(crate) type TypeDefinitionsMap = IndexMap<Name, Vec<ServiceNode>>;
pub(crate) type TypeExtensionsMap = IndexMap<Name, Vec<ServiceNode>>;
pub(crate) type TypeToServiceMap = IndexMap<Name, TypeOwnership>;
/// directive name -> service name -> definition restricted to executable locations
pub(crate) type DirectiveDefinitionsMap = IndexMap<Name, IndexMap<String, Node<ast::DirectiveDefinition>>>;

#[derive(Debug, Default)]
pub(crate) struct ServiceMaps {
    pub(crate) type_to_service: TypeToServiceMap,
    pub(crate) type_definitions: TypeDefinitionsMap,
    pub(crate) type_extensions: TypeExtensionsMap,
    pub(crate) directive_definitions: DirectiveDefinitionsMap,
    pub(crate) external_fields: Vec<ExternalFieldDefinition>,
    pub(crate) key_directives: KeyDirectivesMap,
    pub(crate) value_types: IndexSet<Name>,
    /// Sources of every service, so findings can point into any of them.
    pub(crate) sources: SourceMap,
}

#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "build_maps_from_service_list")
)]
pub(crate) fn build_maps_from_service_list(
    services: &[ServiceDefinition],
) -> Result<ServiceMaps, FederationError> {
    let mut maps = ServiceMaps::default();

    for service in services {
        let sources = Arc::make_mut(&mut maps.sources);
        for (key, source) in service.type_defs.sources.iter() {
            sources.entry(*key).or_insert_with(|| source.clone());
        }

        for definition in &service.type_defs.definitions {
            let definition = strip_external_fields(definition, &service.name, &mut maps.external_fields);
            let definition = strip_type_system_directives(&definition);
            maps.add_definition(definition, &service.name)?;
        }
    }

    if !maps.type_definitions.contains_key("Query") {
        maps.synthesize_empty_object(name!("Query"));
    }
    if maps.type_extensions.contains_key("Mutation") && !maps.type_definitions.contains_key("Mutation")
    {
        maps.synthesize_empty_object(name!("Mutation"));
    }

    snapshot!(maps.key_directives, "collected @key directives");
    snapshot!(maps.value_types, "detected value types");
    trace!(
        definitions = maps.type_definitions.len(),
        extensions = maps.type_extensions.len(),
        externals = maps.external_fields.len(),
        "partitioned service definitions"
    );
    Ok(maps)
}

impl ServiceMaps {
    fn add_definition(&mut self, definition: Definition, service_name: &str) -> Result<(), FederationError> {
        if let (Some(type_name), Some(directives)) = (definition.type_name(), definition.type_directives()) {
            if matches!(
                definition,
                Definition::ObjectTypeDefinition(_)
                    | Definition::ObjectTypeExtension(_)
                    | Definition::InterfaceTypeDefinition(_)
                    | Definition::InterfaceTypeExtension(_)
            ) {
                for key in directives.directives_named(&KEY_DIRECTIVE_NAME) {
                    let Some(fields) = fields_argument(key) else {
                        continue;
                    };
                    self.key_directives
                        .entry(type_name.clone())
                        .or_default()
                        .entry(service_name.to_owned())
                        .or_default()
                        .push(FieldSet::parse(fields)?);
                }
            }
        }

        if definition.is_type_definition() {
            let Some(type_name) = definition.type_name().cloned() else {
                return Ok(());
            };
            self.type_to_service.entry(type_name.clone()).or_default().owning_service =
                Some(service_name.to_owned());
            let nodes = self.type_definitions.entry(type_name.clone()).or_default();
            if let Some(previous) = nodes.last() {
                if type_nodes_are_equivalent(&previous.definition, &definition) {
                    self.value_types.insert(type_name);
                }
            }
            nodes.push(ServiceNode {
                definition,
                service_name: Some(service_name.to_owned()),
            });
        } else if definition.is_type_extension() {
            let Some(type_name) = definition.type_name().cloned() else {
                return Ok(());
            };
            let extended_members: Vec<Name> = match &definition {
                Definition::ObjectTypeExtension(_) | Definition::InterfaceTypeExtension(_) => definition
                    .field_definitions()
                    .iter()
                    .map(|field| field.name.clone())
                    .collect(),
                Definition::InputObjectTypeExtension(input) => {
                    input.fields.iter().map(|field| field.name.clone()).collect()
                }
                Definition::EnumTypeExtension(enum_) => {
                    enum_.values.iter().map(|value| value.value.clone()).collect()
                }
                _ => Vec::new(),
            };
            let ownership = self.type_to_service.entry(type_name.clone()).or_default();
            for member in extended_members {
                ownership
                    .extension_fields_to_owning_service
                    .insert(member, service_name.to_owned());
            }
            self.type_extensions.entry(type_name).or_default().push(ServiceNode {
                definition,
                service_name: Some(service_name.to_owned()),
            });
        } else if let Definition::DirectiveDefinition(directive) = &definition {
            // Directives with type-system locations only are the implementing service's concern.
            if let Some(directive) = with_executable_locations_only(directive) {
                self.directive_definitions
                    .entry(directive.name.clone())
                    .or_default()
                    .insert(service_name.to_owned(), directive);
            }
        }
        Ok(())
    }

    fn synthesize_empty_object(&mut self, type_name: Name) {
        let definition = Definition::ObjectTypeDefinition(Node::new(ast::ObjectTypeDefinition {
            description: None,
            name: type_name.clone(),
            implements_interfaces: Vec::new(),
            directives: Default::default(),
            fields: Vec::new(),
        }));
        self.type_definitions.insert(
            type_name,
            vec![ServiceNode {
                definition,
                service_name: None,
            }],
        );
    }

    pub(crate) fn is_value_type(&self, type_name: &str) -> bool {
        self.value_types.contains(type_name)
    }
}

/// Removes `@external` fields from object and interface extensions, recording each one.
fn strip_external_fields(
    definition: &Definition,
    service_name: &str,
    external_fields: &mut Vec<ExternalFieldDefinition>,
) -> Definition {
    let mut collect = |type_name: &Name, fields: &mut Vec<Node<ast::FieldDefinition>>| {
        fields.retain(|field| {
            if !field.directives.has_directive(&EXTERNAL_DIRECTIVE_NAME) {
                return true;
            }
            external_fields.push(ExternalFieldDefinition {
                field: field.clone(),
                parent_type_name: type_name.clone(),
                service_name: service_name.to_owned(),
            });
            false
        });
    };
    match definition {
        Definition::ObjectTypeExtension(object) => {
            let mut object = object.clone();
            let object_mut = object.make_mut();
            collect(&object_mut.name.clone(), &mut object_mut.fields);
            Definition::ObjectTypeExtension(object)
        }
        Definition::InterfaceTypeExtension(interface) => {
            let mut interface = interface.clone();
            let interface_mut = interface.make_mut();
            collect(&interface_mut.name.clone(), &mut interface_mut.fields);
            Definition::InterfaceTypeExtension(interface)
        }
        other => other.clone(),
    }
}

/// Directive applications kept in the composed schema. Everything else is only meaningful to the
/// service that declared it.
fn is_composed_directive(name: &str) -> bool {
    name == "deprecated" || name == "specifiedBy" || is_federation_directive(name)
}

fn composed_directives(directives: &ast::DirectiveList) -> ast::DirectiveList {
    ast::DirectiveList(
        directives
            .iter()
            .filter(|directive| is_composed_directive(&directive.name))
            .cloned()
            .collect(),
    )
}

fn strip_input_values(values: &mut [Node<ast::InputValueDefinition>]) {
    for value in values {
        let value = value.make_mut();
        value.directives = composed_directives(&value.directives);
    }
}

fn strip_fields(fields: &mut [Node<ast::FieldDefinition>]) {
    for field in fields {
        let field = field.make_mut();
        field.directives = composed_directives(&field.directives);
        strip_input_values(&mut field.arguments);
    }
}

fn strip_enum_values(values: &mut [Node<ast::EnumValueDefinition>]) {
    for value in values {
        let value = value.make_mut();
        value.directives = composed_directives(&value.directives);
    }
}

pub(crate) fn strip_type_system_directives(definition: &Definition) -> Definition {
    let mut definition = definition.clone();
    match &mut definition {
        Definition::DirectiveDefinition(directive) => {
            strip_input_values(&mut directive.make_mut().arguments);
        }
        Definition::ScalarTypeDefinition(scalar) => {
            let scalar = scalar.make_mut();
            scalar.directives = composed_directives(&scalar.directives);
        }
        Definition::ScalarTypeExtension(scalar) => {
            let scalar = scalar.make_mut();
            scalar.directives = composed_directives(&scalar.directives);
        }
        Definition::ObjectTypeDefinition(object) => {
            let object = object.make_mut();
            object.directives = composed_directives(&object.directives);
            strip_fields(&mut object.fields);
        }
        Definition::ObjectTypeExtension(object) => {
            let object = object.make_mut();
            object.directives = composed_directives(&object.directives);
            strip_fields(&mut object.fields);
        }
        Definition::InterfaceTypeDefinition(interface) => {
            let interface = interface.make_mut();
            interface.directives = composed_directives(&interface.directives);
            strip_fields(&mut interface.fields);
        }
        Definition::InterfaceTypeExtension(interface) => {
            let interface = interface.make_mut();
            interface.directives = composed_directives(&interface.directives);
            strip_fields(&mut interface.fields);
        }
        Definition::UnionTypeDefinition(union_) => {
            let union_ = union_.make_mut();
            union_.directives = composed_directives(&union_.directives);
        }
        Definition::UnionTypeExtension(union_) => {
            let union_ = union_.make_mut();
            union_.directives = composed_directives(&union_.directives);
        }
        Definition::EnumTypeDefinition(enum_) => {
            let enum_ = enum_.make_mut();
            enum_.directives = composed_directives(&enum_.directives);
            strip_enum_values(&mut enum_.values);
        }
        Definition::EnumTypeExtension(enum_) => {
            let enum_ = enum_.make_mut();
            enum_.directives = composed_directives(&enum_.directives);
            strip_enum_values(&mut enum_.values);
        }
        Definition::InputObjectTypeDefinition(input) => {
            let input = input.make_mut();
            input.directives = composed_directives(&input.directives);
            strip_input_values(&mut input.fields);
        }
        Definition::InputObjectTypeExtension(input) => {
            let input = input.make_mut();
            input.directives = composed_directives(&input.directives);
            strip_input_values(&mut input.fields);
        }
        _ => {}
    }
    definition
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn service(name: &str, sdl: &str) -> ServiceDefinition {
        ServiceDefinition::parse(name, sdl).unwrap()
    }

    #[test]
    fn records_ownership_and_extension_fields() {
        let maps = build_maps_from_service_list(&[
            service("a", "type Product @key(fields: \"sku\") { sku: String! name: String! }"),
            service(
                "b",
                "extend type Product @key(fields: \"sku\") { sku: String! @external price: Int! }",
            ),
            service("c", "extend type Product { price: Int! weight: Int }"),
        ])
        .unwrap();

        let product = &maps.type_to_service["Product"];
        assert_eq!(product.owning_service.as_deref(), Some("a"));
        assert_eq!(
            product
                .extension_fields_to_owning_service
                .iter()
                .map(|(field, service)| format!("{field}:{service}"))
                .collect::<Vec<_>>(),
            ["price:c", "weight:c"]
        );
        assert_eq!(maps.external_fields.len(), 1);
        assert_eq!(maps.external_fields[0].field.name, "sku");
        assert_eq!(maps.external_fields[0].service_name, "b");
        assert_eq!(
            maps.key_directives["Product"].keys().collect::<Vec<_>>(),
            ["a", "b"]
        );
        // the external field is gone from the extension
        assert_eq!(
            maps.type_extensions["Product"][0].definition.field_definitions().len(),
            1
        );
    }

    #[test]
    fn detects_value_types_pairwise() {
        let maps = build_maps_from_service_list(&[
            service("a", "type Color { id: ID! value: String }"),
            service("b", "type Color { id: ID! value: String }"),
            service("c", "type Money { amount: Int }"),
            service("d", "type Money { amount: Float }"),
        ])
        .unwrap();
        assert!(maps.is_value_type("Color"));
        assert!(!maps.is_value_type("Money"));
        assert_eq!(maps.type_definitions["Color"].len(), 2);
        assert_eq!(maps.type_to_service["Money"].owning_service.as_deref(), Some("d"));
    }

    #[test]
    fn synthesizes_root_types() {
        let maps = build_maps_from_service_list(&[service(
            "a",
            "extend type Query { a: Int }\nextend type Mutation { b: Int }",
        )])
        .unwrap();
        assert!(maps.type_definitions["Query"][0].service_name.is_none());
        assert!(maps.type_definitions.contains_key("Mutation"));
        assert!(!maps.type_definitions.contains_key("Subscription"));
    }

    #[test]
    fn keeps_only_executable_directives_and_composed_applications() {
        let maps = build_maps_from_service_list(&[service(
            "a",
            r#"
            directive @stream on FIELD | FIELD_DEFINITION
            directive @cacheControl(maxAge: Int) on OBJECT | FIELD_DEFINITION
            type Product @cacheControl(maxAge: 30) @key(fields: "id") {
              id: ID!
              old: String @deprecated(reason: "gone") @cacheControl(maxAge: 1)
            }
            "#,
        )])
        .unwrap();
        let stream = &maps.directive_definitions["stream"]["a"];
        assert_eq!(stream.locations, [ast::DirectiveLocation::Field]);
        assert!(!maps.directive_definitions.contains_key("cacheControl"));
        assert_eq!(
            maps.type_definitions["Product"][0].definition.to_string().trim_end(),
            "type Product @key(fields: \"id\") {\n  id: ID!\n  old: String @deprecated(reason: \"gone\")\n}"
        );
    }

    #[test]
    fn propagates_invalid_key_field_sets() {
        let result = build_maps_from_service_list(&[service(
            "a",
            "type Product @key(fields: \"id {\") { id: ID! }",
        )]);
        assert!(matches!(result, Err(FederationError::InvalidFieldSet { .. })));
    }
}
