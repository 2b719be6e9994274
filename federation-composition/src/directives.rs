//! Federation directives and helpers for reading them off type-system nodes.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::DirectiveLocation;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::ast::Value;
use apollo_compiler::name;
use apollo_compiler::schema;
use apollo_compiler::ty;

pub(crate) const KEY_DIRECTIVE_NAME: Name = name!("key");
pub(crate) const EXTENDS_DIRECTIVE_NAME: Name = name!("extends");
pub(crate) const EXTERNAL_DIRECTIVE_NAME: Name = name!("external");
pub(crate) const REQUIRES_DIRECTIVE_NAME: Name = name!("requires");
pub(crate) const PROVIDES_DIRECTIVE_NAME: Name = name!("provides");
pub(crate) const FIELDS_ARGUMENT_NAME: Name = name!("fields");

pub(crate) const FEDERATION_DIRECTIVE_NAMES: [Name; 5] = [
    KEY_DIRECTIVE_NAME,
    EXTENDS_DIRECTIVE_NAME,
    EXTERNAL_DIRECTIVE_NAME,
    REQUIRES_DIRECTIVE_NAME,
    PROVIDES_DIRECTIVE_NAME,
];

/// Directives every GraphQL schema knows about without declaring them.
pub(crate) const SPECIFIED_DIRECTIVE_NAMES: [&str; 5] =
    ["skip", "include", "deprecated", "specifiedBy", "oneOf"];

const EXECUTABLE_DIRECTIVE_LOCATIONS: [DirectiveLocation; 8] = [
    DirectiveLocation::Query,
    DirectiveLocation::Mutation,
    DirectiveLocation::Subscription,
    DirectiveLocation::Field,
    DirectiveLocation::FragmentDefinition,
    DirectiveLocation::FragmentSpread,
    DirectiveLocation::InlineFragment,
    DirectiveLocation::VariableDefinition,
];

pub fn is_executable_directive_location(location: &DirectiveLocation) -> bool {
    EXECUTABLE_DIRECTIVE_LOCATIONS.contains(location)
}

pub fn is_federation_directive(name: &str) -> bool {
    FEDERATION_DIRECTIVE_NAMES.iter().any(|n| n == name)
}

pub(crate) fn is_specified_directive(name: &str) -> bool {
    SPECIFIED_DIRECTIVE_NAMES.contains(&name)
}

/// Gives uniform access to the directive applications of AST nodes and of composed schema
/// elements. For composed types the list spans the definition and every extension.
pub(crate) trait DirectiveApplications {
    fn directives_named<'a>(&'a self, name: &str) -> Vec<&'a ast::Directive>;

    fn has_directive(&self, name: &str) -> bool {
        !self.directives_named(name).is_empty()
    }
}

impl DirectiveApplications for ast::DirectiveList {
    fn directives_named<'a>(&'a self, name: &str) -> Vec<&'a ast::Directive> {
        self.get_all(name).map(|directive| &**directive).collect()
    }
}

impl DirectiveApplications for schema::DirectiveList {
    fn directives_named<'a>(&'a self, name: &str) -> Vec<&'a ast::Directive> {
        self.get_all(name).map(|directive| &*directive.node).collect()
    }
}

pub(crate) fn directive_string_arg_value<'a>(
    directive: &'a ast::Directive,
    arg_name: &str,
) -> Option<&'a str> {
    match directive.specified_argument_by_name(arg_name).map(|v| &**v) {
        Some(Value::String(value)) => Some(value.as_str()),
        _ => None,
    }
}

/// The `fields` argument of a `@key`, `@requires` or `@provides` application.
pub(crate) fn fields_argument(directive: &ast::Directive) -> Option<&str> {
    directive_string_arg_value(directive, &FIELDS_ARGUMENT_NAME)
}

/// Keeps the executable locations of a directive definition, or `None` when there are none.
pub(crate) fn with_executable_locations_only(
    definition: &Node<DirectiveDefinition>,
) -> Option<Node<DirectiveDefinition>> {
    if !definition.locations.iter().any(is_executable_directive_location) {
        return None;
    }
    let mut definition = definition.clone();
    definition
        .make_mut()
        .locations
        .retain(is_executable_directive_location);
    Some(definition)
}

fn fields_argument_definition() -> Node<InputValueDefinition> {
    Node::new(InputValueDefinition {
        name: FIELDS_ARGUMENT_NAME,
        description: None,
        directives: Default::default(),
        ty: ty!(String!).into(),
        default_value: None,
    })
}

/// directive @key(fields: String!) repeatable on OBJECT | INTERFACE
fn key_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: KEY_DIRECTIVE_NAME,
        description: None,
        arguments: vec![fields_argument_definition()],
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
        repeatable: true,
    }
}

/// directive @extends on OBJECT | INTERFACE
fn extends_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: EXTENDS_DIRECTIVE_NAME,
        description: None,
        arguments: Vec::new(),
        locations: vec![DirectiveLocation::Object, DirectiveLocation::Interface],
        repeatable: false,
    }
}

/// directive @external on OBJECT | FIELD_DEFINITION
fn external_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: EXTERNAL_DIRECTIVE_NAME,
        description: None,
        arguments: Vec::new(),
        locations: vec![DirectiveLocation::Object, DirectiveLocation::FieldDefinition],
        repeatable: false,
    }
}

/// directive @requires(fields: String!) on FIELD_DEFINITION
fn requires_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: REQUIRES_DIRECTIVE_NAME,
        description: None,
        arguments: vec![fields_argument_definition()],
        locations: vec![DirectiveLocation::FieldDefinition],
        repeatable: false,
    }
}

/// directive @provides(fields: String!) on FIELD_DEFINITION
fn provides_directive_definition() -> DirectiveDefinition {
    DirectiveDefinition {
        name: PROVIDES_DIRECTIVE_NAME,
        description: None,
        arguments: vec![fields_argument_definition()],
        locations: vec![DirectiveLocation::FieldDefinition],
        repeatable: false,
    }
}

/// Definitions of the five federation directives, ready to seed a schema document.
pub(crate) fn federation_directive_definitions() -> Vec<ast::Definition> {
    [
        key_directive_definition(),
        extends_directive_definition(),
        external_directive_definition(),
        requires_directive_definition(),
        provides_directive_definition(),
    ]
    .into_iter()
    .map(|definition| ast::Definition::DirectiveDefinition(Node::new(definition)))
    .collect()
}

#[cfg(test)]
mod tests {
    use apollo_compiler::ast::Document;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DirectiveLocation::Query, true)]
    #[case(DirectiveLocation::Mutation, true)]
    #[case(DirectiveLocation::Subscription, true)]
    #[case(DirectiveLocation::Field, true)]
    #[case(DirectiveLocation::FragmentDefinition, true)]
    #[case(DirectiveLocation::FragmentSpread, true)]
    #[case(DirectiveLocation::InlineFragment, true)]
    #[case(DirectiveLocation::VariableDefinition, true)]
    #[case(DirectiveLocation::Schema, false)]
    #[case(DirectiveLocation::Object, false)]
    #[case(DirectiveLocation::FieldDefinition, false)]
    #[case(DirectiveLocation::ArgumentDefinition, false)]
    #[case(DirectiveLocation::InputFieldDefinition, false)]
    #[case(DirectiveLocation::EnumValue, false)]
    fn classifies_directive_locations(#[case] location: DirectiveLocation, #[case] executable: bool) {
        assert_eq!(is_executable_directive_location(&location), executable);
    }

    #[test]
    fn recognizes_federation_directives() {
        for name in ["key", "extends", "external", "requires", "provides"] {
            assert!(is_federation_directive(name));
        }
        assert!(!is_federation_directive("tag"));
        assert!(!is_federation_directive("deprecated"));
    }

    #[test]
    fn reads_directive_arguments_in_source_order() {
        let document = Document::parse(
            r#"type Product @key(fields: "upc") @key(fields: "sku color { id }") { upc: ID! }"#,
            "product.graphql",
        )
        .unwrap();
        let ast::Definition::ObjectTypeDefinition(product) = &document.definitions[0] else {
            panic!("expected an object type");
        };
        let keys: Vec<_> = product
            .directives
            .directives_named("key")
            .into_iter()
            .filter_map(fields_argument)
            .collect();
        assert_eq!(keys, ["upc", "sku color { id }"]);
        assert!(product.directives.has_directive("key"));
        assert!(!product.directives.has_directive("extends"));
    }

    #[test]
    fn filters_type_system_locations() {
        let document = Document::parse(
            "directive @a on FIELD | OBJECT\ndirective @b on OBJECT | FIELD_DEFINITION",
            "directives.graphql",
        )
        .unwrap();
        let definitions: Vec<_> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::DirectiveDefinition(definition) => Some(definition),
                _ => None,
            })
            .collect();
        let a = with_executable_locations_only(definitions[0]).unwrap();
        assert_eq!(a.locations, [DirectiveLocation::Field]);
        assert!(with_executable_locations_only(definitions[1]).is_none());
    }
}
