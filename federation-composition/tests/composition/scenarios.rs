use federation_composition::ErrorCode;
use federation_composition::Severity;
use pretty_assertions::assert_eq;

use super::test_helpers::codes;
use super::test_helpers::compose;
use super::test_helpers::messages_for;

fn field_names(result: &federation_composition::CompositionResult, type_name: &str) -> Vec<String> {
    result
        .schema
        .schema
        .get_object(type_name)
        .unwrap()
        .fields
        .keys()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn extension_fields_belong_to_the_extending_service() {
    let result = compose(&[
        ("A", "type Product { sku: String! name: String! }"),
        ("B", "extend type Product { price: Int! }"),
    ]);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(field_names(&result, "Product"), ["sku", "name", "price"]);
    assert_eq!(
        result.schema.type_metadata("Product").unwrap().service_name.as_deref(),
        Some("A")
    );
    assert_eq!(
        result
            .schema
            .field_metadata("Product", "price")
            .unwrap()
            .service_name
            .as_deref(),
        Some("B")
    );
}

#[test]
fn externals_consumed_by_requires_are_used() {
    let result = compose(&[
        (
            "A",
            r#"
            type Product @key(fields: "id") {
              sku: String!
              upc: String!
              id: ID!
            }
            "#,
        ),
        (
            "B",
            r#"
            extend type Product {
              sku: String! @external
              id: ID! @external
              price: Int! @requires(fields: "id")
            }
            "#,
        ),
    ]);
    assert_eq!(codes(&result), [ErrorCode::ExternalUnused]);
    assert_eq!(
        result.errors[0].message,
        "[B] Product.sku -> is marked as @external but is not used by a @requires, @key, or @provides directive."
    );
    assert_eq!(result.errors[0].severity(), Severity::Warning);
    assert!(!result.has_errors());
}

#[test]
fn extension_keys_must_match_a_base_key() {
    let result = compose(&[
        (
            "A",
            r#"
            type Product @key(fields: "sku upc") {
              sku: String!
              upc: String!
            }
            "#,
        ),
        (
            "B",
            r#"
            extend type Product @key(fields: "sku") {
              sku: String! @external
              reviews: [String]
            }
            "#,
        ),
    ]);
    assert_eq!(
        messages_for(&result, ErrorCode::KeyNotSpecified),
        ["[B] Product -> extends from A but specifies an invalid @key directive. Valid @key directives are specified by the originating type. Available @key directives for this type are:\n\t@key(fields: \"sku upc\")"]
    );
    assert_eq!(messages_for(&result, ErrorCode::KeyNotDeclared).len(), 1);
    assert!(result.has_errors());
}

#[test]
fn last_base_definition_wins() {
    let result = compose(&[
        ("A", "type Product { sku: String! name: String! }"),
        ("B", "type Product { id: ID! name: String! price: Int }"),
    ]);
    assert_eq!(field_names(&result, "Product"), ["id", "name", "price"]);
    assert!(
        messages_for(&result, ErrorCode::InvalidGraphql).contains(&"Field \"Product.name\" can only be defined once.")
    );
}

#[test]
fn custom_root_types_compose_as_default_roots() {
    let result = compose(&[
        ("A", "schema { query: RootQuery }\ntype RootQuery { x: Int }"),
        ("B", "extend type Query { y: Int }"),
    ]);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(field_names(&result, "Query"), ["x", "y"]);
    assert!(result.schema.schema.types.get("RootQuery").is_none());
}

#[test]
fn value_types_are_shared_without_owner() {
    let color = "type Color { id: ID! value: String }";
    let result = compose(&[
        ("A", &format!("{color}\nextend type Query {{ a: Color }}")),
        ("B", &format!("{color}\nextend type Query {{ b: Color }}")),
    ]);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let metadata = result.schema.type_metadata("Color").unwrap();
    assert!(metadata.is_value_type);
    assert_eq!(metadata.service_name, None);
}

#[test]
fn prints_the_composed_schema() {
    let result = compose(&[
        (
            "accounts",
            r#"
            extend type Query { me: User }
            type User @key(fields: "id") {
              id: ID!
              "The name shown to other users"
              username: String
            }
            "#,
        ),
        (
            "reviews",
            r#"
            type Review @key(fields: "id") {
              id: ID!
              body: String
              author: User @provides(fields: "username")
            }
            extend type User @key(fields: "id") {
              id: ID! @external
              username: String @external
              reviews: [Review]
            }
            "#,
        ),
    ]);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    insta::assert_snapshot!(result.schema.print_sdl(), @r###"
    extend type Query {
      me: User
    }

    type Review @key(fields: "id") {
      id: ID!
      body: String
      author: User @provides(fields: "username")
    }

    type User @key(fields: "id") {
      id: ID!

      """The name shown to other users"""
      username: String
      reviews: [Review]
    }
    "###);
}
