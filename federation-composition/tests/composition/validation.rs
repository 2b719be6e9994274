use federation_composition::ErrorCode;
use federation_composition::Location;
use federation_composition::Severity;
use pretty_assertions::assert_eq;

use super::test_helpers::codes;
use super::test_helpers::compose;
use super::test_helpers::messages_for;

#[test]
fn findings_point_into_the_service_sdl() {
    let result = compose(&[(
        "products",
        "type Product @key(fields: \"upc\") {\n  upc: String!\n  name: String @external\n}\n",
    )]);
    assert_eq!(codes(&result), [ErrorCode::ExternalUsedOnBase]);
    let error = &result.errors[0];
    assert_eq!(
        error.message,
        "[products] Product.name -> Found extraneous @external directive. @external cannot be used on base types."
    );
    assert_eq!(error.locations.len(), 1);
    assert_eq!(error.locations[0].start, Location { line: 2, column: 15 });
}

#[test]
fn reports_requires_on_base_types_and_missing_externals() {
    let result = compose(&[
        (
            "products",
            r#"
            type Product @key(fields: "upc") {
              upc: String!
              weight: Int
              size: Int
              shippingEstimate: Int @requires(fields: "weight")
            }
            "#,
        ),
        (
            "shipping",
            r#"
            extend type Product @key(fields: "upc") {
              upc: String! @external
              weight: Int @external
              cost: Int @requires(fields: "weight size")
            }
            "#,
        ),
    ]);
    assert_eq!(
        codes(&result),
        [ErrorCode::RequiresUsedOnBase, ErrorCode::RequiresFieldsMissingExternal]
    );
    assert_eq!(
        messages_for(&result, ErrorCode::RequiresFieldsMissingExternal),
        ["[shipping] Product.cost -> requires the field `size` to be marked as @external."]
    );
}

#[test]
fn reports_provides_problems() {
    let result = compose(&[
        (
            "products",
            r#"
            type Product @key(fields: "upc") { upc: String! name: String }
            type Money { amount: Int }
            extend type Query { products: [Product] }
            "#,
        ),
        (
            "reviews",
            r#"
            type Review @key(fields: "id") {
              id: ID!
              product: Product @provides(fields: "name")
              price: Money @provides(fields: "amount")
            }
            extend type Product @key(fields: "upc") {
              upc: String! @external
            }
            "#,
        ),
    ]);
    assert_eq!(
        codes(&result),
        [
            ErrorCode::ProvidesFieldsMissingExternal,
            ErrorCode::ProvidesFieldsMissingExternal,
            ErrorCode::ProvidesNotOnEntity,
        ]
    );
}

#[test]
fn custom_directives_must_agree_across_services() {
    let result = compose(&[
        (
            "accounts",
            "directive @stream on FIELD | OBJECT\nextend type Query { me: String }",
        ),
        ("reviews", "directive @stream(limit: Int) on FIELD\nextend type Query { top: String }"),
        ("inventory", "extend type Query { stock: Int }"),
    ]);
    assert_eq!(
        codes(&result),
        [
            ErrorCode::ExecutableDirectivesInAllServices,
            ErrorCode::ExecutableDirectivesIdentical,
            ErrorCode::ExecutableDirectivesOnly,
        ]
    );
    let severities: Vec<Severity> = result.errors.iter().map(|error| error.severity()).collect();
    assert_eq!(severities, [Severity::Error, Severity::Error, Severity::Warning]);
}

#[test]
fn reports_multiple_keys_on_extensions() {
    let result = compose(&[
        (
            "products",
            r#"type Product @key(fields: "upc") @key(fields: "sku") { upc: String! sku: String! }"#,
        ),
        (
            "reviews",
            r#"
            extend type Product @key(fields: "upc") @key(fields: "sku") {
              upc: String! @external
              sku: String! @external
            }
            "#,
        ),
    ]);
    assert_eq!(codes(&result), [ErrorCode::MultipleKeysOnExtension]);
}

#[test]
fn reports_duplicate_enums_and_values() {
    let result = compose(&[(
        "products",
        r#"
        enum Category { BOOKS MUSIC }
        extend enum Category { BOOKS }
        scalar Date
        scalar Date
        extend type Query { category: Category }
        "#,
    )]);
    let pre_composition: Vec<ErrorCode> = codes(&result)
        .into_iter()
        .filter(|code| {
            matches!(
                code,
                ErrorCode::DuplicateEnumValue | ErrorCode::DuplicateScalarDefinition
            )
        })
        .collect();
    assert_eq!(
        pre_composition,
        [ErrorCode::DuplicateScalarDefinition, ErrorCode::DuplicateEnumValue]
    );
}
