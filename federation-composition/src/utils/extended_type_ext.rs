use apollo_compiler::schema::ExtendedType;

pub(crate) trait ExtendedTypeExt {
    fn has_extension_elements(&self) -> bool;
    fn has_non_extension_elements(&self) -> bool;

    /// A type assembled purely from `extend` blocks: its definition, if any, contributes
    /// nothing. Such types print with the `extend` keyword.
    fn is_extension_only(&self) -> bool {
        self.has_extension_elements() && !self.has_non_extension_elements()
    }
}

fn has_non_extension_inner_elements(extended_type: &ExtendedType) -> bool {
    match extended_type {
        ExtendedType::Scalar(_) => false,
        ExtendedType::Object(t) => {
            t.implements_interfaces
                .iter()
                .any(|itf| itf.origin.extension_id().is_none())
                || t.fields.values().any(|f| f.origin.extension_id().is_none())
        }
        ExtendedType::Interface(t) => {
            t.implements_interfaces
                .iter()
                .any(|itf| itf.origin.extension_id().is_none())
                || t.fields.values().any(|f| f.origin.extension_id().is_none())
        }
        ExtendedType::Union(t) => t.members.iter().any(|m| m.origin.extension_id().is_none()),
        ExtendedType::Enum(t) => t.values.values().any(|v| v.origin.extension_id().is_none()),
        ExtendedType::InputObject(t) => {
            t.fields.values().any(|f| f.origin.extension_id().is_none())
        }
    }
}

impl ExtendedTypeExt for ExtendedType {
    fn has_extension_elements(&self) -> bool {
        match self {
            ExtendedType::Scalar(scalar) => !scalar.extensions().is_empty(),
            ExtendedType::Object(object) => !object.extensions().is_empty(),
            ExtendedType::Interface(interface) => !interface.extensions().is_empty(),
            ExtendedType::Union(union) => !union.extensions().is_empty(),
            ExtendedType::Enum(enum_type) => !enum_type.extensions().is_empty(),
            ExtendedType::InputObject(input_object) => !input_object.extensions().is_empty(),
        }
    }

    // Only fields, members and values count: directives are printed inline either way.
    fn has_non_extension_elements(&self) -> bool {
        has_non_extension_inner_elements(self)
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Schema;

    use super::*;

    #[test]
    fn detects_types_assembled_from_extensions() {
        let schema = Schema::builder()
            .parse(
                r#"
                type Query { a: Int }
                extend type Query { b: Int }
                type Product @key(fields: "upc") { upc: ID! }
                type Review
                extend type Review { id: ID! }
                directive @key(fields: String!) on OBJECT
                "#,
                "schema.graphql",
            )
            .build()
            .unwrap();
        assert!(!schema.types["Query"].is_extension_only());
        assert!(!schema.types["Product"].is_extension_only());
        assert!(schema.types["Review"].is_extension_only());
    }
}
