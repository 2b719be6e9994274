use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub(crate) fn definition_kind_name(self) -> &'static str {
        match self {
            Self::Scalar => "ScalarTypeDefinition",
            Self::Object => "ObjectTypeDefinition",
            Self::Interface => "InterfaceTypeDefinition",
            Self::Union => "UnionTypeDefinition",
            Self::Enum => "EnumTypeDefinition",
            Self::InputObject => "InputObjectTypeDefinition",
        }
    }

    pub(crate) fn extension_kind_name(self) -> &'static str {
        match self {
            Self::Scalar => "ScalarTypeExtension",
            Self::Object => "ObjectTypeExtension",
            Self::Interface => "InterfaceTypeExtension",
            Self::Union => "UnionTypeExtension",
            Self::Enum => "EnumTypeExtension",
            Self::InputObject => "InputObjectTypeExtension",
        }
    }
}

/// Uniform read access to the top-level definitions of a type-system document.
pub(crate) trait DefinitionExt {
    /// The type this definition or extension declares, if it is one.
    fn type_name(&self) -> Option<&Name>;
    fn type_kind(&self) -> Option<TypeKind>;
    fn is_type_definition(&self) -> bool;
    fn is_type_extension(&self) -> bool;
    /// The AST node kind, spelled the way GraphQL tooling names it (`ObjectTypeExtension`).
    fn kind_name(&self) -> &'static str;
    fn type_directives(&self) -> Option<&ast::DirectiveList>;
    /// Field definitions of object and interface definitions or extensions.
    fn field_definitions(&self) -> &[Node<ast::FieldDefinition>];
}

impl DefinitionExt for Definition {
    fn type_name(&self) -> Option<&Name> {
        match self {
            Definition::ScalarTypeDefinition(d) => Some(&d.name),
            Definition::ObjectTypeDefinition(d) => Some(&d.name),
            Definition::InterfaceTypeDefinition(d) => Some(&d.name),
            Definition::UnionTypeDefinition(d) => Some(&d.name),
            Definition::EnumTypeDefinition(d) => Some(&d.name),
            Definition::InputObjectTypeDefinition(d) => Some(&d.name),
            Definition::ScalarTypeExtension(d) => Some(&d.name),
            Definition::ObjectTypeExtension(d) => Some(&d.name),
            Definition::InterfaceTypeExtension(d) => Some(&d.name),
            Definition::UnionTypeExtension(d) => Some(&d.name),
            Definition::EnumTypeExtension(d) => Some(&d.name),
            Definition::InputObjectTypeExtension(d) => Some(&d.name),
            _ => None,
        }
    }

    fn type_kind(&self) -> Option<TypeKind> {
        match self {
            Definition::ScalarTypeDefinition(_) | Definition::ScalarTypeExtension(_) => {
                Some(TypeKind::Scalar)
            }
            Definition::ObjectTypeDefinition(_) | Definition::ObjectTypeExtension(_) => {
                Some(TypeKind::Object)
            }
            Definition::InterfaceTypeDefinition(_) | Definition::InterfaceTypeExtension(_) => {
                Some(TypeKind::Interface)
            }
            Definition::UnionTypeDefinition(_) | Definition::UnionTypeExtension(_) => {
                Some(TypeKind::Union)
            }
            Definition::EnumTypeDefinition(_) | Definition::EnumTypeExtension(_) => {
                Some(TypeKind::Enum)
            }
            Definition::InputObjectTypeDefinition(_) | Definition::InputObjectTypeExtension(_) => {
                Some(TypeKind::InputObject)
            }
            _ => None,
        }
    }

    fn is_type_definition(&self) -> bool {
        matches!(
            self,
            Definition::ScalarTypeDefinition(_)
                | Definition::ObjectTypeDefinition(_)
                | Definition::InterfaceTypeDefinition(_)
                | Definition::UnionTypeDefinition(_)
                | Definition::EnumTypeDefinition(_)
                | Definition::InputObjectTypeDefinition(_)
        )
    }

    fn is_type_extension(&self) -> bool {
        matches!(
            self,
            Definition::ScalarTypeExtension(_)
                | Definition::ObjectTypeExtension(_)
                | Definition::InterfaceTypeExtension(_)
                | Definition::UnionTypeExtension(_)
                | Definition::EnumTypeExtension(_)
                | Definition::InputObjectTypeExtension(_)
        )
    }

    fn kind_name(&self) -> &'static str {
        match (self.type_kind(), self.is_type_extension()) {
            (Some(kind), false) => kind.definition_kind_name(),
            (Some(kind), true) => kind.extension_kind_name(),
            (None, _) => match self {
                Definition::SchemaDefinition(_) => "SchemaDefinition",
                Definition::SchemaExtension(_) => "SchemaExtension",
                Definition::DirectiveDefinition(_) => "DirectiveDefinition",
                Definition::FragmentDefinition(_) => "FragmentDefinition",
                _ => "OperationDefinition",
            },
        }
    }

    fn type_directives(&self) -> Option<&ast::DirectiveList> {
        match self {
            Definition::ScalarTypeDefinition(d) => Some(&d.directives),
            Definition::ObjectTypeDefinition(d) => Some(&d.directives),
            Definition::InterfaceTypeDefinition(d) => Some(&d.directives),
            Definition::UnionTypeDefinition(d) => Some(&d.directives),
            Definition::EnumTypeDefinition(d) => Some(&d.directives),
            Definition::InputObjectTypeDefinition(d) => Some(&d.directives),
            Definition::ScalarTypeExtension(d) => Some(&d.directives),
            Definition::ObjectTypeExtension(d) => Some(&d.directives),
            Definition::InterfaceTypeExtension(d) => Some(&d.directives),
            Definition::UnionTypeExtension(d) => Some(&d.directives),
            Definition::EnumTypeExtension(d) => Some(&d.directives),
            Definition::InputObjectTypeExtension(d) => Some(&d.directives),
            _ => None,
        }
    }

    fn field_definitions(&self) -> &[Node<ast::FieldDefinition>] {
        match self {
            Definition::ObjectTypeDefinition(d) => &d.fields,
            Definition::ObjectTypeExtension(d) => &d.fields,
            Definition::InterfaceTypeDefinition(d) => &d.fields,
            Definition::InterfaceTypeExtension(d) => &d.fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::ast::Document;

    use super::*;

    #[test]
    fn describes_definitions() {
        let document = Document::parse(
            r#"
            type Product { upc: ID! }
            extend interface Node { id: ID! }
            directive @stream on FIELD
            "#,
            "doc.graphql",
        )
        .unwrap();
        let [product, node, stream] = document.definitions.as_slice() else {
            panic!("expected three definitions");
        };
        assert_eq!(product.kind_name(), "ObjectTypeDefinition");
        assert!(product.is_type_definition());
        assert_eq!(product.field_definitions().len(), 1);
        assert_eq!(node.kind_name(), "InterfaceTypeExtension");
        assert_eq!(node.type_kind(), Some(TypeKind::Interface));
        assert!(node.is_type_extension());
        assert_eq!(stream.kind_name(), "DirectiveDefinition");
        assert_eq!(stream.type_name(), None);
    }
}
