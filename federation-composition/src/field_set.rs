//! Field sets are the selection strings carried by `@key`, `@requires` and `@provides`, for
//! example `"sku color { id value }"`.

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Schema;
use apollo_compiler::ast;
use itertools::Itertools;
use serde::Serialize;

use crate::error::FederationError;

/// A parsed field set: an ordered list of selected fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FieldSet {
    pub selections: Vec<FieldSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSelection {
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subselections: Option<FieldSet>,
}

impl FieldSet {
    /// Parses `source` as the body of an anonymous query. Aliases, arguments and fragments have no
    /// meaning in a field set and are rejected.
    pub fn parse(source: &str) -> Result<Self, FederationError> {
        let invalid = |message: String| FederationError::InvalidFieldSet {
            field_set: source.to_owned(),
            message,
        };
        let document = ast::Document::parse(format!("query {{ {source}\n}}"), "field_set.graphql")
            .map_err(|e| invalid(e.errors.to_string()))?;
        let [ast::Definition::OperationDefinition(operation)] = document.definitions.as_slice() else {
            return Err(invalid("expected a single selection set".to_owned()));
        };
        Self::from_selections(&operation.selection_set).map_err(invalid)
    }

    fn from_selections(selections: &[ast::Selection]) -> Result<Self, String> {
        let selections = selections
            .iter()
            .map(|selection| match selection {
                ast::Selection::Field(field) => {
                    if let Some(alias) = &field.alias {
                        return Err(format!("cannot use alias \"{alias}\" in a field set"));
                    }
                    if !field.arguments.is_empty() {
                        return Err(format!(
                            "field \"{}\" cannot take arguments in a field set",
                            field.name
                        ));
                    }
                    let subselections = if field.selection_set.is_empty() {
                        None
                    } else {
                        Some(Self::from_selections(&field.selection_set)?)
                    };
                    Ok(FieldSelection {
                        field_name: field.name.to_string(),
                        subselections,
                    })
                }
                ast::Selection::FragmentSpread(_) | ast::Selection::InlineFragment(_) => {
                    Err("fragments are not supported in a field set".to_owned())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selections })
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSelection> {
        self.selections.iter()
    }

    /// Whether `field_name` is selected at the top level of this field set.
    pub fn selects(&self, field_name: &str) -> bool {
        self.selections.iter().any(|s| s.field_name == field_name)
    }

    /// Structural equality that ignores the order of sibling selections at every level.
    ///
    /// Sibling field names are assumed to be unique.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        if self.selections.len() != other.selections.len() {
            return false;
        }
        let left = self.selections.iter().sorted_by(|a, b| a.field_name.cmp(&b.field_name));
        let right = other.selections.iter().sorted_by(|a, b| a.field_name.cmp(&b.field_name));
        left.zip(right).all(|(a, b)| {
            a.field_name == b.field_name
                && match (&a.subselections, &b.subselections) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.is_equivalent(b),
                    _ => false,
                }
        })
    }
}

/// Canonical single-line form, e.g. `sku color { id value }`.
impl Display for FieldSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, selection) in self.selections.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&selection.field_name)?;
            if let Some(subselections) = &selection.subselections {
                write!(f, " {{ {subselections} }}")?;
            }
        }
        Ok(())
    }
}

/// Searches `selections`, evaluated against `selection_set_type`, for a selection of
/// `field_to_find` made while the enclosing type is `type_to_find`.
///
/// Nested selections are followed through the return types of the composed schema's fields; a
/// selection on a field the schema does not know about, or on a non-object type, stops the search
/// along that branch.
pub fn selection_includes_field(
    schema: &Schema,
    selections: &FieldSet,
    selection_set_type: &str,
    type_to_find: &str,
    field_to_find: &str,
) -> bool {
    let Some(object) = schema.get_object(selection_set_type) else {
        return false;
    };
    for selection in selections.iter() {
        if selection.field_name == field_to_find && selection_set_type == type_to_find {
            return true;
        }
        let Some(field) = object.fields.get(selection.field_name.as_str()) else {
            continue;
        };
        let return_type = field.ty.inner_named_type();
        if schema.get_object(return_type).is_none() {
            continue;
        }
        if let Some(subselections) = &selection.subselections {
            if selection_includes_field(schema, subselections, return_type, type_to_find, field_to_find) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("id", "id")]
    #[case("  sku   upc ", "sku upc")]
    #[case("sku color { id value }", "sku color { id value }")]
    #[case("a { b { c d } } e", "a { b { c d } } e")]
    fn prints_canonical_form(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(FieldSet::parse(source).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("id {")]
    #[case("renamed: id")]
    #[case("... on Product { id }")]
    #[case("id(first: 1)")]
    fn rejects_invalid_field_sets(#[case] source: &str) {
        assert!(matches!(
            FieldSet::parse(source),
            Err(FederationError::InvalidFieldSet { .. })
        ));
    }

    #[test]
    fn equivalence_ignores_order_but_not_structure() {
        let parse = |s| FieldSet::parse(s).unwrap();
        assert!(parse("sku upc").is_equivalent(&parse("upc sku")));
        assert!(parse("a { x y } b").is_equivalent(&parse("b a { y x }")));
        assert!(!parse("sku").is_equivalent(&parse("sku upc")));
        assert!(!parse("a { x }").is_equivalent(&parse("a")));
        assert!(!parse("a { x }").is_equivalent(&parse("a { y }")));
    }

    #[test]
    fn printed_form_parses_back_to_the_same_tree() {
        for source in ["id", "sku color { id value }", "a { b { c } d } e"] {
            let tree = FieldSet::parse(source).unwrap();
            let reparsed = FieldSet::parse(&tree.to_string()).unwrap();
            assert!(reparsed.is_equivalent(&tree));
        }
    }

    #[test]
    fn finds_nested_field_usage() {
        let schema = Schema::parse(
            r#"
            type Query { user: User }
            type User { id: ID! roles: AccountRoles! }
            type AccountRoles { canWrite: Boolean permission: Permission }
            type Permission { status: String }
            "#,
            "schema.graphql",
        )
        .unwrap();
        let requires = FieldSet::parse("roles { canWrite permission { status } }").unwrap();
        assert!(selection_includes_field(&schema, &requires, "User", "AccountRoles", "canWrite"));
        assert!(selection_includes_field(&schema, &requires, "User", "Permission", "status"));
        assert!(!selection_includes_field(&schema, &requires, "User", "Permission", "canWrite"));
        assert!(!selection_includes_field(&schema, &requires, "User", "User", "status"));
    }
}
