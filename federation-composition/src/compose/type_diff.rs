//! Structural comparison of two definitions of the same name coming from different services.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;

use crate::utils::DefinitionExt;

/// What differs between two type or directive definitions.
///
/// `fields` and `input_values` map a name to the printed types seen for it: a single entry means
/// only one side declares it, two entries mean both declare it with different types. Names with
/// identical types on both sides are absent. Field arguments are keyed as `field(arg:)`.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TypeDiff {
    pub(crate) name: Option<(Name, Name)>,
    pub(crate) kind: Option<(&'static str, &'static str)>,
    pub(crate) fields: IndexMap<String, Vec<String>>,
    pub(crate) input_values: IndexMap<String, Vec<String>>,
    pub(crate) union_types: IndexSet<Name>,
    pub(crate) enum_values: IndexSet<Name>,
    pub(crate) locations: IndexSet<String>,
    pub(crate) repeatable: bool,
}

impl TypeDiff {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.kind.is_none()
            && self.fields.is_empty()
            && self.input_values.is_empty()
            && self.union_types.is_empty()
            && self.enum_values.is_empty()
            && self.locations.is_empty()
            && !self.repeatable
    }

    /// Both sides declare the same field names; only their types may differ.
    pub(crate) fn has_same_field_shape(&self) -> bool {
        self.fields.values().all(|types| types.len() == 2)
    }

    fn record_field(&mut self, name: String, ty: &ast::Type) {
        record_type(&mut self.fields, name, ty.to_string());
    }

    fn record_input_value(&mut self, name: String, ty: &ast::Type) {
        record_type(&mut self.input_values, name, ty.to_string());
    }

    fn visit_fields(&mut self, fields: &[Node<ast::FieldDefinition>]) {
        for field in fields {
            self.record_field(field.name.to_string(), &field.ty);
            for argument in &field.arguments {
                self.record_input_value(format!("{}({}:)", field.name, argument.name), &argument.ty);
            }
        }
    }

    fn visit_input_values(&mut self, values: &[Node<ast::InputValueDefinition>]) {
        for value in values {
            self.record_input_value(value.name.to_string(), &value.ty);
        }
    }

    fn visit(&mut self, definition: &Definition) {
        match definition {
            Definition::ObjectTypeDefinition(_)
            | Definition::ObjectTypeExtension(_)
            | Definition::InterfaceTypeDefinition(_)
            | Definition::InterfaceTypeExtension(_) => {
                self.visit_fields(definition.field_definitions());
            }
            Definition::InputObjectTypeDefinition(input) => self.visit_input_values(&input.fields),
            Definition::InputObjectTypeExtension(input) => self.visit_input_values(&input.fields),
            Definition::UnionTypeDefinition(union_) => toggle_all(&mut self.union_types, &union_.members),
            Definition::UnionTypeExtension(union_) => toggle_all(&mut self.union_types, &union_.members),
            Definition::EnumTypeDefinition(enum_) => {
                toggle_all(&mut self.enum_values, enum_.values.iter().map(|v| &v.value))
            }
            Definition::EnumTypeExtension(enum_) => {
                toggle_all(&mut self.enum_values, enum_.values.iter().map(|v| &v.value))
            }
            Definition::DirectiveDefinition(directive) => {
                let locations: Vec<String> = directive.locations.iter().map(|l| l.to_string()).collect();
                toggle_all(&mut self.locations, &locations);
                self.visit_input_values(&directive.arguments);
                self.repeatable ^= directive.repeatable;
            }
            _ => {}
        }
    }
}

fn record_type(map: &mut IndexMap<String, Vec<String>>, name: String, ty: String) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, vec![ty]);
        }
        Some(types) if types[0] == ty => {
            map.shift_remove(&name);
        }
        Some(types) => types.push(ty),
    }
}

fn toggle_all<'a, T: Clone + Eq + std::hash::Hash + 'a>(
    set: &mut IndexSet<T>,
    items: impl IntoIterator<Item = &'a T>,
) {
    for item in items {
        if !set.shift_remove(item) {
            set.insert(item.clone());
        }
    }
}

fn definition_name(definition: &Definition) -> Option<&Name> {
    match definition {
        Definition::DirectiveDefinition(directive) => Some(&directive.name),
        other => other.type_name(),
    }
}

pub(crate) fn diff_type_nodes(first: &Definition, second: &Definition) -> TypeDiff {
    let mut diff = TypeDiff::default();
    diff.visit(first);
    diff.visit(second);
    if let (Some(first_name), Some(second_name)) = (definition_name(first), definition_name(second)) {
        if first_name != second_name {
            diff.name = Some((first_name.clone(), second_name.clone()));
        }
    }
    if first.kind_name() != second.kind_name() {
        diff.kind = Some((first.kind_name(), second.kind_name()));
    }
    diff
}

/// Two definitions are equivalent when they share name and kind and declare the same members
/// with the same types.
pub(crate) fn type_nodes_are_equivalent(first: &Definition, second: &Definition) -> bool {
    diff_type_nodes(first, second).is_empty()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn definitions(sdl: &str) -> Vec<Definition> {
        ast::Document::parse(sdl, "diff.graphql").unwrap().definitions
    }

    #[test]
    fn identical_objects_are_equivalent() {
        let defs = definitions(
            "type Color { id: ID! value(format: String): String }\ntype Color { value(format: String): String id: ID! }",
        );
        assert!(type_nodes_are_equivalent(&defs[0], &defs[1]));
    }

    #[test]
    fn reports_field_type_and_shape_differences() {
        let defs = definitions("type Color { id: ID! value: String }\ntype Color { id: String value: String }");
        let diff = diff_type_nodes(&defs[0], &defs[1]);
        assert!(diff.has_same_field_shape());
        assert_eq!(diff.fields.get("id"), Some(&vec!["ID!".to_owned(), "String".to_owned()]));

        let defs = definitions("type Color { id: ID! }\ntype Color { id: ID! name: String }");
        let diff = diff_type_nodes(&defs[0], &defs[1]);
        assert!(!diff.has_same_field_shape());
        assert_eq!(diff.fields.get("name"), Some(&vec!["String".to_owned()]));
    }

    #[test]
    fn reports_kind_differences() {
        let defs = definitions("type Node { id: ID! }\ninterface Node { id: ID! }");
        let diff = diff_type_nodes(&defs[0], &defs[1]);
        assert_eq!(diff.kind, Some(("ObjectTypeDefinition", "InterfaceTypeDefinition")));
        assert!(diff.fields.is_empty());
    }

    #[test]
    fn compares_union_members_and_enum_values_as_sets() {
        let defs = definitions("union U = A | B\nunion U = B | A\nenum E { A B }\nenum E { A C }");
        assert!(type_nodes_are_equivalent(&defs[0], &defs[1]));
        let diff = diff_type_nodes(&defs[2], &defs[3]);
        assert_eq!(
            diff.enum_values.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            ["B", "C"]
        );
    }

    #[test]
    fn compares_directive_definitions() {
        let defs = definitions(
            "directive @stream(initialCount: Int) on FIELD\n\
             directive @stream(initialCount: Int) on FIELD\n\
             directive @stream(initialCount: Int!) repeatable on FIELD | QUERY",
        );
        assert!(type_nodes_are_equivalent(&defs[0], &defs[1]));
        let diff = diff_type_nodes(&defs[0], &defs[2]);
        assert!(diff.repeatable);
        assert!(diff.locations.contains("QUERY"));
        assert_eq!(diff.input_values.len(), 1);
    }
}
