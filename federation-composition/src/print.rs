//! Prints a schema back to SDL the way federation tooling expects it.
//!
//! Types are sorted by name. Built-in and federation definitions are left out, but applications
//! of `@key`, `@extends`, `@external`, `@requires` and `@provides` are printed where they were
//! declared. Types assembled only from `extend` blocks print as extensions.

use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::ast::Value;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ExtendedType;
use itertools::Itertools;

use crate::directives::directive_string_arg_value;
use crate::directives::is_federation_directive;
use crate::directives::is_specified_directive;
use crate::normalize::default_root_operation_name;
use crate::utils::ExtendedTypeExt;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";
const FEDERATION_TYPE_NAMES: [&str; 4] = ["_Service", "_Any", "_Entity", "_FieldSet"];
const FEDERATION_QUERY_FIELDS: [&str; 2] = ["_service", "_entities"];

pub fn print_schema(schema: &Schema) -> String {
    let mut parts = Vec::new();
    parts.extend(print_schema_definition(schema));
    parts.extend(
        schema
            .directive_definitions
            .values()
            .filter(|directive| {
                !is_specified_directive(&directive.name) && !is_federation_directive(&directive.name)
            })
            .map(|directive| print_directive_definition(directive)),
    );
    parts.extend(
        schema
            .types
            .iter()
            .filter(|(name, ty)| !ty.is_built_in() && !FEDERATION_TYPE_NAMES.contains(&name.as_str()))
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, ty)| print_type(schema, ty)),
    );
    let mut sdl = parts.join("\n\n");
    sdl.push('\n');
    sdl
}

/// Omitted when every root operation uses its default type name.
fn print_schema_definition(schema: &Schema) -> Option<String> {
    let definition = &schema.schema_definition;
    let roots = [
        (ast::OperationType::Query, &definition.query),
        (ast::OperationType::Mutation, &definition.mutation),
        (ast::OperationType::Subscription, &definition.subscription),
    ];
    let uses_default_names = roots.iter().all(|(operation_type, root)| {
        root.as_ref()
            .is_none_or(|root| root.name == default_root_operation_name(*operation_type))
    });
    if uses_default_names {
        return None;
    }
    let operations = roots
        .iter()
        .filter_map(|(operation_type, root)| {
            let root = root.as_ref()?;
            Some(format!("  {operation_type}: {}", root.name))
        })
        .join("\n");
    Some(format!("schema {{\n{operations}\n}}"))
}

fn print_directive_definition(directive: &ast::DirectiveDefinition) -> String {
    format!(
        "{}directive @{}{}{} on {}",
        print_description(directive.description.as_deref(), "", true),
        directive.name,
        print_args(&directive.arguments, ""),
        if directive.repeatable { " repeatable" } else { "" },
        directive.locations.iter().join(" | "),
    )
}

fn print_type(schema: &Schema, ty: &ExtendedType) -> String {
    let extend = if ty.is_extension_only() { "extend " } else { "" };
    match ty {
        ExtendedType::Scalar(scalar) => {
            let specified_by = scalar
                .directives
                .get("specifiedBy")
                .and_then(|directive| directive_string_arg_value(directive, "url"))
                .map(|url| format!(" @specifiedBy(url: {})", Value::String(url.to_owned())))
                .unwrap_or_default();
            format!(
                "{}scalar {}{specified_by}",
                print_description(scalar.description.as_deref(), "", true),
                scalar.name,
            )
        }
        ExtendedType::Object(object) => {
            let is_query_root = schema
                .schema_definition
                .query
                .as_ref()
                .is_some_and(|query| query.name == object.name);
            format!(
                "{}{extend}type {}{}{}{}",
                print_description(object.description.as_deref(), "", true),
                object.name,
                print_implements(object.implements_interfaces.iter().map(|i| &i.name)),
                print_federation_directives(object.directives.iter().map(|d| &*d.node)),
                print_fields(
                    object
                        .fields
                        .values()
                        .filter(|field| !is_query_root || !FEDERATION_QUERY_FIELDS.contains(&field.name.as_str()))
                ),
            )
        }
        ExtendedType::Interface(interface) => format!(
            "{}{extend}interface {}{}{}{}",
            print_description(interface.description.as_deref(), "", true),
            interface.name,
            print_implements(interface.implements_interfaces.iter().map(|i| &i.name)),
            print_federation_directives(interface.directives.iter().map(|d| &*d.node)),
            print_fields(interface.fields.values()),
        ),
        ExtendedType::Union(union_) => {
            let members = if union_.members.is_empty() {
                String::new()
            } else {
                format!(" = {}", union_.members.iter().map(|m| &m.name).join(" | "))
            };
            format!(
                "{}{extend}union {}{members}",
                print_description(union_.description.as_deref(), "", true),
                union_.name,
            )
        }
        ExtendedType::Enum(enum_) => {
            let values = enum_
                .values
                .values()
                .enumerate()
                .map(|(i, value)| {
                    format!(
                        "{}  {}{}",
                        print_description(value.description.as_deref(), "  ", i == 0),
                        value.value,
                        print_deprecated(&value.directives),
                    )
                })
                .collect();
            format!(
                "{}{extend}enum {}{}",
                print_description(enum_.description.as_deref(), "", true),
                enum_.name,
                print_block(values),
            )
        }
        ExtendedType::InputObject(input) => {
            let fields = input
                .fields
                .values()
                .enumerate()
                .map(|(i, field)| {
                    format!(
                        "{}  {}",
                        print_description(field.description.as_deref(), "  ", i == 0),
                        print_input_value(field),
                    )
                })
                .collect();
            format!(
                "{}{extend}input {}{}",
                print_description(input.description.as_deref(), "", true),
                input.name,
                print_block(fields),
            )
        }
    }
}

fn print_implements<'a>(interfaces: impl ExactSizeIterator<Item = &'a apollo_compiler::Name>) -> String {
    if interfaces.len() == 0 {
        return String::new();
    }
    format!(" implements {}", interfaces.format(" & "))
}

fn print_fields<'a>(fields: impl Iterator<Item = &'a Component<ast::FieldDefinition>>) -> String {
    let fields = fields
        .enumerate()
        .map(|(i, field)| {
            format!(
                "{}  {}{}: {}{}{}",
                print_description(field.description.as_deref(), "  ", i == 0),
                field.name,
                print_args(&field.arguments, "  "),
                field.ty,
                print_deprecated(&field.directives),
                print_federation_directives(field.directives.iter().map(|d| &**d)),
            )
        })
        .collect();
    print_block(fields)
}

fn print_block(items: Vec<String>) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!(" {{\n{}\n}}", items.join("\n"))
}

/// Arguments print on one line unless one of them has a description.
fn print_args(args: &[Node<ast::InputValueDefinition>], indentation: &str) -> String {
    if args.is_empty() {
        return String::new();
    }
    if args.iter().all(|arg| arg.description.is_none()) {
        return format!("({})", args.iter().map(|arg| print_input_value(arg)).join(", "));
    }
    let nested = format!("  {indentation}");
    let args = args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            format!(
                "{}{nested}{}",
                print_description(arg.description.as_deref(), &nested, i == 0),
                print_input_value(arg),
            )
        })
        .join("\n");
    format!("(\n{args}\n{indentation})")
}

fn print_input_value(value: &ast::InputValueDefinition) -> String {
    let default_value = value
        .default_value
        .as_ref()
        .map(|default_value| format!(" = {default_value}"))
        .unwrap_or_default();
    format!(
        "{}: {}{default_value}{}",
        value.name,
        value.ty,
        print_deprecated(&value.directives),
    )
}

fn print_deprecated(directives: &ast::DirectiveList) -> String {
    let Some(deprecated) = directives.get("deprecated") else {
        return String::new();
    };
    match directive_string_arg_value(deprecated, "reason") {
        Some(reason) if reason != DEFAULT_DEPRECATION_REASON => {
            format!(" @deprecated(reason: {})", Value::String(reason.to_owned()))
        }
        _ => " @deprecated".to_owned(),
    }
}

/// Federation directive applications, printed once even when repeated across extensions.
fn print_federation_directives<'a>(directives: impl Iterator<Item = &'a ast::Directive>) -> String {
    directives
        .filter(|directive| is_federation_directive(&directive.name))
        .map(|directive| directive.to_string())
        .unique()
        .map(|directive| format!(" {directive}"))
        .collect()
}

fn print_description(description: Option<&str>, indentation: &str, first_in_block: bool) -> String {
    let Some(description) = description else {
        return String::new();
    };
    let block_string = print_block_string(description, description.len() > 70);
    let prefix = if !indentation.is_empty() && !first_in_block {
        format!("\n{indentation}")
    } else {
        indentation.to_owned()
    };
    format!(
        "{prefix}{}\n",
        block_string.replace('\n', &format!("\n{indentation}"))
    )
}

fn print_block_string(value: &str, prefer_multiple_lines: bool) -> String {
    let is_single_line = !value.contains('\n');
    let has_leading_space = value.starts_with([' ', '\t']);
    let has_trailing_quote = value.ends_with('"');
    let has_trailing_slash = value.ends_with('\\');
    let print_as_multiple_lines =
        !is_single_line || has_trailing_quote || has_trailing_slash || prefer_multiple_lines;

    let mut result = String::new();
    if print_as_multiple_lines && !(is_single_line && has_leading_space) {
        result.push('\n');
    }
    result.push_str(value);
    if print_as_multiple_lines {
        result.push('\n');
    }
    format!("\"\"\"{}\"\"\"", result.replace("\"\"\"", "\\\"\"\""))
}
