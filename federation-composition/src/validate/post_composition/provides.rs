use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::schema::ObjectType;

use super::AbstractType;
use super::abstract_type;
use super::located;
use super::object_types;
use crate::compose::ComposedSchema;
use crate::compose::metadata::FederationFieldMetadata;
use crate::directives::PROVIDES_DIRECTIVE_NAME;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_service_and_type;
use crate::field_set::FieldSet;
use crate::validate::PostCompositionValidator;

/// A field carrying a `@provides`, along with the object type it returns.
struct ProvidingField<'a> {
    type_name: &'a Name,
    field_name: &'a Name,
    field: &'a FieldDefinition,
    service_name: &'a str,
    provides: &'a FieldSet,
    returned_type: &'a Name,
    returned_object: &'a Node<ObjectType>,
}

impl ProvidingField<'_> {
    fn log_prefix(&self) -> String {
        log_service_and_type(self.service_name, self.type_name, Some(self.field_name))
    }
}

fn provides_location(field: &FieldDefinition) -> Option<SourceSpan> {
    field
        .directives
        .get_all(&PROVIDES_DIRECTIVE_NAME)
        .next()
        .and_then(|directive| directive.location())
}

/// Fields with a `@provides` declared by a known service and returning an object type, lists
/// included.
fn providing_fields(composed: &ComposedSchema) -> impl Iterator<Item = ProvidingField<'_>> {
    let schema = &composed.schema;
    object_types(schema).flat_map(move |(type_name, object)| {
        object.fields.iter().filter_map(move |(field_name, field)| {
            let metadata = composed.field_metadata(type_name, field_name)?;
            let service_name = metadata.service_name.as_deref()?;
            let provides = metadata.provides.as_ref()?;
            let returned_type = field.ty.inner_named_type();
            let returned_object = schema.get_object(returned_type)?;
            Some(ProvidingField {
                type_name,
                field_name,
                field,
                service_name,
                provides,
                returned_type,
                returned_object,
            })
        })
    })
}

/// Every field a `@provides` selects must be declared `@external` by the providing service.
pub(crate) struct ProvidesFieldsMissingExternal;

impl PostCompositionValidator for ProvidesFieldsMissingExternal {
    fn name(&self) -> &'static str {
        "providesFieldsMissingExternal"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for providing in providing_fields(composed) {
            let externals = composed
                .type_metadata(providing.returned_type)
                .and_then(|metadata| metadata.externals.get(providing.service_name));
            for selection in providing.provides.iter() {
                let is_external = externals.is_some_and(|externals| {
                    externals.iter().any(|external| external.field.name.as_str() == selection.field_name.as_str())
                });
                if is_external {
                    continue;
                }
                let error = CompositionError::new(
                    ErrorCode::ProvidesFieldsMissingExternal,
                    format!(
                        "{}provides the field `{}` and requires {}.{} to be marked as @external.",
                        providing.log_prefix(),
                        selection.field_name,
                        providing.returned_type,
                        selection.field_name,
                    ),
                );
                errors.push(located(composed, error, [provides_location(providing.field)]));
            }
        }
        Ok(errors)
    }
}

/// A `@provides` must select existing fields, none of which may return a list, an interface or a
/// union.
pub(crate) struct ProvidesFieldsSelectInvalidType;

impl PostCompositionValidator for ProvidesFieldsSelectInvalidType {
    fn name(&self) -> &'static str {
        "providesFieldsSelectInvalidType"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for providing in providing_fields(composed) {
            let returned_type = providing.returned_type;
            for selection in providing.provides.iter() {
                let name = &selection.field_name;
                let Some(selected) = providing.returned_object.fields.get(name.as_str()) else {
                    let error = CompositionError::new(
                        ErrorCode::ProvidesFieldsSelectInvalidType,
                        format!(
                            "{}A @provides selects {name}, but {returned_type}.{name} could not be found",
                            providing.log_prefix(),
                        ),
                    );
                    errors.push(located(composed, error, [provides_location(providing.field)]));
                    continue;
                };
                let problem = if selected.ty.is_list() {
                    "which is a list type. A field cannot @provide lists."
                } else {
                    match abstract_type(&composed.schema, &selected.ty) {
                        Some(AbstractType::Interface) => {
                            "which is an interface type. A field cannot @provide interfaces."
                        }
                        Some(AbstractType::Union) => "which is a union type. A field cannot @provide union types.",
                        None => continue,
                    }
                };
                let error = CompositionError::new(
                    ErrorCode::ProvidesFieldsSelectInvalidType,
                    format!(
                        "{}A @provides selects {returned_type}.{name}, {problem}",
                        providing.log_prefix(),
                    ),
                );
                errors.push(located(composed, error, [provides_location(providing.field)]));
            }
        }
        Ok(errors)
    }
}

/// A `@provides` may only be used on fields returning an entity or a list of entities.
pub(crate) struct ProvidesNotOnEntity;

impl ProvidesNotOnEntity {
    fn check_field(
        composed: &ComposedSchema,
        type_name: &Name,
        field_name: &Name,
        field: &FieldDefinition,
        metadata: &FederationFieldMetadata,
    ) -> Result<Option<CompositionError>, FederationError> {
        let Some(service_name) = metadata.service_name.as_deref() else {
            return Err(FederationError::internal(format!(
                "field {type_name}.{field_name} has @provides information but no service name"
            )));
        };
        let prefix = log_service_and_type(service_name, type_name, Some(field_name));
        let returned_type = field.ty.inner_named_type();
        let message = match composed.schema.get_object(returned_type) {
            None => format!(
                "{prefix}uses the @provides directive but `{type_name}.{field_name}` returns `{}`, which is not an Object or List type. @provides can only be used on Object types with at least one @key, or Lists of such Objects.",
                field.ty,
            ),
            Some(_) => {
                let has_keys = composed
                    .type_metadata(returned_type)
                    .and_then(|returned| returned.keys.as_ref())
                    .is_some_and(|keys| !keys.is_empty());
                if has_keys {
                    return Ok(None);
                }
                format!(
                    "{prefix}uses the @provides directive but `{type_name}.{field_name}` does not return a type that has a @key. Try adding a @key to the `{returned_type}` type."
                )
            }
        };
        let error = CompositionError::new(ErrorCode::ProvidesNotOnEntity, message);
        Ok(Some(located(composed, error, [provides_location(field)])))
    }
}

impl PostCompositionValidator for ProvidesNotOnEntity {
    fn name(&self) -> &'static str {
        "providesNotOnEntity"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (type_name, object) in object_types(&composed.schema) {
            for (field_name, field) in &object.fields {
                let Some(metadata) = composed.field_metadata(type_name, field_name) else {
                    continue;
                };
                if metadata.provides.is_none() || metadata.belongs_to_value_type {
                    continue;
                }
                errors.extend(Self::check_field(composed, type_name, field_name, field, metadata)?);
            }
        }
        Ok(errors)
    }
}
