//! Federation metadata recorded next to the composed schema: which service owns what, and the
//! parsed `@key`, `@requires` and `@provides` selections.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::schema::ExtendedType;
use tracing::trace;

use crate::compose::maps::ServiceMaps;
use crate::directives::DirectiveApplications;
use crate::directives::PROVIDES_DIRECTIVE_NAME;
use crate::directives::REQUIRES_DIRECTIVE_NAME;
use crate::directives::fields_argument;
use crate::error::FederationError;
use crate::field_set::FieldSet;

/// A field an extension declared `@external`, removed from the extension before composition.
#[derive(Debug, Clone)]
pub struct ExternalFieldDefinition {
    pub field: Node<ast::FieldDefinition>,
    pub parent_type_name: Name,
    pub service_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct FederationTypeMetadata {
    /// The service owning the base definition. `None` for value types.
    pub service_name: Option<String>,
    pub is_value_type: bool,
    /// service name -> the selections of each `@key` that service declared
    pub keys: Option<IndexMap<String, Vec<FieldSet>>>,
    /// service name -> fields that service declared `@external` on this type
    pub externals: IndexMap<String, Vec<ExternalFieldDefinition>>,
}

/// A field without a `service_name` belongs to the service owning its parent type.
#[derive(Debug, Clone, Default)]
pub struct FederationFieldMetadata {
    pub service_name: Option<String>,
    pub requires: Option<FieldSet>,
    pub provides: Option<FieldSet>,
    pub belongs_to_value_type: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FederationDirectiveMetadata {
    /// service name -> that service's definition, restricted to executable locations
    pub directive_definitions: IndexMap<String, Node<ast::DirectiveDefinition>>,
}

/// Side tables describing the composed schema, keyed by type, field and directive name.
#[derive(Debug, Clone, Default)]
pub struct FederationMetadata {
    pub types: IndexMap<Name, FederationTypeMetadata>,
    /// type name -> field name -> metadata
    pub fields: IndexMap<Name, IndexMap<Name, FederationFieldMetadata>>,
    pub directives: IndexMap<Name, FederationDirectiveMetadata>,
}

impl FederationMetadata {
    pub fn type_metadata(&self, type_name: &str) -> Option<&FederationTypeMetadata> {
        self.types.get(type_name)
    }

    pub fn field_metadata(&self, type_name: &str, field_name: &str) -> Option<&FederationFieldMetadata> {
        self.fields.get(type_name)?.get(field_name)
    }

    pub fn directive_metadata(&self, directive_name: &str) -> Option<&FederationDirectiveMetadata> {
        self.directives.get(directive_name)
    }

    fn field_metadata_mut(&mut self, type_name: &Name, field_name: &Name) -> &mut FederationFieldMetadata {
        self.fields
            .entry(type_name.clone())
            .or_default()
            .entry(field_name.clone())
            .or_default()
    }
}

fn parsed_fields_argument(directive: &ast::Directive) -> Result<Option<FieldSet>, FederationError> {
    fields_argument(directive).map(FieldSet::parse).transpose()
}

#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "add_federation_metadata")
)]
pub(crate) fn add_federation_metadata(
    schema: &Schema,
    maps: &ServiceMaps,
) -> Result<FederationMetadata, FederationError> {
    let mut metadata = FederationMetadata::default();

    for (type_name, ownership) in &maps.type_to_service {
        let Some(extended_type) = schema.types.get(type_name) else {
            continue;
        };
        let is_value_type = maps.is_value_type(type_name);
        let service_name = if is_value_type {
            None
        } else {
            ownership.owning_service.clone()
        };
        metadata.types.insert(
            type_name.clone(),
            FederationTypeMetadata {
                service_name: service_name.clone(),
                is_value_type,
                keys: maps.key_directives.get(type_name).cloned(),
                externals: IndexMap::default(),
            },
        );

        if let ExtendedType::Object(object) = extended_type {
            for (field_name, field) in &object.fields {
                let provides = field.directives.directives_named(&PROVIDES_DIRECTIVE_NAME);
                let Some(provides) = provides.first().copied() else {
                    continue;
                };
                let field_metadata = metadata.field_metadata_mut(type_name, field_name);
                field_metadata.service_name = service_name.clone();
                field_metadata.provides = parsed_fields_argument(provides)?;
                field_metadata.belongs_to_value_type = is_value_type;
            }
        }

        for (field_name, extending_service) in &ownership.extension_fields_to_owning_service {
            let field = match extended_type {
                ExtendedType::Object(object) => object.fields.get(field_name),
                ExtendedType::Interface(interface) => interface.fields.get(field_name),
                _ => None,
            };
            let Some(field) = field else {
                continue;
            };
            let requires = match field.directives.directives_named(&REQUIRES_DIRECTIVE_NAME).first() {
                Some(requires) => parsed_fields_argument(requires)?,
                None => None,
            };
            let field_metadata = metadata.field_metadata_mut(type_name, field_name);
            field_metadata.service_name = Some(extending_service.clone());
            if requires.is_some() {
                field_metadata.requires = requires;
            }
        }
    }

    for external in &maps.external_fields {
        if !schema.types.contains_key(&external.parent_type_name) {
            continue;
        }
        metadata
            .types
            .entry(external.parent_type_name.clone())
            .or_default()
            .externals
            .entry(external.service_name.clone())
            .or_default()
            .push(external.clone());
    }

    for (directive_name, definitions) in &maps.directive_definitions {
        if !schema.directive_definitions.contains_key(directive_name) {
            continue;
        }
        metadata.directives.insert(
            directive_name.clone(),
            FederationDirectiveMetadata {
                directive_definitions: definitions.clone(),
            },
        );
    }

    trace!(
        types = metadata.types.len(),
        directives = metadata.directives.len(),
        "attached federation metadata"
    );
    Ok(metadata)
}
