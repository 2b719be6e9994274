//! A single service's own schema, extended with the fields the gateway uses to talk to it:
//! `_service { sdl }` and, when the service declares entities, `_entities(representations:)`.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::ast::Definition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::name;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::validation::Valid;
use apollo_compiler::validation::WithErrors;
use serde_json::Value;
use tracing::debug;

use crate::directives::DirectiveApplications;
use crate::directives::KEY_DIRECTIVE_NAME;
use crate::directives::federation_directive_definitions;
use crate::directives::is_federation_directive;
use crate::error::EntityResolutionError;
use crate::error::FederationError;
use crate::normalize::strip_common_primitives;
use crate::print::print_schema;
use crate::subgraph::spec::ANY_SCALAR_NAME;
use crate::subgraph::spec::ENTITIES_QUERY;
use crate::subgraph::spec::ENTITY_UNION_NAME;
use crate::subgraph::spec::SERVICE_SDL_QUERY;
use crate::subgraph::spec::SERVICE_TYPE;

pub(crate) mod spec;

const TYPENAME_FIELD: &str = "__typename";

pub type ResolverError = Box<dyn std::error::Error + Send + Sync>;

/// Turns an entity representation (`{ "__typename": ..., <key fields> }`) into the entity.
///
/// Implemented for every `Fn(&Value) -> Result<Value, ResolverError>`.
pub trait ReferenceResolver: Send + Sync {
    fn resolve_reference(&self, representation: &Value) -> Result<Value, ResolverError>;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&Value) -> Result<Value, ResolverError> + Send + Sync,
{
    fn resolve_reference(&self, representation: &Value) -> Result<Value, ResolverError> {
        self(representation)
    }
}

/// A service schema ready to be served to a gateway.
#[derive(Clone)]
pub struct FederatedSchema {
    schema: Valid<Schema>,
    service_sdl: String,
    resolvers: IndexMap<Name, Arc<dyn ReferenceResolver>>,
}

impl FederatedSchema {
    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    /// What `_service { sdl }` returns: the service's own SDL, federation directive usages
    /// included, federation definitions left out.
    pub fn service_sdl(&self) -> &str {
        &self.service_sdl
    }

    /// The members of `_Entity`, that is every object type carrying a `@key`.
    pub fn entity_types(&self) -> impl Iterator<Item = &Name> {
        match self.schema.types.get(&ENTITY_UNION_NAME) {
            Some(ExtendedType::Union(entities)) => Some(entities.members.iter().map(|member| &member.name)),
            _ => None,
        }
        .into_iter()
        .flatten()
    }

    /// Registers the resolver used for representations of `type_name`. Types without a resolver
    /// resolve to the representation itself.
    pub fn with_reference_resolver(
        mut self,
        type_name: &str,
        resolver: impl ReferenceResolver + 'static,
    ) -> Result<Self, FederationError> {
        let Some(object) = self.schema.get_object(type_name) else {
            return Err(FederationError::UnknownType {
                type_name: type_name.to_owned(),
            });
        };
        let name = object.name.clone();
        self.resolvers.insert(name, Arc::new(resolver));
        Ok(self)
    }

    /// Resolves every representation independently; one failing does not affect the others.
    pub fn resolve_entities(&self, representations: &[Value]) -> Vec<Result<Value, EntityResolutionError>> {
        representations
            .iter()
            .map(|representation| self.resolve_entity(representation))
            .collect()
    }

    fn resolve_entity(&self, representation: &Value) -> Result<Value, EntityResolutionError> {
        let Some(type_name) = representation.get(TYPENAME_FIELD).and_then(Value::as_str) else {
            return Err(EntityResolutionError::MissingTypename);
        };
        if self.schema.get_object(type_name).is_none() {
            return Err(EntityResolutionError::UnknownEntityType {
                type_name: type_name.to_owned(),
            });
        }
        let resolved = match self.resolvers.get(type_name) {
            Some(resolver) => {
                resolver
                    .resolve_reference(representation)
                    .map_err(|error| EntityResolutionError::Resolver {
                        type_name: type_name.to_owned(),
                        message: error.to_string(),
                    })?
            }
            None => representation.clone(),
        };
        Ok(match resolved {
            Value::Object(mut entity) => {
                entity.insert(TYPENAME_FIELD.to_owned(), Value::String(type_name.to_owned()));
                Value::Object(entity)
            }
            other => other,
        })
    }
}

impl Debug for FederatedSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedSchema")
            .field("service_sdl", &self.service_sdl)
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builds the schema one service serves to the gateway.
///
/// Federation primitives the service declared itself are replaced with the standard ones, and
/// extensions of types the service never defines are accepted as definitions.
#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "build_federated_schema")
)]
pub fn build_federated_schema(type_defs: &ast::Document) -> Result<FederatedSchema, FederationError> {
    let stripped = strip_common_primitives(type_defs);
    let mut document = ast::Document::new();
    document.sources = stripped.sources.clone();
    document.definitions.extend(federation_directive_definitions());
    document.definitions.extend(
        stripped
            .definitions
            .iter()
            .filter(|definition| {
                !matches!(definition, Definition::DirectiveDefinition(directive) if is_federation_directive(&directive.name))
            })
            .cloned(),
    );

    let mut schema = Schema::builder()
        .adopt_orphan_extensions()
        .add_ast(&document)
        .build()
        .map_err(|WithErrors { errors, .. }| FederationError::InvalidGraphQL {
            message: errors.to_string(),
        })?;
    let service_sdl = print_schema(&schema);

    populate_federation_types(&mut schema);
    let schema = schema.validate().map_err(|WithErrors { errors, .. }| FederationError::InvalidGraphQL {
        message: errors.to_string(),
    })?;
    debug!(
        types = schema.types.len(),
        sdl_len = service_sdl.len(),
        "built federated service schema"
    );

    Ok(FederatedSchema {
        schema,
        service_sdl,
        resolvers: IndexMap::default(),
    })
}

fn populate_federation_types(schema: &mut Schema) {
    schema
        .types
        .entry(SERVICE_TYPE)
        .or_insert_with(spec::service_object_type_definition);
    schema
        .types
        .entry(ANY_SCALAR_NAME)
        .or_insert_with(spec::any_scalar_definition);

    let entities = locate_entities(schema);
    let entities_present = !entities.is_empty();
    if entities_present {
        schema
            .types
            .entry(ENTITY_UNION_NAME)
            .or_insert_with(|| spec::entity_union_definition(entities));
    }

    let query_type_name = schema
        .schema_definition
        .make_mut()
        .query
        .get_or_insert(ComponentName::from(name!("Query")))
        .name
        .clone();
    if let ExtendedType::Object(query_type) = schema
        .types
        .entry(query_type_name.clone())
        .or_insert_with(|| {
            ExtendedType::Object(Node::new(ObjectType {
                description: None,
                name: query_type_name,
                implements_interfaces: IndexSet::default(),
                directives: Default::default(),
                fields: IndexMap::default(),
            }))
        })
    {
        let query_type = query_type.make_mut();
        query_type
            .fields
            .entry(SERVICE_SDL_QUERY)
            .or_insert_with(spec::service_sdl_query_field);
        if entities_present {
            query_type
                .fields
                .entry(ENTITIES_QUERY)
                .or_insert_with(spec::entities_query_field);
        }
    }
}

fn locate_entities(schema: &Schema) -> IndexSet<ComponentName> {
    schema
        .types
        .iter()
        .filter(|(_, extended_type)| {
            matches!(extended_type, ExtendedType::Object(object) if object.directives.has_directive(&KEY_DIRECTIVE_NAME))
        })
        .map(|(name, _)| ComponentName::from(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const ACCOUNTS: &str = r#"
        extend type Query { me: User }
        type User @key(fields: "id") {
          id: ID!
          name: String
        }
    "#;

    fn build(sdl: &str) -> FederatedSchema {
        let document = ast::Document::parse(sdl, "accounts.graphql").unwrap();
        build_federated_schema(&document).unwrap()
    }

    #[test]
    fn service_sdl_keeps_federation_usages_only() {
        let schema = build(&format!(
            "scalar _Any\ntype _Service {{ sdl: String }}\ndirective @key(fields: String!) on OBJECT\n{ACCOUNTS}"
        ));
        insta::assert_snapshot!(schema.service_sdl(), @r###"
        extend type Query {
          me: User
        }

        type User @key(fields: "id") {
          id: ID!
          name: String
        }
        "###);
    }

    #[test]
    fn adds_entity_fields_for_keyed_types() {
        let schema = build(ACCOUNTS);
        let query = schema.schema().get_object("Query").unwrap();
        let fields: Vec<&str> = query.fields.keys().map(|name| name.as_str()).collect();
        assert_eq!(fields, ["me", "_service", "_entities"]);
        assert_eq!(schema.entity_types().map(Name::as_str).collect::<Vec<_>>(), ["User"]);
        assert_eq!(
            query.fields["_entities"].to_string(),
            "_entities(representations: [_Any!]!): [_Entity]!"
        );
    }

    #[test]
    fn omits_entities_without_keys() {
        let schema = build("type Query { hello: String }");
        let query = schema.schema().get_object("Query").unwrap();
        assert!(query.fields.contains_key("_service"));
        assert!(!query.fields.contains_key("_entities"));
        assert!(!schema.schema().types.contains_key("_Entity"));
        assert_eq!(schema.entity_types().count(), 0);
    }

    #[test]
    fn resolves_representations_independently() {
        let schema = build(ACCOUNTS)
            .with_reference_resolver("User", |representation: &Value| -> Result<Value, ResolverError> {
                match representation["id"].as_str() {
                    Some("1") => Ok(json!({ "id": "1", "name": "Ada" })),
                    _ => Err("no such user".into()),
                }
            })
            .unwrap();
        let results = schema.resolve_entities(&[
            json!({ "__typename": "User", "id": "1" }),
            json!({ "__typename": "User", "id": "2" }),
            json!({ "__typename": "Review", "id": "3" }),
            json!({ "id": "4" }),
        ]);
        assert_eq!(
            results,
            [
                Ok(json!({ "__typename": "User", "id": "1", "name": "Ada" })),
                Err(EntityResolutionError::Resolver {
                    type_name: "User".to_owned(),
                    message: "no such user".to_owned(),
                }),
                Err(EntityResolutionError::UnknownEntityType {
                    type_name: "Review".to_owned(),
                }),
                Err(EntityResolutionError::MissingTypename),
            ]
        );
        assert_eq!(
            results[2].as_ref().unwrap_err().to_string(),
            "The _entities resolver tried to load an entity for type \"Review\", but no object type of that name was found in the schema"
        );
    }

    #[test]
    fn resolves_to_the_representation_by_default() {
        let schema = build(ACCOUNTS);
        let representation = json!({ "__typename": "User", "id": "1" });
        assert_eq!(
            schema.resolve_entities(std::slice::from_ref(&representation)),
            [Ok(representation)]
        );
    }

    #[test]
    fn rejects_resolvers_for_unknown_types() {
        let error = build(ACCOUNTS)
            .with_reference_resolver("Review", |representation: &Value| -> Result<Value, ResolverError> {
                Ok(representation.clone())
            })
            .unwrap_err();
        assert!(matches!(error, FederationError::UnknownType { type_name } if type_name == "Review"));
    }
}
