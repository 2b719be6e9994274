//! The types and root fields every federated service exposes to the gateway.

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::name;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::ScalarType;
use apollo_compiler::schema::UnionType;
use apollo_compiler::ty;

pub(crate) const ANY_SCALAR_NAME: Name = name!("_Any");
pub(crate) const ENTITY_UNION_NAME: Name = name!("_Entity");
pub(crate) const SERVICE_TYPE: Name = name!("_Service");

pub(crate) const SERVICE_SDL_QUERY: Name = name!("_service");
pub(crate) const ENTITIES_QUERY: Name = name!("_entities");

const SDL_FIELD_NAME: Name = name!("sdl");
const REPRESENTATIONS_ARGUMENT_NAME: Name = name!("representations");

/// scalar _Any
pub(crate) fn any_scalar_definition() -> ExtendedType {
    ExtendedType::Scalar(Node::new(ScalarType {
        description: None,
        name: ANY_SCALAR_NAME,
        directives: Default::default(),
    }))
}

/// type _Service { sdl: String }
pub(crate) fn service_object_type_definition() -> ExtendedType {
    let mut fields = IndexMap::default();
    fields.insert(
        SDL_FIELD_NAME,
        Component::new(FieldDefinition {
            description: None,
            name: SDL_FIELD_NAME,
            arguments: Vec::new(),
            ty: ty!(String),
            directives: Default::default(),
        }),
    );
    ExtendedType::Object(Node::new(ObjectType {
        description: None,
        name: SERVICE_TYPE,
        implements_interfaces: IndexSet::default(),
        directives: Default::default(),
        fields,
    }))
}

/// union _Entity = A | B | ...
pub(crate) fn entity_union_definition(entities: IndexSet<ComponentName>) -> ExtendedType {
    ExtendedType::Union(Node::new(UnionType {
        description: None,
        name: ENTITY_UNION_NAME,
        directives: Default::default(),
        members: entities,
    }))
}

/// _service: _Service!
pub(crate) fn service_sdl_query_field() -> Component<FieldDefinition> {
    Component::new(FieldDefinition {
        description: None,
        name: SERVICE_SDL_QUERY,
        arguments: Vec::new(),
        ty: ty!(_Service!),
        directives: Default::default(),
    })
}

/// _entities(representations: [_Any!]!): [_Entity]!
pub(crate) fn entities_query_field() -> Component<FieldDefinition> {
    Component::new(FieldDefinition {
        description: None,
        name: ENTITIES_QUERY,
        arguments: vec![Node::new(InputValueDefinition {
            description: None,
            name: REPRESENTATIONS_ARGUMENT_NAME,
            ty: ty!([_Any!]!).into(),
            default_value: None,
            directives: Default::default(),
        })],
        ty: ty!([_Entity]!),
        directives: Default::default(),
    })
}
