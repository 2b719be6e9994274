//! Composition proper: partitions the services' definitions, builds the composed schema and
//! records federation metadata next to it. No federation rules are checked here beyond the ones
//! the schema build itself needs; see [`crate::compose_and_validate`] for the full pipeline.

use apollo_compiler::Schema;
use tracing::debug;

use crate::error::CompositionError;
use crate::error::FederationError;
use crate::error::Severity;
use crate::print::print_schema;
use crate::service::ServiceDefinition;
use crate::utils::logging::snapshot;

pub(crate) mod builder;
pub(crate) mod maps;
pub mod metadata;
pub(crate) mod type_diff;

pub use maps::KeyDirectivesMap;
use metadata::FederationDirectiveMetadata;
use metadata::FederationFieldMetadata;
use metadata::FederationMetadata;
use metadata::FederationTypeMetadata;

/// The composed schema together with the federation metadata describing it.
#[derive(Debug, Clone)]
pub struct ComposedSchema {
    pub schema: Schema,
    pub metadata: FederationMetadata,
    /// The services as they were handed to composition, for consumers needing their URLs.
    pub service_list: Vec<ServiceDefinition>,
}

impl ComposedSchema {
    pub fn print_sdl(&self) -> String {
        print_schema(&self.schema)
    }

    pub fn type_metadata(&self, type_name: &str) -> Option<&FederationTypeMetadata> {
        self.metadata.type_metadata(type_name)
    }

    /// Fields without metadata, or without a service name in it, belong to the service owning
    /// their parent type.
    pub fn field_metadata(&self, type_name: &str, field_name: &str) -> Option<&FederationFieldMetadata> {
        self.metadata.field_metadata(type_name, field_name)
    }

    pub fn directive_metadata(&self, directive_name: &str) -> Option<&FederationDirectiveMetadata> {
        self.metadata.directive_metadata(directive_name)
    }
}

#[derive(Debug, Clone)]
pub struct CompositionResult {
    /// Always present, even when `errors` is not empty.
    pub schema: ComposedSchema,
    pub errors: Vec<CompositionError>,
    /// Kept for callers of the two-list API. Findings of every severity are reported in `errors`,
    /// so this is always empty.
    pub warnings: Vec<CompositionError>,
}

impl CompositionResult {
    /// Whether any finding is severe enough that the composed schema should not be served.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|error| error.severity() == Severity::Error)
    }
}

/// Composes already normalized services without running any federation validation.
///
/// Fails only when a `@key` selection cannot be parsed.
#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "compose_services")
)]
pub fn compose_services(services: &[ServiceDefinition]) -> Result<CompositionResult, FederationError> {
    let maps = maps::build_maps_from_service_list(services)?;
    let builder::BuiltSchema { schema, errors } = builder::build_schema_from_definitions_and_extensions(&maps);
    let metadata = metadata::add_federation_metadata(&schema, &maps)?;

    let composed = ComposedSchema {
        schema,
        metadata,
        service_list: services.to_vec(),
    };
    snapshot!("ComposedSchema", composed.print_sdl().as_str(), "composed schema");
    debug!(services = services.len(), errors = errors.len(), "composed services");

    Ok(CompositionResult {
        schema: composed,
        errors,
        warnings: Vec::new(),
    })
}
