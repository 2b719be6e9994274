//! Composition of Apollo Federation 1 services.
//!
//! Each service owns part of a larger GraphQL API and describes it in SDL, using `@key`,
//! `@extends`, `@external`, `@requires` and `@provides` to declare how its types relate to the
//! types of other services. [`compose_and_validate`] merges those SDL fragments into one schema,
//! records which service owns which type and field, and reports every violation of the federation
//! rules it finds.
//!
//! ## Usage
//!
//! ```
//! use federation_composition::ServiceDefinition;
//! use federation_composition::compose_and_validate;
//!
//! let services = [
//!     ServiceDefinition::parse(
//!         "accounts",
//!         r#"extend type Query { me: User } type User @key(fields: "id") { id: ID! }"#,
//!     )
//!     .unwrap(),
//!     ServiceDefinition::parse(
//!         "reviews",
//!         r#"extend type User @key(fields: "id") { id: ID! @external reviews: [String] }"#,
//!     )
//!     .unwrap(),
//! ];
//! let result = compose_and_validate(&services).unwrap();
//! assert!(!result.has_errors());
//! assert_eq!(
//!     result.schema.type_metadata("User").unwrap().service_name.as_deref(),
//!     Some("accounts")
//! );
//! ```
//!
//! Findings never abort composition: the composed schema is always returned, next to every
//! finding. A [`FederationError`] is only returned when an input cannot be processed at all, for
//! example a `@key` whose `fields` cannot be parsed.

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod compose;
pub mod directives;
pub mod error;
pub mod field_set;
pub mod normalize;
pub mod print;
pub mod service;
pub mod subgraph;
pub(crate) mod utils;
pub(crate) mod validate;

use tracing::debug;

pub use crate::compose::ComposedSchema;
pub use crate::compose::CompositionResult;
pub use crate::compose::compose_services;
pub use crate::error::CompositionError;
pub use crate::error::EntityResolutionError;
pub use crate::error::ErrorCode;
pub use crate::error::FederationError;
pub use crate::error::Location;
pub use crate::error::Severity;
pub use crate::field_set::FieldSet;
pub use crate::normalize::normalize_type_defs;
pub use crate::print::print_schema;
pub use crate::service::ServiceDefinition;
pub use crate::subgraph::FederatedSchema;
pub use crate::subgraph::ReferenceResolver;
pub use crate::subgraph::build_federated_schema;

/// Validates, normalizes and composes `services`.
///
/// Runs the rules checking the services as written, normalizes every service, runs the
/// per-service rules, composes, and finally runs the rules checking the composed schema. The
/// findings of all phases are returned in that order. The composed schema keeps the services as
/// they were passed in.
#[cfg_attr(
    feature = "snapshot_tracing",
    tracing::instrument(level = "trace", skip_all, name = "compose_and_validate")
)]
pub fn compose_and_validate(services: &[ServiceDefinition]) -> Result<CompositionResult, FederationError> {
    let mut errors = validate::validate_services_before_normalization(services);

    let normalized: Vec<ServiceDefinition> = services
        .iter()
        .map(|service| service.with_type_defs(normalize_type_defs(&service.type_defs)))
        .collect();
    errors.extend(validate::validate_services_before_composition(&normalized)?);

    let mut result = compose_services(&normalized)?;
    errors.append(&mut result.errors);
    result.schema.service_list = services.to_vec();

    errors.extend(validate::validate_composed_schema(&result.schema)?);
    debug!(
        services = services.len(),
        findings = errors.len(),
        "composed and validated services"
    );
    result.errors = errors;
    Ok(result)
}

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<ComposedSchema>();
    assert_thread_safe::<CompositionResult>();
    assert_thread_safe::<FederatedSchema>();
};
