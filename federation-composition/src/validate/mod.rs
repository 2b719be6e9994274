//! Validation rules, grouped by the phase of composition they run in.
//!
//! Every phase has a fixed, ordered registry. All rules of a phase run and their findings are
//! concatenated in registry order; a finding never stops later rules from running.

use tracing::debug;
use tracing::trace;

use crate::compose::ComposedSchema;
use crate::error::CompositionError;
use crate::error::FederationError;
use crate::service::ServiceDefinition;

mod post_composition;
mod pre_composition;
mod pre_normalization;
pub(crate) mod sdl;

/// A check of one service's SDL exactly as the service wrote it.
pub(crate) trait PreNormalizationValidator: Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, service: &ServiceDefinition) -> Vec<CompositionError>;
}

/// A check of one service's normalized SDL, independent of every other service.
pub(crate) trait PreCompositionValidator: Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, service: &ServiceDefinition) -> Result<Vec<CompositionError>, FederationError>;
}

/// A check of the composed schema and its federation metadata.
pub(crate) trait PostCompositionValidator: Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError>;
}

const PRE_NORMALIZATION_VALIDATORS: &[&dyn PreNormalizationValidator] =
    &[&pre_normalization::RootFieldUsed];

const PRE_COMPOSITION_VALIDATORS: &[&dyn PreCompositionValidator] = &[
    &pre_composition::ExternalUsedOnBase,
    &pre_composition::RequiresUsedOnBase,
    &pre_composition::KeyFieldsMissingExternal,
    &pre_composition::ReservedFieldUsed,
    &pre_composition::DuplicateEnumOrScalar,
    &pre_composition::DuplicateEnumValue,
];

const POST_COMPOSITION_VALIDATORS: &[&dyn PostCompositionValidator] = &[
    &post_composition::ExternalUnused,
    &post_composition::ExternalMissingOnBase,
    &post_composition::ExternalTypeMismatch,
    &post_composition::RequiresFieldsMissingExternal,
    &post_composition::RequiresFieldsMissingOnBase,
    &post_composition::KeyFieldsMissingOnBase,
    &post_composition::KeyFieldsSelectInvalidType,
    &post_composition::ProvidesFieldsMissingExternal,
    &post_composition::ProvidesFieldsSelectInvalidType,
    &post_composition::ProvidesNotOnEntity,
    &post_composition::ExecutableDirectivesInAllServices,
    &post_composition::ExecutableDirectivesIdentical,
    &post_composition::ExecutableDirectivesOnly,
    &post_composition::KeysMatchBaseService,
    &post_composition::KeySelectionSetsDeclared,
];

pub(crate) fn validate_services_before_normalization(services: &[ServiceDefinition]) -> Vec<CompositionError> {
    let mut errors = Vec::new();
    for service in services {
        for validator in PRE_NORMALIZATION_VALIDATORS {
            let found = validator.validate(service);
            trace!(
                service = service.name,
                validator = validator.name(),
                errors = found.len(),
                "ran pre-normalization validator"
            );
            errors.extend(found);
        }
    }
    debug!(errors = errors.len(), "validated services before normalization");
    errors
}

pub(crate) fn validate_services_before_composition(
    services: &[ServiceDefinition],
) -> Result<Vec<CompositionError>, FederationError> {
    let mut errors = Vec::new();
    for service in services {
        for validator in PRE_COMPOSITION_VALIDATORS {
            let found = validator.validate(service)?;
            trace!(
                service = service.name,
                validator = validator.name(),
                errors = found.len(),
                "ran pre-composition validator"
            );
            errors.extend(found);
        }
    }
    debug!(errors = errors.len(), "validated services before composition");
    Ok(errors)
}

pub(crate) fn validate_composed_schema(composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
    let mut errors = Vec::new();
    for validator in POST_COMPOSITION_VALIDATORS {
        let found = validator.validate(composed)?;
        trace!(validator = validator.name(), errors = found.len(), "ran post-composition validator");
        errors.extend(found);
    }
    debug!(errors = errors.len(), "validated composed schema");
    Ok(errors)
}
