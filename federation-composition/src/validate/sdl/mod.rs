//! Rules checked on the merged definitions and extensions right before the composed schema is
//! built from them.

use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::parser::SourceMap;
use tracing::trace;

use crate::compose::maps::ServiceNode;
use crate::error::CompositionError;

mod known_type_names;
mod matching_enums;
mod possible_type_extensions;
mod unique_field_definition_names;
mod unique_type_names;
mod unique_union_types;

pub(crate) use known_type_names::KnownTypeNames;
pub(crate) use matching_enums::MatchingEnums;
pub(crate) use possible_type_extensions::PossibleTypeExtensions;
pub(crate) use unique_field_definition_names::UniqueFieldDefinitionNames;
pub(crate) use unique_type_names::UniqueTypeNamesWithFields;
pub(crate) use unique_union_types::UniqueUnionTypes;

/// One build step: the nodes about to be added and the types earlier steps produced.
pub(crate) struct SdlValidationContext<'a> {
    pub(crate) nodes: Vec<&'a ServiceNode>,
    pub(crate) existing_types: &'a IndexMap<Name, ServiceNode>,
    pub(crate) sources: &'a SourceMap,
}

impl SdlValidationContext<'_> {
    pub(crate) fn error_at(&self, error: CompositionError, nodes: &[&ServiceNode]) -> CompositionError {
        nodes.iter().fold(error, |error, node| {
            error.with_location(node.definition.location(), self.sources)
        })
    }
}

pub(crate) trait SdlValidator: Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, context: &SdlValidationContext) -> Vec<CompositionError>;
}

const SDL_VALIDATORS: &[&dyn SdlValidator] = &[
    &KnownTypeNames,
    &UniqueTypeNamesWithFields,
    &MatchingEnums,
    &PossibleTypeExtensions,
    &UniqueFieldDefinitionNames,
    &UniqueUnionTypes,
];

/// Runs every rule in order. Findings are concatenated rule by rule.
pub(crate) fn validate_sdl(context: &SdlValidationContext) -> Vec<CompositionError> {
    SDL_VALIDATORS
        .iter()
        .flat_map(|validator| {
            let errors = validator.validate(context);
            trace!(validator = validator.name(), errors = errors.len(), "ran SDL validator");
            errors
        })
        .collect()
}
