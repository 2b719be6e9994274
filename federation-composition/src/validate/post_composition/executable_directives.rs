use apollo_compiler::ast::Definition;
use itertools::Itertools;

use super::located;
use crate::compose::ComposedSchema;
use crate::compose::type_diff::type_nodes_are_equivalent;
use crate::directives::is_executable_directive_location;
use crate::error::CompositionError;
use crate::error::ErrorCode;
use crate::error::FederationError;
use crate::error::log_directive;
use crate::validate::PostCompositionValidator;

/// A custom directive kept in the composed schema must be defined by every service.
pub(crate) struct ExecutableDirectivesInAllServices;

impl PostCompositionValidator for ExecutableDirectivesInAllServices {
    fn name(&self) -> &'static str {
        "executableDirectivesInAllServices"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (directive_name, metadata) in &composed.metadata.directives {
            let missing = composed
                .service_list
                .iter()
                .map(|service| service.name.as_str())
                .filter(|service_name| !metadata.directive_definitions.contains_key(*service_name))
                .join(", ");
            if missing.is_empty() {
                continue;
            }
            let error = CompositionError::new(
                ErrorCode::ExecutableDirectivesInAllServices,
                format!(
                    "{}Custom directives must be implemented in every service. The following services do not implement the @{directive_name} directive: {missing}.",
                    log_directive(directive_name),
                ),
            );
            let locations = metadata.directive_definitions.values().map(|definition| definition.location());
            errors.push(located(composed, error, locations));
        }
        Ok(errors)
    }
}

/// Every service must define a custom directive the same way.
pub(crate) struct ExecutableDirectivesIdentical;

impl PostCompositionValidator for ExecutableDirectivesIdentical {
    fn name(&self) -> &'static str {
        "executableDirectivesIdentical"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for (directive_name, metadata) in &composed.metadata.directives {
            let definitions = &metadata.directive_definitions;
            let all_identical = definitions.values().tuple_windows().all(|(first, second)| {
                type_nodes_are_equivalent(
                    &Definition::DirectiveDefinition(first.clone()),
                    &Definition::DirectiveDefinition(second.clone()),
                )
            });
            if all_identical {
                continue;
            }
            let implementations = definitions
                .iter()
                .map(|(service_name, definition)| format!("\t{service_name}: {}", definition.to_string().trim_end()))
                .join("\n");
            let error = CompositionError::new(
                ErrorCode::ExecutableDirectivesIdentical,
                format!(
                    "{}custom directives must be defined identically across all services. See below for a list of current implementations:\n{implementations}",
                    log_directive(directive_name),
                ),
            );
            let locations = definitions.values().map(|definition| definition.location());
            errors.push(located(composed, error, locations));
        }
        Ok(errors)
    }
}

/// Type system locations of custom directives are dropped during composition; each service
/// declaring some is warned once per directive.
pub(crate) struct ExecutableDirectivesOnly;

impl PostCompositionValidator for ExecutableDirectivesOnly {
    fn name(&self) -> &'static str {
        "executableDirectivesOnly"
    }

    fn validate(&self, composed: &ComposedSchema) -> Result<Vec<CompositionError>, FederationError> {
        let mut errors = Vec::new();
        for directive_name in composed.metadata.directives.keys() {
            for service in &composed.service_list {
                for definition in &service.type_defs.definitions {
                    let Definition::DirectiveDefinition(directive) = definition else {
                        continue;
                    };
                    if directive.name != *directive_name {
                        continue;
                    }
                    let dropped = directive
                        .locations
                        .iter()
                        .filter(|location| !is_executable_directive_location(location))
                        .join(", ");
                    if dropped.is_empty() {
                        continue;
                    }
                    errors.push(
                        CompositionError::new(
                            ErrorCode::ExecutableDirectivesOnly,
                            format!(
                                "{}[{}] declares the type system locations {dropped}, which are removed from the composed schema. Custom directives may only be used in executable locations.",
                                log_directive(directive_name),
                                service.name,
                            ),
                        )
                        .with_location(directive.location(), &service.type_defs.sources),
                    );
                }
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Severity;
    use crate::validate::post_composition::test_helpers::compose;
    use crate::validate::post_composition::test_helpers::run;

    #[test]
    fn reports_services_missing_a_directive() {
        let a = ("serviceA", "directive @stream on FIELD\nextend type Query { a: String }");
        let b = ("serviceB", "extend type Query { b: String }");
        let c = ("serviceC", "directive @stream on FIELD\nextend type Query { c: String }");
        assert_eq!(
            run(&ExecutableDirectivesInAllServices, &[a, b, c]),
            ["EXECUTABLE_DIRECTIVES_IN_ALL_SERVICES: [@stream] -> Custom directives must be implemented in every service. The following services do not implement the @stream directive: serviceB."]
        );
    }

    #[test]
    fn lists_every_implementation_of_a_mismatched_directive() {
        let a = ("serviceA", "directive @stream(initialCount: Int) on FIELD\nextend type Query { a: String }");
        let b = ("serviceB", "directive @stream on FIELD | QUERY\nextend type Query { b: String }");
        let errors = run(&ExecutableDirectivesIdentical, &[a, b]);
        assert_eq!(
            errors,
            ["EXECUTABLE_DIRECTIVES_IDENTICAL: [@stream] -> custom directives must be defined identically across all services. See below for a list of current implementations:\n\tserviceA: directive @stream(initialCount: Int) on FIELD\n\tserviceB: directive @stream on FIELD | QUERY"]
        );
    }

    #[test]
    fn accepts_identical_directives() {
        let a = ("serviceA", "directive @stream on FIELD | QUERY\nextend type Query { a: String }");
        let b = ("serviceB", "directive @stream on QUERY | FIELD\nextend type Query { b: String }");
        assert!(run(&ExecutableDirectivesIdentical, &[a, b]).is_empty());
    }

    #[test]
    fn warns_about_type_system_locations() {
        let a = ("serviceA", "directive @audit on FIELD | OBJECT | FIELD_DEFINITION\nextend type Query { a: String }");
        let composed = compose(&[a]);
        let errors = ExecutableDirectivesOnly.validate(&composed).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity(), Severity::Warning);
        assert_eq!(
            errors[0].message,
            "[@audit] -> [serviceA] declares the type system locations OBJECT, FIELD_DEFINITION, which are removed from the composed schema. Custom directives may only be used in executable locations."
        );
    }
}
