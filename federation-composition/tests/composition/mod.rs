mod scenarios;
mod validation;

pub(crate) mod test_helpers {
    use federation_composition::CompositionResult;
    use federation_composition::ErrorCode;
    use federation_composition::ServiceDefinition;
    use federation_composition::compose_and_validate;

    pub(crate) fn services(service_list: &[(&str, &str)]) -> Vec<ServiceDefinition> {
        service_list
            .iter()
            .map(|(name, type_defs)| {
                ServiceDefinition::parse(*name, type_defs)
                    .unwrap()
                    .with_url(format!("http://{name}"))
            })
            .collect()
    }

    pub(crate) fn compose(service_list: &[(&str, &str)]) -> CompositionResult {
        compose_and_validate(&services(service_list)).unwrap()
    }

    pub(crate) fn codes(result: &CompositionResult) -> Vec<ErrorCode> {
        result.errors.iter().map(|error| error.code).collect()
    }

    pub(crate) fn messages_for(result: &CompositionResult, code: ErrorCode) -> Vec<&str> {
        result
            .errors
            .iter()
            .filter(|error| error.code == code)
            .map(|error| error.message.as_str())
            .collect()
    }
}
