use apollo_compiler::ast;

use crate::error::FederationError;

/// One subgraph handed to composition: its name, its parsed SDL and optionally where it is served.
///
/// Service names are expected to be unique within a single composition call.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    pub name: String,
    pub type_defs: ast::Document,
    pub url: Option<String>,
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>, type_defs: ast::Document) -> Self {
        Self {
            name: name.into(),
            type_defs,
            url: None,
        }
    }

    /// Parses `sdl` into a service definition. Syntax errors are returned rather than recovered.
    pub fn parse(name: impl Into<String>, sdl: &str) -> Result<Self, FederationError> {
        let name = name.into();
        let type_defs = ast::Document::parse(sdl, format!("{name}.graphql")).map_err(|e| {
            FederationError::InvalidGraphQL {
                message: e.errors.to_string(),
            }
        })?;
        Ok(Self::new(name, type_defs))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub(crate) fn with_type_defs(&self, type_defs: ast::Document) -> Self {
        Self {
            name: self.name.clone(),
            type_defs,
            url: self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_keeps_url() {
        let service = ServiceDefinition::parse("products", "type Product { upc: ID! }")
            .unwrap()
            .with_url("http://products");
        assert_eq!(service.name, "products");
        assert_eq!(service.url.as_deref(), Some("http://products"));
        assert_eq!(service.type_defs.definitions.len(), 1);
    }

    #[test]
    fn reports_syntax_errors() {
        let error = ServiceDefinition::parse("broken", "type Product {").unwrap_err();
        assert!(matches!(error, FederationError::InvalidGraphQL { .. }));
    }
}
