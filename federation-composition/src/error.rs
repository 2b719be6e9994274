use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Range;

use apollo_compiler::parser::LineColumn;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::validation::DiagnosticList;
use serde::Serialize;
use strum_macros::EnumIter;
use strum_macros::IntoStaticStr;

/// A stable tag identifying the rule that produced a [`CompositionError`].
///
/// The `Display` form is the SCREAMING_SNAKE_CASE code consumers match on, for example
/// `EXTERNAL_MISSING_ON_BASE`. These codes should not change once released.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, IntoStaticStr, EnumIter, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Before normalization
    RootQueryUsed,
    RootMutationUsed,
    RootSubscriptionUsed,

    // Before composition, one service at a time
    ExternalUsedOnBase,
    RequiresUsedOnBase,
    KeyFieldsMissingExternal,
    ReservedFieldUsed,
    DuplicateEnumDefinition,
    DuplicateScalarDefinition,
    DuplicateEnumValue,

    // While building the composed schema
    DuplicateTypeName,
    DuplicateFieldName,
    ValueTypeKindMismatch,
    ValueTypeFieldTypeMismatch,
    ValueTypeInputValueMismatch,
    ValueTypeNoEntity,
    ValueTypeUnionTypesMismatch,
    EnumMismatch,
    EnumMismatchType,
    ExtensionOfWrongKind,
    ExtensionWithNoBase,
    /// A problem reported by the GraphQL schema builder itself. These usually point at SDL
    /// that the federation rules above did not anticipate.
    InvalidGraphql,

    // After composition
    ExternalMissingOnBase,
    ExternalTypeMismatch,
    ExternalUnused,
    KeyFieldsMissingOnBase,
    KeyFieldsSelectInvalidType,
    KeyNotDeclared,
    KeyMissingOnBase,
    MultipleKeysOnExtension,
    KeyNotSpecified,
    ProvidesFieldsMissingExternal,
    ProvidesFieldsSelectInvalidType,
    ProvidesNotOnEntity,
    RequiresFieldsMissingExternal,
    RequiresFieldsMissingOnBase,
    ExecutableDirectivesInAllServices,
    ExecutableDirectivesIdentical,
    ExecutableDirectivesOnly,
}

impl ErrorCode {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ExternalUnused | Self::ExecutableDirectivesOnly => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Given the [`ErrorCode`] of a [`CompositionError`], how important is that finding?
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The composed schema should not be served.
    Error,
    /// The user probably wants to know about this, but the composed schema is usable.
    Warning,
}

/// A single composition finding.
///
/// Findings never abort composition: every rule runs and its findings are appended to the result,
/// so tooling can show all problems at once.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CompositionError {
    pub code: ErrorCode,
    /// Human-readable description. Type and field scoped findings start with
    /// `[serviceName] Type.field -> `.
    pub message: String,
    pub locations: Vec<Range<Location>>,
}

impl CompositionError {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub(crate) fn with_location(mut self, span: Option<SourceSpan>, sources: &SourceMap) -> Self {
        self.locations.extend(Location::from_node(span, sources));
        self
    }

    /// One `INVALID_GRAPHQL` finding per diagnostic of the GraphQL schema builder.
    pub(crate) fn from_diagnostics(diagnostics: &DiagnosticList) -> Vec<Self> {
        diagnostics
            .iter()
            .map(|diagnostic| {
                let message = diagnostic
                    .error
                    .unstable_compat_message()
                    .unwrap_or_else(|| diagnostic.error.to_string());
                let mut error = Self::new(ErrorCode::InvalidGraphql, message);
                error
                    .locations
                    .extend(diagnostic.line_column_range().map(Location::from_line_column_range));
                error
            })
            .collect()
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl Display for CompositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A 0-indexed line/column reference to SDL source
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub(crate) fn from_node(node: Option<SourceSpan>, sources: &SourceMap) -> Option<Range<Self>> {
        node?.line_column_range(sources).map(Self::from_line_column_range)
    }

    /// apollo-compiler counts lines and columns from 1.
    fn from_line_column_range(range: Range<LineColumn>) -> Range<Self> {
        Range {
            start: Self {
                line: range.start.line - 1,
                column: range.start.column - 1,
            },
            end: Self {
                line: range.end.line - 1,
                column: range.end.column - 1,
            },
        }
    }
}

/// Formats the `[service] Type.field -> ` prefix carried by scoped findings.
pub(crate) fn log_service_and_type(service_name: &str, type_name: &str, field_name: Option<&str>) -> String {
    match field_name {
        Some(field_name) => format!("[{service_name}] {type_name}.{field_name} -> "),
        None => format!("[{service_name}] {type_name} -> "),
    }
}

pub(crate) fn log_directive(directive_name: &str) -> String {
    format!("[@{directive_name}] -> ")
}

/// Failures that stop an operation outright because its input cannot be processed at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FederationError {
    #[error("Invalid field set \"{field_set}\": {message}")]
    InvalidFieldSet { field_set: String, message: String },
    #[error("Invalid GraphQL: {message}")]
    InvalidGraphQL { message: String },
    #[error("Type \"{type_name}\" is not an object type of this schema")]
    UnknownType { type_name: String },
    #[error("Internal consistency error: {message}")]
    Internal { message: String },
}

impl FederationError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Why a single `_entities` representation could not be resolved. The other representations of
/// the same request are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityResolutionError {
    #[error("The _entities resolver received a representation without a __typename")]
    MissingTypename,
    #[error(
        "The _entities resolver tried to load an entity for type \"{type_name}\", but no object type of that name was found in the schema"
    )]
    UnknownEntityType { type_name: String },
    #[error("Resolving a reference to \"{type_name}\" failed: {message}")]
    Resolver { type_name: String, message: String },
}
