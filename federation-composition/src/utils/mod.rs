//! This module contains various tools that help the ergonomics of this crate.

mod definition_ext;
mod extended_type_ext;
pub(crate) mod logging;

pub(crate) use definition_ext::DefinitionExt;
pub(crate) use extended_type_ext::ExtendedTypeExt;
