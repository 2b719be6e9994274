/// This macro is a wrapper around `tracing::trace!` and should not be confused with our snapshot
/// testing. Its goal is to attach the data structures composition builds up (collected `@key`
/// selection sets, value types, metadata) to logging statements so they can be inspected when
/// debugging a composition.
///
/// Passing an identifier serializes the value with serde_json and tags the event with the value's
/// type name. EX:
/// ```ignore
/// snapshot!(key_directives, "collected @key directives");
/// // Generates:
/// // trace!(snapshot = "IndexMap<..>", data = "{ .. }", "collected @key directives");
/// ```
/// A name tag and an already rendered value can be passed instead; the value needs to implement
/// the tracing crate's `Value` trait. EX:
/// ```ignore
/// snapshot!("ComposedSchema", schema.print_sdl(), "composed schema");
/// ```
/// Serialization failures are logged in place of the data.
macro_rules! snapshot {
    ($value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(
            snapshot = std::any::type_name_of_val(&$value),
            data = serde_json::to_string(&$value)
                .unwrap_or_else(|error| format!("<unserializable: {error}>")),
            $msg
        );
    };
    ($name:literal, $value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(snapshot = $name, data = $value, $msg);
    };
}

pub(crate) use snapshot;
