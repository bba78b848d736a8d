//! Map and reduce source synthesis

/// Map function selecting one entity type and emitting the key fields.
///
/// The emitted value is the whole document so results can be materialized
/// without a second fetch.
pub fn map_function(
    discriminator_field: &str,
    discriminator: &str,
    key_fields: &[String],
) -> String {
    let key = key_fields
        .iter()
        .map(|f| format!("doc.{}", f))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "function(doc) {{\n  if(doc.{} == '{}') {{\n    emit([{}], doc);\n  }}\n}}",
        discriminator_field,
        escape_js(discriminator),
        key
    )
}

/// Reduce function counting matched rows
pub fn count_reduce_function() -> String {
    "function(keys, values) {\n  return values.length;\n}".to_string()
}

fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
