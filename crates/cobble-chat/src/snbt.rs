//! Stringified NBT, the textual tag format used inside hover events.

use uuid::Uuid;

/// Quotes `s` as an SNBT string, escaping backslashes and double quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Renders the compound a `show_entity` hover event expects for a player:
/// `{id:"<uuid>",name:"<name>"}`.
pub fn entity_tooltip(uuid: Uuid, name: &str) -> String {
    format!(
        "{{id:{},name:{}}}",
        quote(&uuid.hyphenated().to_string()),
        quote(name)
    )
}
