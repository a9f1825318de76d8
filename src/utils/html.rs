// src/utils/html.rs

/// Sanitizes staff-authored question text before it is stored.
///
/// Uses ammonia's whitelist: harmless inline markup such as `<b>` survives,
/// `<script>` elements are removed with their content and event-handler
/// attributes are stripped. Surrounding whitespace is trimmed.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
