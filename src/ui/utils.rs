/// Replace tabs with `tab_width` spaces. A width of 0 leaves tabs alone.
pub(crate) fn expand_tabs(text: &str, tab_width: u8) -> String {
    if tab_width == 0 || !text.contains('\t') {
        return text.to_string();
    }
    text.replace('\t', &" ".repeat(tab_width as usize))
}

/// Truncate to `max` characters, appending an ellipsis when cut.
/// Counts chars, not bytes, so multi-byte titles are not split.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}
