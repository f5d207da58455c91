use url::Url;

/// Canonical form of a product link: query string and fragment removed.
///
/// Returns `None` for links that are empty once stripped. Applying it to its
/// own output yields the same value.
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(mut url) = Url::parse(trimmed) {
        if url.cannot_be_a_base() {
            return None;
        }
        url.set_query(None);
        url.set_fragment(None);
        return Some(url.into());
    }

    // Relative or otherwise unparsable: cut at the first `?` or `#`.
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let stripped = trimmed[..end].trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Resolve an `href` against the page it was found on and canonicalize it.
///
/// Anchors, query-only references and `javascript:` links are rejected.
pub fn resolve_link(reference: &str, base: Option<&str>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return canonicalize_url(url.as_str());
    }
    let base = base.and_then(|b| Url::parse(b).ok())?;
    let joined = base.join(trimmed).ok()?;
    canonicalize_url(joined.as_str())
}
