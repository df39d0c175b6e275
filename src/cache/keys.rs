//! Canonical cache-key construction.
//!
//! Call sites build keys through [`cache_key`] instead of formatting strings
//! ad hoc, so the same logical request always maps to the same key and
//! distinct requests never collide. Keys look like
//! `leads:list?page=1&per_page=50`, which keeps them compatible with the
//! `prefix*` patterns accepted by invalidation.

/// Build a canonical cache key from a resource name and its parameters.
///
/// Parameters are sorted by name, so argument order at the call site does not
/// produce a second key for the same request. Characters that carry structure
/// in keys (`&`, `=`, `%`, `*`) are escaped in names and values.
pub fn cache_key(resource: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return resource.to_string();
    }
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", resource, query)
}

fn escape(raw: &str) -> String {
    // '%' first so escape sequences themselves survive round trips
    raw.replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3d")
        .replace('*', "%2a")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_params() {
        assert_eq!(cache_key("dashboard:metrics", &[]), "dashboard:metrics");
    }

    #[test]
    fn test_params_are_sorted() {
        let a = cache_key("leads:list", &[("page", "1"), ("per_page", "50")]);
        let b = cache_key("leads:list", &[("per_page", "50"), ("page", "1")]);
        assert_eq!(a, b);
        assert_eq!(a, "leads:list?page=1&per_page=50");
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        let a = cache_key("leads:list", &[("page", "1")]);
        let b = cache_key("leads:list", &[("page", "2")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_separator_characters_cannot_collide() {
        // A value containing "&" must not look like two parameters
        let a = cache_key("leads:list", &[("q", "a&b=c")]);
        let b = cache_key("leads:list", &[("q", "a"), ("b", "c")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wildcard_in_value_is_escaped() {
        let key = cache_key("leads:list", &[("q", "*")]);
        assert!(!key.contains('*'));
    }

    #[test]
    fn test_keys_share_resource_prefix() {
        let list = cache_key("leads:list", &[("page", "1")]);
        let get = cache_key("leads:get", &[("id", "7")]);
        assert!(list.starts_with("leads:"));
        assert!(get.starts_with("leads:"));
    }
}
