/// Normalizes a raw domain candidate into a matching key.
///
/// Lower-cases, strips scheme and leading `www.`, truncates at the first
/// path/query/fragment separator and drops anything that is not a word
/// character, dot or hyphen. Candidates without a dot or shorter than three
/// characters are unusable as matching keys and yield `None`.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().to_lowercase();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(&domain);
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    let domain = domain
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let domain: String = domain
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    match domain.contains('.') && domain.len() > 2 {
        true => Some(domain),
        false => None,
    }
}

/// Strips a stored project domain down to the form used for matching
/// (no scheme, no trailing slash, no `www.`).
pub fn clean_tracked_domain(domain: &str) -> String {
    let clean = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    let clean = clean.trim_end_matches('/');
    clean.strip_prefix("www.").unwrap_or(clean).to_string()
}

/// Whether two domains refer to the same site.
///
/// Accepts exact equality, equal root domains (last two labels) and a
/// subdomain relationship in either direction. Plain substring containment
/// is rejected: `worklinediviseisacco.it` does not match `isacco.it`.
///
/// The root comparison uses exactly the last two labels, so unrelated
/// second-level domains under a multi-part public suffix (`co.uk`) are
/// treated as equal. Kept as-is.
pub fn domains_match(target: &str, candidate: &str) -> bool {
    if target.is_empty() || candidate.is_empty() {
        return false;
    }

    let clean1 = strip_www(target);
    let clean2 = strip_www(candidate);
    if clean1.is_empty() || clean2.is_empty() {
        return false;
    }

    if clean1 == clean2 {
        return true;
    }

    let parts1: Vec<&str> = clean1.split('.').collect();
    let parts2: Vec<&str> = clean2.split('.').collect();
    if parts1.len() >= 2 && parts2.len() >= 2 {
        let root1 = parts1[parts1.len() - 2..].join(".");
        let root2 = parts2[parts2.len() - 2..].join(".");
        if root1 == root2 {
            return true;
        }
    }

    clean1.ends_with(&format!(".{}", clean2)) || clean2.ends_with(&format!(".{}", clean1))
}

fn strip_www(domain: &str) -> String {
    let clean = domain.trim().to_lowercase();
    clean.strip_prefix("www.").unwrap_or(&clean).to_string()
}

#[cfg(test)]
mod tests {
    use super::{clean_tracked_domain, domains_match, normalize_domain};

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_domain("https://www.Example.com/path?q=1#frag"),
            Some("example.com".to_string())
        );
        assert_eq!(
            normalize_domain("http://shop.example.com/"),
            Some("shop.example.com".to_string())
        );
    }

    #[test]
    fn normalize_rejects_unusable_keys() {
        assert_eq!(normalize_domain("it"), None);
        assert_eq!(normalize_domain("nodots"), None);
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain(".c"), None);
    }

    #[test]
    fn normalize_drops_stray_characters() {
        assert_eq!(
            normalize_domain("exam ple.com\""),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn match_is_reflexive() {
        for d in ["isacco.it", "example.com", "blog.isacco.it"] {
            let n = normalize_domain(d).unwrap();
            assert!(domains_match(&n, &n), "{} should match itself", d);
        }
    }

    #[test]
    fn match_is_symmetric() {
        let pairs = [
            ("isacco.it", "blog.isacco.it"),
            ("example.com", "notexample.com"),
            ("isacco.it", "worklinediviseisacco.it"),
        ];
        for (a, b) in pairs {
            assert_eq!(domains_match(a, b), domains_match(b, a));
        }
    }

    #[test]
    fn subdomains_match_in_both_directions() {
        assert!(domains_match("isacco.it", "blog.isacco.it"));
        assert!(domains_match("isacco.it", "shop.isacco.it"));
        assert!(domains_match("shop.isacco.it", "isacco.it"));
    }

    #[test]
    fn substring_containment_is_rejected() {
        assert!(!domains_match("isacco.it", "worklinediviseisacco.it"));
        assert!(!domains_match("isacco.it", "diviseisacco.it"));
    }

    #[test]
    fn root_domain_equivalence() {
        assert!(domains_match("example.com", "www.example.com"));
        assert!(!domains_match("example.com", "notexample.com"));
    }

    #[test]
    fn multi_part_suffix_limitation_is_preserved() {
        // Known limitation: last-two-label roots collide under co.uk.
        assert!(domains_match("example.co.uk", "other.co.uk"));
    }

    #[test]
    fn clean_tracked_domain_strips_scheme_and_slash() {
        assert_eq!(clean_tracked_domain("https://www.isacco.it/"), "isacco.it");
        assert_eq!(clean_tracked_domain("isacco.it"), "isacco.it");
    }
}
