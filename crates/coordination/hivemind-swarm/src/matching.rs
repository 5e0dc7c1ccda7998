//! Capability matching
//!
//! Matching is a fuzzy string heuristic: two capabilities match when either
//! contains the other, ignoring case. Blank capabilities match nothing.

/// Whether an offered capability satisfies a required one
pub fn capability_matches(offered: &str, required: &str) -> bool {
    let offered = offered.trim().to_lowercase();
    let required = required.trim().to_lowercase();
    if offered.is_empty() || required.is_empty() {
        return false;
    }
    offered.contains(&required) || required.contains(&offered)
}

/// Whether any offered capability satisfies `required`
pub fn has_capability<S: AsRef<str>>(offered: &[S], required: &str) -> bool {
    offered.iter().any(|o| capability_matches(o.as_ref(), required))
}

/// Required capabilities none of the offered ones satisfy
pub fn unmet<S: AsRef<str>, R: AsRef<str>>(offered: &[S], required: &[R]) -> Vec<String> {
    required
        .iter()
        .filter(|r| !has_capability(offered, r.as_ref()))
        .map(|r| r.as_ref().to_string())
        .collect()
}

/// Whether `offered` covers every entry of `required`
pub fn satisfies<S: AsRef<str>, R: AsRef<str>>(offered: &[S], required: &[R]) -> bool {
    required.iter().all(|r| has_capability(offered, r.as_ref()))
}

/// Number of required capabilities offered verbatim (case-insensitive)
pub fn exact_matches<S: AsRef<str>, R: AsRef<str>>(offered: &[S], required: &[R]) -> usize {
    required
        .iter()
        .filter(|r| {
            offered
                .iter()
                .any(|o| o.as_ref().trim().eq_ignore_ascii_case(r.as_ref().trim()))
        })
        .count()
}

/// Whether the two sets share at least one matching pair
pub fn overlaps<S: AsRef<str>, R: AsRef<str>>(a: &[S], b: &[R]) -> bool {
    b.iter().any(|r| has_capability(a, r.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_either_direction() {
        assert!(capability_matches("programming", "program"));
        assert!(capability_matches("Test", "unit-testing"));
        assert!(capability_matches("TESTING", "testing"));
        assert!(!capability_matches("research", "testing"));
    }

    #[test]
    fn test_blank_capabilities_never_match() {
        assert!(!capability_matches("", "testing"));
        assert!(!capability_matches("testing", "  "));
    }

    #[test]
    fn test_unmet_lists_missing_requirements() {
        let offered = ["programming", "debugging"];
        assert_eq!(unmet(&offered, &["programming", "testing"]), vec!["testing"]);
        assert!(satisfies(&offered, &["program", "debug"]));
        assert!(satisfies(&offered, &[] as &[&str]));
    }

    #[test]
    fn test_exact_matches_ignore_case_only() {
        let offered = ["Programming", "debugging"];
        assert_eq!(exact_matches(&offered, &["programming", "debug"]), 1);
    }

    #[test]
    fn test_overlap() {
        assert!(overlaps(&["testing"], &["validation", "unit-testing"]));
        assert!(!overlaps(&["research"], &["programming"]));
    }
}
