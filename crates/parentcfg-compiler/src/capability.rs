//! Capability matching

use parentcfg_common::CapabilitySet;

/// True when `candidate` holds every tag in `required`
#[inline]
pub fn satisfies(candidate: &CapabilitySet, required: &CapabilitySet) -> bool {
    required.iter().all(|cap| candidate.contains(cap))
}

/// Required tags the candidate lacks, sorted
pub fn missing(candidate: &CapabilitySet, required: &CapabilitySet) -> Vec<String> {
    required
        .iter()
        .filter(|cap| !candidate.contains(cap))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(tags: &[&str]) -> CapabilitySet {
        tags.iter().copied().collect()
    }

    #[test]
    fn test_empty_requirement() {
        assert!(satisfies(&caps(&[]), &caps(&[])));
        assert!(satisfies(&caps(&["FOO"]), &caps(&[])));
    }

    #[test]
    fn test_superset_required() {
        let required = caps(&["FOO"]);
        assert!(!satisfies(&caps(&[]), &required));
        assert!(satisfies(&caps(&["FOO"]), &required));
        assert!(satisfies(&caps(&["FOO", "BAR"]), &required));
        assert!(!satisfies(&caps(&["BAR"]), &caps(&["FOO", "BAR"])));
    }

    #[test]
    fn test_missing() {
        assert_eq!(missing(&caps(&["FOO"]), &caps(&["FOO", "BAR", "BAZ"])), vec!["BAR", "BAZ"]);
        assert!(missing(&caps(&["FOO"]), &caps(&["FOO"])).is_empty());
    }
}
