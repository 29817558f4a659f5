use std::collections::HashSet;

/// Tracks company numbers already dispatched in this run so each identifier
/// is fetched and filtered at most once. Lives for the process only; never
/// persisted.
#[derive(Debug, Default)]
pub struct SeenSet {
    seen: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the identifier as seen. Returns true exactly once per
    /// identifier: the first caller should process it, later callers skip.
    pub fn check_and_mark(&mut self, company_number: &str) -> bool {
        self.seen.insert(company_number.to_string())
    }

    pub fn is_seen(&self, company_number: &str) -> bool {
        self.seen.contains(company_number)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_passes_then_blocks_for_the_rest_of_the_run() {
        let mut seen = SeenSet::new();
        assert!(seen.check_and_mark("01234567"));
        assert!(!seen.check_and_mark("01234567"));
        assert!(!seen.check_and_mark("01234567"));
        assert!(seen.is_seen("01234567"));
    }

    #[test]
    fn distinct_identifiers_are_independent() {
        let mut seen = SeenSet::new();
        assert!(seen.check_and_mark("01234567"));
        assert!(seen.check_and_mark("07654321"));
        assert!(!seen.is_seen("00000001"));
        assert_eq!(seen.len(), 2);
    }
}
