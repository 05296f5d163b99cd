//! Two-phase attempt policy for a single fetch
//!
//! A fetch gets a bounded number of proxied attempts followed by exactly
//! one direct attempt. The plan only tracks attempt accounting; picking a
//! proxy and judging the outcome belong to the fetcher.

/// Attempt accounting for one `fetch` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    max_proxied: u32,
    proxied_taken: u32,
    direct_taken: bool,
}

impl AttemptPlan {
    /// Creates a plan allowing up to `max_proxied` proxied attempts
    pub fn new(max_proxied: u32) -> Self {
        Self {
            max_proxied,
            proxied_taken: 0,
            direct_taken: false,
        }
    }

    /// True while the plan still allows proxied attempts
    pub fn proxied_phase(&self) -> bool {
        !self.direct_taken && self.proxied_taken < self.max_proxied
    }

    /// Consumes one proxied attempt slot, returning its 1-based number
    pub fn begin_proxied(&mut self) -> u32 {
        debug_assert!(self.proxied_phase());
        self.proxied_taken += 1;
        self.proxied_taken
    }

    /// Takes the single direct attempt; false if it was already taken
    pub fn begin_direct(&mut self) -> bool {
        if self.direct_taken {
            return false;
        }
        self.direct_taken = true;
        true
    }

    /// Number of proxied attempts consumed so far
    pub fn proxied_taken(&self) -> u32 {
        self.proxied_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_attempt_budget() {
        let mut plan = AttemptPlan::new(3);

        assert!(plan.proxied_phase());
        assert_eq!(plan.begin_proxied(), 1);
        assert_eq!(plan.begin_proxied(), 2);
        assert_eq!(plan.begin_proxied(), 3);

        // Proxied budget spent; exactly one direct attempt remains.
        assert!(!plan.proxied_phase());
        assert!(plan.begin_direct());
        assert!(!plan.begin_direct());
        assert!(!plan.proxied_phase());
    }

    #[test]
    fn test_zero_proxied_budget_goes_straight_to_direct() {
        let mut plan = AttemptPlan::new(0);
        assert!(!plan.proxied_phase());
        assert!(plan.begin_direct());
        assert!(!plan.begin_direct());
    }

    #[test]
    fn test_direct_can_cut_proxied_phase_short() {
        // The fetcher abandons the proxied phase when the pool is empty;
        // taking the direct attempt must end the proxied phase for good.
        let mut plan = AttemptPlan::new(5);
        assert_eq!(plan.begin_proxied(), 1);
        assert!(plan.begin_direct());
        assert!(!plan.proxied_phase());
        assert_eq!(plan.proxied_taken(), 1);
    }
}
