//! Cooperative search budgets
//!
//! Every search loop calls [`SearchBudget::check`] once per expansion step. The
//! cancellation flag is read on every call, the wall clock only every
//! `CLOCK_STRIDE` expansions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CLOCK_STRIDE: usize = 64;

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SearchStatus {
    /// The search space within the bound was exhausted
    Complete,
    /// Enumeration stopped at its result ceiling
    Truncated,
    /// Wall-clock or iteration budget ran out
    Timeout,
    /// The caller raised the cancellation flag
    Cancelled,
}

impl SearchStatus {
    pub fn is_partial(&self) -> bool {
        !matches!(self, SearchStatus::Complete)
    }
}

/// Limits applied to a single search
#[derive(Debug, Clone, Default)]
pub struct SearchBudget {
    /// Maximum number of expansion steps
    pub max_expansions: Option<usize>,
    /// Absolute wall-clock deadline
    pub deadline: Option<Instant>,
    /// Shared cancellation flag
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SearchBudget {
    /// A budget that never interrupts
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = Some(max);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Returns the interrupting status once the budget is spent.
    pub fn check(&self, expansions: usize) -> Result<(), SearchStatus> {
        if self.is_cancelled() {
            return Err(SearchStatus::Cancelled);
        }
        if let Some(max) = self.max_expansions {
            if expansions >= max {
                return Err(SearchStatus::Timeout);
            }
        }
        if let Some(deadline) = self.deadline {
            if expansions % CLOCK_STRIDE == 0 && Instant::now() >= deadline {
                return Err(SearchStatus::Timeout);
            }
        }
        Ok(())
    }
}

/// Result of a budgeted search together with how it ended
#[derive(Debug, Clone)]
pub struct SearchReport<T> {
    pub value: T,
    pub status: SearchStatus,
    pub expansions: usize,
}

impl<T> SearchReport<T> {
    pub fn new(value: T, status: SearchStatus, expansions: usize) -> Self {
        Self { value, status, expansions }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SearchReport<U> {
        SearchReport {
            value: f(self.value),
            status: self.status,
            expansions: self.expansions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_interrupts() {
        let budget = SearchBudget::unlimited();
        assert_eq!(budget.check(usize::MAX - 1), Ok(()));
    }

    #[test]
    fn test_expansion_limit() {
        let budget = SearchBudget::unlimited().with_max_expansions(10);
        assert_eq!(budget.check(9), Ok(()));
        assert_eq!(budget.check(10), Err(SearchStatus::Timeout));
    }

    #[test]
    fn test_cancel_flag_wins() {
        let flag = Arc::new(AtomicBool::new(false));
        let budget = SearchBudget::unlimited()
            .with_max_expansions(1)
            .with_cancel_flag(flag.clone());
        assert_eq!(budget.check(0), Ok(()));
        flag.store(true, Ordering::Relaxed);
        assert_eq!(budget.check(5), Err(SearchStatus::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let budget = SearchBudget::unlimited().with_timeout(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(budget.check(0), Err(SearchStatus::Timeout));
    }
}
