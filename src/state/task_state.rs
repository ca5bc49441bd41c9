/// Task state definitions for tracking crawl progress
///
/// Every crawl task walks the same linear sequence of stages. Any stage may end
/// the task early; `Done` is only reached by a task that produced a result.
use crate::ErrorStage;
use std::fmt;

/// Represents the stage a crawl task is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskStage {
    Start,
    /// Reject tasks deeper than the configured maximum
    DepthCheck,
    /// Reject targets on a host other than the seed's
    ScopeCheck,
    /// Reject targets with a non-crawlable scheme
    NormalizeCheck,
    /// Claim the target in the visited set
    VisitedClaim,
    /// Wait for a rate limiter token
    RateLimitWait,
    Fetch,
    /// Require a 200 OK response
    StatusCheck,
    /// Read the body and collect anchor references
    ExtractLinks,
    /// Push the target onto the result stream
    EmitResult,
    /// Queue one child task per in-scope link
    SpawnChildren,
    Done,
}

impl TaskStage {
    /// Returns the stage that follows this one, or None for `Done`
    #[cfg(test)]
    pub fn next(self) -> Option<Self> {
        let next = match self {
            Self::Start => Self::DepthCheck,
            Self::DepthCheck => Self::ScopeCheck,
            Self::ScopeCheck => Self::NormalizeCheck,
            Self::NormalizeCheck => Self::VisitedClaim,
            Self::VisitedClaim => Self::RateLimitWait,
            Self::RateLimitWait => Self::Fetch,
            Self::Fetch => Self::StatusCheck,
            Self::StatusCheck => Self::ExtractLinks,
            Self::ExtractLinks => Self::EmitResult,
            Self::EmitResult => Self::SpawnChildren,
            Self::SpawnChildren => Self::Done,
            Self::Done => return None,
        };
        Some(next)
    }

    /// Returns true once the task holds an exclusive claim on its target
    pub fn is_claimed(self) -> bool {
        self > Self::VisitedClaim
    }

    /// Maps a task-level error onto the stage that raises it
    pub fn of_error(stage: ErrorStage) -> Self {
        match stage {
            ErrorStage::Parse | ErrorStage::Setup => Self::NormalizeCheck,
            ErrorStage::RateLimit => Self::RateLimitWait,
            ErrorStage::Fetch => Self::Fetch,
            ErrorStage::Status => Self::StatusCheck,
            ErrorStage::Markup => Self::ExtractLinks,
        }
    }
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a task ended without producing a result or an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Task depth is greater than the configured maximum
    DepthExceeded,
    /// Target host differs from the seed's host
    OutOfScope,
    /// Target scheme is neither http nor https
    UnsupportedScheme,
    /// Target was already claimed or the visited cap was reached
    NotClaimed,
}

impl SkipReason {
    /// Returns the stage at which this skip happens
    pub fn stage(self) -> TaskStage {
        match self {
            Self::DepthExceeded => TaskStage::DepthCheck,
            Self::OutOfScope => TaskStage::ScopeCheck,
            Self::UnsupportedScheme => TaskStage::NormalizeCheck,
            Self::NotClaimed => TaskStage::VisitedClaim,
        }
    }
}

/// How a finished task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Target was fetched, parsed, emitted, and `children` tasks were queued
    Processed { children: usize },
    /// Task ended silently
    Skipped(SkipReason),
    /// Task ended with an error recorded on the error stream
    Failed(ErrorStage),
}

impl TaskOutcome {
    /// Returns the last stage the task reached
    pub fn stage(&self) -> TaskStage {
        match self {
            Self::Processed { .. } => TaskStage::Done,
            Self::Skipped(reason) => reason.stage(),
            Self::Failed(stage) => TaskStage::of_error(*stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_form_a_single_chain() {
        let mut stage = TaskStage::Start;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            visited.push(next);
            stage = next;
        }
        assert_eq!(stage, TaskStage::Done);
        assert_eq!(visited.len(), 12);
    }

    #[test]
    fn test_claim_happens_before_fetch() {
        assert!(!TaskStage::ScopeCheck.is_claimed());
        assert!(!TaskStage::VisitedClaim.is_claimed());
        assert!(TaskStage::RateLimitWait.is_claimed());
        assert!(TaskStage::Fetch.is_claimed());
    }

    #[test]
    fn test_claim_is_held_once_fetching_starts() {
        for stage in [ErrorStage::RateLimit, ErrorStage::Fetch, ErrorStage::Status, ErrorStage::Markup] {
            assert!(TaskOutcome::Failed(stage).stage().is_claimed(), "{:?}", stage);
        }
        assert!(TaskOutcome::Processed { children: 0 }.stage().is_claimed());
    }

    #[test]
    fn test_skips_happen_before_claim() {
        for reason in [
            SkipReason::DepthExceeded,
            SkipReason::OutOfScope,
            SkipReason::UnsupportedScheme,
            SkipReason::NotClaimed,
        ] {
            assert!(!reason.stage().is_claimed(), "{:?}", reason);
        }
    }

    #[test]
    fn test_outcome_stage() {
        assert_eq!(
            TaskOutcome::Processed { children: 3 }.stage(),
            TaskStage::Done
        );
        assert_eq!(
            TaskOutcome::Failed(ErrorStage::Status).stage(),
            TaskStage::StatusCheck
        );
        assert_eq!(
            TaskOutcome::Skipped(SkipReason::OutOfScope).stage(),
            TaskStage::ScopeCheck
        );
    }
}
