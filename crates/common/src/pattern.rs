//! Distributed transaction pattern discriminator.

use serde::{Deserialize, Serialize};

/// The commit pattern a gateway call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pattern {
    /// Sequence of local transactions with compensating actions on failure.
    Saga,

    /// Prepare phase followed by a global commit or abort.
    TwoPhaseCommit,
}

impl Pattern {
    /// Both patterns, in the order the harness exercises them.
    pub const ALL: [Pattern; 2] = [Pattern::Saga, Pattern::TwoPhaseCommit];

    /// Returns the gateway path that places an order with this pattern.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Pattern::Saga => "/api/gateway/place-order-saga",
            Pattern::TwoPhaseCommit => "/api/gateway/place-order-2pc",
        }
    }

    /// Returns the short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Pattern::Saga => "Saga",
            Pattern::TwoPhaseCommit => "2PC",
        }
    }

    /// Returns true if results of this pattern carry prepare and commit phases.
    pub fn has_prepare_phase(&self) -> bool {
        matches!(self, Pattern::TwoPhaseCommit)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Returned when a string does not name a known pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePatternError(pub String);

impl std::fmt::Display for ParsePatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown pattern '{}', expected one of: saga, 2pc",
            self.0
        )
    }
}

impl std::error::Error for ParsePatternError {}

impl std::str::FromStr for Pattern {
    type Err = ParsePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "saga" => Ok(Pattern::Saga),
            "2pc" | "tpc" | "two-phase-commit" | "twophasecommit" => Ok(Pattern::TwoPhaseCommit),
            _ => Err(ParsePatternError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(Pattern::Saga.endpoint(), "/api/gateway/place-order-saga");
        assert_eq!(
            Pattern::TwoPhaseCommit.endpoint(),
            "/api/gateway/place-order-2pc"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Pattern::Saga.to_string(), "Saga");
        assert_eq!(Pattern::TwoPhaseCommit.to_string(), "2PC");
    }

    #[test]
    fn test_parse() {
        assert_eq!("saga".parse::<Pattern>(), Ok(Pattern::Saga));
        assert_eq!("SAGA".parse::<Pattern>(), Ok(Pattern::Saga));
        assert_eq!("2pc".parse::<Pattern>(), Ok(Pattern::TwoPhaseCommit));
        assert_eq!("tpc".parse::<Pattern>(), Ok(Pattern::TwoPhaseCommit));
        assert_eq!(
            "two-phase-commit".parse::<Pattern>(),
            Ok(Pattern::TwoPhaseCommit)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "3pc".parse::<Pattern>().unwrap_err();
        assert_eq!(err, ParsePatternError("3pc".to_string()));
        assert!(err.to_string().contains("3pc"));
    }

    #[test]
    fn test_prepare_phase() {
        assert!(!Pattern::Saga.has_prepare_phase());
        assert!(Pattern::TwoPhaseCommit.has_prepare_phase());
    }

    #[test]
    fn test_all_order() {
        assert_eq!(Pattern::ALL, [Pattern::Saga, Pattern::TwoPhaseCommit]);
    }
}
