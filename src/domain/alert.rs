use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Routine,
    Urgent,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Routine => write!(f, "routine"),
            Severity::Urgent => write!(f, "urgent"),
        }
    }
}

/// A message bound for the push sink. Built, sent once, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(symbol: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            symbol: symbol.into(),
            message: message.into(),
            severity,
            timestamp: Utc::now(),
        }
    }

    pub fn routine(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(symbol, message, Severity::Routine)
    }

    pub fn urgent(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(symbol, message, Severity::Urgent)
    }

    pub fn is_urgent(&self) -> bool {
        self.severity == Severity::Urgent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let routine = AlertEvent::routine("ABC", "hello");
        assert_eq!(routine.severity, Severity::Routine);
        assert!(!routine.is_urgent());

        let urgent = AlertEvent::urgent("ABC", "crash");
        assert!(urgent.is_urgent());
        assert_eq!(urgent.symbol, "ABC");
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Urgent.to_string(), "urgent");
        assert_eq!(Severity::Routine.to_string(), "routine");
    }
}
