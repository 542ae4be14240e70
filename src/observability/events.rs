//! Observable lifecycle events
//!
//! Events are explicit and typed. Each one is logged with an `event` field
//! carrying its stable upper-case name, so log consumers can match on it.

use std::fmt;

use tracing::Level;

/// Observable events in roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// HTTP listener bound, ready for requests
    ServerListening,
    /// Shutdown signal received
    ShutdownStart,
    /// In-flight requests drained, server stopped
    ShutdownComplete,

    // Query
    /// Query shaped successfully
    QueryExecuted,
    /// Query options rejected with InvalidQuery
    QueryRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ROSTER_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerListening => "ROSTER_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::QueryRejected => Level::WARN,
            Event::QueryExecuted => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::BootStart,
            Event::ConfigLoaded,
            Event::ServerListening,
            Event::ShutdownStart,
            Event::ShutdownComplete,
            Event::QueryExecuted,
            Event::QueryRejected,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_levels() {
        assert_eq!(Event::QueryRejected.level(), Level::WARN);
        assert_eq!(Event::BootStart.level(), Level::INFO);
        assert_eq!(Event::QueryExecuted.level(), Level::DEBUG);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::BootStart), "ROSTER_STARTUP_BEGIN");
        assert_eq!(format!("{}", Event::ShutdownComplete), "SHUTDOWN_COMPLETE");
    }
}
