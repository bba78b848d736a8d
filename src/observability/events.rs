//! Query-layer lifecycle events

use std::fmt;

use super::logger::Severity;

/// Observable events of the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Store version resolved into a capability profile
    CapabilityResolved,
    /// View query sent
    ViewQueryBegin,
    /// View query answered
    ViewQueryComplete,
    /// Store reported the view (or its design document) missing
    ViewMissing,
    /// View written into an existing design document
    ViewRegistered,
    /// Design document created along with its first view
    DesignDocumentCreated,
    /// Map/reduce evaluated without a stored view
    AdHocQuery,
    /// Key list answered with one request per key
    MultiKeyFallback,
    /// Query ended in an error
    QueryFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::CapabilityResolved => "CAPABILITY_RESOLVED",
            Event::ViewQueryBegin => "VIEW_QUERY_BEGIN",
            Event::ViewQueryComplete => "VIEW_QUERY_COMPLETE",
            Event::ViewMissing => "VIEW_MISSING",
            Event::ViewRegistered => "VIEW_REGISTERED",
            Event::DesignDocumentCreated => "DESIGN_DOCUMENT_CREATED",
            Event::AdHocQuery => "AD_HOC_QUERY",
            Event::MultiKeyFallback => "MULTI_KEY_FALLBACK",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ViewQueryBegin | Event::ViewQueryComplete => Severity::Trace,
            Event::ViewMissing | Event::MultiKeyFallback => Severity::Warn,
            Event::QueryFailed => Severity::Error,
            _ => Severity::Info,
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
    fn test_event_names() {
        let events = [
            Event::CapabilityResolved,
            Event::ViewQueryBegin,
            Event::ViewQueryComplete,
            Event::ViewMissing,
            Event::ViewRegistered,
            Event::DesignDocumentCreated,
            Event::AdHocQuery,
            Event::MultiKeyFallback,
            Event::QueryFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
        assert_eq!(Event::ViewMissing.to_string(), "VIEW_MISSING");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::QueryFailed.severity(), Severity::Error);
        assert_eq!(Event::ViewMissing.severity(), Severity::Warn);
        assert_eq!(Event::ViewRegistered.severity(), Severity::Info);
    }
}
