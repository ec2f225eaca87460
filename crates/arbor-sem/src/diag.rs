//! Diagnostics sink for constraint conflicts and rule failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use arbor_model::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One reported problem. Consumers decide what is user-visible; the semantic
/// layer never aborts evaluation over a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub node: Option<NodeId>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{}: {} (node {})", self.severity, self.message, node),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Accumulating sink. Append-only during evaluation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn error(&mut self, message: impl Into<String>, node: Option<NodeId>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            node,
        });
    }

    pub fn warning(&mut self, message: impl Into<String>, node: Option<NodeId>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            node,
        });
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_and_warnings_are_distinguished() {
        let mut sink = Diagnostics::new();
        sink.warning("suspicious", None);
        assert!(!sink.has_errors());
        sink.error("broken", Some(NodeId(3)));
        assert!(sink.has_errors());
        assert_eq!(sink.items().len(), 2);
    }

    #[test]
    fn display_includes_the_node_when_present() {
        let mut sink = Diagnostics::new();
        sink.error("type mismatch", Some(NodeId(7)));
        assert_eq!(sink.items()[0].to_string(), "error: type mismatch (node 7)");
    }

    #[test]
    fn serde_roundtrip() {
        let diagnostic = Diagnostic {
            severity: Severity::Warning,
            message: "shadowed declaration".into(),
            node: Some(NodeId(12)),
        };
        let json = serde_json::to_string(&diagnostic).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(diagnostic, back);
    }
}
