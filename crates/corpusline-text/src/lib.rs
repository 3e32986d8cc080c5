//! Corpusline Text - single-text modules plugged into the record pipeline
//!
//! Each stage is a trait with a total contract: extractors and cleaners
//! always return a string, filters always return a verdict. The rule-based
//! implementations here are configured from plain settings structs that
//! deserialize from the run configuration.

pub mod clean;
pub mod debug;
pub mod extract;
pub mod filter;

pub use clean::{CleanSettings, RuleCleaner};
pub use debug::{DebugReport, Debugger};
pub use extract::{ExtractSettings, MarkupExtractor};
pub use filter::{FilterSettings, QualityFilter};

/// Structural extraction (boilerplate and markup stripping).
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> String;
}

/// Normalization and redaction.
pub trait Cleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

/// Drop predicate: `true` means the text should be discarded.
pub trait Filter: Send + Sync {
    fn filter(&self, text: &str) -> bool;
}

/// Identity extractor/cleaner, used when a stage is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Extractor for Passthrough {
    fn extract(&self, text: &str) -> String {
        text.to_string()
    }
}

impl Cleaner for Passthrough {
    fn clean(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Filter that never drops.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAll;

impl Filter for KeepAll {
    fn filter(&self, _text: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_identity() {
        assert_eq!(Extractor::extract(&Passthrough, " a <b> "), " a <b> ");
        assert_eq!(Cleaner::clean(&Passthrough, "x\t\ty"), "x\t\ty");
    }

    #[test]
    fn keep_all_never_drops() {
        assert!(!KeepAll.filter(""));
        assert!(!KeepAll.filter("anything"));
    }
}
