//! Record pipeline: extract → filter → clean → filter, short-circuiting
//!
//! The filter runs twice because some disqualifying content is only visible
//! before cleaning (raw markup density) and some only after (a text that
//! cleans down to almost nothing).

use std::fmt;

use corpusline_text::{
    Cleaner, Extractor, Filter, KeepAll, MarkupExtractor, Passthrough, QualityFilter, RuleCleaner,
};

use crate::config::RunConfig;

/// Why a record did not survive the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Rejected by the filter after extraction
    FilteredRaw,
    /// Rejected by the filter after cleaning
    FilteredCleaned,
    /// Passed both filters but cleaned down to an empty string
    EmptyAfterClean,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilteredRaw => write!(f, "filtered before cleaning"),
            Self::FilteredCleaned => write!(f, "filtered after cleaning"),
            Self::EmptyAfterClean => write!(f, "empty after cleaning"),
        }
    }
}

/// Result of transforming one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Kept(String),
    Dropped(DropReason),
}

impl Outcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, Self::Kept(_))
    }

    /// Collapse to the empty-string convention: `""` means dropped.
    pub fn into_text(self) -> String {
        match self {
            Self::Kept(text) => text,
            Self::Dropped(_) => String::new(),
        }
    }
}

/// Apply the four stages to one text.
pub fn transform(
    text: &str,
    extractor: &dyn Extractor,
    filter: &dyn Filter,
    cleaner: &dyn Cleaner,
) -> Outcome {
    let text = extractor.extract(text);
    if filter.filter(&text) {
        return Outcome::Dropped(DropReason::FilteredRaw);
    }
    let text = cleaner.clean(&text);
    if filter.filter(&text) {
        return Outcome::Dropped(DropReason::FilteredCleaned);
    }
    if text.is_empty() {
        return Outcome::Dropped(DropReason::EmptyAfterClean);
    }
    Outcome::Kept(text)
}

/// The three single-text modules, shared read-only by every worker.
pub struct StageModules {
    pub extractor: Box<dyn Extractor>,
    pub filter: Box<dyn Filter>,
    pub cleaner: Box<dyn Cleaner>,
}

impl fmt::Debug for StageModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageModules").finish_non_exhaustive()
    }
}

impl StageModules {
    pub fn new(
        extractor: Box<dyn Extractor>,
        filter: Box<dyn Filter>,
        cleaner: Box<dyn Cleaner>,
    ) -> Self {
        Self {
            extractor,
            filter,
            cleaner,
        }
    }

    /// Rule-based modules from the run configuration. A disabled stage
    /// gets a passthrough module.
    pub fn from_config(config: &RunConfig) -> Self {
        let filter: Box<dyn Filter> = if config.stages.filter {
            Box::new(QualityFilter::new(config.filter.clone()))
        } else {
            Box::new(KeepAll)
        };
        let cleaner: Box<dyn Cleaner> = if config.stages.clean {
            Box::new(RuleCleaner::new(config.cleaner.clone()))
        } else {
            Box::new(Passthrough)
        };
        Self::new(
            Box::new(MarkupExtractor::new(config.extractor.clone())),
            filter,
            cleaner,
        )
    }

    pub fn transform(&self, text: &str) -> Outcome {
        transform(
            text,
            self.extractor.as_ref(),
            self.filter.as_ref(),
            self.cleaner.as_ref(),
        )
    }
}
