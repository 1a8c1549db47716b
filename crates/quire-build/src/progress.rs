//! Build progress events.

use serde::Serialize;

/// Pipeline phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Clean,
    Assets,
    Pages,
    SearchSeo,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Assets => "assets",
            Self::Pages => "pages",
            Self::SearchSeo => "search-seo",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an event within its phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Start,
    Progress,
    End,
}

/// One progress notification.
///
/// `current`/`total` are only set for the pages phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ProgressEvent {
    pub fn start(phase: Phase) -> Self {
        Self {
            phase,
            status: Status::Start,
            current: None,
            total: None,
        }
    }

    pub fn end(phase: Phase) -> Self {
        Self {
            phase,
            status: Status::End,
            current: None,
            total: None,
        }
    }

    #[must_use]
    pub fn with_counts(mut self, current: Option<usize>, total: usize) -> Self {
        self.current = current;
        self.total = Some(total);
        self
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn emit(&self, event: ProgressEvent);
}

impl<F: Fn(ProgressEvent)> ProgressSink for F {
    fn emit(&self, event: ProgressEvent) {
        self(event);
    }
}
