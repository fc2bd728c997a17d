//! Preview state shared by the live previews and the export action
//!
//! [`PreviewHost`] owns the layout mode and header text. Both preview panes
//! subscribe to the same `watch` channel, so they always compose from the
//! same state, and an export takes a snapshot of that state when it starts.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::document::PageDescription;
use crate::error::{Error, Result};
use crate::export::{ExportReport, ExportSnapshot, Exporter, RenderEngine, Variant};
use crate::layout::LayoutMode;
use crate::question::{HeaderField, HeaderMetadata, Question};

/// Editable preview state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewState {
    pub layout: LayoutMode,
    pub header: HeaderMetadata,
}

/// Owner of the preview state for one question collection
#[derive(Debug)]
pub struct PreviewHost {
    questions: Arc<[Question]>,
    state: watch::Sender<PreviewState>,
    shutdown: watch::Sender<bool>,
}

impl PreviewHost {
    /// Create a host for the questions handed over by the selection step
    ///
    /// A missing collection is treated as empty.
    pub fn new(questions: Option<Vec<Question>>) -> Self {
        let questions = questions.unwrap_or_else(|| {
            debug!("no question collection supplied, previewing an empty one");
            Vec::new()
        });

        let (state, _) = watch::channel(PreviewState::default());
        let (shutdown, _) = watch::channel(false);

        Self {
            questions: questions.into(),
            state,
            shutdown,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Current state
    pub fn state(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    pub fn layout(&self) -> LayoutMode {
        self.state.borrow().layout
    }

    pub fn header(&self) -> HeaderMetadata {
        self.state.borrow().header.clone()
    }

    pub fn set_layout(&self, layout: LayoutMode) {
        self.state.send_if_modified(|state| {
            let changed = state.layout != layout;
            state.layout = layout;
            changed
        });
    }

    /// Set one header field
    pub fn set_field(&self, field: HeaderField, value: impl Into<String>) {
        let value = value.into();
        self.state.send_if_modified(|state| {
            if state.header.get(field) == value {
                return false;
            }
            state.header.set(field, value);
            true
        });
    }

    pub fn set_school_name(&self, value: impl Into<String>) {
        self.set_field(HeaderField::SchoolName, value);
    }

    pub fn set_subject(&self, value: impl Into<String>) {
        self.set_field(HeaderField::Subject, value);
    }

    pub fn set_date(&self, value: impl Into<String>) {
        self.set_field(HeaderField::Date, value);
    }

    pub fn set_watermark(&self, value: impl Into<String>) {
        self.set_field(HeaderField::Watermark, value);
    }

    /// The (questions, layout, header) triple as of now
    pub fn snapshot(&self) -> ExportSnapshot {
        let state = self.state.borrow();
        ExportSnapshot {
            questions: Arc::clone(&self.questions),
            layout: state.layout,
            header: state.header.clone(),
        }
    }

    /// A live preview of one variant
    pub fn pane(&self, variant: Variant) -> PreviewPane {
        PreviewPane {
            variant,
            questions: Arc::clone(&self.questions),
            state: self.state.subscribe(),
        }
    }

    /// The questions-only and with-answers previews
    pub fn panes(&self) -> (PreviewPane, PreviewPane) {
        (self.pane(Variant::QuestionsOnly), self.pane(Variant::WithAnswers))
    }

    /// Export both variants from the current state
    ///
    /// Returns [`Error::Cancelled`] if the host is torn down first; nothing is
    /// delivered after that point.
    pub async fn export(&self, exporter: &Exporter) -> Result<ExportReport> {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(Error::Cancelled);
        }

        let snapshot = self.snapshot();

        tokio::select! {
            biased;
            _ = shutdown.wait_for(|down| *down) => {
                warn!("preview closed, abandoning export");
                Err(Error::Cancelled)
            }
            report = exporter.export_pair(&snapshot) => report,
        }
    }

    /// Stop any in-flight export and refuse new ones
    pub fn teardown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// One live preview, recomposed from scratch on every change
#[derive(Debug, Clone)]
pub struct PreviewPane {
    variant: Variant,
    questions: Arc<[Question]>,
    state: watch::Receiver<PreviewState>,
}

impl PreviewPane {
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Snapshot of the state this pane currently shows
    pub fn snapshot(&self) -> ExportSnapshot {
        let state = self.state.borrow();
        ExportSnapshot {
            questions: Arc::clone(&self.questions),
            layout: state.layout,
            header: state.header.clone(),
        }
    }

    pub fn compose(&self) -> Result<PageDescription> {
        self.snapshot().compose(self.variant)
    }

    pub fn render(&self, engine: &dyn RenderEngine) -> Result<Vec<u8>> {
        engine.render(&self.compose()?)
    }

    /// Wait for the next state change
    ///
    /// Fails with [`Error::Cancelled`] once the host is gone.
    pub async fn changed(&mut self) -> Result<()> {
        self.state.changed().await.map_err(|_| Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::fonts;
    use crate::pdf::{page_contents, PdfRenderer};

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: "1".to_string(),
                text: "2+2=?".to_string(),
                options: Some(vec!["3".into(), "4".into(), "5".into()]),
                answer: "4".to_string(),
            },
            Question {
                id: "2".to_string(),
                text: "Largest planet?".to_string(),
                options: Some(vec!["Mars".into(), "Jupiter".into()]),
                answer: "Jupiter".to_string(),
            },
        ]
    }

    #[test]
    fn test_defaults() {
        let host = PreviewHost::new(Some(questions()));
        assert_eq!(host.layout(), LayoutMode::Vertical);
        assert_eq!(host.header(), HeaderMetadata::default());
        assert_eq!(host.questions().len(), 2);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let host = PreviewHost::new(None);
        assert!(host.questions().is_empty());

        let doc = host.pane(Variant::WithAnswers).compose().unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.header.lines.len(), 3);
    }

    #[test]
    fn test_setters_update_state() {
        let host = PreviewHost::new(Some(questions()));
        host.set_school_name("Lincoln High");
        host.set_subject("Math");
        host.set_date("2024-05-01");
        host.set_watermark("DRAFT");
        host.set_layout(LayoutMode::Horizontal);

        let state = host.state();
        assert_eq!(state.layout, LayoutMode::Horizontal);
        assert_eq!(state.header.school_name, "Lincoln High");
        assert_eq!(state.header.subject, "Math");
        assert_eq!(state.header.date, "2024-05-01");
        assert_eq!(state.header.watermark, "DRAFT");
    }

    #[test]
    fn test_panes_share_state() {
        let host = PreviewHost::new(Some(questions()));
        let (hidden, shown) = host.panes();

        host.set_school_name("Lincoln High");
        host.set_layout(LayoutMode::Horizontal);

        let hidden_doc = hidden.compose().unwrap();
        let shown_doc = shown.compose().unwrap();
        assert_eq!(hidden_doc.header, shown_doc.header);
        assert_eq!(hidden_doc.layout, LayoutMode::Horizontal);
        assert_eq!(shown_doc.without_answers(), hidden_doc);
        assert!(shown_doc.shows_answers());
    }

    #[test]
    fn test_panes_render_their_variant() {
        let host = PreviewHost::new(Some(questions()));
        host.set_school_name("Lincoln High");
        let renderer = PdfRenderer::new(fonts::register());

        let (hidden, shown) = host.panes();
        assert_eq!(hidden.variant(), Variant::QuestionsOnly);
        assert_eq!(shown.variant(), Variant::WithAnswers);

        let hidden_text = page_contents(&hidden.render(&renderer).unwrap()).unwrap().concat();
        let shown_text = page_contents(&shown.render(&renderer).unwrap()).unwrap().concat();
        for text in [&hidden_text, &shown_text] {
            assert!(text.contains("(Lincoln High) Tj"));
            assert!(text.contains("(B\\) Jupiter) Tj"));
        }
        assert!(!hidden_text.contains("Answer:"));
        assert!(shown_text.contains("(Answer: Jupiter) Tj"));
    }

    #[test]
    fn test_snapshot_is_detached_from_later_edits() {
        let host = PreviewHost::new(Some(questions()));
        host.set_subject("Math");
        let snapshot = host.snapshot();

        host.set_subject("Physics");
        assert_eq!(snapshot.header.subject, "Math");
        assert_eq!(host.snapshot().header.subject, "Physics");
    }

    #[tokio::test]
    async fn test_pane_sees_changes() {
        let host = PreviewHost::new(Some(questions()));
        let mut pane = host.pane(Variant::QuestionsOnly);

        host.set_layout(LayoutMode::Horizontal);
        pane.changed().await.unwrap();
        let doc = pane.compose().unwrap();
        assert_eq!(doc.layout, LayoutMode::Horizontal);
        assert_eq!(doc.sections[1].prompt.text, "2. Largest planet?");
        assert_eq!(doc.sections[1].slot.column, 1);
    }

    #[tokio::test]
    async fn test_unchanged_value_does_not_notify() {
        let host = PreviewHost::new(Some(questions()));
        let mut pane = host.pane(Variant::QuestionsOnly);

        host.set_layout(LayoutMode::Vertical);
        host.set_subject("");
        let waited = tokio::time::timeout(Duration::from_millis(20), pane.changed()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_pane_reports_closed_host() {
        let host = PreviewHost::new(Some(questions()));
        let mut pane = host.pane(Variant::QuestionsOnly);
        drop(host);

        assert!(matches!(pane.changed().await, Err(Error::Cancelled)));
    }
}
