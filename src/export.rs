//! Dual-variant export
//!
//! Every export renders the same snapshot twice, once without answers and
//! once with, and delivers the two artifacts under fixed filenames. The two
//! renders run as independent blocking tasks and are joined before anything
//! is delivered. A failure in one variant never stops the other: the failed
//! variant is simply not delivered, and the outcome of each is recorded in an
//! [`ExportReport`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::document::{compose, validate, PageDescription};
use crate::error::{Error, Result};
use crate::layout::LayoutMode;
use crate::question::{HeaderMetadata, Question};

/// Turns a page description into document bytes
pub trait RenderEngine: Send + Sync {
    fn render(&self, description: &PageDescription) -> Result<Vec<u8>>;

    /// File extension of the rendered format, without the dot
    fn extension(&self) -> &str;
}

/// Hands a finished artifact to the user
pub trait Delivery: Send + Sync {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<()>;
}

/// Notified once both artifacts have been delivered
pub trait Navigator: Send + Sync {
    fn leave_preview(&self);
}

/// The two documents produced by every export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    QuestionsOnly,
    WithAnswers,
}

impl Variant {
    /// Both variants, in delivery order
    pub const ALL: [Variant; 2] = [Variant::QuestionsOnly, Variant::WithAnswers];

    pub fn shows_answers(&self) -> bool {
        match self {
            Variant::QuestionsOnly => false,
            Variant::WithAnswers => true,
        }
    }

    /// Filename without extension; fixed regardless of header content
    pub fn file_stem(&self) -> &'static str {
        match self {
            Variant::QuestionsOnly => "questions_only",
            Variant::WithAnswers => "questions_with_answers",
        }
    }

    pub fn filename(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem(), extension)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::QuestionsOnly => f.write_str("questions only"),
            Variant::WithAnswers => f.write_str("questions with answers"),
        }
    }
}

/// Immutable input of one export: questions, layout, and header
///
/// Cloning is cheap for the questions (shared) and copies the header, so each
/// render task owns its own view.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    pub questions: Arc<[Question]>,
    pub layout: LayoutMode,
    pub header: HeaderMetadata,
}

impl ExportSnapshot {
    pub fn new(
        questions: impl Into<Arc<[Question]>>,
        layout: LayoutMode,
        header: HeaderMetadata,
    ) -> Self {
        Self {
            questions: questions.into(),
            layout,
            header,
        }
    }

    /// Compose the page description for one variant
    pub fn compose(&self, variant: Variant) -> Result<PageDescription> {
        compose(&self.questions, self.layout, variant.shows_answers(), &self.header)
    }
}

/// A rendered document and the name it should be saved under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub variant: Variant,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Render results for both variants
#[derive(Debug)]
pub struct RenderedPair {
    pub questions_only: Result<ExportArtifact>,
    pub with_answers: Result<ExportArtifact>,
}

impl RenderedPair {
    /// Results in delivery order
    pub fn into_results(self) -> [(Variant, Result<ExportArtifact>); 2] {
        [
            (Variant::QuestionsOnly, self.questions_only),
            (Variant::WithAnswers, self.with_answers),
        ]
    }
}

/// What happened to one variant
#[derive(Debug)]
pub struct VariantReport {
    pub variant: Variant,
    pub filename: String,
    /// `Ok` once delivered; otherwise the render or delivery error
    pub outcome: Result<()>,
}

/// Outcome of one export action
#[derive(Debug)]
pub struct ExportReport {
    pub variants: [VariantReport; 2],
}

impl ExportReport {
    /// Both variants were delivered
    pub fn is_complete(&self) -> bool {
        self.variants.iter().all(|report| report.outcome.is_ok())
    }

    /// Filenames that were delivered, in delivery order
    pub fn delivered(&self) -> Vec<&str> {
        self.variants
            .iter()
            .filter(|report| report.outcome.is_ok())
            .map(|report| report.filename.as_str())
            .collect()
    }

    /// Errors of the variants that were not delivered
    pub fn failures(&self) -> impl Iterator<Item = (Variant, &Error)> {
        self.variants
            .iter()
            .filter_map(|report| report.outcome.as_ref().err().map(|e| (report.variant, e)))
    }

    /// Collapse into pass/fail
    pub fn into_result(self) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        let messages: Vec<String> = self.failures().map(|(_, e)| e.to_string()).collect();
        Err(Error::ExportIncomplete(messages.join("; ")))
    }
}

/// Writes artifacts into a directory
///
/// Each file is written under a temporary name and renamed into place, so a
/// failed write never leaves a truncated artifact behind.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(&self, artifact: &ExportArtifact) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(&artifact.filename);
        let partial = self.dir.join(format!(".{}.part", artifact.filename));
        std::fs::write(&partial, &artifact.bytes)?;
        if let Err(e) = std::fs::rename(&partial, &target) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
        Ok(target)
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<()> {
        let path = self.write(artifact).map_err(|e| Error::Delivery {
            filename: artifact.filename.clone(),
            message: e.to_string(),
        })?;
        info!("Saved {}", path.display());
        Ok(())
    }
}

/// Drives both renders and both deliveries
#[derive(Clone)]
pub struct Exporter {
    engine: Arc<dyn RenderEngine>,
    delivery: Arc<dyn Delivery>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("extension", &self.engine.extension())
            .field("navigator", &self.navigator.is_some())
            .finish()
    }
}

impl Exporter {
    pub fn new(engine: Arc<dyn RenderEngine>, delivery: Arc<dyn Delivery>) -> Self {
        Self {
            engine,
            delivery,
            navigator: None,
        }
    }

    /// Notify `navigator` after every complete export
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Filename used for a variant with this exporter's engine
    pub fn filename(&self, variant: Variant) -> String {
        variant.filename(self.engine.extension())
    }

    /// Render both variants concurrently
    ///
    /// Fails up front, rendering nothing, if the questions cannot be
    /// composed. Otherwise each variant's render result is returned
    /// separately.
    pub async fn render_pair(&self, snapshot: &ExportSnapshot) -> Result<RenderedPair> {
        validate(&snapshot.questions)?;

        let (questions_only, with_answers) = tokio::join!(
            self.render_variant(snapshot.clone(), Variant::QuestionsOnly),
            self.render_variant(snapshot.clone(), Variant::WithAnswers),
        );

        Ok(RenderedPair {
            questions_only,
            with_answers,
        })
    }

    async fn render_variant(
        &self,
        snapshot: ExportSnapshot,
        variant: Variant,
    ) -> Result<ExportArtifact> {
        let engine = Arc::clone(&self.engine);
        let filename = self.filename(variant);

        let task = tokio::task::spawn_blocking(move || {
            let description = snapshot.compose(variant)?;
            engine.render(&description)
        });

        let render_failure = |message: String| Error::Render { variant, message };
        let bytes = match task.await {
            Ok(Ok(bytes)) if bytes.is_empty() => {
                return Err(render_failure("engine produced no output".to_string()))
            }
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(render_failure(e.to_string())),
            Err(e) => return Err(render_failure(e.to_string())),
        };

        Ok(ExportArtifact {
            variant,
            filename,
            bytes,
        })
    }

    /// Render both variants, deliver whatever rendered, and report
    ///
    /// Returns `Err` only when the questions cannot be composed. Render and
    /// delivery failures are recorded per variant in the report.
    pub async fn export_pair(&self, snapshot: &ExportSnapshot) -> Result<ExportReport> {
        info!(
            "Exporting {} questions ({} layout)",
            snapshot.questions.len(),
            snapshot.layout
        );

        let rendered = self.render_pair(snapshot).await?;

        // Delivered one after the other, questions-only first
        let [first, second] = rendered.into_results();
        let variants = [self.settle(first).await, self.settle(second).await];

        let report = ExportReport { variants };

        if report.is_complete() {
            info!("Export complete: {}", report.delivered().join(", "));
            if let Some(navigator) = &self.navigator {
                navigator.leave_preview();
            }
        }

        Ok(report)
    }

    async fn settle(&self, (variant, result): (Variant, Result<ExportArtifact>)) -> VariantReport {
        let filename = self.filename(variant);
        let outcome = match result {
            Ok(artifact) => self.deliver(artifact).await,
            Err(e) => {
                warn!("Skipping delivery of {}: {}", filename, e);
                Err(e)
            }
        };
        VariantReport {
            variant,
            filename,
            outcome,
        }
    }

    /// Hand one artifact to the delivery target on the blocking pool
    async fn deliver(&self, artifact: ExportArtifact) -> Result<()> {
        let delivery = Arc::clone(&self.delivery);
        let filename = artifact.filename.clone();

        let outcome = tokio::task::spawn_blocking(move || delivery.deliver(&artifact))
            .await
            .unwrap_or_else(|e| Err(Error::General(e.to_string())));

        outcome.map_err(|e| {
            error!("Delivery of {} failed: {}", filename, e);
            match e {
                Error::Delivery { .. } => e,
                other => Error::Delivery {
                    filename: filename.clone(),
                    message: other.to_string(),
                },
            }
        })
    }
}
