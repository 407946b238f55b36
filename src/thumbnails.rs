/// Thumbnail pipeline
///
/// Renders one thumbnail per catalog entry, strictly in catalog order, on a
/// single offscreen rig. The pipeline runs once per session and is consumed
/// as a stream of events:
///
/// ```text
/// Idle -> Fetching -> Rendering(0) -> ... -> Rendering(n-1) -> Done
///                  \-> Empty (no files)
///                  \-> Failed (file list unavailable)
/// ```
///
/// A file that fails to load or render is logged and skipped, but still
/// counts towards progress, so `completed` always reaches `total`.
use futures::stream::{self, Stream};
use tokio::task;
use tracing::{debug, info, warn};

use crate::catalog::{FileCatalog, ModelFile};
use crate::error::{FetchError, RenderError, ThumbnailError};
use crate::loader::ModelLoader;
use crate::render::{self, ImageHandle, RenderSettings};
use crate::rig::RenderRig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// A rendered thumbnail; never changes once created
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailEntry {
    pub file: ModelFile,
    pub image: ImageHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Rendering(usize),
    Done,
    Empty,
    Failed,
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// File list fetched; `total` files will be processed
    Started {
        base_path: Option<String>,
        total: usize,
    },
    /// A new entry is ready (also the layout-change signal for the preview)
    Rendered {
        entry: ThumbnailEntry,
        progress: Progress,
    },
    Skipped {
        error: ThumbnailError,
        progress: Progress,
    },
    Failed(FetchError),
}

pub struct ThumbnailPipeline<C> {
    loader: ModelLoader<C>,
    /// `None` while a render worker owns the rig, or after a worker panicked
    rig: Option<RenderRig>,
    /// Unused copy of the initial rig, to rebuild from when a worker is lost
    blank_rig: RenderRig,
    settings: RenderSettings,
    files: Vec<ModelFile>,
    progress: Progress,
    state: PipelineState,
}

impl<C: FileCatalog> ThumbnailPipeline<C> {
    pub fn new(loader: ModelLoader<C>, rig: RenderRig, settings: RenderSettings) -> Self {
        Self {
            loader,
            blank_rig: rig.clone(),
            rig: Some(rig),
            settings,
            files: Vec::new(),
            progress: Progress::default(),
            state: PipelineState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[cfg(test)]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Advance by one event; `None` once the pipeline has finished
    pub async fn step(&mut self) -> Option<PipelineEvent> {
        match self.state {
            PipelineState::Idle => Some(self.fetch().await),
            PipelineState::Rendering(index) => Some(self.render_next(index).await),
            // Fetching is only observable if a step was abandoned mid-way
            PipelineState::Fetching
            | PipelineState::Done
            | PipelineState::Empty
            | PipelineState::Failed => None,
        }
    }

    /// Consume the pipeline as a lazy stream of events
    pub fn into_stream(self) -> impl Stream<Item = PipelineEvent> + Send
    where
        Self: Send,
    {
        stream::unfold(self, |mut pipeline| async move {
            let event = pipeline.step().await?;
            Some((event, pipeline))
        })
    }

    async fn fetch(&mut self) -> PipelineEvent {
        self.state = PipelineState::Fetching;

        match self.loader.catalog().snapshot().await {
            Ok(snapshot) => {
                self.files = snapshot.models();
                let total = self.files.len();
                self.progress = Progress {
                    completed: 0,
                    total,
                };
                self.state = if total == 0 {
                    PipelineState::Empty
                } else {
                    PipelineState::Rendering(0)
                };

                info!("🖼️  Rendering {} thumbnails", total);
                PipelineEvent::Started {
                    base_path: snapshot.base_path,
                    total,
                }
            }
            Err(e) => {
                warn!("⚠️  Could not fetch the file list: {}", e);
                self.state = PipelineState::Failed;
                PipelineEvent::Failed(e)
            }
        }
    }

    async fn render_next(&mut self, index: usize) -> PipelineEvent {
        let file = self.files[index].clone();
        let result = self.render_file(&file).await;

        self.progress.completed += 1;
        self.state = if index + 1 < self.files.len() {
            PipelineState::Rendering(index + 1)
        } else {
            PipelineState::Done
        };

        let progress = self.progress;
        let event = match result {
            Ok(image) => {
                debug!(
                    "📸 Rendered thumbnail {}/{}: {}",
                    progress.completed, progress.total, file.id
                );
                PipelineEvent::Rendered {
                    entry: ThumbnailEntry { file, image },
                    progress,
                }
            }
            Err(error) => {
                warn!("⚠️  Skipping {}: {}", file.id, error);
                PipelineEvent::Skipped { error, progress }
            }
        };

        if self.state == PipelineState::Done {
            info!("✅ Thumbnails complete: {}/{}", progress.completed, progress.total);
        }
        event
    }

    /// Load, frame, render and encode one file
    async fn render_file(&mut self, file: &ModelFile) -> Result<ImageHandle, ThumbnailError> {
        let graph = self.loader.load(file).await?;

        let mut rig = match self.rig.take() {
            Some(rig) => rig,
            None => {
                warn!("🔁 Rebuilding the thumbnail rig");
                self.blank_rig.clone()
            }
        };
        let settings = self.settings;

        let (rig, encoded) = task::spawn_blocking(move || {
            rig.frame(graph);
            let image = render::render(&rig, &settings);
            let encoded = render::encode_png(&image);
            (rig, encoded)
        })
        .await
        .map_err(|e| RenderError::Worker(e.to_string()))?;

        self.rig = Some(rig);
        Ok(encoded?)
    }
}
