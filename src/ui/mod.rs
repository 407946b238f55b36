/// Viewer window
///
/// The window is a client of the HTTP server: it fetches the file list and
/// model bytes over HTTP, renders thumbnails through the pipeline and shows
/// the floating preview.
///
/// - `grid.rs` - thumbnail grid geometry and widgets
/// - `canvas.rs` - orbit controls over the preview

pub mod canvas;
pub mod grid;

use iced::widget::{
    canvas as canvas_widget, column, container, image, mouse_area, row, stack, text, text_input,
    Space,
};
use iced::{
    event, mouse, time, window, Element, Event, Length, Padding, Size, Subscription, Task, Theme,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::http::HttpCatalog;
use crate::catalog::{format_base_path, ModelFile};
use crate::config::ViewOptions;
use crate::error::{FetchError, LoadError};
use crate::filter::FilterView;
use crate::loader::ModelLoader;
use crate::preview::layout::{AnchorId, LayoutChange, LayoutNotifier};
use crate::preview::{LoadRequest, PreviewController, SessionToken};
use crate::render::{RenderSettings, VIEW_SIZE};
use crate::rig::RenderRig;
use crate::scene::SceneGraph;
use crate::thumbnails::{PipelineEvent, Progress, ThumbnailEntry, ThumbnailPipeline};
use canvas::OrbitControls;
use grid::{GridLayout, HEADER_HEIGHT};

pub const WINDOW_SIZE: Size = Size::new(1100.0, 800.0);

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Main application state
pub struct ModelBrowser {
    catalog: HttpCatalog,
    loader: ModelLoader<HttpCatalog>,
    preview_settings: RenderSettings,
    base_path: Option<String>,
    entries: Vec<ThumbnailEntry>,
    /// Decoded thumbnail handles by file id
    images: HashMap<String, image::Handle>,
    progress: Option<Progress>,
    failure: Option<String>,
    filter: FilterView,
    notifier: LayoutNotifier,
    grid: GridLayout,
    preview: PreviewController,
    preview_image: Option<image::Handle>,
    buttons_pressed: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    Pipeline(PipelineEvent),
    FilterChanged(String),
    ThumbnailHovered(String),
    ThumbnailPressed(String),
    BackgroundPressed,
    PreviewExited,
    PreviewLoaded(SessionToken, Result<SceneGraph, LoadError>),
    Orbit { azimuth: f32, elevation: f32 },
    Zoom(f32),
    Scrolled(f32),
    WindowResized(Size),
    ButtonsChanged(bool),
    Heartbeat,
    HeartbeatSent(Result<(), FetchError>),
}

impl ModelBrowser {
    /// Create the viewer for a server URL and start the thumbnail pipeline
    pub fn new(url: Url) -> (Self, Task<Message>) {
        let options = ViewOptions::from_url(&url);
        let catalog = HttpCatalog::new(url);
        let loader = ModelLoader::new(Arc::new(catalog.clone()));

        info!("🎨 Viewer connected to {}", catalog.base());

        let pipeline = ThumbnailPipeline::new(
            loader.clone(),
            RenderRig::new(options.flip, options.shading),
            RenderSettings::thumbnail(options.encoding),
        );

        let notifier = LayoutNotifier::new();
        let preview = PreviewController::new(
            RenderRig::new(options.flip, options.shading),
            notifier.clone(),
        );

        let browser = ModelBrowser {
            catalog,
            loader,
            preview_settings: RenderSettings::preview(options.encoding),
            base_path: None,
            entries: Vec::new(),
            images: HashMap::new(),
            progress: None,
            failure: None,
            filter: FilterView::default(),
            notifier,
            grid: GridLayout::new(WINDOW_SIZE),
            preview,
            preview_image: None,
            buttons_pressed: false,
        };

        (browser, Task::run(pipeline.into_stream(), Message::Pipeline))
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Pipeline(event) => {
                self.on_pipeline_event(event);
                Task::none()
            }
            Message::FilterChanged(query) => {
                if self.filter.set_query(query) {
                    self.preview.filter_changed();
                    self.preview_image = None;
                    self.refresh_grid();
                }
                Task::none()
            }
            Message::ThumbnailHovered(id) => {
                let request = self.preview.pointer_move(
                    AnchorId(id.clone()),
                    ModelFile::new(id),
                    self.buttons_pressed,
                );
                self.start_load(request)
            }
            Message::ThumbnailPressed(id) => {
                let request = self
                    .preview
                    .pointer_down(AnchorId(id.clone()), ModelFile::new(id));
                self.start_load(request)
            }
            Message::BackgroundPressed => {
                self.preview.pointer_down_background();
                self.preview_image = None;
                Task::none()
            }
            Message::PreviewExited => {
                self.preview.pointer_leave(self.buttons_pressed);
                if self.preview.session().is_none() {
                    self.preview_image = None;
                }
                Task::none()
            }
            Message::PreviewLoaded(token, result) => {
                if self.preview.load_finished(token, result, &self.grid) {
                    self.refresh_preview_image();
                }
                Task::none()
            }
            Message::Orbit { azimuth, elevation } => {
                if self.preview.orbit(azimuth, elevation) {
                    self.refresh_preview_image();
                }
                Task::none()
            }
            Message::Zoom(factor) => {
                if self.preview.zoom(factor) {
                    self.refresh_preview_image();
                }
                Task::none()
            }
            Message::Scrolled(offset) => {
                self.grid.set_scroll(offset);
                self.notifier.notify(LayoutChange::Scrolled);
                self.preview.sync_layout(&self.grid);
                Task::none()
            }
            Message::WindowResized(size) => {
                self.grid.set_window(size);
                self.notifier.notify(LayoutChange::Resized);
                self.preview.sync_layout(&self.grid);
                Task::none()
            }
            Message::ButtonsChanged(pressed) => {
                self.buttons_pressed = pressed;
                Task::none()
            }
            Message::Heartbeat => {
                let catalog = self.catalog.clone();
                Task::perform(
                    async move { catalog.heartbeat().await },
                    Message::HeartbeatSent,
                )
            }
            Message::HeartbeatSent(result) => {
                if let Err(e) = result {
                    warn!("⚠️  Heartbeat failed: {}", e);
                }
                Task::none()
            }
        }
    }

    fn on_pipeline_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Started { base_path, total } => {
                self.base_path = base_path;
                self.progress = Some(Progress {
                    completed: 0,
                    total,
                });
            }
            PipelineEvent::Rendered { entry, progress } => {
                self.images.insert(
                    entry.file.id.clone(),
                    image::Handle::from_bytes(entry.image.png_bytes().to_vec()),
                );
                self.entries.push(entry);
                self.progress = Some(progress);

                self.refresh_grid();
                self.notifier.notify(LayoutChange::EntryAdded);
                self.preview.sync_layout(&self.grid);
            }
            PipelineEvent::Skipped { progress, .. } => {
                self.progress = Some(progress);
            }
            PipelineEvent::Failed(e) => {
                self.failure = Some(e.to_string());
            }
        }
    }

    fn start_load(&self, request: Option<LoadRequest>) -> Task<Message> {
        let Some(LoadRequest { token, file }) = request else {
            return Task::none();
        };

        debug!("🔄 Loading preview for {}", file.id);
        let loader = self.loader.clone();
        Task::perform(async move { loader.load(&file).await }, move |result| {
            Message::PreviewLoaded(token, result)
        })
    }

    fn refresh_grid(&mut self) {
        self.grid
            .set_visible(self.filter.apply(&self.entries).map(|e| e.file.id.as_str()));
    }

    fn refresh_preview_image(&mut self) {
        self.preview_image = self.preview.render(&self.preview_settings).map(|frame| {
            let (width, height) = frame.dimensions();
            image::Handle::from_rgba(width, height, frame.into_raw())
        });
    }

    fn status(&self) -> String {
        if let Some(failure) = &self.failure {
            return format!("could not load files: {}", failure);
        }
        match self.progress {
            None => "loading".to_string(),
            Some(progress) if progress.total == 0 => "no files found".to_string(),
            Some(progress) if !progress.is_complete() => {
                format!("loading {}/{}", progress.completed, progress.total)
            }
            Some(_) => String::new(),
        }
    }

    /// Build the user interface
    pub fn view(&self) -> Element<Message> {
        let base_path = self
            .base_path
            .as_deref()
            .map(format_base_path)
            .unwrap_or_default();

        let header = container(
            column![
                text("model-browser").size(32),
                text(base_path).size(18),
                row![
                    text_input("filter", self.filter.query())
                        .on_input(Message::FilterChanged)
                        .width(Length::Fixed(300.0))
                        .padding(6),
                    text(self.status()).size(14),
                ]
                .spacing(16)
                .align_y(iced::Alignment::Center),
            ]
            .spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .height(Length::Fixed(HEADER_HEIGHT));

        let visible: Vec<&ThumbnailEntry> = self.filter.apply(&self.entries).collect();
        let body = mouse_area(grid::view(&self.grid, visible, &self.images))
            .on_press(Message::BackgroundPressed);

        stack![column![header, body], self.view_preview()]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// The floating preview, or nothing while it is hidden
    fn view_preview(&self) -> Element<Message> {
        let viewport = self.preview.viewport();
        let (Some(handle), Some(rect), true) =
            (&self.preview_image, viewport.rect, viewport.visible)
        else {
            return Space::new(Length::Shrink, Length::Shrink).into();
        };

        let size = Length::Fixed(VIEW_SIZE as f32);
        let frame = stack![
            image(handle.clone()).width(size).height(size),
            canvas_widget(OrbitControls).width(size).height(size),
        ];

        container(mouse_area(frame).on_exit(Message::PreviewExited))
            .padding(Padding {
                top: rect.y.max(0.0),
                left: rect.x.max(0.0),
                right: 0.0,
                bottom: 0.0,
            })
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen_with(runtime_event),
            time::every(HEARTBEAT_INTERVAL).map(|_| Message::Heartbeat),
        ])
    }

    /// Set the application theme
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn runtime_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Mouse(mouse::Event::ButtonPressed(_)) => Some(Message::ButtonsChanged(true)),
        Event::Mouse(mouse::Event::ButtonReleased(_)) => Some(Message::ButtonsChanged(false)),
        Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
        Event::Window(window::Event::Opened { size, .. }) => Some(Message::WindowResized(size)),
        _ => None,
    }
}
