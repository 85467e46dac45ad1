//! The filter session state machine.
//!
//! ```text
//!            load_original                    select(F)
//!   Empty ─────────────────▶ Ready(normal) ─────────────▶ Ready(F)
//!     ▲                          ▲  ▲                        │
//!     │ clear                    │  └────── load_original ───┘
//!     └──────────────────────────┴── (from any state)
//! ```
//!
//! Every render is produced from a fresh copy of the original canvas, so
//! filters never stack. Selecting the filter that is already active does
//! nothing. A failing effect degrades to a plain copy of the original with
//! export disabled instead of surfacing an error.
//!
//! ## Offloading
//!
//! [`FilterSession::select`] applies the effect inline. For a background
//! thread, split it in two: [`FilterSession::request`] validates and hands
//! out a [`RenderJob`], and [`FilterSession::complete`] publishes the
//! [`RenderOutcome`] only if it belongs to the newest request. Outcomes of
//! superseded requests are dropped on arrival. See [`crate::worker`].
//!
//! ## Events
//!
//! An optional `mpsc::Sender<SessionEvent>` receives one event per state
//! change, for the CLI (or a UI) to display.

use crate::catalog::FilterCatalog;
use crate::imaging::{
    BuiltinEffects, EffectRegistry, EncodeError, ExportEncoder, ExportFormat, FitError,
    IngestError, RustEncoder, center_offsets, ingest_bytes,
};
use crate::store::OriginalImageStore;
use crate::types::{BoundingBox, Dimensions, FilterName, OriginalCanvas, RenderedCanvas};
use image::RgbaImage;
use serde::Serialize;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Unsupported input type: {0}")]
    UnsupportedInputType(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Unknown filter: {0}")]
    UnknownFilter(FilterName),
    #[error("Export failed: {0}")]
    EncodingError(#[from] EncodeError),
    #[error("Nothing rendered yet")]
    NothingRendered,
    #[error("'{0}' applies no effect, so there is nothing to export")]
    ExportUnavailable(FilterName),
}

impl From<IngestError> for SessionError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedInputType(mime) => SessionError::UnsupportedInputType(mime),
            IngestError::Decode(msg) => SessionError::Decode(msg),
            IngestError::Fit(FitError::InvalidDimensions { width, height }) => {
                SessionError::InvalidDimensions { width, height }
            }
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No original loaded.
    Empty,
    /// An original is loaded; `render` is the latest published render.
    Ready {
        selection: FilterName,
        render: Option<RenderedCanvas>,
    },
}

/// State changes reported to an attached event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new original replaced whatever was loaded before.
    Loaded {
        dims: Dimensions,
        /// `(top, left)` margins that center the canvas on its anchor.
        offsets: (i64, i64),
    },
    Cleared,
    Rendered {
        selection: FilterName,
        revision: u64,
    },
    /// Whether the download action should be shown for the current render.
    ExportAvailability { available: bool },
    /// The effect failed; the original is shown instead.
    EffectFailed { selection: FilterName, reason: String },
    /// A background render finished after a newer request and was dropped.
    Discarded { selection: FilterName },
}

/// Result of a successful `select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    /// Already the active filter; nothing was rendered.
    Unchanged,
    /// The effect ran and its output was published.
    Applied,
    /// No such effect (or the identity filter); a plain copy was published.
    Identity,
    /// The effect failed; a plain copy was published with export disabled.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RenderStatus {
    Applied,
    Identity,
    Failed(String),
}

/// A render request: which filter, against which original.
///
/// Owns a handle on the original canvas; the pixel copy the effect works on
/// is made when the job runs.
#[derive(Debug, Clone)]
pub struct RenderJob {
    generation: u64,
    selection: FilterName,
    original: OriginalCanvas,
}

impl RenderJob {
    pub fn selection(&self) -> &FilterName {
        &self.selection
    }

    /// Copy the original and run the effect on the copy.
    ///
    /// The identity filter and names the registry lacks yield a plain copy.
    /// An effect error, or an effect that changes the bitmap size, yields a
    /// plain copy marked as failed.
    pub fn run(self, registry: &impl EffectRegistry) -> RenderOutcome {
        let expected = self.original.dims();
        let (pixels, status) = if self.selection.is_normal() || !registry.has(&self.selection) {
            (self.original.copy_pixels(), RenderStatus::Identity)
        } else {
            match registry.apply(&self.selection, self.original.copy_pixels()) {
                Ok(bitmap) if Dimensions::of(&bitmap) == expected => (bitmap, RenderStatus::Applied),
                Ok(bitmap) => (
                    self.original.copy_pixels(),
                    RenderStatus::Failed(format!(
                        "effect changed canvas size from {} to {}",
                        expected,
                        Dimensions::of(&bitmap)
                    )),
                ),
                Err(e) => (self.original.copy_pixels(), RenderStatus::Failed(e.to_string())),
            }
        };
        RenderOutcome {
            generation: self.generation,
            selection: self.selection,
            pixels,
            status,
        }
    }
}

/// The finished product of a [`RenderJob`].
#[derive(Debug)]
pub struct RenderOutcome {
    generation: u64,
    selection: FilterName,
    pixels: RgbaImage,
    status: RenderStatus,
}

impl RenderOutcome {
    pub fn selection(&self) -> &FilterName {
        &self.selection
    }
}

/// Owns the original canvas, the active selection, and the latest render.
pub struct FilterSession<R, E> {
    registry: R,
    encoder: E,
    catalog: FilterCatalog,
    bounds: BoundingBox,
    store: OriginalImageStore,
    state: SessionState,
    /// Bumped on every request, load, and clear; outcomes must match it.
    generation: u64,
    /// Requested but not yet published.
    pending: Option<FilterName>,
    revision: u64,
    events: Option<Sender<SessionEvent>>,
}

impl FilterSession<BuiltinEffects, RustEncoder> {
    /// Session with the built-in effects, the `image` encoders, and a
    /// catalog listing every built-in effect.
    pub fn builtin(bounds: BoundingBox) -> Self {
        let registry = BuiltinEffects::new();
        let catalog = FilterCatalog::from_registry(&registry);
        Self::new(registry, RustEncoder::new(), catalog, bounds)
    }
}

impl<R: EffectRegistry, E: ExportEncoder> FilterSession<R, E> {
    pub fn new(registry: R, encoder: E, catalog: FilterCatalog, bounds: BoundingBox) -> Self {
        Self {
            registry,
            encoder,
            catalog,
            bounds,
            store: OriginalImageStore::new(),
            state: SessionState::Empty,
            generation: 0,
            pending: None,
            revision: 0,
            events: None,
        }
    }

    /// Report state changes on `tx`.
    pub fn with_events(mut self, tx: Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening.
            tx.send(event).ok();
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Decode, fit, and load an image. Fails without touching the session.
    pub fn load_bytes(&mut self, bytes: &[u8], mime: &str) -> Result<Dimensions, SessionError> {
        let canvas = ingest_bytes(bytes, mime, self.bounds)?;
        let dims = canvas.dims();
        self.load_original(canvas);
        Ok(dims)
    }

    /// Replace the original and reset to the identity filter.
    ///
    /// Always publishes an identity render. Any in-flight request is
    /// invalidated.
    pub fn load_original(&mut self, canvas: OriginalCanvas) {
        self.generation += 1;
        self.pending = None;
        self.store.set_original(canvas.clone());

        let dims = canvas.dims();
        tracing::debug!(%dims, "loaded original");
        self.emit(SessionEvent::Loaded {
            dims,
            offsets: center_offsets(dims),
        });

        let selection = self.catalog.default_entry().clone();
        self.state = SessionState::Ready {
            selection: selection.clone(),
            render: None,
        };
        let job = RenderJob {
            generation: self.generation,
            selection,
            original: canvas,
        };
        let outcome = job.run(&self.registry);
        self.publish(outcome);
    }

    /// Switch to `name`, rendering it from the original.
    ///
    /// Only the published selection counts as active here. An outstanding
    /// request is superseded, even one for the same name.
    pub fn select(&mut self, name: impl Into<FilterName>) -> Result<SelectOutcome, SessionError> {
        let name = name.into();
        if self.state_is_ready() && self.catalog.contains(&name) {
            self.cancel_pending();
        }
        match self.request(name)? {
            None => Ok(SelectOutcome::Unchanged),
            Some(job) => {
                let outcome = job.run(&self.registry);
                Ok(self.publish(outcome))
            }
        }
    }

    /// Validate a selection and hand out the job that renders it.
    ///
    /// Returns `Ok(None)` when `name` is already the active (or pending)
    /// selection. Each returned job supersedes all earlier ones.
    pub fn request(
        &mut self,
        name: impl Into<FilterName>,
    ) -> Result<Option<RenderJob>, SessionError> {
        let name = name.into();
        let published = match &self.state {
            SessionState::Ready { selection, .. } => selection.clone(),
            SessionState::Empty => return Err(SessionError::NoImageLoaded),
        };
        if !self.catalog.contains(&name) {
            return Err(SessionError::UnknownFilter(name));
        }

        match &self.pending {
            Some(pending) if *pending == name => return Ok(None),
            None if published == name => return Ok(None),
            // Back to what is already on screen: just drop the in-flight job.
            Some(_) if published == name => {
                self.generation += 1;
                self.pending = None;
                return Ok(None);
            }
            _ => {}
        }

        let original = self
            .store
            .current()
            .map_err(|_| SessionError::NoImageLoaded)?
            .clone();
        self.generation += 1;
        self.pending = Some(name.clone());
        Ok(Some(RenderJob {
            generation: self.generation,
            selection: name,
            original,
        }))
    }

    /// Forget the outstanding request, if any.
    ///
    /// Its outcome will be discarded should it still arrive. Used when a job
    /// was dropped or its worker stopped before publishing.
    pub fn cancel_pending(&mut self) {
        if let Some(name) = self.pending.take() {
            tracing::debug!(selection = %name, "cancelled pending render");
            self.generation += 1;
        }
    }

    fn state_is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    /// Publish a finished job if it is still the newest request.
    ///
    /// Returns `None` when the outcome was superseded and dropped.
    pub fn complete(&mut self, outcome: RenderOutcome) -> Option<SelectOutcome> {
        if outcome.generation != self.generation
            || self.pending.as_ref() != Some(&outcome.selection)
        {
            tracing::debug!(selection = %outcome.selection, "discarding stale render");
            self.emit(SessionEvent::Discarded {
                selection: outcome.selection,
            });
            return None;
        }
        Some(self.publish(outcome))
    }

    /// Make `outcome` the current render and selection.
    fn publish(&mut self, outcome: RenderOutcome) -> SelectOutcome {
        let RenderOutcome {
            selection,
            pixels,
            status,
            ..
        } = outcome;

        self.pending = None;
        self.revision += 1;
        let exportable = status == RenderStatus::Applied;

        let result = match status {
            RenderStatus::Applied => SelectOutcome::Applied,
            RenderStatus::Identity => SelectOutcome::Identity,
            RenderStatus::Failed(reason) => {
                tracing::warn!(%selection, %reason, "effect failed, showing original");
                self.emit(SessionEvent::EffectFailed {
                    selection: selection.clone(),
                    reason,
                });
                SelectOutcome::Degraded
            }
        };

        let render = RenderedCanvas {
            selection: selection.clone(),
            dims: Dimensions::of(&pixels),
            pixels: Arc::new(pixels),
            exportable,
            revision: self.revision,
        };
        tracing::debug!(%selection, revision = self.revision, exportable, "published render");
        self.state = SessionState::Ready {
            selection: selection.clone(),
            render: Some(render),
        };

        self.emit(SessionEvent::Rendered {
            selection,
            revision: self.revision,
        });
        self.emit(SessionEvent::ExportAvailability {
            available: exportable,
        });
        result
    }

    /// Forget the original and return to `Empty`.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.store.clear();
        self.state = SessionState::Empty;
        self.emit(SessionEvent::Cleared);
    }

    /// Encode the latest render. Session state is unaffected either way.
    pub fn export_current(&self, format: ExportFormat) -> Result<Vec<u8>, SessionError> {
        match &self.state {
            SessionState::Empty => Err(SessionError::NoImageLoaded),
            SessionState::Ready { render: None, .. } => Err(SessionError::NothingRendered),
            SessionState::Ready {
                render: Some(render),
                ..
            } => Ok(self.encoder.encode(&render.pixels, format)?),
        }
    }

    /// Encode the latest render, refusing when export is not offered for it.
    ///
    /// The identity filter, names without an effect, and degraded renders
    /// yield [`SessionError::ExportUnavailable`].
    pub fn export_if_available(&self, format: ExportFormat) -> Result<Vec<u8>, SessionError> {
        match self.current_render() {
            Some(render) if !render.exportable => {
                Err(SessionError::ExportUnavailable(render.selection.clone()))
            }
            _ => self.export_current(format),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active selection, `None` while empty.
    pub fn selection(&self) -> Option<&FilterName> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Ready { selection, .. } => Some(selection),
        }
    }

    /// The selection that is requested but not yet published.
    pub fn pending(&self) -> Option<&FilterName> {
        self.pending.as_ref()
    }

    pub fn current_render(&self) -> Option<&RenderedCanvas> {
        match &self.state {
            SessionState::Ready { render, .. } => render.as_ref(),
            SessionState::Empty => None,
        }
    }

    pub fn is_export_available(&self) -> bool {
        self.current_render().is_some_and(|r| r.exportable)
    }

    pub fn original(&self) -> Option<&OriginalCanvas> {
        self.store.current().ok()
    }

    /// Number of renders published since the session was created.
    pub fn render_count(&self) -> u64 {
        self.revision
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}
