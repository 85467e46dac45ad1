//! # Filterbooth
//!
//! Load a photo, fit it into a bounded working canvas, preview it through a
//! catalog of named filters, and export whatever is on screen.
//!
//! # Flow
//!
//! ```text
//! bytes + mime ──ingest──▶ OriginalCanvas ──select(name)──▶ RenderedCanvas ──export──▶ PNG/JPEG/WebP
//!                 (fit)          │                                 ▲
//!                                └─────── always the source ───────┘
//! ```
//!
//! Every render starts from the stored original, never from the previous
//! render, so switching filters does not stack effects. Selecting the filter
//! that is already shown does nothing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Bounding-box fit, decoding, the effect registry and built-in effects, export encoding |
//! | [`store`] | Holds the fitted original for the lifetime of a load |
//! | [`catalog`] | Ordered list of filter names on offer, `normal` first |
//! | [`session`] | The filter session state machine: load, select, render, export |
//! | [`worker`] | Background render thread where only the newest request is rendered |
//! | [`config`] | `filterbooth.toml` loading, stock defaults, validation |
//! | [`types`] | Shared value types (`Dimensions`, `FilterName`, canvases) |
//! | [`output`] | CLI output formatting for events, the catalog, and fit results |
//!
//! # Design Decisions
//!
//! ## Shrink Only
//!
//! [`imaging::fit`] never enlarges. An image already inside the bounding box
//! keeps its size; anything larger is scaled along its longer axis so the
//! aspect ratio survives, rounding to the nearest pixel with a floor of one.
//!
//! ## Effects Behind a Trait
//!
//! The session only knows [`imaging::EffectRegistry`] and
//! [`imaging::ExportEncoder`]. Built-in effects and the `image`-crate encoder
//! are the production implementations; tests swap in recording mocks.
//!
//! ## Stale Renders Are Dropped
//!
//! Each render request carries a generation number. When a render finishes
//! after a newer request was made, [`session::FilterSession::complete`]
//! discards it, so the canvas always reflects the last selection.

pub mod catalog;
pub mod config;
pub mod imaging;
pub mod output;
pub mod session;
pub mod store;
pub mod types;
pub mod worker;
