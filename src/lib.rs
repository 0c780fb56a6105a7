//! Adjustable collage layouts and pop-out person-cutout compositing.
//!
//! Two independent engines share this crate:
//!
//! - The **layout engine** maps named split parameters to normalized cell
//!   geometry, with constrained interactive updates (adjacent dividers
//!   cannot cross) and data-driven JSON templates.
//! - The **cutout compositor** turns a photo plus a person-segmentation
//!   mask into a trimmed, stroked, shadowed cutout and flattens it over a
//!   3x3 photo grid, with placement kept in background-relative units so
//!   preview and export renders agree.
//!
//! # Quick Start
//!
//! ```no_run
//! use gridpop::{layouts_for, MaskFileSegmenter, PopoutEngine};
//! use std::path::PathBuf;
//!
//! // Layouts: a 2x2 grid with an adjustable center divider.
//! let mut layout = layouts_for(4).into_iter().next().unwrap();
//! layout.update("h_split1", 0.62);
//! for cell in layout.cells() {
//!     println!("{:?}", cell.frame);
//! }
//!
//! // Compositing: mask produced by an external segmentation model.
//! let engine = PopoutEngine::new(Box::new(MaskFileSegmenter::new("person_mask.png")));
//! let grid: Vec<PathBuf> = (1..=9).map(|i| PathBuf::from(format!("photo{i}.jpg"))).collect();
//! let result = engine.process_file("person.jpg".as_ref(), &grid, "out.png".as_ref());
//! println!("{}", result.message);
//! ```
//!
//! Segmentation itself is a collaborator behind the [`Segmenter`] trait;
//! this crate consumes confidence masks and never runs a model.

#![deny(missing_docs)]

pub mod compose;
pub mod cutout;
pub mod error;
pub mod expr;
pub mod geometry;
pub mod layout;
pub mod mask;
pub mod orient;
mod raster;
pub mod sticker;
pub mod template;
pub mod throttle;

mod engine;

pub use compose::{
    build_grid, center_crop_square, layout_composition, render, CompositionLayout,
    CompositionState, GridOptions,
};
pub use cutout::{extract_cutout, trim, TRIM_ALPHA_THRESHOLD};
pub use engine::{
    is_supported_image, save_image, EngineOptions, PersonCutout, PopoutEngine, ProcessResult,
};
pub use error::{Error, Result};
pub use geometry::{CellGeometry, Rect, ShapeKind, Size, Vec2};
pub use layout::{layouts_for, Layout, LayoutController, Parameter, ParameterSet, MIN_SPACING};
pub use mask::{
    MaskFileSegmenter, SegmentationMask, SegmentationQuality, Segmenter, PERSON_THRESHOLD,
};
pub use orient::Orientation;
pub use sticker::{apply_sticker, Sticker, StickerStyle};
pub use template::{load_template, load_templates, LayoutTemplate};
pub use throttle::{Throttle, NOTIFY_INTERVAL};
