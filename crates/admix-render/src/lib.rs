//! Admix object renderer
//!
//! Block-based rendering of point-source objects to loudspeakers:
//!
//! - One point-source panner per object track
//! - Parallel panning across objects (rayon)
//! - Diffuse-path decorrelation with latency-matched direct path
//! - JSON configuration

#![allow(missing_docs)]

pub mod config;
pub mod decorrelate;
pub mod renderer;

mod error;

pub use config::RendererConfig;
pub use decorrelate::{COMPENSATION_DELAY, DECORRELATOR_TAPS, Decorrelator, design_filter};
pub use error::{RenderError, RenderResult};
pub use renderer::{ObjectBlock, ObjectRenderer};

pub use admix_spatial as spatial;
