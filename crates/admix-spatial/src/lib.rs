//! Admix spatial kernel
//!
//! Object-based loudspeaker panning in the ADM / BS.2127 style:
//!
//! ## Geometry
//! - Polar and Cartesian positions in the ADM convention
//! - Yaw/pitch/roll rotation matrices
//!
//! ## Layouts
//! - BS.2051 presets (0+2+0, 0+5+0, 0+7+0, 4+7+0)
//! - JSON import/export and validation
//!
//! ## Point-source panning
//! - Divergence into up to three virtual sources
//! - Channel lock and zone exclusion
//! - Change detection, gain crossfades and direct/diffuse split

#![allow(missing_docs)]

pub mod channel_lock;
pub mod divergence;
pub mod gain_calc;
pub mod layout;
pub mod metadata;
pub mod panner;
pub mod zone_exclusion;

mod error;
mod position;

pub use channel_lock::{ChannelLockHandler, NearestSpeakerLock};
pub use divergence::{DivergedSources, MAX_VIRTUAL_SOURCES, VirtualSource, diverge};
pub use error::{SpatialError, SpatialResult};
pub use gain_calc::{GainCalculator, LayeredPairwisePanner};
pub use layout::{Channel, Layout};
pub use metadata::{
    ChannelLock, JumpPosition, ObjectDivergence, ObjectMetadata, PolarExclusionZone,
};
pub use panner::{PannerState, PointSourcePanner, direct_diffuse_coefficients};
pub use position::{
    CartesianPosition, PolarPosition, RotationMatrix, cartesian_to_polar, polar_to_cartesian,
};
pub use zone_exclusion::{NearestSpeakerExclusion, NoZoneExclusion, ZoneExclusionHandler};
