//! Configuration structures for the per-joint retargeting pipeline

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::pose::TrackedJointId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mapping parameters for one joint channel.
///
/// These are static configuration, not runtime state, though `offset_deg` is
/// rewritten by calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Scale applied to the raw source angle.
    pub scale: f64,

    /// Offset added after scaling.
    ///
    /// Units: degrees
    pub offset_deg: f64,

    /// Half-width of the dead zone about the dead-zone centre. Mapped values
    /// inside the zone are clamped to the centre.
    ///
    /// Units: degrees
    pub dead_zone_deg: f64,

    /// Additional width beyond the dead zone which a mapped value must
    /// exceed to release an engaged dead-zone hold.
    ///
    /// Units: degrees
    pub dead_hysteresis_deg: f64,

    /// Centre of the dead zone.
    ///
    /// Units: degrees
    pub dead_center_deg: f64,

    /// One-pole low-pass filter coefficient in [0, 1]. Values near 1 track
    /// the input almost instantly, values near 0 heavily damp noise.
    pub smooth_alpha: f64,

    /// Maximum rate of change of the commanded angle. Zero or negative
    /// disables rate limiting.
    ///
    /// Units: degrees/second
    pub rate_limit_degs: f64,

    /// Width of the soft-limit band inside each hard angle bound, within
    /// which the target is decelerated rather than clamped abruptly. Zero
    /// disables soft-limit shaping.
    ///
    /// Units: degrees
    pub soft_limit_margin_deg: f64,
}

/// Binding of a joint channel onto a tracked source joint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceBinding {
    /// The tracked source joint whose orientation feeds this channel.
    pub source: TrackedJointId,

    /// Which intrinsic Euler component of the source orientation is read.
    pub axis: EulerAxis,

    /// Sign applied to the extracted component, +1.0 or -1.0.
    pub sign: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Intrinsic Euler components of a source orientation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EulerAxis {
    Roll,
    Pitch,
    Yaw,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            scale: 1.0,
            offset_deg: 0.0,
            dead_zone_deg: 0.0,
            dead_hysteresis_deg: 0.0,
            dead_center_deg: 0.0,
            smooth_alpha: 1.0,
            rate_limit_degs: 0.0,
            soft_limit_margin_deg: 0.0,
        }
    }
}
