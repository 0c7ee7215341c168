//! Per-joint retargeting pipeline
//!
//! Each controllable joint owns a [`JointChannel`] which maps a raw source
//! angle (the relevant component of a tracked orientation, in degrees) onto
//! a safe drive target once per control cycle. The pipeline applies, in
//! order: calibration mapping, dead-zone with hysteresis, exponential
//! smoothing, hard clamping, soft-limit shaping and rate limiting.
//!
//! Channels degrade gracefully: a missing source reading is a no-op for
//! that channel on that cycle and never halts the rest of the arm.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod channel;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use channel::*;
pub use params::*;
