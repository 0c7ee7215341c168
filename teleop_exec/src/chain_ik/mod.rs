//! Kinematic chain model and inverse kinematics
//!
//! This module owns a cached kinematic model of one serial revolute chain:
//! per-joint link offsets and rotation axes imported once from the physical
//! layout. Forward kinematics is pure arithmetic over the cached geometry
//! and an angle vector, with no dependency on any live scene state, which is
//! what makes the cyclic coordinate descent solver tractable and testable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod chain;
mod params;
mod solve;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use chain::*;
pub use params::*;
pub use solve::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building a chain model.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(
        "Mismatched geometry lengths: {num_joints} joint positions but \
        {num_axes} axes, {num_min} minimum and {num_max} maximum limits"
    )]
    MismatchedGeomLengths {
        num_joints: usize,
        num_axes: usize,
        num_min: usize,
        num_max: usize,
    },

    #[error("Joint {0} has a zero-length rotation axis")]
    ZeroLengthAxis(usize),

    #[error("The chain has no joints")]
    EmptyChain,
}
