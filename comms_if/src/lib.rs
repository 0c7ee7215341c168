//! # Communications interface crate.
//!
//! Provides all common boundary types for the software: telecommands coming
//! into the exec and the equipment-facing types (tracked operator pose
//! samples and joint drive demands) exchanged with collaborators.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and data definitions for equipment (drives and pose tracking)
pub mod eqpt;
