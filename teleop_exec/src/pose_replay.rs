//! # Pose replay source
//!
//! Provides tracked operator pose samples from a recorded trajectory file,
//! standing in for the live tracking transport. Trajectories are JSON
//! arrays of timestamped samples:
//!
//! ```json
//! [
//!     {"time_s": 0.0, "pose": {"orientations": {}, "anchors": {}}},
//!     {"time_s": 0.02, "pose": {"orientations": {}, "anchors": {}}}
//! ]
//! ```
//!
//! Each cycle the replay yields the newest sample whose timestamp has
//! passed, discarding any older ones, so replay keeps pace with the session
//! clock even if cycles overrun.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use comms_if::eqpt::pose::TrackedPose;
use util::session::get_elapsed_seconds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pose sample scheduled at a specific time.
#[derive(Deserialize)]
struct TimedPose {
    /// The session-elapsed time at which this sample becomes current
    time_s: f64,

    /// The sample itself
    pose: TrackedPose,
}

/// A replayable pose trajectory.
pub struct PoseReplay {
    _trajectory_path: PathBuf,
    samples: VecDeque<TimedPose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PoseReplayError {
    #[error("Could not find the trajectory at {0}")]
    TrajectoryNotFound(String),

    #[error("Could not load the trajectory: {0}")]
    TrajectoryLoadError(std::io::Error),

    #[error("Could not parse the trajectory: {0}")]
    TrajectoryParseError(serde_json::Error),

    #[error("The trajectory contains no samples")]
    TrajectoryEmpty,
}

pub enum PendingPose {
    None,
    Some(TrackedPose),
    EndOfTrajectory,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseReplay {
    /// Create a new replay source from the given trajectory path.
    pub fn new<P: AsRef<Path>>(trajectory_path: P) -> Result<Self, PoseReplayError> {
        let path = PathBuf::from(trajectory_path.as_ref());

        if !path.exists() {
            return Err(PoseReplayError::TrajectoryNotFound(
                path.to_str().unwrap().to_string(),
            ));
        }

        let trajectory = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(PoseReplayError::TrajectoryLoadError(e)),
        };

        let samples: Vec<TimedPose> = match serde_json::from_str(&trajectory) {
            Ok(s) => s,
            Err(e) => return Err(PoseReplayError::TrajectoryParseError(e)),
        };

        if samples.is_empty() {
            return Err(PoseReplayError::TrajectoryEmpty);
        }

        Ok(PoseReplay {
            _trajectory_path: path,
            samples: samples.into(),
        })
    }

    /// Return the newest sample whose timestamp has passed, or `None` if no
    /// new sample is due yet.
    pub fn get_pending_pose(&mut self) -> PendingPose {
        if self.samples.is_empty() {
            return PendingPose::EndOfTrajectory;
        }

        let current_time_s = get_elapsed_seconds();

        let mut latest: Option<TrackedPose> = None;

        // Pop samples until the head is in the future, keeping only the
        // newest due sample
        while !self.samples.is_empty() && self.samples.front().unwrap().time_s < current_time_s {
            latest = Some(self.samples.pop_front().unwrap().pose);
        }

        match latest {
            Some(pose) => PendingPose::Some(pose),
            None => PendingPose::None,
        }
    }

    /// Get the number of samples remaining in the trajectory
    pub fn get_num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Get the length of the trajectory in seconds
    pub fn get_duration(&self) -> f64 {
        match self.samples.back() {
            Some(s) => s.time_s,
            None => 0f64,
        }
    }
}
