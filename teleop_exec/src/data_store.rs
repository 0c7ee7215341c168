//! # Data Store

use comms_if::eqpt::drive::DriveDems;
use log::{info, warn};

use crate::retarget_mgr;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the exec has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    PoseSourceLost,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub cycle_time_s: f64,

    // Safe mode variables
    /// Determines if the exec is in safe mode.
    pub safe: bool,

    /// Gives the reason for the exec being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // RetargetMgr
    pub retarget_mgr: retarget_mgr::RetargetMgr,
    pub retarget_mgr_input: retarget_mgr::InputData,
    pub retarget_mgr_output: DriveDems,
    pub retarget_mgr_status_rpt: retarget_mgr::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive cycles without a pose sample
    pub num_consec_pose_dropouts: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the exec into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Make retarget_mgr safe
            self.retarget_mgr.make_safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.retarget_mgr_input = retarget_mgr::InputData::default();
        self.retarget_mgr_output = DriveDems::default();
        self.retarget_mgr_status_rpt = retarget_mgr::StatusReport::default();

        self.cycle_time_s = util::session::get_elapsed_seconds();
    }
}
