//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use crate::data_store::{DataStore, SafeModeCause};
use comms_if::tc::Tc;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub fn exec(ds: &mut DataStore, tc: &Tc) {
    // Handle different Tcs
    match tc {
        Tc::Heartbeat => {
            debug!("Recieved Heartbeat");
        }
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        }
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            ds.make_unsafe(SafeModeCause::MakeSafeTc).ok();
        }
        Tc::Retarget(cmd) => ds.retarget_mgr_input.cmd = Some(cmd.clone()),
    }
}
