//! Main teleoperation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Pose input acquisition from the replay source
//!         - Telecommand processing and handling
//!         - Retargeting manager processing
//!         - Drive demand output and archiving
//!
//! # Modules
//!
//! All modules (e.g. `retarget_mgr`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use teleop_lib::{
    data_store::{DataStore, SafeModeCause},
    pose_replay::{PendingPose, PoseReplay},
    tc_processor, CYCLE_FREQUENCY_HZ, CYCLE_PERIOD_S,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit of the number of consecutive cycles without a pose sample before
/// safe mode will be engaged.
const MAX_POSE_DROPOUT_LIMIT: u64 = 50;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Flat per-cycle record written into the cycle archive.
#[derive(Serialize)]
struct CycleRecord {
    time_s: f64,
    num_cycles: u64,
    mode: String,
    safe: bool,
    left_ik_residual_m: f64,
    right_ik_residual_m: f64,
    left_ik_converged: bool,
    right_ik_converged: bool,
    num_demands: usize,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("teleop_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("OpenArm Teleoperation Executable\n");
    info!("Running on: {}", host::get_platform_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE INPUT SOURCES ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // First argument is the pose trajectory, optional second argument is a
    // TC script
    let (mut pose_replay, mut tc_source) = match args.len() {
        2 => (
            PoseReplay::new(&args[1]).wrap_err("Failed to load pose trajectory")?,
            TcSource::None,
        ),
        3 => {
            let replay =
                PoseReplay::new(&args[1]).wrap_err("Failed to load pose trajectory")?;

            info!("Loading TC script from \"{}\"", &args[2]);

            let si = ScriptInterpreter::new(&args[2]).wrap_err("Failed to load script")?;

            // Display some info
            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            (replay, TcSource::Script(si))
        }
        _ => {
            return Err(eyre!(
                "Expected one or two arguments (pose trajectory path and optional TC script \
                path), found {}",
                args.len() - 1
            ))
        }
    };

    info!(
        "Pose trajectory lasts {:.02} s and contains {} samples\n",
        pose_replay.get_duration(),
        pose_replay.get_num_samples()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.retarget_mgr
        .init("retarget_mgr.toml", &session)
        .wrap_err("Failed to initialise RetargetMgr")?;
    info!("RetargetMgr init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE ARCHIVES ----

    let mut cycle_archiver = match Archiver::from_path(&session, "cycle_records.csv") {
        Ok(a) => a,
        Err(e) => return Err(eyre!("Failed to initialise the cycle archiver: {}", e)),
    };

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        match pose_replay.get_pending_pose() {
            PendingPose::Some(pose) => {
                ds.retarget_mgr_input.pose = Some(pose);
                ds.num_consec_pose_dropouts = 0;
                ds.make_unsafe(SafeModeCause::PoseSourceLost).ok();
            }
            PendingPose::None => {
                ds.num_consec_pose_dropouts += 1;

                // A short dropout just holds the arms; a long one is a lost
                // source and the exec goes safe
                if ds.num_consec_pose_dropouts > MAX_POSE_DROPOUT_LIMIT {
                    ds.make_safe(SafeModeCause::PoseSourceLost);
                }
            }
            // Exit when the trajectory is exhausted
            PendingPose::EndOfTrajectory => {
                info!("End of pose trajectory reached, stopping");
                break;
            }
        }

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            TcSource::None => (),
            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                // Keep running without a script once it's exhausted
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached");
                    tc_source = TcSource::None;
                }
            },
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // RetargetMgr processing
        ds.retarget_mgr_input.time_s = ds.cycle_time_s;
        ds.retarget_mgr_input.dt_s = CYCLE_PERIOD_S;

        match ds.retarget_mgr.proc(&ds.retarget_mgr_input) {
            Ok((output, report)) => {
                ds.retarget_mgr_output = output;
                ds.retarget_mgr_status_rpt = report;
            }
            Err(e) => {
                // RetargetMgr errors usually just mean you sent the wrong
                // TC, so just issue the warning and continue.
                warn!("Error during RetargetMgr processing: {}", e)
            }
        };

        // ---- WRITE ARCHIVES ----

        let record = CycleRecord {
            time_s: ds.cycle_time_s,
            num_cycles: ds.num_cycles as u64,
            mode: format!("{:?}", ds.retarget_mgr_status_rpt.mode),
            safe: ds.safe,
            left_ik_residual_m: ds.retarget_mgr_status_rpt.ik_residual_m[0],
            right_ik_residual_m: ds.retarget_mgr_status_rpt.ik_residual_m[1],
            left_ik_converged: ds.retarget_mgr_status_rpt.ik_converged[0],
            right_ik_converged: ds.retarget_mgr_status_rpt.ik_converged[1],
            num_demands: ds.retarget_mgr_output.joints.len(),
        };

        match cycle_archiver.serialise(record) {
            Ok(_) => (),
            Err(e) => warn!("Could not archive cycle record: {}", e),
        }

        // ---- TELEMETRY ----

        // Save full status snapshots on the 1Hz
        if ds.is_1_hz_cycle {
            session::save(
                "tm/retarget_status.json",
                ds.retarget_mgr_status_rpt.clone(),
            );
            session::save("tm/drive_dems.json", ds.retarget_mgr_output.clone());
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > 500 {
                    raise_error!("More than 500 consecutive cycle overruns!");
                }
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    None,
    Script(ScriptInterpreter),
}
