//! Implementations for the JointChannel structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{ChannelConfig, SourceBinding};
use comms_if::eqpt::drive::{JointDem, JointId};
use util::maths::{ang_delta_deg, clamp, clamp01, lerp, wrap_deg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One controllable robot joint and its retargeting pipeline state.
///
/// The channel is created at module initialisation (one per physical joint)
/// and mutated every control cycle by [`JointChannel::apply`] or
/// [`JointChannel::set_target_direct`].
pub struct JointChannel {
    /// The drive this channel commands.
    id: JointId,

    /// Minimum commanded angle.
    ///
    /// Units: degrees
    min_deg: f64,

    /// Maximum commanded angle.
    ///
    /// Units: degrees
    max_deg: f64,

    /// Position gain passed through to the drive unmodified.
    stiffness: f64,

    /// Velocity gain passed through to the drive unmodified.
    damping: f64,

    /// Force limit passed through to the drive unmodified.
    force_limit: f64,

    /// Mapping parameters. `config.offset_deg` is rewritten by calibration.
    config: ChannelConfig,

    /// Source binding, or `None` if this channel has no tracked source.
    binding: Option<SourceBinding>,

    /// Calibration neutral reading, captured wrapped into (-180, 180].
    ///
    /// Units: degrees
    neutral_deg: Option<f64>,

    /// One-pole low-pass filter state.
    ///
    /// Units: degrees
    filtered_deg: f64,

    /// The angle commanded on the previous cycle.
    ///
    /// Units: degrees
    last_cmd_deg: f64,

    /// Dead-zone hold latch. While engaged the mapped value is clamped to
    /// the dead-zone centre until it exceeds the zone plus hysteresis.
    in_dead_hold: bool,

    /// When true the channel ignores its source and commands
    /// `locked_target_deg` until unlocked.
    locked: bool,

    /// The angle commanded while locked.
    ///
    /// Units: degrees
    locked_target_deg: f64,
}

/// Flags raised by one run of the channel pipeline, used to populate the
/// owning module's status report.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct ChannelFlags {
    /// The dead-zone hold latch was engaged at the end of the run.
    pub dead_hold: bool,

    /// The target was pulled back by soft-limit shaping.
    pub soft_limited: bool,

    /// The per-cycle change was cut by the rate limiter.
    pub rate_limited: bool,

    /// The target hit a hard angle bound.
    pub abs_pos_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointChannel {
    /// Create a new channel for the given drive.
    pub fn new(
        id: JointId,
        min_deg: f64,
        max_deg: f64,
        stiffness: f64,
        damping: f64,
        force_limit: f64,
        config: ChannelConfig,
        binding: Option<SourceBinding>,
    ) -> Self {
        JointChannel {
            id,
            min_deg,
            max_deg,
            stiffness,
            damping,
            force_limit,
            config,
            binding,
            neutral_deg: None,
            filtered_deg: 0.0,
            last_cmd_deg: 0.0,
            in_dead_hold: false,
            locked: false,
            locked_target_deg: 0.0,
        }
    }

    /// Run the retargeting pipeline on a raw source angle, returning the
    /// commanded angle for this cycle.
    ///
    /// The pipeline is skipped entirely while the channel is locked, in
    /// which case the locked target is returned and the filter state is
    /// pulled to it so that it cannot go stale under the lock.
    pub fn apply(&mut self, raw_deg: f64, dt_s: f64) -> (f64, ChannelFlags) {
        let mut flags = ChannelFlags::default();

        if self.locked {
            self.filtered_deg = self.locked_target_deg;
            self.last_cmd_deg = self.locked_target_deg;
            return (self.locked_target_deg, flags);
        }

        // 1. Mapping. The raw reading is wrapped to (-180, 180], taken
        //    relative to the calibration neutral if one has been captured.
        let mut raw = wrap_deg(raw_deg);
        if let Some(neutral) = self.neutral_deg {
            raw = ang_delta_deg(raw, neutral);
        }
        let mut mapped = self.config.offset_deg + self.config.scale * raw;

        // 2. Dead zone with hysteresis. Once the hold latch engages, only a
        //    magnitude beyond zone + hysteresis releases it, so a signal
        //    hovering at the zone edge cannot chatter.
        let deviation = mapped - self.config.dead_center_deg;
        if self.in_dead_hold {
            if deviation.abs() > self.config.dead_zone_deg + self.config.dead_hysteresis_deg {
                self.in_dead_hold = false;
            } else {
                mapped = self.config.dead_center_deg;
            }
        } else if deviation.abs() < self.config.dead_zone_deg {
            self.in_dead_hold = true;
            mapped = self.config.dead_center_deg;
        }
        flags.dead_hold = self.in_dead_hold;

        // 3. Exponential smoothing (one-pole low-pass).
        self.filtered_deg = lerp(
            self.filtered_deg,
            mapped,
            clamp01(self.config.smooth_alpha),
        );

        // 4. Hard clamp.
        let mut target = clamp(&self.filtered_deg, &self.min_deg, &self.max_deg);
        if target != self.filtered_deg {
            flags.abs_pos_limited = true;
        }

        // 5. Soft-limit shaping. Within the margin of either bound the
        //    target is blended toward the margin boundary so the joint
        //    decelerates on approach instead of slamming into the limit.
        if self.config.soft_limit_margin_deg > 0.0 {
            let margin = self.config.soft_limit_margin_deg;
            let upper = self.max_deg - margin;
            let lower = self.min_deg + margin;

            if target > upper {
                let t = clamp01((target - upper) / margin);
                target = lerp(target, upper, t);
                flags.soft_limited = true;
            } else if target < lower {
                let t = clamp01((lower - target) / margin);
                target = lerp(target, lower, t);
                flags.soft_limited = true;
            }
        }

        // 6. Rate limiting, relative to the previously commanded angle.
        if self.config.rate_limit_degs > 0.0 && dt_s > 0.0 {
            let max_step = self.config.rate_limit_degs * dt_s;
            let step = target - self.last_cmd_deg;

            if step.abs() > max_step {
                target = self.last_cmd_deg + max_step.copysign(step);
                flags.rate_limited = true;
            }
        }

        // 7. Commit.
        self.last_cmd_deg = target;

        (target, flags)
    }

    /// Set the commanded angle directly, bypassing the filtering pipeline.
    ///
    /// The hard clamp still applies, and the filter state is pulled to the
    /// commanded angle so that a later return to pipeline control does not
    /// slew from a stale value. A locked channel commands its locked target
    /// instead of the requested one.
    pub fn set_target_direct(&mut self, target_deg: f64) -> f64 {
        let requested = if self.locked {
            self.locked_target_deg
        } else {
            target_deg
        };

        let target = clamp(&requested, &self.min_deg, &self.max_deg);

        self.filtered_deg = target;
        self.last_cmd_deg = target;

        target
    }

    /// Capture the given raw reading as the new calibration neutral.
    ///
    /// All subsequent raw readings become shortest-path deltas from this
    /// value.
    pub fn capture_neutral(&mut self, raw_deg: f64) {
        self.neutral_deg = Some(wrap_deg(raw_deg));
    }

    /// Rewrite the mapping offset.
    ///
    /// Units: degrees
    pub fn set_offset_deg(&mut self, offset_deg: f64) {
        self.config.offset_deg = offset_deg;
    }

    /// Lock the channel at the given target.
    ///
    /// The target is clamped to the channel's limits and the filter state is
    /// pulled to it, forcing an instantaneous deterministic snap rather than
    /// a slow slew through the smoothing and rate-limit stages.
    pub fn lock_at(&mut self, target_deg: f64) {
        let target = clamp(&target_deg, &self.min_deg, &self.max_deg);

        self.locked = true;
        self.locked_target_deg = target;
        self.filtered_deg = target;
        self.last_cmd_deg = target;
    }

    /// Release the lock, returning control to the active mode's pipeline.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Build the drive demand for a commanded angle, carrying the channel's
    /// drive gains through unmodified.
    pub fn demand(&self, target_deg: f64) -> JointDem {
        JointDem {
            target_deg,
            stiffness: self.stiffness,
            damping: self.damping,
            force_limit: self.force_limit,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn binding(&self) -> Option<&SourceBinding> {
        self.binding.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn last_cmd_deg(&self) -> f64 {
        self.last_cmd_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// A channel with wide limits and an all-passthrough config.
    fn passthrough_channel() -> JointChannel {
        JointChannel::new(
            JointId::LShoulderPitch,
            -175.0,
            175.0,
            100.0,
            10.0,
            50.0,
            ChannelConfig::default(),
            None,
        )
    }

    fn dead_zone_channel() -> JointChannel {
        let config = ChannelConfig {
            dead_zone_deg: 2.0,
            dead_hysteresis_deg: 1.5,
            ..ChannelConfig::default()
        };

        JointChannel::new(
            JointId::LShoulderPitch,
            -175.0,
            175.0,
            100.0,
            10.0,
            50.0,
            config,
            None,
        )
    }

    #[test]
    fn test_dead_zone_latch() {
        let mut ch = dead_zone_channel();

        // Outside the zone on a fresh channel the input passes through
        assert_eq!(ch.apply(2.5, 0.02).0, 2.5);

        // Entering the zone engages the hold latch and clamps to centre
        assert_eq!(ch.apply(1.5, 0.02).0, 0.0);
        assert!(ch.apply(1.5, 0.02).1.dead_hold);

        // While held, values inside zone + hysteresis stay clamped even
        // though they are outside the zone itself
        assert_eq!(ch.apply(2.5, 0.02).0, 0.0);
        assert_eq!(ch.apply(3.4, 0.02).0, 0.0);

        // Only a value beyond zone + hysteresis releases the latch
        assert_eq!(ch.apply(3.6, 0.02).0, 3.6);
        assert!(!ch.apply(3.6, 0.02).1.dead_hold);
    }

    #[test]
    fn test_dead_zone_no_chatter() {
        let mut ch = dead_zone_channel();

        // Engage the latch
        ch.apply(0.5, 0.02);

        // An input oscillating about the zone edge must not toggle the
        // commanded angle while the latch is engaged
        for _ in 0..50 {
            assert_eq!(ch.apply(2.1, 0.02).0, 0.0);
            assert_eq!(ch.apply(1.9, 0.02).0, 0.0);
        }
    }

    #[test]
    fn test_rate_limit() {
        let mut ch = passthrough_channel();
        ch.config.rate_limit_degs = 10.0;

        // A 50 degree step with a 1 deg/cycle budget moves exactly 1 degree
        let (cmd, flags) = ch.apply(50.0, 0.1);
        assert_eq!(cmd, 1.0);
        assert!(flags.rate_limited);

        // And accumulates cycle on cycle
        assert_eq!(ch.apply(50.0, 0.1).0, 2.0);

        // Steps inside the budget are untouched
        let (cmd, flags) = ch.apply(2.5, 0.1);
        assert_eq!(cmd, 2.5);
        assert!(!flags.rate_limited);
    }

    #[test]
    fn test_hard_clamp() {
        let mut ch = passthrough_channel();

        // wrap_deg folds 1000 to -80, inside limits
        assert_eq!(ch.apply(1000.0, 0.02).0, -80.0);

        let (cmd, flags) = ch.apply(179.0, 0.02);
        assert_eq!(cmd, 175.0);
        assert!(flags.abs_pos_limited);

        let (cmd, flags) = ch.apply(-179.0, 0.02);
        assert_eq!(cmd, -175.0);
        assert!(flags.abs_pos_limited);
    }

    #[test]
    fn test_soft_limit_shaping() {
        let mut ch = JointChannel::new(
            JointId::LElbowPitch,
            -90.0,
            90.0,
            100.0,
            10.0,
            50.0,
            ChannelConfig {
                soft_limit_margin_deg: 10.0,
                ..ChannelConfig::default()
            },
            None,
        );

        // Below the margin the target is untouched
        assert_eq!(ch.apply(75.0, 0.02).0, 75.0);

        // Half way into the margin the target is pulled half way back to
        // the margin boundary
        let (cmd, flags) = ch.apply(85.0, 0.02);
        assert_eq!(cmd, 82.5);
        assert!(flags.soft_limited);

        // At the hard bound the target lands on the margin boundary
        assert_eq!(ch.apply(90.0, 0.02).0, 80.0);
    }

    #[test]
    fn test_lock_override() {
        let mut ch = passthrough_channel();

        ch.apply(30.0, 0.02);
        ch.lock_at(45.0);

        // Raw input is ignored while locked and the filter state is pulled
        // to the locked target, not left stale
        assert_eq!(ch.apply(-120.0, 0.02).0, 45.0);
        assert_eq!(ch.filtered_deg, 45.0);
        assert_eq!(ch.last_cmd_deg, 45.0);

        // Direct sets are overridden too
        assert_eq!(ch.set_target_direct(10.0), 45.0);

        // After unlock the pipeline resumes from the locked value
        ch.unlock();
        assert_eq!(ch.apply(50.0, 0.02).0, 50.0);
    }

    #[test]
    fn test_neutral_relative_mapping() {
        let mut ch = passthrough_channel();

        // Neutral near the wrap boundary: a reading on the other side of
        // the boundary must map through the shortest path
        ch.capture_neutral(170.0);
        assert_eq!(ch.apply(-170.0, 0.02).0, 20.0);
        assert_eq!(ch.apply(150.0, 0.02).0, -20.0);
    }

    #[test]
    fn test_smoothing() {
        let mut ch = passthrough_channel();
        ch.config.smooth_alpha = 0.5;

        // Filter starts at zero, each cycle halves the distance to input
        assert_eq!(ch.apply(10.0, 0.02).0, 5.0);
        assert_eq!(ch.apply(10.0, 0.02).0, 7.5);
        assert_eq!(ch.apply(10.0, 0.02).0, 8.75);
    }

    #[test]
    fn test_set_target_direct_clamps() {
        let mut ch = passthrough_channel();

        assert_eq!(ch.set_target_direct(200.0), 175.0);
        assert_eq!(ch.last_cmd_deg(), 175.0);
        assert_eq!(ch.set_target_direct(-30.0), -30.0);
    }
}
