//! The washout filter pipeline: angular high-pass, tilt-coordination and
//! positional high-pass channels, sequenced by [`Mda::step`].

use mcis_common::filters::{BiquadChain, RateLimiter, Saturation};
use mcis_common::matrix::body_to_inertial;
use mcis_common::Vector3;

use crate::config::MdaConfig;

/// Angular high-pass channel (spec 4.3): rotates the scaled body rate into
/// the inertial frame using its own last output, then runs each axis
/// through saturation and a single biquad section (which embeds the
/// integrator — the configured filter is the discretised product of the
/// continuous transfer function and 1/s).
pub struct AngularHpChannel {
    roll_sat: Saturation,
    pitch_sat: Saturation,
    yaw_sat: Saturation,
    roll_filt: BiquadChain,
    pitch_filt: BiquadChain,
    yaw_filt: BiquadChain,
    last_output: Vector3,
}

impl AngularHpChannel {
    pub fn new(config: &MdaConfig) -> Self {
        AngularHpChannel {
            roll_sat: Saturation::new(config.lim_pqr.x),
            pitch_sat: Saturation::new(config.lim_pqr.y),
            yaw_sat: Saturation::new(config.lim_pqr.z),
            roll_filt: config.p_hp.to_biquad_chain(),
            pitch_filt: config.q_hp.to_biquad_chain(),
            yaw_filt: config.r_hp.to_biquad_chain(),
            last_output: Vector3::ZERO,
        }
    }

    pub fn next_sample(&mut self, omega_scaled: Vector3) -> Vector3 {
        let mut rotated = omega_scaled;
        body_to_inertial(&mut rotated, self.last_output);

        let roll = self.roll_filt.advance(self.roll_sat.advance(rotated.x));
        let pitch = self.pitch_filt.advance(self.pitch_sat.advance(rotated.y));
        let yaw = self.yaw_filt.advance(self.yaw_sat.advance(rotated.z));

        self.last_output = Vector3::new(roll, pitch, yaw);
        self.last_output
    }
}

/// Tilt-coordination channel (spec 4.4): rotates the scaled specific force
/// using the angular channel's current attitude, discards heave, and
/// converts sustained lateral/longitudinal force into a rate-limited
/// roll/pitch correction, noting the axis swap — Y force drives roll, X
/// force drives pitch.
pub struct TiltCoordinationChannel {
    x_sat: Saturation,
    y_sat: Saturation,
    x_filt: BiquadChain,
    y_filt: BiquadChain,
    x_gain: f64,
    y_gain: f64,
    x_ratelim: RateLimiter,
    y_ratelim: RateLimiter,
}

impl TiltCoordinationChannel {
    pub fn new(config: &MdaConfig) -> Self {
        let per_sample_x = config.ratelim_tc_x / config.sample_rate as f64;
        let per_sample_y = config.ratelim_tc_y / config.sample_rate as f64;
        TiltCoordinationChannel {
            x_sat: Saturation::new(config.lim_tc_x),
            y_sat: Saturation::new(config.lim_tc_y),
            x_filt: config.sf_lp_x.to_biquad_chain(),
            y_filt: config.sf_lp_y.to_biquad_chain(),
            x_gain: config.k_tc_x,
            y_gain: config.k_tc_y,
            x_ratelim: RateLimiter::new(per_sample_x),
            y_ratelim: RateLimiter::new(per_sample_y),
        }
    }

    /// `mb_att` is the angular channel's current inertial attitude. Returns
    /// the final attitude command, `mb_att + (delta_roll, delta_pitch, 0)`.
    pub fn next_sample(&mut self, sf_scaled: Vector3, mb_att: Vector3) -> Vector3 {
        let mut rotated = sf_scaled;
        body_to_inertial(&mut rotated, mb_att);

        let x = self.x_sat.advance(rotated.x) * self.x_gain;
        let y = self.y_sat.advance(rotated.y) * self.y_gain;

        let x_limited = self.x_ratelim.advance(self.x_filt.advance(x));
        let y_limited = self.y_ratelim.advance(self.y_filt.advance(y));

        // Y acceleration contributes to roll, X acceleration to pitch.
        mb_att + Vector3::new(y_limited, x_limited, 0.0)
    }
}

/// Positional high-pass channel (spec 4.5): rotates the scaled specific
/// force using the final attitude command, optionally subtracts gravity
/// from heave, and chains two biquad sections per axis (the configured
/// length for these three filters).
pub struct PositionalHpChannel {
    x_sat: Saturation,
    y_sat: Saturation,
    z_sat: Saturation,
    x_filt: BiquadChain,
    y_filt: BiquadChain,
    z_filt: BiquadChain,
    z_grav_sub: f64,
}

impl PositionalHpChannel {
    pub fn new(config: &MdaConfig) -> Self {
        PositionalHpChannel {
            x_sat: Saturation::new(config.lim_sf.x),
            y_sat: Saturation::new(config.lim_sf.y),
            z_sat: Saturation::new(config.lim_sf.z),
            x_filt: config.sf_hp_x.to_biquad_chain(),
            y_filt: config.sf_hp_y.to_biquad_chain(),
            z_filt: config.sf_hp_z.to_biquad_chain(),
            z_grav_sub: mcis_common::consts::GRAVITY * config.k_sf.z,
        }
    }

    pub fn next_sample(&mut self, sf_scaled: Vector3, att_out: Vector3, subtract_gravity: bool) -> Vector3 {
        let mut rotated = sf_scaled;
        body_to_inertial(&mut rotated, att_out);

        if subtract_gravity {
            rotated.z -= self.z_grav_sub;
        }

        let x = self.x_filt.advance(self.x_sat.advance(rotated.x));
        let y = self.y_filt.advance(self.y_sat.advance(rotated.y));
        let z = self.z_filt.advance(self.z_sat.advance(rotated.z));

        Vector3::new(x, y, z)
    }
}

/// The output of one MDA step: the derived position command, the final
/// attitude command, and the pre-tilt-coordination attitude (kept for
/// diagnostics only).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MdaOutput {
    pub pos: Vector3,
    pub attitude: Vector3,
    pub attitude_no_tc: Vector3,
}

/// Orchestrates the three channels per [`MdaConfig`]. `attitude_body`
/// (the simulator's own reported Euler angles) is accepted for logging
/// only — none of the three channels consume it.
pub struct Mda {
    angular: AngularHpChannel,
    tilt: TiltCoordinationChannel,
    positional: PositionalHpChannel,
    k_sf: Vector3,
    k_pqr: Vector3,
    subtract_gravity: bool,
}

impl Mda {
    pub fn new(config: &MdaConfig, subtract_gravity: bool) -> Self {
        Mda {
            angular: AngularHpChannel::new(config),
            tilt: TiltCoordinationChannel::new(config),
            positional: PositionalHpChannel::new(config),
            k_sf: config.k_sf,
            k_pqr: config.k_pqr,
            subtract_gravity,
        }
    }

    pub fn step(&mut self, sf_body: Vector3, omega_body: Vector3, _attitude_body: Vector3) -> MdaOutput {
        let sf_scaled = sf_body.scale_axes(self.k_sf.x, self.k_sf.y, self.k_sf.z);
        let omega_scaled = omega_body.scale_axes(self.k_pqr.x, self.k_pqr.y, self.k_pqr.z);

        let attitude_no_tc = self.angular.next_sample(omega_scaled);
        let attitude = self.tilt.next_sample(sf_scaled, attitude_no_tc);
        let pos = self.positional.next_sample(sf_scaled, attitude, self.subtract_gravity);

        MdaOutput { pos, attitude, attitude_no_tc }
    }
}

/// Envelope clamp (spec 4.7): adds the platform's fixed Z offset, then
/// clamps each axis independently to its configured half-interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub pos_low: Vector3,
    pub pos_high: Vector3,
    pub rot_low: Vector3,
    pub rot_high: Vector3,
    pub z_offset: f64,
}

impl Envelope {
    pub fn clamp(&self, pos: Vector3, rot: Vector3) -> (Vector3, Vector3) {
        let pos = Vector3::new(pos.x, pos.y, pos.z + self.z_offset);
        let clamped_pos = Vector3::new(
            pos.x.clamp(self.pos_low.x, self.pos_high.x),
            pos.y.clamp(self.pos_low.y, self.pos_high.y),
            pos.z.clamp(self.pos_low.z, self.pos_high.z),
        );
        let clamped_rot = Vector3::new(
            rot.x.clamp(self.rot_low.x, self.rot_high.x),
            rot.y.clamp(self.rot_low.y, self.rot_high.y),
            rot.z.clamp(self.rot_low.z, self.rot_high.z),
        );
        (clamped_pos, clamped_rot)
    }
}
