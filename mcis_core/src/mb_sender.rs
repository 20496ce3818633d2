//! MB command sender: the 120Hz pace-making send-loop. Owns the MDA, the
//! session FSM, the vector rate limiters used during `RateLimited`, and
//! the MDA log sink. Issues a wire command to the MB every second tick.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mcis_common::consts::{
    DEFAULT_MB_OFFSET_Z, DEFAULT_MB_POS_HIGH, DEFAULT_MB_POS_LOW, DEFAULT_MB_ROT_HIGH,
    DEFAULT_MB_ROT_LOW, DEFAULT_POS_RATE_LIMIT, DEFAULT_ROT_RATE_LIMIT, SEND_LOOP_HZ,
    TICKS_PER_COMMAND,
};
use mcis_common::filters::RateLimiter;
use mcis_common::wire::DofCommand;
use mcis_common::Vector3;

use crate::config::MdaConfig;
use crate::error::SocketError;
use crate::ingest::LatestTelemetry;
use crate::log::{LogRow, MdaLog};
use crate::mda::{Envelope, Mda};
use crate::rt;
use crate::session::{Fault2Policy, MbReplyState, Session, SessionStatus, UserIntents};

/// Vector rate limiter: three scalar limiters sharing one delta.
struct VectorRateLimiter {
    x: RateLimiter,
    y: RateLimiter,
    z: RateLimiter,
}

impl VectorRateLimiter {
    fn new(delta: f64) -> Self {
        VectorRateLimiter { x: RateLimiter::new(delta), y: RateLimiter::new(delta), z: RateLimiter::new(delta) }
    }

    fn advance(&mut self, v: Vector3) -> Vector3 {
        Vector3::new(self.x.advance(v.x), self.y.advance(v.y), self.z.advance(v.z))
    }

    fn override_output(&mut self, v: Vector3) {
        self.x.override_output(v.x);
        self.y.override_output(v.y);
        self.z.override_output(v.z);
    }
}

impl Envelope {
    /// The envelope this deployment ships with. Position/rotation bounds
    /// and the Z offset are never defined anywhere in the retained source
    /// pack despite being referenced throughout the original MB interface;
    /// these are the documented, physically-reasonable defaults chosen to
    /// fill that gap.
    pub fn default_for_platform() -> Self {
        Envelope {
            pos_low: Vector3::new(DEFAULT_MB_POS_LOW.0, DEFAULT_MB_POS_LOW.1, DEFAULT_MB_POS_LOW.2),
            pos_high: Vector3::new(DEFAULT_MB_POS_HIGH.0, DEFAULT_MB_POS_HIGH.1, DEFAULT_MB_POS_HIGH.2),
            rot_low: Vector3::new(DEFAULT_MB_ROT_LOW.0, DEFAULT_MB_ROT_LOW.1, DEFAULT_MB_ROT_LOW.2),
            rot_high: Vector3::new(DEFAULT_MB_ROT_HIGH.0, DEFAULT_MB_ROT_HIGH.1, DEFAULT_MB_ROT_HIGH.2),
            z_offset: DEFAULT_MB_OFFSET_Z,
        }
    }
}

/// Configuration for one run of the send-loop, independent of the MDA
/// parameter record.
pub struct SenderConfig {
    pub subtract_gravity: bool,
    pub fault2_policy: Fault2Policy,
    pub rt_cpu: usize,
    pub rt_priority: i32,
}

/// Runs the send-loop until `continue_operation` is cleared. Intended to be
/// the body of the dedicated MB send-loop thread; blocking calls are
/// limited to the absolute-deadline sleep, the UDP `sendto` and one mutex
/// acquisition per tick on `telemetry`.
pub fn run(
    socket: &UdpSocket,
    mda_config: &MdaConfig,
    sender_config: &SenderConfig,
    telemetry: Arc<LatestTelemetry>,
    intents: Arc<UserIntents>,
    reply_state: Arc<MbReplyState>,
    mut log: MdaLog<std::fs::File>,
    continue_operation: Arc<AtomicBool>,
) {
    if let Err(e) = rt::rt_setup(sender_config.rt_cpu, sender_config.rt_priority) {
        tracing::warn!(error = %e, "RT setup failed, continuing on default scheduling");
    }

    let envelope = Envelope::default_for_platform();
    let neutral_pos = Vector3::new(0.0, 0.0, envelope.z_offset);

    let mut mda = Mda::new(mda_config, sender_config.subtract_gravity);
    let mut session = Session::new(sender_config.fault2_policy, neutral_pos);
    let mut pos_ratelimit = VectorRateLimiter::new(DEFAULT_POS_RATE_LIMIT);
    let mut rot_ratelimit = VectorRateLimiter::new(DEFAULT_ROT_RATE_LIMIT);

    let period_ns = (1_000_000_000 / SEND_LOOP_HZ) as i64;
    let mut deadline = rt::monotonic_now();
    let mut tick_count: u64 = 0;

    let mut last_pos = neutral_pos;
    let mut last_rot = Vector3::ZERO;

    while continue_operation.load(Ordering::Acquire) {
        let snapshot = telemetry.get_latest();
        let mda_out = mda.step(snapshot.specific_force, snapshot.angular_rate, snapshot.attitude);
        let (clamped_pos, clamped_rot) = envelope.clamp(mda_out.pos, mda_out.attitude);

        if session.entered(SessionStatus::RateLimited) {
            pos_ratelimit.override_output(last_pos);
            rot_ratelimit.override_output(last_rot);
        }
        let rate_limited_pose = (pos_ratelimit.advance(clamped_pos), rot_ratelimit.advance(clamped_rot));

        let action = session.tick(&intents, &reply_state, clamped_pos, clamped_rot, rate_limited_pose);

        if tick_count % TICKS_PER_COMMAND == 0 {
            let command = DofCommand::neutral(action.mcw, action.pos, action.rot);
            if let Err(e) = socket.send(&command.to_bytes()) {
                tracing::warn!(error = %e, "MB command send failed");
            }
        }

        if let Err(e) = log.append(&LogRow {
            specific_force: snapshot.specific_force,
            angular_rate: snapshot.angular_rate,
            attitude: snapshot.attitude,
            pos: clamped_pos,
            rot: clamped_rot,
        }) {
            tracing::warn!(error = %e, "MDA log write failed");
        }

        last_pos = clamped_pos;
        last_rot = clamped_rot;
        tick_count += 1;

        rt::sleep_until_next_tick(&mut deadline, period_ns);
    }
}

/// Connects a UDP socket to the MB's address. Bind/connect failures at
/// startup are fatal.
pub fn connect(local_addr: std::net::SocketAddr, mb_addr: std::net::SocketAddr) -> Result<UdpSocket, SocketError> {
    let socket = UdpSocket::bind(local_addr).map_err(|source| SocketError::Bind { addr: local_addr, source })?;
    socket
        .connect(mb_addr)
        .map_err(|source| SocketError::Connect { addr: mb_addr, source })?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_rate_limiter_caps_each_axis_independently() {
        let mut limiter = VectorRateLimiter::new(0.1);
        let out = limiter.advance(Vector3::new(10.0, -10.0, 0.05));
        assert_eq!(out, Vector3::new(0.1, -0.1, 0.05));
    }

    #[test]
    fn default_envelope_bounds_are_non_degenerate() {
        let envelope = Envelope::default_for_platform();
        assert!(envelope.pos_low.x < envelope.pos_high.x);
        assert!(envelope.rot_low.z < envelope.rot_high.z);
    }
}
