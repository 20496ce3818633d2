//! End-to-end session scenarios exercising the FSM and envelope clamp
//! together, independent of any socket I/O.

use std::sync::atomic::Ordering;

use mcis_common::Vector3;
use mcis_core::mda::Envelope;
use mcis_core::session::{Fault2Policy, MbReplyState, Session, SessionStatus, UserIntents};
use mcis_common::wire::{mcw, state};

fn set_reply(reply: &MbReplyState, raw_status: u32, decoded: u32) {
    reply.update(raw_status, decoded, false);
}

/// S1: the MB reports 0xFFFFFFFF for the first five ticks (not yet ready),
/// then a real status word with IDLE — the session should move from
/// ESTABLISH_COMMS to WAIT_FOR_ENGAGE, and from there into ENGAGING once the
/// operator raises `engage`, reaching WAIT_FOR_READY the tick the MB reports
/// ENGAGED.
#[test]
fn s1_engagement_handshake() {
    let mut session = Session::new(Fault2Policy::NonRecoverable, Vector3::ZERO);
    let intents = UserIntents::new();
    let reply = MbReplyState::new();

    set_reply(&reply, 0xFFFF_FFFF, 0);
    for _ in 0..5 {
        session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
        assert_eq!(session.status, SessionStatus::EstablishComms);
    }

    set_reply(&reply, 0x1, state::IDLE);
    session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
    assert_eq!(session.status, SessionStatus::WaitForEngage);

    intents.engage.store(true, Ordering::Release);
    session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
    assert_eq!(session.status, SessionStatus::Engaging);

    set_reply(&reply, 0x1, state::ENGAGED);
    session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
    assert_eq!(session.status, SessionStatus::WaitForReady);
}

/// S2: in RATE_LIMITED, the caller's vector rate limiter ramps the MDA's
/// (0.1, 0, 0) output by its configured per-sample delta each send tick,
/// capping at the target once reached.
#[test]
fn s2_rate_limited_ramp() {
    let delta = 3.4e-4;
    let mut limiter = mcis_common::filters::RateLimiter::new(delta);

    let target = 0.1;
    let first = limiter.advance(target);
    let second = limiter.advance(target);
    let third = limiter.advance(target);

    assert!((first - delta).abs() < 1e-12);
    assert!((second - 2.0 * delta).abs() < 1e-12);
    assert!((third - 3.0 * delta).abs() < 1e-12);

    for _ in 0..10_000 {
        limiter.advance(target);
    }
    assert!((limiter.last_output() - target).abs() < 1e-9);
}

/// S2 (FSM half): RATE_LIMITED exits to ENGAGED once the ramp timeout elapses.
#[test]
fn s2_rate_limit_timeout_reaches_engaged() {
    let mut session = Session::new(Fault2Policy::NonRecoverable, Vector3::ZERO);
    let intents = UserIntents::new();
    let reply = MbReplyState::new();
    session.status = SessionStatus::WaitForReady;

    intents.ready.store(true, Ordering::Release);
    session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
    assert_eq!(session.status, SessionStatus::RateLimited);

    for _ in 0..1300 {
        session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));
    }
    assert_eq!(session.status, SessionStatus::Engaged);
}

/// S3: a large out-of-envelope MDA output gets clamped to the configured
/// platform limits before being sent.
#[test]
fn s3_envelope_clamp() {
    let envelope = Envelope::default_for_platform();
    let (pos, rot) = envelope.clamp(
        Vector3::new(10.0, 10.0, 10.0),
        Vector3::new(std::f64::consts::PI, std::f64::consts::PI, std::f64::consts::PI),
    );
    assert_eq!(pos, envelope.pos_high);
    assert_eq!(rot, envelope.rot_high);
}

/// S4: a FAULT1 reply forces MB_FAULT, and the next command issued is PARK.
#[test]
fn s4_park_on_fault() {
    let mut session = Session::new(Fault2Policy::NonRecoverable, Vector3::ZERO);
    let intents = UserIntents::new();
    let reply = MbReplyState::new();
    session.status = SessionStatus::Engaged;

    set_reply(&reply, 0x1, state::FAULT1);
    let action = session.tick(&intents, &reply, Vector3::ZERO, Vector3::ZERO, (Vector3::ZERO, Vector3::ZERO));

    assert_eq!(session.status, SessionStatus::MbFault);
    assert_eq!(action.mcw, mcw::PARK);
}

/// S5: a one-bit CRC corruption is rejected with `BadCrc`.
#[test]
fn s5_config_crc_mismatch() {
    use mcis_core::config::MdaConfig;

    // Build a minimal valid-looking record with a corrupted CRC byte,
    // reusing the same layout the loader expects.
    let mut record = vec![0u8; 4096];
    record[..16].copy_from_slice(b"MCIS v05 CONFIG ");
    let crc = crc32fast::hash(&record[..0x0BB0]);
    record[0x0BB0..0x0BB4].copy_from_slice(&crc.to_be_bytes());
    record[0x0BB0] ^= 0x01; // flip one bit of the stored CRC

    match MdaConfig::load_from_bytes(&record) {
        Err(mcis_core::error::ConfigError::BadCrc { .. }) => {}
        other => panic!("expected BadCrc, got {other:?}"),
    }
}

/// S6: specific force on Y alone should produce roll only; specific force
/// on X alone should produce pitch only (the tilt-coordination axis swap).
#[test]
fn s6_tilt_coordination_sign_convention() {
    use mcis_common::filters::BiquadCoeffs;
    use mcis_core::config::{ContinuousFilterParams, DiscreteFilterParams, FilterSlot, MdaConfig};
    use mcis_core::mda::Mda;

    fn identity_slot(gain: f64) -> FilterSlot {
        let identity = BiquadCoeffs { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };
        FilterSlot {
            continuous: ContinuousFilterParams { order: 0, description: [0; 15], b: [0.0; 8], a: [0.0; 8] },
            discrete: DiscreteFilterParams {
                sections_in_use: 1,
                description: [0; 15],
                sections: [identity, BiquadCoeffs::default(), BiquadCoeffs::default(), BiquadCoeffs::default()],
            },
            gain,
        }
    }

    let config = MdaConfig {
        sample_rate: 120,
        k_sf: Vector3::new(1.0, 1.0, 1.0),
        k_pqr: Vector3::new(1.0, 1.0, 1.0),
        lim_sf: Vector3::new(5.0, 5.0, 5.0),
        lim_pqr: Vector3::new(5.0, 5.0, 5.0),
        k_tc_x: 1.0,
        k_tc_y: 1.0,
        lim_tc_x: 5.0,
        lim_tc_y: 5.0,
        ratelim_tc_x: 1.0,
        ratelim_tc_y: 1.0,
        sf_hp_x: identity_slot(1.0),
        sf_hp_y: identity_slot(1.0),
        sf_hp_z: identity_slot(1.0),
        sf_lp_x: identity_slot(1.0),
        sf_lp_y: identity_slot(1.0),
        p_hp: identity_slot(1.0),
        q_hp: identity_slot(1.0),
        r_hp: identity_slot(1.0),
        comments: [0; 1100],
    };

    let mut mda_y = Mda::new(&config, false);
    let out_y = mda_y.step(Vector3::new(0.0, 0.2, 0.0), Vector3::ZERO, Vector3::ZERO);
    assert!(out_y.attitude.x > 0.0);
    assert!(out_y.attitude.y.abs() < 1e-9);

    let mut mda_x = Mda::new(&config, false);
    let out_x = mda_x.step(Vector3::new(0.2, 0.0, 0.0), Vector3::ZERO, Vector3::ZERO);
    assert!(out_x.attitude.y > 0.0);
    assert!(out_x.attitude.x.abs() < 1e-9);
}
