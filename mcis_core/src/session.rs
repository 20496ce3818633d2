//! MB session state machine: the engagement handshake, rate-limited ramp
//! in, steady-state operation, parking and fault handling described by the
//! per-tick state table.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use mcis_common::consts::{ENGAGE_TIMEOUT_TICKS, RATE_LIMIT_TIMEOUT_TICKS};
use mcis_common::wire::{mcw, state};
use mcis_common::Vector3;

/// Named session states, in the order the handshake visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    EstablishComms,
    WaitForEngage,
    Engaging,
    WaitForReady,
    RateLimited,
    Engaged,
    Parking,
    MbFault,
    MbRecoverableFault,
}

/// Observable fault detail, surfaced to the UI/log alongside `SessionStatus::MbFault`
/// or `MbRecoverableFault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfaceError {
    MbFault1,
    MbFault2,
    MbFault3,
    MbEngageFailed,
}

/// Policy for how a reported MB `FAULT2` state is handled. The reference
/// system treats all three fault states as non-recoverable at the fault
/// check while still exposing a recoverable-fault state with a RESET
/// affordance; the FAULT2 mapping was never wired up in the original
/// source, so we expose it as an explicit, operator-visible choice rather
/// than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Fault2Policy {
    /// FAULT2 is treated the same as FAULT1/FAULT3: `MbFault`, terminal.
    #[value(name = "non-recoverable")]
    NonRecoverable,
    /// FAULT2 enters `MbRecoverableFault`, allowing an operator-acknowledged
    /// RESET back to `WaitForEngage`.
    #[value(name = "recoverable")]
    Recoverable,
}

/// Pending operator intents, cleared after the state action that consumes
/// them runs (an intent raised before its state is active must not be
/// silently latched into the next state).
#[derive(Debug, Default)]
pub struct UserIntents {
    pub engage: AtomicBool,
    pub ready: AtomicBool,
    pub park: AtomicBool,
    pub reset: AtomicBool,
}

impl UserIntents {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Latest MB reply state, written by the reply-receiver thread and read
/// without a lock by the send-loop. Torn reads are unacceptable in a
/// safety-relevant FSM, so every field is a plain atomic word.
#[derive(Debug, Default)]
pub struct MbReplyState {
    pub raw_status: AtomicU32,
    pub decoded_state: AtomicU32,
    pub latched_fault: AtomicBool,
}

impl MbReplyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, raw_status: u32, decoded_state: u32, fault_bits_nonzero: bool) {
        self.raw_status.store(raw_status, Ordering::Release);
        self.decoded_state.store(decoded_state, Ordering::Release);
        if fault_bits_nonzero {
            self.latched_fault.store(true, Ordering::Release);
        }
    }
}

/// One MDA command, already envelope-clamped, ready for wire encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandAction {
    pub mcw: u32,
    pub pos: Vector3,
    pub rot: Vector3,
}

/// The session FSM. Owns tick counters and intent-consumption bookkeeping;
/// does not itself perform I/O — `mb_sender` drives it once per tick and
/// turns the returned [`CommandAction`] into wire bytes.
pub struct Session {
    pub status: SessionStatus,
    pub error: Option<IfaceError>,
    tick: u64,
    state_entry_tick: u64,
    entered_this_tick: Option<SessionStatus>,
    fault2_policy: Fault2Policy,
    neutral_pos: Vector3,
    neutral_rot: Vector3,
}

impl Session {
    pub fn new(fault2_policy: Fault2Policy, neutral_pos: Vector3) -> Self {
        Session {
            status: SessionStatus::EstablishComms,
            error: None,
            tick: 0,
            state_entry_tick: 0,
            entered_this_tick: None,
            fault2_policy,
            neutral_pos,
            neutral_rot: Vector3::ZERO,
        }
    }

    fn enter(&mut self, status: SessionStatus) {
        self.status = status;
        self.state_entry_tick = self.tick;
        self.entered_this_tick = Some(status);
    }

    /// True if the FSM transitioned into `status` during the most recent
    /// `tick()` call. Used by `mb_sender` to reset the vector rate limiters
    /// to the neutral pose exactly on entry to `RateLimited`.
    pub fn entered(&self, status: SessionStatus) -> bool {
        self.entered_this_tick == Some(status)
    }

    fn ticks_in_state(&self) -> u64 {
        self.tick - self.state_entry_tick
    }

    /// Runs one send-loop tick and returns the command to encode on the
    /// wire. `current_pos`/`current_rot` is the envelope-clamped MDA output
    /// for this tick; `rate_limited_pose` is that same output after it has
    /// been run through the caller-owned vector rate limiters (only
    /// consulted while `RateLimited`).
    pub fn tick(
        &mut self,
        intents: &UserIntents,
        reply: &MbReplyState,
        current_pos: Vector3,
        current_rot: Vector3,
        rate_limited_pose: (Vector3, Vector3),
    ) -> CommandAction {
        self.tick += 1;
        self.entered_this_tick = None;

        let past_handshake = !matches!(
            self.status,
            SessionStatus::EstablishComms | SessionStatus::WaitForEngage
        );
        let in_fault = matches!(self.status, SessionStatus::MbFault | SessionStatus::MbRecoverableFault);
        if past_handshake && !in_fault && intents.park.load(Ordering::Acquire) {
            self.enter(SessionStatus::Parking);
        }

        if !in_fault {
            let decoded = reply.decoded_state.load(Ordering::Acquire);
            if decoded == state::FAULT1 {
                self.error = Some(IfaceError::MbFault1);
                self.enter(SessionStatus::MbFault);
            } else if decoded == state::FAULT3 {
                self.error = Some(IfaceError::MbFault3);
                self.enter(SessionStatus::MbFault);
            } else if decoded == state::FAULT2 {
                self.error = Some(IfaceError::MbFault2);
                match self.fault2_policy {
                    Fault2Policy::NonRecoverable => self.enter(SessionStatus::MbFault),
                    Fault2Policy::Recoverable => self.enter(SessionStatus::MbRecoverableFault),
                }
            }
        }

        let action = self.run_state_action(intents, reply, current_pos, current_rot, rate_limited_pose);

        intents.engage.store(false, Ordering::Release);
        intents.ready.store(false, Ordering::Release);
        intents.park.store(false, Ordering::Release);

        action
    }

    fn run_state_action(
        &mut self,
        intents: &UserIntents,
        reply: &MbReplyState,
        current_pos: Vector3,
        current_rot: Vector3,
        rate_limited_pose: (Vector3, Vector3),
    ) -> CommandAction {
        match self.status {
            SessionStatus::EstablishComms => {
                let raw = reply.raw_status.load(Ordering::Acquire);
                if raw != 0xFFFF_FFFF {
                    self.enter(SessionStatus::WaitForEngage);
                }
                self.neutral(mcw::DOF_MODE)
            }

            SessionStatus::WaitForEngage => {
                if intents.engage.load(Ordering::Acquire) {
                    self.enter(SessionStatus::Engaging);
                }
                self.neutral(mcw::NEW_POSITION)
            }

            SessionStatus::Engaging => {
                let decoded = reply.decoded_state.load(Ordering::Acquire);
                if decoded == state::ENGAGED {
                    self.enter(SessionStatus::WaitForReady);
                } else if self.ticks_in_state() > ENGAGE_TIMEOUT_TICKS as u64 {
                    self.error = Some(IfaceError::MbEngageFailed);
                    self.enter(SessionStatus::MbFault);
                }
                self.neutral(mcw::START)
            }

            SessionStatus::WaitForReady => {
                if intents.ready.load(Ordering::Acquire) {
                    self.enter(SessionStatus::RateLimited);
                }
                self.neutral(mcw::NEW_POSITION)
            }

            SessionStatus::RateLimited => {
                if self.ticks_in_state() > RATE_LIMIT_TIMEOUT_TICKS as u64 {
                    self.enter(SessionStatus::Engaged);
                }
                CommandAction { mcw: mcw::NEW_POSITION, pos: rate_limited_pose.0, rot: rate_limited_pose.1 }
            }

            SessionStatus::Engaged => {
                CommandAction { mcw: mcw::NEW_POSITION, pos: current_pos, rot: current_rot }
            }

            SessionStatus::Parking => {
                let decoded = reply.decoded_state.load(Ordering::Acquire);
                if decoded == state::IDLE {
                    self.enter(SessionStatus::WaitForEngage);
                }
                self.neutral(mcw::PARK)
            }

            SessionStatus::MbFault => self.neutral(mcw::PARK),

            SessionStatus::MbRecoverableFault => {
                let decoded = reply.decoded_state.load(Ordering::Acquire);
                if decoded == state::IDLE {
                    self.enter(SessionStatus::WaitForEngage);
                }
                if intents.reset.load(Ordering::Acquire) {
                    intents.reset.store(false, Ordering::Release);
                    CommandAction { mcw: mcw::RESET, pos: self.neutral_pos, rot: self.neutral_rot }
                } else {
                    self.neutral(mcw::PARK)
                }
            }
        }
    }

    fn neutral(&self, mcw: u32) -> CommandAction {
        CommandAction { mcw, pos: self.neutral_pos, rot: self.neutral_rot }
    }
}
