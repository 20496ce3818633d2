//! # MCIS Core
//!
//! Real-time motion cueing brain: converts flight-simulator telemetry into
//! bounded 6-DoF commands for a motion base, by way of a washout-filter
//! signal pipeline and a fixed-cadence session state machine.
//!
//! ## Architecture
//!
//! 1. **Simulator ingest** — background UDP receiver producing the latest
//!    (specific force, angular rate, attitude) triple.
//! 2. **MDA pipeline** ([`mda`]) — angular high-pass, tilt-coordination and
//!    positional high-pass channels, sequenced by the orchestrator.
//! 3. **Session FSM** ([`session`]) — engage/park/fault state machine driving
//!    the MB command sender.
//! 4. **Config loader** ([`config`]) — CRC-validated binary parameter bundle.
//!
//! ## Threading model
//!
//! Three long-lived OS threads: simulator ingest, MB send-loop (owns the MDA
//! and the session FSM), and MB reply receiver. No async runtime; the
//! send-loop is the pacemaker, sleeping to an absolute monotonic deadline
//! each tick.

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod log;
pub mod mb_reply;
pub mod mb_sender;
pub mod mda;
pub mod rt;
pub mod session;
