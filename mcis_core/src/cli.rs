//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::session::Fault2Policy;

#[derive(Debug, Parser)]
#[command(name = "mcis", about = "Real-time motion cueing service")]
pub struct Cli {
    /// Path to the 4096-byte binary MDA configuration record.
    #[arg(long, default_value = "mcis.cfg")]
    pub config: PathBuf,

    /// Local UDP port the simulator telemetry is received on.
    #[arg(long, default_value_t = 5700)]
    pub sim_port: u16,

    /// Motion base address, `host:port`.
    #[arg(long)]
    pub mb_addr: String,

    /// Disables gravity subtraction in the positional channel. Emits a
    /// prominent startup warning and waits for operator confirmation —
    /// running without gravity compensation will cause the platform to
    /// command sustained heave in response to steady-state acceleration.
    #[arg(long = "nograv")]
    pub no_gravity: bool,

    /// CPU core to pin the send-loop thread to when the `rt` feature is built in.
    #[arg(long, default_value_t = 0)]
    pub rt_cpu: usize,

    /// `SCHED_FIFO` priority for the send-loop thread when the `rt` feature is built in.
    #[arg(long, default_value_t = 80)]
    pub rt_priority: i32,

    /// Path to write the per-tick MDA CSV log to.
    #[arg(long, default_value = "mcis.log.csv")]
    pub log_path: PathBuf,

    /// How a reported FAULT2 machine state is handled: `non-recoverable`
    /// treats it like FAULT1/FAULT3 (terminal `MbFault`); `recoverable`
    /// enters `MbRecoverableFault`, allowing an operator-acknowledged RESET.
    #[arg(long, value_enum, default_value_t = Fault2Policy::NonRecoverable)]
    pub fault2_policy: Fault2Policy,
}

/// Prints the `-nograv` warning and blocks for an explicit operator
/// confirmation on stdin before continuing.
pub fn confirm_nograv_or_exit() {
    eprintln!("********************************************************************");
    eprintln!("WARNING: -nograv disables gravity subtraction in the positional");
    eprintln!("high-pass channel. The motion base WILL command sustained heave in");
    eprintln!("response to steady-state acceleration. Type 'yes' to continue:");
    eprintln!("********************************************************************");

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() || line.trim() != "yes" {
        eprintln!("confirmation not received, exiting");
        std::process::exit(1);
    }
}
