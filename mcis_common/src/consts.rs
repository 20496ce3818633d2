//! System-wide constants for the MCIS workspace.
//!
//! Single source of truth for timing, wire sizes and physical constants.
//! Imported by both the real-time service and the offline replay tool.

/// Standard gravity used to convert specific force from g to m/s^2.
pub const GRAVITY: f64 = 9.81;

/// Degrees to radians.
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// MB send-loop tick rate (Hz). Commands are issued every other tick.
pub const SEND_LOOP_HZ: u64 = 120;

/// MB command cadence (Hz) — half the tick rate.
pub const MB_COMMAND_HZ: u64 = 60;

/// Number of send-loop ticks between MB commands.
pub const TICKS_PER_COMMAND: u64 = SEND_LOOP_HZ / MB_COMMAND_HZ;

/// Default engage timeout, in send-loop ticks (~10s at 120Hz).
pub const ENGAGE_TIMEOUT_TICKS: u64 = 1200;

/// Default rate-limited ramp-in timeout, in send-loop ticks (~10s at 120Hz).
pub const RATE_LIMIT_TIMEOUT_TICKS: u64 = 1200;

/// Size in bytes of the on-disk/wire MDA configuration record.
pub const CONFIG_RECORD_LEN: usize = 4096;

/// Byte offset of the CRC32 field within the configuration record.
pub const CONFIG_CRC_POSITION: usize = 0xBB0;

/// Expected ASCII magic header, padded to 16 bytes.
pub const CONFIG_MAGIC: &str = "MCIS v05 CONFIG ";

/// Length in bytes of the simulator telemetry datagram (X-Plane 9 "DATA" format).
pub const SIM_TELEMETRY_LEN: usize = 185;

/// Size in bytes of a wire MB command packet.
pub const MB_COMMAND_LEN: usize = 32;

/// Size in bytes of a wire MB reply packet.
pub const MB_REPLY_LEN: usize = 40;

static_assertions::const_assert_eq!(TICKS_PER_COMMAND * MB_COMMAND_HZ, SEND_LOOP_HZ);
static_assertions::const_assert!(CONFIG_CRC_POSITION < CONFIG_RECORD_LEN);

/// Default per-sample rate-limit delta for position axes during the
/// `RateLimited` ramp-in, in meters (~20mm/s at 120Hz).
pub const DEFAULT_POS_RATE_LIMIT: f64 = 3.4e-4;

/// Default per-sample rate-limit delta for rotation axes during the
/// `RateLimited` ramp-in, in radians (~1deg/s at 120Hz).
pub const DEFAULT_ROT_RATE_LIMIT: f64 = 0.016;

/// Default platform position envelope, meters. Never defined as a constant
/// anywhere in the retained source pack despite being referenced
/// throughout the MB interface; chosen here as a physically reasonable
/// small-amplitude bound for a hexapod-class motion base.
pub const DEFAULT_MB_POS_LOW: (f64, f64, f64) = (-0.5, -0.5, -0.4);
pub const DEFAULT_MB_POS_HIGH: (f64, f64, f64) = (0.5, 0.5, 0.4);

/// Default platform rotation envelope, radians (~±25deg roll/pitch, ±30deg yaw).
pub const DEFAULT_MB_ROT_LOW: (f64, f64, f64) = (-0.44, -0.44, -0.52);
pub const DEFAULT_MB_ROT_HIGH: (f64, f64, f64) = (0.44, 0.44, 0.52);

/// Default fixed Z position offset added before clamping, meters. Zero is
/// valid and expected on modern firmware; nonzero values compensate legacy
/// firmware that expects heave commands relative to a raised platform datum.
pub const DEFAULT_MB_OFFSET_Z: f64 = 0.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(SEND_LOOP_HZ > MB_COMMAND_HZ);
        assert_eq!(TICKS_PER_COMMAND, 2);
        assert!(CONFIG_CRC_POSITION < CONFIG_RECORD_LEN);
        assert_eq!(CONFIG_MAGIC.len(), 16);
    }
}
