//! MB command/reply wire layouts and the simulator telemetry byte offsets.
//!
//! All MB wire fields are big-endian; the simulator telemetry datagram is
//! little-endian (see module doc on [`crate::wire::xplane9`]).

use crate::vector::Vector3;

/// Motion Command Words, the leading `u32` of every MB command packet.
pub mod mcw {
    pub const RESET: u32 = 160;
    pub const NEW_POSITION: u32 = 130;
    pub const DOF_MODE: u32 = 170;
    pub const START: u32 = 175;
    pub const PARK: u32 = 210;
    // Carried for completeness; not issued by the session FSM.
    pub const DISABLE: u32 = 220;
    pub const LOW_LIM_ENABLE: u32 = 200;
    pub const LOW_LIM_DISABLE: u32 = 190;
    pub const ENGAGE: u32 = 180;
    pub const LENGTH_MODE: u32 = 172;
    pub const INHIBIT: u32 = 150;
    pub const MDA_MODE: u32 = 140;
}

/// Machine state info masks and decoded state values (offset 8, reply packet).
pub mod state {
    pub const MASK_FEEDBACK_TYPE: u32 = 0x80;
    pub const MASK_CMD_MODE: u32 = 0x60;
    pub const MASK_ENCODED: u32 = 0x0F;

    pub const CMD_MODE_LENGTH: u32 = 0x00;
    pub const CMD_MODE_DOF: u32 = 0x20;
    pub const CMD_MODE_MDA: u32 = 0x40;
    pub const CMD_MODE_INVALID: u32 = 0x60;

    pub const POWER_UP: u32 = 0x0;
    pub const IDLE: u32 = 0x1;
    pub const STANDBY: u32 = 0x2;
    pub const ENGAGED: u32 = 0x3;
    pub const PARKING: u32 = 0x7;
    pub const FAULT1: u32 = 0x8;
    pub const FAULT2: u32 = 0x9;
    pub const FAULT3: u32 = 0xA;
    pub const DISABLED: u32 = 0xB;
    pub const INHIBITED: u32 = 0xC;
}

/// A 32-byte big-endian MB command packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofCommand {
    pub mcw: u32,
    pub roll_cmd: f32,
    pub pitch_cmd: f32,
    pub heave_cmd: f32,
    pub surge_cmd: f32,
    pub yaw_cmd: f32,
    pub lateral_cmd: f32,
}

impl DofCommand {
    pub fn neutral(mcw: u32, pos: Vector3, rot: Vector3) -> Self {
        DofCommand {
            mcw,
            roll_cmd: rot.x as f32,
            pitch_cmd: rot.y as f32,
            heave_cmd: pos.z as f32,
            surge_cmd: pos.x as f32,
            yaw_cmd: rot.z as f32,
            lateral_cmd: pos.y as f32,
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[0..4].copy_from_slice(&self.mcw.to_be_bytes());
        buf[4..8].copy_from_slice(&self.roll_cmd.to_be_bytes());
        buf[8..12].copy_from_slice(&self.pitch_cmd.to_be_bytes());
        buf[12..16].copy_from_slice(&self.heave_cmd.to_be_bytes());
        buf[16..20].copy_from_slice(&self.surge_cmd.to_be_bytes());
        buf[20..24].copy_from_slice(&self.yaw_cmd.to_be_bytes());
        buf[24..28].copy_from_slice(&self.lateral_cmd.to_be_bytes());
        // bytes 28..32 are the reserved SPARE field, left zero.
        buf
    }
}

/// A 40-byte big-endian MB reply packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofReply {
    pub latched_fault_data: u32,
    pub discrete_io_info: u32,
    pub machine_state_info: u32,
    pub roll_feedback: f32,
    pub pitch_feedback: f32,
    pub heave_feedback: f32,
    pub surge_feedback: f32,
    pub yaw_feedback: f32,
    pub lateral_feedback: f32,
}

impl DofReply {
    pub fn from_bytes(buf: &[u8; 40]) -> Self {
        let u32_at = |o: usize| u32::from_be_bytes(buf[o..o + 4].try_into().unwrap());
        let f32_at = |o: usize| f32::from_be_bytes(buf[o..o + 4].try_into().unwrap());
        DofReply {
            latched_fault_data: u32_at(0),
            discrete_io_info: u32_at(4),
            machine_state_info: u32_at(8),
            roll_feedback: f32_at(12),
            pitch_feedback: f32_at(16),
            heave_feedback: f32_at(20),
            surge_feedback: f32_at(24),
            yaw_feedback: f32_at(28),
            lateral_feedback: f32_at(32),
        }
    }

    /// The 4-bit decoded machine state, `ntohl(machine_state_info) & 0x0F`.
    pub fn decoded_state(&self) -> u32 {
        self.machine_state_info & state::MASK_ENCODED
    }
}

/// Byte offsets into the 185-byte X-Plane 9 "DATA" telemetry datagram.
///
/// Fixed header "DATA" (4 bytes) plus one unused byte, then five 36-byte
/// packets; only the offsets below are consumed. All fields are
/// little-endian 32-bit floats.
pub mod xplane9 {
    pub const MSG_LEN: usize = 185;

    pub const OFFSET_SF_Z: usize = 25;
    pub const OFFSET_SF_X: usize = 29;
    pub const OFFSET_SF_Y: usize = 33;

    pub const OFFSET_Q: usize = 81;
    pub const OFFSET_P: usize = 85;
    pub const OFFSET_R: usize = 89;

    pub const OFFSET_THETA: usize = 121;
    pub const OFFSET_PHI: usize = 125;
    pub const OFFSET_PSI: usize = 129;
}
