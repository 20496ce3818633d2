//! Latched MB fault bits and discrete I/O info, decoded from the reply
//! packet's 32-bit fault and info words.
//!
//! The wire protocol only guarantees a non-zero fault word means *some*
//! fault is latched; the individual bit meanings below are carried for
//! operator-facing diagnostics and are not otherwise load-bearing in the
//! session FSM, which only checks the word against zero and the decoded
//! machine state against the FAULT1/2/3 values.

use bitflags::bitflags;

bitflags! {
    /// Latched fault bits from offset 0 of the MB reply packet. All faults
    /// are asserted on 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MbFaultBits: u32 {
        const ESTOP         = 0x8000;
        const SNUBBER       = 0x4000;
        const ACT_RUNAWAY   = 0x2000;
        const BATTERY       = 0x1000;
        const LOW_IDLE_RATE = 0x0800;
        const MOTOR_THERMAL = 0x0400;
        const CMD_RANGE_ERR = 0x0200;
        const INVALID_FRAME = 0x0100;
        const WATCHDOG      = 0x0080;
        const LIMIT_SWITCH  = 0x0040;
        const DRIVE_BUS     = 0x0020;
        const AMPLIFIER     = 0x0010;
        const COMM          = 0x0008;
        const HOMING        = 0x0004;
        const ENVELOPE      = 0x0002;
        const TORQUE_MON    = 0x0001;
    }
}

impl Default for MbFaultBits {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Discrete I/O info bits from offset 4 of the MB reply packet. All
    /// conditions are asserted on 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MbDiscreteInfo: u32 {
        const ESTOP_SENSE       = 0x80;
        const AMP_ENABLE_CMD    = 0x40;
        const DRIVE_BUS_SENSE   = 0x20;
        const LIM_SHUNT_CMD     = 0x10;
        const LIM_SWITCH_SENSE  = 0x08;
        const AMP_FAULT_SENSE   = 0x04;
        const THERM_FAULT_SENSE = 0x02;
        const BASE_AT_HOME      = 0x01;
    }
}

impl Default for MbDiscreteInfo {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_bits_round_trip_from_word() {
        let word = 0x8000 | 0x0001;
        let bits = MbFaultBits::from_bits_truncate(word);
        assert!(bits.contains(MbFaultBits::ESTOP));
        assert!(bits.contains(MbFaultBits::TORQUE_MON));
        assert!(!bits.contains(MbFaultBits::COMM));
    }

    #[test]
    fn zero_word_is_empty() {
        assert!(MbFaultBits::from_bits_truncate(0).is_empty());
    }
}
