//! Binary MDA configuration loader.
//!
//! The on-disk format is a fixed 4096-byte, big-endian, CRC32-protected
//! record. Layout (byte offsets):
//!
//! ```text
//! 0x0000  header[16]            ASCII, must equal "MCIS v05 CONFIG "
//! 0x0010  sample_rate           u32
//! 0x0014  18 gain/limit doubles f64 x18  (see field order on MdaConfig)
//! 0x00A4  8 filter slots        352 bytes each (continuous + discrete halves)
//! 0x0BA4  reserved              12 bytes, zero
//! 0x0BB0  crc32                 u32, over bytes [0x0000, 0x0BB0)
//! 0x0BB4  comments              1100 bytes, copied verbatim
//! 0x1000  (4096, end of record)
//! ```
//!
//! The 18 gain/limit doubles are, in order: `K_SF_{x,y,z}`, `K_{p,q,r}`,
//! `lim_SF_{x,y,z}`, `lim_{p,q,r}`, `K_TC_{x,y}`, `lim_TC_{x,y}`,
//! `ratelim_TC_{x,y}`. The 8 filter slots are, in order: SF high-pass
//! x/y/z, SF low-pass x/y (tilt coordination), p/q/r high-pass (angular).
//! Each slot's continuous-time parameters are decoded and retained for
//! traceability but never consulted at runtime.

use mcis_common::filters::BiquadCoeffs;
use mcis_common::Vector3;

use crate::error::ConfigError;

const HEADER_LEN: usize = 16;
const GAIN_COUNT: usize = 18;
const FILTER_SLOT_COUNT: usize = 8;
const CONTINUOUS_ORDER_MAX: usize = 8;
const MAX_SECTIONS: usize = 4;
const DESC_LEN: usize = 15;
const COMMENTS_LEN: usize = 1100;
const RESERVED_LEN: usize = 12;

const CRC_POSITION: usize = 0x0BB0;
const RECORD_LEN: usize = 4096;
const MAGIC: &[u8; HEADER_LEN] = b"MCIS v05 CONFIG ";

const CONTINUOUS_SLOT_LEN: usize = 1 + DESC_LEN + CONTINUOUS_ORDER_MAX * 8 * 2;
const DISCRETE_SLOT_LEN: usize = 1 + DESC_LEN + MAX_SECTIONS * 6 * 8;
const FILTER_SLOT_LEN: usize = CONTINUOUS_SLOT_LEN + DISCRETE_SLOT_LEN;

static_assertions::const_assert_eq!(CONTINUOUS_SLOT_LEN, 144);
static_assertions::const_assert_eq!(DISCRETE_SLOT_LEN, 208);
static_assertions::const_assert_eq!(FILTER_SLOT_LEN, 352);

/// Continuous-time filter parameters: stored for traceability, never used
/// at runtime (see design note on the unused continuous-filter fields).
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousFilterParams {
    pub order: u8,
    pub description: [u8; DESC_LEN],
    pub b: [f64; CONTINUOUS_ORDER_MAX],
    pub a: [f64; CONTINUOUS_ORDER_MAX],
}

/// A discrete-time filter description: up to four biquad sections, a
/// section count and a post-chain gain.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteFilterParams {
    pub sections_in_use: u8,
    pub description: [u8; DESC_LEN],
    pub sections: [BiquadCoeffs; MAX_SECTIONS],
}

impl DiscreteFilterParams {
    /// The active `BiquadCoeffs` list, truncated to `sections_in_use` so a
    /// channel declared with fewer than four sections still produces
    /// identical numeric results.
    pub fn active_sections(&self) -> Vec<BiquadCoeffs> {
        self.sections[..self.sections_in_use as usize].to_vec()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSlot {
    pub continuous: ContinuousFilterParams,
    pub discrete: DiscreteFilterParams,
    pub gain: f64,
}

impl FilterSlot {
    pub fn to_biquad_chain(&self) -> mcis_common::filters::BiquadChain {
        mcis_common::filters::BiquadChain::new(self.discrete.active_sections(), self.gain)
    }
}

/// The fully decoded MDA configuration record, created once at startup and
/// read-only thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct MdaConfig {
    pub sample_rate: u32,

    pub k_sf: Vector3,
    pub k_pqr: Vector3,
    pub lim_sf: Vector3,
    pub lim_pqr: Vector3,

    pub k_tc_x: f64,
    pub k_tc_y: f64,
    pub lim_tc_x: f64,
    pub lim_tc_y: f64,
    pub ratelim_tc_x: f64,
    pub ratelim_tc_y: f64,

    pub sf_hp_x: FilterSlot,
    pub sf_hp_y: FilterSlot,
    pub sf_hp_z: FilterSlot,
    pub sf_lp_x: FilterSlot,
    pub sf_lp_y: FilterSlot,
    pub p_hp: FilterSlot,
    pub q_hp: FilterSlot,
    pub r_hp: FilterSlot,

    pub comments: [u8; COMMENTS_LEN],
}

impl MdaConfig {
    /// Loads and validates a configuration record from a file path.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::load_from_bytes(&bytes)
    }

    /// Loads and validates a configuration record already read into memory.
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() != RECORD_LEN {
            return Err(ConfigError::BadLength { expected: RECORD_LEN, read: bytes.len() });
        }

        let computed = crc32fast::hash(&bytes[..CRC_POSITION]);
        let stored = u32::from_be_bytes(bytes[CRC_POSITION..CRC_POSITION + 4].try_into().unwrap());
        if stored != computed {
            return Err(ConfigError::BadCrc { stored, computed });
        }

        check_header(&bytes[..HEADER_LEN])?;

        let mut cursor = HEADER_LEN;
        let sample_rate = read_u32(bytes, &mut cursor);

        let mut gains = [0.0f64; GAIN_COUNT];
        for g in gains.iter_mut() {
            *g = read_f64(bytes, &mut cursor);
        }

        let mut slots: Vec<FilterSlot> = Vec::with_capacity(FILTER_SLOT_COUNT);
        for _ in 0..FILTER_SLOT_COUNT {
            slots.push(read_filter_slot(bytes, &mut cursor));
        }

        debug_assert_eq!(cursor, HEADER_LEN + 4 + GAIN_COUNT * 8 + FILTER_SLOT_COUNT * FILTER_SLOT_LEN);
        cursor += RESERVED_LEN;
        debug_assert_eq!(cursor, CRC_POSITION);
        cursor += 4; // CRC itself, already validated above.

        let mut comments = [0u8; COMMENTS_LEN];
        comments.copy_from_slice(&bytes[cursor..cursor + COMMENTS_LEN]);

        let mut slots = slots.into_iter();
        Ok(MdaConfig {
            sample_rate,
            k_sf: Vector3::new(gains[0], gains[1], gains[2]),
            k_pqr: Vector3::new(gains[3], gains[4], gains[5]),
            lim_sf: Vector3::new(gains[6], gains[7], gains[8]),
            lim_pqr: Vector3::new(gains[9], gains[10], gains[11]),
            k_tc_x: gains[12],
            k_tc_y: gains[13],
            lim_tc_x: gains[14],
            lim_tc_y: gains[15],
            ratelim_tc_x: gains[16],
            ratelim_tc_y: gains[17],
            sf_hp_x: slots.next().unwrap(),
            sf_hp_y: slots.next().unwrap(),
            sf_hp_z: slots.next().unwrap(),
            sf_lp_x: slots.next().unwrap(),
            sf_lp_y: slots.next().unwrap(),
            p_hp: slots.next().unwrap(),
            q_hp: slots.next().unwrap(),
            r_hp: slots.next().unwrap(),
            comments,
        })
    }
}

fn check_header(header: &[u8]) -> Result<(), ConfigError> {
    if header.eq_ignore_ascii_case(MAGIC) {
        return Ok(());
    }
    match header[7] {
        b'0'..=b'4' => Err(ConfigError::LittleEndianConfig),
        _ => Err(ConfigError::UnsupportedConfigType),
    }
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> u32 {
    let v = u32::from_be_bytes(bytes[*cursor..*cursor + 4].try_into().unwrap());
    *cursor += 4;
    v
}

fn read_f64(bytes: &[u8], cursor: &mut usize) -> f64 {
    let v = f64::from_be_bytes(bytes[*cursor..*cursor + 8].try_into().unwrap());
    *cursor += 8;
    v
}

fn read_u8(bytes: &[u8], cursor: &mut usize) -> u8 {
    let v = bytes[*cursor];
    *cursor += 1;
    v
}

fn read_desc(bytes: &[u8], cursor: &mut usize) -> [u8; DESC_LEN] {
    let mut desc = [0u8; DESC_LEN];
    desc.copy_from_slice(&bytes[*cursor..*cursor + DESC_LEN]);
    *cursor += DESC_LEN;
    desc
}

fn read_continuous(bytes: &[u8], cursor: &mut usize) -> ContinuousFilterParams {
    let order = read_u8(bytes, cursor);
    let description = read_desc(bytes, cursor);
    let mut b = [0.0; CONTINUOUS_ORDER_MAX];
    for v in b.iter_mut() {
        *v = read_f64(bytes, cursor);
    }
    let mut a = [0.0; CONTINUOUS_ORDER_MAX];
    for v in a.iter_mut() {
        *v = read_f64(bytes, cursor);
    }
    ContinuousFilterParams { order, description, b, a }
}

fn read_discrete(bytes: &[u8], cursor: &mut usize) -> (DiscreteFilterParams, f64) {
    let sections_in_use = read_u8(bytes, cursor);
    let description = read_desc(bytes, cursor);
    let mut sections = [BiquadCoeffs::default(); MAX_SECTIONS];
    let mut gain = 0.0;
    for section in sections.iter_mut() {
        let b0 = read_f64(bytes, cursor);
        let b1 = read_f64(bytes, cursor);
        let b2 = read_f64(bytes, cursor);
        let a1 = read_f64(bytes, cursor);
        let a2 = read_f64(bytes, cursor);
        gain = read_f64(bytes, cursor);
        *section = BiquadCoeffs { b0, b1, b2, a1, a2 };
    }
    (DiscreteFilterParams { sections_in_use, description, sections }, gain)
}

fn read_filter_slot(bytes: &[u8], cursor: &mut usize) -> FilterSlot {
    let continuous = read_continuous(bytes, cursor);
    let (discrete, gain) = read_discrete(bytes, cursor);
    FilterSlot { continuous, discrete, gain }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slot_bytes(gain: f64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FILTER_SLOT_LEN);
        buf.push(2); // continuous order
        buf.extend_from_slice(&[0u8; DESC_LEN]);
        for _ in 0..CONTINUOUS_ORDER_MAX * 2 {
            buf.extend_from_slice(&0.0f64.to_be_bytes());
        }
        buf.push(1); // one active biquad section
        buf.extend_from_slice(&[0u8; DESC_LEN]);
        for section in 0..MAX_SECTIONS {
            let (b0, b1, b2, a1, a2) =
                if section == 0 { (1.0, 0.0, 0.0, 0.0, 0.0) } else { (0.0, 0.0, 0.0, 0.0, 0.0) };
            buf.extend_from_slice(&b0.to_be_bytes());
            buf.extend_from_slice(&b1.to_be_bytes());
            buf.extend_from_slice(&b2.to_be_bytes());
            buf.extend_from_slice(&a1.to_be_bytes());
            buf.extend_from_slice(&a2.to_be_bytes());
            buf.extend_from_slice(&gain.to_be_bytes());
        }
        assert_eq!(buf.len(), FILTER_SLOT_LEN);
        buf
    }

    fn build_valid_record() -> Vec<u8> {
        let mut buf = Vec::with_capacity(RECORD_LEN);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&120u32.to_be_bytes());
        for g in 0..GAIN_COUNT {
            buf.extend_from_slice(&(g as f64 * 0.1).to_be_bytes());
        }
        for _ in 0..FILTER_SLOT_COUNT {
            buf.extend_from_slice(&sample_slot_bytes(1.0));
        }
        buf.extend_from_slice(&[0u8; RESERVED_LEN]);
        assert_eq!(buf.len(), CRC_POSITION);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_be_bytes());
        buf.extend_from_slice(&[b'#'; COMMENTS_LEN]);
        assert_eq!(buf.len(), RECORD_LEN);
        buf
    }

    #[test]
    fn valid_record_loads_successfully() {
        let record = build_valid_record();
        let cfg = MdaConfig::load_from_bytes(&record).expect("load should succeed");
        assert_eq!(cfg.sample_rate, 120);
        assert_eq!(cfg.k_sf, Vector3::new(0.0, 0.1, 0.2));
        assert_eq!(cfg.comments, [b'#'; COMMENTS_LEN]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let record = vec![0u8; 100];
        let err = MdaConfig::load_from_bytes(&record).unwrap_err();
        assert_eq!(err, ConfigError::BadLength { expected: RECORD_LEN, read: 100 });
    }

    #[test]
    fn bad_crc_is_rejected() {
        let mut record = build_valid_record();
        record[CRC_POSITION] ^= 0xFF;
        match MdaConfig::load_from_bytes(&record) {
            Err(ConfigError::BadCrc { .. }) => {}
            other => panic!("expected BadCrc, got {other:?}"),
        }
    }

    #[test]
    fn old_header_version_byte_is_little_endian_config() {
        let mut record = build_valid_record();
        record[..HEADER_LEN].copy_from_slice(b"MCIS v02 CONFIG ");
        let crc = crc32fast::hash(&record[..CRC_POSITION]);
        record[CRC_POSITION..CRC_POSITION + 4].copy_from_slice(&crc.to_be_bytes());
        assert_eq!(MdaConfig::load_from_bytes(&record), Err(ConfigError::LittleEndianConfig));
    }

    #[test]
    fn unrecognized_header_is_unsupported_config_type() {
        let mut record = build_valid_record();
        record[..HEADER_LEN].copy_from_slice(b"GARBAGE HEADER!!");
        let crc = crc32fast::hash(&record[..CRC_POSITION]);
        record[CRC_POSITION..CRC_POSITION + 4].copy_from_slice(&crc.to_be_bytes());
        assert_eq!(MdaConfig::load_from_bytes(&record), Err(ConfigError::UnsupportedConfigType));
    }

    #[test]
    fn header_check_is_case_insensitive() {
        let mut record = build_valid_record();
        record[..HEADER_LEN].copy_from_slice(b"mcis v05 config ");
        let crc = crc32fast::hash(&record[..CRC_POSITION]);
        record[CRC_POSITION..CRC_POSITION + 4].copy_from_slice(&crc.to_be_bytes());
        assert!(MdaConfig::load_from_bytes(&record).is_ok());
    }

    #[test]
    fn load_round_trips_through_a_real_file() {
        let record = build_valid_record();
        let mut file = tempfile::NamedTempFile::new().expect("create temp config file");
        std::io::Write::write_all(&mut file, &record).expect("write temp config file");

        let cfg = MdaConfig::load(file.path()).expect("load from path should succeed");
        let from_bytes = MdaConfig::load_from_bytes(&record).expect("load from bytes should succeed");
        assert_eq!(cfg, from_bytes);
    }

    #[test]
    fn load_reports_io_error_for_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("does-not-exist.cfg");
        match MdaConfig::load(&missing) {
            Err(ConfigError::Io(_)) => {}
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
