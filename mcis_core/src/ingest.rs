//! Simulator telemetry ingest: a background UDP receiver decoding X-Plane 9
//! `"DATA"` datagrams into the latest (specific force, angular rate,
//! attitude) triple.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use mcis_common::consts::{DEG_TO_RAD, GRAVITY};
use mcis_common::wire::xplane9;
use mcis_common::Vector3;

use crate::error::SocketError;

/// The latest received (specific force, angular rate, attitude) triple,
/// guarded by a single short-held mutex. Single writer (the ingest
/// worker), multiple readers.
#[derive(Debug, Default)]
pub struct LatestTelemetry {
    inner: Mutex<Telemetry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub specific_force: Vector3,
    pub angular_rate: Vector3,
    pub attitude: Vector3,
}

impl LatestTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, telemetry: Telemetry) {
        *self.inner.lock().expect("telemetry mutex poisoned") = telemetry;
    }

    /// Non-blocking snapshot of the most recently received, fully decoded
    /// telemetry triple.
    pub fn get_latest(&self) -> Telemetry {
        *self.inner.lock().expect("telemetry mutex poisoned")
    }
}

/// Decodes one 185-byte X-Plane 9 `"DATA"` datagram. Returns `None` if the
/// length doesn't match — the caller drops the packet and keeps listening.
pub fn decode_xplane9(packet: &[u8]) -> Option<Telemetry> {
    if packet.len() != xplane9::MSG_LEN {
        return None;
    }

    let f32_le = |offset: usize| f32::from_le_bytes(packet[offset..offset + 4].try_into().unwrap());

    let sf_z = f32_le(xplane9::OFFSET_SF_Z) as f64;
    let sf_x = f32_le(xplane9::OFFSET_SF_X) as f64;
    let sf_y = f32_le(xplane9::OFFSET_SF_Y) as f64;

    let q = f32_le(xplane9::OFFSET_Q) as f64;
    let p = f32_le(xplane9::OFFSET_P) as f64;
    let r = f32_le(xplane9::OFFSET_R) as f64;

    let theta = f32_le(xplane9::OFFSET_THETA) as f64;
    let phi = f32_le(xplane9::OFFSET_PHI) as f64;
    let psi = f32_le(xplane9::OFFSET_PSI) as f64;

    Some(Telemetry {
        specific_force: Vector3::new(sf_x, sf_y, sf_z) * GRAVITY,
        angular_rate: Vector3::new(p, q, r),
        attitude: Vector3::new(phi, theta, psi) * DEG_TO_RAD,
    })
}

/// Handle to the running ingest worker. Dropping or calling [`IngestWorker::stop`]
/// shuts down the socket (unblocking the worker's `recv_from`) and joins it.
pub struct IngestWorker {
    socket: UdpSocket,
    continue_operation: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl IngestWorker {
    /// Binds a UDP socket on `local_port` and spawns the receive loop,
    /// writing every successfully decoded datagram into `telemetry`.
    pub fn spawn(local_port: u16, telemetry: Arc<LatestTelemetry>) -> Result<Self, SocketError> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], local_port));
        let socket = UdpSocket::bind(addr).map_err(|source| SocketError::Bind { addr, source })?;

        let continue_operation = Arc::new(AtomicBool::new(true));
        let worker_socket = socket.try_clone().map_err(SocketError::Create)?;
        let worker_flag = Arc::clone(&continue_operation);

        let handle = std::thread::Builder::new()
            .name("mcis-sim-ingest".into())
            .spawn(move || receive_loop(worker_socket, worker_flag, telemetry))
            .expect("failed to spawn simulator ingest thread");

        Ok(IngestWorker { socket, continue_operation, handle: Some(handle) })
    }

    /// Signals shutdown, unblocks the worker's pending `recv_from` and
    /// joins it. `ENOTCONN` from the shutdown syscall is treated as success
    /// (the socket was already idle).
    pub fn stop(&mut self) -> Result<(), SocketError> {
        self.continue_operation.store(false, Ordering::Release);
        match self.socket.shutdown(std::net::Shutdown::Both) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
            Err(e) => return Err(SocketError::Shutdown(e)),
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for IngestWorker {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn receive_loop(socket: UdpSocket, continue_operation: Arc<AtomicBool>, telemetry: Arc<LatestTelemetry>) {
    let mut buf = [0u8; 512];
    while continue_operation.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, _src)) => {
                if let Some(decoded) = decode_xplane9(&buf[..len]) {
                    telemetry.replace(decoded);
                } else {
                    tracing::debug!(len, "dropped simulator datagram with unexpected length");
                }
            }
            Err(e) if !continue_operation.load(Ordering::Acquire) => {
                tracing::debug!(error = %e, "simulator ingest socket closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "simulator ingest recv failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> Vec<u8> {
        let mut buf = vec![0u8; xplane9::MSG_LEN];
        buf[0..4].copy_from_slice(b"DATA");
        buf[xplane9::OFFSET_SF_Z..xplane9::OFFSET_SF_Z + 4].copy_from_slice(&1.0f32.to_le_bytes());
        buf[xplane9::OFFSET_SF_X..xplane9::OFFSET_SF_X + 4].copy_from_slice(&2.0f32.to_le_bytes());
        buf[xplane9::OFFSET_SF_Y..xplane9::OFFSET_SF_Y + 4].copy_from_slice(&3.0f32.to_le_bytes());
        buf[xplane9::OFFSET_Q..xplane9::OFFSET_Q + 4].copy_from_slice(&0.1f32.to_le_bytes());
        buf[xplane9::OFFSET_P..xplane9::OFFSET_P + 4].copy_from_slice(&0.2f32.to_le_bytes());
        buf[xplane9::OFFSET_R..xplane9::OFFSET_R + 4].copy_from_slice(&0.3f32.to_le_bytes());
        buf[xplane9::OFFSET_THETA..xplane9::OFFSET_THETA + 4].copy_from_slice(&10.0f32.to_le_bytes());
        buf[xplane9::OFFSET_PHI..xplane9::OFFSET_PHI + 4].copy_from_slice(&20.0f32.to_le_bytes());
        buf[xplane9::OFFSET_PSI..xplane9::OFFSET_PSI + 4].copy_from_slice(&30.0f32.to_le_bytes());
        buf
    }

    #[test]
    fn wrong_length_packet_is_dropped() {
        assert!(decode_xplane9(&[0u8; 10]).is_none());
    }

    #[test]
    fn decodes_specific_force_in_g_to_si_and_reassembles_xyz_order() {
        let packet = sample_packet();
        let decoded = decode_xplane9(&packet).unwrap();
        assert!((decoded.specific_force.x - 2.0 * GRAVITY).abs() < 1e-6);
        assert!((decoded.specific_force.y - 3.0 * GRAVITY).abs() < 1e-6);
        assert!((decoded.specific_force.z - 1.0 * GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn decodes_angular_rate_without_unit_conversion() {
        let packet = sample_packet();
        let decoded = decode_xplane9(&packet).unwrap();
        assert!((decoded.angular_rate.x - 0.2).abs() < 1e-6);
        assert!((decoded.angular_rate.y - 0.1).abs() < 1e-6);
        assert!((decoded.angular_rate.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn decodes_euler_angles_degrees_to_radians() {
        let packet = sample_packet();
        let decoded = decode_xplane9(&packet).unwrap();
        assert!((decoded.attitude.x - 20.0 * DEG_TO_RAD).abs() < 1e-6);
        assert!((decoded.attitude.y - 10.0 * DEG_TO_RAD).abs() < 1e-6);
        assert!((decoded.attitude.z - 30.0 * DEG_TO_RAD).abs() < 1e-6);
    }

    #[test]
    fn reingesting_same_datagram_is_bit_identical() {
        let packet = sample_packet();
        let a = decode_xplane9(&packet).unwrap();
        let b = decode_xplane9(&packet).unwrap();
        assert_eq!(a, b);
    }
}
