//! MB reply receiver: the second background worker, decoding 40-byte reply
//! packets from the MB on the same socket the send-loop uses to transmit
//! commands (the MB replies to the sender's source port).

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use mcis_common::wire::DofReply;

use crate::error::SocketError;
use crate::session::MbReplyState;

pub struct MbReplyWorker {
    socket: UdpSocket,
    continue_operation: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MbReplyWorker {
    /// Spawns the reply-receive loop on a clone of `socket`. `socket` must
    /// already be connected or otherwise positioned to receive the MB's
    /// replies (it is the same socket the send-loop transmits commands on).
    pub fn spawn(socket: &UdpSocket, state: Arc<MbReplyState>) -> Result<Self, SocketError> {
        let worker_socket = socket.try_clone().map_err(SocketError::Create)?;
        let continue_operation = Arc::new(AtomicBool::new(true));
        let worker_flag = Arc::clone(&continue_operation);

        let handle = std::thread::Builder::new()
            .name("mcis-mb-reply".into())
            .spawn(move || receive_loop(worker_socket, worker_flag, state))
            .expect("failed to spawn MB reply receiver thread");

        Ok(MbReplyWorker {
            socket: socket.try_clone().map_err(SocketError::Create)?,
            continue_operation,
            handle: Some(handle),
        })
    }

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

impl Drop for MbReplyWorker {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn receive_loop(socket: UdpSocket, continue_operation: Arc<AtomicBool>, state: Arc<MbReplyState>) {
    let mut buf = [0u8; 64];
    while continue_operation.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, _src)) if len == 40 => {
                let packet: [u8; 40] = buf[..40].try_into().unwrap();
                let reply = DofReply::from_bytes(&packet);
                state.update(reply.machine_state_info, reply.decoded_state(), reply.latched_fault_data != 0);
            }
            Ok((len, _src)) => {
                tracing::debug!(len, "dropped MB reply with unexpected length");
            }
            Err(e) if !continue_operation.load(Ordering::Acquire) => {
                tracing::debug!(error = %e, "MB reply socket closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "MB reply recv failed");
            }
        }
    }
}
