//! Random local port allocation
//!
//! Candidate ports are drawn from the unprivileged range and verified by a
//! throwaway bind on the loopback interface. The listener is dropped right
//! away, so another process can still grab the port before we do; the later
//! bind failure surfaces through the tunnel instead.

use std::net::TcpListener;

use portside_core::error::SessionError;
use rand::Rng;

const PORT_RANGE_START: u16 = 1024;
const MAX_TRIES: u32 = 10;

/// Pick a random free port on 127.0.0.1.
pub fn allocate() -> Result<u16, SessionError> {
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_TRIES {
        let port: u16 = rng.gen_range(PORT_RANGE_START..=u16::MAX);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                drop(listener);
                return Ok(port);
            }
            Err(_) => {
                tracing::info!("port taken: {}", port);
            }
        }
    }
    Err(SessionError::PortExhausted { tries: MAX_TRIES })
}
