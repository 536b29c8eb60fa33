//! `bt-profile-daemon` binary entry point: loads configuration, wires
//! the daemon context to a backend, and runs the idle-suspend timer
//! loop until shut down.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use bt_classic::avdtp::{SbcCapability, SepType};
use bt_classic::BdAddr;

use bt_profile_daemon::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use bt_profile_daemon::ids::{L2capHandle, RemoteSeid, SdpRecordId, SepHandle, SessionId, StreamId};
use bt_profile_daemon::runtime;
use bt_profile_daemon::{Daemon, DaemonConfig};

/// Stands in for the real AVDTP signalling library (`register_sep`,
/// `discover`, `set_configuration`, ...) until one is wired in. Every
/// operation just logs; the daemon is otherwise fully functional and
/// testable against the fakes in its own unit tests.
#[derive(Default)]
struct PlaceholderAvdtp {
    next_handle: u32,
}

impl AvdtpBackend for PlaceholderAvdtp {
    fn register_sep(&mut self, role: SepType) -> SepHandle {
        self.next_handle += 1;
        tracing::info!(?role, handle = self.next_handle, "register_sep (placeholder)");
        SepHandle(self.next_handle)
    }
    fn unregister_sep(&mut self, sep: SepHandle) {
        tracing::info!(?sep, "unregister_sep (placeholder)");
    }
    fn discover(&mut self, session: SessionId) {
        tracing::info!(?session, "discover (placeholder, no transport)");
    }
    fn set_configuration(&mut self, session: SessionId, sep: SepHandle, remote_seid: RemoteSeid, caps: SbcCapability) {
        tracing::info!(?session, ?sep, ?remote_seid, ?caps, "set_configuration (placeholder)");
    }
    fn open(&mut self, session: SessionId, stream: StreamId) {
        tracing::info!(?session, ?stream, "open (placeholder)");
    }
    fn start(&mut self, session: SessionId, stream: StreamId) {
        tracing::info!(?session, ?stream, "start (placeholder)");
    }
    fn suspend(&mut self, session: SessionId, stream: StreamId) {
        tracing::info!(?session, ?stream, "suspend (placeholder)");
    }
    fn close(&mut self, session: SessionId, stream: StreamId) {
        tracing::info!(?session, ?stream, "close (placeholder)");
    }
    fn abort(&mut self, session: SessionId, stream: StreamId) {
        tracing::info!(?session, ?stream, "abort (placeholder)");
    }
    fn stream_matches_capability(&self, _stream: StreamId, _cap: &SbcCapability) -> bool {
        true
    }
    fn session_ref(&mut self, session: SessionId) {
        tracing::debug!(?session, "session_ref (placeholder)");
    }
    fn session_unref(&mut self, session: SessionId) {
        tracing::debug!(?session, "session_unref (placeholder)");
    }
}

/// Stands in for the platform L2CAP transport used by the HID connector.
#[derive(Default)]
struct PlaceholderL2cap {
    next_handle: u64,
}

impl L2capBackend for PlaceholderL2cap {
    fn connect(&mut self, addr: BdAddr, psm: u16) -> L2capHandle {
        self.next_handle += 1;
        tracing::info!(?addr, psm, handle = self.next_handle, "l2cap connect (placeholder)");
        L2capHandle(self.next_handle)
    }
    fn shutdown(&mut self, handle: L2capHandle) {
        tracing::info!(?handle, "l2cap shutdown (placeholder)");
    }
}

/// Stands in for the platform SDP server.
#[derive(Default)]
struct PlaceholderSdp {
    next_id: u32,
}

impl SdpPublisher for PlaceholderSdp {
    fn publish(&mut self, record: &[u8]) -> SdpRecordId {
        self.next_id += 1;
        tracing::info!(bytes = record.len(), id = self.next_id, "sdp publish (placeholder)");
        SdpRecordId(self.next_id)
    }
    fn unpublish(&mut self, id: SdpRecordId) {
        tracing::info!(?id, "sdp unpublish (placeholder)");
    }
}

/// Stands in for UHID kernel delivery of inbound HID interrupt reports.
#[derive(Default)]
struct PlaceholderInjector;

impl HidReportInjector for PlaceholderInjector {
    fn inject(&mut self, addr: BdAddr, report: &[u8]) {
        tracing::debug!(?addr, bytes = report.len(), "hid report inject (placeholder)");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::init_tracing()?;

    let config = DaemonConfig::default();
    let mut daemon = Daemon::new(
        config,
        PlaceholderAvdtp::default(),
        PlaceholderL2cap::default(),
        PlaceholderSdp::default(),
        PlaceholderInjector,
    )?;
    daemon.init();

    let daemon = Arc::new(Mutex::new(daemon));
    let (tx, rx) = mpsc::channel(32);

    tracing::info!("bt-profile-daemon started");
    runtime::run_timer_loop(daemon, rx, tx).await;
    Ok(())
}
