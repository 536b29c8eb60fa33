//! External collaborator traits: the AVDTP signalling library and the
//! L2CAP transport this daemon drives, and the SDP publisher it hands
//! built records to. Modeled as plain generic trait bounds — not `dyn`
//! objects — so the coordinator and connector are testable against
//! in-memory fakes without paying for dynamic dispatch.

use bt_classic::avdtp::SbcCapability;
use bt_classic::BdAddr;

use crate::ids::{L2capHandle, RemoteSeid, SdpRecordId, SepHandle, SessionId, StreamId};

/// The AVDTP signalling library's consumed API (§6): operations the
/// daemon issues. Results and peer-initiated indications arrive back
/// through the `Daemon::on_*` methods in [`crate::driver`], not through
/// this trait.
pub trait AvdtpBackend {
    fn register_sep(&mut self, role: bt_classic::avdtp::SepType) -> SepHandle;
    fn unregister_sep(&mut self, sep: SepHandle);

    fn discover(&mut self, session: SessionId);
    fn set_configuration(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        remote_seid: RemoteSeid,
        caps: SbcCapability,
    );
    fn open(&mut self, session: SessionId, stream: StreamId);
    fn start(&mut self, session: SessionId, stream: StreamId);
    fn suspend(&mut self, session: SessionId, stream: StreamId);
    fn close(&mut self, session: SessionId, stream: StreamId);
    fn abort(&mut self, session: SessionId, stream: StreamId);

    /// Whether `stream`'s live configuration already satisfies `cap` —
    /// used when a client's preferred codec doesn't match an already-OPEN
    /// stream, to decide whether a reconfigure round-trip is needed.
    fn stream_matches_capability(&self, stream: StreamId, cap: &SbcCapability) -> bool;

    fn session_ref(&mut self, session: SessionId);
    fn session_unref(&mut self, session: SessionId);

    /// Notifies the sink-consumer side of a newly configured inbound
    /// stream when this daemon's SEP is acting as SOURCE. A no-op by
    /// default since not every deployment has a local consumer to wake.
    fn notify_inbound_stream(&mut self, _session: SessionId, _sep: SepHandle) {}
}

/// The L2CAP transport this daemon drives for HID channels (§4.5, §6).
/// Connection results and channel events are delivered back through
/// `Daemon::on_*` methods in [`crate::hid`].
pub trait L2capBackend {
    fn connect(&mut self, addr: BdAddr, psm: u16) -> L2capHandle;
    fn shutdown(&mut self, handle: L2capHandle);
}

/// Hands a built SDP Data Element record to the platform's SDP server.
/// The PDU-level request/response protocol is an external collaborator —
/// this daemon only builds records and publishes/unpublishes them.
pub trait SdpPublisher {
    fn publish(&mut self, record: &[u8]) -> SdpRecordId;
    fn unpublish(&mut self, id: SdpRecordId);
}

/// Delivers inbound HID interrupt-channel reports to whatever consumes
/// them (stubbed: UHID kernel delivery is out of scope, §1).
pub trait HidReportInjector {
    fn inject(&mut self, addr: BdAddr, report: &[u8]);
}
