//! Daemon Context: owns the SEP pool, the setup table, and the HID
//! device table, and is the explicit "owning context" every entry point
//! operates on — no process-globals.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use bt_classic::avdtp::SepType;
use bt_classic::sdp::A2dpServiceRecord;
use bt_classic::BdAddr;

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::hid::HidDevice;
use crate::ids::{SdpRecordId, SepHandle, SessionId, TimerToken};
use crate::sep::SepPool;
use crate::setup::SetupTable;

/// A side effect the event loop must realise against a real clock: arm
/// or disarm the idle-suspend timer for a SEP. Queued rather than acted
/// on immediately so the pure coordinator/driver logic stays testable
/// without a real timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Arm {
        sep: SepHandle,
        token: TimerToken,
        timeout: Duration,
    },
    Disarm {
        sep: SepHandle,
    },
}

/// Owns every other piece of daemon state and is threaded through the
/// coordinator, driver, and HID connector as `&mut self`.
///
/// Generic over the three external collaborators (§6) rather than boxing
/// them as trait objects — callers provide a real backend in production
/// and an in-memory fake in tests.
pub struct Daemon<B, L, P, R> {
    pub(crate) config: DaemonConfig,
    pub(crate) seps: SepPool,
    pub(crate) setups: SetupTable,
    pub(crate) hid: HashMap<BdAddr, HidDevice>,
    pub(crate) next_request_id: u64,
    pub(crate) next_timer_token: u64,
    pub(crate) pending_idle: VecDeque<SessionId>,
    pub(crate) pending_timer_actions: VecDeque<TimerAction>,
    pub(crate) sdp_records: Vec<SdpRecordId>,
    pub backend: B,
    pub l2cap: L,
    pub sdp: P,
    pub injector: R,
}

impl<B, L, P, R> Daemon<B, L, P, R>
where
    B: AvdtpBackend,
    L: L2capBackend,
    P: SdpPublisher,
    R: HidReportInjector,
{
    pub fn new(config: DaemonConfig, backend: B, l2cap: L, sdp: P, injector: R) -> Result<Self, DaemonError> {
        config.validate()?;
        Ok(Self {
            config,
            seps: SepPool::new(),
            setups: SetupTable::new(),
            hid: HashMap::new(),
            next_request_id: 1,
            next_timer_token: 1,
            pending_idle: VecDeque::new(),
            pending_timer_actions: VecDeque::new(),
            sdp_records: Vec::new(),
            backend,
            l2cap,
            sdp,
            injector,
        })
    }

    /// Registers the configured source and sink SEPs with the AVDTP
    /// backend, then publishes the SDP records for whichever roles have
    /// at least one SEP (§4.4).
    pub fn init(&mut self) {
        for _ in 0..self.config.source_seps {
            let handle = self.backend.register_sep(SepType::Source);
            self.seps.register_handle(handle, SepType::Source);
        }
        for _ in 0..self.config.sink_seps {
            let handle = self.backend.register_sep(SepType::Sink);
            self.seps.register_handle(handle, SepType::Sink);
        }

        if self.config.source_seps > 0 {
            let mut record = A2dpServiceRecord::source(0);
            record.service_name = self.config.source_service_name;
            self.publish_record(&record);
        }
        if self.config.sink_seps > 0 {
            let mut record = A2dpServiceRecord::sink(0);
            record.service_name = self.config.sink_service_name;
            self.publish_record(&record);
        }
    }

    fn publish_record(&mut self, record: &A2dpServiceRecord) {
        let mut buf = [0u8; bt_classic::sdp::MAX_SDP_RECORD];
        let len = record.to_bytes(&mut buf);
        let id = self.sdp.publish(&buf[..len]);
        self.sdp_records.push(id);
        tracing::info!(service = record.service_name, "published SDP record");
    }

    /// Unregisters all SEPs and unpublishes all SDP records.
    pub fn shutdown(&mut self) {
        for sep in self.seps.iter() {
            self.backend.unregister_sep(sep.handle);
        }
        for id in self.sdp_records.drain(..) {
            self.sdp.unpublish(id);
        }
    }

    pub(crate) fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Drains and returns any pending idle-suspend timer arm/disarm
    /// requests accumulated since the last call, for the real event loop
    /// to realise against `tokio::time`.
    pub fn drain_timer_actions(&mut self) -> Vec<TimerAction> {
        self.pending_timer_actions.drain(..).collect()
    }
}
