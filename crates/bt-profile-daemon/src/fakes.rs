//! Shared in-memory fakes for the four backend traits, and a daemon
//! builder for wiring them up. Used by the coordinator, driver, and HID
//! connector test suites so their scenarios can assert on exactly which
//! AVDTP/L2CAP/SDP operations the daemon issued, in order.

#![cfg(test)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bt_classic::avdtp::{SbcCapability, SepType};
use bt_classic::BdAddr;

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::config::DaemonConfig;
use crate::context::Daemon;
use crate::ids::{L2capHandle, RemoteSeid, SdpRecordId, SepHandle, SessionId, StreamId};

/// One call the daemon issued against a fake backend, recorded in issue
/// order so scenario tests can assert on the full transcript rather than
/// poking at state alone.
#[derive(Debug, Clone, PartialEq)]
pub enum AvdtpCall {
    Discover(SessionId),
    SetConfiguration(SessionId, SepHandle, RemoteSeid, SbcCapability),
    Open(SessionId, StreamId),
    Start(SessionId, StreamId),
    Suspend(SessionId, StreamId),
    Close(SessionId, StreamId),
    Abort(SessionId, StreamId),
    SessionRef(SessionId),
    SessionUnref(SessionId),
}

#[derive(Clone)]
pub struct FakeAvdtp {
    calls: Rc<RefCell<Vec<AvdtpCall>>>,
    next_sep: Rc<RefCell<u32>>,
    matches_capability: Rc<RefCell<bool>>,
}

impl Default for FakeAvdtp {
    fn default() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            next_sep: Rc::new(RefCell::new(0)),
            matches_capability: Rc::new(RefCell::new(true)),
        }
    }
}

impl FakeAvdtp {
    pub fn calls(&self) -> Vec<AvdtpCall> {
        self.calls.borrow().clone()
    }

    /// Controls what [`AvdtpBackend::stream_matches_capability`] answers
    /// for every stream, default `true`.
    pub fn set_matches_capability(&self, matches: bool) {
        *self.matches_capability.borrow_mut() = matches;
    }
}

impl AvdtpBackend for FakeAvdtp {
    fn register_sep(&mut self, _role: SepType) -> SepHandle {
        let mut next = self.next_sep.borrow_mut();
        *next += 1;
        SepHandle(*next)
    }
    fn unregister_sep(&mut self, _sep: SepHandle) {}

    fn discover(&mut self, session: SessionId) {
        self.calls.borrow_mut().push(AvdtpCall::Discover(session));
    }
    fn set_configuration(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        remote_seid: RemoteSeid,
        caps: SbcCapability,
    ) {
        self.calls
            .borrow_mut()
            .push(AvdtpCall::SetConfiguration(session, sep, remote_seid, caps));
    }
    fn open(&mut self, session: SessionId, stream: StreamId) {
        self.calls.borrow_mut().push(AvdtpCall::Open(session, stream));
    }
    fn start(&mut self, session: SessionId, stream: StreamId) {
        self.calls.borrow_mut().push(AvdtpCall::Start(session, stream));
    }
    fn suspend(&mut self, session: SessionId, stream: StreamId) {
        self.calls.borrow_mut().push(AvdtpCall::Suspend(session, stream));
    }
    fn close(&mut self, session: SessionId, stream: StreamId) {
        self.calls.borrow_mut().push(AvdtpCall::Close(session, stream));
    }
    fn abort(&mut self, session: SessionId, stream: StreamId) {
        self.calls.borrow_mut().push(AvdtpCall::Abort(session, stream));
    }
    fn stream_matches_capability(&self, _stream: StreamId, _cap: &SbcCapability) -> bool {
        *self.matches_capability.borrow()
    }
    fn session_ref(&mut self, session: SessionId) {
        self.calls.borrow_mut().push(AvdtpCall::SessionRef(session));
    }
    fn session_unref(&mut self, session: SessionId) {
        self.calls.borrow_mut().push(AvdtpCall::SessionUnref(session));
    }
}

#[derive(Default, Clone)]
pub struct FakeL2cap {
    next: u64,
    log: Rc<RefCell<Vec<(&'static str, u16)>>>,
}
impl FakeL2cap {
    pub fn log(&self) -> Vec<(&'static str, u16)> {
        self.log.borrow().clone()
    }
}
impl L2capBackend for FakeL2cap {
    fn connect(&mut self, _addr: BdAddr, psm: u16) -> L2capHandle {
        self.next += 1;
        self.log.borrow_mut().push(("connect", psm));
        L2capHandle(self.next)
    }
    fn shutdown(&mut self, _handle: L2capHandle) {
        self.log.borrow_mut().push(("shutdown", 0));
    }
}

#[derive(Default, Clone)]
pub struct FakeSdp {
    next: Rc<RefCell<u32>>,
}
impl SdpPublisher for FakeSdp {
    fn publish(&mut self, _record: &[u8]) -> SdpRecordId {
        let mut next = self.next.borrow_mut();
        *next += 1;
        SdpRecordId(*next)
    }
    fn unpublish(&mut self, _id: SdpRecordId) {}
}

#[derive(Default, Clone)]
pub struct FakeInjector {
    received: Rc<RefCell<HashMap<BdAddr, Vec<u8>>>>,
}
impl FakeInjector {
    pub fn received(&self, addr: BdAddr) -> Option<Vec<u8>> {
        self.received.borrow().get(&addr).cloned()
    }
}
impl HidReportInjector for FakeInjector {
    fn inject(&mut self, addr: BdAddr, report: &[u8]) {
        self.received.borrow_mut().insert(addr, report.to_vec());
    }
}

pub type FakeDaemon = Daemon<FakeAvdtp, FakeL2cap, FakeSdp, FakeInjector>;

/// Builds a daemon over the default config and fresh fakes.
pub fn daemon() -> FakeDaemon {
    daemon_with(DaemonConfig::default()).0
}

/// Builds a daemon over `config` and fresh fakes, also returning a
/// handle to the AVDTP fake so tests can inspect its call transcript.
pub fn daemon_with(config: DaemonConfig) -> (FakeDaemon, FakeAvdtp) {
    let avdtp = FakeAvdtp::default();
    let d = Daemon::new(
        config,
        avdtp.clone(),
        FakeL2cap::default(),
        FakeSdp::default(),
        FakeInjector::default(),
    )
    .unwrap();
    (d, avdtp)
}
