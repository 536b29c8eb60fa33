//! SEP Pool: the fixed set of local Stream End Points and their AVDTP
//! state, generalized from one fixed source into a pool of sources and
//! sinks.

use bt_classic::avdtp::{SbcCapability, SepType};

use crate::ids::{SepHandle, SessionId, StreamId, TimerToken};

/// Per-SEP AVDTP state, as named in the data model (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SepState {
    #[default]
    Idle,
    Configured,
    Open,
    Streaming,
    Closing,
    Aborting,
}

/// A single local Stream Endpoint and its live session/stream binding.
#[derive(Debug, Clone)]
pub struct Sep {
    pub handle: SepHandle,
    pub role: SepType,
    pub state: SepState,
    pub session: Option<SessionId>,
    pub stream: Option<StreamId>,
    pub locked: bool,
    pub held_by: Option<SessionId>,
    pub suspending: bool,
    pub starting: bool,
    pub timer_token: Option<TimerToken>,
    pub local_capability: SbcCapability,
}

impl Sep {
    fn new(handle: SepHandle, role: SepType) -> Self {
        Self {
            handle,
            role,
            state: SepState::Idle,
            session: None,
            stream: None,
            locked: false,
            held_by: None,
            suspending: false,
            starting: false,
            timer_token: None,
            local_capability: SbcCapability::all(),
        }
    }

    /// Eligible for a new client request iff not locked, and either idle
    /// (no live stream) or already bound to the requesting session.
    pub fn eligible_for(&self, session: SessionId) -> bool {
        !self.locked && (self.stream.is_none() || self.session == Some(session))
    }
}

/// The fixed pool of local SEPs, indexed by handle.
#[derive(Debug, Default)]
pub struct SepPool {
    seps: Vec<Sep>,
    next_handle: u32,
}

impl SepPool {
    pub fn new() -> Self {
        Self {
            seps: Vec::new(),
            next_handle: 1,
        }
    }

    /// Registers a new local SEP with the given role, assigning it a
    /// locally-generated handle. Used directly in tests; production code
    /// goes through [`SepPool::register_handle`] with the handle the
    /// AVDTP backend assigned.
    pub fn register(&mut self, role: SepType) -> SepHandle {
        let handle = SepHandle(self.next_handle);
        self.next_handle += 1;
        self.seps.push(Sep::new(handle, role));
        handle
    }

    /// Registers a SEP under a handle the AVDTP backend already assigned.
    pub fn register_handle(&mut self, handle: SepHandle, role: SepType) {
        self.seps.push(Sep::new(handle, role));
    }

    pub fn get(&self, handle: SepHandle) -> Option<&Sep> {
        self.seps.iter().find(|s| s.handle == handle)
    }

    pub fn get_mut(&mut self, handle: SepHandle) -> Option<&mut Sep> {
        self.seps.iter_mut().find(|s| s.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sep> {
        self.seps.iter()
    }

    /// Scans the SEPs of `role`, returning the first eligible for `session`
    /// per [`Sep::eligible_for`]. `None` if none are eligible.
    pub fn find_eligible(&self, role: SepType, session: SessionId) -> Option<SepHandle> {
        self.seps
            .iter()
            .find(|s| s.role == role && s.eligible_for(session))
            .map(|s| s.handle)
    }
}
