//! Session Coordinator: the entry points exposed to audio clients.
//! Chooses an eligible SEP, attaches to or creates a Stream Setup, and
//! kicks the SEP State Driver, generalized from one fixed connection to
//! a pool of concurrent sessions.

use bt_classic::avdtp::{SbcCapability, SepType};

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::context::Daemon;
use crate::error::DaemonError;
use crate::ids::{SepHandle, SessionId};
use crate::sep::SepState;
use crate::setup::{StreamHandleInfo, StreamOutcome, StreamSetup};

impl<B, L, P, R> Daemon<B, L, P, R>
where
    B: AvdtpBackend,
    L: L2capBackend,
    P: SdpPublisher,
    R: HidReportInjector,
{
    /// Requests a stream against `role`'s SEP pool for `session`.
    /// Returns a non-zero request id on success, `0` if no SEP is
    /// eligible.
    pub fn request_stream(
        &mut self,
        session: SessionId,
        role: SepType,
        start: bool,
        media_codec: Option<SbcCapability>,
        callback: Box<dyn FnOnce(StreamOutcome) + Send>,
    ) -> u64 {
        let Some(sep) = self.seps.find_eligible(role, session) else {
            return 0;
        };
        let id = self.next_id();

        if self.setups.contains_key(&session) {
            let setup = self.setups.get_mut(&session).unwrap();
            setup.canceled = false;
            setup.target_sep = Some(sep);
            setup.start |= start;
            if media_codec.is_some() {
                setup.preferred_codec = media_codec;
            }
            setup.push_callback(id, callback);
            return id;
        }

        let mut setup = StreamSetup::new(session, Some(sep), start, media_codec);
        setup.push_callback(id, callback);
        self.setups.insert(session, setup);
        self.dispatch_new_setup(session, sep);
        id
    }

    fn dispatch_new_setup(&mut self, session: SessionId, sep: SepHandle) {
        let (state, stream, sep_role) = match self.seps.get(sep) {
            Some(s) => (s.state, s.stream, s.role),
            None => return,
        };
        let _ = sep_role;

        match state {
            SepState::Idle => self.backend.discover(session),
            SepState::Open => {
                let (start, preferred) = self
                    .setups
                    .get(&session)
                    .map(|s| (s.start, s.preferred_codec))
                    .unwrap_or((false, None));
                let Some(stream) = stream else { return };
                if !start {
                    self.pending_idle.push_back(session);
                } else if let Some(preferred) = preferred {
                    if self.backend.stream_matches_capability(stream, &preferred) {
                        self.issue_start(session, sep, stream);
                    } else {
                        self.backend.close(session, stream);
                    }
                } else {
                    self.issue_start(session, sep, stream);
                }
            }
            SepState::Streaming => {
                let start = self.setups.get(&session).map(|s| s.start).unwrap_or(false);
                let suspending = self.seps.get(sep).map(|s| s.suspending).unwrap_or(false);
                if !start || suspending {
                    self.pending_idle.push_back(session);
                } else if let Some(stream) = stream {
                    self.disarm_idle_timer(sep);
                    self.finalize_setup(session, Ok(StreamHandleInfo { session, sep, stream }));
                }
            }
            SepState::Configured | SepState::Closing | SepState::Aborting => {
                self.finalize_setup(
                    session,
                    Err(DaemonError::InvalidState(
                        "SEP is mid-transition and cannot accept a new stream request",
                    )),
                );
            }
        }
    }

    /// Finds the setup for `session`, removes the callback with `id`.
    /// Returns `false` if the session or id is unknown.
    pub fn cancel_stream(&mut self, session: SessionId, id: u64) -> bool {
        match self.setups.get_mut(&session) {
            Some(setup) => setup.cancel(id),
            None => false,
        }
    }

    /// Takes exclusive hold of `sep` for `session`. Fails if already locked.
    pub fn lock(&mut self, sep: SepHandle, session: SessionId) -> bool {
        match self.seps.get_mut(sep) {
            Some(s) if !s.locked => {
                s.locked = true;
                s.held_by = Some(session);
                true
            }
            _ => false,
        }
    }

    /// Releases `sep`'s exclusive hold. STREAMING SEPs are suspended;
    /// OPEN SEPs get their idle-suspend timer armed; IDLE SEPs are
    /// untouched.
    pub fn unlock(&mut self, sep: SepHandle, session: SessionId) {
        let Some(s) = self.seps.get_mut(sep) else { return };
        if s.held_by != Some(session) {
            return;
        }
        s.locked = false;
        s.held_by = None;
        let (state, stream) = (s.state, s.stream);

        match state {
            SepState::Streaming => {
                if let Some(stream) = stream {
                    if let Some(s) = self.seps.get_mut(sep) {
                        s.suspending = true;
                    }
                    self.backend.suspend(session, stream);
                }
            }
            SepState::Open => self.arm_idle_timer(sep),
            _ => {}
        }
    }

    /// Starts `sep`'s stream directly (not through a Stream Setup).
    /// Idempotent if already STREAMING.
    pub fn start_stream(&mut self, sep: SepHandle, session: SessionId) -> bool {
        let Some(s) = self.seps.get(sep) else { return false };
        if s.session != Some(session) {
            return false;
        }
        match (s.state, s.stream) {
            (SepState::Streaming, _) => true,
            (SepState::Open, Some(stream)) => {
                self.issue_start(session, sep, stream);
                true
            }
            _ => false,
        }
    }

    /// Suspends `sep`'s stream directly. Idempotent if not STREAMING.
    pub fn suspend_stream(&mut self, sep: SepHandle, session: SessionId) -> bool {
        let Some(s) = self.seps.get(sep) else { return false };
        if s.session != Some(session) {
            return false;
        }
        match (s.state, s.stream) {
            (SepState::Streaming, Some(stream)) => {
                if let Some(s) = self.seps.get_mut(sep) {
                    s.suspending = true;
                }
                self.backend.suspend(session, stream);
                true
            }
            (SepState::Streaming, None) => false,
            _ => true,
        }
    }

    /// Called by the event loop once per idle tick: finalizes every
    /// setup queued by [`Self::dispatch_new_setup`] with the SEP's
    /// current stream, the glib `g_idle_add` equivalent for "nothing
    /// further to do, report success now".
    pub fn drain_idle(&mut self) {
        let queued: Vec<SessionId> = self.pending_idle.drain(..).collect();
        for session in queued {
            let Some((sep, start)) = self
                .setups
                .get(&session)
                .and_then(|s| s.target_sep.map(|sep| (sep, s.start)))
            else {
                continue;
            };
            let Some(stream) = self.seps.get(sep).and_then(|s| s.stream) else {
                continue;
            };
            // `start` is re-read here, not captured when the idle tick was
            // queued: a second `request_stream(start=true)` stacked onto the
            // same setup before the tick fires must still trigger `start`
            // rather than finalize the SEP merely OPEN.
            if start {
                self.issue_start(session, sep, stream);
            } else {
                self.finalize_setup(session, Ok(StreamHandleInfo { session, sep, stream }));
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bt_classic::avdtp::SepType;

    use crate::context::TimerAction;
    use crate::fakes::{daemon_with, AvdtpCall};
    use crate::ids::{SepHandle, SessionId, StreamId};
    use crate::sep::SepState;

    #[test]
    fn request_stream_with_no_eligible_sep_returns_zero() {
        let mut d = crate::fakes::daemon();
        assert_eq!(
            d.request_stream(SessionId(1), SepType::Source, true, None, Box::new(|_| {})),
            0
        );
    }

    #[test]
    fn cancel_stream_removes_matching_callback_and_rejects_unknown() {
        let mut d = crate::fakes::daemon();
        d.seps.register_handle(SepHandle(1), SepType::Source);
        let id = d.request_stream(SessionId(1), SepType::Source, true, None, Box::new(|_| {}));

        assert!(!d.cancel_stream(SessionId(1), id + 1));
        assert!(d.cancel_stream(SessionId(1), id));
        assert!(d.setups.get(&SessionId(1)).unwrap().canceled);
    }

    #[test]
    fn lock_then_unlock_on_idle_sep_is_a_noop() {
        let mut d = crate::fakes::daemon();
        let sep = d.seps.register(SepType::Source);
        let session = SessionId(1);

        assert!(d.lock(sep, session));
        d.unlock(sep, session);

        assert!(!d.seps.get(sep).unwrap().locked);
        assert!(d.drain_timer_actions().is_empty());
    }

    #[test]
    fn lock_fails_when_already_held() {
        let mut d = crate::fakes::daemon();
        let sep = d.seps.register(SepType::Source);

        assert!(d.lock(sep, SessionId(1)));
        assert!(!d.lock(sep, SessionId(2)));
    }

    #[test]
    fn unlock_on_streaming_sep_suspends_and_marks_suspending() {
        let (mut d, avdtp) = daemon_with(crate::config::DaemonConfig::default());
        let sep = SepHandle(1);
        d.seps.register_handle(sep, SepType::Source);
        let session = SessionId(1);
        let stream = StreamId(1);
        {
            let s = d.seps.get_mut(sep).unwrap();
            s.session = Some(session);
            s.stream = Some(stream);
            s.state = SepState::Streaming;
        }
        d.lock(sep, session);

        d.unlock(sep, session);

        assert!(d.seps.get(sep).unwrap().suspending);
        assert_eq!(avdtp.calls(), vec![AvdtpCall::Suspend(session, stream)]);
    }

    #[test]
    fn unlock_on_open_sep_arms_idle_timer() {
        let mut d = crate::fakes::daemon();
        let sep = SepHandle(1);
        d.seps.register_handle(sep, SepType::Source);
        let session = SessionId(1);
        {
            let s = d.seps.get_mut(sep).unwrap();
            s.session = Some(session);
            s.stream = Some(StreamId(1));
            s.state = SepState::Open;
        }
        d.lock(sep, session);

        d.unlock(sep, session);

        assert!(matches!(
            d.drain_timer_actions().as_slice(),
            [TimerAction::Arm { sep: s, .. }] if *s == sep
        ));
    }

    #[test]
    fn start_stream_is_idempotent_once_streaming() {
        let mut d = crate::fakes::daemon();
        let sep = SepHandle(1);
        d.seps.register_handle(sep, SepType::Source);
        let session = SessionId(1);
        {
            let s = d.seps.get_mut(sep).unwrap();
            s.session = Some(session);
            s.stream = Some(StreamId(1));
            s.state = SepState::Streaming;
        }

        assert!(d.start_stream(sep, session));
    }

    #[test]
    fn suspend_stream_is_idempotent_when_not_streaming() {
        let mut d = crate::fakes::daemon();
        let sep = d.seps.register(SepType::Source);
        assert!(d.suspend_stream(sep, SessionId(1)));
    }

    #[test]
    fn stacked_requests_on_open_sep_finalize_in_order_and_second_triggers_start() {
        let (mut d, avdtp) = daemon_with(crate::config::DaemonConfig::default());
        let sep = SepHandle(1);
        d.seps.register_handle(sep, SepType::Source);
        let session = SessionId(1);
        let stream = StreamId(1);
        {
            let s = d.seps.get_mut(sep).unwrap();
            s.session = Some(session);
            s.stream = Some(stream);
            s.state = SepState::Open;
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let order1 = order.clone();
        d.request_stream(session, SepType::Source, false, None, Box::new(move |_| order1.lock().unwrap().push(1)));
        let order2 = order.clone();
        d.request_stream(session, SepType::Source, true, None, Box::new(move |_| order2.lock().unwrap().push(2)));

        d.drain_idle();
        assert_eq!(avdtp.calls(), vec![AvdtpCall::Start(session, stream)]);
        assert!(order.lock().unwrap().is_empty());

        d.handle_confirmation(crate::driver::Confirmation::Start {
            session,
            sep,
            stream,
            result: Ok(()),
        });
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }
}
