//! SEP State Driver: reacts to AVDTP indication/confirmation callbacks,
//! advances per-SEP state, and arms/disarms the idle-suspend timer.
//!
//! The AVDTP indication/confirmation structures are, in the reference
//! implementation, function-pointer tables; here they are tagged unions
//! (`Indication`, `Confirmation`) dispatched through one handler method
//! per direction, and the driver is a pure function from
//! `(SEP state, message) -> (next state, side effects)`.

use bt_classic::avdtp::{ErrorCode, SbcCapability, ServiceCategory};

use crate::backend::{AvdtpBackend, HidReportInjector, L2capBackend, SdpPublisher};
use crate::context::{Daemon, TimerAction};
use crate::ids::{RemoteSeid, SepHandle, SessionId, StreamId, TimerToken};
use crate::sep::SepState;
use crate::setup::StreamHandleInfo;

/// A message the remote peer sent us, requesting we accept or reject it.
#[derive(Debug, Clone, Copy)]
pub enum Indication {
    GetCapability {
        sep: SepHandle,
    },
    SetConfiguration {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        caps: SbcCapability,
    },
    GetConfiguration {
        sep: SepHandle,
    },
    Open {
        sep: SepHandle,
    },
    Start {
        session: SessionId,
        sep: SepHandle,
    },
    Suspend {
        sep: SepHandle,
    },
    Close {
        sep: SepHandle,
    },
    Abort {
        sep: SepHandle,
    },
    Reconfigure {
        sep: SepHandle,
    },
}

/// The driver's reply to an [`Indication`].
#[derive(Debug, Clone, Copy)]
pub enum IndicationResult {
    Accept,
    AcceptWithCapability(SbcCapability),
    Reject(ErrorCode, ServiceCategory),
}

/// A reply to an operation this daemon issued.
#[derive(Debug, Clone, Copy)]
pub enum Confirmation {
    Discover {
        session: SessionId,
        sep: SepHandle,
        result: Result<(RemoteSeid, SbcCapability), ErrorCode>,
    },
    SetConfiguration {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Open {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Start {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Suspend {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Close {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Reconfigure {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
    Abort {
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    },
}

impl<B, L, P, R> Daemon<B, L, P, R>
where
    B: AvdtpBackend,
    L: L2capBackend,
    P: SdpPublisher,
    R: HidReportInjector,
{
    /// Handles a peer-initiated AVDTP indication.
    pub fn handle_indication(&mut self, ind: Indication) -> IndicationResult {
        match ind {
            Indication::GetCapability { sep } => match self.seps.get(sep) {
                Some(s) => IndicationResult::AcceptWithCapability(s.local_capability),
                None => IndicationResult::Reject(ErrorCode::BadAcpSeid, ServiceCategory::MediaCodec),
            },
            Indication::SetConfiguration {
                session,
                sep,
                stream,
                caps,
            } => {
                if !caps.has_valid_bitpool_range() {
                    return IndicationResult::Reject(
                        ErrorCode::UnsupportedConfiguration,
                        ServiceCategory::MediaCodec,
                    );
                }
                self.record_configured_stream(sep, session, stream);
                IndicationResult::Accept
            }
            Indication::GetConfiguration { .. }
            | Indication::Open { .. }
            | Indication::Suspend { .. }
            | Indication::Close { .. }
            | Indication::Reconfigure { .. } => IndicationResult::Accept,
            Indication::Start { session, sep } => {
                self.backend.session_ref(session);
                self.arm_idle_timer(sep);
                IndicationResult::Accept
            }
            Indication::Abort { sep } => {
                if let Some(s) = self.seps.get_mut(sep) {
                    s.stream = None;
                    s.state = SepState::Idle;
                }
                IndicationResult::Accept
            }
        }
    }

    /// Handles the reply to an operation this daemon issued.
    pub fn handle_confirmation(&mut self, cfm: Confirmation) {
        match cfm {
            Confirmation::Discover { session, sep, result } => self.on_discover_cfm(session, sep, result),
            Confirmation::SetConfiguration {
                session,
                sep,
                stream,
                result,
            } => self.on_set_configuration_cfm(session, sep, stream, result),
            Confirmation::Open {
                session,
                sep,
                stream,
                result,
            } => self.on_open_or_reconfigure_cfm(session, sep, stream, result),
            Confirmation::Start {
                session,
                sep,
                stream,
                result,
            } => self.on_start_cfm(session, sep, stream, result),
            Confirmation::Suspend {
                session,
                sep,
                stream,
                result,
            } => self.on_suspend_cfm(session, sep, stream, result),
            Confirmation::Close {
                session,
                sep,
                stream,
                result,
            } => self.on_close_cfm(session, sep, stream, result),
            Confirmation::Reconfigure {
                session,
                sep,
                stream,
                result,
            } => self.on_open_or_reconfigure_cfm(session, sep, stream, result),
            Confirmation::Abort { .. } => {
                tracing::debug!("abort confirmed");
            }
        }
    }

    fn on_discover_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        result: Result<(RemoteSeid, SbcCapability), ErrorCode>,
    ) {
        match result {
            Err(code) => self.finalize_setup(
                session,
                Err(signalling_error(code, ServiceCategory::MediaTransport)),
            ),
            Ok((remote_seid, remote_caps)) => {
                let local = match self.seps.get(sep) {
                    Some(s) => s.local_capability,
                    None => return,
                };
                match crate::codec::select_sbc_config(&local, &remote_caps) {
                    Ok(chosen) => self.backend.set_configuration(session, sep, remote_seid, chosen),
                    Err(err) => self.finalize_setup(session, Err(err)),
                }
            }
        }
    }

    fn on_set_configuration_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    ) {
        match result {
            Err(code) => self.finalize_setup(
                session,
                Err(signalling_error(code, ServiceCategory::MediaCodec)),
            ),
            Ok(()) => {
                self.record_configured_stream(sep, session, stream);
                self.backend.open(session, stream);
            }
        }
    }

    fn on_open_or_reconfigure_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    ) {
        let canceled = self.setups.get(&session).map(|s| s.canceled).unwrap_or(false);
        if canceled {
            self.backend.close(session, stream);
            self.setups.remove(&session);
            return;
        }
        match result {
            Err(code) => self.finalize_setup(
                session,
                Err(signalling_error(code, ServiceCategory::MediaTransport)),
            ),
            Ok(()) => {
                if let Some(s) = self.seps.get_mut(sep) {
                    s.state = SepState::Open;
                }
                let start = self.setups.get(&session).map(|s| s.start).unwrap_or(false);
                if start {
                    self.issue_start(session, sep, stream);
                } else {
                    self.finalize_setup(session, Ok(StreamHandleInfo { session, sep, stream }));
                }
            }
        }
    }

    fn on_start_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    ) {
        if let Some(s) = self.seps.get_mut(sep) {
            s.starting = false;
        }
        let canceled = self.setups.get(&session).map(|s| s.canceled).unwrap_or(false);
        if canceled {
            self.backend.close(session, stream);
            self.setups.remove(&session);
            return;
        }
        if result.is_ok() {
            if let Some(s) = self.seps.get_mut(sep) {
                s.state = SepState::Streaming;
            }
        }
        self.finalize_setup(
            session,
            result
                .map(|_| StreamHandleInfo { session, sep, stream })
                .map_err(|code| signalling_error(code, ServiceCategory::MediaTransport)),
        );
    }

    fn on_suspend_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    ) {
        if let Some(s) = self.seps.get_mut(sep) {
            s.suspending = false;
        }

        let Some(setup) = self.setups.get(&session) else { return };
        if setup.canceled {
            self.setups.remove(&session);
            return;
        }
        let start = setup.start;
        match result {
            Err(code) => self.finalize_setup(
                session,
                Err(signalling_error(code, ServiceCategory::MediaTransport)),
            ),
            Ok(()) if start => self.issue_start(session, sep, stream),
            Ok(()) => self.finalize_setup(session, Ok(StreamHandleInfo { session, sep, stream })),
        }
    }

    fn on_close_cfm(
        &mut self,
        session: SessionId,
        sep: SepHandle,
        stream: StreamId,
        result: Result<(), ErrorCode>,
    ) {
        let canceled = self.setups.get(&session).map(|s| s.canceled).unwrap_or(false);
        if canceled {
            self.setups.remove(&session);
            return;
        }
        let start = self.setups.get(&session).map(|s| s.start).unwrap_or(false);
        if start {
            self.backend.discover(session);
        } else {
            self.finalize_setup(
                session,
                result
                    .map(|_| StreamHandleInfo { session, sep, stream })
                    .map_err(|code| signalling_error(code, ServiceCategory::MediaTransport)),
            );
        }
    }

    fn record_configured_stream(&mut self, sep: SepHandle, session: SessionId, stream: StreamId) {
        let role = match self.seps.get(sep) {
            Some(s) => s.role,
            None => return,
        };
        if let Some(s) = self.seps.get_mut(sep) {
            s.session = Some(session);
            s.stream = Some(stream);
            s.state = SepState::Configured;
        }
        if role == bt_classic::avdtp::SepType::Source {
            self.backend.notify_inbound_stream(session, sep);
        }
    }

    /// Issues `start` for `stream`, guarding against re-issuing it while a
    /// prior `start` on the same SEP is still awaiting its confirmation.
    pub(crate) fn issue_start(&mut self, session: SessionId, sep: SepHandle, stream: StreamId) {
        match self.seps.get_mut(sep) {
            Some(s) if !s.starting => {
                s.starting = true;
                self.backend.start(session, stream);
            }
            _ => {}
        }
    }

    pub(crate) fn arm_idle_timer(&mut self, sep: SepHandle) {
        let token = TimerToken(self.next_timer_token);
        self.next_timer_token += 1;
        if let Some(s) = self.seps.get_mut(sep) {
            s.timer_token = Some(token);
        }
        self.pending_timer_actions.push_back(TimerAction::Arm {
            sep,
            token,
            timeout: self.config.idle_suspend_timeout,
        });
    }

    pub(crate) fn disarm_idle_timer(&mut self, sep: SepHandle) {
        let had_timer = self
            .seps
            .get_mut(sep)
            .map(|s| s.timer_token.take().is_some())
            .unwrap_or(false);
        if had_timer {
            self.pending_timer_actions.push_back(TimerAction::Disarm { sep });
        }
    }

    /// The idle-suspend timer fired. Takes effect only if `token` still
    /// matches the SEP's armed token — guards against a timer that fired
    /// concurrently with the SEP being disarmed for another reason.
    pub fn on_suspend_timeout(&mut self, sep: SepHandle, token: TimerToken) {
        let Some(s) = self.seps.get_mut(sep) else { return };
        if s.timer_token != Some(token) {
            return;
        }
        s.timer_token = None;
        s.suspending = true;
        if let (Some(session), Some(stream)) = (s.session, s.stream) {
            self.backend.suspend(session, stream);
            self.backend.session_unref(session);
        }
    }

    /// The live AVDTP stream state for `sep` transitioned. Only the
    /// transition to IDLE is acted on; everything else is observational.
    pub fn on_stream_state_changed(&mut self, sep: SepHandle, new: SepState) {
        if new != SepState::Idle {
            return;
        }
        self.disarm_idle_timer(sep);
        if let Some(s) = self.seps.get_mut(sep) {
            if let Some(session) = s.session.take() {
                self.backend.session_unref(session);
            }
            s.stream = None;
            s.state = SepState::Idle;
        }
    }

    /// Finalizes the Stream Setup for `session` with `outcome`: removes
    /// it from the setup table and, unless it was canceled, invokes its
    /// callbacks. A canceled setup's in-flight result is discarded.
    pub(crate) fn finalize_setup(
        &mut self,
        session: SessionId,
        outcome: crate::setup::StreamOutcome,
    ) {
        if let Some(setup) = self.setups.remove(&session) {
            if !setup.canceled {
                setup.finalize(outcome);
            }
        }
    }
}

fn signalling_error(code: ErrorCode, category: ServiceCategory) -> crate::error::DaemonError {
    crate::error::DaemonError::AvdtpSignalling { code, category }
}
