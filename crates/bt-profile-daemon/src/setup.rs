//! Stream Setup: the in-flight, client-visible record of a stream
//! request in progress against one AVDTP session.

use std::collections::HashMap;

use bt_classic::avdtp::SbcCapability;

use crate::error::DaemonError;
use crate::ids::{SepHandle, SessionId, StreamId};

/// What a Stream Setup's callbacks are eventually invoked with: the
/// stream it ended up bound to, or an error. Every callback fires
/// exactly once.
#[derive(Debug, Clone, Copy)]
pub struct StreamHandleInfo {
    pub session: SessionId,
    pub sep: SepHandle,
    pub stream: StreamId,
}

pub type StreamOutcome = Result<StreamHandleInfo, DaemonError>;

/// A client callback plus its cancellation id: a boxed closure that has
/// already captured whatever context it needs, rather than a function
/// pointer paired with an opaque `user_data` handle.
pub struct CallbackRecord {
    pub id: u64,
    pub callback: Box<dyn FnOnce(StreamOutcome) + Send>,
}

impl std::fmt::Debug for CallbackRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRecord").field("id", &self.id).finish()
    }
}

/// An in-flight setup attempt for one AVDTP session. At most one exists
/// per session at a time (enforced by the coordinator's setup table).
#[derive(Debug)]
pub struct StreamSetup {
    pub session: SessionId,
    pub target_sep: Option<SepHandle>,
    pub stream: Option<StreamId>,
    pub preferred_codec: Option<SbcCapability>,
    pub start: bool,
    pub canceled: bool,
    pub callbacks: Vec<CallbackRecord>,
}

impl StreamSetup {
    pub fn new(session: SessionId, target_sep: Option<SepHandle>, start: bool, preferred_codec: Option<SbcCapability>) -> Self {
        Self {
            session,
            target_sep,
            stream: None,
            preferred_codec,
            start,
            canceled: false,
            callbacks: Vec::new(),
        }
    }

    pub fn push_callback(&mut self, id: u64, callback: Box<dyn FnOnce(StreamOutcome) + Send>) {
        self.callbacks.push(CallbackRecord { id, callback });
    }

    /// Removes the callback with `id`. If none remain afterwards, marks
    /// the setup canceled and clears its target SEP — an in-flight AVDTP
    /// operation is never preempted; its eventual confirmation observes
    /// `canceled` and unwinds cleanly instead.
    pub fn cancel(&mut self, id: u64) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|c| c.id != id);
        let removed = self.callbacks.len() != before;
        if removed && self.callbacks.is_empty() {
            self.canceled = true;
            self.target_sep = None;
        }
        removed
    }

    /// Invokes every callback, in insertion order, with `outcome`.
    pub fn finalize(self, outcome: StreamOutcome) {
        for record in self.callbacks {
            (record.callback)(outcome.clone());
        }
    }
}

/// Session → in-flight Stream Setup.
pub type SetupTable = HashMap<SessionId, StreamSetup>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn cancel_last_callback_marks_canceled_and_clears_target() {
        let mut setup = StreamSetup::new(SessionId(1), Some(SepHandle(1)), true, None);
        setup.push_callback(1, Box::new(|_| {}));

        assert!(setup.cancel(1));
        assert!(setup.canceled);
        assert!(setup.target_sep.is_none());
    }

    #[test]
    fn cancel_unknown_id_is_noop() {
        let mut setup = StreamSetup::new(SessionId(1), Some(SepHandle(1)), true, None);
        setup.push_callback(1, Box::new(|_| {}));
        assert!(!setup.cancel(99));
        assert!(!setup.canceled);
    }

    #[test]
    fn finalize_invokes_callbacks_in_insertion_order() {
        let mut setup = StreamSetup::new(SessionId(1), Some(SepHandle(1)), true, None);
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in [1, 2, 3] {
            let order = order.clone();
            setup.push_callback(id, Box::new(move |_| order.lock().unwrap().push(id)));
        }

        setup.finalize(Ok(StreamHandleInfo {
            session: SessionId(1),
            sep: SepHandle(1),
            stream: StreamId(1),
        }));

        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }
}
