//! Opaque handle types threaded through the daemon.
//!
//! The coordinator holds several aliases to one AVDTP session (inside a
//! SEP, inside a Stream Setup, inside an idle-suspend timer). Rather than
//! share ownership through `Rc`/`Arc`, sessions (and streams, SEPs, L2CAP
//! channels, timers, SDP records) are addressed by small `Copy` ids into
//! arenas the daemon owns outright — breaking the cyclic-reference shape
//! a pointer-based design would have.

/// Identifies an AVDTP session (one ACL-level signalling relationship
/// with a remote peer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Identifies a live AVDTP stream within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

/// Identifies a local Stream Endpoint registered with the AVDTP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SepHandle(pub u32);

/// A remote Stream Endpoint ID, as returned by `discover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteSeid(pub u8);

/// Generation token for the idle-suspend timer. Arming bumps the token;
/// a fired timer only takes effect if it still matches the SEP's stored
/// token, so a timer can be disarmed without cancelling a real clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Identifies an open (or opening) L2CAP channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct L2capHandle(pub u64);

/// Identifies a published SDP service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SdpRecordId(pub u32);
