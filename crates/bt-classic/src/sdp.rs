//! SDP (Service Discovery Protocol) record encoding.
//!
//! Builds A2DP service records as SDP Data Elements. Publishing a built
//! record with the platform's SDP server is outside this crate's scope —
//! see the daemon's `SdpPublisher` trait.

use heapless::Vec;

/// Maximum size of an encoded SDP service record.
pub const MAX_SDP_RECORD: usize = 256;

/// SDP UUIDs for audio profiles
pub mod uuid {
    /// L2CAP protocol
    pub const L2CAP: u16 = 0x0100;
    /// AVDTP protocol
    pub const AVDTP: u16 = 0x0019;
    /// Audio Source service class
    pub const AUDIO_SOURCE: u16 = 0x110A;
    /// Audio Sink service class
    pub const AUDIO_SINK: u16 = 0x110B;
    /// Advanced Audio Distribution profile
    pub const ADVANCED_AUDIO: u16 = 0x110D;
}

/// SDP attribute IDs
pub mod attr {
    /// Service record handle
    pub const SERVICE_RECORD_HANDLE: u16 = 0x0000;
    /// Service class ID list
    pub const SERVICE_CLASS_ID_LIST: u16 = 0x0001;
    /// Protocol descriptor list
    pub const PROTOCOL_DESCRIPTOR_LIST: u16 = 0x0004;
    /// Bluetooth profile descriptor list
    pub const PROFILE_DESCRIPTOR_LIST: u16 = 0x0009;
    /// Supported features
    pub const SUPPORTED_FEATURES: u16 = 0x0311;
    /// Primary language's service name attribute (base 0x0000 + 0x0100 offset)
    pub const SERVICE_NAME: u16 = 0x0100;
}

const DES_SEQ: u8 = 0x35;
const DES_UINT16: u8 = 0x09;
const DES_UINT32: u8 = 0x0A;
const DES_UUID16: u8 = 0x19;
const DES_STRING: u8 = 0x25;

/// Appends SDP Data Elements to a fixed-capacity buffer.
///
/// Every "short form" element used by A2DP service records fits in a
/// 1-byte length prefix, so this builder only ever emits that form — it
/// is not a general-purpose SDP encoder.
pub struct DesBuilder<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> DesBuilder<N> {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push_uint16(&mut self, val: u16) -> &mut Self {
        self.buf.push(DES_UINT16).ok();
        self.buf.extend_from_slice(&val.to_be_bytes()).ok();
        self
    }

    pub fn push_uint32(&mut self, val: u32) -> &mut Self {
        self.buf.push(DES_UINT32).ok();
        self.buf.extend_from_slice(&val.to_be_bytes()).ok();
        self
    }

    pub fn push_uuid16(&mut self, val: u16) -> &mut Self {
        self.buf.push(DES_UUID16).ok();
        self.buf.extend_from_slice(&val.to_be_bytes()).ok();
        self
    }

    pub fn push_string(&mut self, s: &str) -> &mut Self {
        debug_assert!(s.len() <= u8::MAX as usize);
        self.buf.push(DES_STRING).ok();
        self.buf.push(s.len() as u8).ok();
        self.buf.extend_from_slice(s.as_bytes()).ok();
        self
    }

    /// Builds `f`'s output as a nested Data Element Sequence, wraps it in
    /// a `0x35 <len>` header, and appends it to this builder.
    pub fn push_sequence(&mut self, f: impl FnOnce(&mut DesBuilder<N>)) -> &mut Self {
        let mut child = DesBuilder::<N>::new();
        f(&mut child);
        debug_assert!(
            child.buf.len() <= u8::MAX as usize,
            "SDP element too large for 1-byte length form"
        );
        self.buf.push(DES_SEQ).ok();
        self.buf.push(child.buf.len() as u8).ok();
        self.buf.extend_from_slice(&child.buf).ok();
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl<const N: usize> Default for DesBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// An A2DP (Source or Sink) service record.
#[derive(Debug, Clone)]
pub struct A2dpServiceRecord {
    /// Service record handle, assigned by the SDP server at publish time.
    pub handle: u32,
    /// Service class UUID (AUDIO_SOURCE or AUDIO_SINK).
    pub service_class: u16,
    /// AVDTP version (e.g. 0x0100 for 1.0).
    pub avdtp_version: u16,
    /// A2DP profile version (e.g. 0x0100 for 1.0).
    pub profile_version: u16,
    /// Supported features bitmap.
    pub features: u16,
    /// Human-readable service name advertised to peers.
    pub service_name: &'static str,
}

impl A2dpServiceRecord {
    /// The A2DP Source record: service class AUDIO_SOURCE, full supported
    /// features (0x000F), advertised as "Audio Source".
    pub const fn source(handle: u32) -> Self {
        Self {
            handle,
            service_class: uuid::AUDIO_SOURCE,
            avdtp_version: 0x0100,
            profile_version: 0x0100,
            features: 0x000F,
            service_name: "Audio Source",
        }
    }

    /// The A2DP Sink record: service class AUDIO_SINK, supported features
    /// 0x0001, advertised as "Audio Sink". Same profile/protocol stack as
    /// the source record.
    pub const fn sink(handle: u32) -> Self {
        Self {
            handle,
            service_class: uuid::AUDIO_SINK,
            avdtp_version: 0x0100,
            profile_version: 0x0100,
            features: 0x0001,
            service_name: "Audio Sink",
        }
    }

    /// Serialise the service record as an SDP Data Element Sequence.
    /// Returns the number of bytes written.
    pub fn to_bytes(&self, buf: &mut [u8]) -> usize {
        let mut out = DesBuilder::<MAX_SDP_RECORD>::new();
        out.push_sequence(|b| {
            b.push_uint16(attr::SERVICE_RECORD_HANDLE);
            b.push_uint32(self.handle);

            b.push_uint16(attr::SERVICE_CLASS_ID_LIST);
            b.push_sequence(|c| {
                c.push_uuid16(self.service_class);
            });

            b.push_uint16(attr::PROTOCOL_DESCRIPTOR_LIST);
            b.push_sequence(|c| {
                c.push_sequence(|l2cap| {
                    l2cap.push_uuid16(uuid::L2CAP);
                    l2cap.push_uint16(crate::l2cap::psm::AVDTP);
                });
                c.push_sequence(|avdtp| {
                    avdtp.push_uuid16(uuid::AVDTP);
                    avdtp.push_uint16(self.avdtp_version);
                });
            });

            b.push_uint16(attr::PROFILE_DESCRIPTOR_LIST);
            b.push_sequence(|c| {
                c.push_sequence(|profile| {
                    profile.push_uuid16(uuid::ADVANCED_AUDIO);
                    profile.push_uint16(self.profile_version);
                });
            });

            b.push_uint16(attr::SUPPORTED_FEATURES);
            b.push_uint16(self.features);

            b.push_uint16(attr::SERVICE_NAME);
            b.push_string(self.service_name);
        });

        let len = out.len();
        assert!(buf.len() >= len, "Buffer too small for SDP record");
        buf[..len].copy_from_slice(out.as_bytes());
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_record_starts_with_outer_sequence_header() {
        let record = A2dpServiceRecord::source(0x0001_0001);
        let mut buf = [0u8; MAX_SDP_RECORD];
        let len = record.to_bytes(&mut buf);

        assert_eq!(buf[0], DES_SEQ);
        assert_eq!(buf[1] as usize, len - 2);
    }

    #[test]
    fn sink_record_has_distinct_service_class_and_features() {
        let record = A2dpServiceRecord::sink(0x0001_0002);
        let mut buf = [0u8; MAX_SDP_RECORD];
        let len = record.to_bytes(&mut buf);

        assert!(len > 0);
        assert_eq!(record.service_class, uuid::AUDIO_SINK);
        assert_eq!(record.features, 0x0001);
        assert_eq!(record.service_name, "Audio Sink");
    }

    #[test]
    fn service_name_is_embedded_verbatim() {
        let record = A2dpServiceRecord::source(1);
        let mut buf = [0u8; MAX_SDP_RECORD];
        let len = record.to_bytes(&mut buf);
        let encoded = &buf[..len];

        let needle = record.service_name.as_bytes();
        assert!(encoded.windows(needle.len()).any(|w| w == needle));
    }
}
