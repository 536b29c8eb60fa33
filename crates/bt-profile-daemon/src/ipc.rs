//! IPC command surface (§6, §10): a minimal length-prefixed
//! command/response codec wrapping the `HID_CONNECT`/`HID_DISCONNECT`
//! surface. The transport (socket framing) is external; this module only
//! encodes/decodes the bytes that cross it.

use bytes::{BufMut, Bytes, BytesMut};

use bt_classic::BdAddr;

use crate::error::DaemonError;

/// Wire opcode byte, the first byte of a frame's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IpcOpcode {
    HidConnect = 0x01,
    HidDisconnect = 0x02,
}

/// Response status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IpcStatus {
    Success = 0x00,
    Failed = 0x01,
    Invalid = 0x02,
}

/// A decoded command, or an unrecognized opcode carried through so the
/// caller can reply `FAILED` rather than treat it as a malformed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcCommand {
    HidConnect(BdAddr),
    HidDisconnect(BdAddr),
    Unknown(u8),
}

const LENGTH_PREFIX_LEN: usize = 4;
const BDADDR_LEN: usize = 6;

/// Decodes one frame from the front of `buf`: a 4-byte little-endian
/// length prefix covering the opcode byte and payload that follow.
/// Returns the command and the total number of bytes consumed, so the
/// caller can advance past it and decode the next frame from the same
/// buffer. `Err(InvalidCommand)` only for frames truncated shorter than
/// their declared length — an unrecognized opcode decodes fine as
/// [`IpcCommand::Unknown`].
pub fn decode(buf: &[u8]) -> Result<(IpcCommand, usize), DaemonError> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Err(DaemonError::InvalidCommand("frame shorter than its length prefix"));
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let total = LENGTH_PREFIX_LEN + len;
    if buf.len() < total {
        return Err(DaemonError::InvalidCommand("frame shorter than its declared length"));
    }
    let body = &buf[LENGTH_PREFIX_LEN..total];
    let Some((&opcode, payload)) = body.split_first() else {
        return Err(DaemonError::InvalidCommand("frame body is empty"));
    };

    let command = match opcode {
        op if op == IpcOpcode::HidConnect as u8 => {
            let addr = read_bdaddr(payload)?;
            IpcCommand::HidConnect(addr)
        }
        op if op == IpcOpcode::HidDisconnect as u8 => {
            let addr = read_bdaddr(payload)?;
            IpcCommand::HidDisconnect(addr)
        }
        other => IpcCommand::Unknown(other),
    };
    Ok((command, total))
}

fn read_bdaddr(payload: &[u8]) -> Result<BdAddr, DaemonError> {
    if payload.len() != BDADDR_LEN {
        return Err(DaemonError::InvalidCommand("payload is not a 6-byte device address"));
    }
    let mut bytes = [0u8; BDADDR_LEN];
    bytes.copy_from_slice(payload);
    Ok(BdAddr(bytes))
}

/// Encodes a one-byte status response.
pub fn encode_response(status: IpcStatus) -> Bytes {
    let mut buf = BytesMut::with_capacity(1);
    buf.put_u8(status as u8);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
        let len = (1 + payload.len()) as u32;
        let mut buf = Vec::new();
        buf.extend_from_slice(&len.to_le_bytes());
        buf.push(opcode);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn decodes_hid_connect() {
        let addr = [1, 2, 3, 4, 5, 6];
        let buf = frame(IpcOpcode::HidConnect as u8, &addr);
        let (cmd, consumed) = decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(cmd, IpcCommand::HidConnect(BdAddr(addr)));
    }

    #[test]
    fn decodes_hid_disconnect() {
        let addr = [9, 9, 9, 9, 9, 9];
        let buf = frame(IpcOpcode::HidDisconnect as u8, &addr);
        let (cmd, _) = decode(&buf).unwrap();
        assert_eq!(cmd, IpcCommand::HidDisconnect(BdAddr(addr)));
    }

    #[test]
    fn unknown_opcode_decodes_as_unknown() {
        let buf = frame(0xFF, &[1, 2, 3, 4, 5, 6]);
        let (cmd, _) = decode(&buf).unwrap();
        assert_eq!(cmd, IpcCommand::Unknown(0xFF));
    }

    #[test]
    fn rejects_frame_shorter_than_length_prefix() {
        assert!(decode(&[0, 1]).is_err());
    }

    #[test]
    fn rejects_frame_truncated_before_declared_length() {
        let mut buf = frame(IpcOpcode::HidConnect as u8, &[1, 2, 3, 4, 5, 6]);
        buf.truncate(buf.len() - 1);
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn rejects_wrong_size_address_payload() {
        let buf = frame(IpcOpcode::HidConnect as u8, &[1, 2, 3]);
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn decodes_two_frames_back_to_back() {
        let mut buf = frame(IpcOpcode::HidConnect as u8, &[1, 1, 1, 1, 1, 1]);
        buf.extend(frame(IpcOpcode::HidDisconnect as u8, &[2, 2, 2, 2, 2, 2]));
        let (first, consumed) = decode(&buf).unwrap();
        assert_eq!(first, IpcCommand::HidConnect(BdAddr([1; 6])));
        let (second, _) = decode(&buf[consumed..]).unwrap();
        assert_eq!(second, IpcCommand::HidDisconnect(BdAddr([2; 6])));
    }
}
