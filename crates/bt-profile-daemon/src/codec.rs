//! Codec Selector: pure logic picking SBC parameters from the
//! intersection of local and remote capabilities.

use bt_classic::avdtp::{allocation, block_length, channel_mode, freq, subbands, SbcCapability};

use crate::error::DaemonError;

const FREQ_PRIORITY: [u8; 4] = [freq::HZ_44100, freq::HZ_48000, freq::HZ_32000, freq::HZ_16000];
const CHANNEL_PRIORITY: [u8; 4] = [
    channel_mode::JOINT_STEREO,
    channel_mode::STEREO,
    channel_mode::DUAL,
    channel_mode::MONO,
];
const BLOCK_PRIORITY: [u8; 4] = [
    block_length::BLOCKS_16,
    block_length::BLOCKS_12,
    block_length::BLOCKS_8,
    block_length::BLOCKS_4,
];
const SUBBANDS_PRIORITY: [u8; 2] = [subbands::SUBBANDS_8, subbands::SUBBANDS_4];
const ALLOCATION_PRIORITY: [u8; 2] = [allocation::LOUDNESS, allocation::SNR];

fn pick(local_mask: u8, remote_mask: u8, priority: &[u8]) -> Option<u8> {
    let intersection = local_mask & remote_mask;
    priority.iter().copied().find(|bit| intersection & bit != 0)
}

/// Default max bitpool for a given (frequency bit, channel-mode bit)
/// pair, per the A2DP profile's recommended bitpool table.
fn default_bitpool(freq_bit: u8, channel_bit: u8) -> u8 {
    let is_mono_or_dual = channel_bit == channel_mode::MONO || channel_bit == channel_mode::DUAL;
    match freq_bit {
        freq::HZ_16000 | freq::HZ_32000 => 53,
        freq::HZ_44100 => {
            if is_mono_or_dual {
                31
            } else {
                53
            }
        }
        freq::HZ_48000 => {
            if is_mono_or_dual {
                29
            } else {
                51
            }
        }
        _ => 53,
    }
}

/// Selects SBC parameters from the intersection of `local` and `remote`
/// capabilities: for each field, the highest-preference bit set in both
/// masks, in the fixed priority order the profile recommends. Fails with
/// [`DaemonError::NoCommonCapability`] if any field's intersection is
/// empty, or if the resulting bitpool range is degenerate.
///
/// Idempotent: feeding the result back as both `local` and `remote`
/// yields the same choice, since the result always carries a single bit
/// per bitmask field and a bitpool range already folded through
/// `default_bitpool`.
pub fn select_sbc_config(
    local: &SbcCapability,
    remote: &SbcCapability,
) -> Result<SbcCapability, DaemonError> {
    let sampling_freq =
        pick(local.sampling_freq, remote.sampling_freq, &FREQ_PRIORITY).ok_or(DaemonError::NoCommonCapability)?;
    let channel_mode = pick(local.channel_mode, remote.channel_mode, &CHANNEL_PRIORITY)
        .ok_or(DaemonError::NoCommonCapability)?;
    let block_length = pick(local.block_length, remote.block_length, &BLOCK_PRIORITY)
        .ok_or(DaemonError::NoCommonCapability)?;
    let subbands = pick(local.subbands, remote.subbands, &SUBBANDS_PRIORITY)
        .ok_or(DaemonError::NoCommonCapability)?;
    let allocation_method = pick(
        local.allocation_method,
        remote.allocation_method,
        &ALLOCATION_PRIORITY,
    )
    .ok_or(DaemonError::NoCommonCapability)?;

    let min_bitpool = remote.min_bitpool.max(bt_classic::avdtp::MIN_BITPOOL);
    let max_bitpool = remote
        .max_bitpool
        .min(default_bitpool(sampling_freq, channel_mode));

    if min_bitpool > max_bitpool {
        return Err(DaemonError::NoCommonCapability);
    }

    Ok(SbcCapability {
        sampling_freq,
        channel_mode,
        block_length,
        subbands,
        allocation_method,
        min_bitpool,
        max_bitpool,
    })
}
