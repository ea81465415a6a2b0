//! Segmentation of a raw byte stream into 100-bit frames.

use bytes::BytesMut;

use crate::error::{FrameError, Result};
use crate::frame::{Frame, FRAME_SIZE_BITS, FRAME_SIZE_BYTES};

/// Split `data` into consecutive 100-bit frames.
///
/// Bytes contribute their bits MSB-first, in input order. The final
/// frame, if the stream runs out before 100 bits, is right-padded with
/// zero bits and flagged as padded. Produces `ceil(8 * data.len() / 100)`
/// frames; empty input is an error.
pub fn segment(data: &[u8]) -> Result<Vec<Frame>> {
    if data.is_empty() {
        return Err(FrameError::EmptyInput);
    }

    let total_bits = data.len() * 8;
    let frame_count = total_bits.div_ceil(FRAME_SIZE_BITS);
    let mut frames = Vec::with_capacity(frame_count);

    for index in 0..frame_count {
        let start = index * FRAME_SIZE_BITS;
        let available = (total_bits - start).min(FRAME_SIZE_BITS);

        let mut payload = BytesMut::zeroed(FRAME_SIZE_BYTES);
        for j in 0..available {
            let src = start + j;
            if data[src / 8] >> (7 - (src % 8)) & 1 == 1 {
                payload[j / 8] |= 1 << (7 - (j % 8));
            }
        }

        let padded = available < FRAME_SIZE_BITS;
        frames.push(Frame::new(
            index,
            payload.freeze(),
            FRAME_SIZE_BITS,
            padded,
        ));
    }

    tracing::debug!(
        bytes = data.len(),
        total_bits,
        complete_frames = total_bits / FRAME_SIZE_BITS,
        remaining_bits = total_bits % FRAME_SIZE_BITS,
        frames = frames.len(),
        "segmented input"
    );

    Ok(frames)
}
