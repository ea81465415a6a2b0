//! Byte stuffing for transmission framing.
//!
//! A stuffed payload is delimited by a flag byte at each end; interior
//! occurrences of the flag or escape byte are replaced by the escape
//! byte followed by the original XORed with 0x20, so payload bytes can
//! never be confused with the delimiters.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame delimiter byte.
pub const FLAG: u8 = 0x7E;

/// Escape byte.
pub const ESCAPE: u8 = 0x7D;

/// Transform applied to an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// Wrap `payload` for the wire: leading flag, escaped interior,
/// trailing flag.
pub fn stuff(payload: &[u8]) -> Bytes {
    let mut framed = BytesMut::with_capacity(payload.len() + 2);
    framed.put_u8(FLAG);
    for &byte in payload {
        if byte == FLAG || byte == ESCAPE {
            framed.put_u8(ESCAPE);
            framed.put_u8(byte ^ ESCAPE_XOR);
        } else {
            framed.put_u8(byte);
        }
    }
    framed.put_u8(FLAG);
    framed.freeze()
}

/// Reverse [`stuff`]: strip the delimiters and undo the escaping.
///
/// Round-trip law: `destuff(&stuff(x)) == x` for every byte sequence
/// `x`, including ones containing flag or escape bytes anywhere.
pub fn destuff(framed: &[u8]) -> Result<Bytes> {
    if framed.len() < 2 {
        return Err(FrameError::BadFraming("too short for flag delimiters"));
    }
    if framed[0] != FLAG || framed[framed.len() - 1] != FLAG {
        return Err(FrameError::BadFraming("missing flag delimiter"));
    }

    let interior = &framed[1..framed.len() - 1];
    let mut payload = BytesMut::with_capacity(interior.len());
    let mut escaped = false;
    for &byte in interior {
        if escaped {
            payload.put_u8(byte ^ ESCAPE_XOR);
            escaped = false;
        } else if byte == ESCAPE {
            escaped = true;
        } else {
            payload.put_u8(byte);
        }
    }
    if escaped {
        return Err(FrameError::BadFraming("dangling escape byte"));
    }

    Ok(payload.freeze())
}
