//! Outbound frame encoding
//!
//! Encoding is pure; writing the bytes to the bus and serialising writers
//! is the caller's job.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::{
    checksum,
    constants::{MAX_PAYLOAD_SIZE, PRIMARY_HEADER_SIZE, PRIMARY_MARKER, PRIMARY_PREAMBLE, auxiliary},
    error::{Error, Result},
    message::Message,
};

/// Encode a primary frame sent from `own_address`
///
/// # Wire layout
///
/// ```text
/// FF FF FF 00 FF | A5 DH DL SS AA LL | payload | CH CL
/// ```
///
/// # Errors
///
/// Returns [`Error::PayloadTooLarge`] for payloads over 34 bytes.
///
/// # Examples
///
/// ```
/// use poolbus_core::{Message, writer};
///
/// let wire = writer::encode(&Message::new(0x60, 0x07), 0x10).unwrap();
/// assert_eq!(
///     wire.as_ref(),
///     &[0xFF, 0xFF, 0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x10, 0x07, 0x00, 0x01, 0x1C]
/// );
/// ```
pub fn encode(message: &Message, own_address: u8) -> Result<BytesMut> {
    let len = message.payload.len();
    if len > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    
    let mut buf =
        BytesMut::with_capacity(PRIMARY_PREAMBLE.len() + PRIMARY_HEADER_SIZE + len + 2);
    
    buf.put_slice(&PRIMARY_PREAMBLE);
    
    let header_start = buf.len();
    buf.put_u8(PRIMARY_MARKER);
    buf.put_u16(message.destination);
    buf.put_u8(own_address);
    buf.put_u8(message.action);
    buf.put_u8(len as u8);
    buf.put_slice(&message.payload);
    
    let checksum = checksum::compute(&buf[header_start..]);
    buf.put_u16(checksum);
    
    trace!(
        %message,
        source = format!("0x{:02X}", own_address),
        wire = %hex::encode(&buf),
        "Encoded frame"
    );
    
    Ok(buf)
}

/// Encode an auxiliary (chlorinator) frame
///
/// `data` fills the body after destination and action and must be one or
/// two bytes, giving the 3- or 4-byte body the scanner probes for.
///
/// # Examples
///
/// ```
/// use poolbus_core::writer;
///
/// let wire = writer::encode_auxiliary(0x50, 0x00, &[0x00]).unwrap();
/// assert_eq!(wire.as_ref(), &[0x10, 0x02, 0x50, 0x00, 0x00, 0x62, 0x10, 0x03]);
/// ```
pub fn encode_auxiliary(destination: u8, action: u8, data: &[u8]) -> Result<BytesMut> {
    let max = auxiliary::LONG_BODY - 2;
    if data.is_empty() || data.len() > max {
        return Err(Error::PayloadTooLarge {
            size: data.len(),
            max,
        });
    }
    
    let mut buf = BytesMut::with_capacity(2 + auxiliary::LONG_BODY + 3);
    buf.put_u8(auxiliary::START);
    buf.put_u8(auxiliary::MARKER);
    buf.put_u8(destination);
    buf.put_u8(action);
    buf.put_slice(data);
    
    let checksum = checksum::compute_short(&buf);
    buf.put_u8(checksum);
    buf.put_slice(&auxiliary::TRAILER);
    
    trace!(wire = %hex::encode(&buf), "Encoded auxiliary frame");
    
    Ok(buf)
}
