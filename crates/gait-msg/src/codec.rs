//! ---
//! gait_section: "02-messaging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Fixed 48-byte record layout."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Four `(x, y, z)` triples of little-endian `f32`, in `Segment::ALL` order.
//! The payload carries no topic and no header.
use bytes::{Buf, BufMut, Bytes, BytesMut};
use gait_kinematics::{Segment, TimestepRecord, Vec3};
use thiserror::Error;

/// Encoded size of one [`TimestepRecord`].
pub const RECORD_SIZE: usize = Segment::ALL.len() * 3 * std::mem::size_of::<f32>();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record payload must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("frame does not carry topic `{topic}`")]
    MissingTopic { topic: String },
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },
}

pub fn encode(record: &TimestepRecord) -> Bytes {
    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    encode_into(record, &mut buf);
    buf.freeze()
}

pub fn encode_into(record: &TimestepRecord, buf: &mut impl BufMut) {
    for (_, v) in record.iter() {
        buf.put_f32_le(v.x);
        buf.put_f32_le(v.y);
        buf.put_f32_le(v.z);
    }
}

/// Total over any buffer of exactly [`RECORD_SIZE`] bytes; every bit
/// pattern (NaN included) decodes.
pub fn decode(payload: &[u8]) -> Result<TimestepRecord, DecodeError> {
    if payload.len() != RECORD_SIZE {
        return Err(DecodeError::Length {
            expected: RECORD_SIZE,
            actual: payload.len(),
        });
    }
    let mut cursor = payload;
    Ok(TimestepRecord::from_fn(|_| {
        let x = cursor.get_f32_le();
        let y = cursor.get_f32_le();
        let z = cursor.get_f32_le();
        Vec3::new(x, y, z)
    }))
}
