//! Packed parameter decoding.
//!
//! Payload bytes are little-endian (the firmware side). Width and
//! signedness come strictly from the registry's parameter layout,
//! never from the payload size: a payload shorter than the layout
//! requires is a decode error for that atom.

use trice_id::ParamSlot;

use crate::error::{Result, TranslateError};

/// One decoded parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Unsigned(u64),
    Signed(i64),
    Float(f32),
    Text(String),
}

/// Decode a packed payload against an ordered parameter layout.
///
/// Consumes the payload exactly: trailing bytes beyond the layout are
/// an error, as is running out of bytes mid-slot.
pub fn decode_params(payload: &[u8], spec: &[ParamSlot]) -> Result<Vec<ParamValue>> {
    let mut values = Vec::with_capacity(spec.len());
    let mut cursor = 0usize;

    let mut take = |n: usize, slot: &ParamSlot| -> Result<std::ops::Range<usize>> {
        if payload.len() - cursor < n {
            return Err(TranslateError::ShortPayload {
                slot: slot.to_string(),
                need: n,
                have: payload.len() - cursor,
            });
        }
        let r = cursor..cursor + n;
        cursor += n;
        Ok(r)
    };

    for slot in spec {
        let value = match slot {
            ParamSlot::U8 => ParamValue::Unsigned(payload[take(1, slot)?][0] as u64),
            ParamSlot::I8 => ParamValue::Signed(payload[take(1, slot)?][0] as i8 as i64),
            ParamSlot::U16 => {
                let r = take(2, slot)?;
                ParamValue::Unsigned(u16::from_le_bytes(payload[r].try_into().unwrap()) as u64)
            }
            ParamSlot::I16 => {
                let r = take(2, slot)?;
                ParamValue::Signed(i16::from_le_bytes(payload[r].try_into().unwrap()) as i64)
            }
            ParamSlot::U32 => {
                let r = take(4, slot)?;
                ParamValue::Unsigned(u32::from_le_bytes(payload[r].try_into().unwrap()) as u64)
            }
            ParamSlot::I32 => {
                let r = take(4, slot)?;
                ParamValue::Signed(i32::from_le_bytes(payload[r].try_into().unwrap()) as i64)
            }
            ParamSlot::U64 => {
                let r = take(8, slot)?;
                ParamValue::Unsigned(u64::from_le_bytes(payload[r].try_into().unwrap()))
            }
            ParamSlot::I64 => {
                let r = take(8, slot)?;
                ParamValue::Signed(i64::from_le_bytes(payload[r].try_into().unwrap()))
            }
            ParamSlot::F32 => {
                let r = take(4, slot)?;
                ParamValue::Float(f32::from_le_bytes(payload[r].try_into().unwrap()))
            }
            ParamSlot::Str => {
                let len = payload[take(1, slot)?][0] as usize;
                let r = take(len, slot)?;
                let text = std::str::from_utf8(&payload[r])
                    .map_err(|_| TranslateError::BadString)?;
                ParamValue::Text(text.to_string())
            }
        };
        values.push(value);
    }

    if cursor != payload.len() {
        return Err(TranslateError::TrailingPayload(payload.len() - cursor));
    }
    Ok(values)
}

/// Encode values back into a packed payload. Test and synthetic-source
/// helper; the inverse of [`decode_params`] for well-formed input.
pub fn encode_params(values: &[ParamValue], spec: &[ParamSlot]) -> Vec<u8> {
    assert_eq!(values.len(), spec.len(), "value/slot arity mismatch");
    let mut out = Vec::new();
    for (value, slot) in values.iter().zip(spec) {
        match (slot, value) {
            (ParamSlot::U8, ParamValue::Unsigned(v)) => out.push(*v as u8),
            (ParamSlot::I8, ParamValue::Signed(v)) => out.push(*v as i8 as u8),
            (ParamSlot::U16, ParamValue::Unsigned(v)) => {
                out.extend_from_slice(&(*v as u16).to_le_bytes())
            }
            (ParamSlot::I16, ParamValue::Signed(v)) => {
                out.extend_from_slice(&(*v as i16).to_le_bytes())
            }
            (ParamSlot::U32, ParamValue::Unsigned(v)) => {
                out.extend_from_slice(&(*v as u32).to_le_bytes())
            }
            (ParamSlot::I32, ParamValue::Signed(v)) => {
                out.extend_from_slice(&(*v as i32).to_le_bytes())
            }
            (ParamSlot::U64, ParamValue::Unsigned(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (ParamSlot::I64, ParamValue::Signed(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (ParamSlot::F32, ParamValue::Float(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (ParamSlot::Str, ParamValue::Text(s)) => {
                out.push(s.len() as u8);
                out.extend_from_slice(s.as_bytes());
            }
            _ => panic!("value does not match slot kind"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_round_trip() {
        let spec = [
            ParamSlot::I16,
            ParamSlot::U8,
            ParamSlot::I32,
            ParamSlot::U64,
            ParamSlot::F32,
        ];
        let values = vec![
            ParamValue::Signed(-42),
            ParamValue::Unsigned(255),
            ParamValue::Signed(-100_000),
            ParamValue::Unsigned(u64::MAX),
            ParamValue::Float(3.5),
        ];
        let payload = encode_params(&values, &spec);
        assert_eq!(decode_params(&payload, &spec).unwrap(), values);
    }

    #[test]
    fn string_slot_round_trip() {
        let spec = [ParamSlot::Str];
        let values = vec![ParamValue::Text("motor".to_string())];
        let payload = encode_params(&values, &spec);
        assert_eq!(payload[0], 5);
        assert_eq!(decode_params(&payload, &spec).unwrap(), values);
    }

    #[test]
    fn short_payload_is_an_error() {
        let spec = [ParamSlot::I32];
        let result = decode_params(&[1, 2], &spec);
        assert!(matches!(result, Err(TranslateError::ShortPayload { .. })));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let spec = [ParamSlot::U8];
        let result = decode_params(&[1, 2, 3], &spec);
        assert!(matches!(result, Err(TranslateError::TrailingPayload(2))));
    }

    #[test]
    fn truncated_string_is_an_error() {
        let spec = [ParamSlot::Str];
        // Declares 10 bytes, provides 2.
        let result = decode_params(&[10, b'a', b'b'], &spec);
        assert!(matches!(result, Err(TranslateError::ShortPayload { .. })));
    }

    #[test]
    fn signedness_comes_from_the_slot_not_the_bytes() {
        // Same two bytes, opposite interpretations.
        let bytes = [0xFF, 0xFF];
        assert_eq!(
            decode_params(&bytes, &[ParamSlot::I16]).unwrap(),
            vec![ParamValue::Signed(-1)]
        );
        assert_eq!(
            decode_params(&bytes, &[ParamSlot::U16]).unwrap(),
            vec![ParamValue::Unsigned(65535)]
        );
    }
}
