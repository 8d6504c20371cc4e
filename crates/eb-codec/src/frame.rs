use crate::error::CodecError;
use crate::metadata::MessageMetadata;

/// Unit Separator — between the key and value of a single metadata pair.
pub const US: u8 = 0x1F;
/// Record Separator — between successive metadata pairs.
pub const RS: u8 = 0x1E;
/// Line Feed — terminates the metadata section of a frame.
pub const LF: u8 = 0x0A;

const RESERVED: [u8; 3] = [US, RS, LF];

fn check_reserved(s: &str) -> Result<(), CodecError> {
    if s.bytes().any(|b| RESERVED.contains(&b)) {
        return Err(CodecError::ReservedByte(s.to_string()));
    }
    Ok(())
}

/// Encode a metadata map to its deterministic wire form.
///
/// Empty map encodes to an empty byte vector. Otherwise emits
/// `k1 US v1 (RS k_i US v_i)*` with keys in ascending byte order —
/// `MessageMetadata` already iterates that way, so no sort is needed here.
pub fn encode_metadata(metadata: &MessageMetadata) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for (i, (k, v)) in metadata.iter().enumerate() {
        check_reserved(k)?;
        check_reserved(v)?;
        if i > 0 {
            out.push(RS);
        }
        out.extend_from_slice(k.as_bytes());
        out.push(US);
        out.extend_from_slice(v.as_bytes());
    }
    Ok(out)
}

/// Decode a metadata map from its wire form.
///
/// Empty input decodes to an empty map. Each `RS`-delimited part must
/// contain exactly one `US`; its absence is a framing error.
pub fn decode_metadata(bytes: &[u8]) -> Result<MessageMetadata, CodecError> {
    let mut metadata = MessageMetadata::new();
    if bytes.is_empty() {
        return Ok(metadata);
    }

    for part in bytes.split(|&b| b == RS) {
        let part_str = std::str::from_utf8(part)?;
        let mut splits = part.splitn(3, |&b| b == US);
        let key = splits.next().unwrap();
        let value = match splits.next() {
            Some(v) => v,
            None => return Err(CodecError::MissingKvSeparator(part_str.to_string())),
        };
        if splits.next().is_some() {
            return Err(CodecError::ExtraKvSeparator(part_str.to_string()));
        }
        let key = std::str::from_utf8(key)?;
        let value = std::str::from_utf8(value)?;
        metadata.insert(key, value);
    }

    Ok(metadata)
}

/// Encode a full frame: `encodeMetadata(m) || LF || data`.
pub fn encode(metadata: &MessageMetadata, data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = encode_metadata(metadata)?;
    out.push(LF);
    out.extend_from_slice(data);
    Ok(out)
}

/// Decode a full frame: locate the first `LF`, decode everything before it
/// as metadata, everything after it as payload.
pub fn decode(bytes: &[u8]) -> Result<(MessageMetadata, Vec<u8>), CodecError> {
    let pos = bytes.iter().position(|&b| b == LF).ok_or(CodecError::MissingNewline)?;
    let metadata = decode_metadata(&bytes[..pos])?;
    let data = bytes[pos + 1..].to_vec();
    Ok((metadata, data))
}
