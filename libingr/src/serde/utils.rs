use super::error::Error;
use nom::{bytes::complete::take, IResult};

/// Runs a nom parser to completion, mapping any parser failure onto the
/// single truncation error. The header blocks are fixed-layout, so the only
/// way a parse can fail is by running out of input.
pub(crate) fn finish<T>(result: IResult<&[u8], T>) -> Result<T, Error> {
    result.map(|(_, value)| value).map_err(|_| Error::Truncated)
}

pub(crate) fn byte_array<const N: usize>(input: &[u8]) -> IResult<&[u8], [u8; N]> {
    let (rest, bytes) = take(N)(input)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok((rest, out))
}

pub(crate) fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_i16(buf: &mut Vec<u8>, value: i16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}
