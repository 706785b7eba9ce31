//! Decoder dispatch for the compressed block formats
//!
//! None of these codecs is implemented. The job of this table is solely to
//! recognize which compression a file claims and fail with an error naming
//! it, instead of silently misinterpreting compressed bytes as raw pixels.

use crate::raster::format::Format;
use crate::Error;

/// A block decoder: compressed source bytes in, one decoded block out
pub type DecodeFn = fn(&[u8], &mut [u8]) -> Result<(), Error>;

/// Returns the decoder for a format, or `None` when blocks of that format
/// are stored as raw pixels and need no decoding
#[must_use]
pub fn decoder_for(format: Format) -> Option<DecodeFn> {
    match format {
        Format::PackedBinary => Some(decode_packed_binary),
        Format::RunLengthEncoded => Some(decode_run_length),
        Format::CcittGroup4 => Some(decode_ccitt_group4),
        Format::AdaptiveRgb => Some(decode_adaptive_rgb),
        Format::AdaptiveGrayScale => Some(decode_adaptive_gray_scale),
        Format::ContinuousTone => Some(decode_continuous_tone),
        Format::JpegGray => Some(decode_jpeg_gray),
        Format::JpegRgb => Some(decode_jpeg_rgb),
        Format::JpegCmyk => Some(decode_jpeg_cmyk),
        _ => None,
    }
}

fn unimplemented_codec(format: Format) -> Error {
    Error::UnimplementedCodec {
        codec: format.display_name(),
    }
}

fn decode_packed_binary(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::PackedBinary))
}

fn decode_run_length(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::RunLengthEncoded))
}

fn decode_ccitt_group4(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::CcittGroup4))
}

fn decode_adaptive_rgb(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::AdaptiveRgb))
}

fn decode_adaptive_gray_scale(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::AdaptiveGrayScale))
}

fn decode_continuous_tone(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::ContinuousTone))
}

fn decode_jpeg_gray(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::JpegGray))
}

fn decode_jpeg_rgb(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::JpegRgb))
}

fn decode_jpeg_cmyk(_source: &[u8], _dest: &mut [u8]) -> Result<(), Error> {
    Err(unimplemented_codec(Format::JpegCmyk))
}
