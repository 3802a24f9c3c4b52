use thiserror::Error;

/// Errors that can occur while encoding or decoding a sync payload
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload is {len} bytes, shorter than its {header} byte header")]
    TooShort { len: usize, header: usize },

    #[error("Invalid payload magic: expected 0x{expected:08X}, got 0x{actual:08X}")]
    InvalidMagic { expected: u32, actual: u32 },

    #[error("Unsupported payload format version {actual} (this build reads version {expected})")]
    UnsupportedVersion { expected: u8, actual: u8 },

    #[error("Payload uses compression mode {mode} which this build cannot read. Enable the `zstd_support` feature")]
    CompressionUnsupported { mode: u8 },

    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),
}
