use serde::{Deserialize, Serialize};

use super::{error::PayloadError, sync_payload::SyncPayload};

/// Identifies a tether sync payload ("TETH")
pub const PAYLOAD_MAGIC: u32 = 0x5445_5448;
/// Bumped whenever the body layout changes incompatibly
pub const FORMAT_VERSION: u8 = 1;
/// magic (4) + version (1) + compression flag (1)
pub const HEADER_LEN: usize = 6;

const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_ZSTD: u8 = 1;

/// How payload bodies are compressed on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMode {
    #[default]
    None,
    #[cfg(feature = "zstd_support")]
    Zstd { level: i32 },
}

/// Turns sync payloads into bytes for the host transport and back
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadCodec {
    compression: CompressionMode,
}

impl PayloadCodec {
    pub fn new(compression: CompressionMode) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> CompressionMode {
        self.compression
    }

    pub fn encode(&self, payload: &SyncPayload) -> Result<Vec<u8>, PayloadError> {
        let body =
            bincode::serialize(payload).map_err(|err| PayloadError::Encode(err.to_string()))?;
        let (flag, body) = self.compress(body)?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(&PAYLOAD_MAGIC.to_be_bytes());
        bytes.push(FORMAT_VERSION);
        bytes.push(flag);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Reads any payload this build understands, whatever compression the
    /// sender chose
    pub fn decode(&self, bytes: &[u8]) -> Result<SyncPayload, PayloadError> {
        if bytes.len() < HEADER_LEN {
            return Err(PayloadError::TooShort {
                len: bytes.len(),
                header: HEADER_LEN,
            });
        }

        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != PAYLOAD_MAGIC {
            return Err(PayloadError::InvalidMagic {
                expected: PAYLOAD_MAGIC,
                actual: magic,
            });
        }
        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(PayloadError::UnsupportedVersion {
                expected: FORMAT_VERSION,
                actual: version,
            });
        }

        let body = &bytes[HEADER_LEN..];
        match bytes[5] {
            COMPRESSION_NONE => deserialize(body),
            COMPRESSION_ZSTD => deserialize(&decompress_zstd(body)?),
            mode => Err(PayloadError::CompressionUnsupported { mode }),
        }
    }

    fn compress(&self, body: Vec<u8>) -> Result<(u8, Vec<u8>), PayloadError> {
        match self.compression {
            CompressionMode::None => Ok((COMPRESSION_NONE, body)),
            #[cfg(feature = "zstd_support")]
            CompressionMode::Zstd { level } => zstd::encode_all(body.as_slice(), level)
                .map(|compressed| (COMPRESSION_ZSTD, compressed))
                .map_err(|err| PayloadError::Encode(err.to_string())),
        }
    }
}

fn deserialize(body: &[u8]) -> Result<SyncPayload, PayloadError> {
    bincode::deserialize(body).map_err(|err| PayloadError::Decode(err.to_string()))
}

cfg_if! {
    if #[cfg(feature = "zstd_support")] {
        fn decompress_zstd(body: &[u8]) -> Result<Vec<u8>, PayloadError> {
            zstd::decode_all(body).map_err(|err| PayloadError::Decode(err.to_string()))
        }
    } else {
        fn decompress_zstd(_body: &[u8]) -> Result<Vec<u8>, PayloadError> {
            Err(PayloadError::CompressionUnsupported {
                mode: COMPRESSION_ZSTD,
            })
        }
    }
}
