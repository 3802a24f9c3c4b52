pub mod codec;
pub mod error;
pub mod sync_payload;
