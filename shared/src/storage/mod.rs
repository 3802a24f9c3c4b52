pub mod combined_storage;
pub mod error;
pub mod holder;
pub mod record_map;
#[allow(clippy::module_inception)]
pub mod storage;
pub mod storage_id;
pub mod storage_key;
