mod manager_config;
pub use manager_config::{ClearPolicy, ManagerConfig};

mod storage_manager;
pub use storage_manager::{StorageManager, SyncReport};
