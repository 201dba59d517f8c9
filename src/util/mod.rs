//! Utility modules

pub mod delay;
pub mod ids;
pub mod paths;

pub use delay::{spawn_after, DelayedTask};
pub use ids::record_key;
pub use paths::{data_dir, database_path};
