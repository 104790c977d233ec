//! Reader settings for tome: which view to open, how to split the book and
//! where snapshots live. Loaded from TOML or JSON files and `KEY=VALUE`
//! overrides.
pub mod config;
pub mod error;
pub mod templates;
pub mod view;

pub use config::{DeliveryConfig, Settings, SnapshotConfig};
pub use error::ConfigError;
pub use view::{FolderFileNameDisplay, PaginatedViewType, ViewType};
