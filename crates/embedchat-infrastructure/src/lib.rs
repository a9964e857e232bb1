pub mod paths;
pub mod settings;
pub mod storage;

pub use crate::paths::EmbedchatPaths;
pub use crate::settings::{Settings, SettingsStorage};
pub use crate::storage::FileStore;
