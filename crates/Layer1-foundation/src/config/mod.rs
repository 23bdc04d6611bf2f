//! Config - 통합 설정 관리
//!
//! - `settings.rs` - EventBusConfig, LoggingConfig, Settings
//! - `loader.rs` - 레이어별 설정 파일 로더 (TOML / JSON)

mod loader;
mod settings;

pub use loader::{
    load_settings_from_file, merge_values, ConfigFormat, ConfigLoader, CONFIG_DIR_NAME,
    LOCAL_SETTINGS_FILE, SETTINGS_FILE,
};
pub use settings::{EventBusConfig, LoggingConfig, Settings};
