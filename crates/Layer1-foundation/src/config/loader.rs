//! Configuration Loader
//!
//! `.rubrion` 폴더의 설정 파일을 레이어별로 읽어 병합합니다.
//!
//! ## 검색 우선순위
//!
//! 1. User-level: `~/.rubrion/settings.toml`
//! 2. Project-level: `.rubrion/settings.toml`
//! 3. Local (gitignored): `.rubrion/settings.local.toml`
//!
//! 각 레벨의 설정이 이전 레벨을 키 단위로 오버라이드합니다.
//! 파일 포맷은 확장자(`.toml` / `.json`)로 결정됩니다.

use super::settings::Settings;
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 설정 폴더 이름
pub const CONFIG_DIR_NAME: &str = ".rubrion";

/// 기본 설정 파일명
pub const SETTINGS_FILE: &str = "settings.toml";

/// 로컬 (gitignored) 설정 파일명
pub const LOCAL_SETTINGS_FILE: &str = "settings.local.toml";

// ============================================================================
// ConfigFormat
// ============================================================================

/// 지원하는 설정 파일 포맷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 확장자로 포맷 결정
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(Error::UnsupportedFormat(format!(
                "{} ({})",
                path.display(),
                other.unwrap_or("no extension")
            ))),
        }
    }

    /// 문자열을 JSON 트리로 파싱
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self {
            Self::Toml => Ok(toml::from_str::<Value>(content)?),
            Self::Json => Ok(serde_json::from_str::<Value>(content)?),
        }
    }
}

// ============================================================================
// ConfigLoader - 설정 로더
// ============================================================================

/// 설정 로더
pub struct ConfigLoader {
    /// 검색 경로
    search_paths: Vec<ConfigPath>,
}

/// 설정 파일 경로 정보
#[derive(Debug, Clone)]
struct ConfigPath {
    /// 경로
    path: PathBuf,
    /// 우선순위 (높을수록 우선)
    priority: u8,
    /// 설명
    description: &'static str,
}

impl ConfigLoader {
    /// 새 로더 생성 (기본 검색 경로)
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        // 1. User-level (가장 낮은 우선순위)
        if let Some(home) = dirs::home_dir() {
            paths.push(ConfigPath {
                path: home.join(CONFIG_DIR_NAME).join(SETTINGS_FILE),
                priority: 10,
                description: "User settings",
            });
        }

        // 2. Project-level
        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE),
            priority: 20,
            description: "Project settings",
        });

        // 3. Local (gitignored, 가장 높은 우선순위)
        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(LOCAL_SETTINGS_FILE),
            priority: 30,
            description: "Local settings",
        });

        paths.sort_by_key(|p| p.priority);

        Self { search_paths: paths }
    }

    /// 커스텀 검색 경로로 생성 (뒤에 올수록 우선)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i.min(u8::MAX as usize) as u8,
                description: "Custom",
            })
            .collect();

        Self { search_paths }
    }

    /// 검색 경로 추가
    pub fn add_path(&mut self, path: PathBuf, priority: u8) {
        self.search_paths.push(ConfigPath {
            path,
            priority,
            description: "Added",
        });
        self.search_paths.sort_by_key(|p| p.priority);
    }

    /// 모든 경로에서 설정 로드하여 병합
    ///
    /// 읽을 수 없는 레이어는 warn 로그 후 건너뜁니다.
    pub fn load_all(&self) -> Result<Settings> {
        let mut merged = Value::Object(Default::default());

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }

            match read_layer(&config_path.path) {
                Ok(layer) => {
                    info!(
                        "Loaded {} from: {}",
                        config_path.description,
                        config_path.path.display()
                    );
                    merge_values(&mut merged, layer);
                }
                Err(e) => {
                    warn!(
                        "Failed to load settings from {}: {}",
                        config_path.path.display(),
                        e
                    );
                }
            }
        }

        into_settings(merged, "merged settings")
    }

    /// 특정 경로에서만 로드 (없으면 기본값)
    pub fn load_from(&self, path: &Path) -> Result<Settings> {
        if path.exists() {
            load_settings_from_file(path)
        } else {
            Ok(Settings::new())
        }
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.path.exists())
            .map(|p| p.path.clone())
            .collect()
    }
}

// ============================================================================
// 유틸리티 함수
// ============================================================================

/// 파일에서 설정 로드
pub fn load_settings_from_file(path: &Path) -> Result<Settings> {
    let layer = read_layer(path)?;
    into_settings(layer, &path.display().to_string())
}

/// 파일 하나를 JSON 트리로 읽기
fn read_layer(path: &Path) -> Result<Value> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let value = format.parse(&content)?;

    debug!(path = %path.display(), format = ?format, "Parsed settings layer");

    Ok(value)
}

fn into_settings(value: Value, origin: &str) -> Result<Settings> {
    serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(format!("Invalid settings in {}: {}", origin, e)))
}

/// 두 트리 병합 (later가 earlier를 오버라이드, 테이블은 재귀 병합)
pub fn merge_values(earlier: &mut Value, later: Value) {
    match (earlier, later) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/settings.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("settings.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("settings.yaml")),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_merge_values() {
        let mut base = json!({
            "event_bus": { "debug_mode": false, "catch_panics": true },
            "logging": { "level": "info" }
        });
        merge_values(
            &mut base,
            json!({ "event_bus": { "debug_mode": true }, "logging": { "with_target": true } }),
        );

        assert_eq!(base["event_bus"]["debug_mode"], json!(true));
        assert_eq!(base["event_bus"]["catch_panics"], json!(true));
        assert_eq!(base["logging"]["level"], json!("info"));
        assert_eq!(base["logging"]["with_target"], json!(true));
    }

    #[test]
    fn test_load_all_layers() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("settings.toml");
        let local = dir.path().join("settings.local.json");

        fs::write(
            &project,
            "[event_bus]\ndebug_mode = true\nslow_handler_threshold_ms = 100\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        fs::write(&local, r#"{ "event_bus": { "slow_handler_threshold_ms": 5 } }"#).unwrap();

        let loader = ConfigLoader::with_paths(vec![project, local]);
        let settings = loader.load_all().unwrap();

        assert!(settings.event_bus.debug_mode);
        assert_eq!(settings.event_bus.slow_handler_threshold_ms, Some(5));
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(loader.existing_files().len(), 2);
    }

    #[test]
    fn test_add_path_respects_priority() {
        let dir = TempDir::new().unwrap();
        let low = dir.path().join("low.toml");
        let high = dir.path().join("high.json");
        let middle = dir.path().join("middle.toml");

        fs::write(&low, "[logging]\nlevel = \"error\"\nwith_target = true\n").unwrap();
        fs::write(&high, r#"{ "logging": { "level": "trace" } }"#).unwrap();
        fs::write(&middle, "[logging]\nlevel = \"warn\"\n").unwrap();

        // with_paths 는 0, 1 우선순위. 나중에 추가한 경로가 중간에 끼어듦
        let mut loader = ConfigLoader::with_paths(vec![low.clone(), high.clone()]);
        loader.add_path(middle.clone(), 0);

        assert_eq!(loader.existing_files(), vec![low, middle, high]);

        let settings = loader.load_all().unwrap();
        assert_eq!(settings.logging.level, "trace");
        assert!(settings.logging.with_target);
    }

    #[test]
    fn test_load_all_skips_broken_layer() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.toml");
        let broken = dir.path().join("broken.toml");

        fs::write(&good, "[logging]\nlevel = \"warn\"\n").unwrap();
        fs::write(&broken, "[logging\nlevel = ").unwrap();

        let loader = ConfigLoader::with_paths(vec![good, broken]);
        let settings = loader.load_all().unwrap();

        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_load_from_missing_is_default() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let settings = loader.load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_reports_bad_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[event_bus]\ndebug_mode = \"yes\"\n").unwrap();

        let err = load_settings_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
