use crate::media_info::{DateAndTimeType, EditType};
use crate::template::{FormatCode, FormatCodeRegistry};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub naming_format: NamingFormatConfig,
    pub supported_file_extensions: SupportedExtensions,
    pub ignored_file_extensions: Vec<String>,
    pub editing_softwares_keywords: Vec<String>,
    pub use_exiftool_on_images: bool,
    pub media: MediaLabelConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            naming_format: NamingFormatConfig::default(),
            supported_file_extensions: SupportedExtensions::default(),
            ignored_file_extensions: to_strings(&["xmp", "aae", "thm"]),
            editing_softwares_keywords: to_strings(&[
                "photoshop",
                "lightroom",
                "gimp",
                "darktable",
                "snapseed",
                "luminar",
                "affinity",
            ]),
            use_exiftool_on_images: true,
            media: MediaLabelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingFormatConfig {
    pub general_file: String,
    pub media_file: String,
}

impl Default for NamingFormatConfig {
    fn default() -> Self {
        Self {
            general_file: "%Y%m%d_%H%M%S%z".to_string(),
            media_file: "%Y%m%d_%H%M%S_%{ms}%z_%{dtt}%{et}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SupportedExtensions {
    pub exiftool: ExiftoolExtensions,
    pub embedded: EmbeddedExtensions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExiftoolExtensions {
    pub image: Vec<String>,
    pub video_and_audio: Vec<String>,
}

impl Default for ExiftoolExtensions {
    fn default() -> Self {
        Self {
            image: to_strings(&[
                "jpg", "jpeg", "tif", "tiff", "png", "heic", "heif", "dng", "raf", "nef", "cr2",
                "cr3", "arw",
            ]),
            video_and_audio: to_strings(&[
                "mp4", "mov", "m4v", "avi", "mkv", "3gp", "m4a", "mp3", "wav",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedExtensions {
    pub image: Vec<String>,
}

impl Default for EmbeddedExtensions {
    fn default() -> Self {
        Self {
            image: to_strings(&["jpg", "jpeg", "tif", "tiff", "png", "heic", "heif", "webp"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLabelConfig {
    pub date_and_time_type: HashMap<DateAndTimeType, String>,
    pub edit_type: HashMap<EditType, String>,
}

impl Default for MediaLabelConfig {
    fn default() -> Self {
        Self {
            date_and_time_type: HashMap::from([
                (DateAndTimeType::Authentic, "A".to_string()),
                (DateAndTimeType::Best, "B".to_string()),
                (DateAndTimeType::Curated, "C".to_string()),
            ]),
            edit_type: HashMap::from([
                (EditType::Original, "O".to_string()),
                (EditType::Edited, "E".to_string()),
            ]),
        }
    }
}

impl AppConfig {
    /// 設定された表示ラベルを選択肢として登録したレジストリを組み立てる。
    pub fn format_code_registry(&self) -> FormatCodeRegistry {
        let mut registry = FormatCodeRegistry::default();
        if !self.media.date_and_time_type.is_empty() {
            registry.register_choices(
                FormatCode::DateAndTimeType,
                self.media.date_and_time_type.values(),
            );
        }
        if !self.media.edit_type.is_empty() {
            registry.register_choices(FormatCode::EditType, self.media.edit_type.values());
        }
        registry
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "trename", "trename")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

/// 明示パスが与えられればそれを、なければOS標準の設定ファイルを読む。
/// どちらも存在しなければ既定値を返す。
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => {
            let paths = app_paths()?;
            if !paths.config_path.exists() {
                return Ok(AppConfig::default());
            }
            paths.config_path
        }
    };

    let raw = fs::read_to_string(&config_path).with_context(|| {
        format!("設定ファイルを読めませんでした: {}", config_path.display())
    })?;
    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリを作成できませんでした: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "設定ファイルを書き込めませんでした: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}
