use crate::config::AppConfig;
use crate::exif_reader::read_embedded_fields;
use crate::exiftool::{exiftool_available, read_exiftool_fields};
use crate::media_info::{utc_offset, DateAndTimeType, MediaFileInfo};
use crate::resolve::{resolve_media_info, IMAGE_PROFILE, VIDEO_AND_AUDIO_PROFILE};
use crate::template::{
    file_name_matches_naming_format, naming_format_regex, parse_naming_format, FormatCode,
    FormatCodeRegistry, FormatValues, TemplatePart, TimeFields,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenameOverrides {
    pub forced_offset_time: Option<FixedOffset>,
    pub forced_date: Option<NaiveDate>,
    pub exif_offset_time: Option<FixedOffset>,
    pub skip_formatted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameStats {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RenameStats {
    fn record(&mut self, outcome: RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed => self.renamed += 1,
            RenameOutcome::Unchanged => self.unchanged += 1,
            RenameOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    Unchanged,
    Skipped,
}

pub fn collect_files(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("フォルダが存在しません: {}", root.display());
    }

    let mut out = Vec::new();
    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            if entry.file_type().is_file() {
                out.push(entry.path().to_path_buf());
            }
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_file() {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

pub fn split_file_name(file_name: &str) -> (String, String) {
    match file_name.rfind('.') {
        None => (file_name.to_string(), String::new()),
        Some(index) => (
            file_name[..index].to_string(),
            file_name[index + 1..].to_string(),
        ),
    }
}

fn file_name_of(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn forced_time_zone(overrides: &RenameOverrides) -> FixedOffset {
    overrides.forced_offset_time.unwrap_or_else(utc_offset)
}

fn midnight_in(date: NaiveDate, time_zone: FixedOffset) -> Result<DateTime<FixedOffset>> {
    time_zone
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .context("強制日付をタイムゾーンに変換できませんでした")
}

/// 連番サフィックスを付けて空いているパスを探す。
/// リネーム元自身のパスは重複とみなさない。
fn resolve_no_duplication(file_path: &Path, replaceable_file_path: &Path) -> Result<PathBuf> {
    let directory = file_path.parent().unwrap_or_else(|| Path::new(""));
    let (prefix, extension) = split_file_name(&file_name_of(file_path));

    for n in 1..10000u32 {
        let candidate = directory.join(format!("{}_{:04}.{}", prefix, n, extension));
        if !candidate.is_file() || candidate == replaceable_file_path {
            return Ok(candidate);
        }
    }
    bail!(
        "重複しないファイル名を決定できませんでした: {}",
        file_path.display()
    )
}

fn finish_rename(file_path: &Path, new_file_name: &str) -> Result<RenameOutcome> {
    let directory = file_path.parent().unwrap_or_else(|| Path::new(""));
    let mut new_file_path = directory.join(new_file_name);

    if new_file_path == file_path {
        info!("変更なし: {}", file_name_of(file_path));
        return Ok(RenameOutcome::Unchanged);
    }
    if new_file_path.is_file() {
        new_file_path = resolve_no_duplication(&new_file_path, file_path)?;
        if new_file_path == file_path {
            info!("変更なし: {}", file_name_of(file_path));
            return Ok(RenameOutcome::Unchanged);
        }
    }

    fs::rename(file_path, &new_file_path).with_context(|| {
        format!(
            "リネームに失敗しました: {} -> {}",
            file_path.display(),
            new_file_path.display()
        )
    })?;
    info!(
        "{} -> {}",
        file_name_of(file_path),
        file_name_of(&new_file_path)
    );
    Ok(RenameOutcome::Renamed)
}

pub fn rename_general_file(
    file_path: &Path,
    naming_format: &str,
    registry: &FormatCodeRegistry,
    overrides: &RenameOverrides,
) -> Result<RenameOutcome> {
    if !file_path.is_file() {
        bail!("ファイルが存在しません: {}", file_path.display());
    }
    let (file_name_prefix, file_extension) = split_file_name(&file_name_of(file_path));

    if overrides.skip_formatted
        && file_name_matches_naming_format(registry, &file_name_prefix, naming_format)?
    {
        info!(
            "命名フォーマット一致のためスキップ: {}",
            file_path.display()
        );
        return Ok(RenameOutcome::Skipped);
    }

    let time_zone = forced_time_zone(overrides);
    let date_and_time = match overrides.forced_date {
        Some(date) => midnight_in(date, time_zone)?,
        None => {
            let modified: DateTime<Utc> = fs::metadata(file_path)
                .with_context(|| {
                    format!("ファイル情報を取得できませんでした: {}", file_path.display())
                })?
                .modified()
                .with_context(|| {
                    format!("更新時刻を取得できませんでした: {}", file_path.display())
                })?
                .into();
            modified.with_timezone(&time_zone)
        }
    };

    let mut fields = TimeFields::from_date_time(&date_and_time);
    // 一般ファイルはミリ秒情報を持たない
    fields.millisecond = None;
    let values = FormatValues::bind(&fields)?;
    let new_file_name = values.render(&format!("{}.{}", naming_format, file_extension))?;
    finish_rename(file_path, &new_file_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaRoute {
    Image,
    VideoAndAudio,
}

/// 拡張子からメタデータアダプタへの振り分け表。
/// exiftoolの有無と設定から起動時に一度だけ組み立てる。
#[derive(Debug, Clone)]
pub struct MediaRouting {
    image_extensions: Vec<String>,
    video_and_audio_extensions: Vec<String>,
    use_exiftool_on_images: bool,
}

impl MediaRouting {
    pub fn detect(config: &AppConfig, use_exiftool_on_images: Option<bool>) -> Self {
        let exiftool_exists = exiftool_available();
        if !exiftool_exists {
            warn!("\"exiftool\"が見つかりません");
        }
        Self::new(config, use_exiftool_on_images, exiftool_exists)
    }

    pub fn new(
        config: &AppConfig,
        use_exiftool_on_images: Option<bool>,
        exiftool_exists: bool,
    ) -> Self {
        let use_exiftool =
            use_exiftool_on_images.unwrap_or(config.use_exiftool_on_images) && exiftool_exists;

        let mut image_extensions = Vec::new();
        let mut video_and_audio_extensions = Vec::new();
        if exiftool_exists {
            if use_exiftool {
                image_extensions.extend(config.supported_file_extensions.exiftool.image.clone());
            } else {
                image_extensions.extend(config.supported_file_extensions.embedded.image.clone());
            }
            video_and_audio_extensions.extend(
                config
                    .supported_file_extensions
                    .exiftool
                    .video_and_audio
                    .clone(),
            );
        } else {
            image_extensions.extend(config.supported_file_extensions.embedded.image.clone());
        }

        Self {
            image_extensions: lowercase_all(image_extensions),
            video_and_audio_extensions: lowercase_all(video_and_audio_extensions),
            use_exiftool_on_images: use_exiftool,
        }
    }

    fn route_for(&self, extension_lowercase: &str) -> Option<MediaRoute> {
        if self
            .image_extensions
            .iter()
            .any(|ext| ext == extension_lowercase)
        {
            Some(MediaRoute::Image)
        } else if self
            .video_and_audio_extensions
            .iter()
            .any(|ext| ext == extension_lowercase)
        {
            Some(MediaRoute::VideoAndAudio)
        } else {
            None
        }
    }
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

fn resolve_route_info(
    file_path: &Path,
    route: MediaRoute,
    use_exiftool_on_images: bool,
) -> Result<MediaFileInfo> {
    let mut info = None;
    match route {
        MediaRoute::Image => {
            if use_exiftool_on_images {
                if let Some(fields) = read_exiftool_fields(file_path) {
                    info = resolve_media_info(&fields, &IMAGE_PROFILE)?;
                }
            }
            if info.is_none() {
                if let Some(fields) = read_embedded_fields(file_path) {
                    info = resolve_media_info(&fields, &IMAGE_PROFILE)?;
                }
            }
        }
        MediaRoute::VideoAndAudio => {
            if let Some(fields) = read_exiftool_fields(file_path) {
                info = resolve_media_info(&fields, &VIDEO_AND_AUDIO_PROFILE)?;
            }
        }
    }
    match info {
        Some(info) => Ok(info),
        None => MediaFileInfo::from_file_status(file_path),
    }
}

/// 強制日付の適用。AUTHENTICな時刻は強制日付より優先される。
fn curated_or_resolved(
    info: &MediaFileInfo,
    overrides: &RenameOverrides,
) -> Result<(DateTime<FixedOffset>, DateAndTimeType)> {
    let (date_and_time, date_and_time_type) = match overrides.forced_date {
        Some(date) if info.date_and_time_type != DateAndTimeType::Authentic => (
            midnight_in(date, forced_time_zone(overrides))?,
            DateAndTimeType::Curated,
        ),
        _ => (info.date_and_time, info.date_and_time_type),
    };
    let date_and_time = match overrides.forced_offset_time {
        Some(offset) => date_and_time.with_timezone(&offset),
        None => date_and_time,
    };
    Ok((date_and_time, date_and_time_type))
}

pub fn rename_media_file(
    file_path: &Path,
    config: &AppConfig,
    routing: &MediaRouting,
    registry: &FormatCodeRegistry,
    overrides: &RenameOverrides,
) -> Result<RenameOutcome> {
    if !file_path.is_file() {
        bail!("ファイルが存在しません: {}", file_path.display());
    }
    let file_name = file_name_of(file_path);
    let (file_name_prefix, file_extension) = split_file_name(&file_name);
    let naming_format = &config.naming_format.media_file;

    if overrides.skip_formatted
        && file_name_matches_naming_format(registry, &file_name_prefix, naming_format)?
    {
        info!(
            "命名フォーマット一致のためスキップ: {}",
            file_path.display()
        );
        return Ok(RenameOutcome::Skipped);
    }

    let Some(route) = routing.route_for(&file_extension.to_lowercase()) else {
        info!("対応していないメディアファイルです: {}", file_name);
        return Ok(RenameOutcome::Skipped);
    };

    let mut info = resolve_route_info(file_path, route, routing.use_exiftool_on_images)?;
    if let Some(exif_offset) = overrides.exif_offset_time {
        info.reinterpret_offset(exif_offset);
    }
    let (date_and_time, date_and_time_type) = curated_or_resolved(&info, overrides)?;
    let edit_type = info.edit_type(&config.editing_softwares_keywords);

    let mut values = FormatValues::bind(&TimeFields::from_date_time(&date_and_time))?;
    if let Some(label) = config.media.date_and_time_type.get(&date_and_time_type) {
        values.insert_label(FormatCode::DateAndTimeType, label.clone());
    }
    if let Some(label) = config.media.edit_type.get(&edit_type) {
        values.insert_label(FormatCode::EditType, label.clone());
    }

    let new_file_name = values.render(&format!("{}.{}", naming_format, file_extension))?;
    finish_rename(file_path, &new_file_name)
}

/// 一般ファイル用テンプレートの事前検証。
/// テンプレート・設定の誤りは1ファイル目ではなく実行開始前に落とす。
fn validate_general_format(registry: &FormatCodeRegistry, naming_format: &str) -> Result<()> {
    let fields = TimeFields {
        year: 2000,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        millisecond: None,
        offset: utc_offset(),
    };
    FormatValues::bind(&fields)?.render(&format!("{}.tmp", naming_format))?;
    naming_format_regex(registry, naming_format)?;
    Ok(())
}

fn validate_media_format(config: &AppConfig, registry: &FormatCodeRegistry) -> Result<()> {
    let naming_format = &config.naming_format.media_file;
    for part in parse_naming_format(naming_format)? {
        match part {
            TemplatePart::Code(FormatCode::DateAndTimeType)
                if config.media.date_and_time_type.len() < 3 =>
            {
                bail!("%{{dtt}}の表示ラベルが不足しています")
            }
            TemplatePart::Code(FormatCode::EditType) if config.media.edit_type.len() < 2 => {
                bail!("%{{et}}の表示ラベルが不足しています")
            }
            _ => {}
        }
    }
    naming_format_regex(registry, naming_format)?;
    Ok(())
}

fn log_directory_change(file_path: &Path, last_directory: &mut Option<PathBuf>) {
    let current = file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    if last_directory.as_ref() != Some(&current) {
        info!("処理中のフォルダ: {}", current.display());
        *last_directory = Some(current);
    }
}

fn is_hidden_name(file_name: &str) -> bool {
    file_name.starts_with('.')
}

pub fn rename_general_files(
    files_paths: &[PathBuf],
    config: &AppConfig,
    overrides: &RenameOverrides,
    skip_media_files: bool,
) -> Result<RenameStats> {
    let naming_format = &config.naming_format.general_file;
    let registry = config.format_code_registry();
    validate_general_format(&registry, naming_format)?;

    let skip_extensions: HashSet<String> = if skip_media_files {
        config
            .supported_file_extensions
            .exiftool
            .image
            .iter()
            .chain(config.supported_file_extensions.exiftool.video_and_audio.iter())
            .chain(config.supported_file_extensions.embedded.image.iter())
            .chain(config.ignored_file_extensions.iter())
            .map(|ext| ext.to_lowercase())
            .collect()
    } else {
        HashSet::new()
    };

    let mut stats = RenameStats::default();
    let mut last_directory: Option<PathBuf> = None;
    for file_path in files_paths {
        log_directory_change(file_path, &mut last_directory);
        let file_name = file_name_of(file_path);
        if is_hidden_name(&file_name) {
            info!("隠しファイルをスキップ: {}", file_path.display());
            stats.skipped += 1;
            continue;
        }
        let (_, extension) = split_file_name(&file_name);
        if skip_extensions.contains(&extension.to_lowercase()) {
            info!("対象外の拡張子をスキップ: {}", file_path.display());
            stats.skipped += 1;
            continue;
        }
        match rename_general_file(file_path, naming_format, &registry, overrides) {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                warn!(
                    "リネームに失敗しました: {} ({:#})",
                    file_path.display(),
                    err
                );
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

pub fn rename_media_files(
    files_paths: &[PathBuf],
    config: &AppConfig,
    overrides: &RenameOverrides,
    use_exiftool_on_images: Option<bool>,
) -> Result<RenameStats> {
    let registry = config.format_code_registry();
    validate_media_format(config, &registry)?;
    let routing = MediaRouting::detect(config, use_exiftool_on_images);

    let mut stats = RenameStats::default();
    let mut last_directory: Option<PathBuf> = None;
    for file_path in files_paths {
        log_directory_change(file_path, &mut last_directory);
        let file_name = file_name_of(file_path);
        if is_hidden_name(&file_name) {
            info!("隠しファイルをスキップ: {}", file_path.display());
            stats.skipped += 1;
            continue;
        }
        match rename_media_file(file_path, config, &routing, &registry, overrides) {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                warn!(
                    "リネームに失敗しました: {} ({:#})",
                    file_path.display(),
                    err
                );
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn forced_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    #[test]
    fn split_file_name_handles_missing_extension() {
        assert_eq!(
            split_file_name("IMG_0001.JPG"),
            ("IMG_0001".to_string(), "JPG".to_string())
        );
        assert_eq!(
            split_file_name("README"),
            ("README".to_string(), String::new())
        );
        assert_eq!(
            split_file_name("archive.tar.gz"),
            ("archive.tar".to_string(), "gz".to_string())
        );
    }

    #[test]
    fn collect_files_sorts_lexicographically() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("b.txt"), b"x").expect("write");
        fs::write(temp.path().join("a.txt"), b"x").expect("write");
        fs::create_dir(temp.path().join("sub")).expect("mkdir");
        fs::write(temp.path().join("sub").join("c.txt"), b"x").expect("write");

        let flat = collect_files(temp.path(), false).expect("collect");
        let names: Vec<String> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let recursive = collect_files(temp.path(), true).expect("collect");
        assert_eq!(recursive.len(), 3);
    }

    #[test]
    fn collect_files_fails_on_missing_directory() {
        let temp = tempdir().expect("tempdir");
        assert!(collect_files(&temp.path().join("nope"), false).is_err());
    }

    #[test]
    fn resolve_no_duplication_skips_taken_numbers() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("X.txt");
        fs::write(&target, b"x").expect("write");
        fs::write(temp.path().join("X_0001.txt"), b"x").expect("write");

        let other = temp.path().join("other.txt");
        let resolved = resolve_no_duplication(&target, &other).expect("resolve");
        assert_eq!(resolved, temp.path().join("X_0002.txt"));
    }

    #[test]
    fn resolve_no_duplication_allows_self_collision() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("X.txt");
        fs::write(&target, b"x").expect("write");
        let own_path = temp.path().join("X_0001.txt");
        fs::write(&own_path, b"x").expect("write");

        let resolved = resolve_no_duplication(&target, &own_path).expect("resolve");
        assert_eq!(resolved, own_path);
    }

    #[test]
    fn rename_general_file_uses_forced_date_and_offset() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("note.txt");
        fs::write(&path, b"x").expect("write");

        let config = AppConfig::default();
        let registry = config.format_code_registry();
        let overrides = RenameOverrides {
            forced_date: forced_date(2020, 1, 2),
            forced_offset_time: offset(9),
            ..Default::default()
        };

        let outcome = rename_general_file(&path, "%Y%m%d_%H%M%S%z", &registry, &overrides)
            .expect("must rename");
        assert_eq!(outcome, RenameOutcome::Renamed);
        assert!(temp.path().join("20200102_000000+0900.txt").is_file());
        assert!(!path.exists());
    }

    fn offset(hours: i32) -> Option<FixedOffset> {
        FixedOffset::east_opt(hours * 3600)
    }

    #[test]
    fn rename_general_file_is_noop_on_identical_name() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("20200102_000000+0000.txt");
        fs::write(&path, b"x").expect("write");

        let config = AppConfig::default();
        let registry = config.format_code_registry();
        let overrides = RenameOverrides {
            forced_date: forced_date(2020, 1, 2),
            ..Default::default()
        };

        let outcome = rename_general_file(&path, "%Y%m%d_%H%M%S%z", &registry, &overrides)
            .expect("must succeed");
        assert_eq!(outcome, RenameOutcome::Unchanged);
        assert!(path.is_file());
    }

    #[test]
    fn rename_general_file_resolves_collision_with_suffix() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("note.txt");
        fs::write(&path, b"x").expect("write");
        fs::write(temp.path().join("20200102_000000+0000.txt"), b"y").expect("write");

        let config = AppConfig::default();
        let registry = config.format_code_registry();
        let overrides = RenameOverrides {
            forced_date: forced_date(2020, 1, 2),
            ..Default::default()
        };

        let outcome = rename_general_file(&path, "%Y%m%d_%H%M%S%z", &registry, &overrides)
            .expect("must rename");
        assert_eq!(outcome, RenameOutcome::Renamed);
        assert!(temp.path().join("20200102_000000+0000_0001.txt").is_file());
    }

    #[test]
    fn rename_general_file_skips_already_formatted_names() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("20200102_000000+0000_0003.txt");
        fs::write(&path, b"x").expect("write");

        let config = AppConfig::default();
        let registry = config.format_code_registry();
        let overrides = RenameOverrides {
            skip_formatted: true,
            ..Default::default()
        };

        let outcome = rename_general_file(&path, "%Y%m%d_%H%M%S%z", &registry, &overrides)
            .expect("must succeed");
        assert_eq!(outcome, RenameOutcome::Skipped);
        assert!(path.is_file());
    }

    #[test]
    fn rename_general_file_fails_on_missing_file() {
        let temp = tempdir().expect("tempdir");
        let config = AppConfig::default();
        let registry = config.format_code_registry();
        assert!(rename_general_file(
            &temp.path().join("nope.txt"),
            "%Y%m%d",
            &registry,
            &RenameOverrides::default()
        )
        .is_err());
    }

    #[test]
    fn general_batch_skips_hidden_and_media_extensions() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(".hidden"), b"x").expect("write");
        fs::write(temp.path().join("photo.jpg"), b"x").expect("write");
        fs::write(temp.path().join("note.txt"), b"x").expect("write");

        let config = AppConfig::default();
        let files = collect_files(temp.path(), false).expect("collect");
        let stats = rename_general_files(&files, &config, &RenameOverrides::default(), true)
            .expect("must run");

        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.renamed, 1);
        assert_eq!(stats.failed, 0);
        assert!(temp.path().join(".hidden").is_file());
        assert!(temp.path().join("photo.jpg").is_file());
    }

    #[test]
    fn general_batch_aborts_on_invalid_template() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("note.txt"), b"x").expect("write");

        let mut config = AppConfig::default();
        config.naming_format.general_file = "%q".to_string();
        let files = collect_files(temp.path(), false).expect("collect");
        assert!(
            rename_general_files(&files, &config, &RenameOverrides::default(), false).is_err()
        );
        assert!(temp.path().join("note.txt").is_file());
    }

    #[test]
    fn general_batch_aborts_on_template_needing_media_labels() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("note.txt"), b"x").expect("write");

        let mut config = AppConfig::default();
        config.naming_format.general_file = "%Y%{dtt}".to_string();
        let files = collect_files(temp.path(), false).expect("collect");
        assert!(
            rename_general_files(&files, &config, &RenameOverrides::default(), false).is_err()
        );
    }

    #[test]
    fn curated_or_resolved_ignores_forced_date_for_authentic() {
        let date_and_time = utc_offset()
            .with_ymd_and_hms(2026, 2, 8, 10, 20, 30)
            .single()
            .expect("datetime");
        let info = MediaFileInfo::new(DateAndTimeType::Authentic, date_and_time, Vec::new());
        let overrides = RenameOverrides {
            forced_date: forced_date(2001, 1, 1),
            ..Default::default()
        };

        let (resolved, kind) = curated_or_resolved(&info, &overrides).expect("resolve");
        assert_eq!(kind, DateAndTimeType::Authentic);
        assert_eq!(resolved, date_and_time);
    }

    #[test]
    fn curated_or_resolved_replaces_best_with_forced_date() {
        let date_and_time = utc_offset()
            .with_ymd_and_hms(2026, 2, 8, 10, 20, 30)
            .single()
            .expect("datetime");
        let info = MediaFileInfo::new(DateAndTimeType::Best, date_and_time, Vec::new());
        let overrides = RenameOverrides {
            forced_date: forced_date(2001, 1, 1),
            forced_offset_time: offset(9),
            ..Default::default()
        };

        let (resolved, kind) = curated_or_resolved(&info, &overrides).expect("resolve");
        assert_eq!(kind, DateAndTimeType::Curated);
        // 深夜0時(+09:00)のまま表示タイムゾーンへ変換されるので壁時計は変わらない
        assert_eq!(
            resolved,
            FixedOffset::east_opt(9 * 3600)
                .expect("offset")
                .with_ymd_and_hms(2001, 1, 1, 0, 0, 0)
                .single()
                .expect("datetime")
        );
    }

    #[test]
    fn media_rename_falls_back_to_file_status_and_labels() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("photo.jpg");
        fs::write(&path, b"not a real jpeg").expect("write");

        let mut config = AppConfig::default();
        config.naming_format.media_file = "%Y%m%d_%{dtt}%{et}".to_string();
        let registry = config.format_code_registry();
        let routing = MediaRouting::new(&config, Some(false), false);
        let overrides = RenameOverrides {
            forced_date: forced_date(2021, 3, 4),
            ..Default::default()
        };

        let outcome = rename_media_file(&path, &config, &routing, &registry, &overrides)
            .expect("must rename");
        assert_eq!(outcome, RenameOutcome::Renamed);
        // ファイル更新時刻ベース(BEST)は強制日付でCURATEDに置き換わる
        assert!(temp.path().join("20210304_CO.jpg").is_file());
    }

    #[test]
    fn media_rename_skips_unsupported_extension() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("document.pdf");
        fs::write(&path, b"x").expect("write");

        let config = AppConfig::default();
        let registry = config.format_code_registry();
        let routing = MediaRouting::new(&config, Some(false), false);

        let outcome = rename_media_file(
            &path,
            &config,
            &routing,
            &registry,
            &RenameOverrides::default(),
        )
        .expect("must succeed");
        assert_eq!(outcome, RenameOutcome::Skipped);
        assert!(path.is_file());
    }

    #[test]
    fn media_routing_prefers_exiftool_extensions_when_available() {
        let config = AppConfig::default();

        let with_exiftool = MediaRouting::new(&config, None, true);
        assert!(with_exiftool.route_for("dng").is_some());
        assert!(with_exiftool.route_for("mp4").is_some());

        let without_exiftool = MediaRouting::new(&config, None, false);
        assert!(without_exiftool.route_for("dng").is_none());
        assert!(without_exiftool.route_for("mp4").is_none());
        assert!(without_exiftool.route_for("jpg").is_some());
    }

    #[test]
    fn media_batch_aborts_when_labels_are_missing() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("photo.jpg"), b"x").expect("write");

        let mut config = AppConfig::default();
        config.media.edit_type.clear();
        let files = collect_files(temp.path(), false).expect("collect");
        assert!(
            rename_media_files(&files, &config, &RenameOverrides::default(), Some(false)).is_err()
        );
    }
}
