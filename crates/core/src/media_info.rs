use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, LocalResult, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateAndTimeType {
    /// 撮影・録画・録音が実際に行われた時刻
    Authentic,
    /// メタデータから見つかった中で最良の時刻。本来欲しい時刻とは限らない
    Best,
    /// 操作者が明示的に指定した時刻
    Curated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditType {
    Original,
    Edited,
}

pub(crate) fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("UTC offset is always valid")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFileInfo {
    pub date_and_time_type: DateAndTimeType,
    pub date_and_time: DateTime<FixedOffset>,
    suspected_editing_software_keywords: Vec<String>,
}

impl MediaFileInfo {
    pub fn new(
        date_and_time_type: DateAndTimeType,
        date_and_time: DateTime<FixedOffset>,
        suspected_editing_software_keywords: Vec<String>,
    ) -> Self {
        let suspected_editing_software_keywords = suspected_editing_software_keywords
            .into_iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();
        Self {
            date_and_time_type,
            date_and_time,
            suspected_editing_software_keywords,
        }
    }

    /// ファイルの更新時刻(UTC)だけを根拠にした最後の手段のレコード。
    pub fn from_file_status(file_path: &Path) -> Result<Self> {
        let modified = fs::metadata(file_path)
            .with_context(|| format!("ファイル情報を取得できませんでした: {}", file_path.display()))?
            .modified()
            .with_context(|| format!("更新時刻を取得できませんでした: {}", file_path.display()))?;
        let date_and_time: DateTime<Utc> = modified.into();
        Ok(Self::new(
            DateAndTimeType::Best,
            date_and_time.with_timezone(&utc_offset()),
            Vec::new(),
        ))
    }

    pub fn is_edited(&self, editing_softwares_keywords: &[String]) -> bool {
        editing_softwares_keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            !keyword.is_empty()
                && self
                    .suspected_editing_software_keywords
                    .iter()
                    .any(|sample| sample.contains(&keyword))
        })
    }

    pub fn edit_type(&self, editing_softwares_keywords: &[String]) -> EditType {
        if self.is_edited(editing_softwares_keywords) {
            EditType::Edited
        } else {
            EditType::Original
        }
    }

    /// 壁時計の値は変えずにタイムゾーンだけを読み替える。
    pub fn reinterpret_offset(&mut self, offset: FixedOffset) {
        let naive = self.date_and_time.naive_local();
        if let LocalResult::Single(relabelled) = offset.from_local_datetime(&naive) {
            self.date_and_time = relabelled;
        }
    }
}
