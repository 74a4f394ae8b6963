use crate::media_info::{utc_offset, DateAndTimeType, MediaFileInfo};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use std::collections::HashMap;

/// メタデータソースアダプタが返す、タグ名から値へのマッピング。
pub type MetadataFields = HashMap<String, String>;

/// 日時・タイムゾーン・サブ秒のタグ名の組。
/// offsetは優先順に探索し、最初に見つかった値を使う。
#[derive(Debug, Clone, Copy)]
pub struct DateFieldGroup {
    pub date: &'static str,
    pub offset: &'static [&'static str],
    pub subsec: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolutionProfile {
    pub authentic: &'static [DateFieldGroup],
    pub best: &'static [DateFieldGroup],
}

pub const IMAGE_PROFILE: ResolutionProfile = ResolutionProfile {
    authentic: &[
        DateFieldGroup {
            date: "DateTimeOriginal",
            offset: &["OffsetTimeOriginal"],
            subsec: Some("SubSecTimeOriginal"),
        },
        DateFieldGroup {
            date: "CreateDate",
            offset: &["OffsetTimeDigitized"],
            subsec: Some("SubSecTimeDigitized"),
        },
    ],
    best: &[DateFieldGroup {
        date: "ModifyDate",
        offset: &["OffsetTime"],
        subsec: Some("SubSecTime"),
    }],
};

const VIDEO_OFFSET_FIELDS: &[&str] = &["OffsetTimeOriginal", "OffsetTimeDigitized", "OffsetTime"];

pub const VIDEO_AND_AUDIO_PROFILE: ResolutionProfile = ResolutionProfile {
    authentic: &[
        DateFieldGroup {
            date: "DateTimeOriginal",
            offset: VIDEO_OFFSET_FIELDS,
            subsec: None,
        },
        DateFieldGroup {
            date: "CreateDate",
            offset: VIDEO_OFFSET_FIELDS,
            subsec: None,
        },
        DateFieldGroup {
            date: "MediaCreateDate",
            offset: VIDEO_OFFSET_FIELDS,
            subsec: None,
        },
        DateFieldGroup {
            date: "TrackCreateDate",
            offset: VIDEO_OFFSET_FIELDS,
            subsec: None,
        },
    ],
    // 更新系の時刻はUTC表記として扱う
    best: &[
        DateFieldGroup {
            date: "ModifyDate",
            offset: &[],
            subsec: None,
        },
        DateFieldGroup {
            date: "MediaModifyDate",
            offset: &[],
            subsec: None,
        },
        DateFieldGroup {
            date: "TrackModifyDate",
            offset: &[],
            subsec: None,
        },
    ],
};

const SUSPECTED_SOFTWARE_FIELDS: &[&str] = &[
    "Software",
    "ProcessingSoftware",
    "HistorySoftwareAgent",
    "CreatorTool",
];

/// "[+,-]HH:MM"または"[+,-]HHMM"形式のオフセット時間をパースする。
pub fn offset_time_str_to_fixed_offset(value: &str) -> Result<FixedOffset> {
    let value = value.trim();
    let sign = match value.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => bail!("オフセット時間は+/-で始まる必要があります: {}", value),
    };
    let rest = &value[1..];
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => bail!("オフセット時間の形式が不正です: {}", value),
    };
    let hours: i32 = hours
        .parse()
        .with_context(|| format!("オフセット時間の形式が不正です: {}", value))?;
    let minutes: i32 = minutes
        .parse()
        .with_context(|| format!("オフセット時間の形式が不正です: {}", value))?;
    if hours > 23 || minutes > 59 {
        bail!("オフセット時間が範囲外です: {}", value);
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("オフセット時間が範囲外です: {}", value))
}

/// Exifの"%Y:%m:%d %H:%M:%S"形式の日時をパースする。
/// 日時やオフセットがパースできない場合はNone(次の候補へのフォールバック)を返す。
/// サブ秒がマイクロ秒を超える精度を持つ場合のみハードエラー。
pub fn parse_exif_date_time(
    naive: &str,
    offset: Option<&str>,
    subsec: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>> {
    let microsecond = match subsec.map(str::trim) {
        None => 0u32,
        Some(digits) => {
            if digits.chars().count() > 6 {
                bail!(
                    "サブ秒の精度がマイクロ秒を超えています: {}",
                    digits
                );
            }
            match digits.parse::<u32>() {
                Ok(value) => value * 10u32.pow(6 - digits.len() as u32),
                Err(_) => 0,
            }
        }
    };

    let time_zone = match offset {
        None => utc_offset(),
        Some(raw) => match offset_time_str_to_fixed_offset(raw) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(None),
        },
    };

    let Ok(parsed) = NaiveDateTime::parse_from_str(naive.trim(), "%Y:%m:%d %H:%M:%S") else {
        return Ok(None);
    };
    let Some(parsed) = parsed.with_nanosecond(microsecond * 1000) else {
        return Ok(None);
    };
    Ok(time_zone.from_local_datetime(&parsed).single())
}

/// フィールドグループを順に試し、最初にパースできた日時からレコードを組み立てる。
/// authentic側が全滅したらbest側へ落ち、どちらも駄目ならNone(ソース不採用)。
pub fn resolve_media_info(
    fields: &MetadataFields,
    profile: &ResolutionProfile,
) -> Result<Option<MediaFileInfo>> {
    let (date_and_time_type, date_and_time) =
        if let Some(found) = pick_date_time(fields, profile.authentic)? {
            (DateAndTimeType::Authentic, found)
        } else if let Some(found) = pick_date_time(fields, profile.best)? {
            (DateAndTimeType::Best, found)
        } else {
            return Ok(None);
        };

    let suspected_editing_software_keywords = SUSPECTED_SOFTWARE_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field).cloned())
        .collect();

    Ok(Some(MediaFileInfo::new(
        date_and_time_type,
        date_and_time,
        suspected_editing_software_keywords,
    )))
}

fn pick_date_time(
    fields: &MetadataFields,
    groups: &[DateFieldGroup],
) -> Result<Option<DateTime<FixedOffset>>> {
    for group in groups {
        let Some(raw) = fields.get(group.date) else {
            continue;
        };
        let offset = group
            .offset
            .iter()
            .find_map(|field| fields.get(*field))
            .map(String::as_str);
        let subsec = group
            .subsec
            .and_then(|field| fields.get(field))
            .map(String::as_str);
        if let Some(parsed) = parse_exif_date_time(raw, offset, subsec)? {
            return Ok(Some(parsed));
        }
    }
    Ok(None)
}
