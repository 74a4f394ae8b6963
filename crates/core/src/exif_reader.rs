use crate::resolve::MetadataFields;
use exif::Reader;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// kamadak-exifのタグ名をexiftoolのタグ名に揃えて、解決ルーチンを共有する
const TAG_ALIASES: &[(&str, &str)] = &[
    ("DateTimeOriginal", "DateTimeOriginal"),
    ("OffsetTimeOriginal", "OffsetTimeOriginal"),
    ("SubSecTimeOriginal", "SubSecTimeOriginal"),
    ("DateTimeDigitized", "CreateDate"),
    ("OffsetTimeDigitized", "OffsetTimeDigitized"),
    ("SubSecTimeDigitized", "SubSecTimeDigitized"),
    ("DateTime", "ModifyDate"),
    ("OffsetTime", "OffsetTime"),
    ("SubSecTime", "SubSecTime"),
    ("Software", "Software"),
    ("ProcessingSoftware", "ProcessingSoftware"),
];

/// 同梱ライブラリでファイル内のExifを読むアダプタ。
/// 読めない・対象タグがない場合は「データなし」として扱う。
pub fn read_embedded_fields(file_path: &Path) -> Option<MetadataFields> {
    let file = File::open(file_path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut buf).ok()?;

    let mut fields = MetadataFields::new();
    for field in exif.fields() {
        let tag_name = format!("{:?}", field.tag);
        let Some((_, alias)) = TAG_ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&tag_name))
        else {
            continue;
        };
        if fields.contains_key(*alias) {
            continue;
        }
        let value = field
            .display_value()
            .with_unit(&exif)
            .to_string()
            .trim()
            .trim_matches('"')
            .to_string();
        if value.is_empty() {
            continue;
        }
        fields.insert(alias.to_string(), value);
    }
    if fields.is_empty() {
        return None;
    }

    debug!(
        "埋め込みExif: {}項目 ({})",
        fields.len(),
        file_path.display()
    );
    Some(fields)
}
