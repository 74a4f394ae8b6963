use crate::resolve::MetadataFields;
use log::debug;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// exiftoolコマンドが起動できるかどうかを確認する。
pub fn exiftool_available() -> bool {
    match Command::new("exiftool").args(["-echo", "OK"]).output() {
        Ok(output) => {
            output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "OK"
        }
        Err(_) => false,
    }
}

/// exiftoolのJSON出力をタグ名から値へのマッピングに変換する。
/// 実行失敗・出力不正は「データなし」として扱う。
pub fn read_exiftool_fields(file_path: &Path) -> Option<MetadataFields> {
    let output = Command::new("exiftool")
        .args(["-ExtractEmbedded", "-j"])
        .arg(file_path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(text.trim_end_matches(['\r', '\n'])).ok()?;
    let object = value.as_array()?.first()?.as_object()?;

    let mut fields = MetadataFields::new();
    for (key, value) in object {
        let rendered = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => continue,
        };
        fields.insert(key.clone(), rendered);
    }
    if fields.is_empty() {
        return None;
    }

    debug!(
        "exiftool出力: {}項目 ({})",
        fields.len(),
        file_path.display()
    );
    Some(fields)
}
