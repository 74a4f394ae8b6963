use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatCode {
    Year4,
    Year2,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    OffsetTime,
    DateAndTimeType,
    EditType,
}

impl FormatCode {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            'Y' => Some(Self::Year4),
            'y' => Some(Self::Year2),
            'm' => Some(Self::Month),
            'd' => Some(Self::Day),
            'H' => Some(Self::Hour),
            'M' => Some(Self::Minute),
            'S' => Some(Self::Second),
            'z' => Some(Self::OffsetTime),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ms" => Some(Self::Millisecond),
            "dtt" => Some(Self::DateAndTimeType),
            "et" => Some(Self::EditType),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Year4 => "%Y",
            Self::Year2 => "%y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::Hour => "%H",
            Self::Minute => "%M",
            Self::Second => "%S",
            Self::Millisecond => "%{ms}",
            Self::OffsetTime => "%z",
            Self::DateAndTimeType => "%{dtt}",
            Self::EditType => "%{et}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Code(FormatCode),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("テンプレートが空です")]
    Empty,
    #[error("%の後にフォーマットコードがありません")]
    DanglingPercent,
    #[error("中括弧が閉じられていません: %{{{0}")]
    UnterminatedBrace(String),
    #[error("未対応のフォーマットコードです: %{0}")]
    UnknownCode(String),
    #[error("フォーマットコードの正規表現が未登録です: {0}")]
    UnregisteredCode(&'static str),
    #[error("フォーマットコードに対応する値がありません: {0}")]
    NoValue(&'static str),
    #[error("値が範囲外です: {field}={value}")]
    ValueOutOfRange { field: &'static str, value: i64 },
    #[error("正規表現を構築できませんでした: {0}")]
    InvalidRegex(String),
}

pub fn parse_naming_format(input: &str) -> Result<Vec<TemplatePart>, TemplateError> {
    if input.is_empty() {
        return Err(TemplateError::Empty);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            literal.push(ch);
            continue;
        }
        match chars.next() {
            None => return Err(TemplateError::DanglingPercent),
            Some('%') => literal.push('%'),
            Some('{') => {
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed {
                    return Err(TemplateError::UnterminatedBrace(name));
                }
                let code = FormatCode::from_name(&name)
                    .ok_or_else(|| TemplateError::UnknownCode(format!("{{{}}}", name)))?;
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Code(code));
            }
            Some(other) => {
                let code = FormatCode::from_char(other)
                    .ok_or_else(|| TemplateError::UnknownCode(other.to_string()))?;
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Code(code));
            }
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    Ok(parts)
}

/// フォーマットコードと正規表現フラグメントの対応表。
/// 起動時に設定から一度だけ組み立て、以後は読み取り専用で使う。
#[derive(Debug, Clone)]
pub struct FormatCodeRegistry {
    fragments: BTreeMap<FormatCode, String>,
}

impl Default for FormatCodeRegistry {
    fn default() -> Self {
        let mut fragments = BTreeMap::new();
        fragments.insert(FormatCode::Year4, r"\d{4}".to_string());
        fragments.insert(FormatCode::Year2, r"\d{2}".to_string());
        fragments.insert(FormatCode::Month, r"(0[1-9]|1[0-2])".to_string());
        fragments.insert(FormatCode::Day, r"(0[1-9]|[1-2][0-9]|3[0-1])".to_string());
        fragments.insert(FormatCode::Hour, r"(0[0-9]|1[0-9]|2[0-3])".to_string());
        fragments.insert(FormatCode::Minute, r"[0-5][0-9]".to_string());
        fragments.insert(FormatCode::Second, r"[0-5][0-9]".to_string());
        fragments.insert(FormatCode::Millisecond, r"\d{3}".to_string());
        fragments.insert(
            FormatCode::OffsetTime,
            r"[+-](0[0-9]|1[0-9]|2[0-3])[0-5][0-9]".to_string(),
        );
        Self { fragments }
    }
}

impl FormatCodeRegistry {
    pub fn register_regex(&mut self, code: FormatCode, fragment: &str) {
        self.fragments.insert(code, format!("({})", fragment));
    }

    pub fn register_choices<I, S>(&mut self, code: FormatCode, choices: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternation = choices
            .into_iter()
            .map(|choice| regex::escape(choice.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        self.fragments.insert(code, format!("({})", alternation));
    }

    pub fn codes(&self) -> impl Iterator<Item = FormatCode> + '_ {
        self.fragments.keys().copied()
    }

    fn fragment(&self, code: FormatCode) -> Result<&str, TemplateError> {
        self.fragments
            .get(&code)
            .map(String::as_str)
            .ok_or(TemplateError::UnregisteredCode(code.token()))
    }
}

pub fn naming_format_regex(
    registry: &FormatCodeRegistry,
    naming_format: &str,
) -> Result<String, TemplateError> {
    let parts = parse_naming_format(naming_format)?;
    let mut out = String::new();
    for part in &parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(&regex::escape(text)),
            TemplatePart::Code(code) => out.push_str(registry.fragment(*code)?),
        }
    }
    Ok(out)
}

/// そのテンプレートから生成され得る名前(連番サフィックス付きを含む)かどうかを判定する。
pub fn file_name_matches_naming_format(
    registry: &FormatCodeRegistry,
    file_name_prefix: &str,
    naming_format: &str,
) -> Result<bool, TemplateError> {
    let body = naming_format_regex(registry, naming_format)?;
    let pattern = format!(r"^{}(_\d{{4}})?$", body);
    let re = Regex::new(&pattern).map_err(|err| TemplateError::InvalidRegex(err.to_string()))?;
    Ok(re.is_match(file_name_prefix))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: Option<u32>,
    pub offset: FixedOffset,
}

impl TimeFields {
    pub fn from_date_time(date_and_time: &DateTime<FixedOffset>) -> Self {
        Self {
            year: date_and_time.year(),
            month: date_and_time.month(),
            day: date_and_time.day(),
            hour: date_and_time.hour(),
            minute: date_and_time.minute(),
            second: date_and_time.second(),
            // 閏秒はミリ秒フィールドの上限に丸める
            millisecond: Some(date_and_time.timestamp_subsec_millis().min(999)),
            offset: *date_and_time.offset(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormatValues {
    values: BTreeMap<FormatCode, String>,
}

impl FormatValues {
    /// 時刻フィールドを範囲検証のうえで文字列に束縛する。
    /// ミリ秒のみ未指定を許し、`000`として扱う。
    pub fn bind(fields: &TimeFields) -> Result<Self, TemplateError> {
        check_range("year", i64::from(fields.year), 0, 9999)?;
        check_range("month", i64::from(fields.month), 1, 12)?;
        check_range("day", i64::from(fields.day), 1, 31)?;
        check_range("hour", i64::from(fields.hour), 0, 23)?;
        check_range("minute", i64::from(fields.minute), 0, 59)?;
        check_range("second", i64::from(fields.second), 0, 59)?;
        let millisecond = fields.millisecond.unwrap_or(0);
        check_range("millisecond", i64::from(millisecond), 0, 999)?;

        let mut values = BTreeMap::new();
        values.insert(FormatCode::Year4, format!("{:04}", fields.year));
        values.insert(FormatCode::Year2, format!("{:02}", fields.year % 100));
        values.insert(FormatCode::Month, format!("{:02}", fields.month));
        values.insert(FormatCode::Day, format!("{:02}", fields.day));
        values.insert(FormatCode::Hour, format!("{:02}", fields.hour));
        values.insert(FormatCode::Minute, format!("{:02}", fields.minute));
        values.insert(FormatCode::Second, format!("{:02}", fields.second));
        values.insert(FormatCode::Millisecond, format!("{:03}", millisecond));
        values.insert(FormatCode::OffsetTime, format_offset(&fields.offset));
        Ok(Self { values })
    }

    pub fn insert_label(&mut self, code: FormatCode, label: String) {
        self.values.insert(code, label);
    }

    pub fn render(&self, naming_format: &str) -> Result<String, TemplateError> {
        let parts = parse_naming_format(naming_format)?;
        let mut out = String::new();
        for part in &parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Code(code) => {
                    let value = self
                        .values
                        .get(code)
                        .ok_or(TemplateError::NoValue(code.token()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn format_offset(offset: &FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let total = total.abs();
    format!("{}{:02}{:02}", sign, total / 3600, (total % 3600) / 60)
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), TemplateError> {
    if value < min || value > max {
        return Err(TemplateError::ValueOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn fields() -> TimeFields {
        TimeFields {
            year: 6543,
            month: 2,
            day: 10,
            hour: 12,
            minute: 3,
            second: 4,
            millisecond: Some(567),
            offset: FixedOffset::east_opt(8 * 3600).expect("offset"),
        }
    }

    fn registry_with_labels() -> FormatCodeRegistry {
        let mut registry = FormatCodeRegistry::default();
        registry.register_choices(FormatCode::DateAndTimeType, ["A", "B", "C"]);
        registry.register_choices(FormatCode::EditType, ["O", "E"]);
        registry
    }

    #[test]
    fn render_substitutes_every_code_with_padding() {
        let values = FormatValues::bind(&fields()).expect("must bind");
        let rendered = values.render(r"^%Y%m%d%H%M%S%{ms}%z%%").expect("must render");
        assert_eq!(rendered, "^65430210120304567+0800%");
    }

    #[test]
    fn render_defaults_missing_millisecond_to_zero() {
        let mut f = fields();
        f.millisecond = None;
        let values = FormatValues::bind(&f).expect("must bind");
        assert_eq!(values.render("%{ms}").expect("must render"), "000");
    }

    #[test]
    fn render_two_digit_year_and_utc_offset() {
        let mut f = fields();
        f.year = 2026;
        f.offset = FixedOffset::east_opt(0).expect("offset");
        let values = FormatValues::bind(&f).expect("must bind");
        assert_eq!(values.render("%y%z").expect("must render"), "26+0000");
    }

    #[test]
    fn render_negative_offset() {
        let mut f = fields();
        f.offset = FixedOffset::west_opt(9 * 3600 + 30 * 60).expect("offset");
        let values = FormatValues::bind(&f).expect("must bind");
        assert_eq!(values.render("%z").expect("must render"), "-0930");
    }

    #[test]
    fn bind_rejects_out_of_range_values() {
        let mut f = fields();
        f.month = 13;
        assert!(matches!(
            FormatValues::bind(&f).expect_err("must fail"),
            TemplateError::ValueOutOfRange { field: "month", .. }
        ));

        let mut f = fields();
        f.hour = 24;
        assert!(matches!(
            FormatValues::bind(&f).expect_err("must fail"),
            TemplateError::ValueOutOfRange { field: "hour", .. }
        ));

        let mut f = fields();
        f.millisecond = Some(1000);
        assert!(matches!(
            FormatValues::bind(&f).expect_err("must fail"),
            TemplateError::ValueOutOfRange {
                field: "millisecond",
                ..
            }
        ));
    }

    #[test]
    fn malformed_templates_fail_in_render_and_matcher_alike() {
        let values = FormatValues::bind(&fields()).expect("must bind");
        let registry = registry_with_labels();

        for template in ["%q", "%{unterminated", "abc%"] {
            let render_err = values.render(template).expect_err("render must fail");
            let regex_err =
                naming_format_regex(&registry, template).expect_err("matcher must fail");
            assert_eq!(render_err, regex_err);
        }
    }

    #[test]
    fn unknown_codes_report_the_offending_token() {
        let err = parse_naming_format("%q").expect_err("must fail");
        assert_eq!(err, TemplateError::UnknownCode("q".to_string()));

        let err = parse_naming_format("%{foo}").expect_err("must fail");
        assert_eq!(err, TemplateError::UnknownCode("{foo}".to_string()));
    }

    #[test]
    fn render_errors_on_unbound_classification_code() {
        let values = FormatValues::bind(&fields()).expect("must bind");
        let err = values.render("%{dtt}").expect_err("must fail");
        assert_eq!(err, TemplateError::NoValue("%{dtt}"));
    }

    #[test]
    fn rendered_name_matches_matcher_built_from_same_template() {
        let template = "IMG_%Y%y%m%d_%H%M%S_%{ms}%z_%{dtt}%{et}";
        let registry = registry_with_labels();

        let mut values = FormatValues::bind(&fields()).expect("must bind");
        values.insert_label(FormatCode::DateAndTimeType, "A".to_string());
        values.insert_label(FormatCode::EditType, "O".to_string());
        let rendered = values.render(template).expect("must render");

        assert!(
            file_name_matches_naming_format(&registry, &rendered, template).expect("must match")
        );
        let with_suffix = format!("{}_0007", rendered);
        assert!(file_name_matches_naming_format(&registry, &with_suffix, template)
            .expect("must match"));
        let with_garbage = format!("{}x", rendered);
        assert!(!file_name_matches_naming_format(&registry, &with_garbage, template)
            .expect("must not match"));
    }

    #[test]
    fn matcher_escapes_literal_regex_metacharacters() {
        let registry = FormatCodeRegistry::default();
        assert!(file_name_matches_naming_format(&registry, "a.b_2026", "a.b_%Y").expect("ok"));
        assert!(!file_name_matches_naming_format(&registry, "aXb_2026", "a.b_%Y").expect("ok"));
    }

    #[test]
    fn matcher_rejects_out_of_range_components() {
        let registry = FormatCodeRegistry::default();
        assert!(file_name_matches_naming_format(&registry, "20260229", "%Y%m%d").expect("ok"));
        assert!(!file_name_matches_naming_format(&registry, "20261301", "%Y%m%d").expect("ok"));
        assert!(!file_name_matches_naming_format(&registry, "20260232", "%Y%m%d").expect("ok"));
    }

    #[test]
    fn matcher_errors_on_unregistered_code() {
        let registry = FormatCodeRegistry::default();
        let err = naming_format_regex(&registry, "%{dtt}").expect_err("must fail");
        assert_eq!(err, TemplateError::UnregisteredCode("%{dtt}"));
    }

    #[test]
    fn register_choices_escapes_metacharacters() {
        let mut registry = FormatCodeRegistry::default();
        registry.register_choices(FormatCode::EditType, ["a+b", "c"]);
        let body = naming_format_regex(&registry, "%{et}").expect("must build");
        assert_eq!(body, r"(a\+b|c)");
    }

    #[test]
    fn codes_lists_builtins() {
        let registry = FormatCodeRegistry::default();
        let codes: Vec<FormatCode> = registry.codes().collect();
        assert_eq!(codes.len(), 9);
        assert!(codes.contains(&FormatCode::Millisecond));
        assert!(!codes.contains(&FormatCode::DateAndTimeType));
    }
}
