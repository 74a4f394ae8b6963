mod config;
mod exif_reader;
mod exiftool;
mod media_info;
mod renamer;
mod resolve;
mod template;

pub use config::{
    app_paths, load_config, save_config, AppConfig, AppPaths, EmbeddedExtensions,
    ExiftoolExtensions, MediaLabelConfig, NamingFormatConfig, SupportedExtensions,
};
pub use exif_reader::read_embedded_fields;
pub use exiftool::{exiftool_available, read_exiftool_fields};
pub use media_info::{DateAndTimeType, EditType, MediaFileInfo};
pub use renamer::{
    collect_files, rename_general_file, rename_general_files, rename_media_file,
    rename_media_files, split_file_name, MediaRouting, RenameOutcome, RenameOverrides, RenameStats,
};
pub use resolve::{
    offset_time_str_to_fixed_offset, parse_exif_date_time, resolve_media_info, DateFieldGroup,
    MetadataFields, ResolutionProfile, IMAGE_PROFILE, VIDEO_AND_AUDIO_PROFILE,
};
pub use template::{
    file_name_matches_naming_format, naming_format_regex, parse_naming_format, FormatCode,
    FormatCodeRegistry, FormatValues, TemplateError, TemplatePart, TimeFields,
};
