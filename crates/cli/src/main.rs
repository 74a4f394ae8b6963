use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use trename_core::{
    app_paths, collect_files, load_config, offset_time_str_to_fixed_offset, rename_general_files,
    rename_media_files, save_config, AppConfig, RenameOverrides, RenameStats,
};

#[derive(Debug, Parser)]
#[command(name = "trename")]
#[command(about = "時刻情報からファイル名を一括リネームします")]
#[command(version)]
struct Cli {
    /// 設定ファイルのパス(省略時はOS標準の場所)
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,
    /// デバッグログを出力する
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// メディア以外の一般ファイルをリネームする
    General(GeneralArgs),
    /// 画像・動画・音声ファイルをメタデータでリネームする
    Media(MediaArgs),
    /// 設定ファイルを扱う
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// フォルダを再帰的に処理する
    #[arg(short = 'r', long, default_value_t = false)]
    recursive: bool,
    /// ファイルのオフセット時間を強制する。形式: "[+,-]HH:MM"
    #[arg(long)]
    forced_offset_time: Option<String>,
    /// この日付でリネームする。形式: YYYY-MM-DD
    #[arg(long)]
    forced_date: Option<NaiveDate>,
    /// メタデータ内の日時をこのオフセット時間として読み替える。形式: "[+,-]HH:MM"
    #[arg(long)]
    exif_offset_time: Option<String>,
    /// 命名フォーマットに一致済みのファイルを処理しない
    #[arg(long, default_value_t = false)]
    skip_formatted: bool,
    /// リネーム対象を含むフォルダ
    src: PathBuf,
}

#[derive(Debug, Args)]
struct GeneralArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// メディアファイルを処理しない
    #[arg(long, default_value_t = false)]
    skip_media_files: bool,
}

#[derive(Debug, Args)]
struct MediaArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// 画像のExif取得にexiftoolを使う(設定より優先)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    use_exiftool_on_images: Option<bool>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// 現在の設定を表示する
    Show,
    /// 既定値の設定ファイルをOS標準の場所に作成する
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::General(args) => cmd_general(cli.config_file.as_deref(), args),
        Commands::Media(args) => cmd_media(cli.config_file.as_deref(), args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(cli.config_file.as_deref()),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn init_logger(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" });
    let mut builder = env_logger::Builder::from_env(env);
    if !verbose {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.init();
}

fn build_overrides(common: &CommonArgs) -> Result<RenameOverrides> {
    let forced_offset_time = common
        .forced_offset_time
        .as_deref()
        .map(offset_time_str_to_fixed_offset)
        .transpose()?;
    let exif_offset_time = common
        .exif_offset_time
        .as_deref()
        .map(offset_time_str_to_fixed_offset)
        .transpose()?;
    Ok(RenameOverrides {
        forced_offset_time,
        forced_date: common.forced_date,
        exif_offset_time,
        skip_formatted: common.skip_formatted,
    })
}

fn cmd_general(config_file: Option<&std::path::Path>, args: GeneralArgs) -> Result<()> {
    let config = load_config(config_file)?;
    let overrides = build_overrides(&args.common)?;
    let files = collect_files(&args.common.src, args.common.recursive)?;
    let stats = rename_general_files(&files, &config, &overrides, args.skip_media_files)?;
    print_stats(&stats);
    Ok(())
}

fn cmd_media(config_file: Option<&std::path::Path>, args: MediaArgs) -> Result<()> {
    let config = load_config(config_file)?;
    let overrides = build_overrides(&args.common)?;
    let files = collect_files(&args.common.src, args.common.recursive)?;
    let stats = rename_media_files(&files, &config, &overrides, args.use_exiftool_on_images)?;
    print_stats(&stats);
    Ok(())
}

fn cmd_config_show(config_file: Option<&std::path::Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.is_file() {
        bail!(
            "設定ファイルは既に存在します: {}",
            paths.config_path.display()
        );
    }
    save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", paths.config_path.display());
    Ok(())
}

fn print_stats(stats: &RenameStats) {
    eprintln!(
        "集計: renamed={} unchanged={} skipped={} failed={}",
        stats.renamed, stats.unchanged, stats.skipped, stats.failed
    );
}
