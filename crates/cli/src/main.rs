use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sort_photos_core::{
    app_paths, load_config, save_config, sort_photos, undo_last, AppConfig, FileStatus,
    FilenameOptions, PlacementMode, SortOptions, SortReport, TimePrecision,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sort-photos")]
#[command(about = "写真を撮影日時で並べ替えやすいファイル名にリネーム/コピーします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 入力フォルダの写真を並べ替える
    Sort(SortArgs),
    /// 直前の実行を取り消す
    Undo,
    /// 設定ファイルを表示/作成する
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct SortArgs {
    /// 入力フォルダ
    input_dir: PathBuf,
    /// 出力フォルダ (省略時は入力フォルダ内でリネーム)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// 撮影時刻をファイル名に含める
    #[arg(short = 't', long, default_value_t = false, conflicts_with = "no_write_time")]
    write_time: bool,
    /// 設定ファイルの write_time = true を無視して時刻を含めない
    #[arg(long, default_value_t = false)]
    no_write_time: bool,
    #[arg(long, value_enum)]
    precision: Option<PrecisionArg>,
    /// ファイル名に含めるタグ
    #[arg(long)]
    tag: Option<String>,
    /// 出力フォルダへコピーせず移動する
    #[arg(long = "move", default_value_t = false, requires = "output_dir")]
    move_files: bool,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

impl SortArgs {
    /// Command-line flags take precedence over the config file.
    fn into_options(self, config: AppConfig, journal_path: PathBuf) -> SortOptions {
        let include_time = if self.no_write_time {
            false
        } else {
            self.write_time || config.write_time
        };

        let mut options = SortOptions::new(self.input_dir, self.output_dir);
        if self.move_files {
            options.mode = PlacementMode::Move;
        }
        options.filename = FilenameOptions {
            include_time,
            precision: self
                .precision
                .map(Into::into)
                .unwrap_or(config.time_precision),
        };
        options.tag = self.tag.or(config.tag);
        options.dry_run = self.dry_run;
        options.journal_path = Some(journal_path);
        options
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrecisionArg {
    Minute,
    Second,
}

impl From<PrecisionArg> for TimePrecision {
    fn from(value: PrecisionArg) -> Self {
        match value {
            PrecisionArg::Minute => TimePrecision::Minute,
            PrecisionArg::Second => TimePrecision::Second,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sort(args) => cmd_sort(args),
        Commands::Undo => cmd_undo(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sort(args: SortArgs) -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    let output = args.output;
    let options = args.into_options(config, paths.journal_path);

    let report = sort_photos(&options)?;
    log_outcomes(&report);

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&report);
        }
    }

    if report.dry_run {
        eprintln!("dry-runモード: 実ファイルは変更していません。");
    } else {
        eprintln!(
            "完了: {}件 (変更なし {}件, 失敗 {}件)",
            report.stats.placed, report.stats.unchanged, report.stats.failed
        );
    }

    Ok(())
}

fn log_outcomes(report: &SortReport) {
    for outcome in &report.outcomes {
        for warning in &outcome.warnings {
            tracing::warn!(path = %outcome.source.display(), "{warning}");
        }
        if let Some(error) = &outcome.error {
            tracing::error!(path = %outcome.source.display(), "{error}");
        }
    }
}

fn cmd_undo() -> Result<()> {
    let result = undo_last()?;
    println!(
        "取り消し完了: 復元 {}件, コピー削除 {}件, スキップ {}件",
        result.restored, result.removed_copies, result.skipped
    );
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let paths = app_paths()?;
    let state = if paths.config_path.exists() {
        "あり"
    } else {
        "なし (既定値を使用)"
    };
    println!("設定ファイル: {} [{}]", paths.config_path.display(), state);
    println!("取り消しログ: {}", paths.journal_path.display());
    println!("{}", toml::to_string_pretty(&load_config()?)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        anyhow::bail!(
            "設定ファイルは既に存在します: {}",
            paths.config_path.display()
        );
    }
    save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", paths.config_path.display());
    Ok(())
}

fn print_table(report: &SortReport) {
    println!("元ファイル -> 新ファイル (状態)");
    for outcome in &report.outcomes {
        let target = outcome
            .target
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = match outcome.status {
            FileStatus::Placed => "済",
            FileStatus::Planned => "予定",
            FileStatus::Unchanged => "変更なし",
            FileStatus::Failed => "失敗",
        };
        println!("{} -> {} ({})", outcome.source.display(), target, status);
    }

    println!(
        "\n集計: scanned={} hidden_skip={} dir_skip={} placed={} planned={} unchanged={} failed={} warnings={}",
        report.stats.scanned,
        report.stats.skipped_hidden,
        report.stats.skipped_dirs,
        report.stats.placed,
        report.stats.planned,
        report.stats.unchanged,
        report.stats.failed,
        report.stats.warnings
    );
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, OutputFormat, SortArgs};
    use clap::Parser;
    use sort_photos_core::{AppConfig, PlacementMode, TimePrecision};
    use std::path::PathBuf;

    fn sort_args(argv: &[&str]) -> SortArgs {
        let cli = Cli::try_parse_from(argv).expect("arguments must parse");
        match cli.command {
            Commands::Sort(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn config_with_time() -> AppConfig {
        AppConfig {
            write_time: true,
            time_precision: TimePrecision::Minute,
            tag: Some("family".to_string()),
        }
    }

    #[test]
    fn output_flag_selects_json_report() {
        let args = sort_args(&["sort-photos", "sort", "in", "--output", "json"]);
        assert!(matches!(args.output, OutputFormat::Json));
    }

    #[test]
    fn no_write_time_overrides_config() {
        let args = sort_args(&["sort-photos", "sort", "in", "--no-write-time"]);
        let options = args.into_options(config_with_time(), PathBuf::from("journal.json"));
        assert!(!options.filename.include_time);
    }

    #[test]
    fn config_supplies_defaults_when_flags_are_absent() {
        let args = sort_args(&["sort-photos", "sort", "in"]);
        let options = args.into_options(config_with_time(), PathBuf::from("journal.json"));
        assert!(options.filename.include_time);
        assert_eq!(options.filename.precision, TimePrecision::Minute);
        assert_eq!(options.tag.as_deref(), Some("family"));
        assert_eq!(options.mode, PlacementMode::Move);
    }

    #[test]
    fn flags_override_config_values() {
        let args = sort_args(&[
            "sort-photos",
            "sort",
            "in",
            "-o",
            "out",
            "--precision",
            "second",
            "--tag",
            "paris",
        ]);
        let options = args.into_options(config_with_time(), PathBuf::from("journal.json"));
        assert_eq!(options.filename.precision, TimePrecision::Second);
        assert_eq!(options.tag.as_deref(), Some("paris"));
        assert_eq!(options.mode, PlacementMode::Copy);
        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn conflicting_time_flags_are_rejected() {
        assert!(Cli::try_parse_from(["sort-photos", "sort", "in", "-t", "--no-write-time"]).is_err());
        assert!(Cli::try_parse_from(["sort-photos", "sort", "in", "--move"]).is_err());
    }
}
