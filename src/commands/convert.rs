//! # convert 命令实现
//!
//! 批量转换图像格式并缩放。
//!
//! ## 功能
//! - 校验目标目录存在且可写
//! - 展开 glob 模式，打印设置摘要与文件清单
//! - 交互确认（`--quiet` 跳过）与 `--dry-run`
//! - 并行转换并打印汇总报告，可导出 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `batch/` 执行批量处理
//! - 使用 `utils/output.rs`, `utils/prompt.rs`

use crate::batch::{plan_jobs, BatchRunner, PatternResolver};
use crate::cli::convert::ConvertArgs;
use crate::error::{PixbatchError, Result};
use crate::models::{BatchReport, OutcomeRow, TranscodeOptions};
use crate::utils::{output, prompt};

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 文件清单最多逐个列出的文件数
const FILE_LIST_LIMIT: usize = 10;

/// 设置摘要表格行
#[derive(Debug, Clone, Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 失败文件表格行
#[derive(Debug, Clone, Tabled)]
struct FailureRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    let options = args.transcode_options()?;

    if args.ratio == Some(100) && options.output_format().is_none() {
        output::print_info("Ratio is 100% and no output format was given.");
        output::print_info("You can simply copy files over in this case!");
        return Ok(());
    }

    validate_dest_dir(&args.dest_dir)?;

    output::print_info("Finding matching files...");
    let files = PatternResolver::new(args.patterns.iter().cloned()).resolve()?;

    if files.is_empty() {
        output::print_warning("No files found matching the specified patterns, nothing to process.");
        return Ok(());
    }

    output::print_header("Processing Summary");
    println!("{}", Table::new(summary_rows(&args.dest_dir, &options, files.len())));

    if files.len() <= FILE_LIST_LIMIT {
        println!();
        output::print_info("Files to process:");
        for file in &files {
            output::print_item(&file_name(file));
        }
    } else if !args.quiet {
        output::print_info(&format!(
            "{} files to process (too many to list)",
            files.len()
        ));
    }

    if args.dry_run {
        let jobs = plan_jobs(files.iter(), &args.dest_dir, options.output_format());
        for job in &jobs {
            if let Some(first) = &job.claimed_by {
                output::print_warning(&format!(
                    "{} would overwrite the output of {} ({})",
                    job.source.display(),
                    first.display(),
                    job.dest.display()
                ));
            }
        }
        println!();
        output::print_warning("Dry run completed. No files were actually processed.");
        return Ok(());
    }

    if !args.quiet {
        println!();
        if !prompt::confirm("Proceed with processing?")? {
            output::print_info("Operation cancelled.");
            return Ok(());
        }
    }

    output::print_info(&format!("Processing {} files...", files.len()));

    let report = BatchRunner::new(args.jobs)
        .quiet(args.quiet)
        .run_files(files.iter(), &args.dest_dir, &options)?;

    print_report(&report, &args.dest_dir);

    if let Some(path) = &args.report {
        save_report_csv(&report, path)?;
        output::print_success(&format!("Report saved to '{}'", path.display()));
    }

    Ok(())
}

/// 目标目录必须存在且可写；不自动创建
pub fn validate_dest_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(PixbatchError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    tempfile::Builder::new()
        .prefix(".pixbatch-")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|e| PixbatchError::DirectoryNotWritable {
            path: dir.display().to_string(),
            source: e,
        })
}

fn summary_rows(dest_dir: &Path, options: &TranscodeOptions, file_count: usize) -> Vec<SettingRow> {
    vec![
        SettingRow {
            setting: "Files found",
            value: file_count.to_string(),
        },
        SettingRow {
            setting: "Destination",
            value: absolute(dest_dir).display().to_string(),
        },
        SettingRow {
            setting: "Output format",
            value: options
                .output_format()
                .map(|f| f.to_string())
                .unwrap_or_else(|| "Keep original".to_string()),
        },
        SettingRow {
            setting: "Resize",
            value: options
                .resize()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "No resizing".to_string()),
        },
        SettingRow {
            setting: "GIF transparency",
            value: if options.preserve_gif_transparency() {
                "Yes".to_string()
            } else {
                "No".to_string()
            },
        },
    ]
}

fn print_report(report: &BatchReport, dest_dir: &Path) {
    println!();
    output::print_separator();

    if report.success_count > 0 {
        output::print_success(&format!(
            "Successfully processed {} file(s)",
            report.success_count
        ));
    }

    if report.failure_count > 0 {
        output::print_warning(&format!(
            "Failed to process {} file(s):",
            report.failure_count
        ));
        let rows: Vec<FailureRow> = report
            .failures()
            .map(|o| FailureRow {
                file: o.file_name(),
                reason: o.error_message.clone().unwrap_or_default(),
            })
            .collect();
        println!("{}", Table::new(&rows));
    }

    output::print_done(&format!(
        "Output saved to: {}",
        absolute(dest_dir).display()
    ));
}

/// 保存逐文件报告到 CSV
pub fn save_report_csv(report: &BatchReport, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(PixbatchError::CsvError)?;

    for outcome in &report.outcomes {
        wtr.serialize(OutcomeRow::from(outcome))
            .map_err(PixbatchError::CsvError)?;
    }

    wtr.flush().map_err(|e| PixbatchError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileOutcome, OutputFormat};
    use image::{ImageFormat, Rgba, RgbaImage};

    fn args(patterns: Vec<String>, dest_dir: PathBuf) -> ConvertArgs {
        ConvertArgs {
            patterns,
            dest_dir,
            format: None,
            ratio: None,
            width: None,
            height: None,
            gif_transparency: false,
            quiet: true,
            dry_run: false,
            jobs: 1,
            report: None,
        }
    }

    #[test]
    fn test_missing_dest_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            validate_dest_dir(&missing),
            Err(PixbatchError::DirectoryNotFound { .. })
        ));
        assert!(validate_dest_dir(dir.path()).is_ok());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_execute_end_to_end_with_report() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.save_with_format(src.path().join("logo.png"), ImageFormat::Png)
            .unwrap();

        let csv_path = src.path().join("report.csv");
        let mut convert = args(
            vec![format!("{}/*.png", src.path().display())],
            out.path().to_path_buf(),
        );
        convert.format = Some(OutputFormat::Gif);
        convert.width = Some(10);
        convert.gif_transparency = true;
        convert.report = Some(csv_path.clone());

        execute(convert).unwrap();

        let written = image::open(out.path().join("logo.gif")).unwrap();
        assert_eq!((written.width(), written.height()), (10, 5));

        let csv = fs::read_to_string(csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("source,destination,success,error"));
        assert!(lines.next().unwrap().contains(",true,"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        RgbaImage::new(4, 4)
            .save_with_format(src.path().join("a.png"), ImageFormat::Png)
            .unwrap();

        let mut convert = args(
            vec![format!("{}/*.png", src.path().display())],
            out.path().to_path_buf(),
        );
        convert.dry_run = true;
        convert.format = Some(OutputFormat::Bmp);

        execute(convert).unwrap();
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_ratio_100_without_format_does_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        RgbaImage::new(4, 4)
            .save_with_format(src.path().join("a.png"), ImageFormat::Png)
            .unwrap();

        let mut convert = args(
            vec![format!("{}/*.png", src.path().display())],
            out.path().to_path_buf(),
        );
        convert.ratio = Some(100);

        execute(convert).unwrap();
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_nothing_matched_is_not_an_error() {
        let out = tempfile::tempdir().unwrap();
        let convert = args(
            vec![format!("{}/*.png", out.path().display())],
            out.path().to_path_buf(),
        );
        assert!(execute(convert).is_ok());
    }

    #[test]
    fn test_report_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        let report = BatchReport::from_outcomes(vec![
            FileOutcome::succeeded("a.png".into(), "out/a.png".into()),
            FileOutcome::failed("b.png".into(), "out/b.png".into(), "unreadable"),
        ]);

        save_report_csv(&report, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "source,destination,success,error\n\
             a.png,out/a.png,true,\n\
             b.png,out/b.png,false,unreadable\n"
        );
    }
}
