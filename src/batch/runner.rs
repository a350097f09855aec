//! # 批量执行器
//!
//! 并行执行“读取 → 解码 → 缩放 → 格式适配 → 编码写出”的单文件流水线。
//!
//! ## 功能
//! - 基于 rayon 的有界线程池并行处理
//! - 目标路径冲突在处理前统一检测
//! - 单文件失败转为 `FileOutcome`，不中断整批
//! - 进度条显示（quiet 模式隐藏）
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `batch/resolver.rs` 展开模式
//! - 使用 `codec/` 与 `transform/` 完成单文件变换
//! - 使用 `utils/progress.rs` 创建进度条

use super::resolver::PatternResolver;
use crate::codec::{decode, encode};
use crate::error::{PixbatchError, Result};
use crate::models::{BatchReport, Container, FileOutcome, OutputFormat, TranscodeOptions};
use crate::transform::{adapt, resize};
use crate::utils::progress;

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 单个待处理文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// 目标路径已被更早的源文件占用时，记录该源文件
    pub claimed_by: Option<PathBuf>,
}

/// 计算目标路径
///
/// 指定输出格式时为 `<stem>.<ext>`，否则原样沿用源文件名。
pub fn destination_for(source: &Path, dest_dir: &Path, output_format: Option<OutputFormat>) -> PathBuf {
    match output_format {
        Some(format) => {
            let stem = source.file_stem().unwrap_or_default();
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(format.extension());
            dest_dir.join(name)
        }
        None => dest_dir.join(source.file_name().unwrap_or_default()),
    }
}

/// 为每个文件分配目标路径，并标记冲突
pub fn plan_jobs<'a, I>(files: I, dest_dir: &Path, output_format: Option<OutputFormat>) -> Vec<Job>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    files
        .into_iter()
        .map(|source| {
            let dest = destination_for(source, dest_dir, output_format);
            let claimed_by = match claimed.get(&dest) {
                Some(first) => Some(first.clone()),
                None => {
                    claimed.insert(dest.clone(), source.clone());
                    None
                }
            };
            Job {
                source: source.clone(),
                dest,
                claimed_by,
            }
        })
        .collect()
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    /// 隐藏进度条
    quiet: bool,
}

impl BatchRunner {
    /// 创建新的批量执行器，`jobs == 0` 时按 CPU 数
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs, quiet: false }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// 展开模式并处理所有匹配文件
    ///
    /// 没有匹配文件时返回空报告。
    pub fn run<S: AsRef<str>>(
        &self,
        patterns: &[S],
        dest_dir: &Path,
        options: &TranscodeOptions,
    ) -> Result<BatchReport> {
        let files = PatternResolver::new(patterns.iter().map(|p| p.as_ref().to_string())).resolve()?;
        self.run_files(files.iter(), dest_dir, options)
    }

    /// 处理给定的文件序列，结果顺序与输入一致
    pub fn run_files<'a, I>(
        &self,
        files: I,
        dest_dir: &Path,
        options: &TranscodeOptions,
    ) -> Result<BatchReport>
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let jobs = plan_jobs(files, dest_dir, options.output_format());
        if jobs.is_empty() {
            return Ok(BatchReport::default());
        }

        let pb = if self.quiet {
            ProgressBar::hidden()
        } else {
            progress::create_progress_bar(jobs.len() as u64, "Converting")
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| PixbatchError::Other(format!("failed to start worker pool: {}", e)))?;

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let outcome = run_job(job, options);
                    pb.inc(1);
                    outcome
                })
                .collect()
        });

        pb.finish_and_clear();

        Ok(BatchReport::from_outcomes(outcomes))
    }
}

fn run_job(job: &Job, options: &TranscodeOptions) -> FileOutcome {
    let result = match &job.claimed_by {
        Some(first) => Err(PixbatchError::DestinationConflict {
            path: job.dest.display().to_string(),
            claimed_by: first.display().to_string(),
        }),
        None => process_file(&job.source, &job.dest, options),
    };

    match result {
        Ok(()) => FileOutcome::succeeded(job.source.clone(), job.dest.clone()),
        Err(e) => {
            log::warn!("{}: {}", job.source.display(), e);
            FileOutcome::failed(job.source.clone(), job.dest.clone(), e.to_string())
        }
    }
}

/// 单文件流水线
fn process_file(source: &Path, dest: &Path, options: &TranscodeOptions) -> Result<()> {
    let bytes = decode::read_source(source)?;
    let image = decode::decode(&bytes, source)?;

    let container = Container::resolve(options.output_format(), dest, image.source_format);
    let image = resize::apply(image, options.resize())?;
    let spec = adapt(image, container, options.preserve_gif_transparency());

    log::debug!(
        "{} -> {} [{}, {}, {}x{}]",
        source.display(),
        dest.display(),
        spec.container,
        spec.strategy,
        spec.pixels.dimensions().0,
        spec.pixels.dimensions().1
    );

    encode::write(&spec, dest)
}
