//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Context};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::codec::CodecConfig;
use crate::degradations::{
    available_degradations, create_degradation_with_config, parse_degradation_chain, Degradation,
    DegradationUsageDocGenerator,
};
use crate::degraded_file::DegradedAudioFile;
use crate::engine::WavFormat;

/// Codec configuration from the environment, with an optional CLI override
pub fn codec_config(lame_path: Option<&Path>) -> CodecConfig {
    match lame_path {
        Some(path) => CodecConfig::from_env().with_lame_path(path),
        None => CodecConfig::from_env(),
    }
}

/// Degrade a single file.
pub fn apply(
    input: &Path,
    output: &Path,
    bit_depth: Option<u16>,
    history: Option<&Path>,
    config: &CodecConfig,
    specs: &[String],
) -> anyhow::Result<()> {
    let chain = parse_degradation_chain(specs, config).context("Invalid degradation")?;

    let mut file = DegradedAudioFile::load(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    file.apply_chain(&chain)
        .with_context(|| format!("Failed to degrade {}", input.display()))?;

    if let Some(history_path) = history {
        fs::write(history_path, file.history_json()?)
            .with_context(|| format!("Failed to write history to {}", history_path.display()))?;
    }

    let format = bit_depth.map(WavFormat::new).unwrap_or(file.source_format());
    let applied = file
        .save_as(output, format)
        .with_context(|| format!("Failed to save {}", output.display()))?;

    println!(
        "{} -> {} ({} degradations)",
        input.display(),
        output.display(),
        applied.len()
    );
    Ok(())
}

/// Outcome of one file in a batch
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: anyhow::Result<()>,
}

/// Every `*.wav` file under `dir`, sorted
pub fn find_wav_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        let is_wav = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_wav {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn degrade_one(
    input: &Path,
    output: &Path,
    bit_depth: Option<u16>,
    chain: &[Box<dyn Degradation>],
) -> anyhow::Result<()> {
    let mut file = DegradedAudioFile::load(input)?;
    file.apply_chain(chain)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    let format = bit_depth.map(WavFormat::new).unwrap_or(file.source_format());
    file.save_as(output, format)?;
    Ok(())
}

/// `degrade_one`, with a panic in a degradation reported as that file's error
fn degrade_guarded(
    input: &Path,
    output: &Path,
    bit_depth: Option<u16>,
    chain: &[Box<dyn Degradation>],
) -> anyhow::Result<()> {
    panic::catch_unwind(AssertUnwindSafe(|| degrade_one(input, output, bit_depth, chain)))
        .unwrap_or_else(|_| Err(anyhow!("panicked while degrading {}", input.display())))
}

/// Degrade every WAV file under `input_dir` with the same chain
///
/// Files are spread over `jobs` worker threads that share the parsed chain.
/// A failing file does not stop the others.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    jobs: usize,
    bit_depth: Option<u16>,
    chain: &[Box<dyn Degradation>],
) -> anyhow::Result<Vec<BatchItem>> {
    let inputs = find_wav_files(input_dir)?;
    let jobs = jobs.clamp(1, inputs.len().max(1));
    info!(files = inputs.len(), jobs, "Starting batch");

    let mut work: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let relative = input
            .strip_prefix(input_dir)
            .with_context(|| format!("{} is outside {}", input.display(), input_dir.display()))?;
        let output = output_dir.join(relative);
        work.push((input, output));
    }

    let share = |worker: usize| work.iter().skip(worker).step_by(jobs);

    let mut items: Vec<BatchItem> = thread::scope(|scope| {
        let handles: Vec<_> = (0..jobs)
            .map(|worker| {
                scope.spawn(move || {
                    share(worker)
                        .map(|(input, output)| BatchItem {
                            input: input.clone(),
                            output: output.clone(),
                            result: degrade_guarded(input, output, bit_depth, chain),
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .flat_map(|(worker, handle)| {
                handle.join().unwrap_or_else(|_| {
                    share(worker)
                        .map(|(input, output)| BatchItem {
                            input: input.clone(),
                            output: output.clone(),
                            result: Err(anyhow!("batch worker {} stopped", worker)),
                        })
                        .collect()
                })
            })
            .collect()
    });

    items.sort_by(|a, b| a.input.cmp(&b.input));
    Ok(items)
}

/// Degrade a directory of files, failing if any file failed.
pub fn batch(
    input_dir: &Path,
    output_dir: &Path,
    jobs: Option<usize>,
    bit_depth: Option<u16>,
    config: &CodecConfig,
    specs: &[String],
) -> anyhow::Result<()> {
    let chain = parse_degradation_chain(specs, config).context("Invalid degradation")?;
    let jobs = jobs.unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let items = run_batch(input_dir, output_dir, jobs, bit_depth, &chain)?;

    let mut failed = 0;
    for item in &items {
        match &item.result {
            Ok(()) => println!("ok    {} -> {}", item.input.display(), item.output.display()),
            Err(e) => {
                failed += 1;
                warn!(input = %item.input.display(), error = %e, "File failed");
                println!("FAIL  {}: {:#}", item.input.display(), e);
            }
        }
    }

    println!("{} files, {} failed", items.len(), failed);
    if failed > 0 {
        bail!("{} of {} files failed", failed, items.len());
    }
    Ok(())
}

/// Print the help text of every degradation.
pub fn list(config: &CodecConfig) -> anyhow::Result<()> {
    let degradations = available_degradations()
        .into_iter()
        .map(|name| create_degradation_with_config(name, config))
        .collect::<crate::error::Result<Vec<_>>>()?;

    println!("{}", DegradationUsageDocGenerator::get_help(&degradations));
    Ok(())
}
