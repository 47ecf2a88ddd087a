//! Batch processing command

use super::BarProgress;
use crate::BatchArgs;
use anyhow::{bail, Context, Result};
use gran_analysis::{aggregate, BatchOptions, FileSource, GranulometryParams, ImageSource};
use gran_io::summary::{sibling_path, DISTRIBUTION_SUFFIX, STATS_SUFFIX, VOLUMES_SUFFIX};
use gran_ops::FlatMorphology;
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: BatchArgs, verbose: bool) -> Result<()> {
    trace!(input = %args.input, glob = args.glob, "batch::run");
    let params = args.params.resolve()?;

    let source = if args.glob {
        FileSource::from_glob(&args.input)
    } else {
        FileSource::from_dir(&args.input)
    }
    .with_context(|| format!("Failed to list images: {}", args.input))?;

    if source.is_empty() {
        bail!("No images found in: {}", args.input);
    }
    info!(files = source.len(), input = %args.input, "Starting batch");
    if verbose {
        println!("Found {} images in '{}'", source.len(), args.input);
    }

    let steps = params.series()?.steps() as u64;
    let bar = BarProgress::new(steps * source.len() as u64, !args.json);
    let options = BatchOptions {
        parallel: args.parallel,
    };
    let result = aggregate(&source, &FlatMorphology, &params, options, &bar);
    bar.finish();
    let result = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let summary_path = summary_path(&args, &source, &params);
    if let Some(parent) = summary_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    result
        .run_summary(source.paths())
        .write(&summary_path)
        .with_context(|| format!("Failed to write: {}", summary_path.display()))?;
    let tables = [
        (VOLUMES_SUFFIX, result.volume_table()?),
        (DISTRIBUTION_SUFFIX, result.distribution_table()?),
        (STATS_SUFFIX, result.summary_table()?),
    ];
    for (suffix, table) in tables {
        let path = sibling_path(&summary_path, suffix);
        table
            .write_tsv(&path)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
        debug!(path = %path.display(), rows = table.len(), "table written");
    }

    info!(images = result.len(), summary = %summary_path.display(), "Batch complete");
    println!("Processed {} images -> {}", result.len(), summary_path.display());
    Ok(())
}

/// Directory the inputs come from.
fn input_dir(args: &BatchArgs, source: &FileSource) -> PathBuf {
    if args.glob {
        source
            .paths()
            .first()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(&args.input)
    }
}

/// Summary file path: `-o file.txt`, or the default name inside `-o dir`
/// or the input directory.
fn summary_path(args: &BatchArgs, source: &FileSource, params: &GranulometryParams) -> PathBuf {
    if let Some(out) = &args.output {
        if out.extension().is_some_and(|e| e == "txt") {
            return out.clone();
        }
    }
    let dir = input_dir(args, source);
    let dir_name = dir
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(&dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_string());
    let out_dir = args.output.clone().unwrap_or(dir);
    out_dir.join(params.default_file_name(&dir_name))
}
