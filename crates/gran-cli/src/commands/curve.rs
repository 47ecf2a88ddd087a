//! Single image command

use super::{load_image, size_label, BarProgress};
use crate::CurveArgs;
use anyhow::{Context, Result};
use gran_analysis::{aggregate, BatchOptions, BatchRow, Curve, MemorySource};
use gran_io::summary::{sibling_path, DISTRIBUTION_SUFFIX, STATS_SUFFIX};
use gran_ops::{FlatMorphology, SizeKind};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: CurveArgs, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), "curve::run");
    let params = args.params.resolve()?;

    let image = load_image(&args.input)?;
    params
        .validate_for(&image)
        .with_context(|| format!("Cannot analyse {}", args.input.display()))?;

    let label = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    if verbose {
        println!("Analysing {} ({})", label, dims_text(&image));
    }

    let mut source = MemorySource::new();
    source.push(label, image);
    let steps = params.series()?.steps() as u64;
    let bar = BarProgress::new(steps, !args.json);
    let result = aggregate(&source, &FlatMorphology, &params, BatchOptions::default(), &bar);
    bar.finish();
    let result = result?;

    if let Some(output) = &args.output {
        result
            .volume_table()?
            .write_tsv(output)
            .with_context(|| format!("Failed to write: {}", output.display()))?;
        result
            .distribution_table()?
            .write_tsv(sibling_path(output, DISTRIBUTION_SUFFIX))?;
        result
            .summary_table()?
            .write_tsv(sibling_path(output, STATS_SUFFIX))?;
        info!(output = %output.display(), "tables written");
    }

    let Some(row) = result.rows().first() else {
        return Ok(());
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(row)?);
    } else {
        print!("{}", render_row(row, params.calibration.is_identity()));
    }
    Ok(())
}

fn dims_text(image: &gran_core::Image) -> String {
    let (w, h, d) = image.dims();
    if image.is_3d() {
        format!("{}x{}x{}", w, h, d)
    } else {
        format!("{}x{}", w, h)
    }
}

/// Human-readable report of one image.
fn render_row(row: &BatchRow, integer: bool) -> String {
    let mut out = String::new();
    let radius = row.volume.size_kind() == SizeKind::Radius;

    out.push_str(if radius {
        "size\tdiameter\tvolume\n"
    } else {
        "size\tvolume\n"
    });
    let diameters = row.volume.equivalent_diameters();
    for (sample, diameter) in row.volume.samples().iter().zip(diameters) {
        out.push_str(&size_label(sample.size, integer));
        if radius {
            out.push_str(&format!("\t{}", size_label(diameter, integer)));
        }
        out.push_str(&format!("\t{:.4}\n", sample.value));
    }

    out.push_str("\nsize\tpercent\n");
    for s in row.distribution.samples() {
        out.push_str(&format!("{}\t{:.4}\n", size_label(s.size, integer), s.value));
    }

    let s = &row.summary;
    out.push_str(&format!(
        "\nmean {:.4}  std {:.4}  geommean {:.4}\n",
        s.mean, s.std, s.geommean
    ));
    out
}
