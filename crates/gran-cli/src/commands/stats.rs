//! Statistics of a saved distribution table

use crate::StatsArgs;
use anyhow::{Context, Result};
use gran_analysis::stats::summary_table;
use gran_analysis::summarize_table;
use gran_io::Table;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: StatsArgs, verbose: bool) -> Result<()> {
    trace!(input = %args.input.display(), "stats::run");
    let table = Table::read_tsv(&args.input)
        .with_context(|| format!("Failed to read table: {}", args.input.display()))?;
    if verbose {
        println!("{} rows, {} sizes", table.len(), table.headers().len());
    }

    let rows = summarize_table(&table)
        .with_context(|| format!("Cannot summarize {}", args.input.display()))?;
    let stats = summary_table(&rows)?;

    match &args.output {
        Some(path) => {
            stats
                .write_tsv(path)
                .with_context(|| format!("Failed to write: {}", path.display()))?;
            info!(rows = stats.len(), output = %path.display(), "stats written");
        }
        None => print!("{}", stats.to_tsv()),
    }
    Ok(())
}
