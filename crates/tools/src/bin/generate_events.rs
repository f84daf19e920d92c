use std::io::{BufWriter, Write};

use clap::Parser;
use mappings_model::bulk_data::EventGenerator;
use num_rational::Ratio;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    if config.malformed_percent > 100 {
        anyhow::bail!("--malformed-percent must be at most 100");
    }

    let generator = match config.seed {
        Some(seed) => EventGenerator::seeded(seed),
        None => EventGenerator::new(),
    }
    .with_malformed(Ratio::new(config.malformed_percent, 100));

    let out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    for line in generator.take(config.count) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes synthetic event lines for the bulk loader.
#[derive(Clone, Debug, Parser)]
#[command()]
struct Config {
    #[arg()]
    count: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 0)]
    malformed_percent: u32,
    #[arg(short, long)]
    output: Option<Box<std::path::Path>>,
}
