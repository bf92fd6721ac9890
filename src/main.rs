use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use watt_sampler::{pipeline, SpectrumConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = SpectrumConfig::default();
    let mut rng = StdRng::from_entropy();

    let report = pipeline::run(&config, &mut rng)?;

    for bin in report.histogram.bins() {
        info!("Bin {} : {}", bin.index, bin.count);
    }
    report.histogram.save(&config.output_path)?;

    Ok(())
}
