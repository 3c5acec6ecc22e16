use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use workflow::config::SynthesisConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthesizes labeled RF datasets as SigMF recordings")]
struct Args {
    /// Load a synthesis config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory the .sigmf-data/.sigmf-meta pair is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Base name of the dataset files
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    vectors_per_class: Option<usize>,
    #[arg(long)]
    samples_per_vector: Option<usize>,
    /// Skip the fading/noise channel
    #[arg(long, default_value_t = false)]
    no_channel: bool,
    /// Synthesize and validate without writing files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl Args {
    fn apply(&self, config: &mut SynthesisConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(name) = &self.name {
            config.output.name = name.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(vectors) = self.vectors_per_class {
            config.vectors_per_class = vectors;
        }
        if let Some(samples) = self.samples_per_vector {
            config.samples_per_vector = samples;
        }
        if self.no_channel {
            config.channel.enabled = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        info!("loading synthesis config {}", path.display());
        SynthesisConfig::load(path)?
    } else {
        SynthesisConfig::default()
    };
    args.apply(&mut config);

    let runner = Runner::new(config);
    let result = runner.execute().context("synthesizing dataset")?;

    println!(
        "Synthesized {} windows ({} samples) across {} snrs x {} classes",
        result.metrics.windows,
        result.metrics.samples,
        runner.config().snrs.len(),
        runner.config().waveforms.len()
    );

    if args.dry_run {
        println!("Dry run: metadata validated, nothing written.");
        return Ok(());
    }

    let (data_path, meta_path) = runner.write(&result)?;
    println!(
        "Wrote {} and {}",
        data_path.display(),
        meta_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_values() {
        let args = Args::parse_from([
            "rfsynth",
            "--name",
            "sweep",
            "--seed",
            "42",
            "--samples-per-vector",
            "256",
            "--no-channel",
        ]);
        let mut config = SynthesisConfig::default();
        args.apply(&mut config);
        assert_eq!(config.output.name, "sweep");
        assert_eq!(config.seed, 42);
        assert_eq!(config.samples_per_vector, 256);
        assert_eq!(config.vectors_per_class, 1);
        assert!(!config.channel.enabled);
        assert!(!args.dry_run);
    }
}
