use std::{path::Path, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modweave::{
    cli::{Args, Command},
    emit::write_graft,
    Error, FsLoader, HookRegistry, Options, Pipeline, PipelineOutcome,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let root = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let mut opts = Options::load_from_path(&args.config)?.anchored(&root);
    opts.verbose = opts.verbose || args.verbose;

    let default_level = if opts.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    // The CLI has no compiled-in hooks; modules contribute their configuration only.
    let loader = Arc::new(FsLoader::new(HookRegistry::declarative()));
    let pipeline = Pipeline::new(opts, loader);

    match args.command {
        Command::Plan => match pipeline.plan().await {
            Ok(plan) => {
                for (idx, m) in plan.load_order.iter().enumerate() {
                    println!("{:>3}. {} ({}, order {})", idx + 1, m.name, m.kind, m.order);
                }
            }
            Err(Error::Configuration) => println!("no modules to load"),
            Err(e) => return Err(e).context("module planning failed"),
        },

        Command::Build { out } => {
            let outcome = pipeline.run().await.context("module pipeline failed")?;
            match outcome {
                PipelineOutcome::Skipped => println!("no modules to load"),
                PipelineOutcome::Completed(report) => {
                    let written = write_graft(&report.graft, &out).with_context(|| {
                        format!("failed to write generated files to {}", out.display())
                    })?;
                    println!(
                        "loaded {} module(s), wrote {} file(s) to {}",
                        report.load_order.len(),
                        written.len(),
                        out.display()
                    );
                }
            }
        }
    }

    Ok(())
}
