//! Sentinel-5P Composite Operator - Main entry point
//!
//! The operator queries an imagery service for Sentinel-5P trace-gas
//! rasters, builds mean composites over fixed date windows, and exports
//! the result as a PNG still or an animated GIF. A server-side video
//! export can be requested on top of an animation run.
//!
//! Module organization:
//! - `earthdata`: imagery service client library
//! - `compositor`: window partitioning and mean reduction
//! - `render`: palette rendering and frame export
//! - `config`: operator configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use s5p_composite_operator::config::{OperatorConfig, Product, RunMode};
use s5p_composite_operator::earthdata::{self, EarthdataClient, RemoteCollection};
use s5p_composite_operator::render::{GifExporter, PaletteRenderer, PngExporter, SequenceExporter};
use s5p_composite_operator::pipeline;

#[tokio::main]
async fn main() {
    println!("S5P Composite Operator v{}", env!("CARGO_PKG_VERSION"));
    println!("Temporal composites for Sentinel-5P trace gases\n");

    // Parse command-line arguments
    // Credentials: --serviceUri, --token, --project (or EARTHDATA_* env vars)
    // Run selection: --config FILE, or --product co|no2|hcho with --mode still|animate
    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);

    // Print environment info
    print_env_info();

    // Connect to the imagery service
    println!("Attempting to connect to the imagery service...");
    match EarthdataClient::from_env() {
        Ok(client) => {
            match client.ping().await {
                Ok(()) => println!("✓ Successfully connected!\n"),
                Err(e) => {
                    eprintln!("✗ Endpoint check failed: {}", e);
                    std::process::exit(1);
                }
            }

            let client_arc = Arc::new(client);
            match process_run(client_arc, &options).await {
                Ok(()) => {
                    println!("\n✓ Run completed successfully!");
                }
                Err(e) => {
                    eprintln!("\n✗ Run failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("✗ Failed to create client: {}", e);
            eprintln!("\nNote: to run the operator, set environment variables:");
            eprintln!("  export EARTHDATA_URI=https://earthdata.example.com");
            eprintln!("  export EARTHDATA_TOKEN=your_token_here");
            eprintln!("  export EARTHDATA_PROJECT=your_project_here");
            std::process::exit(1);
        }
    }

    println!("\nOperator completed!");
}

/// Options picked up from the command line.
struct CliOptions {
    config_path: Option<PathBuf>,
    product: Option<Product>,
    mode: Option<RunMode>,
    output: Option<PathBuf>,
}

/// Parse command-line arguments; credential flags are mapped onto the
/// corresponding environment variables.
fn parse_args(args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        config_path: None,
        product: None,
        mode: None,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--serviceUri" if i + 1 < args.len() => {
                std::env::set_var("EARTHDATA_URI", &args[i + 1]);
                i += 2;
            }
            "--token" if i + 1 < args.len() => {
                std::env::set_var("EARTHDATA_TOKEN", &args[i + 1]);
                i += 2;
            }
            "--project" if i + 1 < args.len() => {
                std::env::set_var("EARTHDATA_PROJECT", &args[i + 1]);
                i += 2;
            }
            "--config" if i + 1 < args.len() => {
                options.config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--product" if i + 1 < args.len() => {
                options.product = Product::parse(&args[i + 1]);
                if options.product.is_none() {
                    eprintln!("⚠ Unknown product '{}', expected co|no2|hcho", args[i + 1]);
                }
                i += 2;
            }
            "--mode" if i + 1 < args.len() => {
                options.mode = RunMode::parse(&args[i + 1]);
                if options.mode.is_none() {
                    eprintln!("⚠ Unknown mode '{}', expected still|animate", args[i + 1]);
                }
                i += 2;
            }
            "--output" if i + 1 < args.len() => {
                options.output = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            _ => i += 1,
        }
    }
    options
}

/// Print environment info for debugging
fn print_env_info() {
    if let Ok(uri) = std::env::var("EARTHDATA_URI") {
        println!("EARTHDATA_URI: {}", uri);
    } else {
        println!("EARTHDATA_URI not set");
    }

    if let Ok(project) = std::env::var("EARTHDATA_PROJECT") {
        println!("EARTHDATA_PROJECT: {}", project);
    } else {
        println!("EARTHDATA_PROJECT not set");
    }

    if let Ok(token) = std::env::var("EARTHDATA_TOKEN") {
        println!(
            "EARTHDATA_TOKEN: {}...{}",
            &token[..8.min(token.len())],
            if token.len() > 8 { "***" } else { "" }
        );
    } else {
        println!("EARTHDATA_TOKEN not set");
    }
    println!();
}

/// Resolve the configuration, run the pipeline, and optionally request a
/// server-side video export.
async fn process_run(client: Arc<EarthdataClient>, options: &CliOptions) -> anyhow::Result<()> {
    println!("=== Run Started ===");

    // Config file first, CLI overrides on top.
    let mut config = match &options.config_path {
        Some(path) => OperatorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let product = options.product.unwrap_or(Product::Co);
            let mode = options.mode.unwrap_or(RunMode::Animate);
            OperatorConfig::for_product(product, mode)
        }
    };
    if let Some(product) = options.product {
        config.product = product;
    }
    if let Some(mode) = options.mode {
        config.mode = mode;
    }
    if let Some(output) = &options.output {
        config.output = output.clone();
    }

    let provider = RemoteCollection::new(client.clone(), config.product.collection());

    // Country borders are drawn client-side over the rendered frames.
    let renderer = match &config.borders {
        Some(dataset) => {
            println!("Fetching boundary polylines from {}...", dataset);
            let polylines = client
                .query_boundaries(dataset, &config.region)
                .await
                .context("fetching boundaries")?;
            println!("✓ {} boundary polyline(s)", polylines.len());
            PaletteRenderer::with_borders(polylines, config.region.clone())
        }
        None => PaletteRenderer::new(),
    };

    let exporter: Box<dyn SequenceExporter> = match config.mode {
        RunMode::Still => Box::new(PngExporter),
        RunMode::Animate => Box::new(GifExporter),
    };

    let summary = pipeline::run(&provider, &config, &renderer, exporter.as_ref())
        .await
        .context("pipeline run")?;

    println!(
        "\nSummary: {} window(s), {} frame(s), {} empty, {} failed",
        summary.windows,
        summary.frames,
        summary.dropped_empty,
        summary.failed_windows.len()
    );
    if summary.frames > 0 {
        println!("Output saved to {}", summary.output.display());
    }

    // Server-side video export, mirroring the local animation.
    if config.export_video && config.mode == RunMode::Animate {
        println!("\nRequesting server-side video export...");
        let request = pipeline::video_export_request(&config);
        let task = earthdata::export::start_video_export(&client, &request)
            .await
            .context("starting video export")?;
        println!(
            "✓ Export task {} submitted ({:?}); it will finish server-side",
            task.id, task.state
        );
    }

    println!("\n=== Run Complete ===");
    Ok(())
}
