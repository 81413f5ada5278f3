//! dealgraph: headless runner for the acquisition/investment graph pipeline.
//!
//! Usage:
//!   dealgraph --pipeline acquisitions --data-dir ./data --seed 42
//!   dealgraph --pipeline investments --state WY
//!   dealgraph --pipeline cleaning
//!   dealgraph --config data/pipelines/acquisitions.json --out deals.html

use anyhow::{bail, Result};
use dealgraph_core::{
    config::PipelineConfig,
    pipeline::{Pipeline, RunSummary},
    store,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_str(&args, "--data-dir").unwrap_or("./data");
    let state = arg_str(&args, "--state").unwrap_or("WY");

    let mut config = match (arg_str(&args, "--config"), arg_str(&args, "--pipeline")) {
        (Some(path), _) => {
            log::info!("pipeline config from {path}");
            PipelineConfig::load(path)?
        }
        (None, name) => {
            let name = name.unwrap_or("acquisitions");
            match PipelineConfig::preset(name, data_dir, state) {
                Some(c) => c,
                None => bail!("Unknown pipeline '{name}' (expected acquisitions, cleaning or investments)"),
            }
        }
    };

    if let Some(seed) = parse_arg::<u64>(&args, "--seed") {
        config.layout.seed = Some(seed);
    }
    if let Some(rows) = parse_arg::<usize>(&args, "--rows") {
        config.relationships.row_cap = Some(rows);
    }
    if let Some(out) = arg_str(&args, "--out") {
        config.output = Some(out.to_string());
    }
    if let (Some(code), Some(region)) = (arg_str(&args, "--state"), config.region.as_mut()) {
        region.code = code.to_string();
    }

    println!("dealgraph");
    println!("  title:         {}", config.page_title().replace("<br>", " ").trim());
    println!("  relationships: {}", config.relationships.path);
    if let Some(region) = &config.region {
        println!("  region:        {}", region.code);
    }
    println!();

    let summary = Pipeline::new(config).run()?;
    print_summary(&summary);

    if let Some(path) = arg_str(&args, "--summary-json") {
        store::write_document(path, &serde_json::to_string_pretty(&summary)?)?;
    }
    Ok(())
}

fn print_summary(s: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  relationship rows: {} loaded, {} kept", s.relationship_rows_loaded, s.relationship_rows_kept);
    if s.entity_rows_loaded > 0 {
        println!("  entity rows:       {} loaded, {} kept", s.entity_rows_loaded, s.entity_rows_kept);
    }
    println!("  nodes:             {} ({} resolved)", s.nodes, s.resolved_nodes);
    println!("  edges:             {}", s.edges);
    if let Some(seed) = s.layout_seed {
        println!("  layout:            {} steps, seed {seed}", s.layout_steps);
    }
    match &s.output {
        Some(path) => println!("  output:            {path}"),
        None => println!("  output:            (none)"),
    }
}

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    arg_str(args, flag).and_then(|v| v.parse().ok())
}
