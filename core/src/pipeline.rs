//! The pipeline — one forward pass from CSV files to an HTML document.
//!
//! STAGE ORDER (fixed):
//!   1. Load relationships (row cap applied while reading)
//!   2. Drop incomplete relationship rows
//!   3. Load + clean entities, drop rows with unknown ids
//!   4. Region filter (join against the offices table)
//!   5. Write cleaned copies
//!   6. Build graph, resolve entities
//!   7. Layout
//!   8. Traces → figure → HTML
//!
//! RULES:
//!   - Each stage reads only the previous stage's output.
//!   - Tables are never mutated; every filter yields a new table.
//!   - Any I/O failure aborts the run. Data problems drop rows instead.

use crate::{
    config::PipelineConfig,
    entity::EntityIndex,
    error::GraphResult,
    filter::{self, RegionIndex},
    graph::{DealGraph, GraphBuilder},
    layout::{self, Layout},
    render::Figure,
    store,
    table::RecordTable,
    trace,
};
use serde::Serialize;

/// Row and node counts for one run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunSummary {
    pub relationship_rows_loaded: usize,
    pub relationship_rows_kept: usize,
    pub entity_rows_loaded: usize,
    pub entity_rows_kept: usize,
    pub nodes: usize,
    pub edges: usize,
    pub resolved_nodes: usize,
    pub layout_seed: Option<u64>,
    pub layout_steps: usize,
    pub output: Option<String>,
}

/// Everything a run produced, for callers that want more than the file.
pub struct RunOutput {
    pub summary: RunSummary,
    pub relationships: RecordTable,
    pub entities: Option<RecordTable>,
    pub graph: DealGraph,
    pub figure: Option<Figure>,
}

pub struct Pipeline {
    pub config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage and write the configured outputs.
    pub fn run(&self) -> GraphResult<RunSummary> {
        Ok(self.execute()?.summary)
    }

    pub fn execute(&self) -> GraphResult<RunOutput> {
        let cfg = &self.config;
        let mut summary = RunSummary::default();

        // 1–2. Relationships
        let rel = &cfg.relationships;
        let mut relationships = store::load_table(&rel.path, rel.row_cap)?;
        summary.relationship_rows_loaded = relationships.len();
        if let Some(required) = &rel.required_columns {
            relationships = filter::require_columns(&relationships, required)?;
        }

        // 3. Entities
        let mut entity_table = None;
        let mut index = None;
        if let Some(ent) = &cfg.entities {
            let objects = store::load_table(&ent.path, ent.row_cap)?;
            summary.entity_rows_loaded = objects.len();
            let objects = match &ent.keep_kind {
                Some(kind) => filter::clean_entities(&objects, &ent.columns, Some(kind.as_str()))?,
                None => objects,
            };
            summary.entity_rows_kept = objects.len();
            let entities = EntityIndex::from_table(&objects, &ent.columns)?;
            if ent.drop_unknown_ids {
                relationships = filter::drop_unknown_ids(
                    &relationships,
                    &rel.source_column,
                    &rel.target_column,
                    &entities,
                )?;
            }
            entity_table = Some(objects);
            index = Some(entities);
        }

        // 4. Region
        if let Some(region) = &cfg.region {
            let offices = store::load_table(&region.path, None)?;
            let regions = RegionIndex::from_table(&offices, &region.id_column, &region.region_column)?;
            log::info!(
                "{} entities have an office in {}",
                regions.ids_in(&region.code).len(),
                region.code
            );
            relationships =
                filter::filter_by_region(&relationships, &region.key_column, &regions, &region.code)?;
        }
        summary.relationship_rows_kept = relationships.len();
        log::info!(
            "relationships: {} loaded, {} kept",
            summary.relationship_rows_loaded,
            summary.relationship_rows_kept
        );

        // 5. Cleaned copies
        if let Some(cleaned) = &cfg.cleaned {
            if let (Some(path), Some(table)) = (&cleaned.entities, &entity_table) {
                store::write_table(path, table)?;
            }
            if let Some(path) = &cleaned.relationships {
                store::write_table(path, &relationships)?;
            }
        }

        // 6. Graph
        let mut graph = GraphBuilder::new(&rel.source_column, &rel.target_column)
            .attributes(rel.attribute_columns.iter().cloned())
            .directed(cfg.graph.directed)
            .duplicates(cfg.graph.duplicates)
            .build(&relationships)?;
        if let (Some(entities), Some(ent)) = (&index, &cfg.entities) {
            summary.resolved_nodes = graph.resolve(entities, ent.resolution);
        }
        summary.nodes = graph.node_count();
        summary.edges = graph.edge_count();

        // 7–8. Layout and figure, only when a document is wanted.
        let mut figure = None;
        if let Some(output) = cfg.output_path() {
            let layout: Layout = layout::spring_layout(&graph, &cfg.layout);
            graph.apply_layout(&layout);
            summary.layout_seed = Some(layout.seed());
            summary.layout_steps = layout.steps();

            let edges = trace::edge_trace(&graph, &cfg.trace)?;
            let nodes = trace::node_trace(&graph, &cfg.trace)?;
            let fig = Figure::new(&cfg.page_title(), edges, nodes, &cfg.trace);
            fig.write_html(&output)?;
            summary.output = Some(output);
            figure = Some(fig);
        }

        Ok(RunOutput {
            summary,
            relationships,
            entities: entity_table,
            graph,
            figure,
        })
    }
}
