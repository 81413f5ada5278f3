use crate::{
    entity::EntityColumns,
    error::GraphResult,
    graph::{DegreeMode, DuplicateEdges, Resolution},
    layout::LayoutParams,
    store,
    trace::{ColorPolicy, TraceStyle},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder in `title` and `output` replaced with the region code.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// The relationships table and how its rows become edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub path: String,
    #[serde(default)]
    pub row_cap: Option<usize>,
    pub source_column: String,
    pub target_column: String,
    #[serde(default)]
    pub attribute_columns: Vec<String>,
    /// Rows missing any of these are dropped. `Some(vec![])` checks every
    /// column; `None` skips the check.
    #[serde(default)]
    pub required_columns: Option<Vec<String>>,
}

/// The entities (objects) table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub path: String,
    #[serde(default)]
    pub row_cap: Option<usize>,
    #[serde(default)]
    pub columns: EntityColumns,
    /// Keep only this `entity_type` (e.g. "Company") and require name and
    /// category. `None` keeps every row.
    #[serde(default)]
    pub keep_kind: Option<String>,
    /// Drop relationship rows whose ids are not in the entity table.
    #[serde(default)]
    pub drop_unknown_ids: bool,
    #[serde(default)]
    pub resolution: Resolution,
}

/// Keep relationships whose `key_column` entity has an office in `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub path: String,
    pub key_column: String,
    pub code: String,
    #[serde(default = "default_office_id")]
    pub id_column: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
}

fn default_office_id() -> String {
    "object_id".into()
}

fn default_region_column() -> String {
    "state_code".into()
}

/// Where to write the cleaned copies of the inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanedOutput {
    #[serde(default)]
    pub entities: Option<String>,
    #[serde(default)]
    pub relationships: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub directed: bool,
    pub duplicates: DuplicateEdges,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { directed: true, duplicates: DuplicateEdges::Overwrite }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Page title. `{region}` is replaced with the region code.
    pub title: String,
    /// Output document. `{region}` is replaced with the region code.
    /// `None` stops after the cleaned copies are written.
    #[serde(default)]
    pub output: Option<String>,
    pub relationships: RelationshipConfig,
    #[serde(default)]
    pub entities: Option<EntityConfig>,
    #[serde(default)]
    pub region: Option<RegionConfig>,
    #[serde(default)]
    pub cleaned: Option<CleanedOutput>,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub layout: LayoutParams,
    #[serde(default)]
    pub trace: TraceStyle,
}

impl PipelineConfig {
    /// Load a pipeline description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let content = store::read_document(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// The output path with `{region}` filled in.
    pub fn output_path(&self) -> Option<String> {
        let output = self.output.as_ref()?;
        Some(self.fill_region(output))
    }

    /// The page title with `{region}` filled in.
    pub fn page_title(&self) -> String {
        self.fill_region(&self.title)
    }

    fn fill_region(&self, template: &str) -> String {
        let code = self.region.as_ref().map(|r| r.code.as_str()).unwrap_or("all");
        template.replace(REGION_PLACEHOLDER, code)
    }

    /// First 200 acquisitions, directed acquired → acquiring, coloured by
    /// number of acquisitions.
    pub fn acquisitions(data_dir: &str) -> Self {
        Self {
            title: "<br>Acquisitions".into(),
            output: Some("acquisitions.html".into()),
            relationships: RelationshipConfig {
                path: format!("{data_dir}/acquisitions.csv"),
                row_cap: Some(200),
                source_column: "acquired_object_id".into(),
                target_column: "acquiring_object_id".into(),
                attribute_columns: vec![
                    "price_amount".into(),
                    "price_currency_code".into(),
                    "acquired_at".into(),
                ],
                required_columns: Some(vec![
                    "acquired_object_id".into(),
                    "acquiring_object_id".into(),
                ]),
            },
            entities: Some(EntityConfig {
                path: format!("{data_dir}/objects.csv"),
                row_cap: None,
                columns: EntityColumns::default(),
                keep_kind: None,
                drop_unknown_ids: false,
                resolution: Resolution::KeepRawId,
            }),
            region: None,
            cleaned: None,
            graph: GraphConfig::default(),
            layout: LayoutParams::default(),
            trace: TraceStyle {
                // Edges point acquired → acquiring, so acquisitions made
                // by a company arrive as incoming edges.
                degree: DegreeMode::In,
                ..TraceStyle::default()
            },
        }
    }

    /// Cleaning job: companies with a name and category from the first
    /// 500 objects, complete acquisitions between them.
    pub fn cleaning(data_dir: &str) -> Self {
        Self {
            title: "<br>Acquisitions (cleaned)".into(),
            output: None,
            relationships: RelationshipConfig {
                path: format!("{data_dir}/acquisitions.csv"),
                row_cap: Some(500),
                required_columns: Some(Vec::new()),
                ..Self::acquisitions(data_dir).relationships
            },
            entities: Some(EntityConfig {
                path: format!("{data_dir}/objects.csv"),
                row_cap: Some(500),
                columns: EntityColumns::default(),
                keep_kind: Some("Company".into()),
                drop_unknown_ids: true,
                resolution: Resolution::DropUnresolved,
            }),
            region: None,
            cleaned: Some(CleanedOutput {
                entities: Some("objects_cleaned.csv".into()),
                relationships: Some("acquisitions_cleaned.csv".into()),
            }),
            ..Self::acquisitions(data_dir)
        }
    }

    /// Investors of companies with an office in `state`, one undirected
    /// company–investor edge per investment.
    pub fn investments(data_dir: &str, state: &str) -> Self {
        Self {
            title: "<br>Investments in {region}".into(),
            output: Some("{region}_investments.html".into()),
            relationships: RelationshipConfig {
                path: format!("{data_dir}/investments.csv"),
                row_cap: None,
                source_column: "funded_object_id".into(),
                target_column: "investor_object_id".into(),
                attribute_columns: Vec::new(),
                required_columns: Some(Vec::new()),
            },
            entities: Some(EntityConfig {
                path: format!("{data_dir}/objects.csv"),
                row_cap: None,
                columns: EntityColumns::default(),
                keep_kind: None,
                drop_unknown_ids: false,
                resolution: Resolution::KeepRawId,
            }),
            region: Some(RegionConfig {
                path: format!("{data_dir}/offices.csv"),
                key_column: "funded_object_id".into(),
                code: state.into(),
                id_column: default_office_id(),
                region_column: default_region_column(),
            }),
            cleaned: None,
            graph: GraphConfig { directed: false, duplicates: DuplicateEdges::Overwrite },
            layout: LayoutParams::default(),
            trace: TraceStyle {
                verb: "funded".into(),
                amount_column: None,
                currency_column: None,
                date_column: None,
                degree: DegreeMode::Total,
                degree_label: "Number of funders".into(),
                color: ColorPolicy::Fixed("#1074AB".into()),
                colorbar_title: "Number of Funders".into(),
                ..TraceStyle::default()
            },
        }
    }

    /// Preset by name, as used by the runner's `--pipeline` flag.
    pub fn preset(name: &str, data_dir: &str, state: &str) -> Option<Self> {
        match name {
            "acquisitions" => Some(Self::acquisitions(data_dir)),
            "cleaning" => Some(Self::cleaning(data_dir)),
            "investments" => Some(Self::investments(data_dir, state)),
            _ => None,
        }
    }
}
