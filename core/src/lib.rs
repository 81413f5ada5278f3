//! dealgraph-core: acquisition and investment graphs from CSV datasets.
//!
//! Record tables are loaded and filtered, turned into a relationship
//! graph, laid out with a force-directed simulation and rendered as an
//! interactive plotly.js page. `pipeline` wires the stages together.

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod graph;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod rng;
pub mod store;
pub mod table;
pub mod trace;
pub mod types;

pub use error::{GraphError, GraphResult};
