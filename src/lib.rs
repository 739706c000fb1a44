#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use ir::{Direction, Edge, Graph, parse_graph_json};
pub use layout::{Layout, compute_layout, compute_layout_with, layout_sized};
