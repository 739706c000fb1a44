use crate::ir::DiagramKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodePadding {
    pub x: f32,
    pub y: f32,
}

impl NodePadding {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindPadding {
    pub flowchart: NodePadding,
    pub class: NodePadding,
    pub state: NodePadding,
    pub er: NodePadding,
    pub c4: NodePadding,
    pub requirement: NodePadding,
    pub block: NodePadding,
}

impl Default for KindPadding {
    fn default() -> Self {
        Self {
            flowchart: NodePadding::new(30.0, 15.0),
            class: NodePadding::new(12.0, 12.0),
            state: NodePadding::new(15.0, 10.0),
            er: NodePadding::new(31.5, 17.25),
            c4: NodePadding::new(20.0, 20.0),
            requirement: NodePadding::new(3.0, 15.0),
            block: NodePadding::new(15.0, 5.25),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Side length of one obstacle-grid cell.
    pub grid_cell: f32,
    /// Clearance added around every node before rasterizing it into the grid.
    pub obstacle_padding: f32,
    /// Free border around the padded node boxes.
    pub grid_margin: f32,
    /// Extra cost per direction change, in units of one cell step.
    pub turn_penalty: f32,
    /// Grids larger than this are not built; every edge then takes the fallback route.
    pub max_cells: usize,
    /// Distance a self-loop extends past its node.
    pub self_loop_extent: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            grid_cell: 10.0,
            obstacle_padding: 6.0,
            grid_margin: 20.0,
            turn_penalty: 0.5,
            max_cells: 250_000,
            self_loop_extent: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub order_passes: usize,
    pub label_line_height: f32,
    pub font_size: f32,
    pub font_family: String,
    /// Margin between the canvas edge and the outermost content.
    pub boundary_pad: f32,
    pub padding: KindPadding,
    pub routing: RoutingConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 50.0,
            rank_spacing: 50.0,
            order_passes: 4,
            label_line_height: 1.5,
            font_size: 16.0,
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            boundary_pad: 8.0,
            padding: KindPadding::default(),
            routing: RoutingConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn padding_for(&self, kind: DiagramKind) -> NodePadding {
        match kind {
            DiagramKind::Flowchart => self.padding.flowchart,
            DiagramKind::Class => self.padding.class,
            DiagramKind::State => self.padding.state,
            DiagramKind::Er => self.padding.er,
            DiagramKind::C4 => self.padding.c4,
            DiagramKind::Requirement => self.padding.requirement,
            DiagramKind::Block => self.padding.block,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Syntax(#[from] json5::Error),
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    grid_cell: Option<f32>,
    obstacle_padding: Option<f32>,
    grid_margin: Option<f32>,
    turn_penalty: Option<f32>,
    max_cells: Option<usize>,
    self_loop_extent: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaddingFile {
    x: Option<f32>,
    y: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct KindPaddingFile {
    flowchart: Option<PaddingFile>,
    class: Option<PaddingFile>,
    state: Option<PaddingFile>,
    er: Option<PaddingFile>,
    c4: Option<PaddingFile>,
    requirement: Option<PaddingFile>,
    block: Option<PaddingFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    order_passes: Option<usize>,
    label_line_height: Option<f32>,
    font_size: Option<f32>,
    font_family: Option<String>,
    boundary_pad: Option<f32>,
    padding: Option<KindPaddingFile>,
    routing: Option<RoutingConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overlays a JSON5 document of camelCase overrides on the defaults.
pub fn parse_config(contents: &str) -> Result<LayoutConfig, ConfigError> {
    let mut config = LayoutConfig::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(v) = parsed.node_spacing {
        config.node_spacing = v;
    }
    if let Some(v) = parsed.rank_spacing {
        config.rank_spacing = v;
    }
    if let Some(v) = parsed.order_passes {
        config.order_passes = v;
    }
    if let Some(v) = parsed.label_line_height {
        config.label_line_height = v;
    }
    if let Some(v) = parsed.font_size {
        config.font_size = v;
    }
    if let Some(v) = parsed.font_family {
        config.font_family = v;
    }
    if let Some(v) = parsed.boundary_pad {
        config.boundary_pad = v;
    }

    if let Some(padding) = parsed.padding {
        let targets = [
            (padding.flowchart, &mut config.padding.flowchart),
            (padding.class, &mut config.padding.class),
            (padding.state, &mut config.padding.state),
            (padding.er, &mut config.padding.er),
            (padding.c4, &mut config.padding.c4),
            (padding.requirement, &mut config.padding.requirement),
            (padding.block, &mut config.padding.block),
        ];
        for (pad, target) in targets {
            let Some(pad) = pad else {
                continue;
            };
            if let Some(x) = pad.x {
                target.x = x;
            }
            if let Some(y) = pad.y {
                target.y = y;
            }
        }
    }

    if let Some(routing) = parsed.routing {
        if let Some(v) = routing.grid_cell {
            config.routing.grid_cell = v;
        }
        if let Some(v) = routing.obstacle_padding {
            config.routing.obstacle_padding = v;
        }
        if let Some(v) = routing.grid_margin {
            config.routing.grid_margin = v;
        }
        if let Some(v) = routing.turn_penalty {
            config.routing.turn_penalty = v;
        }
        if let Some(v) = routing.max_cells {
            config.routing.max_cells = v;
        }
        if let Some(v) = routing.self_loop_extent {
            config.routing.self_loop_extent = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.node_spacing, 50.0);
        assert_eq!(config.order_passes, 4);
        assert_eq!(config.padding_for(DiagramKind::Flowchart), NodePadding::new(30.0, 15.0));
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse_config(
            r#"{
                // json5 comments are accepted
                nodeSpacing: 20,
                orderPasses: 8,
                padding: { er: { x: 4 } },
                routing: { gridCell: 5.0, maxCells: 1000 },
            }"#,
        )
        .unwrap();
        assert_eq!(config.node_spacing, 20.0);
        assert_eq!(config.order_passes, 8);
        assert_eq!(config.padding.er.x, 4.0);
        assert_eq!(config.padding.er.y, 17.25);
        assert_eq!(config.routing.grid_cell, 5.0);
        assert_eq!(config.routing.max_cells, 1000);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.boundary_pad, 8.0);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(parse_config("{ nodeSpacing: }"), Err(ConfigError::Syntax(_))));
    }
}
