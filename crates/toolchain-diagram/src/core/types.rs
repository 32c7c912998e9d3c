//! Core type definitions for diagram generation
//!
//! Layout direction, output formats, edge line styles and node icons.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

/// Graphviz attribute map
///
/// Kept sorted so rendered output is stable across runs.
pub type Attributes = BTreeMap<String, String>;

/// Build an [`Attributes`] map from string pairs
pub fn attributes<const N: usize>(pairs: [(&str, &str); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Flow direction for the diagram layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub enum Direction {
    /// Top to bottom (TB)
    TopBottom,
    /// Left to right (LR)
    #[default]
    LeftRight,
    /// Right to left (RL)
    RightLeft,
    /// Bottom to top (BT)
    BottomTop,
}

impl Direction {
    /// Graphviz `rankdir` value
    pub fn rankdir(&self) -> &'static str {
        match self {
            Direction::TopBottom => "TB",
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
            Direction::BottomTop => "BT",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TB" | "TD" => Ok(Direction::TopBottom),
            "LR" => Ok(Direction::LeftRight),
            "RL" => Ok(Direction::RightLeft),
            "BT" => Ok(Direction::BottomTop),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rankdir())
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    Pdf,
    /// Raw DOT source, written without invoking Graphviz
    Dot,
}

impl OutputFormat {
    /// File extension, also the value passed to `dot -T`
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }

    /// Whether this format needs the Graphviz layout engine
    pub fn needs_graphviz(&self) -> bool {
        !matches!(self, OutputFormat::Dot)
    }

    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["png", "jpg", "svg", "pdf", "dot"]
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Line style of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Bold,
}

impl EdgeStyle {
    /// Graphviz `style` value, `None` for the renderer default
    pub fn dot_style(&self) -> Option<&'static str> {
        match self {
            EdgeStyle::Solid => None,
            EdgeStyle::Dashed => Some("dashed"),
            EdgeStyle::Dotted => Some("dotted"),
            EdgeStyle::Bold => Some("bold"),
        }
    }
}

impl fmt::Display for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStyle::Solid => write!(f, "solid"),
            EdgeStyle::Dashed => write!(f, "dashed"),
            EdgeStyle::Dotted => write!(f, "dotted"),
            EdgeStyle::Bold => write!(f, "bold"),
        }
    }
}

/// Built-in category icons
///
/// These need no downloaded asset. They render as filled boxes in the
/// product's brand color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinIcon {
    Terraform,
    Docker,
    Helm,
    ArgoCd,
    GitLab,
}

impl BuiltinIcon {
    /// Provider category, as in `onprem/iac`
    pub fn category(&self) -> &'static str {
        match self {
            BuiltinIcon::Terraform => "onprem/iac",
            BuiltinIcon::Docker => "onprem/container",
            BuiltinIcon::Helm => "k8s/ecosystem",
            BuiltinIcon::ArgoCd => "onprem/gitops",
            BuiltinIcon::GitLab => "onprem/vcs",
        }
    }

    /// Brand fill color
    pub fn color(&self) -> &'static str {
        match self {
            BuiltinIcon::Terraform => "#7B42BC",
            BuiltinIcon::Docker => "#2496ED",
            BuiltinIcon::Helm => "#0F1689",
            BuiltinIcon::ArgoCd => "#EF7B4D",
            BuiltinIcon::GitLab => "#FC6D26",
        }
    }
}

impl fmt::Display for BuiltinIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinIcon::Terraform => write!(f, "terraform"),
            BuiltinIcon::Docker => write!(f, "docker"),
            BuiltinIcon::Helm => write!(f, "helm"),
            BuiltinIcon::ArgoCd => write!(f, "argocd"),
            BuiltinIcon::GitLab => write!(f, "gitlab"),
        }
    }
}

/// Visual icon of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum NodeIcon {
    Builtin(BuiltinIcon),
    /// Image file, relative to the directory the renderer runs in
    Custom(PathBuf),
}

impl NodeIcon {
    /// Path of the image file, if this icon has one
    pub fn image(&self) -> Option<&PathBuf> {
        match self {
            NodeIcon::Builtin(_) => None,
            NodeIcon::Custom(path) => Some(path),
        }
    }
}

impl From<BuiltinIcon> for NodeIcon {
    fn from(icon: BuiltinIcon) -> Self {
        NodeIcon::Builtin(icon)
    }
}

impl fmt::Display for NodeIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIcon::Builtin(icon) => write!(f, "{}", icon),
            NodeIcon::Custom(path) => write!(f, "{}", path.display()),
        }
    }
}
