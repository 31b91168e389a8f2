//! Cell types, styles and horizontal alignment

use serde::Serialize;

use crate::core::normalize::{normalize, NormalizedCell};

/// Horizontal alignment of a cell's paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    #[default]
    Default,
    Left,
    Center,
    Right,
    Justify,
}

impl HAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            HAlign::Default => "default",
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
            HAlign::Justify => "justify",
        }
    }
}

/// Character and paragraph formatting carried by a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: HAlign,
}

impl CellStyle {
    pub fn bold() -> Self {
        CellStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn aligned(align: HAlign) -> Self {
        CellStyle {
            align,
            ..Default::default()
        }
    }

    /// Names of the attributes that differ between two styles
    pub fn differences(&self, other: &CellStyle) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.bold != other.bold {
            names.push("bold");
        }
        if self.italic != other.italic {
            names.push("italic");
        }
        if self.underline != other.underline {
            names.push("underline");
        }
        if self.align != other.align {
            names.push("alignment");
        }
        names
    }
}

/// A cell as delivered by an extractor, before grid resolution
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpec {
    /// Raw cell text
    pub text: String,
    /// Number of rows this cell spans
    pub rowspan: usize,
    /// Number of columns this cell spans
    pub colspan: usize,
    pub style: CellStyle,
}

impl CellSpec {
    /// Create a new single-position cell
    pub fn new(text: impl Into<String>) -> Self {
        CellSpec {
            text: text.into(),
            rowspan: 1,
            colspan: 1,
            style: CellStyle::default(),
        }
    }

    /// Create an empty cell
    pub fn empty() -> Self {
        CellSpec::new(String::new())
    }

    pub fn with_span(text: impl Into<String>, rowspan: usize, colspan: usize) -> Self {
        CellSpec {
            rowspan,
            colspan,
            ..CellSpec::new(text)
        }
    }

    pub fn styled(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }
}

impl From<&str> for CellSpec {
    fn from(text: &str) -> Self {
        CellSpec::new(text)
    }
}

impl From<String> for CellSpec {
    fn from(text: String) -> Self {
        CellSpec::new(text)
    }
}

/// Index of an anchor cell in its table's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellId(pub usize);

/// An anchor cell: owns the content of every grid position it covers
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: String,
    pub content: NormalizedCell,
    pub style: CellStyle,
    pub rowspan: usize,
    pub colspan: usize,
    /// Top-left grid position (row, column)
    pub origin: (usize, usize),
}

impl Cell {
    pub(crate) fn from_spec(spec: &CellSpec, origin: (usize, usize)) -> Self {
        Cell {
            content: normalize(&spec.text),
            raw: spec.text.clone(),
            style: spec.style,
            rowspan: spec.rowspan,
            colspan: spec.colspan,
            origin,
        }
    }

    /// Whether the cell is a merged region
    pub fn is_merged(&self) -> bool {
        self.rowspan > 1 || self.colspan > 1
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
