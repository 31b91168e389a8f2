//! RTF table extraction
//!
//! A single pass over the RTF token stream. Character and paragraph state
//! follows the group stack and rows are collected between `\trowd` and
//! `\row`. When a table ends, the `\cellx` positions of all its rows form
//! one set of column boundaries: a cell spans every column its
//! `[previous cellx, cellx)` interval covers, so a spanner row with fewer,
//! wider cells needs no explicit merge. Horizontal (`\clmgf`/`\clmrg`) and
//! vertical (`\clvmgf`/`\clvmrg`) merges are then folded into col-span and
//! row-span. Trailing single-cell rows of a wider table are footnotes and
//! are dropped.
//!
//! Visible text outside table paragraphs ends the current table; the last
//! such paragraph before a table becomes its caption.

use lazy_static::lazy_static;
use regex::Regex;

use super::Extractor;
use crate::core::table::{CellSpec, CellStyle, HAlign, RowSpec, Table, TableBuilder};
use crate::utils::error::{TableError, TableResult};

lazy_static! {
    /// One RTF token: control word, hex escape, control symbol, brace, line break or text run
    static ref TOKEN: Regex = Regex::new(
        r"\\[a-zA-Z]+(?:-?\d+)? ?|\\'[0-9a-fA-F]{2}|\\[^a-zA-Z]|\\$|[{}]|[\r\n]+|[^\\{}\r\n]+"
    )
    .unwrap();

    static ref CONTROL_WORD: Regex = Regex::new(r"^\\([a-zA-Z]+)(-?\d+)? ?$").unwrap();
}

/// Destinations whose content never reaches the page
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "filetbl",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "pgdsctbl",
    "object",
    "fldinst",
    "nonshppict",
];

/// Boundaries closer than this many twips are the same column edge
const EDGE_SNAP_TWIPS: i32 = 10;

/// Extracts every table of an RTF document
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfExtractor;

impl RtfExtractor {
    pub fn new() -> Self {
        RtfExtractor
    }
}

impl Extractor for RtfExtractor {
    fn extract(&self, raw: &str) -> TableResult<Vec<Table>> {
        if !raw.trim_start().starts_with(r"{\rtf") {
            return Err(TableError::parse("input is not an RTF document"));
        }

        let mut parser = RtfParser::default();
        for token in TOKEN.find_iter(raw) {
            parser.token(token.as_str())?;
        }
        parser.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Merge {
    #[default]
    None,
    First,
    Continue,
}

/// Cell definition declared by `\cellx`
#[derive(Debug, Clone, Copy, Default)]
struct CellDef {
    horizontal: Merge,
    vertical: Merge,
    /// Right boundary in twips
    right: i32,
}

/// Formatting scoped to one brace group
#[derive(Debug, Clone, Copy)]
struct GroupState {
    style: CellStyle,
    /// Fallback characters following `\uN`
    unicode_skip: usize,
    skip: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        GroupState {
            style: CellStyle::default(),
            unicode_skip: 1,
            skip: false,
        }
    }
}

#[derive(Debug, Default)]
struct RowState {
    defs: Vec<CellDef>,
    pending: CellDef,
    header: bool,
    cells: Vec<CellSpec>,
    text: String,
    /// Style of the first visible text in the current cell
    text_style: Option<CellStyle>,
    open: bool,
}

/// A finished row before its cells are placed on the column grid
#[derive(Debug)]
struct RawRow {
    cells: Vec<(CellSpec, CellDef)>,
    header: bool,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<RawRow>,
    caption: Option<String>,
}

#[derive(Debug, Default)]
struct RtfParser {
    stack: Vec<GroupState>,
    state: GroupState,
    pending_skip: usize,
    in_table_paragraph: bool,
    row: RowState,
    table: Option<TableState>,
    finished: Vec<TableState>,
    paragraph: String,
    last_paragraph: Option<String>,
}

impl RtfParser {
    fn token(&mut self, token: &str) -> TableResult<()> {
        match token {
            "{" => {
                self.stack.push(self.state);
                self.pending_skip = 0;
            }
            "}" => {
                self.state = self
                    .stack
                    .pop()
                    .ok_or_else(|| TableError::parse("unbalanced closing brace"))?;
                self.pending_skip = 0;
            }
            _ if token.starts_with("\\'") && token.len() == 4 => {
                if let Ok(byte) = u8::from_str_radix(&token[2..], 16) {
                    if self.pending_skip > 0 {
                        self.pending_skip -= 1;
                    } else {
                        self.text(&decode_cp1252(byte).to_string());
                    }
                }
            }
            _ if token.starts_with('\\') => self.control(token)?,
            _ if token.starts_with(['\r', '\n']) => {}
            _ => self.text(token),
        }
        Ok(())
    }

    fn control(&mut self, token: &str) -> TableResult<()> {
        let Some(caps) = CONTROL_WORD.captures(token) else {
            return self.control_symbol(token);
        };
        let word = caps.get(1).map_or("", |m| m.as_str());
        let param: Option<i32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let on = param != Some(0);

        if SKIPPED_DESTINATIONS.contains(&word) {
            self.state.skip = true;
            return Ok(());
        }
        if self.state.skip {
            return Ok(());
        }

        match word {
            // Table structure
            "trowd" => self.start_row_definition(),
            "trhdr" => self.row.header = true,
            "clmgf" => self.row.pending.horizontal = Merge::First,
            "clmrg" => self.row.pending.horizontal = Merge::Continue,
            "clvmgf" => self.row.pending.vertical = Merge::First,
            "clvmrg" => self.row.pending.vertical = Merge::Continue,
            "cellx" => {
                let mut def = std::mem::take(&mut self.row.pending);
                def.right = param.unwrap_or(0);
                self.row.defs.push(def);
            }
            "intbl" => {
                self.in_table_paragraph = true;
                self.ensure_table();
            }
            "cell" => self.finish_cell(),
            "row" => self.finish_row()?,
            "nestcell" | "nestrow" | "nesttableprops" => {
                return Err(TableError::parse("nested tables are not supported"));
            }

            // Paragraph formatting
            "pard" => {
                self.in_table_paragraph = false;
                self.state.style.align = HAlign::Default;
            }
            "ql" => self.state.style.align = HAlign::Left,
            "qc" => self.state.style.align = HAlign::Center,
            "qr" => self.state.style.align = HAlign::Right,
            "qj" => self.state.style.align = HAlign::Justify,
            "par" => self.paragraph_break(),

            // Character formatting
            "plain" => {
                let align = self.state.style.align;
                self.state.style = CellStyle {
                    align,
                    ..CellStyle::default()
                };
            }
            "b" => self.state.style.bold = on,
            "i" => self.state.style.italic = on,
            "ul" => self.state.style.underline = on,
            "uld" | "uldb" | "ulw" | "ulth" | "uldash" => self.state.style.underline = on,
            "ulnone" => self.state.style.underline = false,

            // Special characters
            "line" | "tab" => self.text(" "),
            "emdash" => self.text("\u{2014}"),
            "endash" => self.text("\u{2013}"),
            "bullet" => self.text("\u{2022}"),
            "lquote" => self.text("\u{2018}"),
            "rquote" => self.text("\u{2019}"),
            "ldblquote" => self.text("\u{201C}"),
            "rdblquote" => self.text("\u{201D}"),
            "uc" => self.state.unicode_skip = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(code) = param {
                    // Negative parameters address the upper half of the BMP
                    let code = code.rem_euclid(65536) as u32;
                    self.text(&char::from_u32(code).unwrap_or('\u{FFFD}').to_string());
                    self.pending_skip = self.state.unicode_skip;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn control_symbol(&mut self, token: &str) -> TableResult<()> {
        match token {
            r"\*" => self.state.skip = true,
            _ if self.state.skip => {}
            r"\\" | r"\{" | r"\}" => self.text(&token[1..]),
            r"\~" => self.text(" "),
            r"\_" => self.text("-"),
            "\\\n" | "\\\r" => self.paragraph_break(),
            _ => {}
        }
        Ok(())
    }

    fn in_cell(&self) -> bool {
        self.in_table_paragraph || self.row.open
    }

    fn text(&mut self, text: &str) {
        if self.state.skip {
            return;
        }

        let text = if self.pending_skip > 0 {
            let skipped = text.chars().take(self.pending_skip).count();
            self.pending_skip -= skipped;
            let offset = text
                .char_indices()
                .nth(skipped)
                .map_or(text.len(), |(i, _)| i);
            &text[offset..]
        } else {
            text
        };
        if text.is_empty() {
            return;
        }

        if self.in_cell() {
            if self.row.text_style.is_none() && !text.trim().is_empty() {
                self.row.text_style = Some(self.state.style);
            }
            self.row.text.push_str(text);
            return;
        }

        if !text.trim().is_empty() {
            self.finish_table();
        }
        self.paragraph.push_str(text);
    }

    fn paragraph_break(&mut self) {
        if self.state.skip {
            return;
        }
        if self.in_cell() {
            self.row.text.push(' ');
            return;
        }

        let paragraph = std::mem::take(&mut self.paragraph);
        let trimmed = paragraph.trim();
        if !trimmed.is_empty() {
            self.last_paragraph = Some(trimmed.to_string());
        }
    }

    fn ensure_table(&mut self) {
        if self.table.is_none() {
            let caption = self.last_paragraph.take().or_else(|| {
                let pending = std::mem::take(&mut self.paragraph);
                let trimmed = pending.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });
            self.table = Some(TableState {
                caption,
                ..TableState::default()
            });
        }
    }

    fn start_row_definition(&mut self) {
        self.ensure_table();
        // Writers may repeat the row definition just before `\row`
        self.row.defs.clear();
        self.row.pending = CellDef::default();
        self.row.header = false;
        self.row.open = true;
    }

    fn finish_cell(&mut self) {
        self.ensure_table();
        let text = std::mem::take(&mut self.row.text);
        let mut style = self.row.text_style.take().unwrap_or(self.state.style);
        style.align = self.state.style.align;
        self.row.cells.push(CellSpec {
            text,
            rowspan: 1,
            colspan: 1,
            style,
        });
        self.row.open = true;
    }

    fn finish_row(&mut self) -> TableResult<()> {
        self.ensure_table();
        let row = std::mem::take(&mut self.row);
        let Some(table) = self.table.as_mut() else {
            return Ok(());
        };
        let row_index = table.rows.len();

        if row.cells.len() != row.defs.len() {
            tracing::warn!(
                row = row_index,
                cells = row.cells.len(),
                boundaries = row.defs.len(),
                "cell count does not match the row definition"
            );
            return Err(TableError::malformed_at_row(
                format!(
                    "row has {} cells but {} cell boundaries",
                    row.cells.len(),
                    row.defs.len()
                ),
                row_index,
            ));
        }

        table.rows.push(RawRow {
            cells: row.cells.into_iter().zip(row.defs).collect(),
            header: row.header,
        });
        Ok(())
    }

    fn finish_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        if table.rows.is_empty() {
            return;
        }
        self.finished.push(table);
    }

    fn finish(mut self) -> TableResult<Vec<Table>> {
        if !self.stack.is_empty() {
            tracing::warn!(open_groups = self.stack.len(), "document ends inside a group");
        }
        if !self.row.cells.is_empty() {
            let row = self.table.as_ref().map_or(0, |t| t.rows.len());
            return Err(TableError::malformed_at_row("row is never terminated", row));
        }
        self.finish_table();

        let tables = self
            .finished
            .into_iter()
            .map(build_table)
            .collect::<TableResult<Vec<_>>>()?;

        tracing::debug!(tables = tables.len(), "extracted RTF tables");
        Ok(tables)
    }
}

/// Place the rows of one table on its column grid and fold merges
fn build_table(state: TableState) -> TableResult<Table> {
    let mut rows = state.rows;
    let footnotes = trailing_footnotes(&rows);
    if footnotes > 0 {
        tracing::debug!(rows = footnotes, "dropping single-cell footnote rows");
        rows.truncate(rows.len() - footnotes);
    }

    let edges = column_edges(&rows);
    let mut builder = TableBuilder::new().declared_columns(edges.len());
    if let Some(caption) = state.caption {
        builder = builder.caption(caption);
    }

    let mut resolved: Vec<RowSpec> = Vec::with_capacity(rows.len());
    // Open vertical merge per grid column: (row, cell index in that row)
    let mut vertical: Vec<Option<(usize, usize)>> = vec![None; edges.len()];

    for (row_index, row) in rows.into_iter().enumerate() {
        let spans = column_spans(&row, &edges, row_index)?;

        // Fold horizontal merges into col-spans
        let mut merged: Vec<(CellSpec, Merge)> = Vec::with_capacity(row.cells.len());
        for (position, ((mut cell, def), span)) in row.cells.into_iter().zip(spans).enumerate() {
            if def.horizontal != Merge::Continue {
                cell.colspan = span;
                merged.push((cell, def.vertical));
                continue;
            }
            match merged.last_mut() {
                Some((anchor, _)) => anchor.colspan += span,
                None => {
                    return Err(TableError::malformed_at(
                        "horizontal merge continues no cell",
                        row_index,
                        position,
                    ));
                }
            }
        }

        // Fold vertical merges into row-spans of the cell above
        let mut spec = RowSpec {
            cells: Vec::with_capacity(merged.len()),
            header: row.header,
        };
        let mut column = 0;
        for (cell, merge) in merged {
            let width = cell.colspan;

            if merge == Merge::Continue {
                let Some((r, k)) = vertical[column] else {
                    return Err(TableError::malformed_at(
                        "vertical merge continues no cell",
                        row_index,
                        column,
                    ));
                };
                let anchor = &mut resolved[r].cells[k];
                if anchor.colspan != width {
                    return Err(TableError::malformed_at(
                        "vertical merge changes width",
                        row_index,
                        column,
                    ));
                }
                anchor.rowspan += 1;
            } else {
                for slot in &mut vertical[column..column + width] {
                    *slot = None;
                }
                if merge == Merge::First {
                    vertical[column] = Some((row_index, spec.cells.len()));
                }
                spec.cells.push(cell);
            }
            column += width;
        }

        resolved.push(spec);
    }

    for row in resolved {
        builder.push_row(row);
    }
    builder.build()
}

/// Number of trailing single-cell body rows in a table wider than one cell
fn trailing_footnotes(rows: &[RawRow]) -> usize {
    if !rows.iter().any(|row| row.cells.len() > 1) {
        return 0;
    }
    rows.iter()
        .rev()
        .take_while(|row| !row.header && row.cells.len() == 1)
        .count()
}

/// Sorted right edges of every column, near-equal `\cellx` values snapped together
fn column_edges(rows: &[RawRow]) -> Vec<i32> {
    let mut rights: Vec<i32> = rows
        .iter()
        .flat_map(|row| row.cells.iter().map(|(_, def)| def.right))
        .collect();
    rights.sort_unstable();

    let mut edges: Vec<i32> = Vec::new();
    for right in rights {
        match edges.last() {
            Some(&last) if right - last <= EDGE_SNAP_TWIPS => {}
            _ => edges.push(right),
        }
    }
    edges
}

/// Column index of the edge a `\cellx` position snaps to
fn edge_index(edges: &[i32], right: i32) -> usize {
    edges.partition_point(|&edge| edge <= right).saturating_sub(1)
}

/// Columns covered by each cell of a row
fn column_spans(row: &RawRow, edges: &[i32], row_index: usize) -> TableResult<Vec<usize>> {
    let mut spans = Vec::with_capacity(row.cells.len());
    let mut start = 0;
    for (_, def) in &row.cells {
        let edge = edge_index(edges, def.right);
        if edge < start {
            return Err(TableError::malformed_at(
                format!("cell boundary {} does not advance past the previous cell", def.right),
                row_index,
                start,
            ));
        }
        spans.push(edge + 1 - start);
        start = edge + 1;
    }
    Ok(spans)
}

/// Windows-1252 decoding of one byte
fn decode_cp1252(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        other => other as char,
    }
}
