//! Tables, rows and cells.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::buffer::Span;
use crate::document::NodeRef;
use crate::error::{Error, Result};
use crate::nodes::{Memo, WS, WikiNode, construct, find_byte, region_shadow};
use crate::recognize::attrs::{self, Attr};
use crate::recognize::shadow;
use crate::recognize::tables::{ParsedCell, ParsedTable};
use crate::registry::{Detail, NodeKind};
use crate::resolve::table_layout::{self, Placed};

wrapper!(
    /// `{| ... |}`.
    Table,
    NodeKind::Table,
    parsed: Memo<ParsedTable>
);

wrapper!(
    /// A table row: an optional `|-` line and the cells after it.
    Row,
    NodeKind::Row
);

wrapper!(
    /// A table cell, from its `|`, `!`, `||` or `!!` separator.
    Cell,
    NodeKind::Cell
);

/// Attributes found in `text[region]`, with ranges local to `text`.
fn attrs_in(text: &str, region: Range<usize>) -> Vec<Attr> {
    let s = shadow::ascii(&text[region.clone()]);
    let at = region.start;
    attrs::parse(&s)
        .into_iter()
        .map(|a| Attr {
            name: a.name.start + at..a.name.end + at,
            value: a.value.map(|v| v.start + at..v.end + at),
            quote: a.quote,
            span: a.span.start + at..a.span.end + at,
        })
        .collect()
}

fn attr_value(text: &str, attrs: &[Attr], name: &str) -> Option<String> {
    attrs::find(text, attrs, name).map(|a| a.value.clone().map(|v| text[v].to_string()).unwrap_or_default())
}

/// Sets an attribute inside `region`; a missing one goes after the last
/// attribute.
fn set_attr_in(node: &NodeRef, text: &str, region: Range<usize>, name: &str, value: &str) -> Result<()> {
    let found = attrs_in(text, region.clone());
    match attrs::find(text, &found, name) {
        Some(attr) => node.edit_within(attr.span.clone(), &attrs::render(name, value)),
        None => {
            let at = found.last().map_or(region.start, |a| a.span.end);
            node.insert(at, &format!(" {}", attrs::render(name, value)))
        }
    }
}

fn del_attr_in(node: &NodeRef, text: &str, region: Range<usize>, name: &str) -> Result<()> {
    for attr in attrs_in(text, region.clone()).iter().rev() {
        if &text[attr.name.clone()] == name {
            let lead = text[..attr.span.start].trim_end().len().max(region.start);
            node.edit_within(lead..attr.span.end, "")?;
        }
    }
    Ok(())
}

/// Options for [`Table::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataOptions {
    /// Repeat cells over the rows and columns they span.
    pub span: bool,
    /// Drop leading spaces and trailing whitespace of values.
    pub strip: bool,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl Default for DataOptions {
    fn default() -> Self {
        DataOptions {
            span: true,
            strip: true,
            row: None,
            column: None,
        }
    }
}

impl Table {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Table)
    }

    fn parsed(&self) -> Result<(String, ParsedTable)> {
        let text = self.string()?;
        let parsed = self
            .parsed
            .get(self.node.version(), || Ok(self.node.with_recognizer(|r| r.table(&text))))?;
        Ok((text, parsed))
    }

    pub fn caption(&self) -> Result<Option<String>> {
        let (text, parsed) = self.parsed()?;
        Ok(parsed.caption.map(|c| text[c.text].to_string()))
    }

    pub fn caption_attrs(&self) -> Result<Option<String>> {
        let (text, parsed) = self.parsed()?;
        Ok(parsed.caption.and_then(|c| c.attrs).map(|a| text[a].to_string()))
    }

    /// Sets the caption, adding a `|+` line after the first line when the
    /// table has none.
    pub fn set_caption(&self, caption: &str) -> Result<()> {
        let (_, parsed) = self.parsed()?;
        match parsed.caption {
            Some(c) => self.node.edit_within(c.text, caption),
            None => self.node.insert(parsed.attrs.end, &format!("\n|+{caption}")),
        }
    }

    /// Attribute map of the `{|` line.
    pub fn attrs(&self) -> Result<BTreeMap<String, String>> {
        let (text, parsed) = self.parsed()?;
        Ok(attrs::to_map(&text, &attrs_in(&text, parsed.attrs)))
    }

    pub fn get_attr(&self, name: &str) -> Result<Option<String>> {
        let (text, parsed) = self.parsed()?;
        Ok(attr_value(&text, &attrs_in(&text, parsed.attrs), name))
    }

    pub fn has_attr(&self, name: &str) -> Result<bool> {
        Ok(self.get_attr(name)?.is_some())
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        let (text, parsed) = self.parsed()?;
        set_attr_in(&self.node, &text, parsed.attrs, name, value)
    }

    pub fn del_attr(&self, name: &str) -> Result<()> {
        let (text, parsed) = self.parsed()?;
        del_attr_in(&self.node, &text, parsed.attrs, name)
    }

    /// Rows of this table, nested tables excluded.
    pub fn rows(&self) -> Result<Vec<Row>> {
        let (_, parsed) = self.parsed()?;
        let start = self.span()?.start;
        Ok(parsed
            .rows
            .iter()
            .filter_map(|r| {
                self.node
                    .register(NodeKind::Row, Span::from(r.span.clone()).offset(start), Detail::None)
            })
            .map(Row::from)
            .collect())
    }

    /// Cells as written, row by row.
    pub fn cells(&self) -> Result<Vec<Vec<Cell>>> {
        let (_, parsed) = self.parsed()?;
        let start = self.span()?.start;
        Ok(parsed
            .rows
            .iter()
            .map(|row| register_cells(&self.node, &row.cells, start))
            .collect())
    }

    /// Cells laid out on a grid with their spans applied; `None` where no
    /// cell reaches.
    pub fn cell_grid(&self) -> Result<Vec<Vec<Option<Cell>>>> {
        let mut rows = Vec::new();
        for row in self.cells()? {
            let mut placed = Vec::with_capacity(row.len());
            for cell in row {
                let (rowspan, colspan) = table_layout::spans(&cell.attrs()?);
                placed.push(Placed {
                    value: cell,
                    rowspan,
                    colspan,
                });
            }
            rows.push(placed);
        }
        Ok(table_layout::layout(rows))
    }

    /// Cell values. With `span`, spanning cells repeat and holes read as
    /// empty strings; `row` and `column` narrow the result.
    pub fn data(&self, options: DataOptions) -> Result<Vec<Vec<String>>> {
        let value = |cell: &Cell| -> Result<String> {
            let v = cell.value()?;
            Ok(if options.strip {
                v.trim_start_matches(' ').trim_end_matches(WS).to_string()
            } else {
                v
            })
        };
        let mut rows: Vec<Vec<String>> = Vec::new();
        if options.span {
            for row in self.cell_grid()? {
                rows.push(
                    row.iter()
                        .map(|c| c.as_ref().map_or(Ok(String::new()), &value))
                        .collect::<Result<_>>()?,
                );
            }
        } else {
            for row in self.cells()? {
                rows.push(row.iter().map(&value).collect::<Result<_>>()?);
            }
        }

        if let Some(r) = options.row {
            let len = rows.len();
            if r >= len {
                return Err(Error::IndexOutOfRange {
                    kind: NodeKind::Table,
                    index: r,
                    len,
                });
            }
            rows = vec![rows.swap_remove(r)];
        }
        if let Some(c) = options.column {
            for row in &mut rows {
                let len = row.len();
                if c >= len {
                    return Err(Error::IndexOutOfRange {
                        kind: NodeKind::Table,
                        index: c,
                        len,
                    });
                }
                *row = vec![row.swap_remove(c)];
            }
        }
        Ok(rows)
    }

    /// Number of enclosing tables.
    pub fn nesting_level(&self) -> Result<usize> {
        Ok(self.node.ancestors_of(Some(NodeKind::Table))?.len())
    }
}

fn register_cells(node: &NodeRef, cells: &[ParsedCell], start: usize) -> Vec<Cell> {
    cells
        .iter()
        .filter_map(|c| {
            node.register(
                NodeKind::Cell,
                Span::from(c.span.clone()).offset(start),
                Detail::Cell {
                    header: c.header,
                    inline: c.inline,
                },
            )
        })
        .map(Cell::from)
        .collect()
}

const ROW_PREFIX: &str = "{|\n";

impl Row {
    /// The row parsed as the only row of a table.
    fn parsed(&self) -> Result<ParsedTable> {
        let text = format!("{ROW_PREFIX}{}", self.string()?);
        Ok(self.node.with_recognizer(|r| r.table(&text)))
    }

    pub fn cells(&self) -> Result<Vec<Cell>> {
        let parsed = self.parsed()?;
        let start = self.span()?.start;
        Ok(parsed
            .rows
            .first()
            .map(|row| {
                let cells: Vec<ParsedCell> = row
                    .cells
                    .iter()
                    .map(|c| ParsedCell {
                        span: c.span.start - ROW_PREFIX.len()..c.span.end - ROW_PREFIX.len(),
                        ..c.clone()
                    })
                    .collect();
                register_cells(&self.node, &cells, start)
            })
            .unwrap_or_default())
    }

    /// Attribute map of the `|-` line.
    pub fn attrs(&self) -> Result<BTreeMap<String, String>> {
        let text = self.string()?;
        let region = self.attrs_region(&text);
        Ok(attrs::to_map(&text, &attrs_in(&text, region)))
    }

    pub fn get_attr(&self, name: &str) -> Result<Option<String>> {
        let text = self.string()?;
        let region = self.attrs_region(&text);
        Ok(attr_value(&text, &attrs_in(&text, region), name))
    }

    fn attrs_region(&self, text: &str) -> Range<usize> {
        let trimmed = text.trim_start_matches([' ', '\t']);
        let at = text.len() - trimmed.len();
        if !trimmed.starts_with("|-") {
            return at..at;
        }
        let dashes = trimmed[1..].bytes().take_while(|&b| b == b'-').count();
        let start = at + 1 + dashes;
        let end = text[start..].find('\n').map_or(text.len(), |n| start + n);
        start..end
    }
}

/// Local layout of a cell.
struct CellParts {
    text: String,
    attrs: Option<Range<usize>>,
    value: Range<usize>,
    separator_end: usize,
}

impl Cell {
    fn parts(&self) -> Result<CellParts> {
        let text = self.string()?;
        let inline = matches!(self.node.detail()?, Detail::Cell { inline: true, .. });
        let width = if inline { 2 } else { 1 }.min(text.len());
        let end = text.strip_suffix('\n').map_or(text.len(), str::len);
        let end = end.max(width);
        let s = region_shadow(&self.node, &text, width..end);
        let first_line_end = find_byte(&s, width..end, b'\n').unwrap_or(end);
        let pipe = find_byte(&s, width..first_line_end, b'|');
        Ok(CellParts {
            attrs: pipe.map(|p| width..p),
            value: pipe.map_or(width, |p| p + 1)..end,
            separator_end: width,
            text,
        })
    }

    pub fn is_header(&self) -> Result<bool> {
        Ok(self.string()?.starts_with('!'))
    }

    pub fn value(&self) -> Result<String> {
        let parts = self.parts()?;
        Ok(parts.text[parts.value].to_string())
    }

    pub fn set_value(&self, value: &str) -> Result<()> {
        self.node.edit_within(self.parts()?.value, value)
    }

    pub fn attrs(&self) -> Result<BTreeMap<String, String>> {
        let parts = self.parts()?;
        Ok(match parts.attrs {
            Some(region) => attrs::to_map(&parts.text, &attrs_in(&parts.text, region)),
            None => BTreeMap::new(),
        })
    }

    pub fn get_attr(&self, name: &str) -> Result<Option<String>> {
        let parts = self.parts()?;
        Ok(parts
            .attrs
            .and_then(|region| attr_value(&parts.text, &attrs_in(&parts.text, region), name)))
    }

    pub fn has_attr(&self, name: &str) -> Result<bool> {
        Ok(self.get_attr(name)?.is_some())
    }

    /// Sets an attribute. A cell without attributes gets an attribute
    /// section after its separator.
    pub fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        let parts = self.parts()?;
        match parts.attrs {
            Some(region) => set_attr_in(&self.node, &parts.text, region, name, value),
            None => self.node.insert(
                parts.separator_end,
                &format!(" {} |", attrs::render(name, value)),
            ),
        }
    }

    pub fn del_attr(&self, name: &str) -> Result<()> {
        let parts = self.parts()?;
        match parts.attrs {
            Some(region) => del_attr_in(&self.node, &parts.text, region, name),
            None => Ok(()),
        }
    }
}
