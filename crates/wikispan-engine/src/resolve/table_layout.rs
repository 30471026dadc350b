//! Cell grid assembly with `rowspan` and `colspan`.

use std::collections::BTreeMap;

const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

/// Reads a span attribute. Anything but a positive integer counts as 1.
pub fn span_value(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// Row and column span of a cell from its attribute map.
pub fn spans(attrs: &BTreeMap<String, String>) -> (usize, usize) {
    let get = |name: &str| {
        attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };
    (
        span_value(get("rowspan")).min(MAX_ROWSPAN),
        span_value(get("colspan")).min(MAX_COLSPAN),
    )
}

/// A cell with its row and column span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed<T> {
    pub value: T,
    pub rowspan: usize,
    pub colspan: usize,
}

/// Lays raw rows out on a grid. Each cell takes the first free column of
/// its row and is repeated over the rows and columns it spans; rowspans
/// stop at the last row. Positions no cell covers are `None`.
pub fn layout<T: Clone>(rows: Vec<Vec<Placed<T>>>) -> Vec<Vec<Option<T>>> {
    let height = rows.len();
    let mut grid: Vec<Vec<Option<T>>> = vec![Vec::new(); height];

    for (r, row) in rows.into_iter().enumerate() {
        let mut col = 0;
        for cell in row {
            while grid[r].get(col).is_some_and(Option::is_some) {
                col += 1;
            }
            let last_row = (r + cell.rowspan).min(height);
            for line in &mut grid[r..last_row] {
                if line.len() < col + cell.colspan {
                    line.resize(col + cell.colspan, None);
                }
                for slot in &mut line[col..col + cell.colspan] {
                    *slot = Some(cell.value.clone());
                }
            }
            col += cell.colspan;
        }
    }
    grid
}
