use crate::config::{Cell, CellAddress};

/// A read-only snapshot of one worksheet.
///
/// Rows do not need to have the same length: everything that falls outside a row
/// is treated as an empty cell.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Grid {
        Grid { rows }
    }

    /// The number of rows, header included.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// The cell at this address, or None if the cell is missing or blank.
    pub fn get(&self, address: CellAddress) -> Option<&Cell> {
        self.rows
            .get(address.row)
            .and_then(|row| row.get(address.column))
            .filter(|c| !c.is_empty())
    }

    /// The trimmed text of a cell, empty if the cell is absent.
    pub fn get_string(&self, address: CellAddress) -> String {
        match self.get(address) {
            Some(Cell::String(s)) => s.trim().to_string(),
            Some(Cell::Number(n)) => number_to_string(*n),
            _ => "".to_string(),
        }
    }

    /// The numeric value of a cell. Strings are parsed; anything else is absent.
    pub fn get_number(&self, address: CellAddress) -> Option<f64> {
        match self.get(address) {
            Some(Cell::Number(n)) => Some(*n),
            Some(Cell::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// Writes integral numbers without a fractional part (`1990`, not `1990.0`).
pub(crate) fn number_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Converts a spreadsheet column name (`A`, `K`, `AA`) to a 0-based index.
pub fn column_index_from_letters(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut idx: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let v = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        idx = idx.checked_mul(26)?.checked_add(v)?;
    }
    Some(idx - 1)
}
