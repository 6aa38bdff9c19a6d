pub use crate::config::*;
pub use crate::grid::Grid;

/// A builder for grids made of text cells.
///
/// This is the simplest way to feed rows that do not come from a workbook, such as
/// the lines of a CSV file.
///
/// ```
/// use roster_stats::builder::GridBuilder;
/// use roster_stats::{extract_participants, RosterSettings};
///
/// let mut header: Vec<String> = (0..10).map(|i| format!("col{}", i)).collect();
/// header.push("4월 22일 화요일".to_string());
/// let row: Vec<&str> = vec!["", "", "홍길동", "형제", "서울지회", "1990", "", "기혼", "", "", "O"];
///
/// let grid = GridBuilder::new().row(&header).row(&row).build();
/// let participants = extract_participants(&grid, &RosterSettings::default());
///
/// assert_eq!(participants.len(), 1);
/// assert_eq!(participants[0].first_date, "4월 22일");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridBuilder {
    _rows: Vec<Vec<Cell>>,
}

impl GridBuilder {
    pub fn new() -> GridBuilder {
        GridBuilder { _rows: Vec::new() }
    }

    /// Adds a row of text cells. Blank strings become empty cells.
    pub fn row<S: AsRef<str>>(mut self, cells: &[S]) -> GridBuilder {
        self.add_row(cells);
        self
    }

    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let row = cells
            .iter()
            .map(|s| {
                let s = s.as_ref();
                if s.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::String(s.to_string())
                }
            })
            .collect();
        self._rows.push(row);
    }

    /// Adds a row of already typed cells.
    pub fn add_cells(&mut self, cells: Vec<Cell>) {
        self._rows.push(cells);
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> Grid {
        Grid::new(self._rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellAddress;

    #[test]
    fn blank_strings_are_empty_cells() {
        let mut b = GridBuilder::new().row(&["a", " ", ""]);
        b.add_cells(vec![Cell::Number(3.0)]);
        assert_eq!(b.num_rows(), 2);
        let g = b.build();
        assert_eq!(g.get(CellAddress::new(0, 0)), Some(&Cell::String("a".to_string())));
        assert_eq!(g.get(CellAddress::new(0, 1)), None);
        assert_eq!(g.get_number(CellAddress::new(1, 0)), Some(3.0));
    }
}
