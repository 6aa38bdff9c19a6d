// Reading the roster from an Excel workbook.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::debug;
use snafu::{OptionExt, ResultExt};

use roster_stats::{Cell, Grid};

use crate::roster::*;

pub fn read_excel_grid(path: &str, worksheet_name: Option<&str>) -> RosterResult<Grid> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet_name: name,
            })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    debug!(
        "read_excel_grid: range starting at {:?} of size {:?}",
        wrange.start(),
        wrange.get_size()
    );
    Ok(grid_from_range(&wrange))
}

// The range only covers the used cells. It is padded so that the grid positions are
// the positions in the worksheet.
fn grid_from_range(wrange: &Range<DataType>) -> Grid {
    let (row_offset, column_offset) = wrange
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in wrange.rows() {
        let mut cells: Vec<Cell> = vec![Cell::Empty; column_offset];
        cells.extend(row.iter().map(convert_cell));
        rows.push(cells);
    }
    Grid::new(rows)
}

// Dates are kept as serial numbers, which is how the header parser reads them.
fn convert_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) => Cell::String(s.clone()),
        DataType::Float(f) | DataType::DateTime(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(true) => Cell::String("TRUE".to_string()),
        DataType::Bool(false) => Cell::String("FALSE".to_string()),
        _ => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_stats::{extract_participants, CellAddress, RosterSettings};

    #[test]
    fn cell_types() {
        assert_eq!(
            convert_cell(&DataType::String("O".to_string())),
            Cell::String("O".to_string())
        );
        assert_eq!(convert_cell(&DataType::Int(1990)), Cell::Number(1990.0));
        assert_eq!(convert_cell(&DataType::DateTime(45769.0)), Cell::Number(45769.0));
        assert_eq!(
            convert_cell(&DataType::Bool(true)),
            Cell::String("TRUE".to_string())
        );
        assert_eq!(convert_cell(&DataType::Empty), Cell::Empty);
    }

    #[test]
    fn ranges_not_starting_at_a1() {
        let mut wrange: Range<DataType> = Range::new((1, 2), (2, 3));
        wrange.set_value((1, 2), DataType::String("이름".to_string()));
        wrange.set_value((2, 3), DataType::Float(1990.0));
        let grid = grid_from_range(&wrange);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get_string(CellAddress::new(1, 2)), "이름");
        assert_eq!(grid.get_number(CellAddress::new(2, 3)), Some(1990.0));
        assert_eq!(grid.get(CellAddress::new(0, 0)), None);
    }

    #[test]
    fn roster_from_a_worksheet() {
        let mut wrange: Range<DataType> = Range::new((0, 0), (2, 11));
        wrange.set_value((0, 2), DataType::String("이름".to_string()));
        wrange.set_value((0, 10), DataType::DateTime(45769.0));
        wrange.set_value((0, 11), DataType::String("4월 23일 수요일".to_string()));
        wrange.set_value((1, 2), DataType::String("홍길동 형제".to_string()));
        wrange.set_value((1, 3), DataType::String("형제".to_string()));
        wrange.set_value((1, 4), DataType::String("서울성수".to_string()));
        wrange.set_value((1, 5), DataType::Float(1990.0));
        wrange.set_value((1, 10), DataType::Bool(true));
        wrange.set_value((1, 11), DataType::String("o".to_string()));
        wrange.set_value((2, 2), DataType::String("김영희".to_string()));
        wrange.set_value((2, 11), DataType::Int(1));
        let grid = grid_from_range(&wrange);
        let participants = extract_participants(&grid, &RosterSettings::default());
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].name, "홍길동");
        assert_eq!(participants[0].age, Some(35));
        assert_eq!(participants[0].attended_dates, vec!["4월 22일", "4월 23일"]);
        assert_eq!(participants[1].first_date, "4월 23일");
    }

    #[test]
    fn missing_workbook() {
        assert!(matches!(
            read_excel_grid("does_not_exist.xlsx", None),
            Err(RosterError::OpeningExcel { .. })
        ));
    }
}
