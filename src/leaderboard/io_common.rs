use calamine::DataType;

/// The text of a cell, as displayed. Empty cells and errors have no text.
pub fn cell_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) if s.trim().is_empty() => None,
        DataType::String(s) => Some(s.clone()),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The numeric value of a cell. Text is parsed after trimming.
/// Non-finite values are rejected.
pub fn cell_number(cell: &DataType) -> Option<f64> {
    let x = match cell {
        DataType::Float(f) => *f,
        DataType::Int(i) => *i as f64,
        DataType::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// A rectangular block of cells, zero-based and inclusive on both ends.
/// Whole columns (`B:B`) and whole rows (`2:2`) leave the other dimension open.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CellArea {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl CellArea {
    pub fn cell(row: u32, col: u32) -> CellArea {
        CellArea {
            first_row: row,
            last_row: row,
            first_col: col,
            last_col: col,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

/// One end of a reference: `B12`, `B` or `12`, as zero-based (row, column).
/// The `$` markers are ignored.
fn parse_ref_bound(reference: &str) -> Option<(Option<u32>, Option<u32>)> {
    let r: String = reference.chars().filter(|c| *c != '$').collect();
    let split = r.find(|c: char| c.is_ascii_digit()).unwrap_or(r.len());
    let (letters, digits) = r.split_at(split);
    if letters.is_empty() && digits.is_empty() {
        return None;
    }
    let col = if letters.is_empty() {
        None
    } else {
        if !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let mut col: u32 = 0;
        for c in letters.chars() {
            col = col
                .checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
        }
        Some(col - 1)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(row - 1)
    };
    Some((row, col))
}

/// Zero-based (row, column) of an A1-style cell reference.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    match parse_ref_bound(reference)? {
        (Some(row), Some(col)) => Some((row, col)),
        _ => None,
    }
}

/// A single cell (`B2`), a block (`B2:C10`), whole columns (`B:B`) or whole rows (`2:5`).
pub fn parse_cell_area(reference: &str) -> Option<CellArea> {
    let (start, end) = match reference.split_once(':') {
        None => {
            let (row, col) = parse_cell_ref(reference)?;
            return Some(CellArea::cell(row, col));
        }
        Some(x) => x,
    };
    let (rows, cols) = match (parse_ref_bound(start)?, parse_ref_bound(end)?) {
        ((Some(r0), Some(c0)), (Some(r1), Some(c1))) => ((r0, r1), (c0, c1)),
        ((None, Some(c0)), (None, Some(c1))) => ((0, u32::MAX), (c0, c1)),
        ((Some(r0), None), (Some(r1), None)) => ((r0, r1), (0, u32::MAX)),
        _ => return None,
    };
    Some(CellArea {
        first_row: rows.0.min(rows.1),
        last_row: rows.0.max(rows.1),
        first_col: cols.0.min(cols.1),
        last_col: cols.0.max(cols.1),
    })
}

/// A space-separated list of areas, as found in the `ref` of a hyperlink.
/// Returns `None` if any of them cannot be understood.
pub fn parse_cell_areas(reference: &str) -> Option<Vec<CellArea>> {
    let areas: Option<Vec<CellArea>> = reference.split_whitespace().map(parse_cell_area).collect();
    areas.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_references() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("B12"), Some((11, 1)));
        assert_eq!(parse_cell_ref("$AA$3"), Some((2, 26)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("B"), None);
        assert_eq!(parse_cell_ref("B-2"), None);
    }

    #[test]
    fn cell_areas() {
        assert_eq!(parse_cell_area("C3"), Some(CellArea::cell(2, 2)));
        assert_eq!(
            parse_cell_area("B4:A2"),
            Some(CellArea {
                first_row: 1,
                last_row: 3,
                first_col: 0,
                last_col: 1
            })
        );
        assert_eq!(parse_cell_area("B2:C"), None);
        assert_eq!(parse_cell_area(":"), None);
        assert!(CellArea::cell(2, 2).is_single_cell());
    }

    #[test]
    fn whole_columns_and_rows() {
        let col = parse_cell_area("B:B").unwrap();
        assert!(col.contains(0, 1));
        assert!(col.contains(1_048_575, 1));
        assert!(!col.contains(5, 0));
        assert!(!col.contains(5, 2));

        let rows = parse_cell_area("$2:$3").unwrap();
        assert!(rows.contains(1, 16_383));
        assert!(!rows.contains(0, 0));
        assert!(!rows.contains(3, 0));
    }

    #[test]
    fn full_sheet_area_is_not_expanded() {
        let all = parse_cell_area("A1:XFD1048576").unwrap();
        assert_eq!(all.last_row, 1_048_575);
        assert_eq!(all.last_col, 16_383);
        assert!(all.contains(500, 1));
    }

    #[test]
    fn space_separated_areas() {
        let areas = parse_cell_areas("B2 D4:D6").unwrap();
        assert_eq!(areas.len(), 2);
        assert!(areas[0].contains(1, 1));
        assert!(areas[1].contains(4, 3));
        assert_eq!(parse_cell_areas("B2 ??"), None);
        assert_eq!(parse_cell_areas("  "), None);
    }

    #[test]
    fn cell_values() {
        assert_eq!(cell_text(&DataType::String("x".to_string())), Some("x".to_string()));
        assert_eq!(cell_text(&DataType::String("  ".to_string())), None);
        assert_eq!(cell_text(&DataType::Empty), None);
        assert_eq!(cell_text(&DataType::Int(3)), Some("3".to_string()));
        assert_eq!(cell_number(&DataType::Float(2.5)), Some(2.5));
        assert_eq!(cell_number(&DataType::String(" 1200 ".to_string())), Some(1200.0));
        assert_eq!(cell_number(&DataType::String("n/a".to_string())), None);
        assert_eq!(cell_number(&DataType::String("inf".to_string())), None);
        assert_eq!(cell_number(&DataType::Empty), None);
    }
}
