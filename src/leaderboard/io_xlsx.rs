use calamine::{open_workbook, Range, Reader, Xlsx};
use std::collections::HashMap;

use crate::leaderboard::io_common::cell_text;
use crate::leaderboard::io_hyperlinks::{read_hyperlinks, SheetHyperlinks};
use crate::leaderboard::*;

/// Reads all the worksheets of the leaderboard, in workbook order.
///
/// Worksheets that do not have all the required columns are skipped with a warning.
pub fn read_leaderboard(path: &Path, columns: &ColumnNames) -> BLeaderboardResult<Vec<LoadedSheet>> {
    let path_s = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;
    let hyperlinks = read_hyperlinks(path)?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    debug!("read_leaderboard: worksheets: {:?}", sheet_names);

    let mut res: Vec<LoadedSheet> = Vec::new();
    for sheet_name in sheet_names {
        let wrange = workbook
            .worksheet_range(&sheet_name)
            .context(MissingSheetSnafu {
                sheet: sheet_name.clone(),
            })?
            .context(ReadingSheetSnafu {
                sheet: sheet_name.clone(),
                path: path_s.clone(),
            })?;
        if let Some(sheet) = read_sheet(&sheet_name, &wrange, columns, hyperlinks.get(&sheet_name))
        {
            info!(
                "Read worksheet {:?}: {} rows",
                sheet.name,
                sheet.rows.len()
            );
            res.push(sheet);
        }
    }
    Ok(res)
}

/// Reads the rows of one worksheet. Returns `None` if a required column is missing.
///
/// The header is the first row of the worksheet. The column indices are resolved once from it.
pub fn read_sheet(
    sheet_name: &str,
    wrange: &Range<DataType>,
    columns: &ColumnNames,
    hyperlinks: Option<&SheetHyperlinks>,
) -> Option<LoadedSheet> {
    let empty_header: Vec<DataType> = Vec::new();
    let header = wrange.rows().next().unwrap_or(empty_header.as_slice());
    debug!("read_sheet: {:?}: header: {:?}", sheet_name, header);

    let col_indexes = match get_col_index(&columns.required(), header) {
        Ok(x) => x,
        Err(missing) => {
            warn!(
                "Worksheet {:?} is missing the expected column {:?}. Skipping this worksheet.",
                sheet_name, missing
            );
            return None;
        }
    };
    // The rate column is required but not used.
    let [rank_idx, user_idx, rewards_idx, _rate_idx, balance_idx] = col_indexes;

    // The range starts at the first non-empty cell, which is not always A1.
    let (start_row, start_col) = wrange.start().unwrap_or((0, 0));
    let user_col = start_col + user_idx as u32;

    let cell = |row: &[DataType], idx: usize| row.get(idx).cloned().unwrap_or(DataType::Empty);

    let mut rows: Vec<RawRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(1) {
        let abs_row = start_row + idx as u32;
        let link = hyperlinks.and_then(|links| links.get(abs_row, user_col));
        let user = match link {
            Some(target) => Some(target.to_string()),
            None => row.get(user_idx).and_then(cell_text),
        };
        rows.push(RawRow {
            lineno: abs_row as usize + 1,
            rank: cell(row, rank_idx),
            user,
            total_rewards: cell(row, rewards_idx),
            balance: cell(row, balance_idx),
        });
    }
    Some(LoadedSheet {
        name: sheet_name.to_string(),
        rows,
    })
}

/// Given the header of a worksheet, finds the position of each required column.
/// Returns the name of the first missing column otherwise.
fn get_col_index<const N: usize>(
    req_col_names: &[&str; N],
    header: &[DataType],
) -> Result<[usize; N], String> {
    let mut col_names: HashMap<&str, usize> = HashMap::new();
    for (idx, dt) in header.iter().enumerate() {
        if let DataType::String(s) = dt {
            // The first column with a given name wins.
            col_names.entry(s.as_str()).or_insert(idx);
        }
    }
    let mut res = [0usize; N];
    for (pos, cname) in req_col_names.iter().enumerate() {
        res[pos] = *col_names.get(cname).ok_or_else(|| cname.to_string())?;
    }
    Ok(res)
}
