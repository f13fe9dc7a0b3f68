// Primitives for reading the hyperlinks of a workbook.
//
// calamine only exposes the values of the cells. The hyperlinks are stored next to the
// worksheets in the xlsx package: each worksheet has a <hyperlinks> element that refers
// to the relationships file of the worksheet, which holds the actual targets.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::leaderboard::io_common::{parse_cell_areas, CellArea};
use crate::leaderboard::*;

/// The hyperlink targets of a worksheet.
///
/// Areas are kept as declared and never expanded to cells: a single link may cover whole
/// columns. When several links cover a cell, the last one declared wins.
#[derive(Debug, Clone, Default)]
pub struct SheetHyperlinks {
    // Insertion order is kept to resolve overlaps.
    cells: HashMap<(u32, u32), (usize, String)>,
    areas: Vec<(usize, CellArea, String)>,
    count: usize,
}

impl SheetHyperlinks {
    pub fn insert(&mut self, area: CellArea, target: &str) {
        let seq = self.count;
        self.count += 1;
        if area.is_single_cell() {
            self.cells
                .insert((area.first_row, area.first_col), (seq, target.to_string()));
        } else {
            self.areas.push((seq, area, target.to_string()));
        }
    }

    /// The target of the link covering the cell at zero-based (row, column), if any.
    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        let cell = self.cells.get(&(row, col)).map(|(seq, t)| (*seq, t));
        let area = self
            .areas
            .iter()
            .rev()
            .find(|(_, a, _)| a.contains(row, col))
            .map(|(seq, _, t)| (*seq, t));
        let best = match (cell, area) {
            (Some(c), Some(a)) => Some(if c.0 > a.0 { c } else { a }),
            (c, a) => c.or(a),
        };
        best.map(|(_, t)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Reads the hyperlinks of all the worksheets, indexed by worksheet name.
pub fn read_hyperlinks(path: &Path) -> BLeaderboardResult<HashMap<String, SheetHyperlinks>> {
    let file = File::open(path).context(OpeningPackageSnafu {
        path: path.display().to_string(),
    })?;
    let mut archive = ZipArchive::new(file).context(ReadingPackageSnafu {
        entry: path.display().to_string(),
    })?;
    read_package_hyperlinks(&mut archive)
}

pub fn read_package_hyperlinks<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> BLeaderboardResult<HashMap<String, SheetHyperlinks>> {
    let mut res: HashMap<String, SheetHyperlinks> = HashMap::new();

    let workbook_entry = "xl/workbook.xml";
    let workbook_xml = match read_entry(archive, workbook_entry)? {
        Some(x) => x,
        None => {
            warn!("read_hyperlinks: no {} in the package", workbook_entry);
            return Ok(res);
        }
    };
    let sheets = parse_workbook_sheets(&workbook_xml, workbook_entry)?;

    let rels_entry = "xl/_rels/workbook.xml.rels";
    let workbook_rels = match read_entry(archive, rels_entry)? {
        Some(x) => parse_relationships(&x, rels_entry)?,
        None => HashMap::new(),
    };

    for (sheet_name, rid) in sheets {
        let sheet_entry = match workbook_rels.get(&rid) {
            Some(target) => resolve_target("xl", target),
            None => {
                warn!(
                    "read_hyperlinks: worksheet {:?} has no relationship {:?}",
                    sheet_name, rid
                );
                continue;
            }
        };
        let sheet_xml = match read_entry(archive, &sheet_entry)? {
            Some(x) => x,
            None => continue,
        };
        let refs = parse_sheet_hyperlinks(&sheet_xml, &sheet_entry)?;
        if refs.is_empty() {
            continue;
        }

        let sheet_rels_entry = relationships_entry(&sheet_entry);
        let sheet_rels = match read_entry(archive, &sheet_rels_entry)? {
            Some(x) => parse_relationships(&x, &sheet_rels_entry)?,
            None => HashMap::new(),
        };

        let mut links = SheetHyperlinks::default();
        for (reference, rid) in refs {
            // Links to a location inside the workbook have no relationship.
            let target = match rid.and_then(|id| sheet_rels.get(&id)) {
                Some(t) => t,
                None => continue,
            };
            match parse_cell_areas(&reference) {
                Some(areas) => {
                    for area in areas {
                        links.insert(area, target);
                    }
                }
                None => {
                    warn!(
                        "read_hyperlinks: worksheet {:?}: cannot understand cell reference {:?}",
                        sheet_name, reference
                    );
                }
            }
        }
        debug!(
            "read_hyperlinks: worksheet {:?}: {} hyperlinks",
            sheet_name,
            links.len()
        );
        res.insert(sheet_name, links);
    }
    Ok(res)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &str,
) -> BLeaderboardResult<Option<String>> {
    let mut file = match archive.by_name(entry) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(Box::new(LeaderboardError::ReadingPackage {
                source,
                entry: entry.to_string(),
            }));
        }
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .context(ReadingPackageEntrySnafu { entry })?;
    Ok(Some(contents))
}

/// The attributes of all the elements with the given local name, keyed by local attribute name.
fn element_attributes(
    xml: &str,
    entry: &str,
    element: &[u8],
) -> LeaderboardResult<Vec<HashMap<String, String>>> {
    let mut reader = XmlReader::from_str(xml);
    let mut res: Vec<HashMap<String, String>> = Vec::new();
    loop {
        match reader.read_event().context(ParsingXmlSnafu { entry })? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element => {
                let mut attrs: HashMap<String, String> = HashMap::new();
                for attr_r in e.attributes() {
                    let attr = attr_r
                        .map_err(quick_xml::Error::from)
                        .context(ParsingXmlSnafu { entry })?;
                    let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                    let value = attr
                        .unescape_value()
                        .context(ParsingXmlSnafu { entry })?
                        .to_string();
                    attrs.insert(key, value);
                }
                res.push(attrs);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(res)
}

/// (worksheet name, relationship id), in workbook order.
fn parse_workbook_sheets(xml: &str, entry: &str) -> LeaderboardResult<Vec<(String, String)>> {
    let res = element_attributes(xml, entry, b"sheet")?
        .into_iter()
        .filter_map(|mut attrs| Some((attrs.remove("name")?, attrs.remove("id")?)))
        .collect();
    Ok(res)
}

/// Relationship id -> target.
fn parse_relationships(xml: &str, entry: &str) -> LeaderboardResult<HashMap<String, String>> {
    let res = element_attributes(xml, entry, b"Relationship")?
        .into_iter()
        .filter_map(|mut attrs| Some((attrs.remove("Id")?, attrs.remove("Target")?)))
        .collect();
    Ok(res)
}

/// (cell reference, relationship id if the link is external).
fn parse_sheet_hyperlinks(
    xml: &str,
    entry: &str,
) -> LeaderboardResult<Vec<(String, Option<String>)>> {
    let res = element_attributes(xml, entry, b"hyperlink")?
        .into_iter()
        .filter_map(|mut attrs| {
            let reference = attrs.remove("ref")?;
            Some((reference, attrs.remove("id")))
        })
        .collect();
    Ok(res)
}

/// The package path of a relationship target. Targets are relative to `base_dir`
/// unless they start with '/'.
fn resolve_target(base_dir: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{}/{}", base_dir, target),
    }
}

/// xl/worksheets/sheet1.xml -> xl/worksheets/_rels/sheet1.xml.rels
fn relationships_entry(entry: &str) -> String {
    match entry.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", entry),
    }
}
