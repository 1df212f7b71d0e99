use std::fmt;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::domain::{CubeDimensions, DatasetRecord, MemberUid, ProjectCode};
use crate::error::MirrorError;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[id*="dataset_"]"#).unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static HEADER_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

// Cell distances from the dataset anchor's own cell, counted in cells
// in document order. Used only when the table carries no header row we
// can resolve columns from.
const TARGET_NAME_OFFSET: usize = 7;
const CUBE_DIMENSIONS_OFFSET: usize = 8;
const MEMBER_UID_OFFSET: usize = 15;

/// The authoritative results table for one project page.
///
/// The portal page can carry more than one table, so selection goes by
/// structural signature rather than blind document order: prefer a
/// table that actually contains a dataset anchor, then one whose header
/// row names the expected columns, and only then the first table.
pub struct ProjectTable {
    doc: Html,
}

impl fmt::Debug for ProjectTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectTable").finish_non_exhaustive()
    }
}

impl ProjectTable {
    pub fn from_page(page: &str, project: &ProjectCode) -> Result<Self, MirrorError> {
        let doc = Html::parse_document(page);
        let tables: Vec<ElementRef> = doc.select(&TABLE_SEL).collect();
        if tables.is_empty() {
            return Err(MirrorError::MissingTable(project.to_string()));
        }

        let chosen = tables
            .iter()
            .copied()
            .find(|table| table.select(&ANCHOR_SEL).next().is_some())
            .or_else(|| {
                tables
                    .iter()
                    .copied()
                    .find(|table| header_columns(*table).is_some())
            })
            .unwrap_or(tables[0]);

        Ok(Self {
            doc: Html::parse_fragment(&chosen.html()),
        })
    }

    /// All dataset records, in table row order. A table with no
    /// dataset anchors is a project with nothing published, not an
    /// error.
    pub fn records(&self) -> Vec<DatasetRecord> {
        let columns = self
            .doc
            .select(&TABLE_SEL)
            .next()
            .and_then(header_columns);
        let cells: Vec<ElementRef> = self.doc.select(&CELL_SEL).collect();

        let mut records = Vec::new();
        for anchor in self.doc.select(&ANCHOR_SEL) {
            let Some(id) = anchor.value().attr("id") else {
                continue;
            };
            let fields = columns
                .as_ref()
                .and_then(|cols| resolve_by_header(anchor, cols))
                .or_else(|| resolve_by_offset(anchor, &cells));
            let Some(fields) = fields else {
                tracing::warn!(dataset = id, "row is missing expected cells, skipping");
                continue;
            };
            records.push(DatasetRecord {
                dataset_id: id.to_string(),
                source_name: cell_text(anchor),
                target_name: fields.target_name,
                cube_dimensions: CubeDimensions::new(&fields.cube_dimensions),
                member_uid: MemberUid::new(&fields.member_uid),
            });
        }
        records
    }
}

pub fn source_names(records: &[DatasetRecord]) -> Vec<&str> {
    records.iter().map(|r| r.source_name.as_str()).collect()
}

pub fn target_names(records: &[DatasetRecord]) -> Vec<&str> {
    records.iter().map(|r| r.target_name.as_str()).collect()
}

pub fn cube_dimensions(records: &[DatasetRecord]) -> Vec<&CubeDimensions> {
    records.iter().map(|r| &r.cube_dimensions).collect()
}

pub fn member_uids(records: &[DatasetRecord]) -> Vec<&MemberUid> {
    records.iter().map(|r| &r.member_uid).collect()
}

struct HeaderColumns {
    target_name: usize,
    cube_dimensions: usize,
    member_uid: usize,
}

struct RowFields {
    target_name: String,
    cube_dimensions: String,
    member_uid: String,
}

fn header_columns(table: ElementRef) -> Option<HeaderColumns> {
    let header_row = table
        .select(&ROW_SEL)
        .find(|row| row.select(&HEADER_CELL_SEL).next().is_some())?;
    let labels: Vec<String> = header_row
        .select(&HEADER_CELL_SEL)
        .map(|th| cell_text(th).to_lowercase())
        .collect();
    let position = |needle: &str| labels.iter().position(|label| label.contains(needle));
    Some(HeaderColumns {
        target_name: position("target")?,
        cube_dimensions: position("cube")?,
        member_uid: position("member").or_else(|| position("uid"))?,
    })
}

fn resolve_by_header(anchor: ElementRef, columns: &HeaderColumns) -> Option<RowFields> {
    let row = ancestor_named(anchor, "tr")?;
    let cells: Vec<ElementRef> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect();
    let text_at = |index: usize| cells.get(index).map(|cell| cell_text(*cell));
    Some(RowFields {
        target_name: text_at(columns.target_name)?,
        cube_dimensions: text_at(columns.cube_dimensions)?,
        member_uid: text_at(columns.member_uid)?,
    })
}

fn resolve_by_offset(anchor: ElementRef, cells: &[ElementRef]) -> Option<RowFields> {
    let anchor_cell = ancestor_named(anchor, "td")?;
    let base = cells.iter().position(|cell| cell.id() == anchor_cell.id())?;
    let text_at = |offset: usize| cells.get(base + offset).map(|cell| cell_text(*cell));
    Some(RowFields {
        target_name: text_at(TARGET_NAME_OFFSET)?,
        cube_dimensions: text_at(CUBE_DIMENSIONS_OFFSET)?,
        member_uid: text_at(MEMBER_UID_OFFSET)?,
    })
}

fn ancestor_named<'a>(el: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == name)
}

fn cell_text(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
