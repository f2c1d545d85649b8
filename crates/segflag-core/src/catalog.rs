use serde::{Deserialize, Serialize};

use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};
use segflag_types::item_id::ItemId;
use segflag_types::user::User;

use crate::flags::aggregate::AggregatedFlags;

/// Columns the core consumes; every other column is descriptive metadata
/// passed through untouched.
pub const ITEM_COLUMN: &str = "imgName";
pub const IMAGE_COLUMN: &str = "normalizedPath";
pub const MASK_COLUMN: &str = "maskPath";
pub const PRIOR_MASK_COLUMN: &str = "maskPath_old";

const FLAGGED_BY_COLUMN: &str = "flagged_by";

/// Download filenames offered for the two export options.
pub const EXPORT_FLAGGED_NAME: &str = "master_with_flagged.csv";
pub const EXPORT_UNFLAGGED_NAME: &str = "master_unflagged.csv";

/// Which slice of the catalog a reviewer is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    All,
    Flagged,
    FlaggedBy(Vec<User>),
}

/// One catalog row: the normalized item identifier, its three image keys,
/// and all raw column values untouched.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub item: ItemId,
    pub image_key: String,
    pub mask_key: String,
    pub prior_mask_key: String,
    fields: Vec<String>,
}

/// The master record table, parsed from the CSV blob in the object store.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    headers: Vec<String>,
    records: Vec<CatalogRecord>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch and parse the master CSV. A missing blob reads as an empty
    /// catalog, not an error.
    pub fn load(storage: &dyn StorageBackend, key: &str) -> Result<Self> {
        match storage.get(key)? {
            Some(bytes) => Self::parse(&bytes),
            None => Ok(Self::empty()),
        }
    }

    /// Parse CSV bytes. The header row must name the item and image-path
    /// columns; rows with the wrong field count are rejected with their line
    /// number.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SegflagError::MalformedCatalog(format!("not utf-8: {e}")))?;
        let mut rows = parse_csv(text)?;
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let headers = rows.remove(0);
        let col = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SegflagError::MalformedCatalog(format!("missing column '{name}'")))
        };
        let item_col = col(ITEM_COLUMN)?;
        let image_col = col(IMAGE_COLUMN)?;
        let mask_col = col(MASK_COLUMN)?;
        let prior_col = col(PRIOR_MASK_COLUMN)?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(SegflagError::MalformedCatalog(format!(
                    "row {} has {} fields, expected {}",
                    i + 2,
                    row.len(),
                    headers.len()
                )));
            }
            records.push(CatalogRecord {
                item: ItemId::normalize(&row[item_col]),
                image_key: row[image_col].clone(),
                mask_key: row[mask_col].clone(),
                prior_mask_key: row[prior_col].clone(),
                fields: row,
            });
        }

        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of an arbitrary column for a record, by header name.
    pub fn field<'a>(&self, record: &'a CatalogRecord, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        record.fields.get(idx).map(String::as_str)
    }

    /// Records visible under a view mode, given the current aggregated map.
    pub fn filtered<'a>(
        &'a self,
        view: &ViewMode,
        aggregate: &AggregatedFlags,
    ) -> Vec<&'a CatalogRecord> {
        self.records
            .iter()
            .filter(|r| match view {
                ViewMode::All => true,
                ViewMode::Flagged => aggregate.contains_key(&r.item),
                ViewMode::FlaggedBy(users) => aggregate
                    .get(&r.item)
                    .is_some_and(|flaggers| users.iter().any(|u| flaggers.contains(u))),
            })
            .collect()
    }

    /// Full table with a `flagged_by` column appended: comma-joined sorted
    /// usernames, built purely from the aggregated map.
    pub fn export_with_flagged(&self, aggregate: &AggregatedFlags) -> Vec<u8> {
        let mut out = String::new();
        write_csv_row(
            &mut out,
            self.headers
                .iter()
                .map(String::as_str)
                .chain([FLAGGED_BY_COLUMN]),
        );
        for record in &self.records {
            let flagged_by = aggregate
                .get(&record.item)
                .map(|users| {
                    users
                        .iter()
                        .map(User::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            write_csv_row(
                &mut out,
                record
                    .fields
                    .iter()
                    .map(String::as_str)
                    .chain([flagged_by.as_str()]),
            );
        }
        out.into_bytes()
    }

    /// Table restricted to records no user has flagged, original columns
    /// only.
    pub fn export_unflagged(&self, aggregate: &AggregatedFlags) -> Vec<u8> {
        let mut out = String::new();
        write_csv_row(&mut out, self.headers.iter().map(String::as_str));
        for record in &self.records {
            if aggregate.contains_key(&record.item) {
                continue;
            }
            write_csv_row(&mut out, record.fields.iter().map(String::as_str));
        }
        out.into_bytes()
    }
}

/// Minimal RFC 4180 reader: quoted fields, doubled-quote escapes, CRLF or LF
/// row endings. The master files are machine-written, so anything outside
/// that grammar is malformed.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' if field.is_empty() => in_quotes = true,
            '"' => {
                return Err(SegflagError::MalformedCatalog(format!(
                    "stray quote in row {}",
                    rows.len() + 1
                )))
            }
            ',' => {
                row.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(ch),
        }
    }
    if in_quotes {
        return Err(SegflagError::MalformedCatalog(
            "unterminated quoted field".to_string(),
        ));
    }
    // Final row without trailing newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

fn write_csv_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
