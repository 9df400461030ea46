use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::Result;

pub const SHEET_NAME: &str = "Posts";
pub const HEADER: [&str; 5] = ["Post Number", "Date", "Caption", "Likes", "Image Filename"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub ordinal: usize,
    pub date: String,
    pub caption: String,
    pub likes: Option<u64>,
    pub filenames: Vec<String>,
}

impl OutputRow {
    pub fn joined_filenames(&self) -> String {
        self.filenames.join(", ")
    }
}

/// Rows collected during a run. Nothing touches the disk until [`OutputTable::save`].
#[derive(Debug, Default)]
pub struct OutputTable {
    rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: OutputRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes a single-sheet workbook to `path`, replacing whatever was there.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, title) in HEADER.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &bold)?;
        }

        for (i, row) in self.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_number(r, 0, row.ordinal as f64)?;
            sheet.write_string(r, 1, &row.date)?;
            sheet.write_string(r, 2, &row.caption)?;
            // Unknown like counts stay blank.
            if let Some(likes) = row.likes {
                sheet.write_number(r, 3, likes as f64)?;
            }
            sheet.write_string(r, 4, row.joined_filenames())?;
        }

        sheet.set_column_width(1, 20)?;
        sheet.set_column_width(2, 60)?;
        sheet.set_column_width(4, 40)?;

        workbook.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::read_workbook;

    fn row(ordinal: usize, filenames: &[&str]) -> OutputRow {
        OutputRow {
            ordinal,
            date: "2024-01-02".into(),
            caption: String::new(),
            likes: None,
            filenames: filenames.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn filenames_are_comma_joined() {
        assert_eq!(row(1, &[]).joined_filenames(), "");
        assert_eq!(row(1, &["a_1.jpg"]).joined_filenames(), "a_1.jpg");
        assert_eq!(
            row(1, &["a_1.jpg", "a_2.jpg", "a_3.jpg"]).joined_filenames(),
            "a_1.jpg, a_2.jpg, a_3.jpg"
        );
    }

    #[test]
    fn saved_workbook_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.xlsx");

        let mut table = OutputTable::new();
        table.push(row(1, &[]));
        table.push(OutputRow {
            likes: Some(12),
            caption: "hello".into(),
            ..row(2, &["b_1.jpg", "b_2.jpg"])
        });
        table.save(&path).unwrap();

        let (sheets, rows) = read_workbook(&path);
        assert_eq!(sheets, [SHEET_NAME]);
        assert_eq!(rows[0], HEADER);
        // Empty caption, blank likes, no filenames.
        assert_eq!(rows[1], ["1", "2024-01-02", "", "", ""]);
        assert_eq!(rows[2], ["2", "2024-01-02", "hello", "12", "b_1.jpg, b_2.jpg"]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.xlsx");
        std::fs::write(&path, b"stale contents that are not a workbook").unwrap();

        OutputTable::new().save(&path).unwrap();

        let (sheets, rows) = read_workbook(&path);
        assert_eq!(sheets, [SHEET_NAME]);
        assert_eq!(rows, [HEADER]);
    }
}
