use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::schema::Relation;

/// What a rebuild would find for one relation's CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputReport {
    /// Relation the file feeds
    pub relation: Relation,
    /// Expected location
    pub path: PathBuf,
    /// File is present
    pub exists: bool,
    /// Header could not be read; set when `exists` but unreadable
    pub header_error: Option<String>,
    /// Header contains the primary-key column
    pub has_primary_key: bool,
    /// Schema columns absent from the header; stored as null
    pub missing_columns: Vec<String>,
    /// Header columns outside the schema; ignored
    pub extra_columns: Vec<String>,
}

impl InputReport {
    /// Whether a rebuild can load this file
    #[must_use]
    pub fn is_loadable(&self) -> bool {
        self.exists && self.header_error.is_none() && self.has_primary_key
    }
}

/// Read-only inspection of the CSV input directory
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Inspect every expected file in import order.
    ///
    /// Only headers are read; row contents are checked by the rebuild itself.
    #[must_use]
    pub fn inspect(data_dir: &Path) -> Vec<InputReport> {
        Relation::IMPORT_ORDER
            .into_iter()
            .map(|relation| Self::inspect_file(relation, data_dir))
            .collect()
    }

    fn inspect_file(relation: Relation, data_dir: &Path) -> InputReport {
        let schema = relation.schema();
        let path = data_dir.join(schema.file_name);
        let mut report = InputReport {
            relation,
            path,
            exists: false,
            header_error: None,
            has_primary_key: false,
            missing_columns: Vec::new(),
            extra_columns: Vec::new(),
        };

        if !report.path.is_file() {
            return report;
        }
        report.exists = true;

        let headers = match csv::Reader::from_path(&report.path).and_then(|mut reader| {
            let headers = reader.headers()?.clone();
            Ok(headers)
        }) {
            Ok(headers) => headers,
            Err(e) => {
                report.header_error = Some(e.to_string());
                return report;
            }
        };

        report.has_primary_key = headers.iter().any(|h| h == schema.primary_key);
        report.missing_columns = schema
            .column_names()
            .filter(|name| !headers.iter().any(|h| h == *name))
            .map(str::to_string)
            .collect();
        report.extra_columns = headers
            .iter()
            .filter(|h| schema.column(h).is_none())
            .map(str::to_string)
            .collect();
        report
    }
}
