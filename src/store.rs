use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ImportError, Result};
use crate::logging::OperationTimer;
use crate::metrics;
use crate::models::{
    Comment, Commit, Event, File, FileCommit, ForeignKeyViolation, Issue, Reaction, Record,
    Repository, RepositorySummary, User,
};
use crate::normalize::read_records;
use crate::schema::Relation;

/// Files SQLite may leave next to the database
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Progress of a single rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    /// Nothing touched yet
    NotStarted,
    /// Old store removed, all tables created
    SchemaCreated,
    /// Loading the given relation
    Importing(Relation),
    /// Checking foreign keys across the imported relations
    VerifyingReferences,
    /// Every file committed
    Done,
}

/// Outcome of importing one CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Relation filled
    pub relation: Relation,
    /// Data rows read, duplicates included
    pub rows_read: usize,
    /// Rows committed
    pub rows_inserted: usize,
    /// Rows discarded as duplicate keys
    pub duplicates_dropped: usize,
    /// Wall time spent on the file
    pub duration_ms: u128,
}

/// Outcome of a full rebuild, one entry per file in import order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Per-file results
    pub files: Vec<FileReport>,
}

impl RebuildReport {
    /// Rows committed across all relations
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows_inserted).sum()
    }
}

/// Handle on the SQLite store file.
///
/// Owns nothing but the location; every operation opens its own connection
/// and closes it before returning.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    enforce_foreign_keys: bool,
}

impl Store {
    /// Create a handle for the store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enforce_foreign_keys: false,
        }
    }

    /// Fail the rebuild if any foreign key dangles once every file is in.
    ///
    /// Import connections never enforce foreign keys: the import order loads
    /// comments before commits and file commits before files.
    #[must_use]
    pub fn with_foreign_keys(mut self, enforce: bool) -> Self {
        self.enforce_foreign_keys = enforce;
        self
    }

    /// Location of the store file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a store file is present
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        // The bundled SQLite is built with foreign keys on.
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(conn)
    }

    /// Delete the store and rebuild it from the CSV files in `data_dir`.
    ///
    /// Files are imported in [`Relation::IMPORT_ORDER`], each in its own
    /// transaction. A failure aborts the rebuild; files committed before it
    /// stay in the store.
    pub fn rebuild(&self, data_dir: &Path) -> Result<RebuildReport> {
        let timer = OperationTimer::new("rebuild");
        let mut state = RebuildState::NotStarted;
        info!(
            store = %self.path.display(),
            data_dir = %data_dir.display(),
            "Rebuilding store"
        );

        let result = self.run_rebuild(data_dir, &mut state);
        match &result {
            Ok(report) => {
                info!(rows = report.total_rows(), "Store rebuilt");
                timer.finish();
            }
            Err(e) => error!(state = ?state, error = %e, "Rebuild failed"),
        }
        result
    }

    fn run_rebuild(&self, data_dir: &Path, state: &mut RebuildState) -> Result<RebuildReport> {
        self.remove_existing()?;
        self.create_schema()?;
        *state = RebuildState::SchemaCreated;
        debug!(state = ?state, "Schema created");

        let mut report = RebuildReport::default();
        for relation in Relation::IMPORT_ORDER {
            *state = RebuildState::Importing(relation);
            let file_report = self.import_relation(relation, data_dir).inspect_err(|e| {
                metrics::record_failure(relation, e);
            })?;
            report.files.push(file_report);
        }

        if self.enforce_foreign_keys {
            *state = RebuildState::VerifyingReferences;
            self.verify_references()?;
        }

        *state = RebuildState::Done;
        Ok(report)
    }

    fn verify_references(&self) -> Result<()> {
        let violations = self.foreign_key_violations()?;
        let Some(first) = violations.first() else {
            debug!("All foreign keys resolve");
            return Ok(());
        };
        let err = ImportError::DanglingReferences {
            count: violations.len(),
            table: first.table.clone(),
            parent: first.parent.clone(),
        };
        if let Some(relation) = Relation::from_name(&first.table) {
            metrics::record_failure(relation, &err);
        }
        Err(err)
    }

    /// Rebuild only if no store file exists yet.
    ///
    /// Returns `None` when an existing store was left untouched.
    pub fn ensure(&self, data_dir: &Path) -> Result<Option<RebuildReport>> {
        if self.exists() {
            info!(store = %self.path.display(), "Store present, skipping import");
            return Ok(None);
        }
        self.rebuild(data_dir).map(Some)
    }

    fn remove_existing(&self) -> Result<()> {
        if self.path.exists() {
            warn!(store = %self.path.display(), "Removing existing store");
            fs::remove_file(&self.path)?;
        }
        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = self.path.clone().into_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            if sidecar.exists() {
                fs::remove_file(&sidecar)?;
            }
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for relation in Relation::IMPORT_ORDER {
            tx.execute(&relation.schema().create_sql(), [])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn import_relation(&self, relation: Relation, data_dir: &Path) -> Result<FileReport> {
        match relation {
            Relation::Users => self.import_file::<User>(data_dir),
            Relation::Repositories => self.import_file::<Repository>(data_dir),
            Relation::Issues => self.import_file::<Issue>(data_dir),
            Relation::Comments => self.import_file::<Comment>(data_dir),
            Relation::Commits => self.import_file::<Commit>(data_dir),
            Relation::Events => self.import_file::<Event>(data_dir),
            Relation::FileCommits => self.import_file::<FileCommit>(data_dir),
            Relation::Files => self.import_file::<File>(data_dir),
            Relation::Reactions => self.import_file::<Reaction>(data_dir),
        }
    }

    /// Normalize one CSV file and insert it in a single transaction
    fn import_file<R: Record>(&self, data_dir: &Path) -> Result<FileReport> {
        let relation = R::RELATION;
        let schema = relation.schema();
        info!(file = schema.file_name, "Importing");
        let timer = OperationTimer::new(schema.file_name);

        let normalized = read_records::<R>(&data_dir.join(schema.file_name))?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema.insert_sql())?;
            for record in &normalized.records {
                record.insert(&mut stmt)?;
            }
        }
        tx.commit()?;

        let report = FileReport {
            relation,
            rows_read: normalized.rows_read,
            rows_inserted: normalized.records.len(),
            duplicates_dropped: normalized.duplicates_dropped,
            duration_ms: timer.finish(),
        };
        metrics::record_file_import(&report);
        info!(
            table = schema.table,
            rows = report.rows_inserted,
            duplicates = report.duplicates_dropped,
            "Imported"
        );
        Ok(report)
    }

    /// Row count of every relation, in import order
    pub fn row_counts(&self) -> Result<Vec<(Relation, i64)>> {
        let conn = self.open_existing()?;
        Relation::IMPORT_ORDER
            .into_iter()
            .map(|relation| -> Result<(Relation, i64)> {
                let count: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", relation.table()),
                    [],
                    |row| row.get(0),
                )?;
                Ok((relation, count))
            })
            .collect()
    }

    /// Repositories ordered by name
    pub fn repositories(&self) -> Result<Vec<RepositorySummary>> {
        let conn = self.open_existing()?;
        let mut stmt = conn.prepare("SELECT id, name FROM repositories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(RepositorySummary {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Rows whose foreign keys reference a missing parent row
    pub fn foreign_key_violations(&self) -> Result<Vec<ForeignKeyViolation>> {
        let conn = self.open_existing()?;
        let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
        let rows = stmt.query_map([], |row| {
            Ok(ForeignKeyViolation {
                table: row.get(0)?,
                rowid: row.get(1)?,
                parent: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn open_existing(&self) -> Result<Connection> {
        if !self.exists() {
            return Err(ImportError::MissingFile(self.path.clone()));
        }
        self.connect()
    }
}
