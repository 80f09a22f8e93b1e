//! Database schema definitions
//!
//! The nine relations of the store, declared as static data: column names
//! and SQL types, the primary key, and the foreign keys each table carries.
//! The same declarations drive `CREATE TABLE`, the generic insert statement
//! and the CSV normalizer's primary-key handling.

use std::fmt;

use serde::{Serialize, Serializer};

/// SQL type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// 64-bit integer
    Integer,
    /// Short string
    Varchar,
    /// Long text
    Text,
    /// Stored as 0/1
    Boolean,
    /// Stored as `YYYY-MM-DD HH:MM:SS` text
    Timestamp,
}

impl SqlType {
    /// Type name used in `CREATE TABLE`
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

/// A single column declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name, identical to the CSV header
    pub name: &'static str,
    /// Storage type
    pub sql_type: SqlType,
}

/// A `column → relation.id` reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column
    pub column: &'static str,
    /// Referenced relation; always its primary key
    pub references: Relation,
}

/// Structural declaration of one relation
#[derive(Debug)]
pub struct TableSchema {
    /// Table name
    pub table: &'static str,
    /// Record type name
    pub record: &'static str,
    /// Source CSV file name
    pub file_name: &'static str,
    /// Primary key column; always the first column
    pub primary_key: &'static str,
    /// Columns in insert order
    pub columns: &'static [Column],
    /// Declared foreign keys
    pub foreign_keys: &'static [ForeignKey],
}

const fn col(name: &'static str, sql_type: SqlType) -> Column {
    Column { name, sql_type }
}

const fn fk(column: &'static str, references: Relation) -> ForeignKey {
    ForeignKey { column, references }
}

use SqlType::{Boolean, Integer, Text, Timestamp, Varchar};

static USERS: TableSchema = TableSchema {
    table: "users",
    record: "User",
    file_name: "users.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("type", Varchar),
        col("site_admin", Boolean),
        col("name", Varchar),
    ],
    foreign_keys: &[],
};

static REPOSITORIES: TableSchema = TableSchema {
    table: "repositories",
    record: "Repository",
    file_name: "repositories.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("name", Varchar),
        col("full_name", Varchar),
        col("owner_userfk", Integer),
        col("description", Varchar),
        col("size", Integer),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
    foreign_keys: &[fk("owner_userfk", Relation::Users)],
};

static ISSUES: TableSchema = TableSchema {
    table: "issues",
    record: "Issue",
    file_name: "issues.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("number", Integer),
        col("user_fk", Integer),
        col("repo_fk", Integer),
        col("state", Varchar),
        col("locked", Boolean),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
        col("author_association", Varchar),
        col("title", Varchar),
        col("comments", Integer),
        col("body", Text),
    ],
    foreign_keys: &[
        fk("user_fk", Relation::Users),
        fk("repo_fk", Relation::Repositories),
    ],
};

static COMMENTS: TableSchema = TableSchema {
    table: "comments",
    record: "Comment",
    file_name: "comments_with_sent_emo.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("user_fk", Integer),
        col("issue_fk", Integer),
        col("commit_id", Varchar),
        col("created_at", Timestamp),
        col("author_association", Varchar),
        col("body", Text),
        col("sentiment", Varchar),
        col("emotion", Varchar),
    ],
    foreign_keys: &[
        fk("user_fk", Relation::Users),
        fk("issue_fk", Relation::Issues),
        fk("commit_id", Relation::Commits),
    ],
};

static COMMITS: TableSchema = TableSchema {
    table: "commits",
    record: "Commit",
    file_name: "commits.csv",
    primary_key: "id",
    columns: &[
        col("id", Varchar),
        col("user_fk", Integer),
        col("repo_fk", Integer),
        col("created_at", Timestamp),
    ],
    foreign_keys: &[
        fk("user_fk", Relation::Users),
        fk("repo_fk", Relation::Repositories),
    ],
};

static EVENTS: TableSchema = TableSchema {
    table: "events",
    record: "Event",
    file_name: "events.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("user_fk", Integer),
        col("event_type", Varchar),
        col("commit_fk", Text),
        col("created_at", Timestamp),
        col("issue_fk", Integer),
        col("repo_fk", Integer),
        col("total_count", Integer),
    ],
    foreign_keys: &[
        fk("user_fk", Relation::Users),
        fk("commit_fk", Relation::Commits),
        fk("issue_fk", Relation::Issues),
        fk("repo_fk", Relation::Repositories),
    ],
};

static FILE_COMMITS: TableSchema = TableSchema {
    table: "file_commits",
    record: "FileCommit",
    file_name: "file_commits.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("commit_fk", Varchar),
        col("user_fk", Integer),
        col("file_fk", Varchar),
        col("raw", Text),
        col("child_fk", Integer),
    ],
    foreign_keys: &[
        fk("commit_fk", Relation::Commits),
        fk("user_fk", Relation::Users),
        fk("file_fk", Relation::Files),
    ],
};

static FILES: TableSchema = TableSchema {
    table: "files",
    record: "File",
    file_name: "files.csv",
    primary_key: "id",
    columns: &[
        col("id", Varchar),
        col("name", Varchar),
        col("repo_fk", Integer),
        col("extension_type", Varchar),
    ],
    foreign_keys: &[fk("repo_fk", Relation::Repositories)],
};

static REACTIONS: TableSchema = TableSchema {
    table: "reactions",
    record: "Reaction",
    file_name: "reactions.csv",
    primary_key: "id",
    columns: &[
        col("id", Integer),
        col("user_fk", Integer),
        col("issue_fk", Integer),
        col("created_at", Timestamp),
        col("author_association", Varchar),
        col("content", Varchar),
        col("comment_id", Integer),
        col("total_count", Integer),
        col("plus_one", Integer),
        col("minus_one", Integer),
        col("laugh", Integer),
        col("hooray", Integer),
        col("confused", Integer),
        col("heart", Integer),
        col("rocket", Integer),
        col("eyes", Integer),
    ],
    foreign_keys: &[
        fk("user_fk", Relation::Users),
        fk("issue_fk", Relation::Issues),
        fk("comment_id", Relation::Comments),
    ],
};

/// One relation of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// GitHub users
    Users,
    /// Repositories, owned by a user
    Repositories,
    /// Issues and pull requests
    Issues,
    /// Issue comments with sentiment/emotion labels
    Comments,
    /// Commits, keyed by hash
    Commits,
    /// Timeline events
    Events,
    /// Per-file diffs of a commit
    FileCommits,
    /// Files, keyed by path hash
    Files,
    /// Reaction tallies on comments
    Reactions,
}

impl Relation {
    /// Order in which relations are created and imported.
    ///
    /// Later relations reference earlier ones; the store is always filled in
    /// exactly this order.
    pub const IMPORT_ORDER: [Self; 9] = [
        Self::Users,
        Self::Repositories,
        Self::Issues,
        Self::Comments,
        Self::Commits,
        Self::Events,
        Self::FileCommits,
        Self::Files,
        Self::Reactions,
    ];

    /// Structural declaration for this relation
    #[must_use]
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::Users => &USERS,
            Self::Repositories => &REPOSITORIES,
            Self::Issues => &ISSUES,
            Self::Comments => &COMMENTS,
            Self::Commits => &COMMITS,
            Self::Events => &EVENTS,
            Self::FileCommits => &FILE_COMMITS,
            Self::Files => &FILES,
            Self::Reactions => &REACTIONS,
        }
    }

    /// Table name
    #[must_use]
    pub fn table(self) -> &'static str {
        self.schema().table
    }

    /// Source CSV file name
    #[must_use]
    pub fn file_name(self) -> &'static str {
        self.schema().file_name
    }

    /// Look up a relation by table name (`file_commits`) or record name
    /// (`FileCommit`), ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::IMPORT_ORDER.into_iter().find(|relation| {
            let schema = relation.schema();
            schema.table.eq_ignore_ascii_case(name) || schema.record.eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl Serialize for Relation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.table())
    }
}

impl TableSchema {
    /// Column declaration by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Type of the primary key column
    #[must_use]
    pub fn primary_key_type(&self) -> SqlType {
        self.column(self.primary_key).map_or(SqlType::Integer, |c| c.sql_type)
    }

    /// Column names in insert order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Relation referenced by `column`, if it is a foreign key
    #[must_use]
    pub fn references(&self, column: &str) -> Option<Relation> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.column == column)
            .map(|fk| fk.references)
    }

    /// `CREATE TABLE` statement with primary and foreign keys
    #[must_use]
    pub fn create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.name == self.primary_key {
                    format!("{} {} NOT NULL", c.name, c.sql_type.as_sql())
                } else {
                    format!("{} {}", c.name, c.sql_type.as_sql())
                }
            })
            .collect();
        lines.push(format!("PRIMARY KEY ({})", self.primary_key));
        for fk in self.foreign_keys {
            let target = fk.references.schema();
            lines.push(format!(
                "FOREIGN KEY({}) REFERENCES {} ({})",
                fk.column, target.table, target.primary_key
            ));
        }

        format!("CREATE TABLE {} (\n\t{}\n)", self.table, lines.join(",\n\t"))
    }

    /// Parameterized `INSERT` covering every column in order
    #[must_use]
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.column_names().collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders.join(", ")
        )
    }
}
