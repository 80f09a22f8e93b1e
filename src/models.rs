//! Data models for the nine relations of the store
//!
//! One plain struct per relation. Each is deserialized from a CSV row by
//! header name (unknown columns are ignored, absent ones are `None`) and
//! binds itself to the relation's insert statement in schema column order.

use chrono::NaiveDateTime;
use rusqlite::{params, Statement};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::normalize::{bool_cell, int_cell, required_int_cell, sql_timestamp, timestamp_cell};
use crate::schema::Relation;

/// A row type that the generic import routine can load and insert.
pub trait Record: DeserializeOwned {
    /// Relation the record belongs to
    const RELATION: Relation;

    /// Execute the relation's insert statement for this record.
    ///
    /// Parameters are bound in the column order of
    /// [`TableSchema::insert_sql`](crate::schema::TableSchema::insert_sql).
    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

/// A GitHub user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// `User`, `Bot` or `Organization`
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    /// Site administrator flag
    #[serde(default, deserialize_with = "bool_cell")]
    pub site_admin: Option<bool>,
    /// Login name
    pub name: Option<String>,
}

impl Record for User {
    const RELATION: Relation = Relation::Users;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.id, self.user_type, self.site_admin, self.name])
    }
}

/// A repository and its owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// Short name
    pub name: Option<String>,
    /// `owner/name`
    pub full_name: Option<String>,
    /// Owning user
    #[serde(default, deserialize_with = "int_cell")]
    pub owner_userfk: Option<i64>,
    /// Repository description
    pub description: Option<String>,
    /// Size in kilobytes
    #[serde(default, deserialize_with = "int_cell")]
    pub size: Option<i64>,
    /// Creation time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Record for Repository {
    const RELATION: Relation = Relation::Repositories;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.name,
            self.full_name,
            self.owner_userfk,
            self.description,
            self.size,
            sql_timestamp(self.created_at),
            sql_timestamp(self.updated_at),
        ])
    }
}

/// An issue or pull request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// Issue number within the repository
    #[serde(default, deserialize_with = "int_cell")]
    pub number: Option<i64>,
    /// Author
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// Repository
    #[serde(default, deserialize_with = "int_cell")]
    pub repo_fk: Option<i64>,
    /// `open` or `closed`
    pub state: Option<String>,
    /// Conversation locked flag
    #[serde(default, deserialize_with = "bool_cell")]
    pub locked: Option<bool>,
    /// Creation time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub updated_at: Option<NaiveDateTime>,
    /// Author's relation to the repository
    pub author_association: Option<String>,
    /// Title
    pub title: Option<String>,
    /// Comment count
    #[serde(default, deserialize_with = "int_cell")]
    pub comments: Option<i64>,
    /// Markdown body
    pub body: Option<String>,
}

impl Record for Issue {
    const RELATION: Relation = Relation::Issues;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.number,
            self.user_fk,
            self.repo_fk,
            self.state,
            self.locked,
            sql_timestamp(self.created_at),
            sql_timestamp(self.updated_at),
            self.author_association,
            self.title,
            self.comments,
            self.body,
        ])
    }
}

/// An issue comment with its classifier labels
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// Author
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// Issue commented on
    #[serde(default, deserialize_with = "int_cell")]
    pub issue_fk: Option<i64>,
    /// Commit hash, for commit comments
    pub commit_id: Option<String>,
    /// Creation time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
    /// Author's relation to the repository
    pub author_association: Option<String>,
    /// Markdown body
    pub body: Option<String>,
    /// Sentiment label
    pub sentiment: Option<String>,
    /// Emotion label
    pub emotion: Option<String>,
}

impl Record for Comment {
    const RELATION: Relation = Relation::Comments;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.user_fk,
            self.issue_fk,
            self.commit_id,
            sql_timestamp(self.created_at),
            self.author_association,
            self.body,
            self.sentiment,
            self.emotion,
        ])
    }
}

/// A commit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    /// Commit hash
    pub id: String,
    /// Author
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// Repository
    #[serde(default, deserialize_with = "int_cell")]
    pub repo_fk: Option<i64>,
    /// Commit time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
}

impl Record for Commit {
    const RELATION: Relation = Relation::Commits;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.id, self.user_fk, self.repo_fk, sql_timestamp(self.created_at)])
    }
}

/// A timeline event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Event {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// Actor
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// Event kind, e.g. `closed`, `referenced`
    pub event_type: Option<String>,
    /// Referenced commit hash
    pub commit_fk: Option<String>,
    /// Event time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
    /// Issue the event belongs to
    #[serde(default, deserialize_with = "int_cell")]
    pub issue_fk: Option<i64>,
    /// Repository
    #[serde(default, deserialize_with = "int_cell")]
    pub repo_fk: Option<i64>,
    /// Aggregated count
    #[serde(default, deserialize_with = "int_cell")]
    pub total_count: Option<i64>,
}

impl Record for Event {
    const RELATION: Relation = Relation::Events;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.user_fk,
            self.event_type,
            self.commit_fk,
            sql_timestamp(self.created_at),
            self.issue_fk,
            self.repo_fk,
            self.total_count,
        ])
    }
}

/// The diff of one file within a commit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileCommit {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// Commit hash
    pub commit_fk: Option<String>,
    /// Author
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// File id
    pub file_fk: Option<String>,
    /// Raw unified diff
    pub raw: Option<String>,
    /// Following file commit in the chain
    #[serde(default, deserialize_with = "int_cell")]
    pub child_fk: Option<i64>,
}

impl Record for FileCommit {
    const RELATION: Relation = Relation::FileCommits;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.commit_fk,
            self.user_fk,
            self.file_fk,
            self.raw,
            self.child_fk,
        ])
    }
}

/// A file tracked in a repository
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct File {
    /// Primary key
    pub id: String,
    /// Path within the repository
    pub name: Option<String>,
    /// Repository
    #[serde(default, deserialize_with = "int_cell")]
    pub repo_fk: Option<i64>,
    /// Extension class, e.g. `go`, `md`
    pub extension_type: Option<String>,
}

impl Record for File {
    const RELATION: Relation = Relation::Files;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.id, self.name, self.repo_fk, self.extension_type])
    }
}

/// Reaction tallies on a comment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reaction {
    /// Primary key
    #[serde(deserialize_with = "required_int_cell")]
    pub id: i64,
    /// User who reacted
    #[serde(default, deserialize_with = "int_cell")]
    pub user_fk: Option<i64>,
    /// Issue
    #[serde(default, deserialize_with = "int_cell")]
    pub issue_fk: Option<i64>,
    /// Reaction time
    #[serde(default, deserialize_with = "timestamp_cell")]
    pub created_at: Option<NaiveDateTime>,
    /// Reacting user's relation to the repository
    pub author_association: Option<String>,
    /// Reaction content, e.g. `+1`, `heart`
    pub content: Option<String>,
    /// Comment reacted to
    #[serde(default, deserialize_with = "int_cell")]
    pub comment_id: Option<i64>,
    /// Sum over all reaction kinds
    #[serde(default, deserialize_with = "int_cell")]
    pub total_count: Option<i64>,
    /// `+1` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub plus_one: Option<i64>,
    /// `-1` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub minus_one: Option<i64>,
    /// `laugh` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub laugh: Option<i64>,
    /// `hooray` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub hooray: Option<i64>,
    /// `confused` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub confused: Option<i64>,
    /// `heart` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub heart: Option<i64>,
    /// `rocket` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub rocket: Option<i64>,
    /// `eyes` reactions
    #[serde(default, deserialize_with = "int_cell")]
    pub eyes: Option<i64>,
}

impl Record for Reaction {
    const RELATION: Relation = Relation::Reactions;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.id,
            self.user_fk,
            self.issue_fk,
            sql_timestamp(self.created_at),
            self.author_association,
            self.content,
            self.comment_id,
            self.total_count,
            self.plus_one,
            self.minus_one,
            self.laugh,
            self.hooray,
            self.confused,
            self.heart,
            self.rocket,
            self.eyes,
        ])
    }
}

/// Id and name of a repository, as listed by the repository selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    /// Repository id
    pub id: i64,
    /// Short name
    pub name: Option<String>,
}

/// A row reported by `PRAGMA foreign_key_check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    /// Referencing table
    pub table: String,
    /// Rowid of the offending row
    pub rowid: Option<i64>,
    /// Referenced table
    pub parent: String,
}
