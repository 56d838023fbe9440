// 🗄️ Articles Store - SQLite data access
// Every operation round-trips to the database; nothing is cached here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

// ============================================================================
// ENTITIES
// ============================================================================

/// A stored article
///
/// `id` and `date_published` are assigned by the database on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub style: String,
    pub date_published: DateTime<Utc>,
    pub author: Option<i64>,
}

/// Fields a client may supply when creating an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub style: String,
    #[serde(default)]
    pub author: Option<i64>,
}

/// Partial update: only the `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub style: Option<String>,
}

impl ArticleUpdate {
    /// Number of columns this update touches
    pub fn field_count(&self) -> usize {
        [&self.title, &self.content, &self.style]
            .iter()
            .filter(|field| field.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

/// Article author, referenced by `Article::author`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub full_name: String,
    pub user_name: String,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub full_name: String,
    pub user_name: String,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases stay in "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            user_name TEXT NOT NULL UNIQUE,
            date_created TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            style TEXT NOT NULL,
            date_published TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            author INTEGER REFERENCES authors(id) ON DELETE SET NULL
        )",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        style: row.get(3)?,
        date_published: parse_timestamp(row, 4)?,
        author: row.get(5)?,
    })
}

const ARTICLE_COLUMNS: &str = "id, title, content, style, date_published, author";

// ============================================================================
// ARTICLES
// ============================================================================

pub fn get_all_articles(conn: &Connection) -> Result<Vec<Article>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY id"
    ))?;

    let articles = stmt
        .query_map([], article_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(articles)
}

pub fn get_article_by_id(conn: &Connection, id: i64) -> Result<Option<Article>> {
    let article = conn
        .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
            [id],
            article_from_row,
        )
        .optional()?;

    Ok(article)
}

/// Insert an article and return it as stored (with `id` and `date_published`)
pub fn insert_article(conn: &Connection, article: &NewArticle) -> Result<Article> {
    let stored = conn.query_row(
        &format!(
            "INSERT INTO articles (title, content, style, author)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {ARTICLE_COLUMNS}"
        ),
        params![article.title, article.content, article.style, article.author],
        article_from_row,
    )?;

    Ok(stored)
}

pub fn insert_articles(conn: &Connection, articles: &[NewArticle]) -> Result<usize> {
    let mut inserted = 0;
    for article in articles {
        insert_article(conn, article)
            .with_context(|| format!("Failed to insert article '{}'", article.title))?;
        inserted += 1;
    }
    Ok(inserted)
}

pub fn delete_article_by_id(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM articles WHERE id = ?1", [id])?;
    Ok(())
}

/// Write only the supplied columns; an empty update touches nothing
pub fn update_article_by_id(conn: &Connection, id: i64, update: &ArticleUpdate) -> Result<()> {
    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(title) = &update.title {
        assignments.push("title = ?");
        values.push(title);
    }
    if let Some(content) = &update.content {
        assignments.push("content = ?");
        values.push(content);
    }
    if let Some(style) = &update.style {
        assignments.push("style = ?");
        values.push(style);
    }

    if assignments.is_empty() {
        return Ok(());
    }

    values.push(&id);
    let sql = format!(
        "UPDATE articles SET {} WHERE id = ?",
        assignments.join(", ")
    );
    conn.execute(&sql, values.as_slice())?;

    Ok(())
}

pub fn count_articles(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// AUTHORS
// ============================================================================

pub fn insert_author(conn: &Connection, author: &NewAuthor) -> Result<Author> {
    let stored = conn.query_row(
        "INSERT INTO authors (full_name, user_name)
         VALUES (?1, ?2)
         RETURNING id, full_name, user_name, date_created",
        params![author.full_name, author.user_name],
        |row| {
            Ok(Author {
                id: row.get(0)?,
                full_name: row.get(1)?,
                user_name: row.get(2)?,
                date_created: parse_timestamp(row, 3)?,
            })
        },
    )?;

    Ok(stored)
}

// ============================================================================
// SEED IMPORT
// ============================================================================

/// Read seed articles from CSV with a `title,content,style,author` header
pub fn load_articles_csv<R: Read>(reader: R) -> Result<Vec<NewArticle>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let mut articles = Vec::new();
    for result in rdr.deserialize() {
        let article: NewArticle = result.context("Failed to deserialize article")?;
        articles.push(article);
    }

    Ok(articles)
}

pub fn load_articles_csv_file(csv_path: &Path) -> Result<Vec<NewArticle>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    load_articles_csv(file)
}
