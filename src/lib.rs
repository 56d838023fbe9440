// Articles API - Core Library
// Exposes all modules for use in the server, the admin CLI, and tests

pub mod app;
pub mod articles;
pub mod config;
pub mod db;
pub mod error;
pub mod sanitize;

// Re-export commonly used types
pub use app::{build_app, open_database, AppState};
pub use articles::{ArticleById, CreateArticleRequest, JsonBody, UpdateArticleRequest};
pub use config::Config;
pub use db::{
    Article, ArticleUpdate, Author, NewArticle, NewAuthor,
    setup_database, get_all_articles, get_article_by_id, insert_article, insert_articles,
    delete_article_by_id, update_article_by_id, insert_author, count_articles,
    load_articles_csv, load_articles_csv_file,
};
pub use error::{ApiError, ErrorBody};
pub use sanitize::{filter_xss, sanitize_article};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
