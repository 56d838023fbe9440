use anyhow::{bail, Result};
use std::env;
use std::path::Path;

use articles_api::{
    count_articles, get_all_articles, insert_articles, load_articles_csv_file, open_database,
    Config,
};

const USAGE: &str = "Usage: articles-admin <command>

Commands:
  setup          Create the database schema
  import <csv>   Insert seed articles from a CSV file (title,content,style,author)
  list           Print stored articles";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env()?;

    match args.get(1).map(String::as_str) {
        Some("setup") => run_setup(&config),
        Some("import") => match args.get(2) {
            Some(csv_path) => run_import(&config, Path::new(csv_path)),
            None => bail!("import needs a CSV path\n\n{}", USAGE),
        },
        Some("list") => run_list(&config),
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn run_setup(config: &Config) -> Result<()> {
    let conn = open_database(config)?;
    println!("✓ Schema ready in {}", config.database_url);
    println!("✓ Database contains {} articles", count_articles(&conn)?);
    Ok(())
}

fn run_import(config: &Config, csv_path: &Path) -> Result<()> {
    println!("📂 Loading {}...", csv_path.display());
    let articles = load_articles_csv_file(csv_path)?;
    println!("✓ Loaded {} articles from CSV", articles.len());

    let conn = open_database(config)?;
    let inserted = insert_articles(&conn, &articles)?;
    println!("✓ Inserted: {} articles", inserted);
    println!("✓ Database contains {} articles", count_articles(&conn)?);

    Ok(())
}

fn run_list(config: &Config) -> Result<()> {
    let conn = open_database(config)?;
    let articles = get_all_articles(&conn)?;

    for article in &articles {
        let author = article
            .author
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<10}  {}  author={}  {}",
            article.id,
            article.style,
            article.date_published.to_rfc3339(),
            author,
            article.title
        );
    }
    println!("{} articles", articles.len());

    Ok(())
}
