// 📰 Articles Resource - /articles handlers
//
// Validates request bodies, delegates to the store in `db`, sanitizes what
// goes back out, and maps outcomes to status codes.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, OriginalUri, Path, Request, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::app::AppState;
use crate::db::{
    delete_article_by_id, get_all_articles, get_article_by_id, insert_article,
    update_article_by_id, Article, ArticleUpdate, NewArticle,
};
use crate::error::ApiError;
use crate::sanitize::sanitize_article;

pub const UPDATE_FIELDS_REQUIRED: &str =
    "Request body must contain either title, style or content";

// ============================================================================
// REQUEST BODIES
// ============================================================================

/// Read a text field by truthiness: `null`, `false`, `0` and `""` are absent
///
/// Other scalars keep their text form; arrays and objects are rejected.
fn truthy_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(de::Error::custom("expected a string, found an array or object"))
        }
    }
}

/// POST body. Every field may be absent so validation can name what is missing.
#[derive(Debug, Default, Deserialize)]
pub struct CreateArticleRequest {
    #[serde(default, deserialize_with = "truthy_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "truthy_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "truthy_text")]
    pub style: Option<String>,
    pub author: Option<i64>,
}

/// PATCH body
#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleRequest {
    #[serde(default, deserialize_with = "truthy_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "truthy_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "truthy_text")]
    pub style: Option<String>,
}

/// Empty strings count as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    non_empty(value).ok_or_else(|| ApiError::missing_field(field))
}

impl CreateArticleRequest {
    /// Fails on the first missing field, checked as title, content, style
    pub fn validate(self) -> Result<NewArticle, ApiError> {
        let title = required(self.title, "title")?;
        let content = required(self.content, "content")?;
        let style = required(self.style, "style")?;

        Ok(NewArticle {
            title,
            content,
            style,
            author: self.author,
        })
    }
}

impl UpdateArticleRequest {
    pub fn validate(self) -> Result<ArticleUpdate, ApiError> {
        let update = ArticleUpdate {
            title: non_empty(self.title),
            content: non_empty(self.content),
            style: non_empty(self.style),
        };

        if update.is_empty() {
            return Err(ApiError::Validation(UPDATE_FIELDS_REQUIRED.to_string()));
        }

        Ok(update)
    }
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// JSON body that reads as `{}` when empty, not sent as JSON, or an array
///
/// Array bodies have no named fields, so every field reads as absent. Other
/// non-object values (strings, numbers, `null`) are rejected.
pub struct JsonBody<T>(pub T);

fn invalid_json(e: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("Invalid JSON in request body: {}", e))
}

fn is_json_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_json_content_type);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        match serde_json::from_slice::<Value>(&bytes).map_err(invalid_json)? {
            object @ Value::Object(_) => serde_json::from_value(object)
                .map(JsonBody)
                .map_err(invalid_json),
            Value::Array(_) => Ok(JsonBody(T::default())),
            _ => Err(invalid_json("expected an object")),
        }
    }
}

/// The article named by `:article_id`, looked up before get, delete and patch
///
/// An id that is not an integer cannot name a row, so it is a 404 as well.
pub struct ArticleById(pub Article);

#[async_trait]
impl FromRequestParts<AppState> for ArticleById {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;

        let Ok(id) = raw_id.parse::<i64>() else {
            tracing::debug!(article_id = %raw_id, "non-numeric article id");
            return Err(ApiError::NotFound);
        };

        let article = state
            .with_db(move |conn| get_article_by_id(conn, id))
            .await?;

        article.map(ArticleById).ok_or(ApiError::NotFound)
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// `<collection path>/<id>`
fn article_location(collection_path: &str, id: i64) -> String {
    format!("{}/{}", collection_path.trim_end_matches('/'), id)
}

/// GET /articles - All articles, sanitized
async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.with_db(get_all_articles).await?;

    Ok(Json(articles.into_iter().map(sanitize_article).collect()))
}

/// POST /articles - Create an article
async fn create_article(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    JsonBody(payload): JsonBody<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_article = payload.validate()?;

    let article = state
        .with_db(move |conn| insert_article(conn, &new_article))
        .await?;
    tracing::info!(article_id = article.id, "article created");

    let location = article_location(uri.path(), article.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sanitize_article(article)),
    ))
}

/// GET /articles/:article_id
async fn get_article(ArticleById(article): ArticleById) -> Json<Article> {
    Json(sanitize_article(article))
}

/// DELETE /articles/:article_id
async fn delete_article(
    State(state): State<AppState>,
    ArticleById(article): ArticleById,
) -> Result<StatusCode, ApiError> {
    let id = article.id;
    state
        .with_db(move |conn| delete_article_by_id(conn, id))
        .await?;
    tracing::info!(article_id = id, "article deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /articles/:article_id - Update only the supplied fields
async fn update_article(
    State(state): State<AppState>,
    ArticleById(article): ArticleById,
    JsonBody(payload): JsonBody<UpdateArticleRequest>,
) -> Result<StatusCode, ApiError> {
    let update = payload.validate()?;

    let id = article.id;
    state
        .with_db(move |conn| update_article_by_id(conn, id, &update))
        .await?;
    tracing::info!(article_id = id, "article updated");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route(
            "/:article_id",
            get(get_article).delete(delete_article).patch(update_article),
        )
}
