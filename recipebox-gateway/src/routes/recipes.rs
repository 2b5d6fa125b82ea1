//! Recipe handlers: listing, CRUD, cover images and favorites.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recipebox_core::{
    tags::parse_tag_list, OwnerScope, Page, Pagination, Recipe, RecipeDraft, RecipeKind, RecipeQuery,
    Scope, UserId,
};
use recipebox_store::{StoreError, UrlSigner};

use super::{json_body, parse_recipe_id, path_param, query_params};
use crate::{
    auth::{Authed, Viewer},
    error::GatewayError,
    state::AppState,
};

// ── Request / response types ──────────────────────────────────────────────────

/// Query string of the listing endpoints. Values are parsed by hand so that
/// bad input yields a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// `public`, `private` or `all`.
    pub visibility: Option<String>,
    /// `me` or a user id.
    pub owner: Option<String>,
    pub q: Option<String>,
    /// Comma-separated tags, all of which must match.
    pub tags: Option<String>,
    /// `link` or `homemade`.
    pub kind: Option<String>,
    pub vegetarian: Option<String>,
    pub favorites: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListParams {
    /// Parse into a listing query and normalized pagination.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidRequest`] for unknown enum values or
    /// non-numeric paging, and [`GatewayError::Invalid`] for bad tags.
    pub fn into_query(self) -> Result<(RecipeQuery, Pagination), GatewayError> {
        let scope = match self.visibility.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("public") => Some(Scope::Public),
            Some("private") => Some(Scope::Private),
            Some("all") => Some(Scope::All),
            Some(other) => return Err(invalid("visibility", other)),
        };
        let owner = match self.owner.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("me") => Some(OwnerScope::Me),
            Some(uid) => Some(OwnerScope::User(UserId::new(uid))),
        };
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("link") => Some(RecipeKind::Link),
            Some("homemade") => Some(RecipeKind::Homemade),
            Some(other) => return Err(invalid("kind", other)),
        };
        let tags = match self.tags.as_deref() {
            Some(csv) => parse_tag_list(csv)?,
            None => std::collections::BTreeSet::new(),
        };
        let query = RecipeQuery {
            scope,
            owner,
            search: self.q,
            tags,
            kind,
            vegetarian: parse_flag("vegetarian", self.vegetarian.as_deref())?,
            favorites_only: parse_flag("favorites", self.favorites.as_deref())?.unwrap_or(false),
        };
        let pagination = Pagination::new(
            parse_number("page", self.page.as_deref())?,
            parse_number("page_size", self.page_size.as_deref())?,
        );
        Ok((query, pagination))
    }
}

/// A recipe as returned to clients, with a signed image URL.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub image_url: Option<String>,
}

impl RecipeView {
    #[must_use]
    pub fn new(recipe: Recipe, signer: &UrlSigner, now: DateTime<Utc>) -> Self {
        let image_url = recipe.image.as_ref().map(|key| signer.sign(key, now));
        Self { recipe, image_url }
    }
}

#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub favorite: bool,
    pub favorites: usize,
}

fn invalid(param: &str, value: &str) -> GatewayError {
    GatewayError::InvalidRequest(format!("unknown {param} '{value}'"))
}

fn parse_flag(param: &str, raw: Option<&str>) -> Result<Option<bool>, GatewayError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("true" | "1" | "yes") => Ok(Some(true)),
        Some("false" | "0" | "no") => Ok(Some(false)),
        Some(other) => Err(invalid(param, other)),
    }
}

/// Parse a paging number. Zero and negative values are passed on as zero
/// for [`Pagination::new`] to clamp.
fn parse_number(param: &str, raw: Option<&str>) -> Result<Option<u32>, GatewayError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            let n: i64 = v
                .parse()
                .map_err(|_| GatewayError::InvalidRequest(format!("{param} must be a number, got '{v}'")))?;
            Ok(Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX)))
        }
    }
}

pub(crate) fn view_page(page: Page<Recipe>, signer: &UrlSigner) -> Page<RecipeView> {
    let now = Utc::now();
    page.map(|recipe| RecipeView::new(recipe, signer, now))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /api/recipes`: filtered, paginated listing.
///
/// # Errors
/// Returns 400 for malformed parameters and 401 when an anonymous caller
/// asks for private recipes, `owner=me` or favorites.
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Viewer,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let (query, pagination) = query_params(params)?.into_query()?;
    let page = state.catalog.list(query, pagination, viewer.uid()).await?;
    Ok(Json(view_page(page, &state.signer)))
}

/// `POST /api/recipes`: create a recipe owned by the caller.
///
/// # Errors
/// Returns 400 if the draft is invalid.
pub async fn create_recipe(
    State(state): State<AppState>,
    Authed(caller): Authed,
    body: Result<Json<RecipeDraft>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let draft = json_body(body)?;
    let recipe = state.catalog.create_recipe(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(RecipeView::new(recipe, &state.signer, Utc::now()))))
}

/// `GET /api/recipes/{id}`: one recipe, if the caller may see it.
///
/// # Errors
/// Returns 404 for missing recipes and for other users' private ones.
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Viewer,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    let recipe = state.catalog.get_recipe(viewer.uid(), id).await?;
    Ok(Json(RecipeView::new(recipe, &state.signer, Utc::now())))
}

/// `PUT /api/recipes/{id}`: replace a recipe's editable fields.
///
/// # Errors
/// Returns 403 if the caller does not own the recipe.
pub async fn update_recipe(
    State(state): State<AppState>,
    Authed(caller): Authed,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<RecipeDraft>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    let draft = json_body(body)?;
    let recipe = state.catalog.update_recipe(&caller, id, draft).await?;
    Ok(Json(RecipeView::new(recipe, &state.signer, Utc::now())))
}

/// `DELETE /api/recipes/{id}`: delete a recipe and its image.
///
/// # Errors
/// Returns 403 if the caller does not own the recipe.
pub async fn delete_recipe(
    State(state): State<AppState>,
    Authed(caller): Authed,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    state.catalog.delete_recipe(&caller.uid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/recipes/{id}/image`: upload the raw cover image.
///
/// # Errors
/// Returns 415 without an image `Content-Type`, 413 above the upload limit.
pub async fn upload_image(
    State(state): State<AppState>,
    Authed(caller): Authed,
    id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    let (content_type, bytes) = upload_parts(&headers, body, state.catalog.max_upload_bytes())?;
    let recipe = state.catalog.set_recipe_image(&caller.uid, id, &content_type, bytes).await?;
    Ok(Json(RecipeView::new(recipe, &state.signer, Utc::now())))
}

/// `PUT /api/recipes/{id}/favorite`
///
/// # Errors
/// Returns 404 if the caller cannot see the recipe.
pub async fn add_favorite(
    State(state): State<AppState>,
    Authed(caller): Authed,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    let favorites = state.catalog.set_favorite(&caller, id, true).await?;
    Ok(Json(FavoriteResponse { favorite: true, favorites }))
}

/// `DELETE /api/recipes/{id}/favorite`
///
/// # Errors
/// Only fails on backend errors; unknown ids are accepted.
pub async fn remove_favorite(
    State(state): State<AppState>,
    Authed(caller): Authed,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_recipe_id(&path_param(id)?)?;
    let favorites = state.catalog.set_favorite(&caller, id, false).await?;
    Ok(Json(FavoriteResponse { favorite: false, favorites }))
}

/// Content type and bytes of a raw upload body.
pub(crate) fn upload_parts(
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    limit: usize,
) -> Result<(String, Bytes), GatewayError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StoreError::UnsupportedMediaType("missing Content-Type".to_owned()))?
        .to_owned();
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge { max: limit }
        } else {
            GatewayError::InvalidRequest(rejection.body_text())
        }
    })?;
    Ok((content_type, bytes))
}
