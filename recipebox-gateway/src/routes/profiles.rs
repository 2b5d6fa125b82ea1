//! Profile handlers: the caller's own profile, tag vocabulary, and public
//! user pages.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use recipebox_core::{OwnerScope, Profile, ProfileUpdate, RecipeQuery, Scope, UserId};
use recipebox_store::{PublicProfile, UrlSigner};

use super::{
    json_body, path_param, query_params,
    recipes::{upload_parts, view_page, ListParams},
};
use crate::{
    auth::{Authed, Viewer},
    error::GatewayError,
    state::AppState,
};

/// The caller's profile with a signed avatar URL.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub avatar_url: Option<String>,
}

impl ProfileView {
    fn new(profile: Profile, signer: &UrlSigner) -> Self {
        let avatar_url = profile.avatar.as_ref().map(|key| signer.sign(key, Utc::now()));
        Self { profile, avatar_url }
    }
}

/// Someone else's profile as anyone may see it.
#[derive(Debug, Serialize)]
pub struct PublicProfileView {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub tag: String,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

/// `GET /api/me`: the caller's profile, created on first access.
///
/// # Errors
/// Returns 401 without a valid token.
pub async fn get_me(State(state): State<AppState>, Authed(caller): Authed) -> Result<impl IntoResponse, GatewayError> {
    let profile = state.catalog.profile(&caller).await?;
    Ok(Json(ProfileView::new(profile, &state.signer)))
}

/// `PUT /api/me`: update display name and bio.
///
/// # Errors
/// Returns 400 if a field is out of bounds; nothing is changed in that case.
pub async fn update_me(
    State(state): State<AppState>,
    Authed(caller): Authed,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let update = json_body(body)?;
    let profile = state.catalog.update_profile(&caller, update).await?;
    Ok(Json(ProfileView::new(profile, &state.signer)))
}

/// `PUT /api/me/avatar`: upload a raw avatar image.
///
/// # Errors
/// Returns 415 for non-image bodies and 413 above the upload limit.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Authed(caller): Authed,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let (content_type, bytes) = upload_parts(&headers, body, state.catalog.max_upload_bytes())?;
    let profile = state.catalog.set_avatar(&caller, &content_type, bytes).await?;
    Ok(Json(ProfileView::new(profile, &state.signer)))
}

/// `GET /api/me/tags`
///
/// # Errors
/// Returns 401 without a valid token.
pub async fn list_tags(State(state): State<AppState>, Authed(caller): Authed) -> Result<impl IntoResponse, GatewayError> {
    let tags = state.catalog.list_tags(&caller).await?;
    Ok(Json(TagsResponse { tags }))
}

/// `POST /api/me/tags`: add a tag; 201 if new, 200 if already present.
///
/// # Errors
/// Returns 400 for tags that do not normalize or a full vocabulary.
pub async fn add_tag(
    State(state): State<AppState>,
    Authed(caller): Authed,
    body: Result<Json<TagBody>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let TagBody { tag } = json_body(body)?;
    let (added, tags) = state.catalog.add_tag(&caller, &tag).await?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(TagsResponse { tags })))
}

/// `DELETE /api/me/tags/{tag}`: recipes keep the tag.
///
/// # Errors
/// Returns 404 if the tag is not in the vocabulary.
pub async fn remove_tag(
    State(state): State<AppState>,
    Authed(caller): Authed,
    tag: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let tag = path_param(tag)?;
    if state.catalog.remove_tag(&caller, &tag).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(GatewayError::NotFound(format!("tag '{tag}'")))
    }
}

/// `GET /api/users/{uid}`: public profile.
///
/// # Errors
/// Returns 404 if the user has no profile.
pub async fn public_profile(
    State(state): State<AppState>,
    uid: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let uid = path_param(uid)?;
    let profile = state.catalog.public_profile(&UserId::new(uid)).await?;
    let avatar_url = profile.avatar.as_ref().map(|key| state.signer.sign(key, Utc::now()));
    Ok(Json(PublicProfileView { profile, avatar_url }))
}

/// `GET /api/users/{uid}/recipes`: that user's public recipes.
///
/// The other listing filters apply; visibility and owner are fixed.
///
/// # Errors
/// Returns 400 for malformed parameters.
pub async fn public_recipes(
    State(state): State<AppState>,
    viewer: Viewer,
    uid: Result<Path<String>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let uid = path_param(uid)?;
    let (query, pagination) = query_params(params)?.into_query()?;
    let query = RecipeQuery {
        scope: Some(Scope::Public),
        owner: Some(OwnerScope::User(UserId::new(uid))),
        ..query
    };
    let page = state.catalog.list(query, pagination, viewer.uid()).await?;
    Ok(Json(view_page(page, &state.signer)))
}
