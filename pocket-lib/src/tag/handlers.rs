use crate::auth::handlers::required;
use crate::error::HandlerError;
use crate::tag::slugify;
use crate::user::UserId;
use actix_web::{web, HttpResponse, Responder};
use pocket_repo::tag_repo::{NewTag, TagRepo, TagUpdate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct TagRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Deserialize)]
pub struct TagUpdateRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub archived: Option<bool>,
}

fn checked_slug(slug: &str) -> Result<String, HandlerError> {
    let slug = slugify(slug);
    if slug.is_empty() {
        Err(HandlerError::bad_request("Slug must not be empty"))
    } else {
        Ok(slug)
    }
}

#[get("")]
pub async fn get_tags(
    tag_repo: web::Data<Arc<dyn TagRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<impl Responder, HandlerError> {
    let tags = tag_repo.get_visible_tags(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "tags": tags })))
}

#[post("")]
pub async fn create_tag(
    tag_repo: web::Data<Arc<dyn TagRepo>>,
    user_id: web::ReqData<UserId>,
    request: web::Json<TagRequest>,
) -> Result<impl Responder, HandlerError> {
    let request = request.into_inner();
    let name = required(request.name).ok_or_else(|| HandlerError::bad_request("Name is required"))?;
    let slug = checked_slug(request.slug.as_deref().unwrap_or(&name))?;

    let tag = tag_repo
        .create_tag(
            user_id.into_inner(),
            NewTag::new(name, slug, request.color, request.icon),
        )
        .await?;
    Ok(HttpResponse::Created().json(tag))
}

#[put("/{tag_id}")]
pub async fn update_tag(
    tag_repo: web::Data<Arc<dyn TagRepo>>,
    user_id: web::ReqData<UserId>,
    tag_id: web::Path<i32>,
    request: web::Json<TagUpdateRequest>,
) -> Result<impl Responder, HandlerError> {
    let request = request.into_inner();
    let name = match request.name {
        Some(name) => Some(
            required(Some(name)).ok_or_else(|| HandlerError::bad_request("Name must not be empty"))?,
        ),
        None => None,
    };
    let slug = request.slug.as_deref().map(checked_slug).transpose()?;

    let update = TagUpdate {
        name,
        slug,
        color: request.color,
        icon: request.icon,
        archived: request.archived,
    };
    let tag = tag_repo
        .update_tag(user_id.into_inner(), tag_id.into_inner(), update)
        .await?;
    Ok(HttpResponse::Ok().json(tag))
}

#[delete("/{tag_id}")]
pub async fn delete_tag(
    tag_repo: web::Data<Arc<dyn TagRepo>>,
    user_id: web::ReqData<UserId>,
    tag_id: web::Path<i32>,
) -> Result<impl Responder, HandlerError> {
    let tag = tag_repo
        .delete_tag(user_id.into_inner(), tag_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(tag))
}
