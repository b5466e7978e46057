use crate::budget::{BudgetRequest, BudgetResponse};
use crate::error::HandlerError;
use crate::user::UserId;
use actix_web::{web, HttpResponse, Responder};
use pocket_repo::budget_repo::BudgetRepo;
use serde_json::json;
use std::sync::Arc;

#[get("")]
pub async fn get_budgets(
    budget_repo: web::Data<Arc<dyn BudgetRepo>>,
    user_id: web::ReqData<UserId>,
) -> Result<impl Responder, HandlerError> {
    let budgets: Vec<BudgetResponse> = budget_repo
        .get_active_budgets(user_id.into_inner())
        .await?
        .into_iter()
        .map(BudgetResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "budgets": budgets })))
}

#[get("/{budget_id}")]
pub async fn get_budget(
    budget_repo: web::Data<Arc<dyn BudgetRepo>>,
    user_id: web::ReqData<UserId>,
    budget_id: web::Path<i32>,
) -> Result<impl Responder, HandlerError> {
    let budget = budget_repo
        .get_budget(user_id.into_inner(), budget_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(BudgetResponse::from(budget)))
}

#[post("")]
pub async fn create_budget(
    budget_repo: web::Data<Arc<dyn BudgetRepo>>,
    user_id: web::ReqData<UserId>,
    request: web::Json<BudgetRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_budget = request.into_inner().into_new_budget(true)?;
    let budget = budget_repo
        .create_budget(user_id.into_inner(), new_budget)
        .await?;
    Ok(HttpResponse::Created().json(BudgetResponse::from(budget)))
}

#[put("/{budget_id}")]
pub async fn update_budget(
    budget_repo: web::Data<Arc<dyn BudgetRepo>>,
    user_id: web::ReqData<UserId>,
    budget_id: web::Path<i32>,
    request: web::Json<BudgetRequest>,
) -> Result<impl Responder, HandlerError> {
    let user = user_id.into_inner();
    let budget_id = budget_id.into_inner();

    let current = budget_repo.get_budget(user, budget_id).await?;
    let updated_budget = request.into_inner().into_new_budget(current.is_active)?;
    let budget = budget_repo
        .update_budget(user, budget_id, updated_budget)
        .await?;
    Ok(HttpResponse::Ok().json(BudgetResponse::from(budget)))
}

#[delete("/{budget_id}")]
pub async fn delete_budget(
    budget_repo: web::Data<Arc<dyn BudgetRepo>>,
    user_id: web::ReqData<UserId>,
    budget_id: web::Path<i32>,
) -> Result<impl Responder, HandlerError> {
    let budget = budget_repo
        .delete_budget(user_id.into_inner(), budget_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(BudgetResponse::from(budget)))
}
