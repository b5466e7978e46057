use crate::error::HandlerError;
use crate::transaction::{Pagination, TransactionRequest, TransactionResponse};
use crate::user::UserId;
use actix_web::{web, HttpResponse, Responder};
use pocket_repo::transaction_repo::{
    Direction, Filter, NewTransaction, PageOptions, TransactionRepo,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize, Debug)]
pub struct TransactionQuery {
    #[serde(alias = "type")]
    pub direction: Option<String>,
    pub tag: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
struct TransactionListResponse {
    transactions: Vec<TransactionResponse>,
    pagination: Pagination,
}

#[get("")]
pub async fn get_transactions(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    query: web::Query<TransactionQuery>,
) -> Result<impl Responder, HandlerError> {
    let query = query.into_inner();
    let direction = query
        .direction
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(str::parse::<Direction>)
        .transpose()
        .map_err(|_| HandlerError::bad_request("Direction must be 'income' or 'expense'"))?;
    let filter = Filter {
        direction,
        tag_id: query.tag,
    };
    let pagination = Pagination::new(query.page, query.limit);

    let page = transaction_repo
        .get_transactions(
            user_id.into_inner(),
            filter,
            Some(PageOptions {
                offset: pagination.offset(),
                limit: pagination.limit,
            }),
        )
        .await?;

    Ok(HttpResponse::Ok().json(TransactionListResponse {
        transactions: page
            .transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        pagination: pagination.with_total(page.total),
    }))
}

#[get("/{transaction_id}")]
pub async fn get_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    transaction_id: web::Path<i32>,
) -> Result<impl Responder, HandlerError> {
    let transaction = transaction_repo
        .get_transaction(user_id.into_inner(), transaction_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

#[post("")]
pub async fn create_new_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    request: web::Json<TransactionRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_transaction = NewTransaction::try_from(request.into_inner())?;
    let transaction = transaction_repo
        .create_new_transaction(user_id.into_inner(), new_transaction)
        .await?;
    Ok(HttpResponse::Created().json(TransactionResponse::from(transaction)))
}

#[put("/{transaction_id}")]
pub async fn update_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    transaction_id: web::Path<i32>,
    request: web::Json<TransactionRequest>,
) -> Result<impl Responder, HandlerError> {
    let user = user_id.into_inner();
    let transaction_id = transaction_id.into_inner();

    let current = transaction_repo
        .get_transaction(user, transaction_id)
        .await?;
    let updated_transaction = request.into_inner().into_update(&current)?;
    let transaction = transaction_repo
        .update_transaction(user, transaction_id, updated_transaction)
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

#[delete("/{transaction_id}")]
pub async fn delete_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    transaction_id: web::Path<i32>,
) -> Result<impl Responder, HandlerError> {
    let transaction = transaction_repo
        .delete_transaction(user_id.into_inner(), transaction_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}
