use actix_multipart::form::MultipartForm;
use actix_web::{
    HttpResponse, get, post,
    web::{Data, Path, ServiceConfig, scope},
};
use actix_web_validator::{Json, Query};
use tracing::info;

use super::models::{ActionRequest, ListQuery, UploadForm};
use super::service::{CampaignService, ServiceError};

#[get("")]
async fn list_campaigns(
    service: Data<CampaignService>,
    query: Query<ListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = service.list_page(query.limit(), query.cursor).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/all")]
async fn list_all_campaigns(service: Data<CampaignService>) -> Result<HttpResponse, ServiceError> {
    let campaigns = service.list_all().await?;
    Ok(HttpResponse::Ok().json(campaigns))
}

#[post("")]
async fn create_campaign(
    service: Data<CampaignService>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<HttpResponse, ServiceError> {
    info!(
        "Received roster upload: file={:?}, {} bytes",
        form.file.file_name,
        form.file.data.len()
    );

    let raw_csv = std::str::from_utf8(&form.file.data)
        .map_err(|_| ServiceError::Validation("CSV file must be UTF-8 text".to_string()))?;

    let created = service.create_campaign(&form.name, raw_csv).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
async fn get_campaign(
    service: Data<CampaignService>,
    path: Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign = service.get_campaign(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(campaign))
}

#[get("/{id}/participants")]
async fn list_participants(
    service: Data<CampaignService>,
    path: Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let participants = service.participants(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(participants))
}

#[post("/{id}/actions")]
async fn perform_action(
    service: Data<CampaignService>,
    path: Path<i32>,
    body: Json<ActionRequest>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.perform_action(path.into_inner(), body.trigger).await?;
    Ok(HttpResponse::Accepted().json(response))
}

pub fn campaign_config(config: &mut ServiceConfig) {
    // "/all" must be registered ahead of "/{id}"
    config.service(
        scope("campaigns")
            .service(list_campaigns)
            .service(list_all_campaigns)
            .service(create_campaign)
            .service(get_campaign)
            .service(list_participants)
            .service(perform_action),
    );
}
