use actix_web::{delete, get, http::header, patch, post, web, HttpResponse};
use database::{
    consts::consts::PersonId,
    model::{person::NewPerson, statement::UpdatePersonData},
    persistence::storage::{PersonStorage, Storage},
};
use serde::Serialize;

use crate::error::{json_error_handler, path_error_handler, ApiError};

pub const PERSONS_PATH: &str = "/api/v1/persons";

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[get("/api/v1/persons")]
async fn list_persons(storage: web::Data<PersonStorage>) -> ApiResult {
    let persons = storage.list().await?;

    Ok(HttpResponse::Ok().json(persons))
}

#[get("/api/v1/persons/{id}")]
async fn get_person(storage: web::Data<PersonStorage>, path: web::Path<i64>) -> ApiResult {
    let id = PersonId(path.into_inner());

    match storage.get(id).await? {
        Some(person) => Ok(HttpResponse::Ok().json(person)),
        None => Err(ApiError::NotFound(id)),
    }
}

#[post("/api/v1/persons")]
async fn create_person(
    storage: web::Data<PersonStorage>,
    new_person: web::Json<NewPerson>,
) -> ApiResult {
    let new_person = new_person.into_inner();
    new_person.validate()?;

    let person = storage.create(new_person).await?;

    log::debug!("Created person [id: {}]", person.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("{}/{}", PERSONS_PATH, person.id)))
        .json(person))
}

#[patch("/api/v1/persons/{id}")]
async fn update_person(
    storage: web::Data<PersonStorage>,
    path: web::Path<i64>,
    update: web::Json<UpdatePersonData>,
) -> ApiResult {
    let id = PersonId(path.into_inner());
    let update = update.into_inner();
    update.validate()?;

    match storage.update(id, update).await? {
        Some(person) => Ok(HttpResponse::Ok().json(person)),
        None => Err(ApiError::NotFound(id)),
    }
}

/// Deleting a person that does not exist is not an error, both cases answer 204
#[delete("/api/v1/persons/{id}")]
async fn delete_person(storage: web::Data<PersonStorage>, path: web::Path<i64>) -> ApiResult {
    let id = PersonId(path.into_inner());

    if !storage.delete(id).await? {
        log::debug!("Delete of missing person [id: {}] ignored", id);
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Liveness check, never touches storage
#[get("/manage/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(list_persons)
        .service(get_person)
        .service(create_person)
        .service(update_person)
        .service(delete_person)
        .service(health);
}
