use rocket::{http::Status, serde::json::Json};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct Error<E: Serialize> {
    pub error: Inner<E>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Inner<E: Serialize> {
    pub code: u16,
    pub description: String,
    pub reason: Option<&'static str>,
    pub status: E,
}

impl<E: Serialize> Error<E> {
    fn new(http_status: Status, description: String, error: E) -> Self {
        Self {
            error: Inner {
                code: http_status.code,
                description,
                reason: http_status.reason(),
                status: error,
            },
        }
    }
}

pub type JsonError<E> = (Status, Json<Error<E>>);

pub type JsonResult<T, E> = Result<Json<T>, JsonError<E>>;

fn with_status<E: Serialize>(status: Status, error: E, description: String) -> JsonError<E> {
    (status, Json(Error::new(status, description, error)))
}

pub fn bad_request<E: Serialize>(error: E, description: String) -> JsonError<E> {
    with_status(Status::BadRequest, error, description)
}

pub fn unauthorized<E: Serialize>(error: E, description: String) -> JsonError<E> {
    with_status(Status::Unauthorized, error, description)
}

pub fn not_found<E: Serialize>(error: E, description: String) -> JsonError<E> {
    with_status(Status::NotFound, error, description)
}

pub fn conflict<E: Serialize>(error: E, description: String) -> JsonError<E> {
    with_status(Status::Conflict, error, description)
}

pub fn unprocessable<E: Serialize>(error: E, description: String) -> JsonError<E> {
    with_status(Status::UnprocessableEntity, error, description)
}
