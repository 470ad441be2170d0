use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError};
use colored::Colorize;
use serde_json::json;
use std::error::Error;
use std::fmt;

/// What the generation response failed to parse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ParseTarget {
    #[strum(serialize = "files")]
    Files,
    #[strum(serialize = "HTML")]
    Html,
}

#[derive(Debug)]
pub enum AppletflowError {
    // 400s
    BadRequest(String),
    ValidationError((String, String)),
    NotFound(String),
    Conflict(String),
    ParseError(ParseTarget, String),
    // 502
    AiError(String),
    // 500
    StorageError(String),
    ConfigError(String),
    SerdeError(serde_json::Error),
    IoError(std::io::Error),
    ZipError(zip::result::ZipError),
    ActixError(actix_web::Error),
    InternalServerError(String),
}

impl fmt::Display for AppletflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppletflowError::BadRequest(e) => write!(f, "Bad Request: {}", e),
            AppletflowError::ValidationError((field, message)) => {
                write!(f, "Validation Error: {}: {}", field, message)
            }
            AppletflowError::NotFound(e) => write!(f, "Not Found: {}", e),
            AppletflowError::Conflict(e) => write!(f, "Conflict: {}", e),
            AppletflowError::ParseError(target, e) => write!(f, "Could not parse {}: {}", target, e),
            AppletflowError::AiError(e) => write!(f, "AI Error: {}", e),
            AppletflowError::StorageError(e) => write!(f, "Storage Error: {}", e),
            AppletflowError::ConfigError(e) => write!(f, "Config Error: {}", e),
            AppletflowError::SerdeError(e) => write!(f, "Serde Error: \n{}", e),
            AppletflowError::IoError(e) => write!(f, "IO Error: {}", e),
            AppletflowError::ZipError(e) => write!(f, "Zip Error: {}", e),
            AppletflowError::ActixError(e) => write!(f, "Actix Error: {}", e),
            AppletflowError::InternalServerError(e) => write!(f, "InternalServerError: \n{}", e),
        }
    }
}

impl Error for AppletflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppletflowError::SerdeError(e) => Some(e),
            AppletflowError::IoError(e) => Some(e),
            AppletflowError::ZipError(e) => Some(e),
            AppletflowError::ActixError(e) => Some(e),
            AppletflowError::BadRequest(_)
            | AppletflowError::ValidationError(_)
            | AppletflowError::NotFound(_)
            | AppletflowError::Conflict(_)
            | AppletflowError::ParseError(_, _)
            | AppletflowError::AiError(_)
            | AppletflowError::StorageError(_)
            | AppletflowError::ConfigError(_)
            | AppletflowError::InternalServerError(_) => None,
        }
    }
}

impl ResponseError for AppletflowError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppletflowError::BadRequest(e) => HttpResponse::BadRequest().json(json!({
                "status": 400,
                "message": e
            })),
            AppletflowError::ValidationError((field, message)) => HttpResponse::BadRequest().json(json!({
                "status": 400,
                "message": {field: message}
            })),
            AppletflowError::NotFound(e) => HttpResponse::NotFound().json(json!({
                "status": 404,
                "message": e
            })),
            AppletflowError::Conflict(e) => HttpResponse::Conflict().json(json!({
                "status": 409,
                "message": e
            })),
            AppletflowError::ParseError(target, e) => HttpResponse::UnprocessableEntity().json(json!({
                "status": 422,
                "message": format!("Could not parse {}: {}", target, e)
            })),
            AppletflowError::AiError(e) => HttpResponseBuilder::new(StatusCode::BAD_GATEWAY).json(json!({
                "status": 502,
                "message": e
            })),
            _ => {
                log::error!("Internal Server Error: {}", self.to_string().red());

                HttpResponse::InternalServerError().json(json!({
                    "status": 500,
                    "message": self.to_string()
                }))
            }
        }
    }
}

impl From<serde_json::Error> for AppletflowError {
    fn from(e: serde_json::Error) -> Self {
        AppletflowError::SerdeError(e)
    }
}

impl From<std::io::Error> for AppletflowError {
    fn from(e: std::io::Error) -> Self {
        AppletflowError::IoError(e)
    }
}

impl From<zip::result::ZipError> for AppletflowError {
    fn from(e: zip::result::ZipError) -> Self {
        AppletflowError::ZipError(e)
    }
}

impl From<toml::de::Error> for AppletflowError {
    fn from(e: toml::de::Error) -> Self {
        AppletflowError::ConfigError(e.to_string())
    }
}

impl From<reqwest::Error> for AppletflowError {
    fn from(e: reqwest::Error) -> Self {
        AppletflowError::AiError(e.to_string())
    }
}

impl From<actix_web::Error> for AppletflowError {
    fn from(e: actix_web::Error) -> Self {
        AppletflowError::ActixError(e)
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppletflowError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        AppletflowError::InternalServerError(e.to_string())
    }
}
