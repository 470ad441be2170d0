use crate::errors::AppletflowError;
use actix_web::HttpResponse;

pub type Response = Result<HttpResponse, AppletflowError>;
