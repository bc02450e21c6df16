//! Request extractors that reject with our ErrorResponse format

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::header,
    Form, Json,
};
use fatbox_core::AppError;
use serde::de::DeserializeOwned;

use crate::error::HttpAppError;

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError::from(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<FormRejection> for HttpAppError {
    fn from(rejection: FormRejection) -> Self {
        HttpAppError::from(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// Body extractor accepting either `application/json` or an urlencoded form.
///
/// JSON is chosen when the content type mentions `json`; everything else goes
/// through the form extractor, which rejects unsupported content types.
#[derive(Debug, Clone, Copy)]
pub struct FormOrJson<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
                .ends_with("json")
        })
        .unwrap_or(false)
}

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(inner) = Json::<T>::from_request(req, state).await?;
            Ok(FormOrJson(inner))
        } else {
            let Form(inner) = Form::<T>::from_request(req, state).await?;
            Ok(FormOrJson(inner))
        }
    }
}
