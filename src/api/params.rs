//! Form parameter extraction
//!
//! Form endpoints accept parameters in the query string and in an
//! `application/x-www-form-urlencoded` or `multipart/form-data` body.
//! Body values win over query values of the same name.

use axum::{
    extract::{FromRequest, Multipart, Query, Request},
    http::header,
    Form,
};

use crate::api::middleware::ApiError;
use crate::services::form::FormParams;

fn content_type(req: &Request) -> String {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

impl<S> FromRequest<S> for FormParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|e| ApiError::validation_error(format!("Invalid query string: {}", e)))?;
        let mut params: FormParams = query.into_iter().collect();

        let content_type = content_type(&req);
        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation_error(format!("Invalid multipart body: {}", e)))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::validation_error(format!("Invalid multipart field: {}", e)))?
            {
                let Some(name) = field.name().map(String::from) else {
                    continue;
                };
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Invalid multipart field {}: {}", name, e)))?;
                params.insert(name, value);
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation_error(format!("Invalid form body: {}", e)))?;
            params.merge(body.into_iter().collect());
        }

        Ok(params)
    }
}
