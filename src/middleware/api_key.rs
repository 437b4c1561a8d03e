use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

const API_KEY_HEADER: &str = "x-api-key";

/// Static API-key gate for the login route.
///
/// When the `API_KEY` environment variable is set, requests must carry a
/// matching `x-api-key` header. When it is unset the gate is disabled, so
/// local development works without extra configuration.
pub struct ApiKeyGuard;

impl<S, B> Transform<S, ServiceRequest> for ApiKeyGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyGuardService { service }))
    }
}

pub struct ApiKeyGuardService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ApiKeyGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let expected = std::env::var("API_KEY").ok();

        let expected = match expected {
            Some(key) if !key.is_empty() => key,
            _ => {
                // Gate disabled
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) });
            }
        };

        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(key) if key == expected => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) })
            }
            _ => {
                log::warn!("❌ Request rejected: invalid or missing {}", API_KEY_HEADER);
                // Same JSON envelope the handlers use for their error responses
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "success": false,
                    "error": "Invalid API Key"
                }));
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}
