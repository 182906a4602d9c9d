//! JWT authentication middleware.
//!
//! First step of the chain: verifies the bearer token without any store
//! access, binds the verified identity into request extensions, and injects
//! the identity headers downstream services trust. Rejections here are the
//! cheapest in the chain, so structurally invalid tokens never reach Redis.

use crate::error::AuthRejection;
use crate::identity::{propagate_identity, AuthenticatedUser};
use crate::public_paths::PublicPaths;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpMessage};
use auth_core::JwtVerifier;
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone)]
pub struct JwtAuthMiddleware {
    verifier: Arc<JwtVerifier>,
    public_paths: PublicPaths,
}

impl JwtAuthMiddleware {
    pub fn new(verifier: Arc<JwtVerifier>, public_paths: PublicPaths) -> Self {
        Self {
            verifier,
            public_paths,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            public_paths: self.public_paths.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<JwtVerifier>,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();
        let skip = self.public_paths.matches(req.path());

        Box::pin(async move {
            if skip {
                return service.call(req).await;
            }

            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string);

            let Some(token) = token else {
                tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
                return Err(AuthRejection::MalformedRequest.reject());
            };

            let claims = match verifier.verify(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::warn!(path = %req.path(), error = %e, "JWT validation failed");
                    return Err(AuthRejection::InvalidToken.reject());
                }
            };

            tracing::debug!(subject = %claims.sub, "JWT validated");

            let user = AuthenticatedUser::from_claims(&claims, &token);
            propagate_identity(&mut req, &user);
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}
