//! Token revocation (blacklist) middleware.
//!
//! Second step of the chain: one EXISTS round trip against the hashed-token
//! blacklist. Runs after JWT validation so invalid tokens never cost a
//! Redis call.
//!
//! Failure policy is FAIL OPEN: authentication already required a signed,
//! unexpired token, so a transient blacklist outage lets the request
//! through rather than taking the platform down. Losing revocation for a
//! moment only means a logged-out token's window stays open slightly
//! longer. Every such failure is logged and counted.

use crate::error::AuthRejection;
use crate::identity::AuthenticatedUser;
use crate::metrics::AUTH_STORE_FAILURES_TOTAL;
use crate::public_paths::PublicPaths;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures::future::{ready, Ready};
use session_store::RevocationStore;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

#[derive(Clone)]
pub struct TokenRevocationMiddleware {
    revocations: RevocationStore,
    public_paths: PublicPaths,
}

impl TokenRevocationMiddleware {
    pub fn new(revocations: RevocationStore, public_paths: PublicPaths) -> Self {
        Self {
            revocations,
            public_paths,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenRevocationMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = TokenRevocationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenRevocationMiddlewareService {
            service: Rc::new(service),
            revocations: self.revocations.clone(),
            public_paths: self.public_paths.clone(),
        }))
    }
}

pub struct TokenRevocationMiddlewareService<S> {
    service: Rc<S>,
    revocations: RevocationStore,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for TokenRevocationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let revocations = self.revocations.clone();
        let skip = self.public_paths.matches(req.path());

        Box::pin(async move {
            if skip {
                return service.call(req).await;
            }

            // Bound earlier in the chain by the JWT middleware. Requests
            // without it fall through to that middleware's rejection.
            let token = req
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|user| user.token.clone());

            let Some(token) = token else {
                return service.call(req).await;
            };

            match revocations.is_revoked(&token).await {
                Ok(true) => {
                    tracing::warn!(path = %req.path(), "Blacklisted token attempted access");
                    Err(AuthRejection::Revoked.reject())
                }
                Ok(false) => service.call(req).await,
                Err(e) => {
                    tracing::error!(error = %e, "Revocation check failed, allowing request");
                    AUTH_STORE_FAILURES_TOTAL
                        .with_label_values(&["revocation", "fail_open"])
                        .inc();
                    service.call(req).await
                }
            }
        })
    }
}
