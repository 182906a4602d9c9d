//! Session liveness middleware with sliding-window refresh.
//!
//! Last step of the chain. Confirms the presented token still maps to a
//! live login, that the mapped subject agrees with the token's own subject,
//! and that a session record exists; then refreshes the record's TTL.
//!
//! Failure policy is FAIL CLOSED, deliberately the opposite of the
//! revocation check: if the session store cannot be reached on a path that
//! asserts session liveness, the service cannot claim the session is live
//! and rejects. Silently skipping this check is the class of bug that keeps
//! compromised tokens alive. A failed refresh AFTER liveness was confirmed
//! is advisory and never reverts authorization; a lost refresh only
//! shortens the window.

use crate::error::AuthRejection;
use crate::identity::AuthenticatedUser;
use crate::metrics::AUTH_STORE_FAILURES_TOTAL;
use crate::public_paths::PublicPaths;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures::future::{ready, Ready};
use session_store::{SessionStore, StoreError};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

#[derive(Clone)]
pub struct SessionGuardMiddleware {
    sessions: SessionStore,
    public_paths: PublicPaths,
}

impl SessionGuardMiddleware {
    pub fn new(sessions: SessionStore, public_paths: PublicPaths) -> Self {
        Self {
            sessions,
            public_paths,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuardMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionGuardMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGuardMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
            public_paths: self.public_paths.clone(),
        }))
    }
}

pub struct SessionGuardMiddlewareService<S> {
    service: Rc<S>,
    sessions: SessionStore,
    public_paths: PublicPaths,
}

fn fail_closed(error: &StoreError) -> actix_web::Error {
    tracing::error!(error = %error, "Session store unreachable, rejecting request");
    AUTH_STORE_FAILURES_TOTAL
        .with_label_values(&["session", "fail_closed"])
        .inc();
    AuthRejection::SessionStoreUnavailable.reject()
}

impl<S, B> Service<ServiceRequest> for SessionGuardMiddlewareService<S>
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
        let sessions = self.sessions.clone();
        let skip = self.public_paths.matches(req.path());

        Box::pin(async move {
            if skip {
                return service.call(req).await;
            }

            let user = req.extensions().get::<AuthenticatedUser>().cloned();
            let Some(user) = user else {
                tracing::warn!(path = %req.path(), "Missing user context");
                return Err(AuthRejection::MalformedRequest.reject());
            };

            // Token must still map to a live login, and to the same subject
            // the token itself claims.
            match sessions.lookup_subject(&user.token).await {
                Ok(Some(subject)) if subject != user.subject => {
                    tracing::warn!(
                        jwt_subject = %user.subject,
                        store_subject = %subject,
                        "Subject mismatch between token and session store"
                    );
                    return Err(AuthRejection::IdentityMismatch.reject());
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(subject = %user.subject, "Token no longer maps to a live session");
                    return Err(AuthRejection::SessionExpired.reject());
                }
                Err(e) => return Err(fail_closed(&e)),
            }

            match sessions.get(&user.subject).await {
                Ok(Some(_)) => {
                    if let Err(e) = sessions.refresh(&user.subject).await {
                        tracing::warn!(subject = %user.subject, error = %e, "Session refresh failed");
                        AUTH_STORE_FAILURES_TOTAL
                            .with_label_values(&["session", "refresh"])
                            .inc();
                    }
                    service.call(req).await
                }
                Ok(None) => {
                    tracing::warn!(subject = %user.subject, "Session not found or expired");
                    Err(AuthRejection::SessionExpired.reject())
                }
                Err(e) => Err(fail_closed(&e)),
            }
        })
    }
}
