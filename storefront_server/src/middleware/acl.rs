//! Operator access control middleware.
//!
//! Wrap any resource with this middleware to restrict it to operators. The caller's [`TelegramUser`] must already be
//! in the request extensions (see [`super::InitDataMiddlewareFactory`]) and the allow-list is read from the
//! `web::Data<dyn OperatorPolicy>` app data. Callers who are not operators get a 403 Forbidden response.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, error};
use storefront_engine::OperatorPolicy;

use crate::{
    auth::TelegramUser,
    errors::{AuthError, ServerError},
};

#[derive(Default)]
pub struct OperatorAclFactory;

impl OperatorAclFactory {
    pub fn new() -> Self {
        OperatorAclFactory
    }
}

impl<S, B> Transform<S, ServiceRequest> for OperatorAclFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = OperatorAclService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(OperatorAclService { service: Rc::new(service) })
    }
}

pub struct OperatorAclService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for OperatorAclService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<TelegramUser>()
                .cloned()
                .ok_or(ServerError::AuthenticationError(AuthError::MissingInitData))?;
            let policy = req.app_data::<web::Data<dyn OperatorPolicy>>().cloned().ok_or_else(|| {
                error!("🔐️ No operator policy has been registered with the server");
                ServerError::ConfigurationError("No operator policy".into())
            })?;
            if policy.is_operator(user.telegram_id()) {
                service.call(req).await
            } else {
                debug!("🔐️ {} is not an operator. Denying access to {}", user.id, req.path());
                Err(ServerError::InsufficientPermissions("Operator access is required".into()).into())
            }
        })
    }
}
