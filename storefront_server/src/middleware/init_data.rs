//! Telegram init-data middleware for Actix Web.
//!
//! Place this middleware on the `/api` scope. If the request carries an `X-Telegram-Init-Data` header, its signature
//! is checked against the bot token and the [`TelegramUser`] it vouches for is stored in the request extensions,
//! where the [`TelegramUser`] extractor and the operator ACL pick it up.
//!
//! Requests without the header pass through unchanged; routes that need an identity reject them when extracting the
//! user. A header that is present but does not validate is rejected outright with a 401.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};
use sf_common::Secret;

use crate::{
    auth::{parse_init_data, validate_init_data, TelegramUser, INIT_DATA_HEADER},
    errors::{AuthError, ServerError},
};

pub struct InitDataMiddlewareFactory {
    bot_token: Secret<String>,
    // If false, the init data is parsed but its signature is not checked
    enabled: bool,
}

impl InitDataMiddlewareFactory {
    pub fn new(bot_token: Secret<String>, enabled: bool) -> Self {
        InitDataMiddlewareFactory { bot_token, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for InitDataMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = InitDataMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(InitDataMiddlewareService {
            bot_token: self.bot_token.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct InitDataMiddlewareService<S> {
    bot_token: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for InitDataMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let bot_token = self.bot_token.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            let Some(header) = req.headers().get(INIT_DATA_HEADER).cloned() else {
                trace!("🔐️ No init data on request to {}", req.path());
                return service.call(req).await;
            };
            let init_data = header.to_str().map_err(|e| {
                debug!("🔐️ Init data header is not a valid string. {e}");
                ServerError::from(AuthError::PoorlyFormattedInitData(e.to_string()))
            })?;
            let user = if enabled {
                validate_init_data(init_data, &bot_token)
            } else {
                trace!("🔐️ Init data checks are disabled. Trusting the caller.");
                parse_init_data(init_data)
            };
            let user: TelegramUser = user.map_err(|e| {
                warn!("🔐️ Rejecting request to {}. {e}", req.path());
                ServerError::from(e)
            })?;
            trace!("🔐️ Init data for {} ✅️", user.id);
            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}
