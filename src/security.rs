use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, http::header};
use futures_util::future::{LocalBoxFuture, ready, Ready};
use std::rc::Rc;

use crate::config::AppConfig;

const HSTS_VALUE: &str = "max-age=63072000; includeSubDomains; preload";

/// Adds baseline security headers unless a handler already set them.
/// Post images live on an external storage host, so `img-src` also admits
/// the configured image origin.
#[derive(Clone, Debug)]
pub struct SecurityHeaders {
    enable_hsts: bool,
    csp: header::HeaderValue,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self { enable_hsts: false, csp: build_csp(None) }
    }
}

impl SecurityHeaders {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::default()
            .with_hsts(cfg.enable_hsts)
            .with_image_origin(cfg.image_origin.as_deref())
    }

    pub fn with_hsts(mut self, enable: bool) -> Self {
        self.enable_hsts = enable;
        self
    }

    pub fn with_image_origin(mut self, origin: Option<&str>) -> Self {
        self.csp = build_csp(origin);
        self
    }
}

fn build_csp(image_origin: Option<&str>) -> header::HeaderValue {
    let img_src = match image_origin.map(str::trim).filter(|o| !o.is_empty()) {
        Some(origin) => format!("'self' data: {origin}"),
        None => "'self' data:".to_string(),
    };
    let csp = format!("default-src 'self'; img-src {img_src}; object-src 'none'; base-uri 'none'; frame-ancestors 'none'; form-action 'self'");
    // origins with control characters cannot be expressed in a header; fall back to same-origin images
    header::HeaderValue::from_str(&csp).unwrap_or_else(|_| {
        tracing::warn!("ignoring image origin that is not a valid header value");
        header::HeaderValue::from_static("default-src 'self'; img-src 'self' data:; object-src 'none'; base-uri 'none'; frame-ancestors 'none'; form-action 'self'")
    })
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service: Rc::new(service),
            cfg: self.clone(),
        }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: Rc<S>,
    cfg: SecurityHeaders,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let cfg = self.cfg.clone();
        Box::pin(async move {
            let mut res = svc.call(req).await?;
            let headers = res.response_mut().headers_mut();
            let defaults = [
                (header::CONTENT_SECURITY_POLICY, cfg.csp.clone()),
                (header::REFERRER_POLICY, header::HeaderValue::from_static("strict-origin-when-cross-origin")),
                (header::X_CONTENT_TYPE_OPTIONS, header::HeaderValue::from_static("nosniff")),
                (header::X_FRAME_OPTIONS, header::HeaderValue::from_static("DENY")),
            ];
            for (name, value) in defaults {
                if !headers.contains_key(&name) {
                    headers.insert(name, value);
                }
            }
            if cfg.enable_hsts && !headers.contains_key(header::STRICT_TRANSPORT_SECURITY) {
                headers.insert(header::STRICT_TRANSPORT_SECURITY, header::HeaderValue::from_static(HSTS_VALUE));
            }
            Ok(res)
        })
    }
}
