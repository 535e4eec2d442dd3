use actix_web::cookie::time::Duration;
use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponseBuilder};

use crate::domain::cart::SessionId;

pub const SESSION_COOKIE: &str = "cart_session_id";
const SESSION_MAX_AGE_SECS: i64 = 3600;

/// Visitor identity for one request. `minted` is set when the request came
/// without a session cookie and a fresh id was generated for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub minted: bool,
}

impl Session {
    pub fn from_request(req: &HttpRequest) -> Self {
        match req.cookie(SESSION_COOKIE) {
            Some(cookie) if !cookie.value().is_empty() => Self {
                id: SessionId::new(cookie.value()),
                minted: false,
            },
            _ => Self {
                id: SessionId::generate(),
                minted: true,
            },
        }
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, self.id.as_str().to_owned())
            .path("/")
            .max_age(Duration::seconds(SESSION_MAX_AGE_SECS))
            .http_only(true)
            .finish()
    }

    /// Hands a freshly minted id back to the client.
    pub fn attach(&self, mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
        if self.minted {
            builder.cookie(self.cookie());
        }
        builder
    }
}
