use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use serde::Serialize;

use crate::auth::claims::AccessClaims;
use crate::domain::identity::{Identity, Role};
use crate::error::AppError;

/// Authenticated participant for the current request, extracted from the
/// JWT claims stored in request extensions by the JwtExtract middleware.
/// There is no user store behind this: the claims are the identity.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub sub: String,
    pub display_name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.display_name.clone(), self.role)
    }
}

impl From<AccessClaims> for CurrentUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            sub: claims.sub,
            display_name: claims.name,
            role: claims.role,
        }
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<AccessClaims>().cloned();
        ready(
            claims
                .map(CurrentUser::from)
                .ok_or_else(AppError::unauthorized_missing_bearer),
        )
    }
}
