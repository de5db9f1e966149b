//! Capability checks applied as route layers.
//!
//! Each capability is its own type; routers opt into one with
//! `route_layer(from_fn_with_state(state, require::<Staff>))`. There is no
//! hierarchy between them: a superuser lacking the staff flag fails [`Staff`].

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

use super::AuthenticatedUser;

/// A predicate over the requesting identity
pub trait Capability: Send + Sync + 'static {
    fn check(claims: &UserClaims) -> Result<(), AppError>;
}

/// Any holder of a valid access token
pub struct Authenticated;

/// Catalog management (is_staff)
pub struct Staff;

/// User administration (is_superuser)
pub struct Admin;

impl Capability for Authenticated {
    fn check(_claims: &UserClaims) -> Result<(), AppError> {
        Ok(())
    }
}

impl Capability for Staff {
    fn check(claims: &UserClaims) -> Result<(), AppError> {
        claims.require_staff()
    }
}

impl Capability for Admin {
    fn check(claims: &UserClaims) -> Result<(), AppError> {
        claims.require_admin()
    }
}

/// Authenticate the request, check capability `C` and expose the claims
/// to handlers as an `Extension<UserClaims>`.
pub async fn require<C: Capability>(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(&mut parts, &state).await?;

    if let Err(e) = C::check(&claims) {
        tracing::warn!(
            user_id = claims.user_id,
            path = %parts.uri.path(),
            "permission denied"
        );
        return Err(e);
    }

    parts.extensions.insert(claims);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
