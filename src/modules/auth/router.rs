use axum::{Router, routing::get};
use classbase_config::RateLimitConfig;
use tower_governor::GovernorLayer;

use crate::modules::auth::controller::{
    create_custom_token, get_user_role, set_user_role, verify_token,
};
use crate::state::AppState;

/// `/auth` routes. The two unauthenticated token routes get the stricter
/// auth rate limit when limits are enabled; the guarded routes authenticate
/// through their extractors.
pub fn init_auth_router(rate_limit: &RateLimitConfig) -> anyhow::Result<Router<AppState>> {
    let mut public = Router::new()
        .route("/verifyToken", get(verify_token))
        .route("/createCustomToken", get(create_custom_token));

    if rate_limit.enabled {
        public = public.layer(GovernorLayer::new(rate_limit.auth_governor_config()?));
    }

    Ok(Router::new()
        .route("/getUserRole", get(get_user_role))
        .route("/setUserRole", get(set_user_role))
        .merge(public))
}
