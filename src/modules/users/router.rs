use axum::{Router, middleware, routing::get};

use crate::middleware::auth::require_auth;
use crate::modules::users::controller::{
    create_user, delete_user, get_all_users, get_user, update_user,
};
use crate::state::AppState;

/// `/users` routes, all behind [`require_auth`].
pub fn init_users_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_users).post(create_user))
        .route("/{uid}", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
