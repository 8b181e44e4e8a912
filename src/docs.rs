use classbase_core::ErrorResponse;
use classbase_models::{CreateUserDto, CreatedUser, IdTokenResponse, MessageResponse, UpdateUserDto};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::health,
        crate::modules::auth::controller::verify_token,
        crate::modules::auth::controller::create_custom_token,
        crate::modules::auth::controller::get_user_role,
        crate::modules::auth::controller::set_user_role,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::get_all_users,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            IdTokenResponse,
            MessageResponse,
            CreateUserDto,
            UpdateUserDto,
            CreatedUser,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "ID token verification, custom tokens and roles"),
        (name = "Users", description = "User management endpoints"),
        (name = "Health", description = "Service health")
    ),
    info(
        title = "Classbase API",
        version = "0.1.0",
        description = "User and role management for Classbase, backed by Firebase Authentication and Cloud Firestore.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("Firebase ID token")
                        .build(),
                ),
            )
        }
    }
}
