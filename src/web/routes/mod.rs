pub mod admin_routes;
pub mod auth_routes;
