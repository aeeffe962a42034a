/// Admin PIN verification and signed admin tokens.
pub mod admin_auth;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming for TV displays.
pub mod sse_service;
/// TV popup queue operations.
pub mod tv_service;
