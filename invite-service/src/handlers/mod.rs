pub mod invite_handlers;

// GET /health
pub async fn health() -> &'static str {
    "ok"
}
