use serde::{Deserialize, Serialize};
use tessera_core::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: String,
    pub role: Role,
    pub ticket: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketStatsResponse {
    pub tickets: usize,
    pub live_tickets: usize,
    pub users: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct InvalidatedResponse {
    pub removed: usize,
}
