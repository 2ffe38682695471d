use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tessera_core::{AuthError, RequestContext};

use crate::auth::middleware::TicketUser;
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    if body.username.is_empty() {
        return Err(AppError::Auth("Username is required".to_string()));
    }

    // Password verification hashes; keep it off the async workers.
    let auth = state.auth.clone();
    let ticket = tokio::task::spawn_blocking(move || {
        let mut ctx = RequestContext::new();
        auth.authenticate(&mut ctx, &body.username, &body.password)
    })
    .await??;

    Ok(Json(TicketResponse { ticket }))
}

pub async fn guest_login(State(state): State<AppState>) -> Result<Json<TicketResponse>, AppError> {
    let mut ctx = RequestContext::new();
    let ticket = state.auth.authenticate_as_guest(&mut ctx)?;
    Ok(Json(TicketResponse { ticket }))
}

pub async fn validate_ticket(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let mut ctx = RequestContext::new();
    let user = state.auth.validate(&mut ctx, &ticket)?;
    Ok(Json(UserResponse { user }))
}

/// Logs out `ticket`. Callers may only end their own tickets unless they
/// are administrators.
pub async fn logout(
    mut user: TicketUser,
    State(state): State<AppState>,
    Path(ticket): Path<String>,
) -> Result<StatusCode, AppError> {
    let owner = match state.auth.tickets().get_authority_for_ticket(&ticket) {
        Ok(owner) => owner,
        Err(AuthError::TicketExpired) => {
            state.auth.invalidate_ticket(&mut user.ctx, &ticket);
            return Ok(StatusCode::NO_CONTENT);
        }
        Err(e) => return Err(e.into()),
    };

    if owner != user.user_name() && !state.auth.is_admin(user.user_name()) {
        return Err(AppError::NotFound("Ticket not found".to_string()));
    }

    state.auth.invalidate_ticket(&mut user.ctx, &ticket);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(user: TicketUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: user.user_name().to_string(),
        role: user.principal.role(),
        ticket: user.ctx.ticket().map(str::to_string),
    })
}

pub async fn new_ticket(
    mut user: TicketUser,
    State(state): State<AppState>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state.auth.get_new_ticket(&mut user.ctx)?;
    Ok(Json(TicketResponse { ticket }))
}
