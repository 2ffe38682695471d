use axum::extract::{Path, Query, State};
use axum::Json;

use crate::auth::middleware::AdminUser;
use crate::dto::*;
use crate::state::AppState;

pub async fn ticket_stats(_admin: AdminUser, State(state): State<AppState>) -> Json<TicketStatsResponse> {
    Json(TicketStatsResponse {
        tickets: state.auth.count_tickets(false),
        live_tickets: state.auth.count_tickets(true),
        users: state.auth.users_with_tickets(true).into_iter().collect(),
    })
}

/// Removes expired tickets, or every ticket with `?all=true`.
pub async fn invalidate_tickets(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Json<InvalidatedResponse> {
    let removed = state.auth.invalidate_tickets(!query.all);
    tracing::info!(
        "{} removed {removed} ticket(s) (all={})",
        tessera_core::mask_user_name(admin.user_name()),
        query.all
    );
    Json(InvalidatedResponse { removed })
}

pub async fn invalidate_sessions(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<InvalidatedResponse> {
    let removed = state.auth.invalidate_user_session(&user);
    Json(InvalidatedResponse { removed })
}
