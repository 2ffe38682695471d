use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tessera_core::{Principal, RequestContext};

use super::{TICKET_HEADER, TICKET_PARAM};
use crate::error::AppError;
use crate::state::AppState;

/// The caller identified by a presented ticket.
///
/// Extraction validates the ticket, so a sliding ticket is refreshed and a
/// one-off ticket is consumed by the request that presents it.
pub struct TicketUser {
    pub principal: Principal,
    pub ctx: RequestContext,
}

impl TicketUser {
    pub fn user_name(&self) -> &str {
        self.principal.user_name()
    }
}

/// Ticket from the `alf_ticket` query parameter, else the `x-ticket` header.
fn presented_ticket(parts: &Parts) -> Option<String> {
    let from_query = parts.uri.query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == TICKET_PARAM && !value.is_empty()).then(|| value.to_string())
        })
    });

    from_query.or_else(|| {
        parts
            .headers
            .get(TICKET_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    })
}

impl FromRequestParts<AppState> for TicketUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ticket = presented_ticket(parts)
            .ok_or_else(|| AppError::Auth("Missing ticket".to_string()))?;

        let mut ctx = RequestContext::new();
        state.auth.validate(&mut ctx, &ticket)?;
        let principal = ctx
            .principal()
            .cloned()
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        Ok(TicketUser { principal, ctx })
    }
}

/// A [`TicketUser`] whose name is one of the default administrators.
pub struct AdminUser(pub TicketUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = TicketUser::from_request_parts(parts, state).await?;
        if !state.auth.is_admin(user.user_name()) {
            tracing::warn!(
                "Admin access denied for {}",
                tessera_core::mask_user_name(user.user_name())
            );
            return Err(AppError::Forbidden("Administrator required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
