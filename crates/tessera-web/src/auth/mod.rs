pub mod middleware;

/// Query parameter carrying a ticket.
pub const TICKET_PARAM: &str = "alf_ticket";

/// Header carrying a ticket.
pub const TICKET_HEADER: &str = "x-ticket";
