mod admin;
mod login_handlers;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Credential-accepting routes. `main` puts the rate limiter on these.
pub fn login_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handlers::login))
        .route("/login/guest", post(login_handlers::guest_login))
}

/// Routes that work on tickets.
pub fn ticket_router() -> Router<AppState> {
    Router::new()
        .route(
            "/login/ticket/{ticket}",
            get(login_handlers::validate_ticket).delete(login_handlers::logout),
        )
        .route("/session", get(login_handlers::session))
        .route("/session/ticket", post(login_handlers::new_ticket))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/tickets",
            get(admin::ticket_stats).delete(admin::invalidate_tickets),
        )
        .route("/admin/sessions/{user}", delete(admin::invalidate_sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tessera_core::{CompositePasswordEncoder, Encoding};
    use tower::ServiceExt;

    use crate::config::{ServerConfig, UserConfig};

    fn user(name: &str, password: &str) -> UserConfig {
        let hashed = CompositePasswordEncoder::new(Encoding::Sha256)
            .encode_chain(&[Encoding::Sha256], password, "salt")
            .unwrap();
        UserConfig {
            username: name.to_string(),
            password_hash: hashed.hash,
            encodings: hashed.encodings,
            salt: hashed.salt,
            enabled: true,
        }
    }

    fn app_with(config: ServerConfig) -> Router {
        Router::new()
            .nest(
                "/api",
                login_router().merge(ticket_router()).merge(admin_router()),
            )
            .with_state(AppState::new(&config))
    }

    fn app() -> Router {
        let mut config = ServerConfig::default();
        config.auth.password.preferred_encoding = Encoding::Sha256;
        config.users = vec![user("andy", "auth1"), user("admin", "admin")];
        app_with(config)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_request(username: &str, password: &str) -> Request<Body> {
        Request::post("/api/login")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let response = send(app, login_request(username, password)).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["ticket"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn get_with_ticket(uri: &str, ticket: &str) -> Request<Body> {
        Request::get(uri)
            .header("x-ticket", ticket)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn login_and_validate() {
        let app = app();
        let ticket = login(&app, "andy", "auth1").await;
        assert!(ticket.starts_with("TICKET_"));

        let response = send(
            &app,
            Request::get(format!("/api/login/ticket/{ticket}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["user"], "andy");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = app();
        let response = send(&app, login_request("andy", "wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Invalid credentials");

        let response = send(&app, login_request("nobody", "auth1")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_ticket_is_unauthorized() {
        let app = app();
        let response = send(
            &app,
            Request::get("/api/login/ticket/TICKET_bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_from_query_or_header() {
        let app = app();
        let ticket = login(&app, "andy", "auth1").await;

        let response = send(
            &app,
            Request::get(format!("/api/session?alf_ticket={ticket}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"], "andy");
        assert_eq!(body["role"], "user");
        assert_eq!(body["ticket"], ticket.as_str());

        let response = send(&app, get_with_ticket("/api/session", &ticket)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            Request::get("/api/session").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn new_ticket_reuses_live_ticket() {
        let app = app();
        let ticket = login(&app, "andy", "auth1").await;

        let response = send(
            &app,
            Request::post("/api/session/ticket")
                .header("x-ticket", &ticket)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ticket"], ticket.as_str());
    }

    #[tokio::test]
    async fn logout_invalidates() {
        let app = app();
        let ticket = login(&app, "andy", "auth1").await;

        let response = send(
            &app,
            Request::delete(format!("/api/login/ticket/{ticket}"))
                .header("x-ticket", &ticket)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, get_with_ticket("/api/session", &ticket)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cannot_log_out_someone_else() {
        let app = app();
        let andy = login(&app, "andy", "auth1").await;
        let guest = body_json(
            send(
                &app,
                Request::post("/api/login/guest").body(Body::empty()).unwrap(),
            )
            .await,
        )
        .await["ticket"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Request::delete(format!("/api/login/ticket/{andy}"))
                .header("x-ticket", &guest)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, get_with_ticket("/api/session", &andy)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn guest_login_gets_guest_role() {
        let app = app();
        let response = send(
            &app,
            Request::post("/api/login/guest").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let ticket = body_json(response).await["ticket"]
            .as_str()
            .unwrap()
            .to_string();

        let body = body_json(send(&app, get_with_ticket("/api/session", &ticket)).await).await;
        assert_eq!(body["user"], "guest");
        assert_eq!(body["role"], "guest");
    }

    #[tokio::test]
    async fn admin_routes_require_admin() {
        let app = app();
        let andy = login(&app, "andy", "auth1").await;
        let admin = login(&app, "admin", "admin").await;

        let response = send(&app, get_with_ticket("/api/admin/tickets", &andy)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, get_with_ticket("/api/admin/tickets", &admin)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["tickets"], 2);
        assert_eq!(body["users"], json!(["admin", "andy"]));
    }

    #[tokio::test]
    async fn admin_ends_user_sessions() {
        let app = app();
        let andy = login(&app, "andy", "auth1").await;
        let admin = login(&app, "admin", "admin").await;

        let response = send(
            &app,
            Request::delete("/api/admin/sessions/andy")
                .header("x-ticket", &admin)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["removed"], 1);

        let response = send(&app, get_with_ticket("/api/session", &andy)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_clears_all_tickets() {
        let app = app();
        login(&app, "andy", "auth1").await;
        let admin = login(&app, "admin", "admin").await;

        let response = send(
            &app,
            Request::delete("/api/admin/tickets?all=true")
                .header("x-ticket", &admin)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["removed"], 2);
    }

    #[tokio::test]
    async fn allow_list_is_forbidden() {
        let mut config = ServerConfig::default();
        config.auth.password.preferred_encoding = Encoding::Sha256;
        config.auth.admission.allowed_users = Some(vec!["admin".to_string()]);
        config.users = vec![user("andy", "auth1"), user("admin", "admin")];
        let app = app_with(config);

        let response = send(&app, login_request("andy", "auth1")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        login(&app, "admin", "admin").await;
    }
}
