use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Request, Response, StatusCode};
use tracing::warn;

use crate::AppState;
use crate::auth::{AuthError, DeviceIdentity, DeviceKeyVerifier, Identity, Verifier};
use crate::handlers::http::utils::headers::{get_api_key, get_authorization};
use crate::handlers::http::utils::json_response::{deliver_auth_error, deliver_error_json};
use crate::handlers::http::{admin, auth, devices, ingest, profile};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Four security tiers:
//
//   OpenHandler   — no auth.  Receives (req, state).
//                   Use for: /api/login, /api/register, /health.
//
//   UserHandler   — session token verified (signature + strict expiry).
//                   Receives (req, state, identity).
//                   Use for: everything a signed-in user does to their
//                   own resources.
//
//   AdminHandler  — session token verified, then the admin role required.
//                   Receives (req, state, identity).
//                   Use for: /api/admin/* management routes.
//
//   DeviceHandler — device API key resolved against the device registry.
//                   Receives (req, state, device).
//                   Use for: sensor ingest only.

type OpenHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        ) -> Pin<Box<dyn Future<Output = Result<Response<Full<Bytes>>>> + Send>>
        + Send
        + Sync,
>;

type UserHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            Identity, // verified by the router, never re-derived by handlers
        ) -> Pin<Box<dyn Future<Output = Result<Response<Full<Bytes>>>> + Send>>
        + Send
        + Sync,
>;

type DeviceHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            DeviceIdentity,
        ) -> Pin<Box<dyn Future<Output = Result<Response<Full<Bytes>>>> + Send>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(OpenHandler),

    /// Session auth: token signature + strict expiry.
    /// Handler receives the verified [`Identity`].
    User(UserHandler),

    /// Session auth plus the admin role. A valid token without the role
    /// is a 403, not a 401 — the caller is known, just not allowed.
    Admin(UserHandler),

    /// Device auth: API key resolved to a registered device.
    /// Handler receives the verified [`DeviceIdentity`].
    Device(DeviceHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn push<F, Fut>(mut self, method: Method, path: &str, tier: Tier, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        let boxed: UserHandler =
            Box::new(move |req, state, identity| Box::pin(handler(req, state, identity)));
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: match tier {
                Tier::User => RouteKind::User(boxed),
                Tier::Admin => RouteKind::Admin(boxed),
            },
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────

    /// GET with no authentication — health checks only.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// POST with no authentication — use only for login / register.
    pub fn post<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    // ── User tier (session token, caller acts on own resources) ──────────

    pub fn get_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::GET, path, Tier::User, handler)
    }

    pub fn post_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::POST, path, Tier::User, handler)
    }

    pub fn put_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::PUT, path, Tier::User, handler)
    }

    pub fn delete_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::DELETE, path, Tier::User, handler)
    }

    // ── Admin tier (session token + admin role, checked by the router) ───

    pub fn get_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::GET, path, Tier::Admin, handler)
    }

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::POST, path, Tier::Admin, handler)
    }

    pub fn put_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::PUT, path, Tier::Admin, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.push(Method::DELETE, path, Tier::Admin, handler)
    }

    // ── Device tier (API key) ─────────────────────────────────────────────

    pub fn post_device<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, DeviceIdentity) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Response<Full<Bytes>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Device(Box::new(move |req, state, device| {
                Box::pin(handler(req, state, device))
            })),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<Full<Bytes>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                // ── Open ──────────────────────────────────────────────────
                RouteKind::Open(h) => h(req, state).await,

                // ── User: session token verified by the router ────────────
                RouteKind::User(h) => {
                    let verified = state
                        .sessions
                        .verify(get_authorization(&req).as_deref())
                        .await;
                    match verified {
                        Ok(identity) => h(req, state, identity).await,
                        Err(err) => {
                            warn!("Session auth rejected {} {}: {}", method, path, err);
                            deliver_auth_error(&err)
                        }
                    }
                }

                // ── Admin: session token, then the role gate ──────────────
                RouteKind::Admin(h) => {
                    let verified = state
                        .sessions
                        .verify(get_authorization(&req).as_deref())
                        .await;
                    match verified {
                        Ok(identity) if identity.is_admin() => h(req, state, identity).await,
                        Ok(identity) => {
                            warn!(
                                "Admin route {} {} refused for user {} (role {})",
                                method, path, identity.user_id, identity.role
                            );
                            deliver_auth_error(&AuthError::InsufficientRole)
                        }
                        Err(err) => {
                            warn!("Session auth rejected {} {}: {}", method, path, err);
                            deliver_auth_error(&err)
                        }
                    }
                }

                // ── Device: API key resolved against the registry ─────────
                RouteKind::Device(h) => {
                    let verified = DeviceKeyVerifier::new(&state.db)
                        .verify(get_api_key(&req).as_deref())
                        .await;
                    match verified {
                        Ok(device) => h(req, state, device).await,
                        Err(err) => {
                            warn!("Device auth rejected {} {}: {}", method, path, err);
                            deliver_auth_error(&err)
                        }
                    }
                }
            };
        }

        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        // Exact match.
        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        // e.g.  "/api/devices/:device_id"  matches  "/api/devices/42"
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| r.starts_with(':') || r == p)
    }
}

enum Tier {
    User,
    Admin,
}

/// Pull the nth path segment as an i64 id. Segment 0 is the empty string
/// before the leading slash, so "/api/devices/42" has the id at index 3.
pub fn path_id(path: &str, index: usize) -> Option<i64> {
    path.split('?')
        .next()
        .unwrap_or(path)
        .split('/')
        .nth(index)
        .and_then(|s| s.parse::<i64>().ok())
}

fn bad_request(message: &str) -> Result<Response<Full<Bytes>>> {
    deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST).context("Bad request")
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level — handlers MUST NOT repeat
// the auth call.  The contract is:
//
//   .get(...) / .post(...)     → Open   — handler gets (req, state)
//   .*_user(...)               → User   — handler gets (req, state, identity)
//   .*_admin(...)              → Admin  — same, identity.is_admin() holds
//   .post_device(...)          → Device — handler gets (req, state, device)
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public: no auth ──────────────────────────────────────────────
        //
        // These are the only routes where auth is intentionally absent.
        .get("/health", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(Full::new(Bytes::from(r#"{"status":"success","health":"ok"}"#)))
                .context("Failed to build health response")?)
        })
        .post("/api/register", |req, state| async move {
            auth::handle_register(req, state)
                .await
                .context("Registration failed")
        })
        .post("/api/login", |req, state| async move {
            auth::handle_login(req, state).await.context("Login failed")
        })
        // ── User tier: the caller's own account and devices ──────────────
        .get_user("/api/user", |req, state, identity| async move {
            profile::handle_get_profile(req, state, identity)
                .await
                .context("Profile get failed")
        })
        .put_user("/api/user", |req, state, identity| async move {
            profile::handle_update_profile(req, state, identity)
                .await
                .context("Profile update failed")
        })
        .post_user("/api/user/password", |req, state, identity| async move {
            profile::handle_change_password(req, state, identity)
                .await
                .context("Password change failed")
        })
        .delete_user("/api/user", |req, state, identity| async move {
            profile::handle_delete_account(req, state, identity)
                .await
                .context("Account delete failed")
        })
        .post_user("/api/devices", |req, state, identity| async move {
            devices::handle_create_device(req, state, identity)
                .await
                .context("Device create failed")
        })
        .get_user("/api/devices", |req, state, identity| async move {
            devices::handle_list_devices(req, state, identity)
                .await
                .context("Device list failed")
        })
        .put_user(
            "/api/devices/:device_id",
            |req, state, identity| async move {
                match path_id(req.uri().path(), 3) {
                    Some(device_id) => {
                        devices::handle_update_device(req, state, identity, device_id)
                            .await
                            .context("Device update failed")
                    }
                    None => bad_request("Invalid device id"),
                }
            },
        )
        .delete_user(
            "/api/devices/:device_id",
            |req, state, identity| async move {
                match path_id(req.uri().path(), 3) {
                    Some(device_id) => {
                        devices::handle_delete_device(req, state, identity, device_id)
                            .await
                            .context("Device delete failed")
                    }
                    None => bad_request("Invalid device id"),
                }
            },
        )
        .get_user(
            "/api/devices/:device_id/readings",
            |req, state, identity| async move {
                match path_id(req.uri().path(), 3) {
                    Some(device_id) => {
                        devices::handle_get_readings(req, state, identity, device_id)
                            .await
                            .context("Readings fetch failed")
                    }
                    None => bad_request("Invalid device id"),
                }
            },
        )
        .delete_user(
            "/api/devices/:device_id/readings/:reading_id",
            |req, state, identity| async move {
                let path = req.uri().path();
                match (path_id(path, 3), path_id(path, 5)) {
                    (Some(device_id), Some(reading_id)) => {
                        devices::handle_delete_reading(req, state, identity, device_id, reading_id)
                            .await
                            .context("Reading delete failed")
                    }
                    _ => bad_request("Invalid device or reading id"),
                }
            },
        )
        // ── Device tier: sensor ingest only ──────────────────────────────
        //
        // The device id comes from the verified API key, never from the
        // body — a device can only ever write its own readings.
        .post_device("/api/ingest", |req, state, device| async move {
            ingest::handle_ingest(req, state, device)
                .await
                .context("Ingest failed")
        })
        // ── Admin tier: user and fleet management ────────────────────────
        .get_admin("/api/admin/users", |req, state, identity| async move {
            admin::handle_list_users(req, state, identity)
                .await
                .context("User list failed")
        })
        .post_admin("/api/admin/users", |req, state, identity| async move {
            admin::handle_create_user(req, state, identity)
                .await
                .context("User create failed")
        })
        .put_admin(
            "/api/admin/users/:user_id",
            |req, state, identity| async move {
                match path_id(req.uri().path(), 4) {
                    Some(user_id) => admin::handle_update_user(req, state, identity, user_id)
                        .await
                        .context("User update failed"),
                    None => bad_request("Invalid user id"),
                }
            },
        )
        .delete_admin(
            "/api/admin/users/:user_id",
            |req, state, identity| async move {
                match path_id(req.uri().path(), 4) {
                    Some(user_id) => admin::handle_delete_user(req, state, identity, user_id)
                        .await
                        .context("User delete failed"),
                    None => bad_request("Invalid user id"),
                }
            },
        )
        .get_admin("/api/admin/devices", |req, state, identity| async move {
            admin::handle_list_all_devices(req, state, identity)
                .await
                .context("Device list failed")
        })
        .post_admin("/api/admin/devices", |req, state, identity| async move {
            admin::handle_create_device_admin(req, state, identity)
                .await
                .context("Device create failed")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
