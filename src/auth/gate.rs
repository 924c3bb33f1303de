//! Route gating: decide whether a page renders or redirects based on the
//! current session.

use tracing::debug;

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Unknown paths fall back to the landing page.
    pub fn from_path(path: &str) -> Self {
        match path.trim().trim_end_matches('/') {
            "/login" | "login" => Route::Login,
            "/signup" | "signup" => Route::Signup,
            "/dashboard" | "dashboard" => Route::Dashboard,
            _ => Route::Landing,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Render(Route),
    Redirect(Route),
}

/// Message shown when the dashboard bounces an anonymous visitor.
pub const SIGN_IN_REQUIRED: &str = "Please sign in to continue";

/// Any session lookup failure counts as signed out.
pub async fn guard(backend: &dyn Backend, route: Route) -> Gate {
    let signed_in = match backend.get_session().await {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "no active session");
            false
        }
    };

    match route {
        Route::Dashboard if !signed_in => Gate::Redirect(Route::Login),
        Route::Login | Route::Signup if signed_in => Gate::Redirect(Route::Dashboard),
        other => Gate::Render(other),
    }
}
