//! Page header

use dkh_core::Session;
use serde::Serialize;

/// Heading shown above the dashboard
pub const BRAND: &str = "Dhiman Kitchen House";

/// Sign-out control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignOutAction {
    /// Button label
    pub label: &'static str,
    /// Endpoint ending the session
    pub endpoint: &'static str,
    /// Page to show afterwards
    pub redirect: &'static str,
}

impl Default for SignOutAction {
    fn default() -> Self {
        Self {
            label: "Sign Out",
            endpoint: "/api/session",
            redirect: "/login",
        }
    }
}

/// Header model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavBar {
    /// Brand heading
    pub brand: &'static str,
    /// Operator email, when signed in with one
    pub operator_email: Option<String>,
    /// Present only while signed in
    pub sign_out: Option<SignOutAction>,
}

impl NavBar {
    /// Header for the given session
    pub fn from_session(session: Option<&Session>) -> Self {
        Self {
            brand: BRAND,
            operator_email: session.and_then(|s| s.email.clone()),
            sign_out: session.map(|_| SignOutAction::default()),
        }
    }
}
