use rusqlite::Connection;
use serde_json::json;

use crate::config::SecuritySettings;
use crate::db;
use crate::error::PortalError;

/// Settings key holding the admin session flag.
pub const SESSION_KEY: &str = "admin_session";
const SESSION_ACTIVE: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
        }
    }
}

/// Admin session state. Read from the workspace once when it opens, written on
/// login and logout. There is no expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    active: bool,
}

impl SessionContext {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        let flag = db::settings_get_json(conn, SESSION_KEY)?;
        Ok(SessionContext {
            active: flag.as_ref().and_then(|v| v.as_str()) == Some(SESSION_ACTIVE),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn view(&self) -> View {
        if self.active {
            View::Dashboard
        } else {
            View::Login
        }
    }

    pub fn login(
        &mut self,
        conn: &Connection,
        user_id: &str,
        password: &str,
        security: &SecuritySettings,
    ) -> Result<(), PortalError> {
        if user_id.trim() != security.admin_user_id || password != security.admin_password {
            return Err(PortalError::validation(
                "invalid_credentials",
                "Invalid credentials. Please try again.",
            ));
        }
        db::settings_set_json(conn, SESSION_KEY, &json!(SESSION_ACTIVE))
            .map_err(PortalError::Workspace)?;
        self.active = true;
        Ok(())
    }

    pub fn logout(&mut self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_delete(conn, SESSION_KEY)?;
        self.active = false;
        Ok(())
    }
}
