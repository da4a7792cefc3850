use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // account ID
    pub username: String, // snapshot at issue time
    pub is_admin: bool,   // snapshot at issue time
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}

/// Who is calling, as asserted by a verified token.
///
/// The fields reflect the account at issue time; they are not re-read from
/// the store, so a demoted admin keeps admin rights until the token expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl Identity {
    /// The single admin gate used by every privileged operation.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            account_id: c.sub,
            username: c.username,
            is_admin: c.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_admin_gates_on_flag() {
        let mut identity = Identity {
            account_id: Uuid::new_v4(),
            username: "alice".into(),
            is_admin: false,
        };
        assert!(matches!(identity.require_admin(), Err(AppError::Forbidden)));
        identity.is_admin = true;
        assert!(identity.require_admin().is_ok());
    }
}
