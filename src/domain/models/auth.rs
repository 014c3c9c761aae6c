use serde::{Deserialize, Serialize};
use crate::domain::models::user::Role;
use crate::error::AppError;

/// Access-token claims minted by the identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// The authenticated caller, as vouched for by the identity service.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.is(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Acceso denegado".into()))
        }
    }
}
