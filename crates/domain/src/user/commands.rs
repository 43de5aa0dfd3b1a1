use store::NewUser;

use crate::error::Result;
use crate::input::require;

/// Registration request. `credential_hash` arrives pre-hashed from the
/// translation layer; this domain never sees a raw password.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub credential_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
}

impl RegisterUser {
    pub(crate) fn validate(self) -> Result<NewUser> {
        require("username", &self.username)?;
        require("credential_hash", &self.credential_hash)?;
        require("email", &self.email)?;
        require("role", &self.role)?;

        Ok(NewUser {
            username: self.username,
            credential_hash: self.credential_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role: self.role,
        })
    }
}
