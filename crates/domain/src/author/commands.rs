use store::{AuthorUpdate, NewAuthor};

use crate::error::Result;
use crate::input::{parse_opt_date, require};

/// Fields for a new author; dates arrive as `YYYY-MM-DD` strings.
#[derive(Debug, Clone)]
pub struct CreateAuthor {
    pub name: String,
    pub birthdate: Option<String>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

impl CreateAuthor {
    pub(crate) fn validate(self) -> Result<NewAuthor> {
        require("name", &self.name)?;
        let birthdate = parse_opt_date("birthdate", self.birthdate.as_deref())?;

        Ok(NewAuthor {
            name: self.name,
            birthdate,
            nationality: self.nationality,
            biography: self.biography,
        })
    }
}

/// Full-overwrite edit of an existing author.
#[derive(Debug, Clone)]
pub struct UpdateAuthor {
    pub name: String,
    pub birthdate: Option<String>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

impl UpdateAuthor {
    pub(crate) fn validate(self) -> Result<AuthorUpdate> {
        require("name", &self.name)?;
        let birthdate = parse_opt_date("birthdate", self.birthdate.as_deref())?;

        Ok(AuthorUpdate {
            name: self.name,
            birthdate,
            nationality: self.nationality,
            biography: self.biography,
        })
    }
}
