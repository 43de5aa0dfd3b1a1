use store::{CategoryUpdate, NewCategory};

use crate::error::Result;
use crate::input::require;

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

impl CreateCategory {
    pub(crate) fn validate(self) -> Result<NewCategory> {
        require("name", &self.name)?;

        Ok(NewCategory {
            name: self.name,
            description: self.description,
        })
    }
}

/// Full-overwrite edit of an existing category.
#[derive(Debug, Clone)]
pub struct UpdateCategory {
    pub name: String,
    pub description: Option<String>,
}

impl UpdateCategory {
    pub(crate) fn validate(self) -> Result<CategoryUpdate> {
        require("name", &self.name)?;

        Ok(CategoryUpdate {
            name: self.name,
            description: self.description,
        })
    }
}
