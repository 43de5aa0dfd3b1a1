use chrono::NaiveDate;

use common::{AuthorId, BookId, CategoryId, UserId};
use store::{BookUpdate, BorrowUpdate, NewBook};

use crate::error::{DomainError, Result};
use crate::input::{check_stock, parse_date, parse_opt_date, require};

use super::borrow::flag_and_date_agree;

/// Fields for a new book; foreign ids point into the author and category
/// domains and are peer-checked by the service before the insert.
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<String>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
}

impl CreateBook {
    pub(crate) fn validate(self) -> Result<NewBook> {
        require("title", &self.title)?;
        check_stock(self.total_stock, self.available_stock)?;
        let published_date = parse_opt_date("published_date", self.published_date.as_deref())?;

        Ok(NewBook {
            title: self.title,
            author_id: self.author_id,
            category_id: self.category_id,
            published_date,
            isbn: self.isbn,
            total_stock: self.total_stock,
            available_stock: self.available_stock,
        })
    }
}

/// Full-overwrite edit of an existing book.
#[derive(Debug, Clone)]
pub struct UpdateBook {
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<String>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
}

impl UpdateBook {
    pub(crate) fn validate(self) -> Result<BookUpdate> {
        require("title", &self.title)?;
        check_stock(self.total_stock, self.available_stock)?;
        let published_date = parse_opt_date("published_date", self.published_date.as_deref())?;

        Ok(BookUpdate {
            title: self.title,
            author_id: self.author_id,
            category_id: self.category_id,
            published_date,
            isbn: self.isbn,
            total_stock: self.total_stock,
            available_stock: self.available_stock,
        })
    }
}

/// A new loan: which book, which user, and when it is due back.
#[derive(Debug, Clone)]
pub struct CreateBorrow {
    pub book_id: BookId,
    pub user_id: UserId,
    pub due_date: String,
}

impl CreateBorrow {
    pub(crate) fn due_date(&self) -> Result<NaiveDate> {
        parse_date("due_date", &self.due_date)
    }
}

/// Full-overwrite edit of a borrowing. Never adjusts stock.
#[derive(Debug, Clone)]
pub struct UpdateBorrow {
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_date: String,
    pub due_date: String,
    pub returned_date: Option<String>,
    pub returned: bool,
}

impl UpdateBorrow {
    pub(crate) fn validate(self) -> Result<BorrowUpdate> {
        let borrowed_date = parse_date("borrowed_date", &self.borrowed_date)?;
        let due_date = parse_date("due_date", &self.due_date)?;
        let returned_date = parse_opt_date("returned_date", self.returned_date.as_deref())?;

        if !flag_and_date_agree(self.returned, returned_date.is_some()) {
            return Err(DomainError::InvalidInput(
                "returned flag and returned_date must be set together".to_string(),
            ));
        }

        Ok(BorrowUpdate {
            book_id: self.book_id,
            user_id: self.user_id,
            borrowed_date,
            due_date,
            returned_date,
            returned: self.returned,
        })
    }
}
