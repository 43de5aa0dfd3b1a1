pub mod authors;
pub mod books;
pub mod borrowings;
pub mod categories;
pub mod health;
pub mod metrics;
pub mod token;
pub mod users;
