//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod author;
pub mod book;
pub mod user;
pub mod review;
pub mod patch;

pub use validation::ValidationError;
pub use author::AuthorName;
pub use book::{BookTitle, Isbn, Price, Stock};
pub use user::{Email, Password, Role, Username};
pub use review::{Comment, Rating};
pub use patch::double_option;
