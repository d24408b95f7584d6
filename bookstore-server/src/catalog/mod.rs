//! Resource managers - the catalog's integrity rules
//!
//! One manager per resource, each borrowing a [`Store`](crate::db::Store).
//! Managers run the existence and uniqueness pre-checks that give callers
//! precise errors, then issue the write. The store's own constraints still
//! catch anything a concurrent request slips in between.

pub mod authors;
pub mod books;
pub mod reviews;
pub mod users;

pub use authors::{AuthorPatch, Authors};
pub use books::Books;
pub use reviews::{ReviewPatch, Reviews};
pub use users::{UserPatch, Users};
