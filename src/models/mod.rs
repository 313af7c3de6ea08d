//! Data models for Shelfy

pub mod book;
pub mod borrow;
pub mod enums;

// Re-export commonly used types
pub use book::{Book, BookListQuery, BookPatch, NewBook, Pagination};
pub use borrow::{Borrow, Borrowed, BorrowedSummary, NewBorrow};
pub use enums::Genre;
