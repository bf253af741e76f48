//! Record types for every exercise, split by domain.

pub mod account;
pub mod book;
pub mod budget;
pub mod common;
pub mod country;
pub mod expense;
pub mod file;
pub mod issue;
pub mod message;
pub mod note;
pub mod notification;
pub mod todo;
pub mod two_factor;
pub mod user;

pub use account::*;
pub use book::*;
pub use budget::*;
pub use common::*;
pub use country::*;
pub use expense::*;
pub use file::*;
pub use issue::*;
pub use message::*;
pub use note::*;
pub use notification::*;
pub use todo::*;
pub use two_factor::*;
pub use user::*;
