pub mod connection;
pub mod library;
pub mod models;
pub mod query;

pub use connection::Database;
pub use library::{LibraryLevel, SongLibrary};
pub use models::LevelRow;
