//! Durable item state
//!
//! One row per observed item id holding its last known version. The store
//! outlives the process; losing it would make every item look new again.

pub mod repository;

pub use repository::{
    create_mock_repository, create_sqlite_repository, ItemRepository, MockItemRepository,
    SharedItemRepository, SqliteItemRepository,
};
