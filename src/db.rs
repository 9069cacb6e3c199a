pub mod error;
pub mod memory;
pub mod models;
pub mod reading_repository;
pub mod store;
pub mod stores;
pub mod tanker_repository;
pub mod village_repository;

pub use error::DbError;
pub use memory::InMemoryStore;
pub use models::*;
pub use reading_repository::ReadingRepository;
pub use store::{ReadingStore, TankerStore, VillageStore};
pub use stores::Stores;
pub use tanker_repository::TankerRepository;
pub use village_repository::VillageRepository;
