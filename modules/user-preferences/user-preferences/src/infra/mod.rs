pub mod storage;

pub use storage::memory_repo::InMemoryIdentityRepository;
