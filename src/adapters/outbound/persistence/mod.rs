mod in_memory_object_repository;

pub use in_memory_object_repository::InMemoryObjectRepository;
