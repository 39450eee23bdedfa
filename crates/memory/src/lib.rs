//! In-memory adapters for the engine ports.

#![forbid(unsafe_code)]

mod in_memory_crud_service;
mod in_memory_parameter_repository;

pub use in_memory_crud_service::InMemoryCrudService;
pub use in_memory_parameter_repository::InMemoryParameterRepository;
