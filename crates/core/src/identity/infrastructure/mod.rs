pub mod in_memory_repository;
pub mod json_file_repository;
