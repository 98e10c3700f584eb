pub mod crops;
pub mod field;
pub mod ingest;
pub mod status;
pub mod vehicles;
