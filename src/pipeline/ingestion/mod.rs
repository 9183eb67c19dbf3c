// Pipeline ingestion: reading NLS key/value exports and register transcriptions

pub mod nls_reader;
pub mod register_reader;
