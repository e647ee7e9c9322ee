pub mod csv_file;
pub mod memory;

pub use csv_file::CsvStorage;
pub use memory::MemoryStorage;
