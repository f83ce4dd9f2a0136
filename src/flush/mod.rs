mod csv;
mod jsonl;

pub use csv::{HEADER as CSV_HEADER, export_file_name, export_plan, write_plan_csv};
pub use jsonl::dump_collections;
