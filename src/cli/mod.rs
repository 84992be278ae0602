pub mod bulk;
pub mod clean_ids;
pub mod export_sql;
pub mod extract;
pub mod import;
pub mod sync;
pub mod verify;
