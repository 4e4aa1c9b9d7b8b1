pub mod keyword_db;
pub mod project_db;
pub mod result_db;
