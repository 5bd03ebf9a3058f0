pub mod ddl;
pub mod serve;
