pub mod builder;
pub mod logical_alias;
pub mod logical_cache;
pub mod logical_filter;
pub mod logical_join;
pub mod logical_passthrough;
pub mod logical_project;
pub mod logical_scan;
pub mod logical_single_row;
pub mod logical_table_function;
pub mod logical_trigger;
pub mod operator;
pub mod schema;
