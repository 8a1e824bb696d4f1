//! Shared fixtures for analyzer tests.

use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::arrays::datatype::DataType;
use crate::catalog::TableEntry;
use crate::catalog::memory::{MemoryCatalog, MemoryDatabase};
use crate::catalog::privileged::PrivilegedDatabase;
use crate::config::AnalyzerConfig;

/// Catalog with builtin functions and three databases:
///
/// - `mydb`: supports triggers, tables `t1(a, b)`, `t2(c, d)`, `people(id, name)`
/// - `nodb`: no trigger support, table `t1(a, b)`
/// - `privdb`: only `t1` visible, `secret` hidden
pub fn test_catalog() -> MemoryCatalog {
    let catalog = MemoryCatalog::with_builtins().unwrap();

    let mydb = MemoryDatabase::new("mydb");
    mydb.create_table(TableEntry::new("t1", [("a", DataType::Int64), ("b", DataType::Utf8)]))
        .unwrap();
    mydb.create_table(TableEntry::new("t2", [("c", DataType::Int64), ("d", DataType::Utf8)]))
        .unwrap();
    mydb.create_table(TableEntry::new(
        "people",
        [("id", DataType::Int64), ("name", DataType::Utf8)],
    ))
    .unwrap();
    catalog.register_database(Arc::new(mydb)).unwrap();

    let nodb = MemoryDatabase::without_triggers("nodb");
    nodb.create_table(TableEntry::new("t1", [("a", DataType::Int64), ("b", DataType::Utf8)]))
        .unwrap();
    catalog.register_database(Arc::new(nodb)).unwrap();

    let privdb = MemoryDatabase::new("privdb");
    privdb
        .create_table(TableEntry::new("t1", [("a", DataType::Int64)]))
        .unwrap();
    privdb
        .create_table(TableEntry::new("secret", [("s", DataType::Utf8)]))
        .unwrap();
    let privdb = PrivilegedDatabase::new(Arc::new(privdb)).with_allowed_tables(["t1"]);
    catalog.register_database(Arc::new(privdb)).unwrap();

    catalog
}

pub fn test_analyzer() -> Analyzer {
    test_analyzer_with_catalog(Arc::new(test_catalog()))
}

pub fn test_analyzer_with_catalog(catalog: Arc<MemoryCatalog>) -> Analyzer {
    Analyzer::new(catalog, AnalyzerConfig::default())
}

/// Context for a top-level statement against `mydb`.
pub fn test_context() -> AnalysisContext {
    AnalysisContext::new("mydb")
}
