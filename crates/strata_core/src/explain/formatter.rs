use std::fmt;

use strata_error::{Result, ResultExt};

use super::node::ExplainNode;
use crate::logical::operator::LogicalOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplainFormat {
    #[default]
    Text,
    Json,
}

/// Render a plan for display.
pub fn format_plan(plan: &LogicalOperator, format: ExplainFormat, verbose: bool) -> Result<String> {
    let node = ExplainNode::new_from_logical_plan(verbose, plan);
    match format {
        ExplainFormat::Text => {
            let mut buf = String::new();
            write_text(&node, 0, &mut buf)?;
            Ok(buf)
        }
        ExplainFormat::Json => {
            serde_json::to_string_pretty(&node).context("Failed to serialize explain node")
        }
    }
}

/// Write the node as an indented tree, one entry per line.
pub(crate) fn write_text<W: fmt::Write>(
    node: &ExplainNode,
    indent: usize,
    w: &mut W,
) -> fmt::Result {
    writeln!(w, "{}{}", "  ".repeat(indent), node.entry)?;
    for child in &node.children {
        write_text(child, indent + 1, w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{self, lit};
    use crate::logical::builder::{filter, project, scan, single_row};

    #[test]
    fn text_includes_subqueries() {
        let inner = project(single_row(), vec![lit(1)]);
        let plan = filter(
            scan("mydb", "t1", &[("a", DataType::Int64)]),
            expr::eq(expr::col("a"), expr::subquery(inner)),
        );

        let out = format_plan(&plan, ExplainFormat::Text, false).unwrap();
        let expected = [
            "Filter (predicate = a = (SUBQUERY))",
            "  Scan (table = t1)",
            "  Subquery (cache_results = false)",
            "    Project (projections = [1])",
            "      SingleRow",
            "",
        ]
        .join("\n");
        assert_eq!(expected, out);
    }

    #[test]
    fn json_output() {
        let plan = project(single_row(), vec![lit(1)]);
        let out = format_plan(&plan, ExplainFormat::Json, false).unwrap();
        let node: ExplainNode = serde_json::from_str(&out).unwrap();
        assert_eq!("Project", node.entry.name);
        assert_eq!(1, node.children.len());
    }
}
