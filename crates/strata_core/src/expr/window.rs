use std::fmt;

use fmtutil::IntoDisplayableSlice;
use strata_error::{DbError, ErrorKind, Result};

use super::Expression;

/// The OVER clause of a window or aggregate call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<OrderByExpr>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expression,
    pub desc: bool,
    pub nulls_first: bool,
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.expr,
            if self.desc { "DESC" } else { "ASC" },
            if self.nulls_first {
                "NULLS FIRST"
            } else {
                "NULLS LAST"
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrameUnit {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowFrameBound {
    UnboundedPreceding,
    Preceding(Box<Expression>),
    CurrentRow,
    Following(Box<Expression>),
    UnboundedFollowing,
}

impl WindowFrameBound {
    /// Position of the bound relative to the current row, used to check that
    /// a frame's start doesn't come after its end.
    const fn rank(&self) -> u8 {
        match self {
            Self::UnboundedPreceding => 0,
            Self::Preceding(_) => 1,
            Self::CurrentRow => 2,
            Self::Following(_) => 3,
            Self::UnboundedFollowing => 4,
        }
    }

    fn expr(&self) -> Option<&Expression> {
        match self {
            Self::Preceding(e) | Self::Following(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    fn expr_mut(&mut self) -> Option<&mut Expression> {
        match self {
            Self::Preceding(e) | Self::Following(e) => Some(e.as_mut()),
            _ => None,
        }
    }
}

impl fmt::Display for WindowFrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundedPreceding => write!(f, "UNBOUNDED PRECEDING"),
            Self::Preceding(e) => write!(f, "{e} PRECEDING"),
            Self::CurrentRow => write!(f, "CURRENT ROW"),
            Self::Following(e) => write!(f, "{e} FOLLOWING"),
            Self::UnboundedFollowing => write!(f, "UNBOUNDED FOLLOWING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub unit: WindowFrameUnit,
    pub start: WindowFrameBound,
    pub end: WindowFrameBound,
}

impl WindowFrame {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.start, WindowFrameBound::UnboundedFollowing) {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                "Frame start cannot be UNBOUNDED FOLLOWING",
            ));
        }
        if matches!(self.end, WindowFrameBound::UnboundedPreceding) {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                "Frame end cannot be UNBOUNDED PRECEDING",
            ));
        }
        if self.start.rank() > self.end.rank() {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                "Frame starting from following row cannot end with current or preceding row",
            )
            .with_field("frame", self));
        }
        Ok(())
    }
}

impl fmt::Display for WindowFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            WindowFrameUnit::Rows => "ROWS",
            WindowFrameUnit::Range => "RANGE",
        };
        write!(f, "{unit} BETWEEN {} AND {}", self.start, self.end)
    }
}

impl WindowSpec {
    /// All expressions in the spec, in the order visited by `for_each_expr`.
    pub fn exprs(&self) -> Vec<&Expression> {
        let mut exprs: Vec<&Expression> = self.partition_by.iter().collect();
        exprs.extend(self.order_by.iter().map(|o| &o.expr));
        if let Some(frame) = &self.frame {
            exprs.extend(frame.start.expr());
            exprs.extend(frame.end.expr());
        }
        exprs
    }

    pub fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for expr in &self.partition_by {
            func(expr)?;
        }
        for order in &self.order_by {
            func(&order.expr)?;
        }
        if let Some(frame) = &self.frame {
            if let Some(expr) = frame.start.expr() {
                func(expr)?;
            }
            if let Some(expr) = frame.end.expr() {
                func(expr)?;
            }
        }
        Ok(())
    }

    pub fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for expr in &mut self.partition_by {
            func(expr)?;
        }
        for order in &mut self.order_by {
            func(&mut order.expr)?;
        }
        if let Some(frame) = &mut self.frame {
            if let Some(expr) = frame.start.expr_mut() {
                func(expr)?;
            }
            if let Some(expr) = frame.end.expr_mut() {
                func(expr)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            parts.push(format!(
                "PARTITION BY {}",
                self.partition_by.display_as_list()
            ));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.display_as_list()));
        }
        if let Some(frame) = &self.frame {
            parts.push(frame.to_string());
        }
        write!(f, "OVER ({})", parts.display_with_sep(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lit;

    fn frame(start: WindowFrameBound, end: WindowFrameBound) -> WindowFrame {
        WindowFrame {
            unit: WindowFrameUnit::Rows,
            start,
            end,
        }
    }

    #[test]
    fn valid_frames() {
        frame(
            WindowFrameBound::UnboundedPreceding,
            WindowFrameBound::CurrentRow,
        )
        .validate()
        .unwrap();
        frame(
            WindowFrameBound::Preceding(Box::new(lit(2))),
            WindowFrameBound::Following(Box::new(lit(2))),
        )
        .validate()
        .unwrap();
    }

    #[test]
    fn invalid_frames() {
        let err = frame(
            WindowFrameBound::UnboundedFollowing,
            WindowFrameBound::UnboundedFollowing,
        )
        .validate()
        .unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());

        let err = frame(
            WindowFrameBound::Following(Box::new(lit(1))),
            WindowFrameBound::CurrentRow,
        )
        .validate()
        .unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }

    #[test]
    fn display_spec() {
        let spec = WindowSpec {
            partition_by: vec![lit(1)],
            order_by: Vec::new(),
            frame: Some(frame(
                WindowFrameBound::UnboundedPreceding,
                WindowFrameBound::CurrentRow,
            )),
        };
        assert_eq!(
            "OVER (PARTITION BY 1 ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)",
            spec.to_string()
        );
    }
}
