//! Formatting helpers.

use std::fmt;

/// Display a slice of items as a comma separated list.
#[derive(Debug)]
pub struct DisplayableSlice<'a, T> {
    items: &'a [T],
    sep: &'a str,
}

impl<T: fmt::Display> fmt::Display for DisplayableSlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, item) in self.items.iter().enumerate() {
            if idx > 0 {
                write!(f, "{}", self.sep)?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

pub trait IntoDisplayableSlice<T> {
    /// Display as "a, b, c".
    fn display_as_list(&self) -> DisplayableSlice<'_, T>;

    fn display_with_sep<'a>(&'a self, sep: &'a str) -> DisplayableSlice<'a, T>;
}

impl<T: fmt::Display> IntoDisplayableSlice<T> for [T] {
    fn display_as_list(&self) -> DisplayableSlice<'_, T> {
        DisplayableSlice {
            items: self,
            sep: ", ",
        }
    }

    fn display_with_sep<'a>(&'a self, sep: &'a str) -> DisplayableSlice<'a, T> {
        DisplayableSlice { items: self, sep }
    }
}
