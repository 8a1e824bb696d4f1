//! Tree rewrite primitives.
//!
//! Every rewrite returns the new tree alongside a `TreeIdentity` indicating
//! if anything changed. A `Same` result always carries the input tree (the
//! same `Arc` for plans), which lets callers detect a fixed point without
//! comparing trees.

pub mod expr;
pub mod inspect;
pub mod plan;

use strata_error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeIdentity {
    Same,
    Changed,
}

impl TreeIdentity {
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    /// Combine two identities, `Changed` if either is.
    pub const fn merge(self, other: TreeIdentity) -> TreeIdentity {
        match (self, other) {
            (Self::Same, Self::Same) => Self::Same,
            _ => Self::Changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub data: T,
    pub identity: TreeIdentity,
}

impl<T> Transformed<T> {
    pub const fn new(data: T, identity: TreeIdentity) -> Self {
        Transformed { data, identity }
    }

    pub const fn same(data: T) -> Self {
        Self::new(data, TreeIdentity::Same)
    }

    pub const fn changed(data: T) -> Self {
        Self::new(data, TreeIdentity::Changed)
    }

    pub const fn is_changed(&self) -> bool {
        self.identity.is_changed()
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map_data<U, F>(self, f: F) -> Transformed<U>
    where
        F: FnOnce(T) -> U,
    {
        Transformed::new(f(self.data), self.identity)
    }

    /// Apply another rewrite to the data, merging identities.
    pub fn and_then<F>(self, f: F) -> Result<Transformed<T>>
    where
        F: FnOnce(T) -> Result<Transformed<T>>,
    {
        let next = f(self.data)?;
        Ok(Transformed::new(next.data, self.identity.merge(next.identity)))
    }
}
