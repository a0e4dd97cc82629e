//! Core types for gantry

use std::fmt;

/// Which version component a bump advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpKind {
    /// Breaking release: x+1.0.0
    Major,
    /// Feature release: x.y+1.0
    Minor,
    /// Fix release: x.y.z+1
    Patch,
}

impl Default for BumpKind {
    fn default() -> Self {
        Self::Patch
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}
