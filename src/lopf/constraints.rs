//! Extra linear constraints appended to the LOPF on request.

use std::fmt;

use crate::network::ComponentKind;

/// Refers to the nominal capacity of one component (`p_nom`, `e_nom` or `s_nom`).
#[derive(Debug, Clone, PartialEq)]
pub struct NominalRef {
    pub kind: ComponentKind,
    pub name: String,
}

impl NominalRef {
    pub fn generator(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Generator,
            name: name.into(),
        }
    }

    pub fn storage_unit(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::StorageUnit,
            name: name.into(),
        }
    }

    pub fn link(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Link,
            name: name.into(),
        }
    }

    pub fn store(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Store,
            name: name.into(),
        }
    }

    pub fn line(name: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Line,
            name: name.into(),
        }
    }
}

impl fmt::Display for NominalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// A constraint beyond the standard LOPF formulation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraConstraint {
    /// `nom(lhs) == ratio * nom(rhs)`.
    ///
    /// Either side may be a non-extendable component, in which case its fixed
    /// nominal value enters as a constant.
    NominalRatio {
        lhs: NominalRef,
        rhs: NominalRef,
        ratio: f64,
    },
}

impl fmt::Display for ExtraConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraConstraint::NominalRatio { lhs, rhs, ratio } => {
                write!(f, "nom({lhs}) = {ratio} * nom({rhs})")
            }
        }
    }
}
