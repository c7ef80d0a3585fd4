//! Pending piece selection for square-based games.

use std::collections::BTreeSet;

/// What the local player has picked so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<Sq> {
    #[default]
    None,
    /// A piece is picked; `candidates` are its advisory destinations.
    Picking {
        origin: Sq,
        candidates: BTreeSet<Sq>,
    },
    /// A promoting move waits for the piece choice.
    Promoting { from: Sq, to: Sq },
}

impl<Sq: Ord> Selection<Sq> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn origin(&self) -> Option<&Sq> {
        match self {
            Self::Picking { origin, .. } => Some(origin),
            Self::Promoting { from, .. } => Some(from),
            Self::None => None,
        }
    }

    /// Whether `square` is a highlighted destination.
    pub fn is_candidate(&self, square: &Sq) -> bool {
        matches!(self, Self::Picking { candidates, .. } if candidates.contains(square))
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }
}
