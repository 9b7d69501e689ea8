// SPDX-License-Identifier: MIT OR Apache-2.0
//! Presentation state shared by nodes, ports and connectors.

/// How strongly an element is drawn. Selection dominates hover highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    /// Drawn normally
    #[default]
    Normal,
    /// Hovered (directly or through a related element)
    Highlighted,
    /// Part of the current selection
    Selected,
}

impl Emphasis {
    /// Mark as selected
    pub fn select(&mut self) {
        *self = Self::Selected;
    }

    /// Drop selection (also clears any highlight)
    pub fn unselect(&mut self) {
        *self = Self::Normal;
    }

    /// Highlight, unless selected
    pub fn highlight(&mut self) {
        if *self != Self::Selected {
            *self = Self::Highlighted;
        }
    }

    /// Remove highlight, unless selected
    pub fn unhighlight(&mut self) {
        if *self != Self::Selected {
            *self = Self::Normal;
        }
    }

    /// Whether selected
    pub fn is_selected(self) -> bool {
        self == Self::Selected
    }

    /// Whether highlighted (and not selected)
    pub fn is_highlighted(self) -> bool {
        self == Self::Highlighted
    }
}
