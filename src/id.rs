//! Ids for use in typed collections.

/// Index of a feature or action config in the toolchain's declaration order.
/// Comparing ids compares declaration positions.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectableId(u16);

impl From<SelectableId> for usize {
    fn from(id: SelectableId) -> usize {
        id.0 as usize
    }
}

impl From<usize> for SelectableId {
    fn from(val: usize) -> SelectableId {
        Self(val as u16)
    }
}
