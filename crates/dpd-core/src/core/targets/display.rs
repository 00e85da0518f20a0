/// Outbound collaborator that maps bead types to their on-screen appearance.
///
/// When a target's beads are retyped, the new type has no display entry of its
/// own yet; the collaborator is told which existing type it was derived from.
pub trait DisplayMapping {
    fn map_new_type(&mut self, new_type: usize, source_type: usize);
}

/// A display mapping that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayMapping for NullDisplay {
    fn map_new_type(&mut self, _new_type: usize, _source_type: usize) {}
}

/// Records notifications in order; useful for batch runs that dump the mapping
/// at the end and for tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordedDisplay {
    pub mappings: Vec<(usize, usize)>,
}

impl DisplayMapping for RecordedDisplay {
    fn map_new_type(&mut self, new_type: usize, source_type: usize) {
        self.mappings.push((new_type, source_type));
    }
}
