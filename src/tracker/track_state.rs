/// Lifecycle of a track inside [`SortTracker`](super::SortTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly created, waiting for enough consecutive hits
    #[default]
    Tentative,
    /// Reported as a real object
    Confirmed,
    /// Dropped; removed at the end of the update
    Deleted,
}
