use crate::aggregate::UpstreamClient;

/// State shared by every request handler.
pub struct ServiceState {
    /// Client for the timetable service
    pub upstream: UpstreamClient,
}
