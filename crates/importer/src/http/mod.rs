mod fetcher;
mod probe;
mod transport;

pub use fetcher::ResilientFetcher;
pub use probe::ReachabilityProbe;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResult};
