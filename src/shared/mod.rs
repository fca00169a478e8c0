pub mod clock;
pub mod errors;
pub mod shutdown;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{AppError, DomainError, ErrorKind, InfraError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
