pub mod dispatch_service;
pub mod error;
pub mod tanker_service;
pub mod triage_service;
pub mod village_service;

pub use dispatch_service::{DispatchError, DispatchService};
pub use error::ServiceError;
pub use tanker_service::TankerService;
pub use triage_service::TriageService;
pub use village_service::VillageService;
