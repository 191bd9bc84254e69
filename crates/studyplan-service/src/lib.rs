mod blocking;
mod http;
mod local;
mod memory;
mod traits;

pub use blocking::BlockingHttpService;
pub use http::HttpService;
pub use local::LocalService;
pub use memory::MemoryStore;
pub use traits::{PlanService, ServiceError};
