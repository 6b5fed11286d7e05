pub mod control;
pub mod instance;
pub mod source;
pub mod worker;

pub use control::{RunOutcome, WorkerControl};
pub use instance::Instance;
pub use source::Source;
pub use worker::{Worker, WorkerContext, WorkerFn};
