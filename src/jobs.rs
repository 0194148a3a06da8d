pub mod job_client;
pub mod job_item;
pub mod job_record;
pub mod operation_router;
pub mod pause_state;

pub use job_item::{JobDefinition, JobItem};
pub use operation_router::{JobOperationRouter, Operation, OperationError, Outcome};
pub use pause_state::{PauseState, RecurringJobSummary};
