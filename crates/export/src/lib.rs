//! Export task planning: products × acquisition dates × images into an
//! auditable batch of unstarted tasks.

pub mod planner;
pub mod task;

pub use planner::ExportPlanner;
pub use task::ExportTask;
