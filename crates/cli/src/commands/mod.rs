//! Command handlers for the Petpal CLI.

pub mod ask;
pub mod clear;
pub mod serve;
pub mod stats;
pub mod train;

pub use ask::AskCommand;
pub use clear::ClearCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
pub use train::TrainCommand;
