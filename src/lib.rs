pub mod classifier;
pub mod cli;
pub mod directory;
pub mod report;
pub mod reporter;
pub mod util;
