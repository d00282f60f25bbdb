pub mod aws;
pub mod list;
pub mod output;
pub mod report;
