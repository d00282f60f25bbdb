use clap::Args;

use crate::cli::commands::{aws::AwsArgs, output::OutputArgs};

/// List IAM users with their id, ARN, path and creation date
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub output_args: OutputArgs,

    #[command(flatten)]
    pub aws_args: AwsArgs,
}
