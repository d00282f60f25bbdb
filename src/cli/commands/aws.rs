use std::path::PathBuf;

use clap::{Args, ValueHint};

/// Options controlling how the AWS SDK is configured
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "AWS Options")]
pub struct AwsArgs {
    /// Named profile from the shared AWS config files
    #[arg(long, env = "AWS_PROFILE", value_name = "NAME")]
    pub profile: Option<String>,

    /// Region used to sign IAM requests (defaults to the configured region, then us-east-1)
    #[arg(long, env = "AWS_REGION", value_name = "REGION")]
    pub region: Option<String>,

    /// Send IAM requests to this endpoint instead of the AWS default
    #[arg(long, value_name = "URL", value_hint = ValueHint::Url)]
    pub endpoint_url: Option<String>,

    /// Read static credentials from a JSON or `key = value` file
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub credential_path: Option<PathBuf>,
}
