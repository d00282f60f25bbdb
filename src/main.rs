use anyhow::{Context, Result};
use iam_user_report::{
    cli::{global::Command, CommandLineArgs, GlobalArgs},
    report,
};
use tokio::runtime::Builder;
use tracing::debug;
use tracing_core::metadata::LevelFilter;
use tracing_subscriber::{
    self, fmt, prelude::__tracing_subscriber_SubscriberExt, registry, util::SubscriberInitExt,
};

fn main() -> Result<()> {
    color_backtrace::install();
    let args = CommandLineArgs::parse_args();

    // Lookups run one at a time, so a small runtime is plenty.
    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;
    runtime.block_on(async_main(args))
}

fn setup_logging(global_args: &GlobalArgs) {
    let level = LevelFilter::from_level(global_args.log_level());
    // `-vvv` or more opens up every target, including the AWS SDK
    let all_targets = !global_args.quiet && global_args.verbose > 2;

    let filter = if all_targets {
        tracing_subscriber::filter::Targets::new().with_default(LevelFilter::TRACE)
    } else {
        tracing_subscriber::filter::Targets::new()
            .with_default(LevelFilter::ERROR)
            .with_target("iam_user_report", level)
    };
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .without_time();
    registry().with(fmt_layer).with(filter).init();
}

async fn async_main(args: CommandLineArgs) -> Result<()> {
    setup_logging(&args.global_args);
    debug!("Parsed arguments: {args:?}");

    match &args.command {
        Command::Report(report_args) => report::run(&args.global_args, report_args).await,
        Command::List(list_args) => report::list(&args.global_args, list_args).await,
    }
}
