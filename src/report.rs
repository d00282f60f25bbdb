use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{
    classifier::{Classifier, Principal, ReportRecord},
    cli::{
        commands::{list::ListArgs, report::ReportArgs},
        global::GlobalArgs,
    },
    directory::{
        aws::{load_config, AwsDirectory},
        gather_facts, IdentityDirectory,
    },
    reporter,
    util::Counted,
};

/// `report`: classify every user, print the table and optionally export it.
pub async fn run(global_args: &GlobalArgs, args: &ReportArgs) -> Result<()> {
    let config = load_config(&args.aws_args).await?;
    let directory = AwsDirectory::new(&config);
    let classifier = Classifier::new(Utc::now()).inactivity_days(args.inactivity_days);

    let progress = progress_bar(global_args, "Classifying IAM users");
    let records = build_report(&directory, &classifier, &progress).await;
    progress.finish_and_clear();
    let records = records?;

    reporter::run(global_args, &records, &args.output_args)?;
    if let Some(path) = &args.xlsx_out {
        reporter::export_xlsx(&records, path)?;
    }
    Ok(())
}

/// `list`: print every user without the per-user lookups.
pub async fn list(global_args: &GlobalArgs, args: &ListArgs) -> Result<()> {
    let config = load_config(&args.aws_args).await?;
    let directory = AwsDirectory::new(&config);

    let progress = progress_bar(global_args, "Listing IAM users");
    let principals = list_principals(&directory).await;
    progress.finish_and_clear();

    reporter::run(global_args, &principals?, &args.output_args)
}

async fn list_principals<D: IdentityDirectory>(directory: &D) -> Result<Vec<Principal>> {
    let principals = directory.list_principals().await.context("Failed to list IAM users")?;
    info!("Found {}", Counted::regular(principals.len(), "IAM user"));
    Ok(principals)
}

/// Lists every user up front, then gathers and classifies them one at a time
/// in listing order. The first failed lookup aborts the whole report.
pub async fn build_report<D: IdentityDirectory>(
    directory: &D,
    classifier: &Classifier,
    progress: &ProgressBar,
) -> Result<Vec<ReportRecord>> {
    let principals = list_principals(directory).await?;
    let total = principals.len();

    let mut records = Vec::with_capacity(total);
    for (idx, principal) in principals.into_iter().enumerate() {
        let name = principal.name.clone();
        progress.set_message(format!("Classifying {name} ({}/{total})", idx + 1));
        let facts = gather_facts(directory, principal)
            .await
            .with_context(|| format!("Failed to gather access details for user {name}"))?;
        records.push(classifier.classify(&facts));
    }

    let eligible = records.iter().filter(|record| record.eligible_for_removal).count();
    info!(
        "Classified {}; {} inactive for at least {} days",
        Counted::regular(records.len(), "user"),
        eligible,
        classifier.threshold_days()
    );
    Ok(records)
}

fn progress_bar(global_args: &GlobalArgs, message: &'static str) -> ProgressBar {
    if global_args.use_progress() {
        let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let pb = ProgressBar::new_spinner().with_style(style).with_message(message);
        pb.enable_steady_tick(Duration::from_millis(500));
        pb
    } else {
        ProgressBar::hidden()
    }
}
