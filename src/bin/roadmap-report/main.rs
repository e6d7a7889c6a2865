mod display;

use anyhow::Context;
use roadmap_report::{
    Board, Command, GitHub, LastReportStore, ReportGenerator, StatusUpdater, fetch_detailed_issue,
    parse_args,
};
use display::{display_issue, display_options, display_update_result};

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let (config, command) = match parse_args(std::env::args()) {
        Ok(result) => result,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    let github = GitHub::connect(&config.api_base_url)?;
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    match command {
        Command::Report {
            team,
            status,
            month,
            move_to,
        } => {
            let store = LastReportStore::new();
            let generator = ReportGenerator::new(&github, &config, &store);
            let report = match month {
                Some(month) => {
                    generator
                        .generate_monthly_report(&team, &status, month.year, month.month)
                        .await?
                }
                None => generator.generate_report(&team, &status).await?,
            };
            print!("{report}");

            if let Some(new_status) = move_to {
                let result = StatusUpdater::new(&github, &config)
                    .update_last_report_issues_status(&store, &new_status)
                    .await?;
                // stdout carries the report, so the update outcome goes to stderr
                display_update_result(&result, &mut std::io::stderr(), &mut stderr)?;
            }
        }
        Command::UpdateFromReport { file, status } => {
            let report = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read report {}", file.display()))?;
            let result = StatusUpdater::new(&github, &config)
                .update_issues_from_report(&report, &status)
                .await?;
            display_update_result(&result, &mut stdout, &mut stderr)?;
        }
        Command::Options => {
            let board = Board::new(&github, &config.organization, &config.project_title);
            let options = board.team_and_status_options().await?;
            display_options(&options, &mut stdout)?;
        }
        Command::Issue {
            owner,
            repo,
            number,
            format,
        } => {
            let detail = fetch_detailed_issue(&github, &config, &owner, &repo, number).await?;
            display_issue(&detail, format, &mut stdout)?;
        }
    }

    Ok(())
}
