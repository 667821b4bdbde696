use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

mod config;
mod config_command;
mod console;
mod datetime;
mod duration;
mod issue;
mod issue_command;
mod jira;
mod log_command;
mod track_command;
mod worklog;

use config::Config;
use config_command::{config_command, ConfigArgs};
use console::{ConsoleMarkdown, ConsolePresenter};
use issue_command::{IssueAction, IssueArgs, IssueCommand};
use jira::JiraClient;
use log_command::{LogArgs, LogCommand};
use track_command::{TrackArgs, TrackCommand};

/// Jiraの課題を作成し、作業時間を登録するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- issue show BAN-1
/// $ cargo run -- log BAN-1 --time "2h 30m"
/// $ cargo run -- track BAN-1
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        short = 'v',
        long = "verbose",
        help = "Increase log verbosity",
        parse(from_occurrences)
    )]
    verbose: u64,

    #[clap(long = "config", help = "Path of the config file", parse(from_os_str))]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Show or create issues
    Issue(IssueArgs),
    /// Log time spent on an issue
    Log(LogArgs),
    /// Track time interactively and log it on an issue
    Track(TrackArgs),
    /// Save the connection settings
    Config(ConfigArgs),
}

/// ログの出力先とレベルを設定する。
fn setup_logger(verbose: u64) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .chain(io::stderr())
        .apply()
        .context("Failed to set up logger")?;

    Ok(())
}

/// 設定を読み込み、Jiraと通信するクライアントを作成する。
fn connect(path: Option<&Path>) -> Result<(Config, JiraClient)> {
    let config = Config::load(path).context("Failed to load config")?;
    let client = JiraClient::new(&config).context("Failed to new jira client")?;

    Ok((config, client))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdown::new(&mut stdout);

    match args.subcommand {
        SubCommands::Config(config_args) => {
            let path = match args.config {
                Some(path) => path,
                None => config::default_path()?,
            };
            config_command(config_args, &path)?;
        }
        SubCommands::Issue(issue) => {
            let (config, client) = connect(args.config.as_deref())?;
            let command = IssueCommand::new(&client, &config);
            match issue.action {
                IssueAction::Show(show) => {
                    let issue = command.show(show).await?;
                    presenter.show_issue(&issue)?;
                }
                IssueAction::Create(create) => {
                    let created = command.create(create).await?;
                    presenter.show_message(&created.key)?;
                }
            }
        }
        SubCommands::Log(log) => {
            let (_, client) = connect(args.config.as_deref())?;
            if let Some(result) = LogCommand::new(&client).run(log).await? {
                presenter.show_message(&format!("Logged {}", result.time_spent))?;
            }
        }
        SubCommands::Track(track) => {
            let (_, client) = connect(args.config.as_deref())?;
            let stdin = io::stdin();
            TrackCommand::new(&client)
                .run(track, stdin.lock(), &mut presenter)
                .await?;
        }
    }

    Ok(())
}
