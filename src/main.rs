mod cli;
mod ui;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{Cli, Command, SessionCommand};

use huntdesk::config::HuntdeskConfig;
use huntdesk::stats::{self, TimeWindow};
use huntdesk::store::TrackerState;
use huntdesk::tracker::Tracker;
use huntdesk::workflow::Status;

fn current_user(cli: &Cli) -> String {
    cli.user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "staff".to_string())
}

fn parse_status(code: &str) -> Result<Status> {
    code.parse::<Status>()
        .with_context(|| format!("'{code}' is not a status code; see `huntdesk statuses`"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    huntdesk::logging::init(cli.verbose);

    let mut config =
        HuntdeskConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(state) = &cli.state {
        config.state_path = state.clone();
    }
    let engine = config.engine().context("Invalid workflow configuration")?;
    let state = TrackerState::load(&config.state_path).with_context(|| {
        format!("Failed to read state from {}", config.state_path.display())
    })?;

    let user = current_user(&cli);
    let now = Utc::now();
    let painter = ui::Painter::default();
    let mut tracker = Tracker::new(engine, state);
    let mut dirty = true;

    match cli.command {
        Command::Statuses => {
            painter.statuses(tracker.engine());
            dirty = false;
        }
        Command::Transitions { code } => {
            painter.transitions(&code, tracker.engine());
            dirty = false;
        }
        Command::New { name } => {
            let id = tracker.create_puzzle(&name, &user, now)?;
            painter.created(id, &name);
            let puzzle = tracker.puzzle(id)?;
            painter.options(&tracker.engine().options_for(puzzle));
        }
        Command::Status { id, code, expect } => {
            let to = parse_status(&code)?;
            let outcome = match expect {
                Some(expected) => {
                    tracker.change_status_if(id, parse_status(&expected)?, to, &user, now)?
                }
                None => tracker.change_status(id, to, &user, now)?,
            };
            painter.outcome(&outcome);
        }
        Command::Comment { id, text, status } => {
            let outcome = tracker.comment_with_status(id, &user, &text, status.as_deref(), now)?;
            painter.outcome(&outcome);
        }
        Command::History { id } => {
            tracker.puzzle(id)?;
            painter.history(&tracker.history(id));
            dirty = false;
        }
        Command::StatusAt { id, at } => {
            let at: DateTime<Utc> = DateTime::parse_from_rfc3339(&at)
                .with_context(|| format!("'{at}' is not an RFC 3339 timestamp"))?
                .with_timezone(&Utc);
            let status = tracker.status_at(id, at)?;
            println!("{} ({})", status.display_name(), status.code());
            dirty = false;
        }
        Command::Inbox => {
            let inbox = stats::inbox(tracker.puzzles(), &user, tracker.engine().table());
            painter.inbox(&user, &inbox);
            dirty = false;
        }
        Command::Stats { time } => {
            let window: TimeWindow = time.parse()?;
            let breakdown = stats::status_breakdown(
                tracker.puzzles(),
                &config.important_tags,
                &config.non_schedule_tags,
            );
            painter.breakdown(&breakdown, &config.important_tags);
            println!();
            let timeline = stats::status_counts_over_time(
                tracker.state().log.entries(),
                &config.chart_excluded_statuses()?,
            )
            .with_target_count(config.target_puzzle_count)
            .clipped(window);
            painter.timeline(&timeline);
            dirty = false;
        }
        Command::Durations => {
            let report = stats::duration_aggregates(tracker.state().log.entries(), now);
            painter.durations(&report);
            dirty = false;
        }
        Command::Editors => {
            painter.workload(&stats::editor_workload(tracker.puzzles()));
            dirty = false;
        }
        Command::Backfill => {
            let progress = ui::BackfillProgress::start(tracker.backfill_len());
            let report = tracker.backfill(|id| progress.tick(id));
            progress.finish();
            painter.backfill_report(&report);
        }
        Command::Subscribe { code, email } => {
            let status = parse_status(&code)?;
            let added = tracker.subscribe(&user, email.as_deref().unwrap_or_default(), status);
            painter.subscribed(status, added);
        }
        Command::Session { action } => match action {
            SessionCommand::Open { puzzle, private } => {
                let id = tracker.open_session(puzzle, &user, !private, now)?;
                painter.ok(&format!("Opened testsolve session #{id}"));
            }
            SessionCommand::Join { session } => {
                if tracker.join_session(session, &user, now)? {
                    painter.ok(&format!("Joined testsolve session #{session}"));
                } else {
                    painter.ok(&format!("Already in testsolve session #{session}"));
                }
            }
            SessionCommand::Guess { session, guess } => {
                let outcome = tracker.guess(session, &user, &guess, now)?;
                painter.guess(&outcome);
            }
            SessionCommand::Joinable { session, joinable } => {
                tracker.set_joinable(session, joinable)?;
                painter.ok(&format!("Session #{session} joinable: {joinable}"));
            }
        },
    }

    if dirty {
        tracker
            .into_state()
            .save(&config.state_path)
            .with_context(|| format!("Failed to save state to {}", config.state_path.display()))?;
    }
    Ok(())
}
