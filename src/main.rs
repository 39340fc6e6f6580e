use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use showertime::alarm::scheduler::next_alarm;
use showertime::clock::SystemClock;
use showertime::logging::init_logging;
use showertime::notify::{NotificationGateway, TerminalSurface};
use showertime::render::{
    NoopRenderer, Renderer, TextRenderer, View, alarm_lines, history_lines, status_line,
};
use showertime::runtime::{self, RunOptions, StopHandle};
use showertime::state::{FileKeyValueStore, StateStore};
use showertime::{Command, Tracker};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Parser, Debug)]
#[command(
    name = "showertime",
    version,
    about = "Track time since your last shower, with reminders and daily alarms"
)]
struct Cli {
    #[arg(long, global = true, default_value = "showertime.json")]
    state: PathBuf,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Show elapsed time, urgency and settings (default)
    Status,
    /// Record a shower now
    Mark,
    /// Set the reminder interval in hours
    Interval { hours: u32 },
    /// Manage daily alarms
    Alarm {
        #[command(subcommand)]
        action: AlarmAction,
    },
    /// Turn reminders on or off
    Notifications {
        #[arg(value_enum)]
        mode: Toggle,
    },
    /// List the most recent showers
    History,
    /// Forget all showers and alarms
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Keep ticking, printing status and delivering reminders
    Watch {
        #[arg(long)]
        ticks: Option<u64>,

        #[arg(long, default_value_t = 1_000)]
        period_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum AlarmAction {
    Add { time: String },
    Remove { id: u64 },
    List,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let command = cli.command.unwrap_or(CliCommand::Status);
    let mut renderer: Box<dyn Renderer> = match command {
        CliCommand::Watch { .. } => Box::new(TextRenderer::new(io::stdout())),
        _ => Box::new(NoopRenderer),
    };
    let mut tracker = Tracker::open(
        StateStore::new(FileKeyValueStore::new(&cli.state)),
        NotificationGateway::new(TerminalSurface::detect()),
        move |view: &View<'_>| renderer.render(view),
    );
    let now = Local::now();

    match command {
        CliCommand::Status => {
            let status = tracker.refresh(&now);
            let record = tracker.record();
            println!(
                "{}",
                status_line(&View {
                    record,
                    status
                })
            );
            println!("Interval: {}h", record.interval_hours);
            println!(
                "Notifications: {}",
                if record.notifications_enabled { "on" } else { "off" }
            );
            if let Some((alarm, at)) = next_alarm(&now, record) {
                println!("Next alarm: {} ({})", alarm.time, at.format("%a %H:%M"));
            }
        }
        CliCommand::Mark => {
            tracker.apply(Command::MarkOccurrence, &now)?;
            let entry = tracker.record().history.first().cloned().unwrap_or_default();
            println!("Marked shower at {entry}");
        }
        CliCommand::Interval { hours } => {
            tracker.apply(Command::SetInterval(hours), &now)?;
            println!("Interval set to {hours}h");
        }
        CliCommand::Alarm { action } => match action {
            AlarmAction::Add { time } => {
                tracker.apply(Command::AddAlarm(time), &now)?;
                if let Some(alarm) = tracker.record().alarms.iter().max_by_key(|alarm| alarm.id) {
                    println!("Added alarm {} at {}", alarm.id, alarm.time);
                }
            }
            AlarmAction::Remove { id } => {
                tracker.apply(Command::DeleteAlarm(id), &now)?;
                println!("Removed alarm {id}");
            }
            AlarmAction::List => {
                for line in alarm_lines(tracker.record()) {
                    println!("{line}");
                }
            }
        },
        CliCommand::Notifications { mode } => {
            let enable = mode == Toggle::On;
            tracker
                .apply(Command::ToggleNotifications(enable), &now)
                .context("reminders were switched off")?;
            println!("Notifications {}", if enable { "on" } else { "off" });
        }
        CliCommand::History => {
            for line in history_lines(tracker.record()) {
                println!("{line}");
            }
        }
        CliCommand::Reset { yes } => {
            if !yes {
                bail!("reset erases all shower history and alarms; rerun with --yes to confirm");
            }
            tracker.apply(Command::Reset, &now)?;
            println!("History and alarms cleared");
        }
        CliCommand::Watch { ticks, period_ms } => {
            if period_ms == 0 {
                bail!("--period-ms must be greater than zero");
            }
            let options = RunOptions {
                period: std::time::Duration::from_millis(period_ms),
                max_ticks: ticks,
            };
            runtime::run(&mut tracker, &SystemClock, &options, &StopHandle::new());
        }
    }

    Ok(())
}
