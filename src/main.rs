mod clock;
mod color;
mod config;
mod storage;
mod timeslots;
mod ui;
mod view;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use env_logger::{Env, Target};
use serde_json::{Map, Value};

use crate::clock::{format_hms, from_hhmm, minute_span, to_hhmm, Clock, SystemClock};
use crate::config::{load_config, Config, Overrides};
use crate::storage::{DayRepository, FileStore, KeyValueStore};
use crate::timeslots::SlotMeta;
use crate::ui::run_dashboard;
use crate::view::derive_view;

const LOG_FILE: &str = "daybar.log";

#[derive(Debug, Parser)]
#[command(name = "daybar", about = "Terminal day timer with named timeslots")]
struct Cli {
	#[arg(long)]
	state_dir: Option<PathBuf>,
	#[arg(long)]
	config: Option<PathBuf>,
	/// Hour the bar starts at: 0 or 6.
	#[arg(long)]
	viewport_start: Option<u32>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	Status,
	List,
	Add {
		#[arg(long)]
		name: String,
		/// HH:MM
		#[arg(long)]
		start: String,
		/// HH:MM, inclusive of that whole minute
		#[arg(long)]
		end: String,
		/// Extra metadata as a JSON object.
		#[arg(long)]
		meta: Option<String>,
	},
	Reset,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let config = load_config(Overrides {
		state_dir: cli.state_dir,
		config_path: cli.config,
		viewport_start_hours: cli.viewport_start,
	})?;

	let command = cli.command.unwrap_or(Command::Dashboard);
	init_logging(&command, &config.state_dir);

	let clock = SystemClock;
	let mut repository = DayRepository::new(FileStore::new(&config.state_dir), config.storage_key.clone());

	match command {
		Command::Dashboard => {
			run_dashboard(&mut repository, &clock, &config)?;
		}
		Command::Status => {
			print_status(&repository, &clock, &config)?;
		}
		Command::List => {
			print_slots(&repository, &clock, &config)?;
		}
		Command::Add { name, start, end, meta } => {
			let message = add_slot(&mut repository, clock.today(), &name, &start, &end, meta.as_deref())?;
			println!("{message}");
		}
		Command::Reset => {
			repository.reset(clock.today())?;
			println!("reset timeslots in {}", repository.store().dir().display());
		}
	}

	Ok(())
}

fn init_logging(command: &Command, state_dir: &Path) {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));

	if let Command::Dashboard = command {
		// The dashboard owns the terminal, so its log goes to a file.
		let file = fs::create_dir_all(state_dir).and_then(|()| {
			OpenOptions::new()
				.create(true)
				.append(true)
				.open(state_dir.join(LOG_FILE))
		});
		match file {
			Ok(file) => {
				builder.filter_level(log::LevelFilter::Info);
				builder.parse_default_env();
				builder.target(Target::Pipe(Box::new(file)));
			}
			Err(err) => {
				eprintln!("warning: failed to open log file: {err}");
				builder.filter_level(log::LevelFilter::Off);
			}
		}
	}

	builder.init();
	log::debug!("logging ready for {command:?}");
}

fn add_slot<S: KeyValueStore>(
	repository: &mut DayRepository<S>,
	today: NaiveDate,
	name: &str,
	start: &str,
	end: &str,
	meta: Option<&str>,
) -> Result<String, Box<dyn Error>> {
	let name = name.trim();
	if name.is_empty() {
		return Ok("empty name, nothing created".to_string());
	}

	let meta = build_meta(name, meta)?;
	let (start, end) = minute_span(from_hhmm(start), from_hhmm(end));
	let day = repository.insert_slot(today, meta, start.into(), end.into())?;
	Ok(format!(
		"created {name} {}-{} ({} timeslots today)",
		to_hhmm(start),
		to_hhmm(end),
		day.timeslots.len()
	))
}

fn build_meta(name: &str, extra: Option<&str>) -> Result<SlotMeta, Box<dyn Error>> {
	let mut fields = match extra {
		Some(raw) => match serde_json::from_str::<Value>(raw)? {
			Value::Object(fields) => fields,
			_ => return Err("--meta must be a JSON object".into()),
		},
		None => Map::new(),
	};
	fields.insert("name".to_string(), Value::String(name.to_string()));
	Ok(SlotMeta::from_value(Value::Object(fields))?)
}

fn print_status(repository: &DayRepository<FileStore>, clock: &impl Clock, config: &Config) -> Result<(), Box<dyn Error>> {
	let now = clock.now();
	let day = repository.load_for_today(now.date_naive())?;
	let view = derive_view(&day.timeslots, &now.time(), config.viewport);

	println!("now        {}", view.clock);
	println!("remaining  {}", view.remaining);
	println!("day        {:.1}% done, {:.1}% left", view.day_progress, view.day_remaining);
	println!(
		"viewport   {:.1}% (from {})",
		view.viewport_progress,
		to_hhmm(config.viewport.start_seconds())
	);
	match (&view.active, view.active_remaining) {
		(Some(slot), Some(left)) => println!(
			"active     {} until {} ({} left)",
			slot.name(),
			to_hhmm(slot.end),
			format_hms(left)
		),
		_ => println!("active     (none)"),
	}

	Ok(())
}

fn print_slots(repository: &DayRepository<FileStore>, clock: &impl Clock, config: &Config) -> Result<(), Box<dyn Error>> {
	let now = clock.now();
	let day = repository.load_for_today(now.date_naive())?;
	if day.timeslots.is_empty() {
		println!("no timeslots for {}", day.date);
		return Ok(());
	}

	let view = derive_view(&day.timeslots, &now.time(), config.viewport);
	println!("timeslots for {}", day.date);
	for band in &view.bands {
		println!(
			"{}-{} | {:<8} | {} | {}",
			to_hhmm(band.start),
			to_hhmm(band.end),
			band.state.label(),
			band.color,
			band.name
		);
	}

	Ok(())
}
