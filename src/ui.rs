use std::error::Error;
use std::io;

use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use crossterm::{execute, ExecutableCommand};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::clock::{
	format_hms, from_hhmm, minute_span, seconds_since_midnight, to_hhmm, Clock, Viewport, LAST_SECOND,
	SECONDS_PER_DAY,
};
use crate::color::{Hsla, SlotState};
use crate::config::Config;
use crate::storage::{CreateSlotError, DayRepository, DayStore, KeyValueStore};
use crate::view::{derive_view, DayView, SlotBand, ViewPublisher};

const BACKGROUND: (u8, u8, u8) = (24, 26, 31);
const NOW_MARKER_COLOR: Color = Color::Yellow;
const EMPTY_BAR_COLOR: Color = Color::Rgb(38, 41, 48);
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const DEFAULT_SLOT_LENGTH: u32 = 3600;

pub fn run_dashboard<S: KeyValueStore>(
	repository: &mut DayRepository<S>,
	clock: &impl Clock,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let mut publisher = ViewPublisher::new();
	publisher.subscribe(|chrome| {
		if let Err(err) = execute!(io::stdout(), SetTitle(&chrome.title)) {
			warn!("failed to set terminal title: {err}");
		}
	});

	let result = run_event_loop(&mut terminal, repository, clock, config, &mut publisher);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop<S: KeyValueStore>(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	repository: &mut DayRepository<S>,
	clock: &impl Clock,
	config: &Config,
	publisher: &mut ViewPublisher,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(config.viewport);
	let mut day = repository.load_for_today(clock.today())?;

	loop {
		let now = clock.now();
		if !day.is_for(now.date_naive()) {
			debug!("day rolled over, reloading timeslots");
			day = repository.load_for_today(now.date_naive())?;
			app.slot_index = 0;
		}

		let view = derive_view(&day.timeslots, &now.time(), app.viewport);
		publisher.publish(&view);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(config.tick)? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let today = now.date_naive();
				let mut session = Session {
					repository: &mut *repository,
					day: &mut day,
					today,
					now_seconds: seconds_since_midnight(&now),
				};
				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, &mut session),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, &mut session),
					InputMode::Normal => handle_normal_key(&mut app, key.code, &session, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

/// What a key handler may touch: the repository and the store it last read.
struct Session<'a, S> {
	repository: &'a mut DayRepository<S>,
	day: &'a mut DayStore,
	today: chrono::NaiveDate,
	now_seconds: u32,
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &DayView) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(3),
			Constraint::Length(6),
			Constraint::Length(3),
			Constraint::Min(5),
			Constraint::Length(5),
		])
		.split(frame.area());

	render_clock_panel(frame, layout[0], view);
	render_day_bar(frame, layout[1], view);
	render_viewport_gauge(frame, layout[2], view);
	render_slot_list(frame, layout[3], app, view);
	render_footer(frame, layout[4], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_clock_panel(frame: &mut Frame, area: Rect, view: &DayView) {
	let mut spans = vec![
		Span::styled(view.clock.clone(), Style::default().add_modifier(Modifier::BOLD)),
		Span::raw(format!("  left {}", view.remaining)),
		Span::raw(format!(
			"  | day {:.1}% done, {:.1}% to go",
			view.day_progress, view.day_remaining
		)),
	];

	if let (Some(slot), Some(left)) = (&view.active, view.active_remaining) {
		let color = view.chrome.icon.map(hsla_color).unwrap_or(Color::White);
		spans.push(Span::raw("  | "));
		spans.push(Span::styled("●", Style::default().fg(color)));
		spans.push(Span::raw(format!(
			" {} ({} left)",
			slot.name(),
			format_hms(left)
		)));
	}

	let panel = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(view.chrome.title.clone()));
	frame.render_widget(panel, area);
}

fn render_day_bar(frame: &mut Frame, area: Rect, view: &DayView) {
	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("Day from {}", to_hhmm(view.viewport.start_seconds())));
	let inner = block.inner(area);
	frame.render_widget(block, area);
	if inner.width == 0 || inner.height == 0 {
		return;
	}

	let width = usize::from(inner.width);
	let mut lines = Vec::new();
	for _ in 0..inner.height.saturating_sub(1) {
		lines.push(bar_line(view, width));
	}
	lines.push(Line::from(hour_ticks(view.viewport, width)));
	frame.render_widget(Paragraph::new(lines), inner);
}

fn render_viewport_gauge(frame: &mut Frame, area: Rect, view: &DayView) {
	let gauge = Gauge::default()
		.block(Block::default().borders(Borders::ALL).title("Viewport"))
		.gauge_style(Style::default().fg(Color::LightBlue).bg(EMPTY_BAR_COLOR))
		.ratio((view.viewport_progress / 100.0).clamp(0.0, 1.0))
		.label(format!("{:.1}%", view.viewport_progress));
	frame.render_widget(gauge, area);
}

fn render_slot_list(frame: &mut Frame, area: Rect, app: &App, view: &DayView) {
	let items = view
		.bands
		.iter()
		.map(|band| ListItem::new(slot_row_line(band)))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.bands.is_empty() {
		state.select(Some(app.slot_index.min(view.bands.len() - 1)));
	}

	let title = format!("Timeslots ({})", view.bands.len());
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no timeslots today, press n to add one)")]
	} else {
		items
	})
	.block(Block::default().borders(Borders::ALL).title(title))
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("n new timeslot | v toggle 00:00/06:00 view | r reset day | j/k move | q quit"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!("Selected: {}", select.selected_option().map(|option| option.label.as_str()).unwrap_or("(none)"))),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(40, 30, frame.area());
	frame.render_widget(Clear, area);

	let items = select
		.options
		.iter()
		.map(|option| ListItem::new(option.label.clone()))
		.collect::<Vec<_>>();
	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn slot_row_line(band: &SlotBand) -> Line<'static> {
	let state_style = match band.state {
		SlotState::Running => Style::default().fg(NOW_MARKER_COLOR).add_modifier(Modifier::BOLD),
		SlotState::Past => Style::default().fg(Color::DarkGray),
		SlotState::Upcoming => Style::default(),
	};

	Line::from(vec![
		Span::styled("  ", Style::default().bg(hsla_color(band.color))),
		Span::raw(format!(" {}-{} ", to_hhmm(band.start), to_hhmm(band.end))),
		Span::styled(band.name.clone(), state_style),
		Span::styled(format!(" [{}]", band.state.label()), Style::default().fg(Color::DarkGray)),
		Span::raw(format!(" {}", format_hms(band.end - band.start + 1))),
	])
}

/// Seconds at the middle of column `column` when `width` columns span the
/// viewport.
fn column_seconds(column: usize, width: usize, viewport: Viewport) -> u32 {
	let start = u64::from(viewport.start_seconds());
	let span = u64::from(SECONDS_PER_DAY) - start;
	let offset = ((2 * column as u64 + 1) * span) / (2 * width as u64);
	(start + offset).min(u64::from(LAST_SECOND)) as u32
}

fn bar_line(view: &DayView, width: usize) -> Line<'static> {
	let now_column = if view.now_seconds < view.viewport.start_seconds() {
		None
	} else {
		Some(((view.viewport_progress / 100.0) * width as f64).floor() as usize)
	};

	let spans = (0..width)
		.map(|column| {
			let seconds = column_seconds(column, width, view.viewport);
			let background = view
				.bands
				.iter()
				.filter(|band| band.is_visible())
				.find(|band| band.start <= seconds && seconds <= band.end)
				.map(|band| hsla_color(band.color))
				.unwrap_or(EMPTY_BAR_COLOR);

			let is_now = now_column.is_some_and(|now| now == column || (now == width && column + 1 == width));
			if is_now {
				Span::styled("┃", Style::default().fg(NOW_MARKER_COLOR).bg(background))
			} else {
				Span::styled(" ", Style::default().bg(background))
			}
		})
		.collect::<Vec<_>>();

	Line::from(spans)
}

fn hour_ticks(viewport: Viewport, width: usize) -> String {
	let mut ticks = vec![' '; width];
	let first_hour = viewport.start_hours();
	let span_hours = 24 - first_hour;
	let step = if width >= span_hours as usize * 4 { 1 } else if width >= span_hours as usize * 2 { 3 } else { 6 };

	for hour in (first_hour..24).step_by(step) {
		let column = ((hour - first_hour) as usize * width) / span_hours as usize;
		let label = format!("{hour:02}");
		if column + label.len() > width {
			continue;
		}
		for (offset, ch) in label.chars().enumerate() {
			ticks[column + offset] = ch;
		}
	}

	ticks.into_iter().collect()
}

fn hsla_color(color: Hsla) -> Color {
	let (r, g, b) = color.over(BACKGROUND);
	Color::Rgb(r, g, b)
}

fn handle_normal_key<S: KeyValueStore>(app: &mut App, code: KeyCode, session: &Session<'_, S>, view: &DayView) -> bool {
	match code {
		KeyCode::Char('q') => true,
		KeyCode::Char('n') => {
			app.mode = InputMode::Prompt(PromptState::new("Timeslot name", PromptKind::SlotName));
			false
		}
		KeyCode::Char('v') => {
			app.viewport = app.viewport.toggled();
			app.status = format!("Viewing the day from {}", to_hhmm(app.viewport.start_seconds()));
			false
		}
		KeyCode::Char('r') => {
			let options = vec![SelectOption::new("Keep today's timeslots", false), SelectOption::new("Reset to an empty day", true)];
			app.mode = InputMode::Select(SelectState::new(
				format!("Reset {} timeslots?", session.day.timeslots.len()),
				options,
			));
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_slot_selection(1, view);
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_slot_selection(-1, view);
			false
		}
		_ => false,
	}
}

fn handle_prompt_key<S: KeyValueStore>(app: &mut App, code: KeyCode, session: &mut Session<'_, S>) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt, session) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Done(message)) => app.status = message,
				Err(err) => app.status = format!("error: {err}"),
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key<S: KeyValueStore>(app: &mut App, code: KeyCode, session: &mut Session<'_, S>) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			let reset = select.selected_option().is_some_and(|option| option.confirm);
			if !reset {
				app.status = "Reset cancelled".to_string();
				return false;
			}

			match session.repository.reset(session.today) {
				Ok(fresh) => {
					*session.day = fresh;
					app.slot_index = 0;
					app.status = "Day reset".to_string();
				}
				Err(err) => app.status = format!("error: {err}"),
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt<S: KeyValueStore>(prompt: PromptState, session: &mut Session<'_, S>) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::SlotName => {
			let name = prompt.input.trim().to_string();
			if name.is_empty() {
				return Ok(PromptOutcome::Done("Ready".to_string()));
			}

			let start = session.now_seconds - session.now_seconds % 60;
			Ok(PromptOutcome::NextPrompt(PromptState::with_input(
				format!("Start of {name} (HH:MM)"),
				to_hhmm(start),
				PromptKind::SlotStart { name },
			)))
		}
		PromptKind::SlotStart { name } => {
			let start = from_hhmm(prompt.input.trim());
			let end = (start + DEFAULT_SLOT_LENGTH - 1).min(LAST_SECOND);
			Ok(PromptOutcome::NextPrompt(PromptState::with_input(
				format!("End of {name} (HH:MM)"),
				to_hhmm(end),
				PromptKind::SlotEnd { name, start },
			)))
		}
		PromptKind::SlotEnd { name, start } => {
			let (start, end) = minute_span(start, from_hhmm(prompt.input.trim()));
			create_slot(session, &name, start, end)
		}
	}
}

fn create_slot<S: KeyValueStore>(session: &mut Session<'_, S>, name: &str, start: u32, end: u32) -> Result<PromptOutcome, String> {
	match session
		.repository
		.create_slot(session.today, name, i64::from(start), i64::from(end))
	{
		Ok(Some(day)) => {
			*session.day = day;
			Ok(PromptOutcome::Done(format!(
				"created {name} {}-{}",
				to_hhmm(start),
				to_hhmm(end)
			)))
		}
		Ok(None) => Ok(PromptOutcome::Done("Ready".to_string())),
		Err(CreateSlotError::Rejected(err)) => Err(err.to_string()),
		Err(CreateSlotError::Storage(err)) => Err(err.to_string()),
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self::with_input(title, String::new(), kind)
	}

	fn with_input(title: impl Into<String>, input: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: input.into(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	SlotName,
	SlotStart { name: String },
	SlotEnd { name: String, start: u32 },
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
}

impl SelectState {
	fn new(title: impl Into<String>, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	confirm: bool,
}

impl SelectOption {
	fn new(label: impl Into<String>, confirm: bool) -> Self {
		Self {
			label: label.into(),
			confirm,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	viewport: Viewport,
	slot_index: usize,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(viewport: Viewport) -> Self {
		Self {
			viewport,
			slot_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &DayView) {
		if view.bands.is_empty() {
			self.slot_index = 0;
		} else {
			self.slot_index = self.slot_index.min(view.bands.len() - 1);
		}
	}

	fn move_slot_selection(&mut self, delta: i32, view: &DayView) {
		if view.bands.is_empty() {
			self.slot_index = 0;
			return;
		}

		if delta > 0 {
			self.slot_index = (self.slot_index + delta as usize).min(view.bands.len() - 1);
		} else {
			self.slot_index = self.slot_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}
}

#[cfg(test)]
mod tests {
	use chrono::{NaiveDate, NaiveTime};

	use ratatui::backend::TestBackend;
	use ratatui::Terminal;

	use super::{
		column_seconds, hour_ticks, render_day_bar, submit_prompt, PromptKind, PromptOutcome, PromptState, Session,
	};
	use crate::clock::Viewport;
	use crate::storage::{DayRepository, DayStore, MemoryStore};
	use crate::timeslots::Timeslots;
	use crate::view::derive_view;

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
	}

	#[test]
	fn columns_cover_the_viewport() {
		assert_eq!(column_seconds(0, 24, Viewport::Midnight), 1800);
		assert_eq!(column_seconds(23, 24, Viewport::Midnight), 84_600);
		assert_eq!(column_seconds(0, 18, Viewport::Morning), 23_400);
	}

	#[test]
	fn day_bar_without_inner_width_draws_only_its_border() {
		let view = derive_view(&Timeslots::new(), &NaiveTime::from_hms_opt(12, 0, 0).unwrap(), Viewport::Midnight);
		let mut terminal = Terminal::new(TestBackend::new(2, 6)).unwrap();
		terminal
			.draw(|frame| render_day_bar(frame, frame.area(), &view))
			.unwrap();
	}

	#[test]
	fn hour_ticks_fit_the_width() {
		let ticks = hour_ticks(Viewport::Midnight, 48);
		assert_eq!(ticks.chars().count(), 48);
		assert!(ticks.starts_with("00"));
		assert!(ticks.contains("12"));

		let narrow = hour_ticks(Viewport::Morning, 20);
		assert!(narrow.starts_with("06"));
		assert_eq!(narrow.chars().count(), 20);
	}

	#[test]
	fn prompts_walk_from_name_to_a_saved_slot() {
		let mut repository = DayRepository::new(MemoryStore::default(), "timeslots");
		let mut day = DayStore::fresh(today());
		let now = NaiveTime::from_hms_opt(9, 15, 42).unwrap();
		let mut session = Session {
			repository: &mut repository,
			day: &mut day,
			today: today(),
			now_seconds: crate::clock::seconds_since_midnight(&now),
		};

		let mut name = PromptState::new("Timeslot name", PromptKind::SlotName);
		name.input = " focus ".to_string();
		let Ok(PromptOutcome::NextPrompt(start)) = submit_prompt(name, &mut session) else {
			panic!("expected a start prompt");
		};
		assert_eq!(start.input, "09:15");

		let Ok(PromptOutcome::NextPrompt(end)) = submit_prompt(start, &mut session) else {
			panic!("expected an end prompt");
		};
		assert_eq!(end.input, "10:14");

		let outcome = submit_prompt(end, &mut session);
		assert!(matches!(outcome, Ok(PromptOutcome::Done(_))));
		assert_eq!(day.timeslots.len(), 1);
		assert_eq!(day.timeslots.as_slice()[0].start, 33_300);
		assert_eq!(day.timeslots.as_slice()[0].end, 36_899);
		assert_eq!(repository.load_for_today(today()).unwrap(), day);
	}

	#[test]
	fn blank_name_abandons_and_overlap_reports_an_error() {
		let mut repository = DayRepository::new(MemoryStore::default(), "timeslots");
		repository.create_slot(today(), "focus", 0, 3599).unwrap();
		let mut day = repository.load_for_today(today()).unwrap();
		let mut session = Session {
			repository: &mut repository,
			day: &mut day,
			today: today(),
			now_seconds: 0,
		};

		let blank = PromptState::new("Timeslot name", PromptKind::SlotName);
		assert!(matches!(submit_prompt(blank, &mut session), Ok(PromptOutcome::Done(_))));

		let mut clash = PromptState::new(
			"End",
			PromptKind::SlotEnd {
				name: "x".to_string(),
				start: 1000,
			},
		);
		clash.input = "00:30".to_string();
		assert!(submit_prompt(clash, &mut session).is_err());
		assert_eq!(day.timeslots.len(), 1);
	}

	#[test]
	fn reversed_picks_are_swapped_before_the_end_minute_is_filled() {
		let mut repository = DayRepository::new(MemoryStore::default(), "timeslots");
		repository.create_slot(today(), "focus", 28_800, 32_399).unwrap();
		let mut day = repository.load_for_today(today()).unwrap();
		let mut session = Session {
			repository: &mut repository,
			day: &mut day,
			today: today(),
			now_seconds: 0,
		};

		let mut end = PromptState::new(
			"End",
			PromptKind::SlotEnd {
				name: "focus".to_string(),
				start: 36_000,
			},
		);
		end.input = "09:00".to_string();
		let Ok(PromptOutcome::Done(message)) = submit_prompt(end, &mut session) else {
			panic!("expected the slot to be created");
		};
		assert_eq!(message, "created focus 09:00-10:00");
		assert_eq!(day.timeslots.len(), 1);
		assert_eq!((day.timeslots.as_slice()[0].start, day.timeslots.as_slice()[0].end), (28_800, 36_059));
	}
}
