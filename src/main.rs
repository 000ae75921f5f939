use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use quiz_card::question::parse_questions;
use quiz_card::{
    ButtonRole, CardController, CardDisplayState, CardLayout, ClickOutcome,
    FileStore, GlyphMetrics, InputState, MonospaceMetrics, PointerEvent, PointerEventKind,
    QuestionStore, ResumePolicy, StaticViewport, TypefaceFont, ViewportProvider, VisualGroup,
};

/// Simulated time between two scripted events. Longer than the press
/// feedback so every press is restored before the next event.
const EVENT_INTERVAL: Duration = Duration::from_millis(250);

const USAGE: &str = "Usage: quiz-card [--questions FILE] [--fetch HOST] [--store DIR] \
[--layout FILE] [--font FILE] [--viewport WxH] [--fresh] [yes|no|click:X,Y|move:X,Y]...";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;

    let backend = FileStore::open(&options.store)
        .with_context(|| format!("failed to open store {}", options.store.display()))?;
    let store = QuestionStore::new(backend);
    seed_questions(&store, &options)?;

    let layout = match &options.layout {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read layout {}", path.display()))?;
            CardLayout::from_xml(&xml)
                .with_context(|| format!("failed to parse layout {}", path.display()))?
        }
        None => CardLayout::default(),
    };
    let font_path = options
        .font
        .clone()
        .or_else(|| layout.font.as_ref().map(PathBuf::from));

    let policy = if options.fresh {
        ResumePolicy::Discard
    } else {
        ResumePolicy::Resume
    };
    let mut card = CardController::with_policy(layout, store, VisualGroup::new(), policy)?;

    match font_path {
        Some(path) => match TypefaceFont::load(&path) {
            Ok(font) => {
                info!("loaded typeface {} from {}", font.family(), path.display());
                card.attach_font(Arc::new(font) as Arc<dyn GlyphMetrics>)?;
            }
            Err(err) => card.font_failed(&err),
        },
        None => card.attach_font(Arc::new(MonospaceMetrics::default()))?,
    }

    let viewport = options.viewport;
    let input = InputState::new();
    let mut now = Duration::ZERO;

    print_card(&card.display());
    for event in &options.events {
        now += EVENT_INTERVAL;
        if !card.tick(now).is_empty() {
            card.refresh_hover(&input, viewport.viewport_size());
        }
        let outcome = match event {
            CliEvent::Answer(role) => Some(card.handle_click(*role, now)?),
            CliEvent::Pointer(pointer) => {
                let pointer = input.apply(*pointer);
                match pointer.kind {
                    PointerEventKind::Move => {
                        let hovered = card.update_hover(pointer.position, viewport.viewport_size());
                        println!("Hover: {}", hovered.map_or("none", role_label));
                        continue;
                    }
                    PointerEventKind::Click => {
                        let outcome = card.handle_pointer_click(
                            pointer.position,
                            viewport.viewport_size(),
                            now,
                        )?;
                        if outcome.is_none() {
                            let position = pointer.position;
                            println!("Click at ({}, {}) missed", position.x, position.y);
                            continue;
                        }
                        outcome
                    }
                }
            }
        };
        match outcome {
            Some(ClickOutcome::Answered(answer)) => println!(
                "Answered {}: {} (+{})",
                answer.question_id,
                if answer.user_answer.is_affirmative() { "yes" } else { "no" },
                answer.points
            ),
            Some(ClickOutcome::Restarted) => println!("Restarted"),
            Some(ClickOutcome::ExitRequested) => {
                println!("Exit requested");
                break;
            }
            None => {}
        }
        print_card(&card.display());
    }

    let state = card.state();
    println!(
        "Session: {} answer(s), {} of {} points",
        state.session().len(),
        state.total_points(),
        state.max_points()
    );
    if let Some(completed_at) = state.session().completed_at {
        println!("Completed at {}", completed_at.to_rfc3339());
    }
    Ok(())
}

fn seed_questions(store: &QuestionStore, options: &CliOptions) -> Result<()> {
    if let Some(path) = &options.questions {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read questions {}", path.display()))?;
        let questions = parse_questions(&json)
            .with_context(|| format!("failed to parse questions {}", path.display()))?;
        info!("seeding {} question(s) from {}", questions.len(), path.display());
        store.save_questions(&questions)?;
    } else if let Some(host) = &options.fetch {
        seed_from_host(store, host)?;
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn seed_from_host(store: &QuestionStore, host: &str) -> Result<()> {
    match quiz_card::fetch_questions(host) {
        Some(questions) => store.save_questions(&questions),
        None => {
            warn!("keeping previously stored questions");
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn seed_from_host(_store: &QuestionStore, host: &str) -> Result<()> {
    Err(anyhow!("--fetch {host} is only supported by the native binary"))
}

fn print_card(display: &CardDisplayState) {
    println!("== {} ==", display.header_text);
    println!("{}", display.body_text);
    println!("{}", display.footer_text);
    println!("[{}] [{}]", display.button1_text, display.button2_text);
}

fn role_label(role: ButtonRole) -> &'static str {
    match role {
        ButtonRole::Affirmative => "affirmative",
        ButtonRole::Negative => "negative",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CliEvent {
    Answer(ButtonRole),
    Pointer(PointerEvent),
}

#[derive(Debug)]
struct CliOptions {
    questions: Option<PathBuf>,
    fetch: Option<String>,
    store: PathBuf,
    layout: Option<PathBuf>,
    font: Option<PathBuf>,
    viewport: StaticViewport,
    fresh: bool,
    events: Vec<CliEvent>,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            questions: None,
            fetch: None,
            store: PathBuf::from(".quiz-card"),
            layout: None,
            font: None,
            viewport: StaticViewport::default(),
            fresh: false,
            events: Vec::new(),
        };
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--questions" => options.questions = Some(PathBuf::from(value("--questions")?)),
                "--fetch" => options.fetch = Some(value("--fetch")?),
                "--store" => options.store = PathBuf::from(value("--store")?),
                "--layout" => options.layout = Some(PathBuf::from(value("--layout")?)),
                "--font" => options.font = Some(PathBuf::from(value("--font")?)),
                "--viewport" => options.viewport = parse_viewport(&value("--viewport")?)?,
                "--fresh" => options.fresh = true,
                "--help" | "-h" => return Err(anyhow!(USAGE)),
                "yes" => options.events.push(CliEvent::Answer(ButtonRole::Affirmative)),
                "no" => options.events.push(CliEvent::Answer(ButtonRole::Negative)),
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                other => {
                    let event = other
                        .parse::<PointerEvent>()
                        .with_context(|| format!("invalid event {other:?}"))?;
                    options.events.push(CliEvent::Pointer(event));
                }
            }
        }
        Ok(options)
    }
}

fn parse_viewport(text: &str) -> Result<StaticViewport> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("viewport {text:?} must look like 1280x720"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid viewport width {width:?}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid viewport height {height:?}"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("viewport {text:?} must be non-empty"));
    }
    Ok(StaticViewport::new(width, height))
}
