use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use shakmaty::{Role, Square};

use chess_study::chess::library::{self, Library};
use chess_study::chess::moves;
use chess_study::chess::{
    Chapter, Continuation, MoveInput, Modifier, NavigatorOptions, Overlay, PlayOutcome, Session,
    Step, VariationPolicy, log,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Stop at every variation and ask
    Prompt,
    /// Stay on the mainline without asking
    Mainline,
}

impl From<Policy> for VariationPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Prompt => Self::Prompt,
            Policy::Mainline => Self::PreferMainline,
        }
    }
}

/// Step through annotated chess chapters from the terminal.
#[derive(Parser)]
#[command(name = "chess-study")]
#[command(version)]
struct Args {
    /// Chapter file (.pgn or .pgn.zst)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Library root; lists levels, or the chapters of --level
    #[arg(long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Level to list chapters for
    #[arg(long, requires = "library")]
    level: Option<String>,

    /// Record to open first (0-based)
    #[arg(long, default_value_t = 0)]
    record: usize,

    /// What "next" does at a branch point
    #[arg(long, value_enum, default_value_t = Policy::Prompt)]
    policy: Policy,

    /// Print the mainline of the opened record as JSON and exit
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    log::init();
    let args = Args::parse();

    if let Some(root) = &args.library {
        list_library(&Library::new(root), args.level.as_deref());
        if args.file.is_none() {
            return Ok(());
        }
    }

    let Some(path) = &args.file else {
        bail!("no chapter file given (pass FILE or --library)");
    };
    let text = library::read_text(path).with_context(|| format!("loading {}", path.display()))?;
    let chapter = Chapter::parse(&text);
    if chapter.is_empty() {
        println!("No content in {}", path.display());
        return Ok(());
    }

    let options = NavigatorOptions {
        variation_policy: args.policy.into(),
    };
    let mut session = Session::new(chapter, options);
    session
        .open_record(args.record)
        .with_context(|| format!("opening record {}", args.record))?;

    if args.json {
        if let Some(nav) = session.navigator() {
            println!("{}", moves::mainline_json(nav));
        }
        return Ok(());
    }

    repl(&mut session)
}

fn list_library(library: &Library, level: Option<&str>) {
    match level {
        Some(level) => {
            for chapter in library.chapters(level) {
                println!("{}\t{}", chapter.name, chapter.path.display());
            }
        }
        None => {
            for level in library.levels() {
                println!("{level}");
            }
        }
    }
}

const HELP: &str = "\
n | next            advance (stops at branch points)
p | prev            retreat
main                continue the mainline at a branch point
var N               enter branch N at a branch point
jump I              go to mainline index I
enter I B O         go to ply O of branch B at index I
play MOVE           play e2e4, e7e8q or SAN (Nf3)
record N | nr | pr  open record N, next record, previous record
moves | rows | fen | info
alt | ctrl | shift  highlight color
hl SQ | arrow SQ SQ | reset | flip
q | quit";

fn repl(session: &mut Session) -> Result<()> {
    let mut overlay = Overlay::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    show(session);
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        match command {
            "q" | "quit" => return Ok(()),
            "help" | "?" => println!("{HELP}"),
            "nr" => {
                session.next_record();
                show(session);
            }
            "pr" => {
                session.previous_record();
                show(session);
            }
            "record" => match parse_index(rest.first()) {
                Some(index) => match session.open_record(index) {
                    Ok(_) => show(session),
                    Err(e) => println!("{e}"),
                },
                None => println!("usage: record N"),
            },
            "alt" => overlay.set_modifier(Modifier::Alt),
            "ctrl" => overlay.set_modifier(Modifier::Ctrl),
            "shift" => overlay.set_modifier(Modifier::Shift),
            "hl" => match rest.first().and_then(|s| s.parse::<Square>().ok()) {
                Some(square) => {
                    overlay.toggle(square);
                    show_overlay(&overlay);
                }
                None => println!("usage: hl SQUARE"),
            },
            "arrow" => match (
                rest.first().and_then(|s| s.parse::<Square>().ok()),
                rest.get(1).and_then(|s| s.parse::<Square>().ok()),
            ) {
                (Some(from), Some(to)) => {
                    overlay.toggle_arrow(from, to);
                    show_overlay(&overlay);
                }
                _ => println!("usage: arrow FROM TO"),
            },
            "info" => show(session),
            "reset" => overlay.reset(),
            "flip" => println!("orientation: {:?}", overlay.flip()),
            _ => navigate(session, command, rest),
        }
    }
}

fn navigate(session: &mut Session, command: &str, rest: &[&str]) {
    let Some(nav) = session.navigator_mut() else {
        return;
    };

    match command {
        "n" | "next" => match nav.advance() {
            Step::Moved(_) => println!("{}", nav.fen()),
            Step::Saturated => println!("end of line"),
            Step::Prompt(prompt) => {
                let mainline = prompt.mainline.as_deref().unwrap_or("-");
                println!("branch point: main = {mainline}");
                for (i, first) in prompt.branches.iter().enumerate() {
                    println!("  var {i} = {first}");
                }
            }
        },
        "p" | "prev" => match nav.retreat() {
            Step::Saturated => println!("start of record"),
            _ => println!("{}", nav.fen()),
        },
        "main" => report(nav.choose(Continuation::Mainline).map(|_| nav.fen())),
        "var" => match parse_index(rest.first()) {
            Some(branch) => report(
                nav.choose(Continuation::Variation(branch))
                    .map(|_| nav.fen()),
            ),
            None => println!("usage: var N"),
        },
        "jump" => match parse_index(rest.first()) {
            Some(index) => {
                nav.jump_to_index(index);
                println!("{}", nav.fen());
            }
            None => println!("usage: jump I"),
        },
        "enter" => match (
            parse_index(rest.first()),
            parse_index(rest.get(1)),
            parse_index(rest.get(2)),
        ) {
            (Some(index), Some(branch), Some(offset)) => report(
                nav.jump_to_variation(index, branch, offset)
                    .map(|_| nav.fen()),
            ),
            _ => println!("usage: enter I B O"),
        },
        "play" => match rest.first() {
            Some(raw) => match nav.play(&parse_move(raw)) {
                Ok(PlayOutcome::Branched { index, branch, .. }) => {
                    println!("variation {branch} at {index}: {}", nav.fen());
                }
                Ok(_) => println!("{}", nav.fen()),
                Err(e) => println!("{e}"),
            },
            None => println!("usage: play MOVE"),
        },
        "moves" => println!("{}", moves::render(nav)),
        "rows" => {
            for row in moves::rows(nav) {
                println!("{row}");
            }
        }
        "fen" => println!("{}", nav.fen()),
        _ => println!("unknown command '{command}' (try help)"),
    }
}

fn report(result: Result<String, chess_study::StudyError>) {
    match result {
        Ok(fen) => println!("{fen}"),
        Err(e) => println!("{e}"),
    }
}

fn parse_index(raw: Option<&&str>) -> Option<usize> {
    raw.and_then(|s| s.parse().ok())
}

/// `e2e4` / `e7e8q` as squares, anything else as SAN.
fn parse_move(raw: &str) -> MoveInput {
    let squares = raw
        .get(0..2)
        .zip(raw.get(2..4))
        .and_then(|(from, to)| Some((from.parse::<Square>().ok()?, to.parse::<Square>().ok()?)));
    let promotion = match raw.len() {
        4 => Some(None),
        5 => raw.chars().last().and_then(Role::from_char).map(Some),
        _ => None,
    };

    match (squares, promotion) {
        (Some((from, to)), Some(promotion)) => MoveInput::Squares {
            from,
            to,
            promotion,
        },
        _ => MoveInput::san(raw),
    }
}

fn show(session: &Session) {
    let (Some(record), Some(nav)) = (session.record(), session.navigator()) else {
        println!("No content");
        return;
    };

    println!(
        "record {}/{}: {}",
        session.current_index() + 1,
        session.chapter().len(),
        record.title()
    );
    if !record.white().is_empty() || !record.black().is_empty() {
        println!("{} - {}", record.white(), record.black());
    }
    if !record.annotator().is_empty() {
        println!("annotator: {}", record.annotator());
    }
    if !record.annotation().is_empty() {
        println!("{}", record.annotation());
    }
    if let Some(diagnostics) = nav.diagnostics() {
        println!("warnings: {diagnostics}");
    }
    println!("{}", moves::render(nav));
    println!("{} ({:?} to move, {:?})", nav.fen(), nav.side_to_move(), nav.status());
}

fn show_overlay(overlay: &Overlay) {
    for highlight in overlay.highlights() {
        println!("  {} {}", highlight.square, highlight.color);
    }
    for arrow in overlay.arrows() {
        println!("  {}->{} {}", arrow.from, arrow.to, arrow.color);
    }
}
