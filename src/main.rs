mod book_builder;
mod conversion; // Adapter tools between crates pleco and shakmaty
mod engine;
mod error;
mod opening_book;
mod position;

use crate::book_builder::BookBuilder;
use crate::engine::{EngineOption, UciEngine};
use crate::error::Error;
use crate::opening_book::polyglot::{PolyglotEntry, ENTRY_SIZE};
use crate::opening_book::{format_key, MAX_BOOK_WEIGHT};
use crate::position::{Fen, Position};

use log::{debug, info, warn, Level, LevelFilter, Metadata, Record};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use structopt::StructOpt;

/// Seed a Polyglot opening book with an engine's best move
#[derive(StructOpt, Debug)]
#[structopt(name = "FEN Book Builder")]
struct Opt {
    /// Position to analyse, as FEN
    #[structopt(
        short,
        long,
        default_value = "rnbqkbnr/pp1p1ppp/2p1p3/8/3PP3/8/PPP2PPP/RNBQKBNR w KQkq - 0 1"
    )]
    fen: String,

    /// UCI engine executable
    #[structopt(short, long, default_value = "stockfish")]
    engine: String,

    /// Search depth handed to the engine
    #[structopt(short, long, default_value = "12")]
    depth: u32,

    /// Polyglot book file to write
    #[structopt(short, long, default_value = "fenbook.bin", parse(from_os_str))]
    output: PathBuf,

    /// Weight given to the engine's move
    #[structopt(short, long, default_value = "1000")]
    weight: u16,

    /// Engine option as NAME=VALUE, may be repeated
    #[structopt(long = "option")]
    options: Vec<EngineOption>,

    /// Print more additional information
    #[structopt(name="verbose", short, long, parse(from_occurrences = log_level))]
    log_level: LevelFilter,
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

fn log_level(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn build_book_from_fen(opt: &Opt) -> Result<usize, Error> {
    let position = Position::new(Fen::new(&opt.fen)?)?;
    info!(
        "Position '{}' has key {}",
        position.fen(),
        format_key(position.key())
    );
    debug!("\n{}", position.board().pretty_string());

    let weight = opt.weight.min(MAX_BOOK_WEIGHT);
    let mut builder = BookBuilder::new(weight);
    {
        let no_args: [&str; 0] = [];
        let mut engine = UciEngine::spawn(&opt.engine, &no_args, &opt.options)?;
        builder.add_analysis(&position, &mut engine, opt.depth)?;
    }

    let book = builder.into_book();
    if book.is_empty() {
        warn!("Book is empty; '{}' will be empty too", opt.output.display());
    }
    let count = book.save_as_polyglot(&opt.output)?;
    info!(
        "Wrote {} entries for {} positions",
        book.entry_count(),
        book.len()
    );
    if log::log_enabled!(Level::Debug) {
        dump_book(&opt.output)?;
    }
    Ok(count)
}

fn dump_book(path: &Path) -> Result<(), Error> {
    let data = fs::read(path)?;
    for chunk in data.chunks(ENTRY_SIZE) {
        let entry = PolyglotEntry::from_bytes(chunk)?;
        debug!(
            "{} move {:#06x} weight {} learn {}",
            format_key(entry.key),
            entry.mv,
            entry.weight,
            entry.learn
        );
    }
    Ok(())
}

pub fn main() -> Result<(), Error> {
    let now = Instant::now();

    let opt = Opt::from_args();

    log::set_logger(&LOGGER).map(|()| log::set_max_level(opt.log_level))?;

    if opt.weight > MAX_BOOK_WEIGHT {
        warn!(
            "Weight {} exceeds the maximum of {}; using {}",
            opt.weight,
            MAX_BOOK_WEIGHT,
            MAX_BOOK_WEIGHT
        );
    }

    build_book_from_fen(&opt)?;
    println!("Book saved -> {}", opt.output.display());

    info!(
        "Total runtime: {:.2} s",
        now.elapsed().as_millis() as f64 / 1000.0
    );

    Ok(())
}
