/*!
 * Take Bible quizzes from the command line.
 */
use std::io;
use std::io::Write;

use colored::*;
use structopt::StructOpt;

use versequiz::catalog::Catalog;
use versequiz::common::{
    is_broken_pipe, Command, CountOptions, Options, QuizError, ResetOptions, Result,
    StatsOptions, TakeOptions,
};
use versequiz::iohelper::{prettyprint_colored, yesno};
use versequiz::persistence::{self, KeyValueStore, UsageLedger};
use versequiz::ui::CmdUI;
use versequiz::{my_writeln, quiz};


fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = Options::from_args();
    if options.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(options) {
        match e {
            QuizError::ReadlineInterrupted | QuizError::ReadlineEof => {}
            ref e if is_broken_pipe(e) => {}
            e => {
                eprintln!("{}: {}", "Error".red(), e);
                ::std::process::exit(2);
            }
        }
    }
}


fn run(options: Options) -> Result<()> {
    let catalog = match &options.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };

    let dir = persistence::require_app_dir_path(options.data_dir.as_deref())?;
    let mut ledger = persistence::open_ledger(options.backend, &dir)?;

    match options.cmd {
        Command::Take(options) => main_take(&catalog, &mut ledger, options),
        Command::Count(options) => main_count(&catalog, options),
        Command::Stats(options) => main_stats(&catalog, &ledger, options),
        Command::Level => main_level(&ledger),
        Command::Reset(options) => main_reset(&mut ledger, options),
    }
}


/// The main function for the `take` subcommand.
fn main_take<S: KeyValueStore>(
    catalog: &Catalog,
    ledger: &mut UsageLedger<S>,
    options: TakeOptions,
) -> Result<()> {
    let mut ui = CmdUI::new(io::stdout(), rustyline::Editor::<()>::new());
    quiz::take(&mut ui, catalog, ledger, &options)?;
    Ok(())
}


/// The main function for the `count` subcommand.
fn main_count(catalog: &Catalog, options: CountOptions) -> Result<()> {
    let mut stdout = io::stdout();

    if options.list_categories {
        my_writeln!(stdout, "Available categories:")?;
        for (category, n) in catalog.count_by_category(&options.filter_opts) {
            my_writeln!(stdout, "  {} ({})", category, n)?;
        }
    } else {
        let filtered = catalog.filter_questions(&options.filter_opts);
        my_writeln!(stdout, "{}", filtered.len())?;
    }
    Ok(())
}


/// The main function for the `stats` subcommand.
fn main_stats<S: KeyValueStore>(
    catalog: &Catalog,
    ledger: &UsageLedger<S>,
    options: StatsOptions,
) -> Result<()> {
    let mut stdout = io::stdout();
    let mut lines = quiz::stats_report(catalog, &ledger.load_stats(), options.sort);

    if lines.is_empty() {
        my_writeln!(stdout, "No questions have been answered yet.")?;
        return Ok(());
    }

    if let Some(n) = options.num_to_show {
        lines.truncate(n);
    }

    for line in lines.iter() {
        let prefix = format!("{:>5.1}%  of {:>2}   ", line.score, line.attempts);
        prettyprint_colored(&mut stdout, &line.text, &prefix, None, Some(Color::Cyan))?;
    }
    Ok(())
}


/// The main function for the `level` subcommand.
fn main_level<S: KeyValueStore>(ledger: &UsageLedger<S>) -> Result<()> {
    let mut stdout = io::stdout();
    let progress = ledger.load_level_progress();

    my_writeln!(stdout, "Level {}", format!("{}", progress.level).cyan())?;
    my_writeln!(stdout, "Quizzes taken: {}", progress.sessions_completed)?;
    if let Some(score) = progress.last_score {
        my_writeln!(stdout, "Last score: {:.1}%", score * 100.0)?;
    }
    Ok(())
}


/// The main function for the `reset` subcommand.
fn main_reset<S: KeyValueStore>(ledger: &mut UsageLedger<S>, options: ResetOptions) -> Result<()> {
    let mut reader = rustyline::Editor::<()>::new();
    let confirm_prompt = "Are you sure you want to forget all progress? ";
    if options.force || yesno(&mut reader, confirm_prompt) {
        ledger.reset()?;
        my_writeln!(io::stdout(), "Progress has been reset.")?;
    }
    Ok(())
}
