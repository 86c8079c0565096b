/*!
 * Definitions of data structures used by several modules, such as `QuizError` and the
 * various structs that hold command-line arguments.
 */
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;

use super::catalog::{Category, Difficulty, Testament};


pub type Result<T> = ::std::result::Result<T, QuizError>;


#[derive(Debug)]
pub enum QuizError {
    /// For when the application directory cannot be created.
    CannotMakeAppDir(PathBuf),
    Io(io::Error),
    /// For JSON errors.
    Json(serde_json::Error),
    Sql(rusqlite::Error),
    /// A question in a catalog file breaks one of the catalog's rules.
    InvalidQuestion { id: String, message: String },
    DuplicateQuestion(String),
    /// A command-line value that does not name a known category, difficulty, etc.
    UnknownValue { kind: &'static str, value: String },
    EmptyQuiz,
    ReadlineInterrupted,
    ReadlineEof,
    ReadlineOther,
}


impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QuizError::CannotMakeAppDir(ref path) => {
                write!(
                    f,
                    "unable to create application directory at {}",
                    path.to_string_lossy()
                )
            }
            QuizError::Io(ref err) => write!(f, "IO error ({})", err),
            QuizError::Json(ref err) => write!(f, "could not parse JSON ({})", err),
            QuizError::Sql(ref err) => write!(f, "database error ({})", err),
            QuizError::InvalidQuestion { ref id, ref message } => {
                write!(f, "invalid question '{}': {}", id, message)
            }
            QuizError::DuplicateQuestion(ref id) => {
                write!(f, "question id '{}' appears more than once", id)
            }
            QuizError::UnknownValue { kind, ref value } => {
                write!(f, "unknown {} '{}'", kind, value)
            }
            QuizError::EmptyQuiz => write!(f, "no questions found"),
            QuizError::ReadlineInterrupted | QuizError::ReadlineEof => Ok(()),
            QuizError::ReadlineOther => write!(f, "error while reading input"),
        }
    }
}


impl error::Error for QuizError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            QuizError::Io(ref err) => Some(err),
            QuizError::Json(ref err) => Some(err),
            QuizError::Sql(ref err) => Some(err),
            _ => None,
        }
    }
}


pub fn is_broken_pipe(e: &QuizError) -> bool {
    if let QuizError::Io(e) = e {
        if let io::ErrorKind::BrokenPipe = e.kind() {
            return true;
        }
    }
    false
}


/// Holds the command-line configuration for the application.
#[derive(StructOpt)]
#[structopt(name = "versequiz", about = "Take Bible quizzes from the command line.")]
pub struct Options {
    /// Keep quiz progress in a particular directory.
    #[structopt(short = "d", long = "data-dir", parse(from_os_str))]
    pub data_dir: Option<PathBuf>,
    /// Where quiz progress is stored, either 'json' or 'sqlite'.
    #[structopt(long = "backend", default_value = "json")]
    pub backend: Backend,
    /// Load questions from a JSON file instead of the built-in catalog.
    #[structopt(long = "catalog", parse(from_os_str))]
    pub catalog: Option<PathBuf>,
    /// Do not emit colorized output.
    #[structopt(long = "no-color")]
    pub no_color: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Take a quiz.
    #[structopt(name = "take")]
    Take(TakeOptions),
    /// Count questions or categories.
    #[structopt(name = "count")]
    Count(CountOptions),
    /// Report how previously asked questions went.
    #[structopt(name = "stats")]
    Stats(StatsOptions),
    /// Show the current level.
    #[structopt(name = "level")]
    Level,
    /// Forget all progress.
    #[structopt(name = "reset")]
    Reset(ResetOptions),
}

#[derive(StructOpt)]
pub struct TakeOptions {
    /// Limit the total number of questions.
    #[structopt(short = "n", default_value = "10")]
    pub num_to_ask: usize,
    /// Choose questions for a level from 1 to 6 instead of the saved level.
    #[structopt(long = "level")]
    pub level: Option<u8>,
    /// Ignore the level and choose from the whole catalog.
    #[structopt(long = "any-level")]
    pub any_level: bool,
    /// Do not record the results.
    #[structopt(long = "no-save")]
    pub no_save: bool,
    #[structopt(flatten)]
    pub filter_opts: FilterOptions,
}

#[derive(StructOpt)]
pub struct CountOptions {
    /// List categories instead of counting questions.
    #[structopt(long = "list-categories")]
    pub list_categories: bool,
    #[structopt(flatten)]
    pub filter_opts: FilterOptions,
}

/// These filtering options are shared between the `take` and `count` subcommands.
#[derive(StructOpt, Default)]
pub struct FilterOptions {
    /// Only include questions in the given category.
    #[structopt(long = "category")]
    pub categories: Vec<Category>,
    /// Only include questions of the given difficulty.
    #[structopt(long = "difficulty")]
    pub difficulties: Vec<Difficulty>,
    /// Only include questions from the given testament.
    #[structopt(long = "testament")]
    pub testament: Option<Testament>,
    /// Filter by keyword.
    #[structopt(short = "k", long = "keyword")]
    pub keywords: Vec<String>,
}

#[derive(StructOpt)]
pub struct StatsOptions {
    /// One of 'best', 'worst', 'most' or 'least'. Defaults to 'best'.
    #[structopt(short = "s", long = "sort", default_value = "best")]
    pub sort: SortOrder,
    /// Only show the first `n` results.
    #[structopt(short = "n")]
    pub num_to_show: Option<usize>,
}

#[derive(StructOpt)]
pub struct ResetOptions {
    /// Reset without prompting for confirmation.
    #[structopt(short = "f", long = "force")]
    pub force: bool,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Json,
    Sqlite,
}

impl FromStr for Backend {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(QuizError::UnknownValue { kind: "backend", value: s.to_string() }),
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Best,
    Worst,
    Most,
    Least,
}

impl FromStr for SortOrder {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "best" => Ok(SortOrder::Best),
            "worst" => Ok(SortOrder::Worst),
            "most" => Ok(SortOrder::Most),
            "least" => Ok(SortOrder::Least),
            _ => Err(QuizError::UnknownValue { kind: "sort order", value: s.to_string() }),
        }
    }
}


impl TakeOptions {
    pub fn new() -> Self {
        TakeOptions {
            num_to_ask: 10,
            level: None,
            any_level: false,
            no_save: false,
            filter_opts: FilterOptions::new(),
        }
    }
}


impl FilterOptions {
    pub fn new() -> Self {
        Default::default()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_take_options() {
        let options = Options::from_iter_safe(&[
            "versequiz", "--backend", "sqlite", "take", "-n", "5", "--level", "3",
            "--category", "miracles",
        ]).unwrap();

        assert_eq!(options.backend, Backend::Sqlite);
        if let Command::Take(take) = options.cmd {
            assert_eq!(take.num_to_ask, 5);
            assert_eq!(take.level, Some(3));
            assert_eq!(take.filter_opts.categories, vec![Category::Miracles]);
        } else {
            panic!("expected take subcommand");
        }
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        let result = Options::from_iter_safe(&["versequiz", "stats", "-s", "loudest"]);
        assert!(result.is_err());
    }
}
