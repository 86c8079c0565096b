/*!
 * The question catalog: an immutable list of multiple-choice questions, each tagged
 * with a category, a difficulty and a testament.
 *
 * The built-in catalog is compiled into the binary from `data/questions.json`. A
 * catalog in the same format can also be loaded from a file.
 */
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::common::{FilterOptions, QuizError, Result};


const BUILTIN_CATALOG: &str = include_str!("../data/questions.json");
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;


#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Characters,
    Stories,
    Verses,
    Geography,
    Miracles,
    Parables,
    Prophecy,
    Wisdom,
    History,
    General,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    Old,
    New,
    Both,
}


/// Represents a multiple-choice question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    /// Between two and four choices. Their order never changes once a question has
    /// been published, since `correct_answer` indexes into it.
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub category: Category,
    pub difficulty: Difficulty,
    pub testament: Testament,
    /// Scripture reference shown after the question is answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}


#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<QuizQuestion>,
}


impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        Difficulty::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| QuizError::UnknownValue { kind: "difficulty", value: s.to_string() })
    }
}


impl Category {
    pub const ALL: [Category; 10] = [
        Category::Characters,
        Category::Stories,
        Category::Verses,
        Category::Geography,
        Category::Miracles,
        Category::Parables,
        Category::Prophecy,
        Category::Wisdom,
        Category::History,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Characters => "characters",
            Category::Stories => "stories",
            Category::Verses => "verses",
            Category::Geography => "geography",
            Category::Miracles => "miracles",
            Category::Parables => "parables",
            Category::Prophecy => "prophecy",
            Category::Wisdom => "wisdom",
            Category::History => "history",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| QuizError::UnknownValue { kind: "category", value: s.to_string() })
    }
}


impl Testament {
    /// Return `true` if a question from this testament belongs in a quiz restricted
    /// to `wanted`. Questions tagged `Both` belong everywhere.
    pub fn matches(self, wanted: Testament) -> bool {
        self == Testament::Both || wanted == Testament::Both || self == wanted
    }
}

impl FromStr for Testament {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "old" => Ok(Testament::Old),
            "new" => Ok(Testament::New),
            "both" => Ok(Testament::Both),
            _ => Err(QuizError::UnknownValue { kind: "testament", value: s.to_string() }),
        }
    }
}


impl QuizQuestion {
    /// Make an easy, general question from both testaments. Mostly useful for tests.
    pub fn new(id: &str, question: &str, options: &[&str], correct_answer: usize) -> Self {
        QuizQuestion {
            id: String::from(id),
            question: String::from(question),
            options: options.iter().map(|o| String::from(*o)).collect(),
            correct_answer,
            category: Category::General,
            difficulty: Difficulty::Easy,
            testament: Testament::Both,
            reference: None,
        }
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| QuizError::InvalidQuestion {
            id: self.id.clone(),
            message: String::from(message),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is empty"));
        }
        if self.question.trim().is_empty() {
            return Err(invalid("question text is empty"));
        }
        if self.options.len() < MIN_OPTIONS || self.options.len() > MAX_OPTIONS {
            return Err(invalid("must have between two and four options"));
        }
        if self.correct_answer >= self.options.len() {
            return Err(invalid("correct answer is not one of the options"));
        }
        Ok(())
    }
}


impl Catalog {
    /// Build a catalog, checking that every question is well-formed and that no two
    /// questions share an id.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self> {
        let mut seen = HashSet::new();
        for question in questions.iter() {
            question.validate()?;
            if !seen.insert(question.id.as_str()) {
                return Err(QuizError::DuplicateQuestion(question.id.clone()));
            }
        }
        Ok(Catalog { questions })
    }

    /// The catalog that ships with the application.
    pub fn builtin() -> Result<Self> {
        Catalog::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let questions: Vec<QuizQuestion> = serde_json::from_str(data).map_err(QuizError::Json)?;
        Catalog::new(questions)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(QuizError::Io)?;
        Catalog::from_json(&data)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Return the questions filtered by the given command-line options (e.g.,
    /// `--category` and `--keyword`).
    pub fn filter_questions(&self, options: &FilterOptions) -> Vec<&QuizQuestion> {
        self.questions.iter().filter(|q| filter_question(q, options)).collect()
    }

    /// Count the questions in each category that pass the filters in `options`.
    pub fn count_by_category(&self, options: &FilterOptions) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for question in self.filter_questions(options) {
            *counts.entry(question.category).or_insert(0) += 1;
        }
        counts
    }
}


/// Return `true` if `q` satisfies the constraints in `options`.
pub fn filter_question(q: &QuizQuestion, options: &FilterOptions) -> bool {
    // Either no categories were specified, or `q` is in one of them.
    (options.categories.is_empty() || options.categories.contains(&q.category))
        && (options.difficulties.is_empty() || options.difficulties.contains(&q.difficulty))
        && options.testament.map_or(true, |t| q.testament.matches(t))
        && filter_question_by_keywords(q, &options.keywords)
}


/// Every keyword must appear in the question text or in one of its options.
fn filter_question_by_keywords(q: &QuizQuestion, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }

    let mut haystack = normalize(&q.question);
    for option in q.options.iter() {
        haystack.push('\n');
        haystack.push_str(&normalize(option));
    }
    keywords.iter().all(|keyword| haystack.contains(&normalize(keyword)))
}


fn normalize(text: &str) -> String {
    text.to_lowercase().nfc().collect::<String>()
}
