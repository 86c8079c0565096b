/*!
 * The command-line user interface for taking quizzes.
 */
use std::io;

use colored::*;

use super::catalog::QuizQuestion;
use super::common::Result;
use super::iohelper::{prettyprint, prettyprint_colored, prompt, MyReadline};
use super::quiz::QuizResult;


const CHOICE_LETTERS: &str = "abcd";


pub struct CmdUI<W, R> {
    writer: W,
    reader: R,
    number: usize,
}


impl<W: io::Write, R: MyReadline> CmdUI<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self { writer, reader, number: 0 }
    }

    pub fn next(&mut self) {
        self.number += 1;
    }

    /// Show a question with its numbered choices.
    pub fn question(&mut self, question: &QuizQuestion) -> Result<()> {
        my_write!(self.writer, "\n")?;
        let prefix = format!("  ({}) ", self.number);
        prettyprint_colored(&mut self.writer, &question.question, &prefix, None, Some(Color::Cyan))?;
        for (letter, option) in CHOICE_LETTERS.chars().zip(question.options.iter()) {
            let prefix = format!("     ({}) ", letter);
            prettyprint(&mut self.writer, option, &prefix)?;
        }
        my_write!(self.writer, "\n")
    }

    /// Ask for one of `n_choices` letters. Returns the index of the chosen option, or
    /// `None` if the input ended.
    pub fn prompt_choice(&mut self, n_choices: usize) -> Result<Option<usize>> {
        loop {
            let response = match prompt(&mut self.reader, "> ")? {
                Some(response) => response,
                None => return Ok(None),
            };

            if let Some(index) = parse_choice(&response, n_choices) {
                return Ok(Some(index));
            }
            self.status("Please enter a letter.")?;
        }
    }

    pub fn correct(&mut self) -> Result<()> {
        prettyprint(&mut self.writer, &format!("{}", "Correct!".green()), "")
    }

    pub fn incorrect(&mut self, correction: Option<&str>) -> Result<()> {
        if let Some(correction) = correction {
            let message = format!(
                "{} The correct answer was {}.",
                "Incorrect.".red(),
                correction.green(),
            );
            prettyprint(&mut self.writer, &message, "")
        } else {
            prettyprint(&mut self.writer, &format!("{}", "Incorrect.".red()), "")
        }
    }

    pub fn reference(&mut self, reference: &str) -> Result<()> {
        prettyprint_colored(&mut self.writer, reference, "  See ", Some(Color::BrightBlue), None)
    }

    pub fn status(&mut self, text: &str) -> Result<()> {
        my_writeln!(self.writer, "{}", text)
    }

    pub fn warning(&mut self, text: &str) -> Result<()> {
        my_write!(self.writer, "\n")?;
        prettyprint_colored(
            &mut self.writer,
            &format!("Warning: {}", text),
            "  ",
            Some(Color::Red),
            None,
        )
    }

    pub fn results(&mut self, results: &QuizResult) -> Result<()> {
        if results.total > 0 {
            let score_as_str = format!("{:.1}%", results.score * 100.0);

            my_write!(self.writer, "\n\n")?;
            my_write!(self.writer, "Score: ")?;
            my_write!(self.writer, "{}", score_as_str.cyan())?;
            my_write!(self.writer, " out of ")?;
            my_write!(self.writer, "{}", format!("{}", results.total).cyan())?;
            if results.total == 1 {
                my_writeln!(self.writer, " question")?;
            } else {
                my_writeln!(self.writer, " questions")?;
            }
            my_write!(self.writer, "  {}", format!("{}", results.total_correct).green())?;
            my_write!(self.writer, " correct\n")?;
            my_write!(self.writer, "  {}", format!("{}", results.total_incorrect).red())?;
            my_write!(self.writer, " incorrect\n")?;
        }
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}


/// Accept a letter ("b") or a number counting from one ("2").
fn parse_choice(response: &str, n_choices: usize) -> Option<usize> {
    let response = response.trim().to_lowercase();
    let index = if let Some(index) = CHOICE_LETTERS.find(response.as_str()) {
        if response.len() == 1 {
            Some(index)
        } else {
            None
        }
    } else {
        response.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
    };
    index.filter(|i| *i < n_choices)
}
