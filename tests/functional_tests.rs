use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Output, Stdio};

use regex::Regex;


const ONE_QUESTION: &str = r#"[
  {
    "id": "easy-ark",
    "question": "Who built the ark?",
    "options": ["Noah", "Moses"],
    "correctAnswer": 0,
    "category": "characters",
    "difficulty": "easy",
    "testament": "old",
    "reference": "Genesis 6:14"
  }
]"#;


#[test]
fn can_take_simple_quiz() {
    let dir = scratch_dir("simple");
    let catalog = write_catalog(&dir, ONE_QUESTION);

    play_quiz(
        &dir,
        &["--catalog", &catalog, "take", "-n", "1"],
        &[
            "(1) Who built the ark?",
            "(a) Noah",
            "(b) Moses",
            "> a",
            "Correct!",
            "See Genesis 6:14",
            "Score: 100.0% out of 1 question",
            "1 correct",
            "0 incorrect",
            "Well done! You are now on level 2.",
        ],
    );

    let output = run(&dir, &["level"]);
    assert_in_order(&output, &["Level 2", "Quizzes taken: 1", "Last score: 100.0%"]);

    let output = run(&dir, &["--catalog", &catalog, "stats"]);
    assert_in_order(&output, &["100.0%  of  1   Who built the ark?"]);
}


#[test]
fn wrong_answers_are_corrected() {
    let dir = scratch_dir("wrong");
    let catalog = write_catalog(&dir, ONE_QUESTION);

    play_quiz(
        &dir,
        &["--catalog", &catalog, "take", "-n", "1", "--no-save"],
        &[
            "(1) Who built the ark?",
            "(a) Noah",
            "(b) Moses",
            "> Noah",
            "Please enter a letter.",
            "> 2",
            "Incorrect. The correct answer was Noah.",
            "See Genesis 6:14",
            "Score: 0.0% out of 1 question",
            "0 correct",
            "1 incorrect",
        ],
    );

    // Nothing was saved.
    let output = run(&dir, &["level"]);
    assert_in_order(&output, &["Level 1", "Quizzes taken: 0"]);
    assert!(!output.contains("Last score"));
}


#[test]
fn quiz_is_cut_short_when_input_ends() {
    let dir = scratch_dir("eof");
    let output = run(&dir, &["take", "-n", "3"]);
    assert_in_order(&output, &["(1) "]);
    assert!(!output.contains("(2) "));
    assert!(!output.contains("Score:"));
}


#[test]
fn can_count_questions() {
    let dir = scratch_dir("count");

    assert_eq!(run(&dir, &["count"]).trim(), "36");
    assert_eq!(run(&dir, &["count", "--difficulty", "hard"]).trim(), "8");
    assert_eq!(run(&dir, &["count", "--testament", "new"]).trim(), "16");
    assert_eq!(
        run(&dir, &["count", "--category", "miracles", "--category", "parables"]).trim(),
        "7"
    );
}


#[test]
fn can_list_categories() {
    let dir = scratch_dir("categories");
    let output = run(&dir, &["count", "--list-categories"]);

    assert_in_order(
        &output,
        &["Available categories:", "characters (6)", "stories (5)", "general (1)"],
    );
    let re = Regex::new(r"(?m)^  [a-z]+ \(\d+\)$").unwrap();
    assert_eq!(re.find_iter(&output).count(), 10);
}


#[test]
fn stats_are_empty_at_first() {
    let dir = scratch_dir("stats");
    let output = run(&dir, &["stats"]);
    assert_eq!(output.trim(), "No questions have been answered yet.");
}


#[test]
fn can_reset_progress() {
    let dir = scratch_dir("reset");
    let catalog = write_catalog(&dir, ONE_QUESTION);

    play_quiz(&dir, &["--catalog", &catalog, "take", "-n", "1"], &["> a", "Correct!"]);
    assert_in_order(&run(&dir, &["level"]), &["Level 2"]);

    let output = run(&dir, &["reset", "-f"]);
    assert_eq!(output.trim(), "Progress has been reset.");
    assert_in_order(&run(&dir, &["level"]), &["Level 1", "Quizzes taken: 0"]);
}


#[test]
fn sqlite_backend_keeps_progress() {
    let dir = scratch_dir("sqlite");
    let catalog = write_catalog(&dir, ONE_QUESTION);

    play_quiz(
        &dir,
        &["--backend", "sqlite", "--catalog", &catalog, "take", "-n", "1"],
        &["> a", "Correct!"],
    );

    assert!(dir.join("progress.sqlite3").exists());
    assert_in_order(&run(&dir, &["--backend", "sqlite", "level"]), &["Level 2"]);
    // The JSON backend keeps its own, separate progress.
    assert_in_order(&run(&dir, &["level"]), &["Level 1"]);
}


#[test]
fn invalid_catalog_is_an_error() {
    let dir = scratch_dir("invalid");
    let catalog = write_catalog(
        &dir,
        r#"[{"id": "x", "question": "?", "options": ["a"], "correctAnswer": 0,
             "category": "general", "difficulty": "easy", "testament": "both"}]"#,
    );

    let output = spawn(&dir, &["--catalog", &catalog, "count"])
        .wait_with_output()
        .expect("Failed to read stdout");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid question 'x'"), "stderr was {:?}", stderr);
}


fn play_quiz(dir: &PathBuf, args: &[&str], in_out: &[&str]) {
    let mut child = spawn(dir, args);
    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        for line in in_out {
            if line.starts_with("> ") {
                stdin_write(stdin, &line[2..]);
            }
        }
    }

    let stdout = read_stdout(child.wait_with_output().expect("Failed to read stdout"));
    let expected: Vec<&str> =
        in_out.iter().filter(|line| !line.starts_with("> ")).cloned().collect();
    assert_in_order(&stdout, &expected);
}

fn run(dir: &PathBuf, args: &[&str]) -> String {
    let child = spawn(dir, args);
    read_stdout(child.wait_with_output().expect("Failed to read stdout"))
}

fn assert_in_order(mock_stdout: &str, data: &[&str]) {
    let mut last_pos = 0;
    for datum in data {
        if let Some(pos) = mock_stdout[last_pos..].find(datum) {
            // `pos` is relative to the slice `mock_stdout[last_pos..]`.
            last_pos = (pos + last_pos) + datum.len();
        } else {
            panic!("Missing: {:?}; Contents of stdout: {:?}", datum, mock_stdout);
        }
    }
}

fn spawn(dir: &PathBuf, args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_versequiz"))
        .arg("--no-color")
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn child process")
}

fn read_stdout(output: Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stdin_write(stdin: &mut ChildStdin, line: &str) {
    stdin.write_all(line.as_bytes()).expect("Failed to write to stdin");
    stdin.write_all("\n".as_bytes()).expect("Failed to write to stdin");
}

fn scratch_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("versequiz-test-{}-{}", std::process::id(), name));
    if dir.exists() {
        fs::remove_dir_all(&dir).expect("Failed to clear scratch directory");
    }
    fs::create_dir_all(&dir).expect("Failed to create scratch directory");
    dir
}

fn write_catalog(dir: &PathBuf, contents: &str) -> String {
    let path = dir.join("catalog.json");
    fs::write(&path, contents).expect("Failed to write catalog");
    path.to_string_lossy().to_string()
}
