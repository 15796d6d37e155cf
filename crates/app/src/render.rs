use std::fmt::Write as _;

use quiz_core::model::{AnswerMode, QuestionStatus};
use services::{QuizSession, SavedSessionStatus, View};

fn status_mark(status: Option<QuestionStatus>) -> &'static str {
    match status {
        Some(QuestionStatus::Correct) => "+",
        Some(QuestionStatus::Wrong) => "x",
        None => " ",
    }
}

pub fn landing(status: SavedSessionStatus, user: Option<&str>) -> String {
    let mut out = String::from("== Practice quiz ==\n");
    match user {
        Some(user) => {
            let _ = writeln!(out, "signed in as {user}");
        }
        None => out.push_str("not signed in (progress is kept on this device only)\n"),
    }
    out.push_str(match status {
        SavedSessionStatus::Loading => "checking for a saved session...\n",
        SavedSessionStatus::Available => "a saved session is available: `resume` or `start`\n",
        SavedSessionStatus::Unavailable => "type `start` to begin\n",
    });
    out
}

fn header(session: &QuizSession) -> String {
    let progress = session.progress();
    format!(
        "[{}/{}] answered {} | correct {} | wrong {} | accuracy {}%{}",
        session.current_index() + 1,
        progress.working_set_len,
        progress.answered,
        progress.correct,
        progress.wrong,
        progress.accuracy_percent,
        if progress.all_answered { " | all answered" } else { "" },
    )
}

/// Current question with options, selection and (once checked) the verdict.
pub fn question(session: &QuizSession) -> String {
    let Some(question) = session.current_question() else {
        return "no question in this session\n".to_owned();
    };
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(session));
    let _ = writeln!(
        out,
        "{}{}{}",
        question.group_label(),
        if question.mode() == AnswerMode::Multiple {
            " (choose all that apply)"
        } else {
            ""
        },
        if session.is_flagged(question.id()) { " [flagged]" } else { "" },
    );
    let _ = writeln!(out, "\n{}\n", question.prompt());

    let checked = session.is_checked();
    for option in question.options() {
        let selected = session.selection().contains(&option.id);
        let correct = question.correct_answers().contains(&option.id);
        let verdict = match (checked, selected, correct) {
            (true, _, true) => " <- correct",
            (true, true, false) => " <- your answer",
            _ => "",
        };
        let _ = writeln!(
            out,
            "  [{}] {}) {}{}",
            if selected { "*" } else { " " },
            option.id,
            option.text,
            verdict
        );
    }

    if checked {
        out.push_str(if session.is_correct() {
            "\nCorrect!\n"
        } else {
            "\nIncorrect. `clear` to try again or `next` to move on.\n"
        });
        if let Some(explanation) = question.explanation() {
            let _ = writeln!(out, "{explanation}");
        }
    }
    out
}

/// Question list grouped by category with per-category tallies.
pub fn question_list(session: &QuizSession) -> String {
    let mut out = String::new();
    for group in session.category_breakdown() {
        let _ = writeln!(
            out,
            "{} ({} correct, {} wrong, {} total)",
            group.label,
            group.correct,
            group.wrong,
            group.total()
        );
        for item in &group.items {
            let _ = writeln!(
                out,
                "  {}{:>3} [{}] #{}{}",
                if item.is_current { ">" } else { " " },
                item.index + 1,
                status_mark(item.status),
                item.question_id,
                if item.flagged { " (flagged)" } else { "" },
            );
        }
    }
    out
}

/// Review screen: totals plus every wrong answer with what was chosen.
pub fn review(session: &QuizSession) -> String {
    let progress = session.progress();
    let mut out = String::from("== Review ==\n");
    let _ = writeln!(
        out,
        "answered {} of {} | correct {} | wrong {} | accuracy {}%",
        progress.answered,
        progress.total_questions,
        progress.correct,
        progress.wrong,
        progress.accuracy_percent
    );

    if session.wrong_answers().is_empty() {
        out.push_str("no wrong answers\n");
    }
    for wrong in session.wrong_answers() {
        let chosen: Vec<_> = wrong.selected.iter().map(ToString::to_string).collect();
        let correct: Vec<_> = wrong
            .question
            .correct_answers()
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(
            out,
            "- {}\n    you chose {}, correct is {}",
            wrong.question.prompt(),
            chosen.join(", "),
            correct.join(", ")
        );
    }
    let _ = writeln!(out, "flagged: {}", session.flagged().len());
    out.push_str("`retry-wrong`, `retry-flagged`, `quiz` to go back or `start` for a new session\n");
    out
}

pub fn screen(session: &QuizSession) -> String {
    match session.view() {
        View::Review => review(session),
        View::Quiz | View::Landing => question(session),
    }
}
