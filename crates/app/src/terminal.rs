//! Plain-text rendering of services state, and line input mapping.

use quiz_core::flashcards::{CardFace, FlashcardDeck};
use quiz_core::model::{Lesson, MatchSide, QuestionKind, TestResult};
use quiz_core::stats::{ChallengingLesson, DashboardStats};
use services::{SessionInput, SessionPhase, SessionView, Step};

const MATCH_LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Map one line typed by the learner to a session input.
///
/// Commands start with `:` so they never collide with answers.
pub fn parse_input(line: &str, view: &SessionView) -> Option<SessionInput> {
    let line = line.trim();
    match line {
        ":q" | ":quit" => return Some(SessionInput::Abandon),
        ":skip" | ":?" => return Some(SessionInput::DontKnow),
        ":more" | ":+" => return Some(SessionInput::ExtendTime),
        ":next" => return Some(SessionInput::AdvanceNow),
        _ => {}
    }

    match view.phase {
        SessionPhase::Explaining => Some(SessionInput::AdvanceNow),
        SessionPhase::AwaitingAnswer => {
            let question = view.question.as_ref()?;
            match &question.kind {
                QuestionKind::Matching(set) => {
                    if let Ok(n) = line.parse::<usize>() {
                        let term = set.term_order.get(n.checked_sub(1)?)?;
                        return Some(SessionInput::Select(MatchSide::Term, term.clone()));
                    }
                    let mut chars = line.chars();
                    let (Some(letter), None) = (chars.next(), chars.next()) else {
                        return None;
                    };
                    let idx = MATCH_LETTERS
                        .iter()
                        .position(|c| *c == letter.to_ascii_lowercase())?;
                    let translation = set.translation_order.get(idx)?;
                    Some(SessionInput::Select(
                        MatchSide::Translation,
                        translation.clone(),
                    ))
                }
                QuestionKind::MultipleChoice { options, .. } => {
                    if line.is_empty() {
                        return None;
                    }
                    let picked = line
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| options.get(i));
                    Some(SessionInput::Submit(
                        picked.cloned().unwrap_or_else(|| line.to_owned()),
                    ))
                }
                QuestionKind::TextInput { .. } => {
                    (!line.is_empty()).then(|| SessionInput::Submit(line.to_owned()))
                }
            }
        }
        SessionPhase::Idle => None,
    }
}

pub fn render_view(view: &SessionView) -> String {
    let mut out = String::new();
    let Some(question) = view.question.as_ref() else {
        return out;
    };
    let p = view.progress;

    if view.phase == SessionPhase::Explaining {
        out.push_str("  correct!\n");
        if let Some(explanation) = &view.explanation {
            out.push_str(&format!("  {explanation}\n"));
        }
        out.push_str("  (enter to continue)\n");
        return out;
    }

    let pass = if p.repeat_mode { "repeat" } else { "question" };
    out.push_str(&format!(
        "\n[{pass} {}/{}] {}\n",
        p.position, p.pass_length, question.prompt
    ));

    match &question.kind {
        QuestionKind::MultipleChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                out.push_str(&format!("  {}. {option}\n", i + 1));
            }
        }
        QuestionKind::TextInput { .. } => out.push_str("  type your answer\n"),
        QuestionKind::Matching(set) => {
            let done = |side: MatchSide, value: &str| {
                view.matched.iter().any(|m| match side {
                    MatchSide::Term => m.term == value,
                    MatchSide::Translation => m.translation == value,
                })
            };
            for (i, (term, translation)) in set
                .term_order
                .iter()
                .zip(&set.translation_order)
                .enumerate()
            {
                let left = if done(MatchSide::Term, term) {
                    format!("   {term} ✓")
                } else {
                    format!("{}. {term}", i + 1)
                };
                let right = if done(MatchSide::Translation, translation) {
                    format!("   {translation} ✓")
                } else {
                    format!("{}. {translation}", MATCH_LETTERS[i])
                };
                out.push_str(&format!("  {left:<24} {right}\n"));
            }
            if let Some((_, value)) = &view.pending_match {
                out.push_str(&format!("  selected: {value}\n"));
            }
        }
    }

    if let Some(left) = view.time_left {
        out.push_str(&format!("  {left}s left"));
        if view.can_extend {
            out.push_str(" (:more for extra time)");
        }
        out.push('\n');
    }
    out
}

/// One-line feedback for a step, if it warrants any.
pub fn render_step(step: &Step) -> Option<String> {
    match step {
        Step::Incorrect => Some("  not quite, try again (:skip if you don't know)".into()),
        Step::PairRejected => Some("  those two don't match".into()),
        Step::Ticked { remaining } if *remaining <= 5 && *remaining > 0 => {
            Some(format!("  {remaining}s..."))
        }
        Step::RepeatStarted { questions } => Some(format!(
            "\nNow repeating {questions} question(s) you missed."
        )),
        Step::Abandoned => Some("Lesson paused. Run `play` again to resume.".into()),
        _ => None,
    }
}

pub fn render_result(result: &TestResult) -> String {
    let mut out = format!(
        "\n{} finished: score {}%  ({}/{} without mistakes, {}s)\n",
        result.lesson_title,
        result.score,
        result.correct_answers,
        result.total_questions,
        result.time_spent_secs,
    );
    if !result.incorrect_answers.is_empty() {
        out.push_str("To review:\n");
        for missed in &result.incorrect_answers {
            out.push_str(&format!(
                "  {} -> {} ({} miss{})\n",
                missed.prompt,
                missed.correct_answer,
                missed.attempts,
                if missed.attempts == 1 { "" } else { "es" }
            ));
        }
    }
    out
}

pub fn render_lessons(lessons: &[Lesson]) -> String {
    let mut out = String::new();
    for lesson in lessons {
        let best = lesson
            .best_score()
            .map_or_else(|| "-".to_owned(), |s| format!("{s}%"));
        out.push_str(&format!(
            "{:>3}  {:<20} progress {:>3}%  best {:>4}  {}\n",
            lesson.id().value(),
            lesson.title(),
            lesson.progress(),
            best,
            lesson.description(),
        ));
    }
    out
}

pub fn render_dashboard(stats: &DashboardStats, challenging: &[ChallengingLesson]) -> String {
    let mut out = format!(
        "Lessons completed: {}/{}\n\
         Average progress:  {}%\n\
         Average score:     {}%\n\
         Average best:      {}%\n\
         Attempts:          {}\n\
         Time spent:        {}m {}s\n\
         Completed today:   {}\n",
        stats.completed_lessons,
        stats.total_lessons,
        stats.average_progress,
        stats.average_score,
        stats.average_best_score,
        stats.attempts,
        stats.total_time_secs / 60,
        stats.total_time_secs % 60,
        stats.completed_today,
    );
    if !challenging.is_empty() {
        out.push_str("\nMost challenging:\n");
        for lesson in challenging {
            out.push_str(&format!(
                "  {:<20} {:>5.1}% errors over {} attempt(s)\n",
                lesson.lesson_title, lesson.error_rate, lesson.attempts
            ));
        }
    }
    out
}

pub fn render_card(deck: &FlashcardDeck) -> String {
    let Some(set) = deck.current_set() else {
        return "no vocabulary available\n".to_owned();
    };
    let (pos, total) = deck.position();
    let face = match deck.face() {
        CardFace::Term => "term",
        CardFace::Translation => "translation",
    };
    format!(
        "[{} {pos}/{total}] {face}: {}\n",
        set.title,
        deck.visible_text().unwrap_or("-"),
    )
}
