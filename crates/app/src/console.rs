use quiz_core::model::HistoryStats;
use services::{QuizHistoryItem, QuizService, QuizSnapshot, Screen, Selection, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tracing::warn;

const HISTORY_LIMIT: usize = 20;

/// One line of input, interpreted for the screen it was typed on.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Resume,
    NewQuiz,
    History,
    Quit,
    Back,
    Start(usize),
    Choose(usize),
    Continue,
    Suspend,
    Abandon,
    Restart,
    Unknown,
}

fn parse_command(screen: Screen, line: &str) -> Command {
    let input = line.trim().to_ascii_lowercase();
    match (screen, input.as_str()) {
        (_, "q" | "quit") => Command::Quit,
        (Screen::Start, "r") => Command::Resume,
        (Screen::Start, "n") => Command::NewQuiz,
        (Screen::Start, "h") => Command::History,
        (Screen::Config, "b") | (Screen::History, "b" | "") => Command::Back,
        (Screen::Config, "") => Command::Start(0),
        (Screen::Config, n) => n.parse().map_or(Command::Unknown, Command::Start),
        (Screen::Quiz, "" | "c") => Command::Continue,
        (Screen::Quiz, "s") => Command::Suspend,
        (Screen::Quiz, "x") => Command::Abandon,
        (Screen::Quiz, n) => match n.parse::<usize>() {
            Ok(choice) if choice > 0 => Command::Choose(choice - 1),
            _ => Command::Unknown,
        },
        (Screen::Results, "r") => Command::Restart,
        (Screen::Results, "m") => Command::Back,
        (Screen::Results, "h") => Command::History,
        _ => Command::Unknown,
    }
}

/// Drive the quiz from stdin until the user quits or input ends.
///
/// # Errors
///
/// Returns an error if stdin cannot be read. Storage failures are reported
/// and the loop keeps going.
pub async fn run(quiz: &mut QuizService) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(stdin()).lines();

    loop {
        render(quiz).await;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let command = parse_command(quiz.screen(), &line);
        if command == Command::Quit {
            if quiz.screen() == Screen::Quiz {
                quiz.suspend();
            }
            return Ok(());
        }

        if let Err(err) = apply(quiz, command).await {
            report(&err);
        }
    }
}

async fn apply(quiz: &mut QuizService, command: Command) -> Result<(), SessionError> {
    match (quiz.screen(), command) {
        (Screen::Start, Command::Resume) => {
            if !quiz.resume().await? {
                println!("Nothing to resume.");
            }
        }
        (Screen::Start, Command::NewQuiz) => {
            quiz.show_config()?;
        }
        (Screen::Start | Screen::Results, Command::History) => {
            quiz.show_history();
        }
        (Screen::Config, Command::Back) => {
            quiz.cancel_config();
        }
        (Screen::Config, Command::Start(requested)) => {
            let requested = if requested == 0 {
                quiz.length_bounds().1
            } else {
                requested
            };
            quiz.start(requested).await?;
        }
        (Screen::Quiz, Command::Choose(index)) => {
            let answer = quiz.select_answer(index).await?;
            if let Selection::AlreadyAnswered { selected } = answer.selection {
                println!("Already answered with choice {}.", selected + 1);
            }
        }
        (Screen::Quiz, Command::Continue) => match quiz.advance().await {
            Err(SessionError::NoSelection) => println!("Pick an answer first."),
            other => {
                other?;
            }
        },
        (Screen::Quiz, Command::Suspend) => {
            quiz.suspend();
        }
        (Screen::Quiz, Command::Abandon) => {
            quiz.abandon().await?;
        }
        (Screen::Results, Command::Restart) => {
            quiz.restart().await?;
        }
        (Screen::Results, Command::Back) => {
            quiz.abandon().await?;
        }
        (Screen::History, Command::Back) => {
            quiz.hide_history();
        }
        _ => println!("Unrecognized input."),
    }
    Ok(())
}

fn report(err: &SessionError) {
    match err {
        SessionError::Storage(_) => {
            warn!(error = %err, "storage operation failed");
            println!("Could not save your progress: {err}");
        }
        _ => println!("{err}"),
    }
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

async fn render(quiz: &QuizService) {
    let snapshot = quiz.snapshot();
    println!();
    match snapshot.screen {
        Screen::Start => render_start(quiz, &snapshot).await,
        Screen::Config => {
            let (min, max) = quiz.length_bounds();
            println!("How many questions? ({min}-{max}, enter for {max}, b to go back)");
        }
        Screen::Quiz => render_question(&snapshot),
        Screen::Results => render_results(&snapshot),
        Screen::History => render_history(quiz).await,
    }
}

async fn render_start(quiz: &QuizService, snapshot: &QuizSnapshot) {
    println!("Quiz ({} questions available)", snapshot.available_questions);
    match quiz.saved_progress_info().await {
        Ok(Some(info)) => println!(
            "  r) resume question {} of {} (score {})",
            info.current_question, info.total_questions, info.score
        ),
        Ok(None) => {}
        Err(err) => report(&err),
    }
    println!("  n) new quiz");
    println!("  h) history");
    println!("  q) quit");
}

fn render_question(snapshot: &QuizSnapshot) {
    let Some(question) = &snapshot.current_question else {
        return;
    };
    println!(
        "Question {} of {}  (score {})",
        snapshot.current_index + 1,
        snapshot.total_questions,
        snapshot.score
    );
    println!("{}", question.prompt());
    for (index, choice) in question.choices().iter().enumerate() {
        let marker = match snapshot.selected_index {
            Some(_) if question.is_correct(index) => "+",
            Some(selected) if selected == index => "x",
            _ => " ",
        };
        println!(" {marker} {}) {choice}", index + 1);
    }

    match snapshot.is_selection_correct() {
        Some(correct) => {
            println!("{}", if correct { "Correct!" } else { "Incorrect." });
            if let Some(explanation) = question.explanation() {
                println!("{explanation}");
            }
            println!("Enter to continue, s to suspend, x to abandon.");
        }
        None => println!("Pick 1-{}, s to suspend, x to abandon.", question.choices().len()),
    }
}

fn render_results(snapshot: &QuizSnapshot) {
    if let Some(result) = &snapshot.result {
        println!(
            "Finished: {}/{} ({}%) {}",
            result.score(),
            result.total_questions(),
            result.percentage(),
            result.tier().label()
        );
    }
    println!("  r) new quiz  m) menu  h) history  q) quit");
}

async fn render_history(quiz: &QuizService) {
    let history = quiz.history();
    match (history.list_recent(HISTORY_LIMIT).await, history.stats().await) {
        (Ok(items), Ok(stats)) => print_history(&items, &stats),
        (Err(err), _) | (_, Err(err)) => report(&err),
    }
    println!("Enter to go back.");
}

fn print_history(items: &[QuizHistoryItem], stats: &HistoryStats) {
    if items.is_empty() {
        println!("No quizzes completed yet.");
        return;
    }
    println!(
        "{} quizzes, average {}%, best {}%",
        stats.total_quizzes, stats.average_percentage, stats.best_percentage
    );
    for item in items {
        println!(
            "  {}  {}/{} ({}%) {}",
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.score,
            item.total,
            item.percentage,
            item.tier.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_choices_are_one_based() {
        assert_eq!(parse_command(Screen::Quiz, "1"), Command::Choose(0));
        assert_eq!(parse_command(Screen::Quiz, " 3 "), Command::Choose(2));
        assert_eq!(parse_command(Screen::Quiz, "0"), Command::Unknown);
        assert_eq!(parse_command(Screen::Quiz, ""), Command::Continue);
    }

    #[test]
    fn commands_depend_on_screen() {
        assert_eq!(parse_command(Screen::Start, "r"), Command::Resume);
        assert_eq!(parse_command(Screen::Results, "r"), Command::Restart);
        assert_eq!(parse_command(Screen::Config, "12"), Command::Start(12));
        assert_eq!(parse_command(Screen::Config, ""), Command::Start(0));
        assert_eq!(parse_command(Screen::Config, "abc"), Command::Unknown);
        assert_eq!(parse_command(Screen::History, ""), Command::Back);
        assert_eq!(parse_command(Screen::Quiz, "Q"), Command::Quit);
    }
}
