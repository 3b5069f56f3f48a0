use super::{recommend, ui};
use crate::engine::orchestrator::{Orchestrator, TurnOutcome};
use crate::engine::recommender::{Recommender, ScoredFund};
use crate::engine::session::SessionStore;
use crate::store::Stores;
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

/// Interactive advisory loop over stdin. `exit` / `quit` ends the
/// session and forgets its state; EOF leaves it resumable.
pub async fn run(stores: Stores, sessions: Arc<dyn SessionStore>, session_id: &str) -> Result<()> {
    let orchestrator = Orchestrator::new(Recommender::new(stores), sessions);

    println!(
        "{}",
        ui::style_text(
            "Tell me what you are looking for, e.g. \"high risk equity for 10 years\".",
            ui::StyleType::Subtle
        )
    );

    let stdin = std::io::stdin();
    loop {
        print!("{} ", ui::style_text(">", ui::StyleType::Prompt));
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            orchestrator.end_session(session_id).await?;
            println!("Session ended.");
            break;
        }

        match orchestrator.handle_turn(session_id, line).await? {
            TurnOutcome::Question(question) => {
                println!("{}", ui::style_text(question.prompt(), ui::StyleType::Prompt));
            }
            TurnOutcome::Recommendations(ranked) => {
                if ranked.is_empty() {
                    println!(
                        "No recommendable funds matched your preferences. \
                         Run `sync`, `validate` and `metrics` first."
                    );
                } else {
                    recommend::display_ranked(&ranked);
                }
            }
            TurnOutcome::Comparison { left, right } => display_comparison(&left, &right),
            TurnOutcome::Explanation(text) | TurnOutcome::Message(text) => println!("{text}"),
        }
    }
    Ok(())
}

fn display_comparison(left: &ScoredFund, right: &ScoredFund) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell(&left.display_name),
        ui::header_cell(&right.display_name),
    ]);

    let pct = |v: f64| format!("{:.2}%", v * 100.0);
    table.add_row(vec![
        comfy_table::Cell::new("Score"),
        ui::score_cell(left.score),
        ui::score_cell(right.score),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("CAGR 5y"),
        ui::format_optional_cell(left.metrics.cagr_5y, pct),
        ui::format_optional_cell(right.metrics.cagr_5y, pct),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("Consistency"),
        ui::format_optional_cell(left.metrics.rolling_3y_consistency, pct),
        ui::format_optional_cell(right.metrics.rolling_3y_consistency, pct),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("Max DD"),
        ui::format_optional_cell(left.metrics.max_drawdown, pct),
        ui::format_optional_cell(right.metrics.max_drawdown, pct),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new("TER"),
        ui::format_optional_cell(left.metrics.expense_ratio, |v| format!("{v:.2}%")),
        ui::format_optional_cell(right.metrics.expense_ratio, |v| format!("{v:.2}%")),
    ]);
    println!("{table}");
}
