use super::ui;
use crate::engine::recommender::{Recommender, ScoredFund};
use crate::store::Stores;
use anyhow::Result;
use tracing::info;

/// Ranks funds in the given categories and prints the table.
pub async fn run(stores: Stores, categories: &[String]) -> Result<()> {
    info!("Ranking funds in categories: {:?}", categories);

    let ranked = Recommender::new(stores).rank(categories).await?;
    if ranked.is_empty() {
        println!(
            "No recommendable funds matched {categories:?}. Run `sync`, `validate` and `metrics` first."
        );
        return Ok(());
    }

    println!(
        "\n{}",
        ui::style_text("Recommended funds", ui::StyleType::Title)
    );
    display_ranked(&ranked);
    Ok(())
}

pub fn display_ranked(ranked: &[ScoredFund]) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Fund"),
        ui::header_cell("Category"),
        ui::header_cell("Score"),
        ui::header_cell("CAGR 5y"),
        ui::header_cell("Consistency"),
        ui::header_cell("Max DD"),
        ui::header_cell("TER"),
    ]);

    for (i, fund) in ranked.iter().enumerate() {
        let m = &fund.metrics;
        table.add_row(vec![
            comfy_table::Cell::new(i + 1),
            comfy_table::Cell::new(&fund.display_name),
            comfy_table::Cell::new(&fund.category),
            ui::score_cell(fund.score),
            ui::format_optional_cell(m.cagr_5y, |v| format!("{:.2}%", v * 100.0)),
            ui::format_optional_cell(m.rolling_3y_consistency, |v| format!("{:.0}%", v * 100.0)),
            ui::format_optional_cell(m.max_drawdown, |v| format!("{:.2}%", v * 100.0)),
            ui::format_optional_cell(m.expense_ratio, |v| format!("{v:.2}%")),
        ]);
    }
    println!("{table}");
}
