//! `cards` subcommand — list sound cards.

use super::{CardJson, CardsOutput, Context, Result, hw};

pub(super) fn cmd_cards(ctx: &Context) -> Result<()> {
    let cards = hw::alsa::list_cards()?;

    if ctx.json {
        let output = CardsOutput {
            count: cards.len(),
            cards: cards
                .into_iter()
                .map(|(index, name)| CardJson { index, name })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    if cards.is_empty() {
        println!("No sound cards found.");
        return Ok(());
    }

    for (index, name) in cards {
        println!("  [{index}] {name}");
    }
    Ok(())
}
