//! Decoding of inbound payloads into actions
//!
//! Malformed input never fails an update: it is logged and decodes to
//! `None`, which callers treat as a no-op.

use crate::i18n::Language;
use crate::runtime::EventKind;
use crate::state_machine::{Action, Control};

/// Decode an inbound payload of either kind
pub fn decode(kind: EventKind, payload: &str) -> Option<Action> {
    match kind {
        EventKind::Button => decode_callback(payload),
        EventKind::Text => decode_command(payload),
    }
}

/// Decode a button callback token. Prefixes are tested in a fixed order and
/// the first match wins.
pub fn decode_callback(token: &str) -> Option<Action> {
    let control = if let Some(code) = token.strip_prefix("lang_") {
        Language::from_code(code).map(Control::SetLanguage)
    } else if let Some(rest) = token.strip_prefix("recipe_") {
        parse_id(rest).map(|recipe_id| Control::OpenRecipe { recipe_id })
    } else if let Some(rest) = token.strip_prefix("step_") {
        parse_pair(rest).map(|(recipe_id, step)| Control::OpenStep { recipe_id, step })
    } else if let Some(rest) = token.strip_prefix("timer_") {
        parse_pair(rest).map(|(recipe_id, step)| Control::StartTimer { recipe_id, step })
    } else if let Some(rest) = token.strip_prefix("stop_timer_") {
        parse_pair(rest).map(|(recipe_id, step)| Control::StopTimer { recipe_id, step })
    } else if let Some(rest) = token.strip_prefix("complete_step_") {
        parse_pair(rest).map(|(recipe_id, step)| Control::CompleteStep { recipe_id, step })
    } else if let Some(rest) = token.strip_prefix("ingredients_") {
        parse_id(rest).map(|recipe_id| Control::ShowIngredients { recipe_id })
    } else if let Some(rest) = token.strip_prefix("tips_") {
        parse_id(rest).map(|recipe_id| Control::ShowTips { recipe_id })
    } else {
        match token {
            "back_to_recipes" => Some(Control::BackToRecipes),
            "show_recipes" => Some(Control::ShowRecipes),
            "back_to_main" => Some(Control::BackToMain),
            "show_help" => Some(Control::ShowHelp),
            _ => None,
        }
    };

    if control.is_none() {
        tracing::warn!(token, "Ignoring unrecognized callback token");
    }
    control.map(Action::from)
}

/// Decode a free-text command. Anything that is not a known command is
/// ignored without logging, since users may type arbitrary text.
pub fn decode_command(text: &str) -> Option<Action> {
    let first = text.split_whitespace().next()?;
    let command = first.split_once('@').map_or(first, |(cmd, _bot)| cmd);

    match command {
        "/start" => Some(Action::Start),
        "/recipes" | "/рецепты" => Some(Action::ShowRecipes),
        "/help" | "/помощь" => Some(Action::ShowHelp),
        "/stats" | "/статистика" => Some(Action::ShowStats),
        _ => None,
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn parse_pair(raw: &str) -> Option<(i64, u32)> {
    let (recipe_id, step) = raw.split_once('_')?;
    Some((recipe_id.parse().ok()?, step.parse().ok()?))
}
