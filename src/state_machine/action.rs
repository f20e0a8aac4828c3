//! Typed user actions
//!
//! Every control and command a user can trigger decodes into exactly one
//! `Action`. Keyboards carry [`Control`]s, the subset of actions that have a
//! callback token; [`Control::token`] is the inverse of the router's
//! callback decoder.

use crate::i18n::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `/start`: ask for a language
    Start,
    SetLanguage(Language),
    OpenRecipe { recipe_id: i64 },
    OpenStep { recipe_id: i64, step: u32 },
    StartTimer { recipe_id: i64, step: u32 },
    StopTimer { recipe_id: i64, step: u32 },
    CompleteStep { recipe_id: i64, step: u32 },
    ShowIngredients { recipe_id: i64 },
    ShowTips { recipe_id: i64 },
    BackToRecipes,
    ShowRecipes,
    BackToMain,
    ShowHelp,
    ShowStats,
}

impl Action {
    /// Callback token for a keyboard control. Command-only actions have none.
    #[allow(dead_code)] // Used in tests
    pub fn token(&self) -> Option<String> {
        Control::try_from(*self).ok().map(|control| control.token())
    }

    /// Recipe the action refers to, if any
    pub fn recipe_id(&self) -> Option<i64> {
        match self {
            Action::OpenRecipe { recipe_id }
            | Action::OpenStep { recipe_id, .. }
            | Action::StartTimer { recipe_id, .. }
            | Action::StopTimer { recipe_id, .. }
            | Action::CompleteStep { recipe_id, .. }
            | Action::ShowIngredients { recipe_id }
            | Action::ShowTips { recipe_id } => Some(*recipe_id),
            Action::Start
            | Action::SetLanguage(_)
            | Action::BackToRecipes
            | Action::ShowRecipes
            | Action::BackToMain
            | Action::ShowHelp
            | Action::ShowStats => None,
        }
    }

    /// Whether handling the action needs the recipe list
    pub fn lists_recipes(&self) -> bool {
        matches!(self, Action::BackToRecipes | Action::ShowRecipes)
    }

    /// Step whose timer is shown on the rendered screen
    pub fn displayed_timer_step(&self) -> Option<u32> {
        match self {
            Action::OpenStep { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::SetLanguage(_) => "set_language",
            Action::OpenRecipe { .. } => "open_recipe",
            Action::OpenStep { .. } => "open_step",
            Action::StartTimer { .. } => "start_timer",
            Action::StopTimer { .. } => "stop_timer",
            Action::CompleteStep { .. } => "complete_step",
            Action::ShowIngredients { .. } => "show_ingredients",
            Action::ShowTips { .. } => "show_tips",
            Action::BackToRecipes => "back_to_recipes",
            Action::ShowRecipes => "show_recipes",
            Action::BackToMain => "back_to_main",
            Action::ShowHelp => "show_help",
            Action::ShowStats => "show_stats",
        }
    }
}

/// An action that can sit behind a keyboard button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    SetLanguage(Language),
    OpenRecipe { recipe_id: i64 },
    OpenStep { recipe_id: i64, step: u32 },
    StartTimer { recipe_id: i64, step: u32 },
    StopTimer { recipe_id: i64, step: u32 },
    CompleteStep { recipe_id: i64, step: u32 },
    ShowIngredients { recipe_id: i64 },
    ShowTips { recipe_id: i64 },
    BackToRecipes,
    ShowRecipes,
    BackToMain,
    ShowHelp,
}

impl Control {
    /// Callback data sent back when the button is pressed
    pub fn token(&self) -> String {
        match self {
            Control::SetLanguage(lang) => format!("lang_{}", lang.code()),
            Control::OpenRecipe { recipe_id } => format!("recipe_{recipe_id}"),
            Control::OpenStep { recipe_id, step } => format!("step_{recipe_id}_{step}"),
            Control::StartTimer { recipe_id, step } => format!("timer_{recipe_id}_{step}"),
            Control::StopTimer { recipe_id, step } => format!("stop_timer_{recipe_id}_{step}"),
            Control::CompleteStep { recipe_id, step } => {
                format!("complete_step_{recipe_id}_{step}")
            }
            Control::ShowIngredients { recipe_id } => format!("ingredients_{recipe_id}"),
            Control::ShowTips { recipe_id } => format!("tips_{recipe_id}"),
            Control::BackToRecipes => "back_to_recipes".to_string(),
            Control::ShowRecipes => "show_recipes".to_string(),
            Control::BackToMain => "back_to_main".to_string(),
            Control::ShowHelp => "show_help".to_string(),
        }
    }
}

impl From<Control> for Action {
    fn from(control: Control) -> Self {
        match control {
            Control::SetLanguage(lang) => Action::SetLanguage(lang),
            Control::OpenRecipe { recipe_id } => Action::OpenRecipe { recipe_id },
            Control::OpenStep { recipe_id, step } => Action::OpenStep { recipe_id, step },
            Control::StartTimer { recipe_id, step } => Action::StartTimer { recipe_id, step },
            Control::StopTimer { recipe_id, step } => Action::StopTimer { recipe_id, step },
            Control::CompleteStep { recipe_id, step } => Action::CompleteStep { recipe_id, step },
            Control::ShowIngredients { recipe_id } => Action::ShowIngredients { recipe_id },
            Control::ShowTips { recipe_id } => Action::ShowTips { recipe_id },
            Control::BackToRecipes => Action::BackToRecipes,
            Control::ShowRecipes => Action::ShowRecipes,
            Control::BackToMain => Action::BackToMain,
            Control::ShowHelp => Action::ShowHelp,
        }
    }
}

/// Command-only actions are handed back unchanged
impl TryFrom<Action> for Control {
    type Error = Action;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        let control = match action {
            Action::Start | Action::ShowStats => return Err(action),
            Action::SetLanguage(lang) => Control::SetLanguage(lang),
            Action::OpenRecipe { recipe_id } => Control::OpenRecipe { recipe_id },
            Action::OpenStep { recipe_id, step } => Control::OpenStep { recipe_id, step },
            Action::StartTimer { recipe_id, step } => Control::StartTimer { recipe_id, step },
            Action::StopTimer { recipe_id, step } => Control::StopTimer { recipe_id, step },
            Action::CompleteStep { recipe_id, step } => Control::CompleteStep { recipe_id, step },
            Action::ShowIngredients { recipe_id } => Control::ShowIngredients { recipe_id },
            Action::ShowTips { recipe_id } => Control::ShowTips { recipe_id },
            Action::BackToRecipes => Control::BackToRecipes,
            Action::ShowRecipes => Control::ShowRecipes,
            Action::BackToMain => Control::BackToMain,
            Action::ShowHelp => Control::ShowHelp,
        };
        Ok(control)
    }
}
