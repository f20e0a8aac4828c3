//! Screen builders: localized text plus a deterministic keyboard

use super::Control;
use crate::db::{Recipe, UserStats};
use crate::i18n::{render, text, Language, Msg};
use crate::timer::{format_duration, progress_bar, TimerStatus};
use std::fmt::Write as _;

/// One inline control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action_token: String,
}

/// Ordered rows of controls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    fn single(self, button: Button) -> Self {
        self.row(vec![button])
    }

    fn single_if(self, condition: bool, button: impl FnOnce() -> Button) -> Self {
        if condition {
            self.single(button())
        } else {
            self
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    #[allow(dead_code)] // Used in tests
    pub fn tokens(&self) -> Vec<&str> {
        self.buttons().map(|b| b.action_token.as_str()).collect()
    }

    #[allow(dead_code)] // Used in tests
    pub fn contains(&self, token: &str) -> bool {
        self.buttons().any(|b| b.action_token == token)
    }
}

/// A message intent handed to the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Notification {
    fn new(chat_id: i64, text: String, keyboard: Keyboard) -> Self {
        Self {
            chat_id,
            text,
            keyboard: Some(keyboard),
        }
    }

    /// Text-only message
    pub fn plain(chat_id: i64, text: String) -> Self {
        Self {
            chat_id,
            text,
            keyboard: None,
        }
    }
}

fn button(lang: Language, msg: Msg, control: Control) -> Button {
    labelled(text(lang, msg), control)
}

fn labelled(label: String, control: Control) -> Button {
    Button {
        label,
        action_token: control.token(),
    }
}

pub fn language_prompt(chat_id: i64) -> Notification {
    // Shown before a language is known, so labels are language-neutral
    let lang = Language::default();
    Notification::new(
        chat_id,
        text(lang, Msg::LanguagePrompt),
        Keyboard::default().row(vec![
            button(lang, Msg::ButtonRussian, Control::SetLanguage(Language::Ru)),
            button(lang, Msg::ButtonEnglish, Control::SetLanguage(Language::En)),
        ]),
    )
}

pub fn main_menu(chat_id: i64, lang: Language) -> Notification {
    Notification::new(
        chat_id,
        text(lang, Msg::Welcome),
        Keyboard::default()
            .single(button(lang, Msg::ButtonRecipes, Control::ShowRecipes))
            .single(button(lang, Msg::ButtonHelp, Control::ShowHelp)),
    )
}

pub fn recipe_list(chat_id: i64, lang: Language, recipes: &[Recipe]) -> Notification {
    let back = button(lang, Msg::ButtonBack, Control::BackToMain);
    if recipes.is_empty() {
        return Notification::new(
            chat_id,
            text(lang, Msg::NoRecipes),
            Keyboard::default().single(back),
        );
    }

    let keyboard = recipes
        .iter()
        .fold(Keyboard::default(), |kb, recipe| {
            let label = render(
                lang,
                Msg::RecipeLabel,
                &[
                    ("name", recipe.name.as_str()),
                    ("stars", recipe.difficulty_stars().as_str()),
                    ("time", format_duration(recipe.total_time()).as_str()),
                ],
            );
            kb.single(labelled(
                label,
                Control::OpenRecipe {
                    recipe_id: recipe.id,
                },
            ))
        })
        .single(back);

    Notification::new(chat_id, text(lang, Msg::ChooseRecipe), keyboard)
}

pub fn recipe_card(chat_id: i64, lang: Language, recipe: &Recipe) -> Notification {
    let recipe_id = recipe.id;
    let body = render(
        lang,
        Msg::RecipeCard,
        &[
            ("name", recipe.name.as_str()),
            ("description", recipe.description.as_str()),
            ("time", format_duration(recipe.total_time()).as_str()),
            ("stars", recipe.difficulty_stars().as_str()),
            ("steps", recipe.steps_count().to_string().as_str()),
        ],
    );

    Notification::new(
        chat_id,
        body,
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonStartCooking,
                Control::OpenStep { recipe_id, step: 1 },
            ))
            .single(button(
                lang,
                Msg::ButtonIngredients,
                Control::ShowIngredients { recipe_id },
            ))
            .single(button(lang, Msg::ButtonTips, Control::ShowTips { recipe_id }))
            .single(button(lang, Msg::ButtonBackToRecipes, Control::BackToRecipes)),
    )
}

/// Step screen. The caller guarantees `1 <= step <= steps_count`.
pub fn step_screen(
    chat_id: i64,
    lang: Language,
    recipe: &Recipe,
    step: u32,
    timer: Option<&TimerStatus>,
) -> Notification {
    let recipe_id = recipe.id;
    let step_timer = recipe.timer_for_step(step);
    let running = timer.filter(|t| t.entry.is_running && !t.is_elapsed());

    let mut body = render(
        lang,
        Msg::StepHeader,
        &[
            ("step", step.to_string().as_str()),
            ("total", recipe.steps_count().to_string().as_str()),
            ("text", recipe.step(step).unwrap_or_default()),
        ],
    );
    if let Some(duration) = step_timer {
        body.push_str("\n\n");
        body.push_str(&render(
            lang,
            Msg::StepTimer,
            &[("time", format_duration(u64::from(duration)).as_str())],
        ));
    }
    if let Some(status) = timer {
        body.push('\n');
        if status.is_elapsed() {
            body.push_str(&text(lang, Msg::TimerElapsed));
        } else {
            let bar = progress_bar(
                i64::try_from(status.elapsed_secs()).unwrap_or(i64::MAX),
                i64::try_from(status.entry.duration_secs).unwrap_or(i64::MAX),
            );
            body.push_str(&render(
                lang,
                Msg::TimerRunning,
                &[
                    ("remaining", format_duration(status.remaining_secs).as_str()),
                    ("bar", bar.as_str()),
                ],
            ));
        }
    }

    let keyboard = Keyboard::default()
        .single_if(step_timer.is_some(), || {
            button(lang, Msg::ButtonStartTimer, Control::StartTimer { recipe_id, step })
        })
        .single_if(running.is_some(), || {
            button(lang, Msg::ButtonStopTimer, Control::StopTimer { recipe_id, step })
        })
        .single(button(
            lang,
            Msg::ButtonCompleteStep,
            Control::CompleteStep { recipe_id, step },
        ))
        .single_if(step > 1, || {
            button(
                lang,
                Msg::ButtonPrevStep,
                Control::OpenStep {
                    recipe_id,
                    step: step - 1,
                },
            )
        })
        .single_if(step < recipe.steps_count(), || {
            button(
                lang,
                Msg::ButtonNextStepArrow,
                Control::OpenStep {
                    recipe_id,
                    step: step + 1,
                },
            )
        })
        .single(button(
            lang,
            Msg::ButtonBackToRecipe,
            Control::OpenRecipe { recipe_id },
        ));

    Notification::new(chat_id, body, keyboard)
}

pub fn timer_started(
    chat_id: i64,
    lang: Language,
    recipe_id: i64,
    step: u32,
    duration_secs: u64,
) -> Notification {
    Notification::new(
        chat_id,
        render(
            lang,
            Msg::TimerStarted,
            &[("time", format_duration(duration_secs).as_str())],
        ),
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonStopTimer,
                Control::StopTimer { recipe_id, step },
            ))
            .single(button(
                lang,
                Msg::ButtonCompleteStep,
                Control::CompleteStep { recipe_id, step },
            ))
            .single(button(
                lang,
                Msg::ButtonBackToStep,
                Control::OpenStep { recipe_id, step },
            )),
    )
}

pub fn timer_stopped(chat_id: i64, lang: Language, recipe_id: i64, step: u32) -> Notification {
    Notification::new(
        chat_id,
        text(lang, Msg::TimerStopped),
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonCompleteStep,
                Control::CompleteStep { recipe_id, step },
            ))
            .single(button(
                lang,
                Msg::ButtonBackToStep,
                Control::OpenStep { recipe_id, step },
            )),
    )
}

/// Acknowledge a completed step. `session_secs` is set only when the
/// final step finished the session.
pub fn step_completed(
    chat_id: i64,
    lang: Language,
    recipe: &Recipe,
    step: u32,
    session_secs: Option<u64>,
) -> Notification {
    let recipe_id = recipe.id;
    let mut body = render(lang, Msg::StepCompleted, &[("step", step.to_string().as_str())]);
    body.push('\n');

    let keyboard = if step < recipe.steps_count() {
        body.push_str(&text(lang, Msg::MovingToNextStep));
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonNextStep,
                Control::OpenStep {
                    recipe_id,
                    step: step + 1,
                },
            ))
            .single(button(
                lang,
                Msg::ButtonBackToRecipe,
                Control::OpenRecipe { recipe_id },
            ))
    } else {
        body.push_str(&text(lang, Msg::RecipeCompleted));
        if let Some(secs) = session_secs {
            body.push('\n');
            body.push_str(&render(
                lang,
                Msg::SessionDuration,
                &[("time", format_duration(secs).as_str())],
            ));
        }
        Keyboard::default()
            .single(button(lang, Msg::ButtonOtherRecipes, Control::BackToRecipes))
            .single(button(lang, Msg::ButtonMainMenu, Control::BackToMain))
    };

    Notification::new(chat_id, body, keyboard)
}

pub fn ingredients(chat_id: i64, lang: Language, recipe: &Recipe) -> Notification {
    let recipe_id = recipe.id;
    let mut body = render(lang, Msg::IngredientsHeader, &[("name", recipe.name.as_str())]);
    body.push_str("\n\n");
    for ingredient in &recipe.ingredients {
        let _ = writeln!(body, "• {ingredient}");
    }

    Notification::new(
        chat_id,
        body.trim_end().to_string(),
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonStartCooking,
                Control::OpenStep { recipe_id, step: 1 },
            ))
            .single(button(lang, Msg::ButtonTips, Control::ShowTips { recipe_id }))
            .single(button(
                lang,
                Msg::ButtonBackToRecipe,
                Control::OpenRecipe { recipe_id },
            )),
    )
}

pub fn tips(chat_id: i64, lang: Language, recipe: &Recipe) -> Notification {
    let recipe_id = recipe.id;
    let body = if recipe.tips.is_empty() {
        text(lang, Msg::NoTips)
    } else {
        let mut body = render(lang, Msg::TipsHeader, &[("name", recipe.name.as_str())]);
        body.push_str("\n\n");
        for (index, tip) in recipe.tips.iter().enumerate() {
            let _ = writeln!(body, "{}. {tip}", index + 1);
        }
        body.trim_end().to_string()
    };

    Notification::new(
        chat_id,
        body,
        Keyboard::default()
            .single(button(
                lang,
                Msg::ButtonStartCooking,
                Control::OpenStep { recipe_id, step: 1 },
            ))
            .single(button(
                lang,
                Msg::ButtonIngredients,
                Control::ShowIngredients { recipe_id },
            ))
            .single(button(
                lang,
                Msg::ButtonBackToRecipe,
                Control::OpenRecipe { recipe_id },
            )),
    )
}

pub fn help(chat_id: i64, lang: Language) -> Notification {
    Notification::new(
        chat_id,
        text(lang, Msg::Help),
        Keyboard::default().single(button(lang, Msg::ButtonRecipes, Control::ShowRecipes)),
    )
}

pub fn stats(chat_id: i64, lang: Language, stats: &UserStats) -> Notification {
    let body = render(
        lang,
        Msg::Stats,
        &[
            ("total", stats.total_sessions.to_string().as_str()),
            ("completed", stats.completed_sessions.to_string().as_str()),
            ("time", format_duration(stats.total_time_seconds).as_str()),
            ("rate", format!("{:.1}", stats.completion_rate).as_str()),
        ],
    );
    Notification::new(
        chat_id,
        body,
        Keyboard::default()
            .single(button(lang, Msg::ButtonRecipes, Control::ShowRecipes))
            .single(button(lang, Msg::ButtonMainMenu, Control::BackToMain)),
    )
}

/// Text-only message such as a not-found notice
pub fn notice(chat_id: i64, lang: Language, msg: Msg) -> Notification {
    Notification::plain(chat_id, text(lang, msg))
}
