//! Localized message table
//!
//! Every user-facing string is looked up by a closed `Msg` identifier and a
//! `Language`. Templates use `{name}` placeholders filled by [`render`].

use serde::{Deserialize, Serialize};

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    #[default]
    En,
}

impl Language {
    #[allow(dead_code)] // Used in tests
    pub const ALL: [Language; 2] = [Language::Ru, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Resolve a stored (nullable) preference, defaulting to English
    pub fn from_preference(code: Option<&str>) -> Self {
        code.and_then(Self::from_code).unwrap_or_default()
    }
}

/// Identifiers of every localized string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Msg {
    LanguagePrompt,
    Welcome,
    NoRecipes,
    ChooseRecipe,
    RecipeLabel,
    RecipeCard,
    RecipeNotFound,
    SessionNotFound,
    StepNotFound,
    StepHeader,
    StepTimer,
    TimerRunning,
    TimerElapsed,
    TimerUnavailable,
    TimerStarted,
    TimerStopped,
    StepCompleted,
    MovingToNextStep,
    RecipeCompleted,
    SessionDuration,
    IngredientsHeader,
    TipsHeader,
    NoTips,
    Help,
    Stats,
    ButtonRussian,
    ButtonEnglish,
    ButtonRecipes,
    ButtonHelp,
    ButtonBack,
    ButtonStartCooking,
    ButtonIngredients,
    ButtonTips,
    ButtonBackToRecipes,
    ButtonStartTimer,
    ButtonStopTimer,
    ButtonCompleteStep,
    ButtonPrevStep,
    ButtonNextStepArrow,
    ButtonBackToRecipe,
    ButtonBackToStep,
    ButtonNextStep,
    ButtonOtherRecipes,
    ButtonMainMenu,
}

impl Msg {
    #[allow(dead_code)] // Used in tests
    pub const ALL: [Msg; 44] = [
        Msg::LanguagePrompt,
        Msg::Welcome,
        Msg::NoRecipes,
        Msg::ChooseRecipe,
        Msg::RecipeLabel,
        Msg::RecipeCard,
        Msg::RecipeNotFound,
        Msg::SessionNotFound,
        Msg::StepNotFound,
        Msg::StepHeader,
        Msg::StepTimer,
        Msg::TimerRunning,
        Msg::TimerElapsed,
        Msg::TimerUnavailable,
        Msg::TimerStarted,
        Msg::TimerStopped,
        Msg::StepCompleted,
        Msg::MovingToNextStep,
        Msg::RecipeCompleted,
        Msg::SessionDuration,
        Msg::IngredientsHeader,
        Msg::TipsHeader,
        Msg::NoTips,
        Msg::Help,
        Msg::Stats,
        Msg::ButtonRussian,
        Msg::ButtonEnglish,
        Msg::ButtonRecipes,
        Msg::ButtonHelp,
        Msg::ButtonBack,
        Msg::ButtonStartCooking,
        Msg::ButtonIngredients,
        Msg::ButtonTips,
        Msg::ButtonBackToRecipes,
        Msg::ButtonStartTimer,
        Msg::ButtonStopTimer,
        Msg::ButtonCompleteStep,
        Msg::ButtonPrevStep,
        Msg::ButtonNextStepArrow,
        Msg::ButtonBackToRecipe,
        Msg::ButtonBackToStep,
        Msg::ButtonNextStep,
        Msg::ButtonOtherRecipes,
        Msg::ButtonMainMenu,
    ];
}

/// Raw template for a message in the given language
#[allow(clippy::too_many_lines)]
pub fn template(lang: Language, msg: Msg) -> &'static str {
    use Language::{En, Ru};

    match (msg, lang) {
        (Msg::LanguagePrompt, _) => "🌐 Please choose a language / Пожалуйста, выберите язык",

        (Msg::Welcome, Ru) => "Добро пожаловать в AeropressBot! ☕️\n\nВыберите, что вас интересует:",
        (Msg::Welcome, En) => "Welcome to AeropressBot! ☕️\n\nChoose what you are interested in:",

        (Msg::NoRecipes, Ru) => "Рецепты не найдены. Попробуйте позже.",
        (Msg::NoRecipes, En) => "No recipes found. Try again later.",

        (Msg::ChooseRecipe, Ru) => "📚 Выберите рецепт Aeropress:",
        (Msg::ChooseRecipe, En) => "📚 Choose an Aeropress recipe:",

        (Msg::RecipeLabel, _) => "{name} {stars} ({time})",

        (Msg::RecipeCard, Ru) => "📖 {name}\n\n{description}\n\n⏱️ Время приготовления: {time}\n⭐ Сложность: {stars}\n📝 Шагов: {steps}",
        (Msg::RecipeCard, En) => "📖 {name}\n\n{description}\n\n⏱️ Cooking time: {time}\n⭐ Difficulty: {stars}\n📝 Steps: {steps}",

        (Msg::RecipeNotFound, Ru) => "Рецепт не найден.",
        (Msg::RecipeNotFound, En) => "Recipe not found.",

        (Msg::SessionNotFound, Ru) => "Сессия не найдена. Откройте рецепт заново.",
        (Msg::SessionNotFound, En) => "Session not found. Open the recipe again.",

        (Msg::StepNotFound, Ru) => "Шаг не найден.",
        (Msg::StepNotFound, En) => "Step not found.",

        (Msg::StepHeader, Ru) => "📝 Шаг {step}/{total}\n\n{text}",
        (Msg::StepHeader, En) => "📝 Step {step}/{total}\n\n{text}",

        (Msg::StepTimer, Ru) => "⏱️ Таймер: {time}",
        (Msg::StepTimer, En) => "⏱️ Timer: {time}",

        (Msg::TimerRunning, Ru) => "⏳ Осталось {remaining}\n{bar}",
        (Msg::TimerRunning, En) => "⏳ {remaining} left\n{bar}",

        (Msg::TimerElapsed, Ru) => "🔔 Время вышло!",
        (Msg::TimerElapsed, En) => "🔔 Time is up!",

        (Msg::TimerUnavailable, Ru) => "Для этого шага таймер недоступен.",
        (Msg::TimerUnavailable, En) => "Timer not available for this step.",

        (Msg::TimerStarted, Ru) => "⏱️ Таймер запущен на {time}",
        (Msg::TimerStarted, En) => "⏱️ Timer started for {time}",

        (Msg::TimerStopped, Ru) => "⏹️ Таймер остановлен",
        (Msg::TimerStopped, En) => "⏹️ Timer stopped",

        (Msg::StepCompleted, Ru) => "✅ Шаг {step} завершен!",
        (Msg::StepCompleted, En) => "✅ Step {step} completed!",

        (Msg::MovingToNextStep, Ru) => "Переходим к следующему шагу:",
        (Msg::MovingToNextStep, En) => "Moving to next step:",

        (Msg::RecipeCompleted, Ru) => "🎉 Рецепт завершен! Приятного кофепития!",
        (Msg::RecipeCompleted, En) => "🎉 Recipe completed! Enjoy your coffee!",

        (Msg::SessionDuration, Ru) => "⏱️ Время приготовления: {time}",
        (Msg::SessionDuration, En) => "⏱️ Brewing took {time}",

        (Msg::IngredientsHeader, Ru) => "📋 Ингредиенты для рецепта «{name}»:",
        (Msg::IngredientsHeader, En) => "📋 Ingredients for «{name}» recipe:",

        (Msg::TipsHeader, Ru) => "💡 Советы для рецепта «{name}»:",
        (Msg::TipsHeader, En) => "💡 Tips for «{name}» recipe:",

        (Msg::NoTips, Ru) => "💡 Для этого рецепта пока нет специальных советов.",
        (Msg::NoTips, En) => "💡 No special tips for this recipe yet.",

        (Msg::Help, Ru) => "🤖 AeropressBot - ваш помощник в приготовлении кофе!\n\n\
            📚 Доступные команды:\n\n\
            /start - Начать работу с ботом\n\
            /recipes или /рецепты - Показать список рецептов\n\
            /help или /помощь - Показать эту справку\n\
            /stats или /статистика - Ваша статистика\n\n\
            ☕️ Выберите рецепт и следуйте пошаговым инструкциям с таймерами!",
        (Msg::Help, En) => "🤖 AeropressBot - your coffee brewing assistant!\n\n\
            📚 Available commands:\n\n\
            /start - Start working with the bot\n\
            /recipes - Show recipe list\n\
            /help - Show this help\n\
            /stats - Show your brewing statistics\n\n\
            ☕️ Choose a recipe and follow step-by-step instructions with timers!",

        (Msg::Stats, Ru) => "📊 Ваша статистика\n\nНачато: {total}\nЗавершено: {completed}\nОбщее время: {time}\nПроцент завершения: {rate}%",
        (Msg::Stats, En) => "📊 Your statistics\n\nStarted: {total}\nCompleted: {completed}\nTotal time: {time}\nCompletion rate: {rate}%",

        (Msg::ButtonRussian, _) => "🇷🇺 Русский",
        (Msg::ButtonEnglish, _) => "🇬🇧 English",

        (Msg::ButtonRecipes, Ru) => "📚 Рецепты",
        (Msg::ButtonRecipes, En) => "📚 Recipes",

        (Msg::ButtonHelp, Ru) => "❓ Помощь",
        (Msg::ButtonHelp, En) => "❓ Help",

        (Msg::ButtonBack, Ru) => "🔙 Назад",
        (Msg::ButtonBack, En) => "🔙 Back",

        (Msg::ButtonStartCooking, Ru) => "▶️ Начать приготовление",
        (Msg::ButtonStartCooking, En) => "▶️ Start cooking",

        (Msg::ButtonIngredients, Ru) => "📋 Ингредиенты",
        (Msg::ButtonIngredients, En) => "📋 Ingredients",

        (Msg::ButtonTips, Ru) => "💡 Советы",
        (Msg::ButtonTips, En) => "💡 Tips",

        (Msg::ButtonBackToRecipes, Ru) => "🔙 Назад к рецептам",
        (Msg::ButtonBackToRecipes, En) => "🔙 Back to recipes",

        (Msg::ButtonStartTimer, Ru) => "⏱️ Запустить таймер",
        (Msg::ButtonStartTimer, En) => "⏱️ Start timer",

        (Msg::ButtonStopTimer, Ru) => "⏹️ Остановить таймер",
        (Msg::ButtonStopTimer, En) => "⏹️ Stop timer",

        (Msg::ButtonCompleteStep, Ru) => "✅ Завершить шаг",
        (Msg::ButtonCompleteStep, En) => "✅ Complete step",

        (Msg::ButtonPrevStep, _) => "⬅️",
        (Msg::ButtonNextStepArrow, _) => "➡️",

        (Msg::ButtonBackToRecipe, Ru) => "🔙 Назад к рецепту",
        (Msg::ButtonBackToRecipe, En) => "🔙 Back to recipe",

        (Msg::ButtonBackToStep, Ru) => "🔙 Назад к шагу",
        (Msg::ButtonBackToStep, En) => "🔙 Back to step",

        (Msg::ButtonNextStep, Ru) => "➡️ Следующий шаг",
        (Msg::ButtonNextStep, En) => "➡️ Next step",

        (Msg::ButtonOtherRecipes, Ru) => "📚 Другие рецепты",
        (Msg::ButtonOtherRecipes, En) => "📚 Other recipes",

        (Msg::ButtonMainMenu, Ru) => "🔙 В главное меню",
        (Msg::ButtonMainMenu, En) => "🔙 Main menu",
    }
}

/// Look up a template and substitute its `{name}` placeholders
pub fn render(lang: Language, msg: Msg, args: &[(&str, &str)]) -> String {
    fill(template(lang, msg), args)
}

/// Shorthand for messages without placeholders
pub fn text(lang: Language, msg: Msg) -> String {
    template(lang, msg).to_string()
}

fn fill(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(rest.get(..open).unwrap_or_default());
        let after = rest.get(open + 1..).unwrap_or_default();
        match after.find('}') {
            Some(close) => {
                let name = after.get(..close).unwrap_or_default();
                match args.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = after.get(close + 1..).unwrap_or_default();
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Placeholder names referenced by a template, in order of appearance
#[allow(dead_code)] // Used in tests
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = rest.get(open + 1..).unwrap_or_default();
        let Some(close) = after.find('}') else { break };
        names.push(after.get(..close).unwrap_or_default());
        rest = after.get(close + 1..).unwrap_or_default();
    }
    names
}
