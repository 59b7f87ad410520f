use crate::models::{QuestionnaireAnswers, Routine, RoutineStep};

const MINIMAL: &str = "Minimal (2-3 steps)";
const MODERATE: &str = "Moderate (4-5 steps)";
const OUTDOORS: &str = "Very active/outdoors";

fn step(name: &str, description: &str) -> RoutineStep {
    RoutineStep { name: name.to_string(), description: description.to_string(), products: Vec::new() }
}

/// Builds the morning/evening routine from questionnaire answers.
///
/// Steps are appended in a fixed order and the preferred routine length then
/// truncates each list from the tail, which can drop conditional steps such
/// as Sunscreen. Steps never carry products.
pub fn generate_routine(answers: &QuestionnaireAnswers) -> Routine {
    let mut morning = vec![
        step("Cleanse", "Start your day with a gentle cleanser to remove overnight buildup."),
        step("Tone", "Balance your skin's pH and prepare it for treatments."),
    ];
    if answers.has_concern("Acne") {
        morning.push(step("Treatment", "Apply acne-fighting ingredients like salicylic acid or benzoyl peroxide."));
    }
    if answers.has_concern("Aging") {
        morning.push(step("Antioxidant Serum", "Apply vitamin C serum for protection against free radicals."));
    }
    morning.push(step("Moisturize", "Lock in hydration with a moisturizer suitable for your skin type."));
    if answers.lifestyle.as_deref() == Some(OUTDOORS) {
        morning.push(step("Sunscreen", "Protect your skin with broad-spectrum SPF 30 or higher."));
    }

    let mut evening = vec![
        step(
            "Double Cleanse",
            "Remove makeup and sunscreen with an oil-based cleanser, followed by a water-based cleanser.",
        ),
        step("Tone", "Prepare your skin for night treatments."),
    ];
    if answers.skin_type.as_deref() == Some("Oily") || answers.has_concern("Acne") {
        evening.push(step("Exfoliate", "Use BHA/salicylic acid to unclog pores (2-3 times per week)."));
    }
    if answers.has_concern("Aging") || answers.has_concern("Dark spots") {
        evening.push(step("Treatment", "Apply retinol or peptides for skin renewal."));
    }
    evening.push(step("Moisturize", "Apply a nourishing night cream."));

    if let Some(max_steps) = step_limit(answers.routine.as_deref()) {
        morning.truncate(max_steps);
        evening.truncate(max_steps);
    }

    Routine { morning, evening }
}

fn step_limit(preference: Option<&str>) -> Option<usize> {
    match preference {
        Some(MINIMAL) => Some(3),
        Some(MODERATE) => Some(5),
        _ => None,
    }
}
