//! The fixed symptom questionnaire.
//!
//! Eleven questions, one per WHO-guideline risk category, always presented
//! and analyzed in this order.

use serde::Serialize;

/// WHO-guideline risk category a question screens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Bleeding,
    EctopicSigns,
    FetalMovement,
    PreeclampsiaSigns,
    InfectionSigns,
    PretermLaborSigns,
    DiabetesRisk,
    FaintingSigns,
    PlacentaPreviaSigns,
    HistoryRiskFactors,
    GestationalAge,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bleeding => "bleeding",
            Self::EctopicSigns => "ectopic_signs",
            Self::FetalMovement => "fetal_movement",
            Self::PreeclampsiaSigns => "preeclampsia_signs",
            Self::InfectionSigns => "infection_signs",
            Self::PretermLaborSigns => "preterm_labor_signs",
            Self::DiabetesRisk => "diabetes_risk",
            Self::FaintingSigns => "fainting_signs",
            Self::PlacentaPreviaSigns => "placenta_previa_signs",
            Self::HistoryRiskFactors => "history_risk_factors",
            Self::GestationalAge => "gestational_age",
        }
    }
}

/// One entry of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    /// 1-based position shown to the user as `Q{number}`.
    pub number: usize,
    pub category: RiskCategory,
    pub text: &'static str,
}

impl Question {
    /// Form field name carrying this question's answer (`q0` .. `q10`).
    pub fn field_name(&self) -> String {
        format!("q{}", self.number - 1)
    }

    /// Label rendered above the input field.
    pub fn label(&self) -> String {
        format!("Q{}: {}", self.number, self.text)
    }
}

pub const QUESTION_COUNT: usize = 11;

pub static QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        number: 1,
        category: RiskCategory::Bleeding,
        text: "Are you currently experiencing any vaginal bleeding or unusual discharge?",
    },
    Question {
        number: 2,
        category: RiskCategory::EctopicSigns,
        text: "Have you had any sharp, one-sided lower abdominal pain or shoulder tip pain recently?",
    },
    Question {
        number: 3,
        category: RiskCategory::FetalMovement,
        text: "How would you describe your baby’s movements today compared to yesterday?",
    },
    Question {
        number: 4,
        category: RiskCategory::PreeclampsiaSigns,
        text: "Have you experienced severe or persistent headaches, blurry vision, or noticeable swelling in your face, hands, or feet?",
    },
    Question {
        number: 5,
        category: RiskCategory::InfectionSigns,
        text: "Do you currently have a fever (above 38.5°C), or have you noticed any foul-smelling discharge or abdominal tenderness?",
    },
    Question {
        number: 6,
        category: RiskCategory::PretermLaborSigns,
        text: "Are you feeling regular contractions, lower back pressure, pelvic pressure, or any leaking of fluid before 37 weeks of pregnancy?",
    },
    Question {
        number: 7,
        category: RiskCategory::DiabetesRisk,
        text: "Have you been unusually thirsty, tired, or had blurred vision recently? Do you have a family history of diabetes?",
    },
    Question {
        number: 8,
        category: RiskCategory::FaintingSigns,
        text: "Have you experienced dizziness, fainting, or unusual shoulder pain along with abdominal discomfort?",
    },
    Question {
        number: 9,
        category: RiskCategory::PlacentaPreviaSigns,
        text: "Have you had any episodes of painless, bright red bleeding during pregnancy?",
    },
    Question {
        number: 10,
        category: RiskCategory::HistoryRiskFactors,
        text: "Is this your first pregnancy? What is your age and pre-pregnancy BMI? Do you have a history of hypertension, diabetes, or kidney disease?",
    },
    Question {
        number: 11,
        category: RiskCategory::GestationalAge,
        text: "What is your current gestational age in weeks?",
    },
];

/// All questions in presentation order.
pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Pair every question with its answer, in question order.
///
/// `answer_for` is called once per question; a missing answer becomes
/// the empty string so the caller's skip rule applies uniformly.
pub fn collect_responses<F>(mut answer_for: F) -> Vec<(Question, String)>
where
    F: FnMut(&Question) -> Option<String>,
{
    QUESTIONS
        .iter()
        .map(|q| (*q, answer_for(q).unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn eleven_questions_numbered_in_order() {
        assert_eq!(questions().len(), 11);
        for (i, q) in questions().iter().enumerate() {
            assert_eq!(q.number, i + 1);
        }
    }

    #[test]
    fn every_category_appears_once() {
        let categories: HashSet<_> = questions().iter().map(|q| q.category).collect();
        assert_eq!(categories.len(), QUESTION_COUNT);
    }

    #[test]
    fn field_names_are_zero_based() {
        assert_eq!(QUESTIONS[0].field_name(), "q0");
        assert_eq!(QUESTIONS[10].field_name(), "q10");
    }

    #[test]
    fn label_prefixes_question_number() {
        assert_eq!(
            QUESTIONS[10].label(),
            "Q11: What is your current gestational age in weeks?"
        );
    }

    #[test]
    fn collect_responses_keeps_order_and_fills_blanks() {
        let responses = collect_responses(|q| {
            (q.category == RiskCategory::GestationalAge).then(|| "32".to_string())
        });
        assert_eq!(responses.len(), QUESTION_COUNT);
        assert_eq!(responses[0].1, "");
        assert_eq!(responses[10].0.number, 11);
        assert_eq!(responses[10].1, "32");
    }

    #[test]
    fn category_names_are_snake_case() {
        assert_eq!(QUESTIONS[3].category.as_str(), "preeclampsia_signs");
        assert_eq!(QUESTIONS[10].category.as_str(), "gestational_age");
    }

    #[test]
    fn history_question_mentions_bmi() {
        let q = questions()
            .iter()
            .find(|q| q.category == RiskCategory::HistoryRiskFactors)
            .unwrap();
        assert!(q.text.starts_with("Is this your first pregnancy?"));
        assert!(q.text.contains("BMI"));
    }
}
