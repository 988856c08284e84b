//! Prompt text: the per-question triage prompt and the QA wrapper that
//! places retrieved context around it.

/// Output section labels the model is asked to fill in.
pub const OUTPUT_LABELS: [&str; 4] = [
    "Risk Level",
    "Condition(s) Suspected",
    "Reasoning",
    "Suggested Action",
];

const WHO_FRAMEWORK: &str = "\
Evaluate the response using the following WHO-based medical framework:

1. Risk Factors & Triggers:
- Preeclampsia: first pregnancy, age <18 or >35, obesity (BMI>30), chronic hypertension, diabetes/kidney disease
- Gestational Diabetes: BMI>25, family history, macrosomia
- Preterm Labor: contractions, pressure, fluid/rupture before 37 weeks
- Placenta Previa: painless bright red bleeding
- Ectopic Pregnancy: sharp one-sided pain, shoulder tip pain, fainting
- Chorioamnionitis: fever + discharge + tenderness

2. Red Flag Combinations:
- Headache + vision + swelling → Preeclampsia (High Risk)
- Bleeding + sharp pain + low BP → Ectopic Pregnancy (High Risk)
- Fever + discharge + tenderness → Chorioamnionitis (High Risk)
- No fetal movement after 28 weeks → Fetal demise (High Risk)
- Contractions + cervical change <37 weeks → Preterm labor

3. Symptom Timeline Reference:
- 1st Trimester: risk of miscarriage or ectopic pregnancy
- 2nd Trimester: gestational diabetes, cervical insufficiency
- 3rd Trimester: preeclampsia, preterm labor, stillbirth
";

const OUTPUT_FORMAT: &str = "\
Output Format:
- Risk Level: Low / Medium / High
- Condition(s) Suspected:
- Reasoning:
- Suggested Action:
";

/// System instruction for the answering model.
pub const QA_SYSTEM_PROMPT: &str = "You are an expert Q&A system that is trusted around the world. \
Always answer the query using the provided context information, and not prior knowledge. \
Never directly reference the given context in your answer.";

/// Build the triage prompt for one question/answer pair.
///
/// Both strings are inserted verbatim. Pure: identical input yields
/// byte-identical output.
pub fn build_prompt(question: &str, answer: &str) -> String {
    format!(
        "\nSymptom Categorization Task:\n\n\
         You are a pregnancy risk triage assistant using WHO guidelines and advanced obstetric clinical logic.\n\n\
         Input:\n\
         Question: {question}\n\
         Answer: {answer}\n\n\
         {WHO_FRAMEWORK}\n\
         {OUTPUT_FORMAT}"
    )
}

/// Wrap retrieved context and the triage prompt into the QA template sent
/// to the model.
pub fn build_qa_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}
