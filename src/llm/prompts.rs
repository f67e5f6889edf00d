//! Prompt templates for the career analyst

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub classification: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: SYSTEM_TEMPLATE.to_string(),
            classification: CLASSIFICATION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Fill the classification template with the document and the allowed labels
    pub fn render_classification(&self, cv_text: &str, labels: &[String]) -> String {
        let label_list = labels
            .iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");

        self.classification
            .replace("{labels}", &label_list)
            .replace("{cv}", cv_text)
    }
}

const SYSTEM_TEMPLATE: &str = "You are an expert career analyst and recruiter. \
You read CVs and decide which job category fits the candidate best. \
Always answer with a single JSON object and nothing else.";

const CLASSIFICATION_TEMPLATE: &str =
    r#"Classify the CV below into exactly one of these job categories:
{labels}

<CV>
{cv}
</CV>

Respond with JSON only, in this exact shape:
{
  "category": "<one label from the list>",
  "confidence": <number between 0 and 1>,
  "reasoning": "<one or two sentences>"
}"#;
