//! Fixed prompts for the PlantCare assistant.

use serde::{Deserialize, Serialize};

use super::ChatMessage;
use crate::classifier::Prediction;

pub const SYSTEM_PROMPT: &str = "You are PlantCare AI Assistant, an expert plant pathologist and agricultural advisor embedded in the PlantCare AI diagnostic platform.

Your role is to help three types of users:
1. Farm operators using automated agricultural monitoring systems who need precise, actionable disease management data.
2. Home gardeners who need friendly, accessible advice on keeping their plants healthy.
3. Agricultural students and technicians learning plant pathology and disease identification.

When discussing a plant classification result, always cover:
- What the disease/condition is (biology, cause, how it spreads)
- Preventive measures (cultural practices, resistant varieties, environmental controls)
- Future damage risks if untreated (yield loss estimates, spread patterns, economic impact for farms)
- Treatment options (organic and conventional)

Keep responses clear, structured, and appropriately detailed. Use markdown formatting for readability.
Always be encouraging and solution-focused rather than alarmist.
If the plant is healthy, provide maintenance tips and early warning signs to watch for.";

/// Topic of a single-shot explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Overview,
    Prevention,
    Damage,
}

impl Panel {
    /// Lenient parse: anything unrecognised (or absent) is `Overview`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("prevention") => Panel::Prevention,
            Some("damage") => Panel::Damage,
            _ => Panel::Overview,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Panel::Overview => "overview",
            Panel::Prevention => "prevention",
            Panel::Damage => "damage",
        }
    }

    fn sections(self) -> &'static str {
        match self {
            Panel::Overview => "Provide a detailed overview with these sections:
1. **What is it?** - Explain the disease/condition, its scientific name if applicable, and biological cause
2. **How it spreads** - Transmission vectors, environmental conditions that favour it
3. **Visual symptoms** - Detailed description of what to look for beyond what was detected
4. **Severity assessment** - How serious is this for the plant and surrounding crops?

Format using markdown. Be thorough but accessible.",
            Panel::Prevention => "Provide comprehensive prevention guidance with these sections:
1. **Immediate actions** - What to do right now
2. **Cultural practices** - Watering, spacing, pruning, sanitation
3. **Environmental controls** - Humidity, temperature, airflow management
4. **Resistant varieties** - Suggest disease-resistant cultivars where applicable
5. **Organic treatments** - Natural/biological control methods
6. **Chemical treatments** - Fungicides/pesticides (active ingredients, not brand names)
7. **Monitoring schedule** - How often to inspect and what to track

Format using markdown. Include specific, actionable steps.",
            Panel::Damage => "Provide a detailed future damage and risk assessment with these sections:
1. **Short-term impact (1-2 weeks)** - What will happen if untreated
2. **Medium-term impact (1-3 months)** - Disease progression timeline
3. **Long-term consequences** - Permanent damage, plant death risk
4. **Spread risk** - Which nearby plants/crops are vulnerable
5. **Yield/economic impact** - Estimated losses for commercial growers
6. **Environmental factors** - Conditions that accelerate damage
7. **Recovery prognosis** - Can the plant fully recover? Under what conditions?

Format using markdown. Be realistic but solution-focused.",
        }
    }
}

/// Five-line diagnosis summary shared by every prompt.
pub fn build_plant_context(prediction: &Prediction) -> String {
    format!(
        "Plant: {}\nCondition: {}\nStatus: {}\nClassification: {}\nModel Confidence: {}%",
        prediction.plant_type,
        prediction.condition,
        prediction.status_label(),
        prediction.raw_class,
        percent_text(prediction.confidence),
    )
}

/// Percentage as users see it elsewhere: whole numbers keep one decimal
/// (`100.0`, `50.0`), others print at their stored precision (`97.77`).
pub fn percent_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn panel_prompt(panel: Panel, prediction: &Prediction) -> String {
    format!(
        "Given this plant diagnosis:\n{}\n\n{}",
        build_plant_context(prediction),
        panel.sections()
    )
}

/// System prompt extended with the current diagnosis for follow-up chat.
pub fn system_with_context(prediction: &Prediction) -> String {
    format!(
        "{SYSTEM_PROMPT}\n\n--- CURRENT DIAGNOSIS CONTEXT ---\n{}\n--- END CONTEXT ---\n\n\
         The user is asking follow-up questions about this specific diagnosis. \
         Always relate answers back to their specific plant and situation.",
        build_plant_context(prediction)
    )
}

/// Messages for a single-shot panel explanation.
pub fn learn_messages(panel: Panel, prediction: &Prediction) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(panel_prompt(panel, prediction)),
    ]
}

/// Messages for a streamed follow-up: context-bearing system prompt, then history.
pub fn chat_messages(prediction: &Prediction, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system_with_context(prediction)));
    messages.extend_from_slice(history);
    messages
}
