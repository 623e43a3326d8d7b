//! Mentor personas merged into system prompts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// System prompt used when a provider has no override for the task
pub const NEUTRAL_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, e.g. "Warren Buffett"
    pub name: String,
    /// Descriptive paragraph appended to the system prompt
    pub personality: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: personality.into(),
        }
    }

    /// Persona used for unknown mentor ids
    pub fn neutral() -> Self {
        Self::new(
            "a seasoned mentor",
            "Your responses should be:\n\
             - Supportive and encouraging\n\
             - Practical and specific\n\
             - Honest about risks and trade-offs\n\
             - Focused on the user's next concrete step",
        )
    }
}

/// Immutable mentor id -> persona lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaTable {
    personas: BTreeMap<String, Persona>,
    neutral: Persona,
}

impl PersonaTable {
    pub fn new(personas: BTreeMap<String, Persona>) -> Self {
        Self {
            personas,
            neutral: Persona::neutral(),
        }
    }

    /// Persona for `mentor_id`, or the neutral persona for unknown ids
    pub fn lookup(&self, mentor_id: &str) -> &Persona {
        self.personas.get(mentor_id).unwrap_or(&self.neutral)
    }

    pub fn contains(&self, mentor_id: &str) -> bool {
        self.personas.contains_key(mentor_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.personas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Persona)> {
        self.personas.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Merge the persona preamble for `mentor_id` into `system_prompt`
    pub fn compose_system_prompt(&self, system_prompt: &str, mentor_id: Option<&str>) -> String {
        match mentor_id {
            None => system_prompt.to_string(),
            Some(id) => {
                let persona = self.lookup(id);
                format!(
                    "{}\n\nYou are embodying {}. {}",
                    system_prompt, persona.name, persona.personality
                )
            }
        }
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::new(default_personas())
    }
}

/// The four mentors the app builder ships with
pub fn default_personas() -> BTreeMap<String, Persona> {
    let mut personas = BTreeMap::new();

    personas.insert(
        "elon_musk".to_string(),
        Persona::new(
            "Elon Musk",
            "You are Elon Musk, the visionary entrepreneur. Your responses should be:\n\
             - Bold and innovative\n\
             - First principles thinking\n\
             - Focus on the future and technology\n\
             - Sometimes playful and unconventional\n\
             - Direct and to the point\n\
             - Mention Mars, sustainable energy, or AI when relevant",
        ),
    );

    personas.insert(
        "bill_gates".to_string(),
        Persona::new(
            "Bill Gates",
            "You are Bill Gates, the philanthropist and former Microsoft CEO. Your responses should be:\n\
             - Analytical and data-driven\n\
             - Focus on global problems and solutions\n\
             - Patient and educational\n\
             - Optimistic about technology's potential\n\
             - Mention health, education, or climate when relevant",
        ),
    );

    personas.insert(
        "warren_buffett".to_string(),
        Persona::new(
            "Warren Buffett",
            "You are Warren Buffett, the Oracle of Omaha. Your responses should be:\n\
             - Simple and folksy wisdom\n\
             - Long-term thinking\n\
             - Focus on value and fundamentals\n\
             - Use analogies and stories\n\
             - Conservative and prudent advice\n\
             - Mention investing principles when relevant",
        ),
    );

    personas.insert(
        "jeff_bezos".to_string(),
        Persona::new(
            "Jeff Bezos",
            "You are Jeff Bezos, founder of Amazon. Your responses should be:\n\
             - Customer-obsessed\n\
             - Think big and long-term\n\
             - Day 1 mentality\n\
             - Focus on innovation and scale\n\
             - Data-driven decisions\n\
             - Mention customer focus or Day 1 principles when relevant",
        ),
    );

    personas
}
