use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_QUESTIONS: &str = include_str!("../../assets/questions.json");

/// Answer slot, also the label a trained gesture must carry to select it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChoiceKey {
    A,
    B,
    C,
    D,
}

impl ChoiceKey {
    pub const ALL: [ChoiceKey; 4] = [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "A" => Some(ChoiceKey::A),
            "B" => Some(ChoiceKey::B),
            "C" => Some(ChoiceKey::C),
            "D" => Some(ChoiceKey::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceKey::A => "A",
            ChoiceKey::B => "B",
            ChoiceKey::C => "C",
            ChoiceKey::D => "D",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub prompt: String,
    pub options: BTreeMap<ChoiceKey, String>,
    #[serde(rename = "correct")]
    pub correct_key: ChoiceKey,
}

impl Question {
    pub fn is_correct(&self, key: ChoiceKey) -> bool {
        self.correct_key == key
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// The bundled question set.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_QUESTIONS).context("bundled question bank is invalid")
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(contents)?;
        Self::new(questions)
    }

    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            bail!("question bank is empty");
        }
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if let Some(first) = seen.insert(question.prompt.trim(), index) {
                bail!("question {index} repeats the prompt of question {first}");
            }
            if let Some(missing) = ChoiceKey::ALL
                .iter()
                .find(|key| !question.options.contains_key(key))
            {
                bail!("question {index} has no option {}", missing.as_str());
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
