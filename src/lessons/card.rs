use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::PracticeError;
use crate::scoring::Dialect;

/// One practice prompt with the phrases accepted per dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCard {
    pub prompt: String,
    pub targets: BTreeMap<Dialect, Vec<String>>,
}

impl LessonCard {
    pub fn new(prompt: impl Into<String>, targets: Vec<(Dialect, Vec<&str>)>) -> Self {
        let targets = targets
            .into_iter()
            .map(|(dialect, phrases)| (dialect, phrases.into_iter().map(str::to_string).collect()))
            .collect();

        let mut card = Self {
            prompt: prompt.into(),
            targets,
        };
        card.fill_missing_dialects();
        card
    }

    /// Accepted phrases for `dialect`, falling back to the central list when
    /// the dialect has none
    pub fn targets_for(&self, dialect: Dialect) -> &[String] {
        match self.targets.get(&dialect) {
            Some(phrases) if !phrases.is_empty() => phrases,
            _ => self
                .targets
                .get(&Dialect::Central)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    fn fill_missing_dialects(&mut self) {
        let central = self.targets.get(&Dialect::Central).cloned().unwrap_or_default();
        for dialect in Dialect::ALL {
            self.targets.entry(dialect).or_insert_with(|| central.clone());
        }
    }
}

/// Parse one raw lesson record
pub fn parse_card(item: &Value) -> Result<LessonCard, PracticeError> {
    let record = item
        .as_object()
        .ok_or_else(|| PracticeError::MalformedLessonData("record is not an object".to_string()))?;

    let prompt = match record.get("prompt") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(PracticeError::MalformedLessonData(
                "prompt is not text".to_string(),
            ))
        }
        None => return Err(PracticeError::MalformedLessonData("missing prompt".to_string())),
    };

    let raw_targets = record
        .get("targets")
        .ok_or_else(|| PracticeError::MalformedLessonData(format!("missing targets for '{}'", prompt)))?;

    let mut targets = BTreeMap::new();
    if let Some(map) = raw_targets.as_object() {
        for (key, phrases) in map {
            let Ok(dialect) = key.parse::<Dialect>() else {
                continue;
            };
            let phrases = match phrases {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Value::String(s) => vec![s.clone()],
                _ => Vec::new(),
            };
            targets.insert(dialect, phrases);
        }
    }

    let mut card = LessonCard { prompt, targets };
    card.fill_missing_dialects();
    Ok(card)
}

/// Keep the well-formed records of a lesson document, dropping the rest
pub fn validate(data: &Value) -> Vec<LessonCard> {
    let Some(items) = data.as_array() else {
        warn!(
            "{}",
            PracticeError::MalformedLessonData("lesson document is not a list".to_string())
        );
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match parse_card(item) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("Dropping lesson record {}: {}", i, e);
                None
            }
        })
        .collect()
}

/// Load lessons from a JSON file, substituting the built-in set when no
/// record survives validation
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<LessonCard>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read lessons: {}", path.display()))?;
    let data: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse lessons: {}", path.display()))?;

    let cards = validate(&data);
    if cards.is_empty() {
        warn!("No usable lessons in {}, using built-in set", path.display());
        return Ok(default_lessons());
    }

    info!("Loaded {} lessons from {}", cards.len(), path.display());
    Ok(cards)
}

pub fn save_json(path: impl AsRef<Path>, cards: &[LessonCard]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(cards)?;
    fs::write(path, json).with_context(|| format!("Failed to write lessons: {}", path.display()))?;

    info!("Saved {} lessons to {}", cards.len(), path.display());
    Ok(())
}

/// Built-in lesson set
pub fn default_lessons() -> Vec<LessonCard> {
    use Dialect::*;

    vec![
        LessonCard::new(
            "พูดคำว่า 'อร่อย' เป็นสำเนียงของคุณ",
            vec![
                (Central, vec!["อร่อย"]),
                (Northern, vec!["ลำ", "จ๊าดลำ"]),
                (Isan, vec!["แซบ", "แซบหลาย"]),
                (Southern, vec!["หรอย", "หรอยแรง"]),
            ],
        ),
        LessonCard::new(
            "พูดคำว่า 'กินข้าว' เป็นสำเนียงของคุณ",
            vec![
                (Central, vec!["กินข้าว"]),
                (Northern, vec!["กิ๋นข้าว"]),
                (Isan, vec!["กินเข่า", "กินข้าว"]),
                (Southern, vec!["กินข้าว"]),
            ],
        ),
        LessonCard::new(
            "พูดว่า 'ไปโรงเรียน' เป็นสำเนียงของคุณ",
            vec![
                (Central, vec!["ไปโรงเรียน"]),
                (Northern, vec!["ไปตี้โฮงเฮียน"]),
                (Isan, vec!["ไปโรงเฮียน"]),
                (Southern, vec!["ไปโรงเรียน"]),
            ],
        ),
        LessonCard::new(
            "พูดว่า 'สวัสดี'",
            vec![
                (Central, vec!["สวัสดี"]),
                (Northern, vec!["สวัสดีเจ้า"]),
                (Isan, vec!["สวัสดีเด้อ"]),
                (Southern, vec!["สวัสดีแหลง"]),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_dialects_default_to_central() {
        let cards = validate(&json!([
            {"prompt": "p", "targets": {"central": ["กินข้าว"], "isan": ["กินเข่า"]}}
        ]));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].targets_for(Dialect::Northern), ["กินข้าว".to_string()]);
        assert_eq!(cards[0].targets_for(Dialect::Isan), ["กินเข่า".to_string()]);
    }

    #[test]
    fn test_empty_dialect_list_falls_back_to_central() {
        let cards = validate(&json!([
            {"prompt": "p", "targets": {"central": ["อร่อย"], "southern": []}}
        ]));
        assert_eq!(cards[0].targets_for(Dialect::Southern), ["อร่อย".to_string()]);
    }

    #[test]
    fn test_malformed_records_are_dropped() {
        let cards = validate(&json!([
            "not a record",
            {"targets": {"central": ["x"]}},
            {"prompt": "no targets"},
            {"prompt": ["bad"], "targets": {}},
            {"prompt": "ok", "targets": {"central": ["สวัสดี"]}}
        ]));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].prompt, "ok");
    }

    #[test]
    fn test_non_object_targets_become_empty() {
        let cards = validate(&json!([{"prompt": "p", "targets": "กินข้าว"}]));
        assert_eq!(cards.len(), 1);
        assert!(cards[0].targets_for(Dialect::Central).is_empty());
    }

    #[test]
    fn test_non_list_document_is_empty() {
        assert!(validate(&json!({"prompt": "p"})).is_empty());
    }

    #[test]
    fn test_unknown_dialects_are_ignored() {
        let cards = validate(&json!([
            {"prompt": "p", "targets": {"central": ["a"], "klingon": ["b"]}}
        ]));
        assert_eq!(cards[0].targets.len(), Dialect::ALL.len());
    }

    #[test]
    fn test_default_lessons_cover_every_dialect() {
        let lessons = default_lessons();
        assert_eq!(lessons.len(), 4);
        for card in &lessons {
            for dialect in Dialect::ALL {
                assert!(!card.targets_for(dialect).is_empty());
            }
        }
    }
}
