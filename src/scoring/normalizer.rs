use std::collections::HashMap;
use tracing::debug;

use super::dialect::Dialect;

/// Ordered literal replacements per dialect.
///
/// Rules run in table order; each rule rewrites every occurrence before the
/// next rule sees the text. Mapping to `""` deletes a particle.
#[derive(Debug, Clone, Default)]
pub struct NormalizationTable {
    rules: HashMap<Dialect, Vec<(String, String)>>,
}

impl NormalizationTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Regional words mapped onto their central-dialect equivalents
    pub fn builtin() -> Self {
        fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
            items
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        }

        Self::empty()
            .with_rules(
                Dialect::Northern,
                pairs(&[
                    ("กิ๋น", "กิน"),
                    ("จ๊าด", "มาก"),
                    ("ลำ", "อร่อย"),
                    ("ปิ๊ก", "กลับ"),
                    ("ตี้", "ที่"),
                    ("ยะ", "ทำ"),
                    ("ละอ่อน", "เด็ก"),
                ]),
            )
            .with_rules(
                Dialect::Isan,
                pairs(&[
                    ("แซบ", "อร่อย"),
                    ("เด้อ", ""),
                    ("จัก", "สัก"),
                    ("อยู่บ่", "อยู่ไหม"),
                    ("บ่", "ไม่"),
                    ("หลาย", "มาก"),
                    ("เข่า", "ข้าว"),
                ]),
            )
            .with_rules(
                Dialect::Southern,
                pairs(&[
                    ("หรอย", "อร่อย"),
                    ("นิ", "นี่"),
                    ("แล", "ดู"),
                    ("พรือ", "อย่างไร"),
                    ("หม้าย", "ไหม"),
                    ("หล่าว", "แล้ว"),
                ]),
            )
    }

    /// Replace the rule list for one dialect
    pub fn with_rules(mut self, dialect: Dialect, rules: Vec<(String, String)>) -> Self {
        self.rules.insert(dialect, rules);
        self
    }

    pub fn rules(&self, dialect: Dialect) -> &[(String, String)] {
        self.rules.get(&dialect).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Rewrites dialect tokens into the canonical form the scorer compares against
#[derive(Debug, Clone)]
pub struct DialectNormalizer {
    table: NormalizationTable,
}

impl DialectNormalizer {
    pub fn new(table: NormalizationTable) -> Self {
        Self { table }
    }

    pub fn normalize(&self, text: &str, dialect: Dialect) -> String {
        let mut normalized = text.trim().to_string();

        for (from, to) in self.table.rules(dialect) {
            if from.is_empty() {
                continue;
            }
            if normalized.contains(from.as_str()) {
                normalized = normalized.replace(from.as_str(), to);
            }
        }

        if normalized != text {
            debug!("Normalized {} transcript: {} -> {}", dialect, text, normalized);
        }

        normalized
    }
}

impl Default for DialectNormalizer {
    fn default() -> Self {
        Self::new(NormalizationTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_token_is_rewritten() {
        let normalizer = DialectNormalizer::default();
        assert_eq!(normalizer.normalize("กิ๋นข้าว", Dialect::Northern), "กินข้าว");
    }

    #[test]
    fn test_central_is_left_alone() {
        let normalizer = DialectNormalizer::default();
        assert_eq!(normalizer.normalize("กิ๋นข้าว", Dialect::Central), "กิ๋นข้าว");
    }

    #[test]
    fn test_mapping_to_empty_deletes_particle() {
        let normalizer = DialectNormalizer::default();
        assert_eq!(normalizer.normalize("สวัสดีเด้อ", Dialect::Isan), "สวัสดี");
    }

    #[test]
    fn test_longer_rule_listed_first_wins_overlap() {
        let normalizer = DialectNormalizer::default();
        // "อยู่บ่" is listed before "บ่", so the question form survives intact
        assert_eq!(normalizer.normalize("อยู่บ่", Dialect::Isan), "อยู่ไหม");
        assert_eq!(normalizer.normalize("บ่กิน", Dialect::Isan), "ไม่กิน");
    }

    #[test]
    fn test_table_order_decides_overlaps() {
        let table = NormalizationTable::empty().with_rules(
            Dialect::Southern,
            vec![
                ("ab".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
            ],
        );
        let normalizer = DialectNormalizer::new(table);
        assert_eq!(normalizer.normalize("abb", Dialect::Southern), "xy");
    }

    #[test]
    fn test_normalize_is_idempotent_for_acyclic_tables() {
        let normalizer = DialectNormalizer::default();
        let samples = [
            (Dialect::Northern, "กิ๋นข้าวจ๊าดลำ"),
            (Dialect::Northern, "ปิ๊กบ้านตี้ละอ่อนยะ"),
            (Dialect::Isan, "แซบหลายเด้อ"),
            (Dialect::Isan, "กินเข่าอยู่บ่"),
        ];

        for (dialect, text) in samples {
            let once = normalizer.normalize(text, dialect);
            let twice = normalizer.normalize(&once, dialect);
            assert_eq!(once, twice, "{} normalization not idempotent for {}", dialect, text);
        }
    }

    #[test]
    fn test_empty_rule_keys_are_skipped() {
        let table = NormalizationTable::empty()
            .with_rules(Dialect::Northern, vec![(String::new(), "x".to_string())]);
        let normalizer = DialectNormalizer::new(table);
        assert_eq!(normalizer.normalize("กิน", Dialect::Northern), "กิน");
    }
}
