use crate::aggregate::{percentage, SkillStat};
use crate::error::Result;
use crate::types::{skill_column, NormalizedRecord};
use regex::Regex;
use std::collections::HashSet;
use tracing::{info, warn};

/// Case-insensitive whole-word matcher for one skill keyword.
///
/// A hit counts only when the characters on both sides of it are not word
/// characters (alphanumeric or `_`), so `SQL` matches "use SQL daily" but not
/// "MySQLServer". Unlike `\b`, this also works for keywords that start or end
/// with punctuation such as `C++`.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    name: String,
    column: String,
    pattern: Regex,
}

impl SkillMatcher {
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        let pattern = Regex::new(&format!("(?i){}", regex::escape(name)))?;
        Ok(Self {
            name: name.to_string(),
            column: skill_column(name),
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn matches(&self, text: &str) -> bool {
        let mut start = 0;
        while start <= text.len() {
            let Some(m) = self.pattern.find_at(text, start) else {
                return false;
            };
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if !before.map_or(false, is_word_char) && !after.map_or(false, is_word_char) {
                return true;
            }
            // Retry one character further on; hits may overlap.
            start = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        false
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Adds one boolean `skill_<name>` attribute per tracked skill.
#[derive(Debug, Clone)]
pub struct SkillTagger {
    matchers: Vec<SkillMatcher>,
}

impl SkillTagger {
    /// Builds matchers for `vocabulary`, skipping blanks and entries that map
    /// to an already-tracked column.
    pub fn new(vocabulary: &[String]) -> Result<Self> {
        let mut columns = HashSet::new();
        let mut matchers = Vec::with_capacity(vocabulary.len());
        for skill in vocabulary {
            if skill.trim().is_empty() {
                continue;
            }
            let matcher = SkillMatcher::new(skill)?;
            if !columns.insert(matcher.column.clone()) {
                warn!(skill = %skill, "Skill listed twice in vocabulary, keeping the first entry");
                continue;
            }
            matchers.push(matcher);
        }
        Ok(Self { matchers })
    }

    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(SkillMatcher::name)
    }

    /// Tags every record and returns per-skill counts in vocabulary order.
    pub fn tag(&self, records: &mut [NormalizedRecord]) -> Vec<SkillStat> {
        let total = records.len();
        let mut stats = Vec::with_capacity(self.matchers.len());

        for matcher in &self.matchers {
            let mut count = 0;
            for record in records.iter_mut() {
                let hit = matcher.matches(&record.job_description);
                if hit {
                    count += 1;
                }
                record.skills.insert(matcher.column.clone(), hit);
            }
            let stat = SkillStat {
                skill: matcher.name.clone(),
                count,
                percentage: percentage(count, total),
            };
            info!("{}: {} jobs ({:.1}%)", stat.skill, stat.count, stat.percentage);
            stats.push(stat);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::extract_fields;
    use crate::types::RawRecord;
    use serde_json::json;

    fn matcher(name: &str) -> SkillMatcher {
        SkillMatcher::new(name).unwrap()
    }

    #[test]
    fn whole_word_case_insensitive() {
        let sql = matcher("SQL");
        assert!(sql.matches("I use SQL daily"));
        assert!(sql.matches("sql"));
        assert!(sql.matches("Postgres/sql, MySQL"));
        assert!(!sql.matches("MySQLServer"));
        assert!(!sql.matches("NoSQL only"));
        assert!(!sql.matches("SQL_Server"));
        assert!(!sql.matches(""));
    }

    #[test]
    fn later_occurrence_can_match_after_rejected_one() {
        assert!(matcher("AWS").matches("AWSome team, AWS certified"));
    }

    #[test]
    fn keywords_with_punctuation() {
        let cpp = matcher("C++");
        assert!(cpp.matches("Modern C++ and Rust"));
        assert!(!cpp.matches("ObjC++x"));
    }

    #[test]
    fn tags_every_record_with_booleans() {
        let tagger =
            SkillTagger::new(&["Python".to_string(), "SQL".to_string(), "sql".to_string()])
                .unwrap();
        assert_eq!(tagger.skills().collect::<Vec<_>>(), vec!["Python", "SQL"]);

        let mut records: Vec<NormalizedRecord> = ["python and SQL", "nothing relevant"]
            .iter()
            .map(|d| extract_fields(&RawRecord::new("us", json!({ "description": d }))))
            .collect();
        let stats = tagger.tag(&mut records);

        assert_eq!(records[0].skill("python"), Some(true));
        assert_eq!(records[0].skill("SQL"), Some(true));
        assert_eq!(records[1].skill("python"), Some(false));
        assert_eq!(records[1].skills.len(), 2);
        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[0].percentage, 50.0);
    }

    #[test]
    fn empty_record_set_reports_zero_percent() {
        let tagger = SkillTagger::new(&["Excel".to_string()]).unwrap();
        let stats = tagger.tag(&mut []);
        assert_eq!(stats[0].count, 0);
        assert_eq!(stats[0].percentage, 0.0);
    }
}
