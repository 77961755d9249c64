//! Korean phonological-rule environments between adjacent syllables
//!
//! Pronunciation diverges from spelling where a coda meets the next onset:
//! `국물` is said [궁물], `학교` [학꾜], `음악` [으막], `신라` [실라]. Drills
//! can avoid these environments or require one. Non-Hangul characters,
//! spaces included, are skipped, so environments span word boundaries the
//! way connected speech does.

use crate::model::request::PhonologicalRulesMode;
use crate::phoneme::korean::{decompose, Syllable};
use std::fmt;

const NASAL_TRIGGER_CODAS: &[&str] = &["ㄱ", "ㄷ", "ㅂ"];
const NASAL_ONSETS: &[&str] = &["ㄴ", "ㅁ"];
const FORTITION_CODAS: &[&str] = &["ㄱ", "ㄷ", "ㅂ", "ㅅ", "ㅈ", "ㅊ", "ㅋ", "ㅌ", "ㅍ"];
const PLAIN_ONSETS: &[&str] = &["ㄱ", "ㄷ", "ㅂ", "ㅅ", "ㅈ"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhonologicalRule {
    /// 비음화: plain stop coda before a nasal onset
    Nasalization,
    /// 경음화: plain onset after an obstruent coda
    Fortition,
    /// 연음: coda carried over a silent onset
    Liaison,
    /// 유음화: ㄴ next to ㄹ
    Liquidization,
}

impl PhonologicalRule {
    pub const ALL: [PhonologicalRule; 4] = [
        PhonologicalRule::Nasalization,
        PhonologicalRule::Fortition,
        PhonologicalRule::Liaison,
        PhonologicalRule::Liquidization,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PhonologicalRule::Nasalization => "nasalization",
            PhonologicalRule::Fortition => "fortition",
            PhonologicalRule::Liaison => "liaison",
            PhonologicalRule::Liquidization => "liquidization",
        }
    }
}

impl fmt::Display for PhonologicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One place where a rule applies. `index` is the char offset of the
/// syllable the rule changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEnvironment {
    pub rule: PhonologicalRule,
    pub index: usize,
    pub description: String,
}

fn nasal_of(coda: &str) -> &'static str {
    match coda {
        "ㄱ" => "ㅇ",
        "ㄷ" => "ㄴ",
        _ => "ㅁ",
    }
}

fn fortis_of(onset: &str) -> &'static str {
    match onset {
        "ㄱ" => "ㄲ",
        "ㄷ" => "ㄸ",
        "ㅂ" => "ㅃ",
        "ㅅ" => "ㅆ",
        _ => "ㅉ",
    }
}

struct Block {
    index: usize,
    ch: char,
    syllable: Syllable,
}

fn blocks(text: &str) -> Vec<Block> {
    text.chars()
        .enumerate()
        .filter_map(|(index, ch)| decompose(ch).map(|syllable| Block { index, ch, syllable }))
        .collect()
}

fn environment(rule: PhonologicalRule, first: &Block, second: &Block) -> Option<RuleEnvironment> {
    let coda = first.syllable.coda;
    let onset = second.syllable.onset;
    let pair = format!("{}{}", first.ch, second.ch);

    let (index, change) = match rule {
        PhonologicalRule::Nasalization
            if NASAL_TRIGGER_CODAS.contains(&coda) && NASAL_ONSETS.contains(&onset) =>
        {
            (first.index, format!("{} -> {} (before {})", coda, nasal_of(coda), onset))
        }
        PhonologicalRule::Fortition
            if FORTITION_CODAS.contains(&coda) && PLAIN_ONSETS.contains(&onset) =>
        {
            (second.index, format!("{} -> {} (after coda {})", onset, fortis_of(onset), coda))
        }
        PhonologicalRule::Liaison if first.syllable.has_coda() && onset == "ㅇ" => {
            (first.index, format!("coda {} -> onset of next syllable", coda))
        }
        PhonologicalRule::Liquidization if coda == "ㄴ" && onset == "ㄹ" => {
            (first.index, "ㄴ -> ㄹ (before ㄹ)".to_string())
        }
        PhonologicalRule::Liquidization if coda == "ㄹ" && onset == "ㄴ" => {
            (second.index, "ㄴ -> ㄹ (after ㄹ)".to_string())
        }
        _ => return None,
    };

    Some(RuleEnvironment {
        rule,
        index,
        description: format!("{}: {}", pair, change),
    })
}

/// Every rule environment in `text`, grouped by rule in [`PhonologicalRule::ALL`] order
pub fn detect_rules(text: &str) -> Vec<RuleEnvironment> {
    let blocks = blocks(text);
    PhonologicalRule::ALL
        .iter()
        .flat_map(|&rule| {
            blocks
                .windows(2)
                .filter_map(move |pair| environment(rule, &pair[0], &pair[1]))
        })
        .collect()
}

pub fn detect(text: &str, rule: PhonologicalRule) -> Vec<RuleEnvironment> {
    detect_rules(text).into_iter().filter(|env| env.rule == rule).collect()
}

/// Verdict of a rules-mode check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    pub passed: bool,
    pub environments: Vec<RuleEnvironment>,
}

/// `Avoid` passes with no environments, `Train` needs at least one, `Allow` always passes
pub fn check_rules(text: &str, mode: PhonologicalRulesMode) -> RuleCheck {
    let environments = detect_rules(text);
    let passed = match mode {
        PhonologicalRulesMode::Avoid => environments.is_empty(),
        PhonologicalRulesMode::Train => !environments.is_empty(),
        PhonologicalRulesMode::Allow => true,
    };
    RuleCheck {
        passed,
        environments,
    }
}
