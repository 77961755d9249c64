//! Generation prompts (Korean and English)

use crate::model::request::{
    CommunicativeFunction, GenerationRequest, Language, PhonemePosition, PhonologicalRulesMode,
    TherapyApproach,
};
use crate::reference::core_vocab::resolve_core_words;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates therapy sentences \
for children. Always respond in valid JSON format.";

fn theme_description(theme: &str, lang: Language) -> Option<&'static str> {
    let (ko, en) = match theme.trim().to_lowercase().as_str() {
        "daily" => ("일상생활 (먹기, 자기, 놀기, 옷 입기 등)", "daily life (eating, sleeping, playing, dressing)"),
        "animals" => ("동물 (강아지, 고양이, 토끼, 새 등)", "animals (dogs, cats, rabbits, birds)"),
        "food" => ("음식 (과일, 채소, 간식, 음료 등)", "food (fruits, vegetables, snacks, drinks)"),
        "family" => ("가족 (엄마, 아빠, 형제, 조부모 등)", "family (mom, dad, siblings, grandparents)"),
        "school" => ("학교/유치원 (선생님, 친구, 놀이 등)", "school (teacher, friends, playing)"),
        "nature" => ("자연 (날씨, 계절, 꽃, 나무 등)", "nature (weather, seasons, flowers, trees)"),
        "transportation" => ("교통수단 (자동차, 버스, 자전거 등)", "transportation (cars, buses, bicycles)"),
        "toys" => ("장난감 (인형, 블록, 공 등)", "toys (dolls, blocks, balls)"),
        _ => return None,
    };
    Some(pick(lang, ko, en))
}

fn function_description(function: CommunicativeFunction, lang: Language) -> &'static str {
    let (ko, en) = match function {
        CommunicativeFunction::Request => ("요청하기 (물건, 도움, 행동을 요청하는 문장)", "requesting (asking for objects, help, or actions)"),
        CommunicativeFunction::Reject => ("거부하기 (싫어요, 아니요 등 거부 표현)", "rejecting (saying no, refusing)"),
        CommunicativeFunction::Help => ("도움 요청하기 (도와주세요, 열어주세요 등)", "asking for help (please help, open it for me)"),
        CommunicativeFunction::Choice => ("선택하기 (이것 또는 저것 선택 표현)", "making choices (choosing between options)"),
        CommunicativeFunction::Attention => ("주의 끌기 (봐주세요, 여기요 등)", "getting attention (look at me, over here)"),
        CommunicativeFunction::Question => ("질문하기 (뭐야?, 어디야?, 왜? 등)", "asking questions (what, where, why)"),
    };
    pick(lang, ko, en)
}

fn age_guideline(age: u8, lang: Language) -> &'static str {
    let (ko, en) = match age {
        3 => ("3세: 매우 간단한 문장, 1-2개 핵심 단어, 의성어/의태어 활용", "3 years: very simple sentences, 1-2 key words, onomatopoeia"),
        4 => ("4세: 간단한 문장, 기본 문법, 친숙한 단어 위주", "4 years: simple sentences, basic grammar, familiar words"),
        6 => ("6세: 복합 문장 가능, 다양한 조사, 시제 표현", "6 years: compound sentences, varied grammar, tense"),
        7 => ("7세: 복잡한 문장 구조, 추상적 개념, 비유 표현", "7 years: complex structures, abstract ideas, figurative language"),
        _ => ("5세: 기본 문장, 조사 사용, 간단한 접속 표현", "5 years: basic sentences, simple conjunctions"),
    };
    pick(lang, ko, en)
}

fn position_description(position: PhonemePosition, lang: Language) -> &'static str {
    let (ko, en) = match position {
        PhonemePosition::Onset => ("초성 (음절의 첫소리)", "onset (beginning of syllable)"),
        PhonemePosition::Nucleus => ("중성 (모음)", "nucleus (vowel)"),
        PhonemePosition::Coda => ("종성 (음절의 끝소리/받침)", "coda (end of syllable)"),
        PhonemePosition::Any => ("모든 위치 (초성, 중성, 종성)", "any position"),
    };
    pick(lang, ko, en)
}

fn approach_instruction(approach: TherapyApproach, lang: Language) -> &'static str {
    let (ko, en) = match approach {
        TherapyApproach::MinimalPairs => (
            "최소대립쌍 치료: 타깃 음소가 뚜렷하게 들리는 쉬운 단어를 사용하세요.",
            "Minimal pairs therapy: use simple words where the target sound is clearly heard.",
        ),
        TherapyApproach::MaximalOppositions => (
            "최대대립 치료: 타깃 음소를 조음 특성이 크게 다른 소리와 함께 사용하세요.",
            "Maximal oppositions therapy: pair the target sound with very different sounds.",
        ),
        TherapyApproach::Complexity => (
            "복잡성 접근: 타깃 음소가 자음군이나 여러 음절에 나타나는 단어도 사용하세요.",
            "Complexity approach: include words where the target appears in clusters or longer words.",
        ),
        TherapyApproach::CoreVocabulary => (
            "핵심 어휘 접근: 일상에서 자주 쓰는 기능적 어휘로 의사소통 문장을 만드세요.",
            "Core vocabulary approach: build functional sentences from high-use everyday words.",
        ),
    };
    pick(lang, ko, en)
}

fn pick(lang: Language, ko: &'static str, en: &'static str) -> &'static str {
    match lang {
        Language::Ko => ko,
        Language::En => en,
    }
}

/// `{"tokens": [...]}` with the last `length` entries of `pool`
fn tokens_json(pool: &[&str], length: usize) -> String {
    let start = pool.len().saturating_sub(length);
    let tokens: Vec<String> = pool[start..].iter().map(|t| format!("\"{}\"", t)).collect();
    format!("{{\"tokens\": [{}]}}", tokens.join(", "))
}

/// Token-array example with exactly `length` entries
fn token_example(length: usize, lang: Language) -> String {
    let pool: &[&str] = match lang {
        Language::Ko => &["엄마랑", "같이", "빨간", "사과를", "맛있게", "먹어요"],
        Language::En => &["The", "little", "red", "car", "goes", "fast"],
    };
    tokens_json(pool, length)
}

/// One contrast set whose sentences have exactly `length` tokens
fn contrast_example(length: usize, lang: Language) -> String {
    let (target_word, contrast_word, target, contrast): (_, _, &[&str], &[&str]) = match lang {
        Language::Ko => (
            "라면",
            "나면",
            &["오늘", "엄마랑", "같이", "맛있는", "라면", "먹자"],
            &["오늘", "봄이", "오고", "꽃이", "나면", "좋아요"],
        ),
        Language::En => (
            "cat",
            "bat",
            &["Look", "at", "the", "little", "black", "cat"],
            &["Look", "up", "and", "see", "the", "bat"],
        ),
    };
    format!(
        "{{\"sets\": [{{\"target_word\": \"{}\", \"contrast_word\": \"{}\", \
         \"target_sentence\": {}, \"contrast_sentence\": {}}}]}}",
        target_word,
        contrast_word,
        tokens_json(target, length),
        tokens_json(contrast, length)
    )
}

fn quoted_list(words: &[String]) -> String {
    words.iter().map(|w| format!("\"{}\"", w)).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, request: &GenerationRequest, batch_size: usize) -> String {
        match request.language {
            Language::Ko => korean_prompt(request, batch_size),
            Language::En => english_prompt(request, batch_size),
        }
        .join("\n")
    }
}

fn korean_prompt(request: &GenerationRequest, batch_size: usize) -> Vec<String> {
    let lang = Language::Ko;
    let length = request.sentence_length;
    let contrast = request.wants_contrast_sets();
    let mut lines = Vec::new();

    lines.push(if contrast {
        format!("아동 언어치료용 대조 세트를 {}개 만들어 주세요.", batch_size)
    } else {
        format!("아동 언어치료용 한국어 문장을 {}개 만들어 주세요.", batch_size)
    });
    lines.push(String::new());
    lines.push("## 조건".to_string());
    lines.push(format!("- 연령: {}", age_guideline(request.age, lang)));
    lines.push(format!("- 각 문장은 정확히 {}개의 어절(띄어쓰기 단위)로 구성", length));
    if let Some(target) = request.phoneme_target() {
        lines.push(format!(
            "- 타깃 음소 '{}'가 {}에 오는 단어를 {}개 이상 포함",
            target.phoneme,
            position_description(target.position, lang),
            target.min_occurrences
        ));
    }
    lines.push(format!("- 진단: {}", request.diagnosis.code()));
    lines.push(format!("- {}", approach_instruction(request.therapy_approach, lang)));
    if request.therapy_approach == TherapyApproach::CoreVocabulary {
        let words = resolve_core_words(lang, request.core_words.as_deref());
        lines.push(format!("- 핵심 어휘 (각 문장에 하나 이상 반드시 포함): {}", quoted_list(&words)));
    }
    match request.enforced_rules_mode() {
        Some(PhonologicalRulesMode::Avoid) => lines.push(
            "- 비음화, 경음화, 연음, 유음화가 일어나는 음절 연결은 피하세요".to_string(),
        ),
        Some(PhonologicalRulesMode::Train) => lines.push(
            "- 비음화, 경음화, 연음, 유음화 중 하나가 일어나는 음절 연결을 포함하세요".to_string(),
        ),
        _ => {}
    }
    if let Some(theme) = &request.theme {
        let described = theme_description(theme, lang).unwrap_or(theme.as_str());
        lines.push(format!("- 주제: {}", described));
    }
    if let Some(function) = request.communicative_function {
        lines.push(format!("- 의사소통 기능: {}", function_description(function, lang)));
    }
    lines.push("- 아동에게 안전하고 친숙한 내용만 사용".to_string());
    lines.push(String::new());
    lines.push("## 출력 형식 (JSON)".to_string());
    if contrast {
        lines.push("각 세트에는 목표 단어, 대조 단어, 그리고 각 단어가 들어간 문장이 필요합니다.".to_string());
        lines.push(contrast_example(length, lang));
    } else {
        lines.push(format!("{{\"items\": [{}]}}", token_example(length, lang)));
    }
    lines.push(format!("tokens 배열의 길이는 반드시 {}이어야 합니다.", length));
    lines
}

fn english_prompt(request: &GenerationRequest, batch_size: usize) -> Vec<String> {
    let lang = Language::En;
    let length = request.sentence_length;
    let contrast = request.wants_contrast_sets();
    let mut lines = Vec::new();

    lines.push(if contrast {
        format!("Write {} contrast sets for child speech therapy.", batch_size)
    } else {
        format!("Write {} English sentences for child speech therapy.", batch_size)
    });
    lines.push(String::new());
    lines.push("## Requirements".to_string());
    lines.push(format!("- Age: {}", age_guideline(request.age, lang)));
    lines.push(format!("- Each sentence has exactly {} words", length));
    if let Some(target) = request.phoneme_target() {
        lines.push(format!(
            "- At least {} word(s) containing the sound /{}/ ({})",
            target.min_occurrences,
            target.phoneme,
            position_description(target.position, lang)
        ));
    }
    lines.push(format!("- Diagnosis: {}", request.diagnosis.code()));
    lines.push(format!("- {}", approach_instruction(request.therapy_approach, lang)));
    if request.therapy_approach == TherapyApproach::CoreVocabulary {
        let words = resolve_core_words(lang, request.core_words.as_deref());
        lines.push(format!(
            "- Every sentence must use one of these core words: {}",
            quoted_list(&words)
        ));
    }
    if let Some(theme) = &request.theme {
        let described = theme_description(theme, lang).unwrap_or(theme.as_str());
        lines.push(format!("- Theme: {}", described));
    }
    if let Some(function) = request.communicative_function {
        lines.push(format!("- Communicative function: {}", function_description(function, lang)));
    }
    lines.push("- Child-safe, familiar content only".to_string());
    lines.push(String::new());
    lines.push("## Output format (JSON)".to_string());
    if contrast {
        lines.push(
            "Each set needs a target word, a contrast word and a sentence for each.".to_string(),
        );
        lines.push(contrast_example(length, lang));
    } else {
        lines.push(format!("{{\"items\": [{}]}}", token_example(length, lang)));
    }
    lines.push(format!("Every tokens array must have exactly {} entries.", length));
    lines
}
