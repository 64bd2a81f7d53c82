/// Health terms recognised in free text, grouped per concept as
/// English, Hindi, Tamil, Telugu.
const HEALTH_KEYWORDS: &[&str] = &[
    "fever", "बुखार", "காய்ச்சல்", "జ్వరం",
    "cough", "खांसी", "இருமல்", "దగ్గు",
    "headache", "सिर दर्द", "தலைவலி", "తలనొప్పి",
    "stomach", "पेट", "வயிறு", "కడుపు",
    "pain", "दर्द", "வலி", "నొప్పి",
    "vomiting", "उल्टी", "வாந்தி", "వాంతులు",
    "diarrhea", "दस्त", "வயிற்றுப்போக்கு", "అతిసారం",
];

/// Returns every known keyword contained in `text`, in list order.
pub fn extract_health_keywords(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    HEALTH_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .collect()
}

/// The string handed to the knowledge base for `text`: matched keywords
/// joined by a space, or the raw text when nothing matched.
pub fn search_terms(text: &str) -> String {
    let keywords = extract_health_keywords(text);
    if keywords.is_empty() {
        text.to_string()
    } else {
        keywords.join(" ")
    }
}
