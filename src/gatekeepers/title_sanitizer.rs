//! Title cleanup gatekeeper (spec §4.2). Runs as a fixed pipeline of
//! stages, each one logging whether it changed anything, so a caller can
//! see exactly which rule altered a given title.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

const MAX_TITLE_LENGTH: usize = 80;
const BRAND_MODEL_TARGET_POSITION: usize = 30;

lazy_static! {
    static ref JUNK_CHARS: Regex = Regex::new(r"[!*~@#$%^&]{2,}").unwrap();
    static ref SPECIAL_CHARS: Regex = Regex::new(r"[^\w\s\-&/.,'+()#]").unwrap();
    static ref BANNED_WORDS: HashSet<&'static str> = [
        "l@@k", "look!", "look!!", "wow", "wow!", "must see", "a+++", "a++", "nr", "no reserve",
        "free shipping", "fast shipping", "hot", "sexy", "rare!", "amazing", "incredible",
        "awesome", "perfect", "beautiful", "gorgeous", "stunning", "excellent!", "great!",
        "nice!", "cool!",
    ]
    .into_iter()
    .collect();
    static ref KNOWN_ACRONYMS: HashSet<&'static str> = [
        "nib", "nwt", "nwb", "nwot", "euc", "vgc", "guc", "oem", "oob", "usb", "hdmi", "led",
        "lcd", "dvd", "cd", "pc", "tv", "ac", "dc", "xl", "xxl", "xs", "sm", "md", "lg", "oz",
        "ml", "gb", "tb", "mb", "hp", "ps", "hd", "sd", "rgb", "ddr", "ssd", "hdd", "rpm", "mph",
        "nfl", "nba", "mlb", "nhl", "usa", "uk", "eu",
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone)]
pub struct SanitizeResult {
    pub original: String,
    pub sanitized: String,
    pub changes: Vec<String>,
    pub length: usize,
    pub brand_model_in_front: bool,
}

pub struct TitleSanitizer;

impl TitleSanitizer {
    pub fn new() -> Self {
        TitleSanitizer
    }

    pub fn sanitize(&self, title: &str, brand: Option<&str>, model: Option<&str>) -> SanitizeResult {
        let original = title.to_string();
        let mut changes = Vec::new();
        let mut current = title.to_string();

        current = self.strip_junk(&current, &mut changes);
        current = self.remove_banned_words(&current, &mut changes);
        current = self.normalize_case(&current, &mut changes);
        if brand.is_some() || model.is_some() {
            current = self.front_load_brand_model(&current, brand, model, &mut changes);
        }
        current = self.enforce_length(&current, &mut changes);

        let collapsed = current.split_whitespace().collect::<Vec<_>>().join(" ");
        current = collapsed.trim().to_string();

        let brand_model_in_front = self.check_brand_model_front(&current, brand, model);
        let length = current.len();

        SanitizeResult {
            original,
            sanitized: current,
            changes,
            length,
            brand_model_in_front,
        }
    }

    fn strip_junk(&self, title: &str, changes: &mut Vec<String>) -> String {
        let stripped = JUNK_CHARS.replace_all(title, "").to_string();
        let stripped = SPECIAL_CHARS.replace_all(&stripped, "").to_string();
        if stripped != title {
            changes.push("Stripped junk/special characters".to_string());
        } else {
            changes.push("No changes needed".to_string());
        }
        stripped
    }

    fn remove_banned_words(&self, title: &str, changes: &mut Vec<String>) -> String {
        let words: Vec<&str> = title.split_whitespace().collect();
        let mut kept: Vec<&str> = Vec::with_capacity(words.len());
        let mut i = 0;
        let mut changed = false;
        while i < words.len() {
            if i + 1 < words.len() {
                let phrase = format!("{} {}", words[i], words[i + 1]).to_lowercase();
                if BANNED_WORDS.contains(phrase.as_str()) {
                    changed = true;
                    i += 2;
                    continue;
                }
            }
            let word = words[i];
            let lower = word.to_lowercase();
            let lower_no_bang = lower.trim_end_matches('!');
            if BANNED_WORDS.contains(lower.as_str()) || BANNED_WORDS.contains(lower_no_bang) {
                changed = true;
                i += 1;
                continue;
            }
            kept.push(word);
            i += 1;
        }
        if changed {
            changes.push("Removed banned/spammy words".to_string());
        } else {
            changes.push("No changes needed".to_string());
        }
        kept.join(" ")
    }

    fn normalize_case(&self, title: &str, changes: &mut Vec<String>) -> String {
        let mut changed = false;
        let words: Vec<String> = title
            .split_whitespace()
            .map(|word| {
                let trimmed: &str = word.trim_matches(|c: char| ".,!-()#".contains(c));
                let is_all_caps = trimmed.len() > 1
                    && trimmed.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
                    && trimmed.chars().any(|c| c.is_alphabetic());
                if is_all_caps {
                    let lower = trimmed.to_lowercase();
                    if KNOWN_ACRONYMS.contains(lower.as_str()) {
                        changed = true;
                        trimmed.to_uppercase()
                    } else {
                        changed = true;
                        capitalize(word)
                    }
                } else {
                    word.to_string()
                }
            })
            .collect();
        if changed {
            changes.push("Normalized case".to_string());
        } else {
            changes.push("No changes needed".to_string());
        }
        words.join(" ")
    }

    fn front_load_brand_model(
        &self,
        title: &str,
        brand: Option<&str>,
        model: Option<&str>,
        changes: &mut Vec<String>,
    ) -> String {
        if self.check_brand_model_front(title, brand, model) {
            changes.push("No changes needed".to_string());
            return title.to_string();
        }

        let mut remaining = title.to_string();
        let mut prefix_parts = Vec::new();
        for part in [brand, model].into_iter().flatten() {
            if part.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i){}", regex::escape(part));
            if let Ok(re) = Regex::new(&pattern) {
                remaining = re.replace(&remaining, "").to_string();
            }
            prefix_parts.push(part.to_string());
        }
        remaining = remaining
            .trim_start_matches(|c: char| c == '-' || c == '\u{2013}' || c == '\u{2014}' || c == ' ')
            .trim()
            .to_string();

        let prefix = prefix_parts.join(" ");
        let result = if remaining.is_empty() {
            prefix
        } else {
            format!("{prefix} {remaining}")
        };
        changes.push("Front-loaded brand/model".to_string());
        result
    }

    fn check_brand_model_front(&self, title: &str, brand: Option<&str>, model: Option<&str>) -> bool {
        let window: String = title
            .chars()
            .take(BRAND_MODEL_TARGET_POSITION)
            .collect::<String>()
            .to_lowercase();
        let brand_ok = brand.map(|b| window.contains(&b.to_lowercase())).unwrap_or(true);
        let model_ok = model.map(|m| window.contains(&m.to_lowercase())).unwrap_or(true);
        brand_ok && model_ok
    }

    fn enforce_length(&self, title: &str, changes: &mut Vec<String>) -> String {
        if title.len() <= MAX_TITLE_LENGTH {
            changes.push("No changes needed".to_string());
            return title.to_string();
        }
        let truncated = &title[..MAX_TITLE_LENGTH];
        let last_space = truncated.rfind(' ');
        let result = match last_space {
            Some(pos) if pos > MAX_TITLE_LENGTH / 2 => truncated[..pos].to_string(),
            _ => truncated.to_string(),
        };
        changes.push(format!("Truncated to {MAX_TITLE_LENGTH} characters"));
        result
    }
}

impl Default for TitleSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
