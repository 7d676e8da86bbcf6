use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    Active,
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Matcher {
    Exact(&'static [&'static str]),
    Contains(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Exact(tokens) => tokens.iter().any(|token| *token == text),
            Matcher::Contains(needles) => needles.iter().any(|needle| text.contains(needle)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    matcher: Matcher,
    outcome: Activity,
}

/// Classification rules, first match wins. Anything unmatched is inactive.
///
/// The substring rule also fires on phrases such as "not active" or
/// "ไม่ได้ใช้งาน"; the sheet backend never emits those, so the order is kept
/// as-is to stay compatible with its vocabulary.
pub const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::Exact(&[
            "active",
            "running",
            "on",
            "printing",
            "busy",
            "ใช้งาน",
            "กำลังพิมพ์",
            "ทำงาน",
            "เปิด",
        ]),
        outcome: Activity::Active,
    },
    Rule {
        matcher: Matcher::Exact(&[
            "inactive",
            "idle",
            "off",
            "available",
            "free",
            "ไม่ได้ใช้",
            "ว่าง",
            "หยุด",
            "ปิด",
        ]),
        outcome: Activity::Inactive,
    },
    Rule {
        matcher: Matcher::Contains(&["active", "ใช้งาน", "กำลัง", "print"]),
        outcome: Activity::Active,
    },
];

pub fn normalize(raw: Option<&str>) -> Activity {
    let Some(raw) = raw else {
        return Activity::Inactive;
    };
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Activity::Inactive;
    }
    RULES
        .iter()
        .find(|rule| rule.matcher.matches(&text))
        .map(|rule| rule.outcome)
        .unwrap_or(Activity::Inactive)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    Thai,
    Latin,
}

pub fn detect_script(raw: &str) -> Script {
    if raw.chars().any(|c| ('\u{0E01}'..='\u{0E59}').contains(&c)) {
        Script::Thai
    } else {
        Script::Latin
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Fixed Thai labels.
    #[default]
    Thai,
    /// Sheet text verbatim when it is already Thai, English labels otherwise.
    Sheet,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Thai => "thai",
            DisplayMode::Sheet => "sheet",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "thai" => Some(DisplayMode::Thai),
            "sheet" => Some(DisplayMode::Sheet),
            _ => None,
        }
    }
}

pub fn display_label(raw: Option<&str>, mode: DisplayMode) -> String {
    let activity = normalize(raw);
    match mode {
        DisplayMode::Thai => match activity {
            Activity::Active => "ใช้งาน".to_string(),
            Activity::Inactive => "ไม่ได้ใช้".to_string(),
        },
        DisplayMode::Sheet => {
            let raw = raw.unwrap_or_default();
            if detect_script(raw) == Script::Thai {
                raw.to_string()
            } else {
                match activity {
                    Activity::Active => "Active".to_string(),
                    Activity::Inactive => "Inactive".to_string(),
                }
            }
        }
    }
}
