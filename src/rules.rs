/// Grouping rules: colors, seed rules, sanitation and matching
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed palette of tab-group colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    #[default]
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    /// Display order used by the options page
    pub const ALL: [GroupColor; 9] = [
        GroupColor::Blue,
        GroupColor::Cyan,
        GroupColor::Green,
        GroupColor::Yellow,
        GroupColor::Red,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Orange,
        GroupColor::Grey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupColor::Grey => "grey",
            GroupColor::Blue => "blue",
            GroupColor::Red => "red",
            GroupColor::Yellow => "yellow",
            GroupColor::Green => "green",
            GroupColor::Pink => "pink",
            GroupColor::Purple => "purple",
            GroupColor::Cyan => "cyan",
            GroupColor::Orange => "orange",
        }
    }

    pub fn parse(value: &str) -> Option<GroupColor> {
        let wanted = value.trim().to_lowercase();
        GroupColor::ALL
            .into_iter()
            .find(|color| color.as_str() == wanted)
    }
}

impl fmt::Display for GroupColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named classification matched against tab hostnames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub color: GroupColor,
    pub keywords: Vec<String>,
}

impl Rule {
    pub fn new(name: &str, color: GroupColor, keywords: &[&str]) -> Rule {
        Rule {
            name: name.to_string(),
            color,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Build a rule from the options form fields
    ///
    /// Returns `None` when no keyword survives trimming.
    pub fn from_form(name: &str, color: GroupColor, keywords_csv: &str) -> Option<Rule> {
        let keywords: Vec<String> = keywords_csv
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        Rule {
            name: name.to_string(),
            color,
            keywords,
        }
        .sanitized()
    }

    /// Trim the name (falling back to "Group") and drop blank keywords
    pub fn sanitized(self) -> Option<Rule> {
        let name = match self.name.trim() {
            "" => DEFAULT_RULE_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        if keywords.is_empty() {
            None
        } else {
            Some(Rule {
                name,
                color: self.color,
                keywords,
            })
        }
    }

    /// Keywords joined the way the options form shows them
    pub fn keywords_csv(&self) -> String {
        self.keywords.join(", ")
    }

    /// True if any keyword is a case-insensitive substring of the hostname
    pub fn matches(&self, hostname: &str) -> bool {
        let hostname = hostname.to_lowercase();
        self.keywords
            .iter()
            .map(|k| k.to_lowercase())
            .any(|k| !k.is_empty() && hostname.contains(&k))
    }
}

const DEFAULT_RULE_NAME: &str = "Group";

/// Sanitize a whole rule list, dropping rules without keywords and keeping order
pub fn sanitize_rules(rules: Vec<Rule>) -> Vec<Rule> {
    rules.into_iter().filter_map(Rule::sanitized).collect()
}

/// The seed rules installed with the extension
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "Study",
            GroupColor::Blue,
            &[
                "leetcode",
                "geeksforgeeks",
                "w3schools",
                "mdn",
                "stack overflow",
                "hackerrank",
                "interviewbit",
            ],
        ),
        Rule::new(
            "Education",
            GroupColor::Green,
            &[
                "coursera",
                "udemy",
                "edx",
                "khanacademy",
                "nptel",
                "brilliant",
                "mit",
                "stanford",
                "harvard",
            ],
        ),
        Rule::new(
            "Research",
            GroupColor::Red,
            &["arxiv", "acm", "ieee", "springer", "nature", "science", "researchgate"],
        ),
        Rule::new(
            "AI",
            GroupColor::Yellow,
            &[
                "Chatgpt",
                "Grok",
                "Deepseek",
                "Claude",
                "Copilot",
                "ollama",
                "huggingface",
                "gemini",
            ],
        ),
    ]
}

/// Find the first rule (in list order) matching a hostname
///
/// Matching is a plain substring test: a keyword of "co" matches "company.com".
pub fn match_rule<'a>(hostname: &str, rules: &'a [Rule]) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.matches(hostname))
}
