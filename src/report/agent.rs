//! A compact user-agent grammar: ordered rule tables for device, operating
//! system and browser, first match wins within each table.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Tokens extracted from a user-agent string. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub os_family: Option<String>,
    pub os_version: Option<String>,
    pub browser_family: Option<String>,
}

struct DeviceRule {
    pattern: &'static str,
    brand: Option<&'static str>,
    model: &'static str,
}

struct OsRule {
    pattern: &'static str,
    family: &'static str,
    /// Fixed version label; `None` joins numeric capture groups with dots.
    version: Option<&'static str>,
}

struct BrowserRule {
    pattern: &'static str,
    family: &'static str,
}

const DEVICE_RULES: &[DeviceRule] = &[
    DeviceRule {
        pattern: r"iPhone",
        brand: Some("Apple"),
        model: "iPhone",
    },
    DeviceRule {
        pattern: r"iPad",
        brand: Some("Apple"),
        model: "iPad",
    },
    DeviceRule {
        pattern: r"iPod",
        brand: Some("Apple"),
        model: "iPod",
    },
    DeviceRule {
        pattern: r"Macintosh",
        brand: Some("Apple"),
        model: "Mac",
    },
    DeviceRule {
        pattern: r"; *(SM-[A-Z0-9]+|GT-[A-Z0-9]+)",
        brand: Some("Samsung"),
        model: "${1}",
    },
    DeviceRule {
        pattern: r"; *(Pixel(?: [0-9A-Za-z]+)*?)(?: Build|;|\))",
        brand: Some("Google"),
        model: "${1}",
    },
    DeviceRule {
        pattern: r"; *((?:Redmi|POCO|Mi) [^;)]*?|M\d{4}[A-Z0-9]+)(?: Build|;|\))",
        brand: Some("Xiaomi"),
        model: "${1}",
    },
    DeviceRule {
        pattern: r"; *(?:HUAWEI|Huawei)[ _-]?([^;)]*?)(?: Build|;|\))",
        brand: Some("Huawei"),
        model: "${1}",
    },
    DeviceRule {
        pattern: r"Android [\d.]+; *(?:[a-z]{2}[-_][A-Za-z]{2}; *)?([^;)]{2,}?)(?: Build|;|\))",
        brand: None,
        model: "${1}",
    },
];

const OS_RULES: &[OsRule] = &[
    OsRule {
        pattern: r"(?:CPU (?:iPhone )?OS|iPhone OS) (\d+)[_.](\d+)(?:[_.](\d+))?",
        family: "iOS",
        version: None,
    },
    OsRule {
        pattern: r"Android[ /-]?(\d+)(?:\.(\d+))?(?:\.(\d+))?",
        family: "Android",
        version: None,
    },
    OsRule {
        pattern: r"Android",
        family: "Android",
        version: None,
    },
    OsRule {
        pattern: r"Windows NT 10\.0",
        family: "Windows",
        version: Some("10"),
    },
    OsRule {
        pattern: r"Windows NT 6\.3",
        family: "Windows",
        version: Some("8.1"),
    },
    OsRule {
        pattern: r"Windows NT 6\.2",
        family: "Windows",
        version: Some("8"),
    },
    OsRule {
        pattern: r"Windows NT 6\.1",
        family: "Windows",
        version: Some("7"),
    },
    OsRule {
        pattern: r"Windows NT 5\.[12]",
        family: "Windows",
        version: Some("XP"),
    },
    OsRule {
        pattern: r"Windows",
        family: "Windows",
        version: None,
    },
    OsRule {
        pattern: r"Mac OS X (\d+)[_.](\d+)(?:[_.](\d+))?",
        family: "Mac OS X",
        version: None,
    },
    OsRule {
        pattern: r"CrOS \S+ (\d+)\.(\d+)(?:\.(\d+))?",
        family: "Chrome OS",
        version: None,
    },
    OsRule {
        pattern: r"Ubuntu(?:/(\d+)\.(\d+))?",
        family: "Ubuntu",
        version: None,
    },
    OsRule {
        pattern: r"Linux",
        family: "Linux",
        version: None,
    },
];

const BROWSER_RULES: &[BrowserRule] = &[
    BrowserRule {
        pattern: r"YaBrowser/",
        family: "Yandex Browser",
    },
    BrowserRule {
        pattern: r"Edg(?:e|A|iOS)?/",
        family: "Edge",
    },
    BrowserRule {
        pattern: r"OPR/|Opera",
        family: "Opera",
    },
    BrowserRule {
        pattern: r"SamsungBrowser/",
        family: "Samsung Internet",
    },
    BrowserRule {
        pattern: r"Firefox/|FxiOS/",
        family: "Firefox",
    },
    BrowserRule {
        pattern: r"CriOS/",
        family: "Chrome Mobile iOS",
    },
    BrowserRule {
        pattern: r"Chrome/[\d.]+ Mobile",
        family: "Chrome Mobile",
    },
    BrowserRule {
        pattern: r"Chrome/",
        family: "Chrome",
    },
    BrowserRule {
        pattern: r"Version/[\d.]+ Mobile/\S+ Safari/",
        family: "Mobile Safari",
    },
    BrowserRule {
        pattern: r"Version/[\d.]+ Safari/",
        family: "Safari",
    },
    BrowserRule {
        pattern: r"(?:iPhone|iPad|iPod).*AppleWebKit",
        family: "WKWebView",
    },
    BrowserRule {
        pattern: r"^([A-Za-z][\w.-]*)/\d",
        family: "${1}",
    },
];

static DEVICES: LazyLock<Vec<(Regex, &'static DeviceRule)>> =
    LazyLock::new(|| compile(DEVICE_RULES, |rule| rule.pattern));
static SYSTEMS: LazyLock<Vec<(Regex, &'static OsRule)>> =
    LazyLock::new(|| compile(OS_RULES, |rule| rule.pattern));
static BROWSERS: LazyLock<Vec<(Regex, &'static BrowserRule)>> =
    LazyLock::new(|| compile(BROWSER_RULES, |rule| rule.pattern));

fn compile<T>(rules: &'static [T], pattern: fn(&T) -> &'static str) -> Vec<(Regex, &'static T)> {
    rules
        .iter()
        .filter_map(|rule| Regex::new(pattern(rule)).ok().map(|re| (re, rule)))
        .collect()
}

/// Parse a raw user-agent string.
pub fn parse(raw: &str) -> UserAgent {
    let mut agent = UserAgent::default();

    if let Some((caps, rule)) = first_match(&DEVICES, raw) {
        agent.device_brand = rule.brand.map(str::to_string);
        agent.device_model = expand(&caps, rule.model);
    }

    if let Some((caps, rule)) = first_match(&SYSTEMS, raw) {
        agent.os_family = Some(rule.family.to_string());
        agent.os_version = rule.version.map(str::to_string).or_else(|| {
            let parts: Vec<&str> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect();
            (!parts.is_empty()).then(|| parts.join("."))
        });
    }

    if let Some((caps, rule)) = first_match(&BROWSERS, raw) {
        agent.browser_family = expand(&caps, rule.family).filter(|family| family != "Mozilla");
    }

    agent
}

fn first_match<'h, T>(
    rules: &'static [(Regex, &'static T)],
    haystack: &'h str,
) -> Option<(Captures<'h>, &'static T)> {
    rules
        .iter()
        .find_map(|(re, rule)| re.captures(haystack).map(|caps| (caps, *rule)))
}

fn expand(caps: &Captures<'_>, template: &str) -> Option<String> {
    let mut out = String::new();
    caps.expand(template, &mut out);
    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}
