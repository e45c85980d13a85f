use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Origin application of an error report.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    BotRuntime,
    MiniApp,
    Website,
    Other(String),
}

impl Platform {
    /// Tags counted individually in the per-platform statistics.
    pub const KNOWN: [Self; 3] = [Self::BotRuntime, Self::MiniApp, Self::Website];

    pub fn as_str(&self) -> &str {
        match self {
            Self::BotRuntime => "bot.ts",
            Self::MiniApp => "savolia-frontend",
            Self::Website => "savolia-web",
            Self::Other(tag) => tag,
        }
    }

    pub const fn icon(&self) -> &'static str {
        match self {
            Self::BotRuntime => "🤖",
            Self::MiniApp => "📱",
            Self::Website => "🌐",
            Self::Other(_) => "❓",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::BotRuntime => "🤖 Telegram Bot",
            Self::MiniApp => "📱 Mini App (Telegram)",
            Self::Website => "🌐 Web Site",
            Self::Other(_) => "❓ Unknown Platform",
        }
    }

    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Platform {
    fn from(tag: String) -> Self {
        match tag.trim() {
            "bot.ts" => Self::BotRuntime,
            "savolia-frontend" => Self::MiniApp,
            "savolia-web" => Self::Website,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for Platform {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the administrator's bot updates come from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Polling,
    Webhook,
    Disabled,
}

impl UpdateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Webhook => "webhook",
            Self::Disabled => "disabled",
        }
    }
}

impl Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "webhook" | "push" => Ok(Self::Webhook),
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            other => Err(format!("unknown update mode: {other}")),
        }
    }
}
