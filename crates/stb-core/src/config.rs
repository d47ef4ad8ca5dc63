use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    command::TranscriptSettings,
    domain::ChatId,
    errors::Error,
    permissions::{Grant, PermissionTable, LIST, TRANSCRIPT},
    Result,
};

/// Typed configuration, loaded once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub command_prefix: String,

    // Routing
    pub log_channel: Option<ChatId>,

    // Permissions
    pub permissions: PermissionTable,

    // Storage
    pub ticket_db_path: PathBuf,
    pub transcript_dir: PathBuf,
    pub journal_dir: PathBuf,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,

    // Rate limiting
    pub command_cooldown: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let command_prefix = get("COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "/".to_string());

        let log_channel = match get("LOG_CHANNEL").and_then(non_empty) {
            None => None,
            Some(raw) => {
                let id = raw.trim().parse::<i64>().map_err(|_| {
                    Error::Config(format!("LOG_CHANNEL must be a chat id, got {raw:?}"))
                })?;
                (id != 0).then_some(ChatId(id))
            }
        };

        // Unset means everyone; an explicit empty value means nobody.
        let mut permissions = PermissionTable::new();
        let keys = [
            (TRANSCRIPT, "PERMISSION_TRANSCRIPT"),
            (LIST, "PERMISSION_LIST"),
        ];
        for (capability, key) in keys {
            let grant = get(key)
                .map(|raw| Grant::parse(&raw))
                .unwrap_or(Grant::Everyone);
            permissions.insert(capability, grant);
        }

        let ticket_db_path = get_path(&get, "TICKET_DB_PATH", "./tickets.json");
        let transcript_dir = get_path(&get, "TRANSCRIPT_DIR", "./transcripts");
        let journal_dir = get_path(&get, "JOURNAL_DIR", "./journal");

        let audit_log_path = get_path(&get, "AUDIT_LOG_PATH", "/tmp/support-ticket-bot-audit.log");
        let audit_log_json = get("AUDIT_LOG_JSON").map(|s| parse_bool(&s)).unwrap_or(false);

        let command_cooldown = Duration::from_secs(
            get("COMMAND_COOLDOWN_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(5),
        );

        Ok(Self {
            telegram_bot_token,
            command_prefix,
            log_channel,
            permissions,
            ticket_db_path,
            transcript_dir,
            journal_dir,
            audit_log_path,
            audit_log_json,
            command_cooldown,
        })
    }

    pub fn transcript_settings(&self) -> TranscriptSettings {
        TranscriptSettings {
            command_prefix: self.command_prefix.clone(),
            log_channel: self.log_channel,
            cooldown: self.command_cooldown,
        }
    }
}

fn get_path(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> PathBuf {
    PathBuf::from(get(key).and_then(non_empty).unwrap_or_else(|| default.to_string()))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
