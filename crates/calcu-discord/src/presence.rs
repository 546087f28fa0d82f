//! Config-driven bot presence ("Playing with numbers, @ me!").
//!
//! `activity_name` may contain `{channel}`, replaced by the trigger channel
//! name so the status line can advertise where the bot listens.

use serenity::all::ActivityData;
use serenity::model::user::OnlineStatus;
use tracing::warn;

use calcu_core::config::DiscordConfig;

/// Discord truncates activity names beyond this many characters.
const ACTIVITY_MAX: usize = 128;

/// Placeholder for the trigger channel in `activity_name`.
const CHANNEL_PLACEHOLDER: &str = "{channel}";

/// Status and activity sent on `ready`.
pub struct Presence {
    pub status: OnlineStatus,
    pub activity: Option<ActivityData>,
}

pub fn presence(config: &DiscordConfig) -> Presence {
    Presence {
        status: online_status(&config.status),
        activity: activity(config),
    }
}

/// Unknown strings fall back to online so the bot never hides by accident.
fn online_status(s: &str) -> OnlineStatus {
    match s.trim().to_lowercase().as_str() {
        "online" | "" => OnlineStatus::Online,
        "idle" | "away" => OnlineStatus::Idle,
        "dnd" | "do_not_disturb" => OnlineStatus::DoNotDisturb,
        "invisible" | "offline" => OnlineStatus::Invisible,
        other => {
            warn!(status = other, "unknown discord.status, using online");
            OnlineStatus::Online
        }
    }
}

/// The activity line, or `None` when no name is configured or it is blank.
fn activity(config: &DiscordConfig) -> Option<ActivityData> {
    let template = config.activity_name.as_deref()?.trim();
    if template.is_empty() {
        return None;
    }
    let name: String = template
        .replace(CHANNEL_PLACEHOLDER, &format!("#{}", config.trigger_channel))
        .chars()
        .take(ACTIVITY_MAX)
        .collect();

    let kind = config.activity_type.as_deref().unwrap_or("playing");
    Some(match kind.to_lowercase().as_str() {
        "listening" => ActivityData::listening(name),
        "watching" => ActivityData::watching(name),
        "competing" => ActivityData::competing(name),
        "custom" => ActivityData::custom(name),
        _ => ActivityData::playing(name),
    })
}
