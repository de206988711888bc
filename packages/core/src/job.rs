//! Sync job types for mutations waiting to be replicated.

use serde::{Deserialize, Serialize};

use crate::Interests;

/// A single queued mutation of the device's registry state.
///
/// Jobs carry no identity of their own: their position in the job queue is
/// what orders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncJob {
    /// Register the device with the registry.
    Start {
        token: String,
        #[serde(default)]
        known_previous_device_ids: Vec<String>,
    },
    /// Replace the push token of a registered device.
    RefreshToken { new_token: String },
    /// Add a single interest.
    Subscribe { interest: String },
    /// Remove a single interest.
    Unsubscribe { interest: String },
    /// Replace the whole interest set.
    SetSubscriptions { interests: Interests },
}

impl SyncJob {
    pub fn start(token: impl Into<String>, known_previous_device_ids: Vec<String>) -> Self {
        SyncJob::Start {
            token: token.into(),
            known_previous_device_ids,
        }
    }

    pub fn refresh_token(new_token: impl Into<String>) -> Self {
        SyncJob::RefreshToken {
            new_token: new_token.into(),
        }
    }

    pub fn subscribe(interest: impl Into<String>) -> Self {
        SyncJob::Subscribe {
            interest: interest.into(),
        }
    }

    pub fn unsubscribe(interest: impl Into<String>) -> Self {
        SyncJob::Unsubscribe {
            interest: interest.into(),
        }
    }

    pub fn set_subscriptions<I, S>(interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SyncJob::SetSubscriptions {
            interests: interests.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this is a `Start` job.
    pub fn is_start(&self) -> bool {
        matches!(self, SyncJob::Start { .. })
    }

    /// Get a short kind name for logging and events.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncJob::Start { .. } => "start",
            SyncJob::RefreshToken { .. } => "refresh_token",
            SyncJob::Subscribe { .. } => "subscribe",
            SyncJob::Unsubscribe { .. } => "unsubscribe",
            SyncJob::SetSubscriptions { .. } => "set_subscriptions",
        }
    }

    /// Apply this job's effect on an interest set.
    ///
    /// Jobs that don't touch interests leave the set alone.
    pub fn apply_to(&self, interests: &mut Interests) {
        match self {
            SyncJob::Subscribe { interest } => {
                interests.insert(interest.clone());
            }
            SyncJob::Unsubscribe { interest } => {
                interests.remove(interest);
            }
            SyncJob::SetSubscriptions { interests: replacement } => {
                interests.clone_from(replacement);
            }
            SyncJob::Start { .. } | SyncJob::RefreshToken { .. } => {}
        }
    }
}

impl std::fmt::Display for SyncJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncJob::Start {
                known_previous_device_ids,
                ..
            } => write!(
                f,
                "start ({} known previous devices)",
                known_previous_device_ids.len()
            ),
            SyncJob::RefreshToken { .. } => write!(f, "refresh_token"),
            SyncJob::Subscribe { interest } => write!(f, "subscribe '{}'", interest),
            SyncJob::Unsubscribe { interest } => write!(f, "unsubscribe '{}'", interest),
            SyncJob::SetSubscriptions { interests } => {
                write!(f, "set_subscriptions ({} interests)", interests.len())
            }
        }
    }
}

/// Replay queued jobs over an initial interest set.
///
/// Replay walks the jobs in queue order and stops at the first `Start`
/// job: anything behind it belongs to a later registration.
pub fn replay_interests<'a, I>(initial: Interests, jobs: I) -> Interests
where
    I: IntoIterator<Item = &'a SyncJob>,
{
    let mut interests = initial;
    for job in jobs {
        if job.is_start() {
            break;
        }
        job.apply_to(&mut interests);
    }
    interests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Interests {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn replay_applies_mutations_in_order() {
        let jobs = vec![
            SyncJob::subscribe("x"),
            SyncJob::subscribe("y"),
            SyncJob::unsubscribe("x"),
            SyncJob::start("token", vec![]),
        ];

        assert_eq!(replay_interests(Interests::new(), &jobs), set(&["y"]));
    }

    #[test]
    fn replay_stops_at_first_start() {
        let jobs = vec![
            SyncJob::subscribe("a"),
            SyncJob::start("token", vec![]),
            SyncJob::subscribe("b"),
        ];

        assert_eq!(replay_interests(set(&["z"]), &jobs), set(&["a", "z"]));
    }

    #[test]
    fn set_subscriptions_replaces_everything_before_it() {
        let jobs = vec![
            SyncJob::subscribe("a"),
            SyncJob::set_subscriptions(["b", "c"]),
            SyncJob::unsubscribe("c"),
            SyncJob::refresh_token("new"),
        ];

        assert_eq!(replay_interests(set(&["initial"]), &jobs), set(&["b"]));
    }

    #[test]
    fn durable_encoding_is_tagged() {
        let json = serde_json::to_value(SyncJob::subscribe("news")).unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["interest"], "news");

        let start: SyncJob =
            serde_json::from_str(r#"{"type":"start","token":"t-1"}"#).unwrap();
        assert_eq!(start, SyncJob::start("t-1", vec![]));
    }
}
