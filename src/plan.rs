use crate::PlanId;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// A marketing plan, as returned by the server.
///
/// Only the `id` is guaranteed to be present. The server may answer a
/// creation request with nothing more than the new plan's ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    #[serde(default)]
    pub title: String,
    pub plan_type: Option<PlanType>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    pub timeline: Option<Timeline>,
    pub status: Option<PlanStatus>,
    /// Generated content, in whatever shape the generator produced.
    pub content: Option<serde_json::Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Plan {
    /// Fill in anything the server left out of a creation response using the
    /// request we sent.
    pub(crate) fn fill_from(&mut self, new: &NewPlan) {
        self.plan_type.get_or_insert(new.plan_type);
        self.timeline.get_or_insert(new.timeline);
        if self.channels.is_empty() {
            self.channels = new.channels.clone();
        }
        self.status.get_or_insert(PlanStatus::Draft);
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $wire:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )*
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )*
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    /// The kinds of plan the server knows how to generate.
    pub enum PlanType {
        PastClients => "past-clients",
        OpenHouse => "open-house",
    }
}

wire_enum! {
    /// A way of reaching out to a contact.
    pub enum Channel {
        Email => "email",
        Voicemail => "voicemail",
        Video => "video",
        Text => "text",
    }
}

wire_enum! {
    pub enum Timeline {
        ThirtyDays => "30days",
        SixtyDays => "60days",
        NinetyDays => "90days",
    }
}

wire_enum! {
    pub enum PlanStatus {
        Draft => "draft",
        Generating => "generating",
        Completed => "completed",
        Failed => "failed",
    }
}

/// A string didn't name any known variant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{value}\" isn't a valid {kind}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// A request to create a new [`Plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlan {
    pub plan_type: PlanType,
    pub channels: Vec<Channel>,
    pub timeline: Timeline,
}

impl NewPlan {
    /// Check the request before bothering the server with it.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels.is_empty() {
            return Err(String::from("A plan needs at least one channel"));
        }

        for (i, channel) in self.channels.iter().enumerate() {
            if self.channels[..i].contains(channel) {
                return Err(format!("The {} channel was listed twice", channel));
            }
        }

        Ok(())
    }
}

/// A partial update to an existing [`Plan`]. Missing fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<Channel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl PlanUpdate {
    pub fn is_empty(&self) -> bool { self == &PlanUpdate::default() }
}
