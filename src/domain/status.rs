//! Closed string enumerations. Each serializes to the short string form
//! used in the persisted schema, so storage compatibility is explicit
//! rather than incidental.

use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(ListingStatus {
    Draft => "draft",
    Queued => "queued",
    Active => "active",
    Zombie => "zombie",
    Purgatory => "purgatory",
    Sold => "sold",
    Ended => "ended",
});

impl ListingStatus {
    /// Whether `self -> to` is a legal transition per the status DAG in §3.
    pub fn can_transition_to(&self, to: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (*self, to),
            (Draft, Queued)
                | (Queued, Active)
                | (Active, Zombie)
                | (Active, Sold)
                | (Active, Ended)
                | (Zombie, Active)
                | (Zombie, Purgatory)
                | (Purgatory, Sold)
                | (Purgatory, Ended)
        )
    }
}

string_enum!(ZombieAction {
    Flagged => "flagged",
    Resurrected => "resurrected",
    Purgatored => "purgatored",
    PreventiveRelist => "preventive_relist",
});

string_enum!(QueueStatus {
    Pending => "pending",
    Released => "released",
    Failed => "failed",
    Cancelled => "cancelled",
});

string_enum!(CampaignType {
    Kickstarter => "kickstarter",
    Manual => "manual",
});

string_enum!(CampaignStatus {
    Active => "active",
    Ended => "ended",
    Cancelled => "cancelled",
});

string_enum!(JobStatus {
    Running => "running",
    Success => "success",
    Failed => "failed",
});

string_enum!(StrSource {
    Manual => "manual",
    Api => "api",
    Estimated => "estimated",
});

string_enum!(OfferStatus {
    Sent => "sent",
    Accepted => "accepted",
    Declined => "declined",
    Expired => "expired",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAction {
    Accept,
    Counter,
    Reject,
}

impl OfferAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferAction::Accept => "accept",
            OfferAction::Counter => "counter",
            OfferAction::Reject => "reject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            ListingStatus::Draft,
            ListingStatus::Queued,
            ListingStatus::Active,
            ListingStatus::Zombie,
            ListingStatus::Purgatory,
            ListingStatus::Sold,
            ListingStatus::Ended,
        ] {
            assert_eq!(ListingStatus::from_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn legal_transitions() {
        assert!(ListingStatus::Draft.can_transition_to(ListingStatus::Queued));
        assert!(ListingStatus::Queued.can_transition_to(ListingStatus::Active));
        assert!(ListingStatus::Active.can_transition_to(ListingStatus::Zombie));
        assert!(ListingStatus::Zombie.can_transition_to(ListingStatus::Active));
        assert!(ListingStatus::Zombie.can_transition_to(ListingStatus::Purgatory));
        assert!(ListingStatus::Purgatory.can_transition_to(ListingStatus::Sold));
    }

    #[test]
    fn illegal_transitions_rejected() {
        assert!(!ListingStatus::Draft.can_transition_to(ListingStatus::Active));
        assert!(!ListingStatus::Purgatory.can_transition_to(ListingStatus::Queued));
        assert!(!ListingStatus::Sold.can_transition_to(ListingStatus::Active));
    }
}
