use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PvpType {
    None,
    Optional,
    Open,
    Hardcore,
}

impl PvpType {
    /// Parses the ruleset names the world listing uses ("Optional PvP", "Retro Hardcore PvP", ...).
    pub fn parse(raw: &str) -> PvpType {
        let raw = raw.to_ascii_lowercase();
        if raw.contains("hardcore") {
            PvpType::Hardcore
        } else if raw.contains("open") {
            PvpType::Open
        } else if raw.contains("optional") {
            PvpType::Optional
        } else {
            PvpType::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SecurityTier {
    Unprotected,
    Protected,
    ProtectedSinceRelease,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldMetadata {
    pub name: String,
    pub transfer_blocked: bool,
    pub battleye_protected: bool,
    /// Activation date of the protection, or `"release"` for worlds protected from the start.
    pub battleye_date: Option<String>,
    pub pvp_type: String,
    pub last_update: Option<i64>,
}

impl WorldMetadata {
    pub fn security_tier(&self) -> SecurityTier {
        if !self.battleye_protected {
            SecurityTier::Unprotected
        } else if self
            .battleye_date
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("release"))
        {
            SecurityTier::ProtectedSinceRelease
        } else {
            SecurityTier::Protected
        }
    }

    pub fn pvp(&self) -> PvpType {
        PvpType::parse(&self.pvp_type)
    }
}

/// World metadata fetched ahead of time; transfer checks never go to the network.
#[derive(Debug, Clone, Default)]
pub struct WorldDirectory {
    worlds: HashMap<String, WorldMetadata>,
}

impl WorldDirectory {
    pub fn new(worlds: Vec<WorldMetadata>) -> Self {
        WorldDirectory {
            worlds: worlds.into_iter().map(|w| (w.name.clone(), w)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&WorldMetadata> {
        self.worlds.get(name)
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Whether a character may move from `from` to `to`. Unknown worlds never qualify.
    pub fn can_transfer_worlds(&self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let (Some(origin), Some(destination)) = (self.get(from), self.get(to)) else {
            return false;
        };
        if origin.transfer_blocked || destination.transfer_blocked {
            return false;
        }
        if destination.security_tier() > origin.security_tier() {
            return false;
        }
        origin.pvp() >= destination.pvp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(name: &str, pvp: &str, battleye_date: Option<&str>) -> WorldMetadata {
        WorldMetadata {
            name: name.to_string(),
            transfer_blocked: false,
            battleye_protected: battleye_date.is_some(),
            battleye_date: battleye_date.map(str::to_string),
            pvp_type: pvp.to_string(),
            last_update: None,
        }
    }

    fn directory() -> WorldDirectory {
        WorldDirectory::new(vec![
            world("Antica", "Open PvP", Some("release")),
            world("Secura", "Open PvP", Some("2017-08-29")),
            world("Bona", "Optional PvP", Some("release")),
            world("Zuna", "Hardcore PvP", None),
            world("Celesta", "Retro Hardcore PvP", Some("release")),
        ])
    }

    #[test]
    fn same_world_is_never_a_transfer() {
        assert!(!directory().can_transfer_worlds("Antica", "Antica"));
    }

    #[test]
    fn destination_protected_since_release_needs_the_same_tier() {
        let worlds = directory();
        assert!(!worlds.can_transfer_worlds("Secura", "Antica"));
        assert!(worlds.can_transfer_worlds("Antica", "Secura"));
        assert!(!worlds.can_transfer_worlds("Zuna", "Secura"));
    }

    #[test]
    fn pvp_strictness_must_not_increase() {
        let worlds = directory();
        assert!(!worlds.can_transfer_worlds("Bona", "Celesta"));
        assert!(!worlds.can_transfer_worlds("Bona", "Antica"));
        assert!(worlds.can_transfer_worlds("Celesta", "Antica"));
        assert!(worlds.can_transfer_worlds("Antica", "Bona"));
    }

    #[test]
    fn blocked_or_unknown_worlds_cannot_transfer() {
        let mut blocked = world("Vunira", "Open PvP", Some("release"));
        blocked.transfer_blocked = true;
        let worlds = WorldDirectory::new(vec![blocked, world("Antica", "Open PvP", Some("release"))]);
        assert!(!worlds.can_transfer_worlds("Vunira", "Antica"));
        assert!(!worlds.can_transfer_worlds("Antica", "Vunira"));
        assert!(!worlds.can_transfer_worlds("Antica", "Nowhere"));
    }

    #[test]
    fn parses_ruleset_names() {
        assert_eq!(PvpType::parse("Retro Open PvP"), PvpType::Open);
        assert_eq!(PvpType::parse("Optional PvP"), PvpType::Optional);
        assert_eq!(PvpType::parse("Hardcore PvP"), PvpType::Hardcore);
        assert_eq!(PvpType::parse(""), PvpType::None);
    }
}
