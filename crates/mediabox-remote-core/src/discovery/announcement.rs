//! Announcement parsing.
//!
//! Wire format: `MediaBox:<id>:<name>:<address>:<features>` where `<features>`
//! is a comma-separated capability list.

use std::fmt;

use thiserror::Error;

/// Literal prefix every announcement starts with
pub const ANNOUNCEMENT_PREFIX: &str = "MediaBox:";

/// Capability a device must advertise to be remote-controllable
pub const PLAYER_FEATURE: &str = "PLAYER";

const FIELD_INDEX_ID: usize = 1;
const FIELD_INDEX_NAME: usize = 2;
const FIELD_INDEX_ADDRESS: usize = 3;
const FIELD_INDEX_FEATURES: usize = 4;
const MIN_FIELDS: usize = 5;

/// One parsed announcement. Never stored; only used to upsert the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: String,
    pub name: String,
    pub address: String,
    pub features: Vec<String>,
}

/// Why a datagram was not accepted as an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnouncementRejection {
    #[error("missing 'MediaBox:' prefix")]
    MissingPrefix,

    #[error("expected at least 5 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("device does not advertise PLAYER (features: {features})")]
    NotAPlayer { features: String },
}

impl Announcement {
    /// Whether the device advertises the given capability token.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Render the announcement in wire format.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}:{}:{}",
            ANNOUNCEMENT_PREFIX,
            self.id,
            self.name,
            self.address,
            self.features.join(",")
        )
    }
}

/// Parse a raw datagram into an announcement.
///
/// Announcers transmit their whole fixed-size buffer, so the payload is
/// trimmed of NUL padding as well as whitespace. Addresses are not
/// format-checked.
pub fn parse_announcement(data: &[u8]) -> Result<Announcement, AnnouncementRejection> {
    let text = String::from_utf8_lossy(data);
    let text = text.trim_matches(|c: char| c <= ' ');

    if !text.starts_with(ANNOUNCEMENT_PREFIX) {
        return Err(AnnouncementRejection::MissingPrefix);
    }

    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() < MIN_FIELDS {
        return Err(AnnouncementRejection::TooFewFields {
            found: fields.len(),
        });
    }

    let features: Vec<String> = fields[FIELD_INDEX_FEATURES]
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect();

    if !features.iter().any(|f| f == PLAYER_FEATURE) {
        return Err(AnnouncementRejection::NotAPlayer {
            features: fields[FIELD_INDEX_FEATURES].to_string(),
        });
    }

    Ok(Announcement {
        id: fields[FIELD_INDEX_ID].to_string(),
        name: fields[FIELD_INDEX_NAME].to_string(),
        address: fields[FIELD_INDEX_ADDRESS].to_string(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_announcement() {
        let ann =
            parse_announcement(b"MediaBox:ABC123:LivingRoom:192.168.1.50:PLAYER,AUDIO").unwrap();

        assert_eq!(ann.id, "ABC123");
        assert_eq!(ann.name, "LivingRoom");
        assert_eq!(ann.address, "192.168.1.50");
        assert_eq!(ann.features, vec!["PLAYER", "AUDIO"]);
        assert!(ann.has_feature("AUDIO"));
    }

    #[test]
    fn test_reject_non_player() {
        let result = parse_announcement(b"MediaBox:XYZ:Speaker:192.168.1.60:AUDIO");
        assert_eq!(
            result,
            Err(AnnouncementRejection::NotAPlayer {
                features: "AUDIO".to_string()
            })
        );
    }

    #[test]
    fn test_reject_missing_prefix() {
        assert_eq!(
            parse_announcement(b"OtherBox:ABC:Name:10.0.0.1:PLAYER"),
            Err(AnnouncementRejection::MissingPrefix)
        );
        assert_eq!(
            parse_announcement(b"mediabox:ABC:Name:10.0.0.1:PLAYER"),
            Err(AnnouncementRejection::MissingPrefix)
        );
    }

    #[test]
    fn test_reject_too_few_fields() {
        assert_eq!(
            parse_announcement(b"MediaBox:ABC:10.0.0.1:PLAYER"),
            Err(AnnouncementRejection::TooFewFields { found: 4 })
        );
    }

    #[test]
    fn test_trims_nul_padding_and_whitespace() {
        let mut datagram = b"  MediaBox:box1:Den:10.10.0.10:DLMASTER,PLAYER,SHAREDLIB\n".to_vec();
        datagram.resize(512, 0);

        let ann = parse_announcement(&datagram).unwrap();
        assert_eq!(ann.id, "box1");
        assert_eq!(ann.features, vec!["DLMASTER", "PLAYER", "SHAREDLIB"]);
    }

    #[test]
    fn test_permissive_address_and_extra_fields() {
        // Addresses are taken verbatim; fields past the features field are ignored.
        let ann = parse_announcement(b"MediaBox:id:name:not-an-ip:PLAYER:extra").unwrap();
        assert_eq!(ann.address, "not-an-ip");
        assert_eq!(ann.features, vec!["PLAYER"]);
    }

    #[test]
    fn test_player_must_be_whole_token() {
        assert!(parse_announcement(b"MediaBox:id:name:10.0.0.2:NOTPLAYER").is_err());
        assert!(parse_announcement(b"MediaBox:id:name:10.0.0.2: PLAYER ").is_ok());
    }

    #[test]
    fn test_to_wire_matches_announcer_format() {
        let ann = Announcement {
            id: "mediabox".to_string(),
            name: "mediabox.1".to_string(),
            address: "10.10.0.10".to_string(),
            features: vec!["DLMASTER".into(), "PLAYER".into(), "SHAREDLIB".into()],
        };
        assert_eq!(
            ann.to_wire(),
            "MediaBox:mediabox:mediabox.1:10.10.0.10:DLMASTER,PLAYER,SHAREDLIB"
        );
    }
}
