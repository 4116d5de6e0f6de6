use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to an uploaded photograph. Stored as a
/// side-car JSON document next to the binary; every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
}

impl ImageMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.photographer.is_none()
    }
}

/// One photograph in the catalog: its storage key, its public address, and
/// whatever metadata was stored alongside the binary.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Image {
    pub key: String,
    pub url: String,
    #[serde(flatten)]
    pub metadata: ImageMeta,
}

/// Persisted display order for the gallery. The single source of truth for
/// ordering; raw bucket listing order is never authoritative.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OrderLedger {
    pub order: Vec<String>,
}

impl OrderLedger {
    /// Accepts both the wrapped object form this service writes and the
    /// bare-list form older iterations of the document used.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LedgerDoc {
            Wrapped { order: Vec<String> },
            Bare(Vec<String>),
        }

        match serde_json::from_slice::<LedgerDoc>(bytes).ok()? {
            LedgerDoc::Wrapped { order } => Some(OrderLedger { order }),
            LedgerDoc::Bare(order) => Some(OrderLedger { order }),
        }
    }
}

// --- Wire types ---

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct UploadResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Serialize, Debug)]
pub struct ImagesResponse {
    pub images: Vec<Image>,
}

#[derive(Deserialize, Debug)]
pub struct ReorderRequest {
    pub images: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteRequest {
    pub key: String,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_parses_wrapped_form() {
        let doc = br#"{"order":["b.jpg","a.jpg"]}"#;
        assert_eq!(
            OrderLedger::parse(doc),
            Some(OrderLedger {
                order: vec!["b.jpg".into(), "a.jpg".into()]
            })
        );
    }

    #[test]
    fn ledger_parses_bare_list_form() {
        let doc = br#"["b.jpg","a.jpg"]"#;
        assert_eq!(
            OrderLedger::parse(doc),
            Some(OrderLedger {
                order: vec!["b.jpg".into(), "a.jpg".into()]
            })
        );
    }

    #[test]
    fn ledger_rejects_garbage() {
        assert_eq!(OrderLedger::parse(b"not json"), None);
        assert_eq!(OrderLedger::parse(br#"{"wrong":"shape"}"#), None);
    }

    #[test]
    fn image_serializes_metadata_flattened() {
        let image = Image {
            key: "k.jpg".into(),
            url: "https://photos.test/k.jpg".into(),
            metadata: ImageMeta {
                title: Some("Dawn".into()),
                ..ImageMeta::default()
            },
        };
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["key"], "k.jpg");
        assert_eq!(value["title"], "Dawn");
        // Empty optional fields stay off the wire entirely
        assert!(value.get("date").is_none());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn empty_metadata_detected() {
        assert!(ImageMeta::default().is_empty());
        let meta = ImageMeta {
            location: Some("London".into()),
            ..ImageMeta::default()
        };
        assert!(!meta.is_empty());
    }
}
