//! Vendor target models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Position;

/// A vendor whose live position is being tracked, resolved for evaluation:
/// identity, display name and a concrete position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorTarget {
    pub vendor_id: Uuid,
    pub name: Option<String>,
    pub position: Position,
}

impl VendorTarget {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("A vendor")
    }
}

/// A raw (vendor id, position) pair as ingested from the live location feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VendorLivePosition {
    pub vendor_id: Uuid,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    use fake::faker::company::en::CompanyName;
    use fake::Fake;

    #[test]
    fn test_display_name_fallback() {
        let target = VendorTarget {
            vendor_id: Uuid::new_v4(),
            name: None,
            position: Position::new(0.0, 0.0).unwrap(),
        };
        assert_eq!(target.display_name(), "A vendor");

        let name: String = CompanyName().fake();
        let named = VendorTarget {
            name: Some(name.clone()),
            ..target
        };
        assert_eq!(named.display_name(), name);
    }
}
