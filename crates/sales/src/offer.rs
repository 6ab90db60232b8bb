use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealdesk_core::{Entity, OfferId, UserId};

use crate::sale::Totals;

/// The offer aggregate a sale can be converted from.
///
/// Owned by the offers module elsewhere; this subsystem only reads it and
/// flips its `converted` flag during convert/revert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub customer_id: String,
    pub totals: Totals,
    pub converted: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn new(
        id: OfferId,
        customer_id: impl Into<String>,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id: customer_id.into(),
            totals: Totals::default(),
            converted: false,
            created_by,
            created_at: now,
        }
    }
}

impl Entity for Offer {
    type Id = OfferId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
