use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::member::Affiliation;

/// Package categories. Every selection rule matches on this tag; package
/// names are display copy and carry no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComboKind {
    AllEvents,
    SingleWorkshop,
    AllEventsOneWorkshop,
}

/// Why a package cannot be applied to the current cart. The message is
/// shown to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("this package covers events only; remove workshops from your cart first")]
    WorkshopsNotCovered,

    #[error("this package needs exactly one workshop in your cart")]
    NeedsExactlyOneWorkshop,

    #[error("this package covers a single workshop; remove events from your cart first")]
    EventsNotCovered,
}

/// Check a package category against the cart contents.
pub fn validate_selection(
    kind: ComboKind,
    events_in_cart: usize,
    workshops_in_cart: usize,
) -> Result<(), SelectionError> {
    match kind {
        ComboKind::AllEvents => {
            if workshops_in_cart > 0 {
                return Err(SelectionError::WorkshopsNotCovered);
            }
        }
        ComboKind::SingleWorkshop => {
            if workshops_in_cart != 1 {
                return Err(SelectionError::NeedsExactlyOneWorkshop);
            }
            if events_in_cart > 0 {
                return Err(SelectionError::EventsNotCovered);
            }
        }
        ComboKind::AllEventsOneWorkshop => {
            if workshops_in_cart != 1 {
                return Err(SelectionError::NeedsExactlyOneWorkshop);
            }
        }
    }
    Ok(())
}

/// A purchasable package. The catalog is fixed for the fest edition and
/// ships in code; prices differ by verified affiliation.
#[derive(Debug, Clone, Copy)]
pub struct ComboPackage {
    /// Stable slug, referenced by the API and stored with selections.
    pub id: &'static str,
    pub kind: ComboKind,
    pub name: &'static str,
    pub price_host: i64,
    pub price_guest: i64,
    pub features: &'static [&'static str],
}

pub const CATALOG: &[ComboPackage] = &[
    ComboPackage {
        id: "all-events",
        kind: ComboKind::AllEvents,
        name: "All Events",
        price_host: 199,
        price_guest: 299,
        features: &[
            "Entry to every flagship and department event",
            "Fest kit and lanyard",
            "Pro-show access",
        ],
    },
    ComboPackage {
        id: "single-workshop",
        kind: ComboKind::SingleWorkshop,
        name: "Single Workshop",
        price_host: 249,
        price_guest: 349,
        features: &[
            "One hands-on workshop of your choice",
            "Certificate of participation",
        ],
    },
    ComboPackage {
        id: "all-events-one-workshop",
        kind: ComboKind::AllEventsOneWorkshop,
        name: "All Events + Workshop",
        price_host: 399,
        price_guest: 549,
        features: &[
            "Entry to every flagship and department event",
            "One hands-on workshop of your choice",
            "Fest kit and lanyard",
            "Pro-show access",
            "Certificate of participation",
        ],
    },
];

impl ComboPackage {
    pub fn find(id: &str) -> Option<&'static ComboPackage> {
        CATALOG.iter().find(|p| p.id == id)
    }

    pub fn price_for(&self, affiliation: Affiliation) -> i64 {
        match affiliation {
            Affiliation::Host => self.price_host,
            Affiliation::Guest => self.price_guest,
        }
    }
}

/// A member's chosen package with the price locked at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCombo {
    pub id: String,
    pub kind: ComboKind,
    pub name: String,
    pub price: i64,
}

impl SelectedCombo {
    pub fn from_package(package: &ComboPackage, affiliation: Affiliation) -> Self {
        Self {
            id: package.id.to_string(),
            kind: package.kind,
            name: package.name.to_string(),
            price: package.price_for(affiliation),
        }
    }
}
