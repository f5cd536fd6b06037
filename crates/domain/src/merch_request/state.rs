//! Merch request status and origin enumerations.

use common::enumeration;
use serde::{Deserialize, Serialize};

enumeration! {
    /// The status of a merch request in its lifecycle.
    ///
    /// Transitions are driven by events outside this crate:
    /// ```text
    /// Created ──┬──► AwaitingDelivery ──► Done
    ///           │           │
    ///           ├───────────┴──► Canceled
    ///           └──► Done
    /// ```
    #[derive(Default, Serialize, Deserialize)]
    pub enum MerchRequestStatus {
        /// Request recorded, no decision made yet.
        #[default]
        Created = 1,

        /// Pack was out of stock; waiting for a supply to arrive.
        AwaitingDelivery = 2,

        /// Pack has been issued to the employee (terminal state).
        Done = 3,

        /// Request was withdrawn (terminal state).
        Canceled = 4,
    }
}

impl MerchRequestStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MerchRequestStatus::Done | MerchRequestStatus::Canceled)
    }
}

enumeration! {
    /// Where a merch request originated.
    #[derive(Serialize, Deserialize)]
    pub enum MerchRequestFromType {
        /// Raised by an automated trigger (onboarding, anniversaries).
        Automatically = 1,

        /// Raised by a person through the API.
        Manually = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Enumeration, EnumerationError, get_all};
    use std::collections::HashSet;

    #[test]
    fn status_members_in_declaration_order() {
        assert_eq!(
            get_all::<MerchRequestStatus>(),
            &[
                MerchRequestStatus::Created,
                MerchRequestStatus::AwaitingDelivery,
                MerchRequestStatus::Done,
                MerchRequestStatus::Canceled,
            ]
        );
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = MerchRequestStatus::all().iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), MerchRequestStatus::all().len());

        let ids: HashSet<_> = MerchRequestFromType::all().iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), MerchRequestFromType::all().len());
    }

    #[test]
    fn equality_matches_id_equality() {
        for a in MerchRequestStatus::all() {
            for b in MerchRequestStatus::all() {
                assert_eq!(a == b, a.id() == b.id());
            }
        }
    }

    #[test]
    fn default_status_is_created() {
        assert_eq!(MerchRequestStatus::default(), MerchRequestStatus::Created);
    }

    #[test]
    fn terminal_states() {
        assert!(!MerchRequestStatus::Created.is_terminal());
        assert!(!MerchRequestStatus::AwaitingDelivery.is_terminal());
        assert!(MerchRequestStatus::Done.is_terminal());
        assert!(MerchRequestStatus::Canceled.is_terminal());
    }

    #[test]
    fn unknown_status_id_is_rejected() {
        assert_eq!(
            MerchRequestStatus::try_from(42),
            Err(EnumerationError::UnknownId {
                type_name: "MerchRequestStatus",
                id: 42
            })
        );
    }

    #[test]
    fn status_and_origin_values_do_not_compare() {
        let done = MerchRequestStatus::AwaitingDelivery.to_value();
        let manually = MerchRequestFromType::Manually.to_value();
        assert_ne!(done, manually);
        assert!(matches!(
            done.try_compare(&manually),
            Err(EnumerationError::TypeMismatch {
                expected: "MerchRequestStatus",
                found: "MerchRequestFromType"
            })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(MerchRequestStatus::AwaitingDelivery.to_string(), "AwaitingDelivery");
        assert_eq!(MerchRequestFromType::Automatically.to_string(), "Automatically");
    }

    #[test]
    fn test_serialization() {
        let status = MerchRequestStatus::Done;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: MerchRequestStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
