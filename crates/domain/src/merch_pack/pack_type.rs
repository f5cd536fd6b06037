use common::enumeration;
use serde::{Deserialize, Serialize};

enumeration! {
    /// Kinds of merch pack in the catalog.
    #[derive(Serialize, Deserialize)]
    pub enum MerchPackType {
        WelcomePack = 10,
        ConferenceListenerPack = 20,
        ConferenceSpeakerPack = 30,
        ProbationPeriodEndingPack = 40,
        VeteranPack = 50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Enumeration, get_all};

    #[test]
    fn all_pack_types_in_declaration_order() {
        let ids: Vec<i32> = get_all::<MerchPackType>().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(
            MerchPackType::from_name("VeteranPack"),
            Ok(MerchPackType::VeteranPack)
        );
    }
}
