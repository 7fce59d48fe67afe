//! [`Agent`] definitions.

use common::{define_kind, define_text, unit, Date, DateTimeOf};
use serde::Serialize;

use super::{
    brokerage, define_id,
    person::{Email, Name, Phone, Ssn},
    Entity,
};

define_id!("Agent");

define_text! {
    #[doc = "NRDS (National Realtor Database System) number of an [`Agent`]."]
    struct Nrds(max = 50);
}

define_text! {
    #[doc = "State license number of an [`Agent`]."]
    struct LicenseNumber(max = 50);
}

define_kind! {
    #[doc = "Side an [`Agent`] represents in a deal."]
    enum Role {
        #[doc = "Represents the seller."]
        SellerAgent = 1,

        #[doc = "Represents the buyer."]
        BuyerAgent = 2,

        #[doc = "Represents the lessee."]
        LesseeAgent = 3,
    }
}

/// Licensed real-estate agent.
#[derive(Clone, Debug, Serialize)]
pub struct Agent {
    /// ID of this [`Agent`].
    pub id: Id,

    /// ID of the [`Brokerage`] this [`Agent`] works for.
    ///
    /// [`Brokerage`]: super::Brokerage
    pub brokerage_id: brokerage::Id,

    /// Unique [`Nrds`] of this [`Agent`].
    pub nrds: Nrds,

    /// Full name of this [`Agent`].
    pub name: Name,

    /// Phone of this [`Agent`].
    pub phone: Option<Phone>,

    /// Unique email of this [`Agent`].
    pub email: Option<Email>,

    /// Unique [`Ssn`] of this [`Agent`].
    pub ssn: Ssn,

    /// Unique [`LicenseNumber`] of this [`Agent`].
    pub license_number: LicenseNumber,

    /// Last day the license of this [`Agent`] is valid, if it expires.
    pub license_expiration: Option<Date>,

    /// [`DateTime`] when this [`Agent`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Agent {
    /// Checks whether the license of this [`Agent`] has expired by the
    /// provided `today`.
    #[must_use]
    pub fn is_license_expired(&self, today: Date) -> bool {
        self.license_expiration.is_some_and(|exp| exp < today)
    }
}

impl Entity for Agent {
    type Id = Id;

    const NAME: &'static str = "Agent";

    fn id(&self) -> Id {
        self.id
    }

    fn owner(&self) -> Option<Id> {
        Some(self.id)
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.created_at = existing.created_at;
    }
}

/// [`DateTime`] when an [`Agent`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Agent, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use super::{Agent, Id, LicenseNumber, Nrds, Role};
    use crate::domain::{
        brokerage,
        person::{Name, Ssn},
    };

    fn agent(license_expiration: Option<Date>) -> Agent {
        Agent {
            id: Id::new(),
            brokerage_id: brokerage::Id::new(),
            nrds: Nrds::new("NRDS-1").unwrap(),
            name: Name::new("Jane Doe").unwrap(),
            phone: None,
            email: None,
            ssn: Ssn::new("123-45-6789").unwrap(),
            license_number: LicenseNumber::new("LIC-1").unwrap(),
            license_expiration,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn license_expires_after_its_last_day() {
        let today = Date::from_ymd(2024, 6, 1).unwrap();

        assert!(!agent(None).is_license_expired(today));
        assert!(!agent(Some(today)).is_license_expired(today));
        assert!(!agent(Date::from_ymd(2025, 1, 1)).is_license_expired(today));
        assert!(agent(Date::from_ymd(2024, 5, 31)).is_license_expired(today));
    }

    #[test]
    fn parses_roles() {
        assert_eq!("SELLER_AGENT".parse::<Role>(), Ok(Role::SellerAgent));
        assert_eq!("buyer_agent".parse::<Role>(), Ok(Role::BuyerAgent));
        assert_eq!(Role::LesseeAgent.to_string(), "LESSEE_AGENT");
        assert!("BROKER".parse::<Role>().is_err());
    }
}
