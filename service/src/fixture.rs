//! Test fixtures of domain entities and a [`Service`] over [`Memory`].

use common::{operations::Insert, Date, DateTimeOf, Money};
use rust_decimal::Decimal;
use secrecy::SecretBox;
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{
        agent, brokerage, contract,
        person::{Address, Name, Ssn},
        property::{self, Bathrooms, Detail, Residential},
        property_image, transaction,
        user::{self, Password, PasswordHash, Username},
        Agent, Brokerage, Client, Contract, Listing, Property, PropertyImage,
        Showing, Transaction, User,
    },
    infra::{database, database::memory::Memory, Database},
    Config, EnvAdmin, Images, Service,
};

/// Username of the environment admin.
pub(crate) const ADMIN: &str = "admin";

/// Password of the environment admin.
pub(crate) const ADMIN_PASSWORD: &str = "admin-password";

/// [`bcrypt`] cost cheap enough for tests.
pub(crate) const COST: u32 = 4;

/// Creates a new [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    let mut config = Config::new(b"test-secret");
    config.password_cost = COST;
    config.admin = Some(EnvAdmin {
        username: Username::new(ADMIN).unwrap(),
        password: SecretBox::new(Box::new(Password::from(ADMIN_PASSWORD))),
    });
    let images = Images::new(
        std::env::temp_dir().join(format!("property-images-{}", Uuid::new_v4())),
        Images::DEFAULT_MAX_SIZE,
    );
    Service::new(config, Memory::new(), images)
}

/// Inserts the provided `value` into the [`Memory`] database.
pub(crate) async fn insert<T>(svc: &Service<Memory>, value: T)
where
    Memory: Database<Insert<T>, Ok = (), Err = Traced<database::Error>>,
{
    svc.database().execute(Insert(value)).await.unwrap();
}

/// Encodes a black PNG image of the provided dimensions.
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(vec![]);
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Generates a random valid [`Ssn`].
fn ssn() -> Ssn {
    Ssn::new(format!("{:09}", Uuid::new_v4().as_u128() % 1_000_000_000))
        .unwrap()
}

/// Generates a random unique text value with the provided `prefix`.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub(crate) fn brokerage() -> Brokerage {
    Brokerage {
        id: brokerage::Id::new(),
        name: Name::new("Acme Realty").unwrap(),
        address: None,
        phone: None,
        email: None,
        license: brokerage::License::new(unique("BRK"))
            .unwrap(),
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn agent(brokerage_id: brokerage::Id) -> Agent {
    Agent {
        id: agent::Id::new(),
        brokerage_id,
        nrds: agent::Nrds::new(unique("NRDS")).unwrap(),
        name: Name::new("Jane Agent").unwrap(),
        phone: None,
        email: None,
        ssn: ssn(),
        license_number: agent::LicenseNumber::new(unique("LIC")).unwrap(),
        license_expiration: None,
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn client() -> Client {
    Client {
        id: crate::domain::client::Id::new(),
        name: Name::new("John Client").unwrap(),
        ssn: ssn(),
        mailing_address: None,
        phone: None,
        email: None,
        created_at: DateTimeOf::now(),
    }
}

/// Residential [`Detail`] with 3 bedrooms and 2 bathrooms.
pub(crate) fn residential_detail() -> Detail {
    Detail::Residential(Residential {
        bedrooms: 3,
        bathrooms: Bathrooms::new(Decimal::new(20, 1)).unwrap(),
        kind: None,
        square_feet: None,
        garage_spaces: 0,
        has_basement: false,
        has_pool: false,
    })
}

pub(crate) fn property(address: &str) -> Property {
    Property {
        id: property::Id::new(),
        tax_id: property::TaxId::generate(),
        address: Address::new(address).unwrap(),
        status: property::Status::default(),
        price: money("450000"),
        lot_size: None,
        year_built: None,
        zoning: None,
        property_tax: None,
        image: None,
        detail: residential_detail(),
        created_at: DateTimeOf::now(),
        updated_at: DateTimeOf::now(),
    }
}

/// [`PropertyImage`] of the [`Property`] with the provided ID, whose file is
/// not stored.
pub(crate) fn property_image(
    property_id: property::Id,
    is_primary: bool,
) -> PropertyImage {
    PropertyImage {
        id: property_image::Id::new(),
        property_id,
        image: property::ImageRef::new(format!("{}.png", Uuid::new_v4())),
        dimensions: property::Dimensions {
            width: 640,
            height: 480,
        },
        is_primary,
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn listing(
    property_id: property::Id,
    agent_id: agent::Id,
    client_id: crate::domain::client::Id,
) -> Listing {
    Listing {
        id: crate::domain::listing::Id::new(),
        property_id,
        agent_id,
        client_id,
        agent_role: agent::Role::SellerAgent,
        listing_date: Date::today(),
        expiration_date: None,
        exclusive: false,
        asking_price: money("450000"),
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn showing(
    property_id: property::Id,
    agent_id: agent::Id,
    client_id: crate::domain::client::Id,
) -> Showing {
    Showing {
        id: crate::domain::showing::Id::new(),
        property_id,
        agent_id,
        client_id,
        agent_role: agent::Role::BuyerAgent,
        showing_date: Date::today(),
        feedback: None,
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn contract(
    property_id: property::Id,
    agent_id: agent::Id,
    client_id: crate::domain::client::Id,
) -> Contract {
    Contract {
        id: contract::Id::new(),
        property_id,
        client_id,
        agent_id,
        kind: contract::Kind::Listing,
        start_date: Date::today(),
        end_date: None,
        terms: None,
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn transaction(
    property_id: property::Id,
    agent_id: agent::Id,
    seller_id: crate::domain::client::Id,
    buyer_id: crate::domain::client::Id,
) -> Transaction {
    Transaction {
        id: transaction::Id::new(),
        property_id,
        seller_id,
        buyer_id,
        agent_id,
        amount: money("440000"),
        commission: Some(money("13200")),
        transaction_date: Date::today(),
        closing_date: None,
        kind: transaction::Kind::Sale,
        created_at: DateTimeOf::now(),
    }
}

/// Creates a stored [`User`] with the provided credentials.
pub(crate) fn user(
    username: &str,
    password: &str,
    agent_id: Option<agent::Id>,
) -> User {
    User {
        id: user::Id::new(),
        username: Username::new(username).unwrap(),
        password_hash: PasswordHash::new(&Password::from(password), COST)
            .unwrap(),
        role: if agent_id.is_some() {
            user::Role::Agent
        } else {
            user::Role::Admin
        },
        agent_id,
        created_at: DateTimeOf::now(),
    }
}

pub(crate) fn money(amount: &str) -> Money {
    amount.parse().unwrap()
}
