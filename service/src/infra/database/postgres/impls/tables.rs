//! [`Table`] descriptors of the plainly stored [`Entity`]s.
//!
//! [`Entity`]: crate::domain::Entity

use tokio_postgres::Row;

use crate::{
    domain::{
        agent, brokerage, client, client_role, contract, listing, property,
        property_image, showing, transaction,
        user::{self, session, Session},
        Agent, Brokerage, Client, ClientRole, Contract, Listing,
        PropertyImage, Showing, Transaction, User,
    },
    infra::database::{
        self,
        postgres::{table::Params, Key, Table},
    },
};

/// Implements [`Key`] for the provided [`Table`].
macro_rules! impl_key {
    ($entity:ty { $($key:ty => [$($column:literal),+]),+ $(,)? }) => {$(
        impl Key<$key> for $entity {
            const KEY_COLUMNS: &'static [&'static str] = &[$($column),+];
        }
    )+};
}

impl Table for Brokerage {
    const TABLE: &'static str = "brokerages";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "address",
        "phone",
        "email",
        "license",
        "created_at",
    ];
    const ORDER_BY: &'static str = "name, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.name.clone()),
            Box::new(self.address.clone()),
            Box::new(self.phone.clone()),
            Box::new(self.email.clone()),
            Box::new(self.license.clone()),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            name: row.get("name"),
            address: row.get("address"),
            phone: row.get("phone"),
            email: row.get("email"),
            license: row.get("license"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Brokerage { brokerage::Id => ["id"] });

impl Table for Agent {
    const TABLE: &'static str = "agents";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "brokerage_id",
        "nrds",
        "name",
        "phone",
        "email",
        "ssn",
        "license_number",
        "license_expiration",
        "created_at",
    ];
    const OWNER: Option<&'static str> = Some("id");
    const ORDER_BY: &'static str = "name, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.brokerage_id),
            Box::new(self.nrds.clone()),
            Box::new(self.name.clone()),
            Box::new(self.phone.clone()),
            Box::new(self.email.clone()),
            Box::new(self.ssn.clone()),
            Box::new(self.license_number.clone()),
            Box::new(self.license_expiration),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            brokerage_id: row.get("brokerage_id"),
            nrds: row.get("nrds"),
            name: row.get("name"),
            phone: row.get("phone"),
            email: row.get("email"),
            ssn: row.get("ssn"),
            license_number: row.get("license_number"),
            license_expiration: row.get("license_expiration"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Agent {
    agent::Id => ["id"],
    brokerage::Id => ["brokerage_id"],
});

impl Table for Client {
    const TABLE: &'static str = "clients";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "ssn",
        "mailing_address",
        "phone",
        "email",
        "created_at",
    ];
    const ORDER_BY: &'static str = "name, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.name.clone()),
            Box::new(self.ssn.clone()),
            Box::new(self.mailing_address.clone()),
            Box::new(self.phone.clone()),
            Box::new(self.email.clone()),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            name: row.get("name"),
            ssn: row.get("ssn"),
            mailing_address: row.get("mailing_address"),
            phone: row.get("phone"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Client { client::Id => ["id"] });

impl Table for ClientRole {
    const TABLE: &'static str = "client_roles";
    const COLUMNS: &'static [&'static str] =
        &["id", "client_id", "role_id", "assigned_at"];
    const ORDER_BY: &'static str = "assigned_at DESC, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.client_id),
            Box::new(self.role),
            Box::new(self.assigned_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            client_id: row.get("client_id"),
            role: row.get("role_id"),
            assigned_at: row.get("assigned_at"),
        })
    }
}

impl_key!(ClientRole {
    client_role::Id => ["id"],
    client::Id => ["client_id"],
});

impl Table for Listing {
    const TABLE: &'static str = "listings";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "property_id",
        "agent_id",
        "client_id",
        "agent_role_id",
        "listing_date",
        "expiration_date",
        "exclusive",
        "asking_price",
        "created_at",
    ];
    const OWNER: Option<&'static str> = Some("agent_id");

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.property_id),
            Box::new(self.agent_id),
            Box::new(self.client_id),
            Box::new(self.agent_role),
            Box::new(self.listing_date),
            Box::new(self.expiration_date),
            Box::new(self.exclusive),
            Box::new(self.asking_price),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            property_id: row.get("property_id"),
            agent_id: row.get("agent_id"),
            client_id: row.get("client_id"),
            agent_role: row.get("agent_role_id"),
            listing_date: row.get("listing_date"),
            expiration_date: row.get("expiration_date"),
            exclusive: row.get("exclusive"),
            asking_price: row.get("asking_price"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Listing {
    listing::Id => ["id"],
    property::Id => ["property_id"],
    agent::Id => ["agent_id"],
    client::Id => ["client_id"],
});

impl Table for Showing {
    const TABLE: &'static str = "showings";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "property_id",
        "agent_id",
        "client_id",
        "agent_role_id",
        "showing_date",
        "feedback",
        "created_at",
    ];
    const OWNER: Option<&'static str> = Some("agent_id");

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.property_id),
            Box::new(self.agent_id),
            Box::new(self.client_id),
            Box::new(self.agent_role),
            Box::new(self.showing_date),
            Box::new(self.feedback.clone()),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            property_id: row.get("property_id"),
            agent_id: row.get("agent_id"),
            client_id: row.get("client_id"),
            agent_role: row.get("agent_role_id"),
            showing_date: row.get("showing_date"),
            feedback: row.get("feedback"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Showing {
    showing::Id => ["id"],
    property::Id => ["property_id"],
    agent::Id => ["agent_id"],
    client::Id => ["client_id"],
});

impl Table for Contract {
    const TABLE: &'static str = "contracts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "property_id",
        "client_id",
        "agent_id",
        "contract_type_id",
        "start_date",
        "end_date",
        "terms",
        "created_at",
    ];
    const OWNER: Option<&'static str> = Some("agent_id");

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.property_id),
            Box::new(self.client_id),
            Box::new(self.agent_id),
            Box::new(self.kind),
            Box::new(self.start_date),
            Box::new(self.end_date),
            Box::new(self.terms.clone()),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            property_id: row.get("property_id"),
            client_id: row.get("client_id"),
            agent_id: row.get("agent_id"),
            kind: row.get("contract_type_id"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            terms: row.get("terms"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Contract {
    contract::Id => ["id"],
    property::Id => ["property_id"],
    agent::Id => ["agent_id"],
    client::Id => ["client_id"],
});

impl Table for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "property_id",
        "seller_id",
        "buyer_id",
        "agent_id",
        "amount",
        "commission",
        "transaction_date",
        "closing_date",
        "transaction_type_id",
        "created_at",
    ];
    const OWNER: Option<&'static str> = Some("agent_id");
    const ORDER_BY: &'static str = "transaction_date DESC, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.property_id),
            Box::new(self.seller_id),
            Box::new(self.buyer_id),
            Box::new(self.agent_id),
            Box::new(self.amount),
            Box::new(self.commission),
            Box::new(self.transaction_date),
            Box::new(self.closing_date),
            Box::new(self.kind),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            property_id: row.get("property_id"),
            seller_id: row.get("seller_id"),
            buyer_id: row.get("buyer_id"),
            agent_id: row.get("agent_id"),
            amount: row.get("amount"),
            commission: row.get("commission"),
            transaction_date: row.get("transaction_date"),
            closing_date: row.get("closing_date"),
            kind: row.get("transaction_type_id"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Transaction {
    transaction::Id => ["id"],
    property::Id => ["property_id"],
    agent::Id => ["agent_id"],
    client::Id => ["seller_id", "buyer_id"],
});

/// Converts a pixel dimension into its stored `INT4` representation.
fn pixels(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl Table for PropertyImage {
    const TABLE: &'static str = "property_images";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "property_id",
        "image",
        "width",
        "height",
        "is_primary",
        "created_at",
    ];
    const ORDER_BY: &'static str = "is_primary DESC, created_at, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.property_id),
            Box::new(self.image.clone()),
            Box::new(pixels(self.dimensions.width)),
            Box::new(pixels(self.dimensions.height)),
            Box::new(self.is_primary),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        let dimension = |column: &str| {
            u32::try_from(row.get::<_, i32>(column)).map_err(|_| {
                database::Error::Integrity(format!(
                    "`{column}` is out of range",
                ))
            })
        };
        Ok(Self {
            id: row.get("id"),
            property_id: row.get("property_id"),
            image: row.get("image"),
            dimensions: property::Dimensions {
                width: dimension("width")?,
                height: dimension("height")?,
            },
            is_primary: row.get("is_primary"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(PropertyImage {
    property_image::Id => ["id"],
    property::Id => ["property_id"],
});

impl Table for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "username",
        "password_hash",
        "role_id",
        "agent_id",
        "created_at",
    ];
    const ORDER_BY: &'static str = "username, id";

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.username.clone()),
            Box::new(self.password_hash.clone()),
            Box::new(self.role),
            Box::new(self.agent_id),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            role: row.get("role_id"),
            agent_id: row.get("agent_id"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(User {
    user::Id => ["id"],
    user::Username => ["username"],
    agent::Id => ["agent_id"],
});

impl Table for Session {
    const TABLE: &'static str = "user_sessions";
    const COLUMNS: &'static [&'static str] =
        &["id", "username", "user_id", "expires_at", "created_at"];

    fn to_params(&self) -> Params {
        vec![
            Box::new(self.id),
            Box::new(self.username.clone()),
            Box::new(self.user_id),
            Box::new(self.expires_at),
            Box::new(self.created_at),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, database::Error> {
        Ok(Self {
            id: row.get("id"),
            username: row.get("username"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        })
    }
}

impl_key!(Session {
    session::Id => ["id"],
    user::Id => ["user_id"],
});
