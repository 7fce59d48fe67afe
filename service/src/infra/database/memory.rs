//! In-memory [`Database`] implementation used in tests.
//!
//! Mirrors the constraints of the Postgres schema which commands rely on:
//! primary, unique and foreign keys on insert/update, and foreign keys on
//! delete.
//! A [`Memory<Tx>`] works on a staged copy of the tables, which replaces the
//! shared ones on [`Commit`], and is discarded if dropped uncommitted.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use common::{
    operations::{By, Call, Commit, Delete, Insert, Select, Transact, Update},
    Date, Money, Page,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        agent, brokerage, client, client_role, contract, listing,
        property::{self, Commercial, Detail, Residential},
        property_image, showing, transaction,
        user::{self, session, Session},
        Agent, Brokerage, Client, ClientRole, Contract, Entity, Listing,
        Property, PropertyImage, Showing, Transaction, User,
    },
    infra::{database, Database},
    read::{
        self,
        dashboard::{AgentSummary, PropertyStat, PropertySummary, SalesSummary},
    },
};

/// In-memory [`Database`] [`Error`].
#[derive(Clone, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint is violated.
    #[display("foreign key constraint `{_0}` is violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),

    /// Failure injected with [`Memory::fail_on()`].
    #[display("injected failure of `{_0}`")]
    Injected(#[error(not(source))] String),

    /// [`Memory<Tx>`] is used after being committed.
    #[display("transaction is already committed")]
    Committed,
}

/// Tables of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tables {
    pub(crate) brokerages: BTreeMap<brokerage::Id, Brokerage>,
    pub(crate) agents: BTreeMap<agent::Id, Agent>,
    pub(crate) clients: BTreeMap<client::Id, Client>,
    pub(crate) client_roles: BTreeMap<client_role::Id, ClientRole>,
    pub(crate) properties: BTreeMap<property::Id, Property>,
    pub(crate) residential: BTreeSet<property::Id>,
    pub(crate) commercial: BTreeSet<property::Id>,
    pub(crate) property_images: BTreeMap<property_image::Id, PropertyImage>,
    pub(crate) listings: BTreeMap<listing::Id, Listing>,
    pub(crate) showings: BTreeMap<showing::Id, Showing>,
    pub(crate) contracts: BTreeMap<contract::Id, Contract>,
    pub(crate) transactions: BTreeMap<transaction::Id, Transaction>,
    pub(crate) users: BTreeMap<user::Id, User>,
    pub(crate) sessions: BTreeMap<session::Id, Session>,
}

/// State shared between the clones of a [`Memory`] database.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Committed [`Tables`].
    tables: Mutex<Tables>,

    /// Number of executed reads.
    reads: AtomicUsize,

    /// Operation to fail, as `"{op} {entity}"`.
    fail_on: Mutex<Option<String>>,
}

/// Non-transactional [`Memory`] mode, working on the committed [`Tables`].
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NonTx;

/// Transactional [`Memory`] mode, working on staged [`Tables`].
#[derive(Clone, Debug)]
pub(crate) struct Tx(Arc<Mutex<Option<Tables>>>);

/// Mode of a [`Memory`] database.
pub(crate) trait Mode: Clone + Send + Sync {
    /// Runs the provided function on the [`Tables`] of this [`Mode`].
    ///
    /// # Errors
    ///
    /// If the [`Tables`] are not accessible anymore.
    fn with<R>(
        &self,
        shared: &Shared,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, Error>;
}

impl Mode for NonTx {
    fn with<R>(
        &self,
        shared: &Shared,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, Error> {
        Ok(f(&mut lock(&shared.tables)))
    }
}

impl Mode for Tx {
    fn with<R>(
        &self,
        _: &Shared,
        f: impl FnOnce(&mut Tables) -> R,
    ) -> Result<R, Error> {
        lock(&self.0).as_mut().map(f).ok_or(Error::Committed)
    }
}

/// Locks the provided [`Mutex`], ignoring poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory<T = NonTx> {
    /// State shared between the clones.
    shared: Arc<Shared>,

    /// [`Mode`] of this [`Memory`] database.
    mode: T,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed [`Tables`].
    pub(crate) fn tables(&self) -> Tables {
        lock(&self.shared.tables).clone()
    }
}

impl<T> Memory<T> {
    /// Returns the number of reads executed so far.
    pub(crate) fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    /// Makes the `op` on the `entity` (like `"delete Transaction"`) fail
    /// from now on.
    pub(crate) fn fail_on(&self, op: &str) {
        *lock(&self.shared.fail_on) = Some(op.to_owned());
    }
}

impl<T: Mode> Memory<T> {
    /// Runs the `op` on the `entity` with the provided function.
    fn run<R>(
        &self,
        op: &str,
        entity: &str,
        f: impl FnOnce(&mut Tables) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        if matches!(op, "select" | "call") {
            _ = self.shared.reads.fetch_add(1, Ordering::SeqCst);
        }
        let label = format!("{op} {entity}");
        if lock(&self.shared.fail_on).as_deref() == Some(label.as_str()) {
            return Err(tracerr::new!(database::Error::from(Error::Injected(
                label
            ))));
        }
        self.mode
            .with(&self.shared, f)
            .and_then(|r| r)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Transact> for Memory {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let staged = lock(&self.shared.tables).clone();
        Ok(Memory {
            shared: Arc::clone(&self.shared),
            mode: Tx(Arc::new(Mutex::new(Some(staged)))),
        })
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let staged = lock(&self.mode.0).take();
        if let Some(tables) = staged {
            *lock(&self.shared.tables) = tables;
        }
        Ok(())
    }
}

/// [`Entity`] stored in a [`Tables`] map.
pub(crate) trait Stored: Entity<Id: Ord> {
    /// Returns the rows of this [`Entity`].
    fn rows(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self>;

    /// Returns the values of unique constraints of this row, named.
    fn unique(&self) -> Vec<(&'static str, String)> {
        vec![]
    }

    /// Returns the foreign key constraint referencing the row with the
    /// provided `id`, if any does.
    fn referenced(_: Self::Id, _: &Tables) -> Option<&'static str> {
        None
    }

    /// Returns the foreign key constraint of this row referring to a missing
    /// row, if any does.
    fn dangling(&self, _: &Tables) -> Option<&'static str> {
        None
    }
}

/// Returns the `constraint` if no row with the provided `id` exists.
fn missing<K: Ord, V>(
    rows: &BTreeMap<K, V>,
    id: &K,
    constraint: &'static str,
) -> Option<&'static str> {
    (!rows.contains_key(id)).then_some(constraint)
}

/// Value of type `K` a [`Stored`] row can be found by.
pub(crate) trait Relation<K>: Stored {
    /// Checks whether this row matches the provided `key`.
    fn matches(&self, key: &K) -> bool;
}

/// Checks the unique constraints of the provided `row` against `rows`.
fn check_unique<E: Stored>(
    row: &E,
    rows: &BTreeMap<E::Id, E>,
) -> Result<(), Error> {
    let unique = row.unique();
    for other in rows.values().filter(|o| o.id() != row.id()) {
        let existing = other.unique();
        if let Some((constraint, _)) =
            unique.iter().find(|u| existing.contains(u))
        {
            return Err(Error::UniqueViolation(constraint));
        }
    }
    Ok(())
}

impl<T: Mode, E: Stored> Database<Insert<E>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(row): Insert<E>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("insert", E::NAME, |t| {
            if let Some(constraint) = row.dangling(t) {
                return Err(Error::ForeignKeyViolation(constraint));
            }
            let rows = E::rows(t);
            if rows.contains_key(&row.id()) {
                return Err(Error::UniqueViolation("pkey"));
            }
            check_unique(&row, rows)?;
            _ = rows.insert(row.id(), row);
            Ok(())
        })
    }
}

impl<T: Mode, E: Stored> Database<Update<E>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(row): Update<E>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("update", E::NAME, |t| {
            if let Some(constraint) = row.dangling(t) {
                return Err(Error::ForeignKeyViolation(constraint));
            }
            let rows = E::rows(t);
            check_unique(&row, rows)?;
            if let Some(existing) = rows.get_mut(&row.id()) {
                *existing = row;
            }
            Ok(())
        })
    }
}

impl<T: Mode, E: Relation<K>, K> Database<Select<By<Option<E>, K>>>
    for Memory<T>
{
    type Ok = Option<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<E>, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        self.run("select", E::NAME, |t| {
            Ok(E::rows(t).values().find(|r| r.matches(&key)).cloned())
        })
    }
}

impl<T: Mode, E: Relation<K>, K> Database<Select<By<Vec<E>, K>>>
    for Memory<T>
{
    type Ok = Vec<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<E>, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        self.run("select", E::NAME, |t| {
            Ok(E::rows(t)
                .values()
                .filter(|r| r.matches(&key))
                .cloned()
                .collect())
        })
    }
}

impl<T: Mode, E: Stored> Database<Select<By<Page<E>, read::list::Selector>>>
    for Memory<T>
{
    type Ok = Page<E>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<E>, read::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::list::Selector { pagination, owner } = by.into_inner();
        self.run("select", E::NAME, |t| {
            let rows = E::rows(t)
                .values()
                .filter(|r| owner.is_none() || r.owner() == owner)
                .cloned()
                .collect::<Vec<_>>();
            Ok(paginate(pagination, rows))
        })
    }
}

impl<T: Mode, E: Relation<K>, K> Database<Delete<By<E, K>>> for Memory<T> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<E, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        self.run("delete", E::NAME, |t| {
            let ids = E::rows(t)
                .values()
                .filter(|r| r.matches(&key))
                .map(Entity::id)
                .collect::<Vec<_>>();
            for id in &ids {
                if let Some(constraint) = E::referenced(*id, t) {
                    return Err(Error::ForeignKeyViolation(constraint));
                }
            }
            let rows = E::rows(t);
            for id in &ids {
                _ = rows.remove(id);
            }
            Ok(ids.len() as u64)
        })
    }
}

impl<T: Mode> Database<Select<By<read::health::Alive, ()>>> for Memory<T> {
    type Ok = read::health::Alive;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::health::Alive, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("select", "Alive", |_| Ok(read::health::Alive))
    }
}

/// Cuts the [`Page`] out of all the `items`.
fn paginate<E>(pagination: common::Pagination, items: Vec<E>) -> Page<E> {
    let total = items.len() as u64;
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
    Page::new(
        pagination,
        items.into_iter().skip(offset).take(limit).collect(),
        total,
    )
}

/// Implements [`Stored`] for the provided [`Entity`].
macro_rules! impl_stored {
    (
        $entity:ty => $table:ident
        $(, unique { $($constraint:literal => |$u:ident| $value:expr),+ $(,)? })?
        $(, referenced |$id:ident, $t:ident| $referenced:expr)?
        $(, dangling |$row:ident, $rt:ident| $dangling:expr)?
        $(,)?
    ) => {
        impl Stored for $entity {
            fn rows(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self> {
                &mut tables.$table
            }

            $(
                fn unique(&self) -> Vec<(&'static str, String)> {
                    let mut unique = vec![];
                    $(
                        let $u = self;
                        if let Some(value) = $value {
                            unique.push(($constraint, value));
                        }
                    )+
                    unique
                }
            )?

            $(
                fn referenced(
                    $id: Self::Id,
                    $t: &Tables,
                ) -> Option<&'static str> {
                    $referenced
                }
            )?

            $(
                fn dangling(&self, $rt: &Tables) -> Option<&'static str> {
                    let $row = self;
                    $dangling
                }
            )?
        }
    };
}

/// Implements [`Relation`]s for the provided [`Stored`] entity.
macro_rules! impl_relation {
    ($entity:ty { $($key:ty => |$row:ident, $k:ident| $matches:expr),+ $(,)? }) => {$(
        impl Relation<$key> for $entity {
            fn matches(&self, key: &$key) -> bool {
                let ($row, $k) = (self, key);
                $matches
            }
        }
    )+};
}

impl_stored!(
    Brokerage => brokerages,
    unique { "brokerages_license_key" => |b| Some(b.license.to_string()) },
    referenced |id, t| t
        .agents
        .values()
        .any(|a| a.brokerage_id == id)
        .then_some("agents_brokerage_id_fkey"),
);
impl_relation!(Brokerage { brokerage::Id => |b, id| b.id == *id });

impl_stored!(
    Agent => agents,
    unique {
        "agents_nrds_key" => |a| Some(a.nrds.to_string()),
        "agents_email_key" => |a| a.email.as_ref().map(ToString::to_string),
        "agents_ssn_key" => |a| Some(a.ssn.as_ref().to_owned()),
        "agents_license_number_key" => |a| Some(a.license_number.to_string()),
    },
    referenced |id, t| {
        if t.listings.values().any(|l| l.agent_id == id) {
            Some("listings_agent_id_fkey")
        } else if t.showings.values().any(|s| s.agent_id == id) {
            Some("showings_agent_id_fkey")
        } else if t.contracts.values().any(|c| c.agent_id == id) {
            Some("contracts_agent_id_fkey")
        } else if t.transactions.values().any(|x| x.agent_id == id) {
            Some("transactions_agent_id_fkey")
        } else if t.users.values().any(|u| u.agent_id == Some(id)) {
            Some("users_agent_id_fkey")
        } else {
            None
        }
    },
    dangling |a, t| {
        missing(&t.brokerages, &a.brokerage_id, "agents_brokerage_id_fkey")
    },
);
impl_relation!(Agent {
    agent::Id => |a, id| a.id == *id,
    brokerage::Id => |a, id| a.brokerage_id == *id,
});

impl_stored!(
    Client => clients,
    unique { "clients_ssn_key" => |c| Some(c.ssn.as_ref().to_owned()) },
    referenced |id, t| {
        if t.client_roles.values().any(|r| r.client_id == id) {
            Some("client_roles_client_id_fkey")
        } else if t.listings.values().any(|l| l.client_id == id) {
            Some("listings_client_id_fkey")
        } else if t.showings.values().any(|s| s.client_id == id) {
            Some("showings_client_id_fkey")
        } else if t.contracts.values().any(|c| c.client_id == id) {
            Some("contracts_client_id_fkey")
        } else if t.transactions.values().any(|x| x.seller_id == id) {
            Some("transactions_seller_id_fkey")
        } else if t.transactions.values().any(|x| x.buyer_id == id) {
            Some("transactions_buyer_id_fkey")
        } else {
            None
        }
    },
);
impl_relation!(Client { client::Id => |c, id| c.id == *id });

impl_stored!(
    ClientRole => client_roles,
    dangling |r, t| {
        missing(&t.clients, &r.client_id, "client_roles_client_id_fkey")
    },
);
impl_relation!(ClientRole {
    client_role::Id => |r, id| r.id == *id,
    client::Id => |r, id| r.client_id == *id,
});

impl_stored!(
    Listing => listings,
    dangling |x, t| {
        missing(&t.properties, &x.property_id, "listings_property_id_fkey")
            .or_else(|| missing(&t.agents, &x.agent_id, "listings_agent_id_fkey"))
            .or_else(|| {
                missing(&t.clients, &x.client_id, "listings_client_id_fkey")
            })
    },
);
impl_relation!(Listing {
    listing::Id => |l, id| l.id == *id,
    property::Id => |l, id| l.property_id == *id,
    agent::Id => |l, id| l.agent_id == *id,
    client::Id => |l, id| l.client_id == *id,
});

impl_stored!(
    Showing => showings,
    dangling |x, t| {
        missing(&t.properties, &x.property_id, "showings_property_id_fkey")
            .or_else(|| missing(&t.agents, &x.agent_id, "showings_agent_id_fkey"))
            .or_else(|| {
                missing(&t.clients, &x.client_id, "showings_client_id_fkey")
            })
    },
);
impl_relation!(Showing {
    showing::Id => |s, id| s.id == *id,
    property::Id => |s, id| s.property_id == *id,
    agent::Id => |s, id| s.agent_id == *id,
    client::Id => |s, id| s.client_id == *id,
});

impl_stored!(
    Contract => contracts,
    dangling |x, t| {
        missing(&t.properties, &x.property_id, "contracts_property_id_fkey")
            .or_else(|| missing(&t.agents, &x.agent_id, "contracts_agent_id_fkey"))
            .or_else(|| {
                missing(&t.clients, &x.client_id, "contracts_client_id_fkey")
            })
    },
);
impl_relation!(Contract {
    contract::Id => |c, id| c.id == *id,
    property::Id => |c, id| c.property_id == *id,
    agent::Id => |c, id| c.agent_id == *id,
    client::Id => |c, id| c.client_id == *id,
});

impl_stored!(
    Transaction => transactions,
    dangling |x, t| {
        missing(&t.properties, &x.property_id, "transactions_property_id_fkey")
            .or_else(|| {
                missing(&t.agents, &x.agent_id, "transactions_agent_id_fkey")
            })
            .or_else(|| {
                missing(&t.clients, &x.seller_id, "transactions_seller_id_fkey")
            })
            .or_else(|| {
                missing(&t.clients, &x.buyer_id, "transactions_buyer_id_fkey")
            })
    },
);
impl_relation!(Transaction {
    transaction::Id => |x, id| x.id == *id,
    property::Id => |x, id| x.property_id == *id,
    agent::Id => |x, id| x.agent_id == *id,
    client::Id => |x, id| x.seller_id == *id || x.buyer_id == *id,
});

impl_stored!(
    PropertyImage => property_images,
    unique { "property_images_image_key" => |i| Some(i.image.to_string()) },
    dangling |i, t| missing(
        &t.properties,
        &i.property_id,
        "property_images_property_id_fkey",
    ),
);
impl_relation!(PropertyImage {
    property_image::Id => |i, id| i.id == *id,
    property::Id => |i, id| i.property_id == *id,
});

impl_stored!(
    User => users,
    unique { "users_username_key" => |u| Some(u.username.to_string()) },
    referenced |id, t| t
        .sessions
        .values()
        .any(|s| s.user_id == Some(id))
        .then_some("user_sessions_user_id_fkey"),
    dangling |u, t| u
        .agent_id
        .and_then(|id| missing(&t.agents, &id, "users_agent_id_fkey")),
);
impl_relation!(User {
    user::Id => |u, id| u.id == *id,
    user::Username => |u, name| u.username == *name,
    agent::Id => |u, id| u.agent_id == Some(*id),
});

impl_stored!(
    Session => sessions,
    dangling |s, t| s
        .user_id
        .and_then(|id| missing(&t.users, &id, "user_sessions_user_id_fkey")),
);
impl_relation!(Session {
    session::Id => |s, id| s.id == *id,
    user::Id => |s, id| s.user_id == Some(*id),
});

/// Returns the stored [`Property`] with its [`Detail`] presence checked.
fn joined(t: &Tables, p: &Property) -> Result<Property, Error> {
    let residential = t.residential.contains(&p.id);
    let commercial = t.commercial.contains(&p.id);
    match (&p.detail, residential, commercial) {
        (Detail::Residential(_), true, false)
        | (Detail::Commercial(_), false, true) => Ok(p.clone()),
        _ => Err(Error::ForeignKeyViolation("property_detail")),
    }
}

impl<T: Mode> Database<Select<By<Option<Property>, property::Id>>>
    for Memory<T>
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.run("select", Property::NAME, |t| {
            t.properties.get(&id).map(|p| joined(t, p)).transpose()
        })
    }
}

impl<T: Mode> Database<Select<By<Option<Property>, property::TaxId>>>
    for Memory<T>
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::TaxId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tax_id = by.into_inner();
        self.run("select", Property::NAME, |t| {
            t.properties
                .values()
                .find(|p| p.tax_id == tax_id)
                .map(|p| joined(t, p))
                .transpose()
        })
    }
}

impl<T: Mode> Database<Select<By<Page<Property>, read::property::Selector>>>
    for Memory<T>
{
    type Ok = Page<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<Property>, read::property::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Selector { pagination, filter } = by.into_inner();
        self.run("select", Property::NAME, |t| {
            let mut items = t
                .properties
                .values()
                .filter(|p| filter.status.is_none_or(|s| p.status == s))
                .filter(|p| filter.kind.is_none_or(|k| p.kind() == k))
                .filter(|p| {
                    filter.listed_by.is_none_or(|a| {
                        t.listings
                            .values()
                            .any(|l| l.property_id == p.id && l.agent_id == a)
                    })
                })
                .map(|p| joined(t, p))
                .collect::<Result<Vec<_>, _>>()?;
            items.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
            });
            Ok(paginate(pagination, items))
        })
    }
}

/// Computes the Levenshtein distance between the provided strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b = b.chars().collect::<Vec<_>>();
    let mut row = (0..=b.len()).collect::<Vec<_>>();
    for (i, ca) in a.chars().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let current = row[j + 1];
            row[j + 1] = if ca == *cb {
                prev
            } else {
                1 + prev.min(row[j]).min(current)
            };
            prev = current;
        }
    }
    row[b.len()]
}

impl<T: Mode> Database<Select<By<Page<Property>, read::property::Search>>>
    for Memory<T>
{
    type Ok = Page<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<Property>, read::property::Search>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Search { query, pagination } = by.into_inner();
        let query = query.to_lowercase();
        let words = query.split_whitespace().collect::<Vec<_>>();
        self.run("select", Property::NAME, |t| {
            let mut items = t
                .properties
                .values()
                .filter(|p| {
                    let address = p.address.as_ref().to_lowercase();
                    words.iter().any(|w| address.contains(w))
                })
                .map(|p| joined(t, p))
                .collect::<Result<Vec<_>, _>>()?;
            items.sort_by_key(|p| {
                (levenshtein(&p.address.as_ref().to_lowercase(), &query), p.id)
            });
            Ok(paginate(pagination, items))
        })
    }
}

impl<T: Mode> Database<Insert<Property>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("insert", Property::NAME, |t| {
            if t.properties.contains_key(&property.id) {
                return Err(Error::UniqueViolation("properties_pkey"));
            }
            if t.properties.values().any(|p| p.tax_id == property.tax_id) {
                return Err(Error::UniqueViolation("properties_tax_id_key"));
            }
            _ = match property.detail {
                Detail::Residential(_) => t.residential.insert(property.id),
                Detail::Commercial(_) => t.commercial.insert(property.id),
            };
            _ = t.properties.insert(property.id, property);
            Ok(())
        })
    }
}

impl<T: Mode> Database<Update<Property>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("update", Property::NAME, |t| {
            if let Some(existing) = t.properties.get_mut(&property.id) {
                *existing = property;
            }
            Ok(())
        })
    }
}

impl<T: Mode> Database<Delete<By<Residential, property::Id>>> for Memory<T> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Residential, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.run("delete", "Residential", |t| {
            Ok(u64::from(t.residential.remove(&id)))
        })
    }
}

impl<T: Mode> Database<Delete<By<Commercial, property::Id>>> for Memory<T> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Commercial, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.run("delete", "Commercial", |t| {
            Ok(u64::from(t.commercial.remove(&id)))
        })
    }
}

impl<T: Mode> Database<Delete<By<Property, property::Id>>> for Memory<T> {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.run("delete", Property::NAME, |t| {
            let constraint = if t.residential.contains(&id) {
                Some("residential_properties_property_id_fkey")
            } else if t.commercial.contains(&id) {
                Some("commercial_properties_property_id_fkey")
            } else if t.listings.values().any(|l| l.property_id == id) {
                Some("listings_property_id_fkey")
            } else if t.showings.values().any(|s| s.property_id == id) {
                Some("showings_property_id_fkey")
            } else if t.contracts.values().any(|c| c.property_id == id) {
                Some("contracts_property_id_fkey")
            } else if t.transactions.values().any(|x| x.property_id == id) {
                Some("transactions_property_id_fkey")
            } else if t.property_images.values().any(|i| i.property_id == id) {
                Some("property_images_property_id_fkey")
            } else {
                None
            };
            if let Some(constraint) = constraint {
                return Err(Error::ForeignKeyViolation(constraint));
            }
            Ok(u64::from(t.properties.remove(&id).is_some()))
        })
    }
}

/// Sums the provided amounts.
fn sum(amounts: impl IntoIterator<Item = Money>) -> Money {
    amounts
        .into_iter()
        .map(Money::amount)
        .sum::<rust_decimal::Decimal>()
        .try_into()
        .unwrap_or_default()
}

impl<T: Mode> Database<Call<By<PropertySummary, ()>>> for Memory<T> {
    type Ok = PropertySummary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Call<By<PropertySummary, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.run("call", "property_summary", |t| {
            let mut groups = BTreeMap::<(u8, u8), PropertyStat>::new();
            for p in t.properties.values() {
                let stat = groups
                    .entry((p.status.u8(), p.kind().u8()))
                    .or_insert(PropertyStat {
                        status: p.status,
                        kind: p.kind(),
                        count: 0,
                        total_value: Money::ZERO,
                    });
                stat.count += 1;
                stat.total_value = sum([stat.total_value, p.price]);
            }
            Ok(PropertySummary {
                stats: groups.into_values().collect(),
            })
        })
    }
}

impl<T: Mode> Database<Call<By<SalesSummary, Option<agent::Id>>>>
    for Memory<T>
{
    type Ok = SalesSummary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Call(by): Call<By<SalesSummary, Option<agent::Id>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let agent = by.into_inner();
        self.run("call", "sales_summary", |t| {
            let txs = t
                .transactions
                .values()
                .filter(|x| agent.is_none_or(|a| x.agent_id == a))
                .collect::<Vec<_>>();
            let count = |kind| {
                txs.iter().filter(|x| x.kind == kind).count() as u64
            };
            Ok(SalesSummary {
                transactions: txs.len() as u64,
                sales: count(transaction::Kind::Sale),
                leases: count(transaction::Kind::Lease),
                total_amount: sum(txs.iter().map(|x| x.amount)),
                total_commission: sum(txs.iter().filter_map(|x| x.commission)),
            })
        })
    }
}

impl<T: Mode> Database<Call<By<AgentSummary, agent::Id>>> for Memory<T> {
    type Ok = AgentSummary;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Call(by): Call<By<AgentSummary, agent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let agent = by.into_inner();
        let today = Date::today();
        self.run("call", "agent_summary", |t| {
            let listings = t
                .listings
                .values()
                .filter(|l| l.agent_id == agent)
                .collect::<Vec<_>>();
            Ok(AgentSummary {
                listings: listings.len() as u64,
                active_listings: listings
                    .iter()
                    .filter(|l| l.expiration_date.is_none_or(|e| e >= today))
                    .count() as u64,
                showings: t
                    .showings
                    .values()
                    .filter(|s| s.agent_id == agent)
                    .count() as u64,
                contracts: t
                    .contracts
                    .values()
                    .filter(|c| c.agent_id == agent)
                    .count() as u64,
                transactions: t
                    .transactions
                    .values()
                    .filter(|x| x.agent_id == agent)
                    .count() as u64,
            })
        })
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Delete, Insert, Select, Transact};

    use crate::{
        domain::{brokerage, person, Brokerage},
        infra::Database as _,
    };

    use super::{levenshtein, Memory};

    fn brokerage(license: &str) -> Brokerage {
        Brokerage {
            id: brokerage::Id::new(),
            name: person::Name::new("Acme Realty").unwrap(),
            address: None,
            phone: None,
            email: None,
            license: brokerage::License::new(license).unwrap(),
            created_at: common::DateTimeOf::now(),
        }
    }

    #[tokio::test]
    async fn discards_uncommitted_transaction() {
        let db = Memory::new();
        let b = brokerage("LIC-1");

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(b.clone())).await.unwrap();
        drop(tx);
        assert!(db.tables().brokerages.is_empty());

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(b.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();
        assert!(db.tables().brokerages.contains_key(&b.id));
    }

    #[tokio::test]
    async fn checks_unique_constraints() {
        let db = Memory::new();
        db.execute(Insert(brokerage("LIC-1"))).await.unwrap();

        let err = db.execute(Insert(brokerage("LIC-1"))).await.unwrap_err();
        assert!(err.as_ref().is_unique_violation());
    }

    #[tokio::test]
    async fn injects_failures_and_counts_reads() {
        let db = Memory::new();
        let b = brokerage("LIC-1");
        db.execute(Insert(b.clone())).await.unwrap();

        let found = db
            .execute(Select(By::<Option<Brokerage>, _>::new(b.id)))
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(db.reads(), 1);

        db.fail_on("delete Brokerage");
        assert!(db
            .execute(Delete(By::<Brokerage, _>::new(b.id)))
            .await
            .is_err());
    }

    #[test]
    fn computes_levenshtein_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("main st", "main st"), 0);
    }
}
