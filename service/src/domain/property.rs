//! [`Property`] definitions.

use std::{fmt, str::FromStr};

use common::{define_kind, define_text, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::Rng as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{define_id, person::Address, Entity, Invalid};

define_id!("Property");

/// Tax ID of a [`Property`]: `TAX` followed by 6 digits.
#[derive(
    AsRef, Clone, Debug, Display, Eq, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TaxId(String);

impl TaxId {
    /// Prefix of every [`TaxId`].
    const PREFIX: &'static str = "TAX";

    /// Generates a new random [`TaxId`].
    ///
    /// Uniqueness is not guaranteed and must be checked against the stored
    /// [`Property`]s.
    #[must_use]
    pub fn generate() -> Self {
        let n: u32 = rand::rng().random_range(0..1_000_000);
        Self(format!("{}{n:06}", Self::PREFIX))
    }

    /// Parses a [`TaxId`] out of the provided `input`, if it's valid.
    #[must_use]
    pub fn new(input: impl AsRef<str>) -> Option<Self> {
        let input = input.as_ref().trim().to_ascii_uppercase();
        let digits = input.strip_prefix(Self::PREFIX)?;
        (digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()))
            .then_some(Self(input))
    }
}

impl FromStr for TaxId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `TaxId`: expected `TAX` and 6 digits")
    }
}

define_kind! {
    #[doc = "Market status of a [`Property`]."]
    enum Status {
        #[doc = "Offered for sale."]
        ForSale = 1,

        #[doc = "Offered for lease."]
        ForLease = 2,

        #[doc = "Sold. Terminal."]
        Sold = 3,

        #[doc = "Leased. Terminal."]
        Leased = 4,
    }
}

impl Status {
    /// Checks whether this [`Status`] is terminal, so cannot be changed
    /// anymore.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sold | Self::Leased)
    }

    /// Returns the [`Status`] after changing this one to the `next` one.
    ///
    /// # Errors
    ///
    /// If this [`Status`] is terminal and differs from the `next` one.
    pub fn transition(self, next: Self) -> Result<Self, Invalid> {
        if self.is_terminal() && self != next {
            return Err(Invalid("terminal `Property` status cannot change"));
        }
        Ok(next)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ForSale
    }
}

define_kind! {
    #[doc = "Kind of a [`Property`], discriminating its [`Detail`]."]
    enum Kind {
        #[doc = "Property to live in."]
        Residential = 1,

        #[doc = "Property to run a business in."]
        Commercial = 2,
    }
}

define_text! {
    #[doc = "Short classification label (building type, zoning code)."]
    struct Label(max = 50);
}

define_text! {
    #[doc = "Industry a commercial [`Property`] is intended for."]
    struct Industry(max = 255);
}

/// Defines a non-negative [`Decimal`] newtype with bounded precision.
macro_rules! define_decimal {
    (
        $(#[doc = $doc:literal])*
        struct $name:ident(scale = $scale:literal, max = $max:literal);
    ) => {
        $(#[doc = $doc])*
        #[derive(
            Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq,
            PartialOrd, Serialize,
        )]
        #[cfg_attr(
            feature = "postgres",
            derive(FromSql, ToSql),
            postgres(transparent)
        )]
        #[serde(into = "Decimal", try_from = "Decimal")]
        pub struct $name(Decimal);

        impl $name {
            /// Creates a new value if the provided `value` is non-negative
            /// and fits the precision.
            #[must_use]
            pub fn new(value: Decimal) -> Option<Self> {
                let value = value.normalize();
                let max = Decimal::from_str_exact($max).ok()?;
                (!value.is_sign_negative()
                    && value.scale() <= $scale
                    && value <= max)
                    .then_some(Self(value))
            }

            /// Returns the inner [`Decimal`] value.
            #[must_use]
            pub fn value(self) -> Decimal {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut value = self.0;
                value.rescale($scale);
                write!(f, "{value}")
            }
        }

        impl TryFrom<Decimal> for $name {
            type Error = &'static str;

            fn try_from(value: Decimal) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(concat!(
                    "invalid `",
                    stringify!($name),
                    "`: must be non-negative, at most ",
                    $max,
                    " with ",
                    $scale,
                    " fractional digit(s)",
                ))
            }
        }

        impl From<$name> for Decimal {
            fn from(v: $name) -> Self {
                v.0
            }
        }
    };
}

define_decimal! {
    /// Area in square feet.
    struct Area(scale = 2, max = "99999999.99");
}

define_decimal! {
    /// Number of bathrooms, halves included (`2.5`).
    struct Bathrooms(scale = 1, max = "99.9");
}

/// Details of a [`Kind::Residential`] [`Property`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Residential {
    /// Number of bedrooms.
    pub bedrooms: u16,

    /// Number of [`Bathrooms`].
    pub bathrooms: Bathrooms,

    /// Building type (`"Single Family"`, `"Condo"`, etc).
    #[serde(default, rename = "type")]
    pub kind: Option<Label>,

    /// Living [`Area`].
    #[serde(default)]
    pub square_feet: Option<Area>,

    /// Number of garage spaces.
    #[serde(default)]
    pub garage_spaces: u16,

    /// Indicator whether there is a basement.
    #[serde(default)]
    pub has_basement: bool,

    /// Indicator whether there is a pool.
    #[serde(default)]
    pub has_pool: bool,
}

/// Details of a [`Kind::Commercial`] [`Property`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Commercial {
    /// Usable [`Area`].
    pub square_feet: Area,

    /// [`Industry`] the premises are intended for.
    #[serde(default)]
    pub industry: Option<Industry>,

    /// Building type (`"Office"`, `"Retail"`, etc).
    #[serde(default, rename = "type")]
    pub kind: Option<Label>,

    /// Number of units.
    #[serde(default = "Commercial::default_units")]
    pub units: u16,

    /// Number of parking spaces.
    #[serde(default)]
    pub parking_spaces: u16,

    /// Zoning type of the premises.
    #[serde(default)]
    pub zoning_type: Option<Label>,
}

impl Commercial {
    /// Default number of [`Commercial::units`].
    fn default_units() -> u16 {
        1
    }
}

/// Kind-specific details of a [`Property`].
///
/// Exactly one is always present, so the [`Kind`] discriminator is derived
/// from it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(
    tag = "property_type",
    content = "detail",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Detail {
    /// [`Residential`] details.
    Residential(Residential),

    /// [`Commercial`] details.
    Commercial(Commercial),
}

impl Detail {
    /// Returns the [`Kind`] of these [`Detail`]s.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Residential(_) => Kind::Residential,
            Self::Commercial(_) => Kind::Commercial,
        }
    }
}

/// Reference to a stored image of a [`Property`].
#[derive(
    AsRef, Clone, Debug, Display, Eq, Hash, Into, PartialEq, Serialize,
)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ImageRef(String);

impl ImageRef {
    /// Public URL path stored images are served under.
    pub const URL_PATH: &'static str = "/static/property_images";

    /// Creates a new [`ImageRef`] out of the stored file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self(file_name.into())
    }

    /// Directory thumbnails are stored in, relative to the images directory.
    pub const THUMBNAILS_DIR: &'static str = "thumbnails";

    /// Returns the public URL of the referenced image.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}", Self::URL_PATH, self.0)
    }

    /// Returns the path of the thumbnail of the referenced image, relative
    /// to the images directory.
    ///
    /// Thumbnails are always PNG encoded.
    #[must_use]
    pub fn thumbnail(&self) -> String {
        let stem = self.0.rsplit_once('.').map_or(self.0.as_str(), |(s, _)| s);
        format!("{}/{stem}.png", Self::THUMBNAILS_DIR)
    }

    /// Returns the public URL of the thumbnail of the referenced image.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        format!("{}/{}", Self::URL_PATH, self.thumbnail())
    }
}

/// Pixel dimensions of a stored image.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

/// Uploaded image of a [`Property`], not stored yet.
#[derive(Clone)]
pub struct Image {
    /// Original file name of this [`Image`].
    pub file_name: String,

    /// Contents of this [`Image`].
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl Image {
    /// Returns the lowercased extension of this [`Image`] file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }
}

/// Listed real estate.
#[derive(Clone, Debug, Serialize)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// Unique [`TaxId`] of this [`Property`].
    pub tax_id: TaxId,

    /// [`Address`] of this [`Property`].
    pub address: Address,

    /// Market [`Status`] of this [`Property`].
    pub status: Status,

    /// Price of this [`Property`].
    pub price: Money,

    /// Lot size of this [`Property`].
    pub lot_size: Option<Area>,

    /// Year this [`Property`] was built.
    pub year_built: Option<u16>,

    /// Zoning code of this [`Property`].
    pub zoning: Option<Label>,

    /// Annual tax of this [`Property`].
    pub property_tax: Option<Money>,

    /// Stored image of this [`Property`].
    pub image: Option<ImageRef>,

    /// Kind-specific [`Detail`]s of this [`Property`].
    #[serde(flatten)]
    pub detail: Detail,

    /// [`DateTime`] when this [`Property`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was modified last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Earliest accepted [`Property::year_built`].
    const MIN_YEAR_BUILT: u16 = 1600;

    /// Returns the [`Kind`] of this [`Property`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.detail.kind()
    }
}

impl Entity for Property {
    type Id = Id;

    const NAME: &'static str = "Property";

    fn id(&self) -> Id {
        self.id
    }

    fn validate(&self) -> Result<(), Invalid> {
        if let Some(year) = self.year_built {
            let latest = Date::today().year() + 5;
            if year < Self::MIN_YEAR_BUILT || i32::from(year) > latest {
                return Err(Invalid("`year_built` is out of range"));
            }
        }
        Ok(())
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.tax_id = existing.tax_id.clone();
        self.created_at = existing.created_at;
    }
}

/// Editable fields of a [`Property`], as provided by a caller.
#[derive(Clone, Debug, Deserialize)]
pub struct Draft {
    /// [`Address`] of the [`Property`].
    pub address: Address,

    /// Market [`Status`] of the [`Property`].
    #[serde(default)]
    pub status: Status,

    /// Price of the [`Property`].
    pub price: Money,

    /// Lot size of the [`Property`].
    #[serde(default)]
    pub lot_size: Option<Area>,

    /// Year the [`Property`] was built.
    #[serde(default)]
    pub year_built: Option<u16>,

    /// Zoning code of the [`Property`].
    #[serde(default)]
    pub zoning: Option<Label>,

    /// Annual tax of the [`Property`].
    #[serde(default)]
    pub property_tax: Option<Money>,

    /// Kind-specific [`Detail`]s of the [`Property`].
    #[serde(flatten)]
    pub detail: Detail,
}

impl Property {
    /// Creates a new [`Property`] out of the provided [`Draft`].
    #[must_use]
    pub fn new(draft: Draft, tax_id: TaxId, image: Option<ImageRef>) -> Self {
        let Draft {
            address,
            status,
            price,
            lot_size,
            year_built,
            zoning,
            property_tax,
            detail,
        } = draft;
        let now = common::DateTime::now();
        Self {
            id: Id::new(),
            tax_id,
            address,
            status,
            price,
            lot_size,
            year_built,
            zoning,
            property_tax,
            image,
            detail,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }
}

/// [`DateTime`] when a [`Property`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was modified.
///
/// [`DateTime`]: common::DateTime
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{
        Area, Bathrooms, Detail, Draft, Id, Image, ImageRef, Kind, Property,
        Residential, Status, TaxId,
    };
    use crate::domain::{person::Address, Entity as _};

    fn residential() -> Property {
        Property {
            id: Id::new(),
            tax_id: TaxId::generate(),
            address: Address::new("1 Main St").unwrap(),
            status: Status::default(),
            price: "450000".parse().unwrap(),
            lot_size: None,
            year_built: Some(1999),
            zoning: None,
            property_tax: None,
            image: None,
            detail: Detail::Residential(Residential {
                bedrooms: 3,
                bathrooms: Bathrooms::new(Decimal::new(20, 1)).unwrap(),
                kind: None,
                square_feet: None,
                garage_spaces: 0,
                has_basement: false,
                has_pool: false,
            }),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn generates_tax_ids() {
        for _ in 0..100 {
            let id = TaxId::generate();
            assert_eq!(id.as_ref().len(), 9);
            assert_eq!(TaxId::new(id.as_ref()), Some(id));
        }
    }

    #[test]
    fn parses_tax_ids() {
        assert_eq!(TaxId::new("tax012345").unwrap().as_ref(), "TAX012345");
        assert!(TaxId::new("TAX12345").is_none());
        assert!(TaxId::new("TAX1234567").is_none());
        assert!(TaxId::new("XYZ123456").is_none());
        assert!(TaxId::new("TAX12345a").is_none());
    }

    #[test]
    fn terminal_statuses_are_sticky() {
        assert_eq!(Status::default(), Status::ForSale);
        assert_eq!(Status::ForSale.transition(Status::Sold), Ok(Status::Sold));
        assert_eq!(
            Status::ForLease.transition(Status::ForSale),
            Ok(Status::ForSale),
        );
        assert_eq!(Status::Sold.transition(Status::Sold), Ok(Status::Sold));
        assert!(Status::Sold.transition(Status::ForSale).is_err());
        assert!(Status::Leased.transition(Status::Sold).is_err());
    }

    #[test]
    fn validates_decimal_precision() {
        assert!(Bathrooms::new(Decimal::new(25, 1)).is_some());
        assert!(Bathrooms::new(Decimal::new(225, 2)).is_none());
        assert!(Bathrooms::new(Decimal::new(-1, 0)).is_none());
        assert_eq!(Bathrooms::new(Decimal::new(2, 0)).unwrap().to_string(), "2.0");

        assert!(Area::new(Decimal::new(123_456, 2)).is_some());
        assert!(Area::new(Decimal::new(1_000_000_000, 1)).is_none());
    }

    #[test]
    fn serializes_detail_with_discriminator() {
        let property = residential();
        let json = serde_json::to_value(&property).unwrap();

        assert_eq!(json["property_type"], "RESIDENTIAL");
        assert_eq!(json["status"], "FOR_SALE");
        assert_eq!(json["detail"]["bedrooms"], 3);
        assert_eq!(json["detail"]["bathrooms"], "2");
        assert_eq!(property.kind(), Kind::Residential);
        assert_eq!(property.price, "450000.00".parse::<Money>().unwrap());
    }

    #[test]
    fn deserializes_detail_by_discriminator() {
        let detail: Detail = serde_json::from_value(json!({
            "property_type": "COMMERCIAL",
            "detail": {"square_feet": "1200.50", "industry": "Retail"},
        }))
        .unwrap();
        let Detail::Commercial(c) = detail else {
            panic!("expected commercial detail");
        };
        assert_eq!(c.units, 1);
        assert_eq!(c.parking_spaces, 0);

        assert!(serde_json::from_value::<Detail>(json!({
            "property_type": "INDUSTRIAL",
            "detail": {},
        }))
        .is_err());
    }

    #[test]
    fn validates_year_built() {
        let mut property = residential();
        assert!(property.validate().is_ok());

        property.year_built = Some(1200);
        assert!(property.validate().is_err());

        property.year_built = Some(3000);
        assert!(property.validate().is_err());
    }

    #[test]
    fn extracts_image_extensions() {
        let image = |name: &str| Image {
            file_name: name.into(),
            bytes: vec![],
        };

        assert_eq!(image("house.JPG").extension().as_deref(), Some("jpg"));
        assert_eq!(image("a.b.webp").extension().as_deref(), Some("webp"));
        assert_eq!(image("noext").extension(), None);
        assert_eq!(image(".png").extension(), None);
    }

    #[test]
    fn places_thumbnails_next_to_images() {
        let image = ImageRef::new("abc.jpeg");
        assert_eq!(image.thumbnail(), "thumbnails/abc.png");
        assert_eq!(
            image.thumbnail_url(),
            "/static/property_images/thumbnails/abc.png",
        );
    }

    #[test]
    fn deserializes_drafts() {
        let draft: Draft = serde_json::from_value(json!({
            "address": "1 Main St",
            "price": 450000,
            "property_type": "RESIDENTIAL",
            "detail": {"bedrooms": 3, "bathrooms": 2},
        }))
        .unwrap();
        assert_eq!(draft.status, Status::ForSale);

        let property = Property::new(draft, TaxId::generate(), None);
        assert_eq!(property.kind(), Kind::Residential);
        assert_eq!(property.created_at.coerce::<()>(), property.updated_at.coerce());

        assert!(serde_json::from_value::<Draft>(json!({
            "address": "1 Main St",
            "price": 450000,
            "property_type": "CASTLE",
            "detail": {},
        }))
        .is_err());
    }
}
