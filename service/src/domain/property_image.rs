//! [`PropertyImage`] definitions.

use common::{unit, DateTimeOf};
use serde::Serialize;

use super::{
    define_id,
    property::{self, Dimensions, ImageRef},
    Entity,
};

define_id!("PropertyImage");

/// Image in the gallery of a [`Property`].
///
/// At most one [`PropertyImage`] of a [`Property`] is primary.
///
/// [`Property`]: super::Property
#[derive(Clone, Debug, Serialize)]
pub struct PropertyImage {
    /// ID of this [`PropertyImage`].
    pub id: Id,

    /// ID of the pictured [`Property`].
    ///
    /// [`Property`]: super::Property
    pub property_id: property::Id,

    /// Stored image file.
    pub image: ImageRef,

    /// [`Dimensions`] of the stored image.
    #[serde(flatten)]
    pub dimensions: Dimensions,

    /// Indicator whether this [`PropertyImage`] is the primary one of its
    /// [`Property`].
    ///
    /// [`Property`]: super::Property
    pub is_primary: bool,

    /// [`DateTime`] when this [`PropertyImage`] was uploaded.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Entity for PropertyImage {
    type Id = Id;

    const NAME: &'static str = "PropertyImage";

    fn id(&self) -> Id {
        self.id
    }

    fn retain_immutable(&mut self, existing: &Self) {
        self.property_id = existing.property_id;
        self.image = existing.image.clone();
        self.dimensions = existing.dimensions;
        self.created_at = existing.created_at;
    }
}

/// Orders the provided `images` for display: the primary one first, then
/// the oldest ones first.
pub fn sort(images: &mut [PropertyImage]) {
    images.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

/// [`DateTime`] when a [`PropertyImage`] was uploaded.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(PropertyImage, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTimeOf;

    use super::{sort, Id, PropertyImage};
    use crate::domain::property::{self, Dimensions, ImageRef};

    fn image(is_primary: bool) -> PropertyImage {
        PropertyImage {
            id: Id::new(),
            property_id: property::Id::new(),
            image: ImageRef::new(format!("{}.png", Id::new())),
            dimensions: Dimensions {
                width: 1,
                height: 1,
            },
            is_primary,
            created_at: DateTimeOf::now(),
        }
    }

    #[test]
    fn sorts_primary_first() {
        let first = image(false);
        let primary = image(true);
        let mut images = vec![first.clone(), primary.clone()];

        sort(&mut images);

        assert_eq!(images[0].id, primary.id);
        assert_eq!(images[1].id, first.id);
    }
}
