//! Filesystem storage of uploaded [`property::Image`]s and their thumbnails.

use std::{
    io::{self, Cursor},
    path::PathBuf,
};

use common::{
    operations::{Delete, Store},
    Handler,
};
use derive_more::{Display, Error as StdError, From};
use image::{GenericImageView as _, ImageOutputFormat};
use tokio::task::JoinError;
use tracerr::Traced;
use uuid::Uuid;

use crate::domain::property;

/// Filesystem storage of [`property::Image`]s.
#[derive(Clone, Debug)]
pub struct Images {
    /// Directory the images are stored in.
    dir: PathBuf,

    /// Maximum size of a stored image in bytes.
    max_size: usize,
}

impl Images {
    /// Extensions of the accepted [`property::Image`]s.
    pub const ALLOWED_EXTENSIONS: &'static [&'static str] =
        &["jpg", "jpeg", "png", "webp"];

    /// Default maximum size of a stored image (5 MiB).
    pub const DEFAULT_MAX_SIZE: usize = 5 * 1024 * 1024;

    /// Bounding box of the generated thumbnails, in pixels.
    pub const THUMBNAIL_SIZE: u32 = 300;

    /// Creates new [`Images`] storing files in the provided `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    /// Returns the directory the images are stored in.
    #[must_use]
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Returns the maximum size of a stored image in bytes.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Decodes the provided `bytes` and encodes a PNG thumbnail of them, fitting
/// into [`Images::THUMBNAIL_SIZE`] with the aspect ratio preserved.
///
/// Images already fitting are never upscaled.
fn thumbnail(
    bytes: &[u8],
) -> Result<(property::Dimensions, Vec<u8>), image::ImageError> {
    const SIZE: u32 = Images::THUMBNAIL_SIZE;

    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let thumb = if width > SIZE || height > SIZE {
        decoded.thumbnail(SIZE, SIZE)
    } else {
        decoded
    };
    let mut png = Cursor::new(vec![]);
    thumb.write_to(&mut png, ImageOutputFormat::Png)?;

    Ok((property::Dimensions { width, height }, png.into_inner()))
}

/// Removes the file at the provided `path`, if it exists.
async fn remove(path: PathBuf) -> Result<(), Traced<Error>> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            Err(tracerr::new!(Error::Io(e)))
        }
        Ok(()) | Err(_) => Ok(()),
    }
}

impl Handler<Store<property::Image>> for Images {
    type Ok = (property::ImageRef, property::Dimensions);
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Store(image): Store<property::Image>,
    ) -> Result<Self::Ok, Self::Err> {
        let ext = image
            .extension()
            .filter(|ext| Self::ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                tracerr::new!(Error::UnsupportedFormat(image.file_name.clone()))
            })?;
        if image.bytes.len() > self.max_size {
            return Err(tracerr::new!(Error::TooLarge {
                size: image.bytes.len(),
                max: self.max_size,
            }));
        }

        let property::Image { bytes, .. } = image;
        let (bytes, (dimensions, thumb)) =
            tokio::task::spawn_blocking(move || {
                thumbnail(&bytes).map(|t| (bytes, t))
            })
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let stored =
            property::ImageRef::new(format!("{}.{ext}", Uuid::new_v4()));
        tokio::fs::create_dir_all(
            self.dir.join(property::ImageRef::THUMBNAILS_DIR),
        )
        .await
        .map_err(tracerr::from_and_wrap!(=> Error))?;

        let path = self.dir.join(stored.as_ref());
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        if let Err(e) =
            tokio::fs::write(self.dir.join(stored.thumbnail()), &thumb).await
        {
            remove(path).await?;
            return Err(tracerr::new!(Error::Io(e)));
        }

        Ok((stored, dimensions))
    }
}

impl Handler<Delete<property::ImageRef>> for Images {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(image): Delete<property::ImageRef>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = image.as_ref();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.')
        {
            return Err(tracerr::new!(Error::InvalidRef(image)));
        }

        remove(self.dir.join(image.thumbnail())).await?;
        remove(self.dir.join(name)).await
    }
}

/// [`Images`] storage error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// I/O error.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),

    /// Blocking decoding task failed to complete.
    #[display("Image decoding task failed: {_0}")]
    Blocking(JoinError),

    /// Contents are not a decodable image.
    #[display("Image cannot be decoded: {_0}")]
    Undecodable(image::ImageError),

    /// [`property::ImageRef`] points outside of the storage.
    #[display("Invalid image reference: `{_0}`")]
    #[from(ignore)]
    InvalidRef(#[error(not(source))] property::ImageRef),

    /// Image exceeds the maximum size.
    #[display("Image of {size} bytes exceeds the limit of {max} bytes")]
    #[from(ignore)]
    TooLarge {
        /// Size of the image.
        size: usize,

        /// Maximum allowed size.
        max: usize,
    },

    /// Image file format is not accepted.
    #[display("Unsupported image format: `{_0}`")]
    #[from(ignore)]
    UnsupportedFormat(#[error(not(source))] String),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{Delete, Store},
        Handler as _,
    };
    use image::GenericImageView as _;

    use super::{Error, Images};
    use crate::{domain::property, fixture};

    fn images() -> Images {
        Images::new(
            std::env::temp_dir().join(format!("images-{}", uuid::Uuid::new_v4())),
            1024,
        )
    }

    fn image(name: &str, bytes: Vec<u8>) -> property::Image {
        property::Image {
            file_name: name.into(),
            bytes,
        }
    }

    #[tokio::test]
    async fn stores_and_deletes_images() {
        let images = images();
        let png = fixture::png(600, 400);

        let (stored, dimensions) = images
            .execute(Store(image("house.PNG", png.clone())))
            .await
            .unwrap();
        assert!(stored.as_ref().ends_with(".png"));
        assert_eq!(
            dimensions,
            property::Dimensions {
                width: 600,
                height: 400,
            },
        );

        let path = images.dir().join(stored.as_ref());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), png);

        let thumb = images.dir().join(stored.thumbnail());
        let decoded =
            image::load_from_memory(&tokio::fs::read(&thumb).await.unwrap())
                .unwrap();
        assert_eq!(decoded.dimensions(), (300, 200));

        images.execute(Delete(stored.clone())).await.unwrap();
        assert!(!path.exists());
        assert!(!thumb.exists());

        // Deleting twice is fine.
        images.execute(Delete(stored)).await.unwrap();
    }

    #[tokio::test]
    async fn keeps_small_images_unscaled_in_thumbnails() {
        let images = images();

        let (stored, _) = images
            .execute(Store(image("icon.png", fixture::png(8, 4))))
            .await
            .unwrap();

        let thumb = tokio::fs::read(images.dir().join(stored.thumbnail()))
            .await
            .unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }

    #[tokio::test]
    async fn rejects_undecodable_images() {
        let images = images();

        let err = images
            .execute(Store(image("house.png", vec![7; 64])))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), Error::Undecodable(_)));
        assert!(!images.dir().exists());
    }

    #[tokio::test]
    async fn rejects_unsupported_formats() {
        let err = images()
            .execute(Store(image("house.gif", fixture::png(2, 2))))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), Error::UnsupportedFormat(_)));

        let err = images()
            .execute(Store(image("house", fixture::png(2, 2))))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn rejects_too_large_images() {
        let err = images()
            .execute(Store(image("house.jpg", vec![7; 1025])))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            Error::TooLarge {
                size: 1025,
                max: 1024,
            },
        ));
    }

    #[tokio::test]
    async fn refuses_to_delete_outside_of_storage() {
        let err = images()
            .execute(Delete(property::ImageRef::new("../secret.png")))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), Error::InvalidRef(_)));
    }
}
