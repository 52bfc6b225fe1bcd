use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use image::RgbaImage;

/// Mirrors a pixel surface into a GPU texture, uploading only when it changed
#[derive(Default)]
pub struct SurfaceTexture {
    handle: Option<TextureHandle>,
    /// Revision of the surface the texture was last uploaded from
    revision: Option<u64>,
    uploads: u64,
}

impl std::fmt::Debug for SurfaceTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTexture")
            .field("revision", &self.revision)
            .field("uploads", &self.uploads)
            .finish()
    }
}

impl SurfaceTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the texture for `pixels`, re-uploading if `revision` is new
    pub fn update(&mut self, ctx: &Context, pixels: &RgbaImage, revision: u64) -> TextureId {
        let fresh = || {
            let size = [pixels.width() as usize, pixels.height() as usize];
            ColorImage::from_rgba_unmultiplied(size, pixels.as_raw())
        };

        let handle = match self.handle.take() {
            Some(mut handle) => {
                if self.revision != Some(revision) {
                    handle.set(fresh(), TextureOptions::LINEAR);
                    self.uploads += 1;
                }
                handle
            }
            None => {
                self.uploads += 1;
                ctx.load_texture("signature_surface", fresh(), TextureOptions::LINEAR)
            }
        };
        self.revision = Some(revision);

        let id = handle.id();
        self.handle = Some(handle);
        id
    }

    /// Number of uploads performed so far
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_revision_is_cached() {
        let ctx = Context::default();
        let mut texture = SurfaceTexture::new();
        let pixels = RgbaImage::new(4, 4);

        let first = texture.update(&ctx, &pixels, 1);
        let second = texture.update(&ctx, &pixels, 1);
        assert_eq!(first, second);
        assert_eq!(texture.uploads(), 1);
    }

    #[test]
    fn test_new_revision_reuploads() {
        let ctx = Context::default();
        let mut texture = SurfaceTexture::new();
        let pixels = RgbaImage::new(4, 4);

        let first = texture.update(&ctx, &pixels, 1);
        let second = texture.update(&ctx, &pixels, 2);
        assert_eq!(first, second);
        assert_eq!(texture.uploads(), 2);
    }
}
