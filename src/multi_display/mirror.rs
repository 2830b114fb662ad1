use crate::core::scene::{NodeId, RenderTextureDescriptor, SceneGraph, TextureFormat, TextureId};
use log::{debug, info};

/// Captures a camera into a screen-sized render texture so other displays can
/// mirror the main view.
#[derive(Debug)]
pub struct MultiDisplayRenderTexture {
    camera: NodeId,
    texture: Option<TextureId>,
}

impl MultiDisplayRenderTexture {
    pub const fn new(camera: NodeId) -> Self {
        Self {
            camera,
            texture: None,
        }
    }

    /// Create the target texture and route the camera into it. Enabling at a
    /// new size replaces the previous texture; the same size keeps it.
    pub fn enable(&mut self, scene: &mut SceneGraph, width: u32, height: u32) -> TextureId {
        let descriptor = RenderTextureDescriptor {
            width,
            height,
            format: TextureFormat::ArgbHalf,
            mip_count: 0,
        };
        if let Some(current) = self.texture
            && scene
                .texture(current)
                .is_some_and(|t| !t.released && t.descriptor == descriptor)
        {
            return current;
        }
        self.disable(scene);
        let texture = scene.create_render_texture(descriptor);
        if let Some(camera) = scene.camera_mut(self.camera) {
            camera.target_texture = Some(texture);
        }
        info!("Multi-display render texture {width}x{height} created");
        self.texture = Some(texture);
        texture
    }

    pub fn disable(&mut self, scene: &mut SceneGraph) {
        let Some(texture) = self.texture.take() else {
            return;
        };
        scene.release_texture(texture);
        if let Some(camera) = scene.camera_mut(self.camera)
            && camera.target_texture == Some(texture)
        {
            camera.target_texture = None;
        }
        debug!("Multi-display render texture released");
    }
}

#[cfg(test)]
mod tests {
    use super::MultiDisplayRenderTexture;
    use crate::core::scene::{Camera, Component, SceneGraph, TextureFormat};

    fn scene_with_camera() -> (SceneGraph, crate::core::scene::NodeId) {
        let mut scene = SceneGraph::new();
        let camera = scene.spawn("Render Camera", None);
        scene.add_component(camera, Component::Camera(Camera::default()));
        (scene, camera)
    }

    #[test]
    fn enable_creates_half_float_target_without_mips() {
        let (mut scene, camera) = scene_with_camera();
        let mut capture = MultiDisplayRenderTexture::new(camera);
        let texture = capture.enable(&mut scene, 1920, 1080);

        let desc = scene.texture(texture).expect("texture exists").descriptor;
        assert_eq!((desc.width, desc.height), (1920, 1080));
        assert_eq!(desc.format, TextureFormat::ArgbHalf);
        assert_eq!(desc.mip_count, 0);
        assert_eq!(
            scene.camera(camera).and_then(|c| c.target_texture),
            Some(texture)
        );
    }

    #[test]
    fn disable_releases_and_is_idempotent() {
        let (mut scene, camera) = scene_with_camera();
        let mut capture = MultiDisplayRenderTexture::new(camera);
        let texture = capture.enable(&mut scene, 800, 600);

        capture.disable(&mut scene);
        capture.disable(&mut scene);
        assert!(scene.texture(texture).is_some_and(|t| t.released));
        assert_eq!(capture.texture, None);
        assert_eq!(scene.camera(camera).and_then(|c| c.target_texture), None);
    }

    #[test]
    fn re_enable_at_new_size_replaces_texture() {
        let (mut scene, camera) = scene_with_camera();
        let mut capture = MultiDisplayRenderTexture::new(camera);
        capture.enable(&mut scene, 800, 600);
        let texture = capture.enable(&mut scene, 1024, 768);

        let desc = scene.texture(texture).expect("texture exists").descriptor;
        assert_eq!((desc.width, desc.height), (1024, 768));
        assert!(scene.texture(texture).is_some_and(|t| !t.released));
        assert_eq!(
            scene.camera(camera).and_then(|c| c.target_texture),
            Some(texture)
        );
    }

    #[test]
    fn repeated_resizes_keep_one_texture() {
        let (mut scene, camera) = scene_with_camera();
        let mut capture = MultiDisplayRenderTexture::new(camera);
        let first = capture.enable(&mut scene, 1280, 720);

        for step in 0..500 {
            let texture = capture.enable(&mut scene, 1280 + step % 7, 720);
            assert_eq!(texture, first, "resize {step} should reuse the texture slot");
        }
        assert_eq!(capture.enable(&mut scene, 1280 + 499 % 7, 720), first);
        assert!(scene.texture(first).is_some_and(|t| !t.released));
    }
}
