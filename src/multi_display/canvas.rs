use crate::core::scene::{ComponentKind, NodeId, RenderMode, SceneGraph, TextureId};
use log::trace;

/// Switch a canvas to world-space rendering. Returns false if `node` has no
/// canvas.
pub fn convert_to_world_space(scene: &mut SceneGraph, node: NodeId) -> bool {
    match scene.canvas_mut(node) {
        Some(canvas) => {
            canvas.render_mode = RenderMode::WorldSpace;
            true
        }
        None => false,
    }
}

/// Point every canvas under `root` (inactive ones included) at `camera`.
/// Returns how many canvases were bound.
pub fn render_canvases_to(scene: &mut SceneGraph, root: NodeId, camera: NodeId) -> usize {
    let canvases = scene.find_all_in_children(root, ComponentKind::Canvas);
    for node in &canvases {
        if let Some(canvas) = scene.canvas_mut(*node) {
            canvas.world_camera = Some(camera);
        }
    }
    canvases.len()
}

/// Run the one-shot setup freshly instantiated UI needs: world-space
/// conversion for flagged canvases and the mirror texture for mirror images.
pub fn run_start_hooks(scene: &mut SceneGraph, root: NodeId, mirror: Option<TextureId>) {
    for node in scene.find_all_in_children(root, ComponentKind::Canvas) {
        let flagged = scene.canvas(node).is_some_and(|c| c.world_space_on_start);
        if flagged {
            convert_to_world_space(scene, node);
        }
    }
    bind_mirror_images(scene, root, mirror);
    trace!("Ran start hooks under {root:?}");
}

/// Give every mirror image under `root` the shared capture texture. Returns
/// how many images were updated.
pub fn bind_mirror_images(scene: &mut SceneGraph, root: NodeId, mirror: Option<TextureId>) -> usize {
    let mut bound = 0;
    for node in scene.find_all_in_children(root, ComponentKind::RawImage) {
        if let Some(image) = scene.raw_image_mut(node)
            && image.mirror
        {
            image.texture = mirror;
            bound += 1;
        }
    }
    bound
}

#[cfg(test)]
mod tests {
    use super::{convert_to_world_space, render_canvases_to, run_start_hooks};
    use crate::assets::{MULTI_DISPLAY_CANVAS, TRACK_VIEW_CANVAS, load_template};
    use crate::core::scene::{
        ComponentKind, RenderMode, RenderTextureDescriptor, SceneGraph, TextureFormat,
    };

    #[test]
    fn world_space_conversion_needs_a_canvas() {
        let mut scene = SceneGraph::new();
        let bare = scene.spawn("Bare", None);
        assert!(!convert_to_world_space(&mut scene, bare));

        let track = load_template(TRACK_VIEW_CANVAS).expect("template");
        let root = scene.instantiate(&track, None);
        assert!(convert_to_world_space(&mut scene, root));
        assert_eq!(
            scene.canvas(root).map(|c| c.render_mode),
            Some(RenderMode::WorldSpace)
        );
    }

    #[test]
    fn render_canvases_binds_inactive_canvases_too() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn("Persistent", None);
        let canvas = load_template(MULTI_DISPLAY_CANVAS).expect("template");
        let a = scene.instantiate(&canvas, Some(root));
        let b = scene.instantiate(&canvas, Some(root));
        scene.set_active(b, false);
        let camera = scene.spawn("Render Camera", None);

        assert_eq!(render_canvases_to(&mut scene, root, camera), 2);
        assert_eq!(scene.canvas(a).and_then(|c| c.world_camera), Some(camera));
        assert_eq!(scene.canvas(b).and_then(|c| c.world_camera), Some(camera));
    }

    #[test]
    fn start_hooks_convert_flagged_canvases_and_fill_mirrors() {
        let mut scene = SceneGraph::new();
        let texture = scene.create_render_texture(RenderTextureDescriptor {
            width: 64,
            height: 64,
            format: TextureFormat::ArgbHalf,
            mip_count: 0,
        });

        let overlay = scene.instantiate(&load_template(MULTI_DISPLAY_CANVAS).expect("t"), None);
        run_start_hooks(&mut scene, overlay, Some(texture));
        assert_eq!(
            scene.canvas(overlay).map(|c| c.render_mode),
            Some(RenderMode::ScreenSpaceCamera),
            "unflagged canvases keep their mode"
        );
        let mirror = scene
            .find_in_children(overlay, ComponentKind::RawImage)
            .expect("mirror image");
        assert_eq!(scene.raw_image(mirror).and_then(|i| i.texture), Some(texture));

        let track = scene.instantiate(&load_template(TRACK_VIEW_CANVAS).expect("t"), None);
        run_start_hooks(&mut scene, track, None);
        assert_eq!(
            scene.canvas(track).map(|c| c.render_mode),
            Some(RenderMode::WorldSpace)
        );
    }
}
