use crate::core::scene::{Camera, Component, NodeId, SceneGraph, Template};
use crate::multi_display::canvas;

/// Scene objects the display manager hangs per-display copies off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAnchors {
    /// Top-level root; per-display UI roots are parented here.
    pub scene_root: NodeId,
    /// Manager node; per-display track views are parented here.
    pub manager: NodeId,
    /// Primary track view canvas, the fallback for unknown displays.
    pub default_track_view: NodeId,
    pub main_camera: NodeId,
    pub vocal_track: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub anchors: DisplayAnchors,
    /// Camera captured into the multi-display render texture.
    pub render_camera: NodeId,
}

/// Build the persistent scene the primary display uses: main and render
/// cameras, the default track view under the manager node and the vocal track.
pub fn build(scene: &mut SceneGraph, track_view_canvas: &Template) -> Stage {
    let scene_root = scene.spawn("Persistent", None);

    let main_camera = scene.spawn("Main Camera", Some(scene_root));
    scene.add_component(main_camera, Component::Camera(Camera::default()));

    let render_camera = scene.spawn("Render Camera", Some(scene_root));
    scene.add_component(render_camera, Component::Camera(Camera::default()));

    let manager = scene.spawn("MultiDisplayManager", Some(scene_root));
    let default_track_view = scene.instantiate(track_view_canvas, Some(manager));
    canvas::run_start_hooks(scene, default_track_view, None);
    canvas::render_canvases_to(scene, default_track_view, render_camera);

    let vocals = scene.spawn("Vocals", Some(scene_root));
    let vocal_track = scene.spawn("VocalTrack", Some(vocals));
    scene.add_component(vocal_track, Component::VocalTrack);
    scene.spawn("VocalHighway", Some(vocal_track));

    Stage {
        anchors: DisplayAnchors {
            scene_root,
            manager,
            default_track_view,
            main_camera,
            vocal_track,
        },
        render_camera,
    }
}

#[cfg(test)]
mod tests {
    use super::build;
    use crate::assets::{TRACK_VIEW_CANVAS, load_template};
    use crate::core::scene::{ComponentKind, RenderMode, SceneGraph};

    #[test]
    fn stage_wires_default_views_to_render_camera() {
        let mut scene = SceneGraph::new();
        let template = load_template(TRACK_VIEW_CANVAS).expect("template");
        let stage = build(&mut scene, &template);
        let anchors = stage.anchors;

        assert_eq!(scene.parent(anchors.default_track_view), Some(anchors.manager));
        let canvas = scene.canvas(anchors.default_track_view).expect("canvas");
        assert_eq!(canvas.world_camera, Some(stage.render_camera));
        assert_eq!(canvas.render_mode, RenderMode::WorldSpace);
        assert!(scene.camera(anchors.main_camera).is_some());
        assert!(
            scene
                .find_in_children(anchors.vocal_track, ComponentKind::VocalTrack)
                .is_some()
        );
    }
}
