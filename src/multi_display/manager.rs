use crate::assets::{self, MULTI_DISPLAY_CANVAS, TRACK_VIEW_CANVAS};
use crate::core::output::OutputRouter;
use crate::core::scene::{Camera, Component, ComponentKind, NodeId, SceneGraph, Template, TextureId};
use crate::game::players::Player;
use crate::game::session::Roster;
use crate::multi_display::canvas;
use crate::multi_display::stage::DisplayAnchors;
use log::{debug, info, trace, warn};
use rustc_hash::FxHashMap;
use std::error::Error;

/// Index of the primary display. It has no slot; it uses the main camera and
/// the default UI already in the scene.
pub const PRIMARY_DISPLAY: usize = 1;

#[derive(Debug, Clone)]
pub struct DisplayTemplates {
    pub multi_display_canvas: Template,
    pub track_view_canvas: Template,
}

impl DisplayTemplates {
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            multi_display_canvas: assets::load_template(MULTI_DISPLAY_CANVAS)?,
            track_view_canvas: assets::load_template(TRACK_VIEW_CANVAS)?,
        })
    }
}

/// Views only gameplay needs, created together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionViews {
    pub track_view: NodeId,
    /// Inactive copy of the vocal track; gameplay enables it when vocals play
    /// on this display.
    pub vocal_track: NodeId,
}

/// Everything allocated for one display. Never freed before the manager is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotResources {
    pub ui_root: NodeId,
    pub camera: NodeId,
    pub session: Option<SessionViews>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySlot {
    resources: Option<SlotResources>,
}

impl DisplaySlot {
    #[cfg(test)]
    pub const fn resources(&self) -> Option<&SlotResources> {
        self.resources.as_ref()
    }

    #[cfg(test)]
    pub const fn is_allocated(&self) -> bool {
        self.resources.is_some()
    }

    #[cfg(test)]
    pub fn ui_root(&self) -> Option<NodeId> {
        self.resources.map(|r| r.ui_root)
    }

    #[cfg(test)]
    pub fn secondary_root(&self) -> Option<NodeId> {
        self.resources.and_then(|r| r.session).map(|s| s.track_view)
    }

    pub fn vocal_track(&self) -> Option<NodeId> {
        self.resources.and_then(|r| r.session).map(|s| s.vocal_track)
    }

    /// Resources exist and are currently shown.
    pub fn is_visible(&self, scene: &SceneGraph) -> bool {
        self.resources.is_some_and(|r| {
            scene.is_active_in_hierarchy(r.ui_root) && scene.is_active_in_hierarchy(r.camera)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOption {
    pub label: String,
    pub display_index: usize,
}

/// Routes game UI to secondary displays.
///
/// One slot exists per display `2..=display_count`, fixed at construction.
/// A slot's UI root and camera are created the first time a player is routed
/// to that display and afterwards only shown or hidden. Every operation
/// tolerates bad input: unknown displays are ignored and UI lookups fall back
/// to the primary display's instances.
#[derive(Debug)]
pub struct MultiDisplayManager {
    display_count: usize,
    slots: FxHashMap<usize, DisplaySlot>,
    anchors: DisplayAnchors,
    templates: DisplayTemplates,
    in_session: bool,
    mirror_texture: Option<TextureId>,
}

impl MultiDisplayManager {
    pub fn new(display_count: usize, anchors: DisplayAnchors, templates: DisplayTemplates) -> Self {
        let display_count = display_count.max(PRIMARY_DISPLAY);
        let slots = (PRIMARY_DISPLAY + 1..=display_count)
            .map(|idx| (idx, DisplaySlot::default()))
            .collect();
        info!("Multi-display manager tracking {display_count} display(s)");
        Self {
            display_count,
            slots,
            anchors,
            templates,
            in_session: false,
            mirror_texture: None,
        }
    }

    pub const fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn slot(&self, display_index: usize) -> Option<&DisplaySlot> {
        self.slots.get(&display_index)
    }

    /// Tracked secondary display indices, ascending.
    pub fn display_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.slots.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// The primary display is always connected.
    pub fn is_connected(&self, scene: &SceneGraph, display_index: usize) -> bool {
        display_index == PRIMARY_DISPLAY
            || self
                .slots
                .get(&display_index)
                .is_some_and(|slot| slot.is_visible(scene))
    }

    /// Secondary displays currently showing game UI, ascending.
    pub fn connected_displays(&self, scene: &SceneGraph) -> Vec<usize> {
        self.display_indices()
            .into_iter()
            .filter(|idx| self.is_connected(scene, *idx))
            .collect()
    }

    /// Entries for a display picker, one per display including the primary.
    pub fn display_options(&self) -> Vec<DisplayOption> {
        (PRIMARY_DISPLAY..=self.display_count)
            .map(|display_index| DisplayOption {
                label: format!("Display {display_index}"),
                display_index,
            })
            .collect()
    }

    /// Texture shown by mirror images on every display, current and future.
    pub fn set_mirror_texture(&mut self, scene: &mut SceneGraph, texture: Option<TextureId>) {
        self.mirror_texture = texture;
        for slot in self.slots.values() {
            if let Some(res) = slot.resources {
                canvas::bind_mirror_images(scene, res.ui_root, texture);
            }
        }
    }

    pub fn connect(&mut self, scene: &mut SceneGraph, outputs: &mut OutputRouter, display_index: usize) {
        let existing = match self.slots.get(&display_index) {
            Some(slot) => slot.resources,
            None => {
                trace!("Ignoring connect for untracked display {display_index}");
                return;
            }
        };

        let resources = match existing {
            None => self.allocate(scene, display_index),
            Some(mut res) => {
                scene.set_active(res.ui_root, true);
                scene.set_active(res.camera, true);
                if self.in_session && res.session.is_none() {
                    res.session = self.create_session_views(scene, display_index, res.camera);
                }
                trace!("Display {display_index} re-shown");
                res
            }
        };
        if let Some(slot) = self.slots.get_mut(&display_index) {
            slot.resources = Some(resources);
        }

        outputs.activate(display_index - 1);
    }

    pub fn disconnect(&mut self, scene: &mut SceneGraph, display_index: usize) {
        let Some(res) = self.slots.get(&display_index).and_then(|s| s.resources) else {
            trace!("Ignoring disconnect for display {display_index}: nothing allocated");
            return;
        };
        scene.set_active(res.ui_root, false);
        scene.set_active(res.camera, false);
        trace!("Display {display_index} hidden");
    }

    /// Re-derive every slot's state from `roster`: displays some player is
    /// assigned to are connected, the rest disconnected.
    pub fn reconcile(&mut self, scene: &mut SceneGraph, outputs: &mut OutputRouter, roster: Roster<'_>) {
        self.in_session = roster.in_session();
        for display_index in self.display_indices() {
            if roster.references(display_index) {
                self.connect(scene, outputs, display_index);
            } else {
                self.disconnect(scene, display_index);
            }
        }
        debug!(
            "Reconciled {} player(s) (session: {}); connected displays: {:?}; scene nodes: {}",
            roster.players().len(),
            self.in_session,
            self.connected_displays(scene),
            scene.len()
        );
    }

    pub fn on_player_joined_display(
        &mut self,
        scene: &mut SceneGraph,
        outputs: &mut OutputRouter,
        player: &Player,
    ) {
        if (PRIMARY_DISPLAY..=self.display_count).contains(&player.display_number) {
            outputs.activate(player.display_number - 1);
        }
        self.connect(scene, outputs, player.display_number);
    }

    pub fn on_player_left_display(&mut self, scene: &mut SceneGraph, player: &Player) {
        self.disconnect(scene, player.display_number);
    }

    /// Leave hot path for a player already removed from `remaining`. A display
    /// another player still uses stays connected. Returns whether it was hidden.
    pub fn on_player_left(
        &mut self,
        scene: &mut SceneGraph,
        remaining: Roster<'_>,
        player: &Player,
    ) -> bool {
        if remaining.references(player.display_number) {
            trace!("Display {} stays connected: still in use", player.display_number);
            return false;
        }
        self.on_player_left_display(scene, player);
        true
    }

    /// Lay out each player's HUD and show the lyric bar and vocal track of the
    /// display they play on.
    pub fn show_player_views(&self, scene: &mut SceneGraph, roster: Roster<'_>) {
        for player in roster.players() {
            let display = player.display_number;
            if self.track_view_for(scene, display).is_none() {
                warn!("No track view for display {display}; {} has no HUD.", player.name);
            }
            if let Some(lyric_bar) = self.lyric_bar_for(scene, display) {
                scene.set_active(lyric_bar, true);
            }
            scene.set_active(self.vocal_track_for(display), true);
        }
    }

    /// Hide the lyric bars and per-display vocal tracks shown for a session.
    /// The primary vocal track is left alone.
    pub fn hide_player_views(&self, scene: &mut SceneGraph) {
        for display in std::iter::once(PRIMARY_DISPLAY).chain(self.display_indices()) {
            if let Some(lyric_bar) = self.lyric_bar_for(scene, display) {
                scene.set_active(lyric_bar, false);
            }
        }
        for vocal_track in self.slots.values().filter_map(DisplaySlot::vocal_track) {
            scene.set_active(vocal_track, false);
        }
    }

    /// Track view manager for a display, or the primary one when the display
    /// has no track view of its own. Its HUD positions are laid out on fetch.
    pub fn track_view_for(&self, scene: &mut SceneGraph, display_index: usize) -> Option<NodeId> {
        let root = self
            .session_views(display_index)
            .map_or(self.anchors.default_track_view, |v| v.track_view);
        let track_view = scene.find_in_children(root, ComponentKind::TrackView)?;
        if let Some(view) = scene.track_view_mut(track_view) {
            view.hud_positions_set = true;
        }
        Some(track_view)
    }

    pub fn lyric_bar_for(&self, scene: &SceneGraph, display_index: usize) -> Option<NodeId> {
        let root = self
            .session_views(display_index)
            .map_or(self.anchors.default_track_view, |v| v.track_view);
        scene.find_in_children(root, ComponentKind::LyricBar)
    }

    pub fn vocal_track_for(&self, display_index: usize) -> NodeId {
        self.session_views(display_index)
            .map_or(self.anchors.vocal_track, |v| v.vocal_track)
    }

    fn session_views(&self, display_index: usize) -> Option<SessionViews> {
        self.slots
            .get(&display_index)
            .and_then(|s| s.resources)
            .and_then(|r| r.session)
    }

    fn allocate(&self, scene: &mut SceneGraph, display_index: usize) -> SlotResources {
        let template = &self.templates.multi_display_canvas;
        let ui_root = scene.instantiate(template, Some(self.anchors.scene_root));
        scene.rename(ui_root, format!("{} {display_index}", template.name));

        let camera = match scene.clone_node(self.anchors.main_camera, Some(self.anchors.main_camera)) {
            Some(camera) => camera,
            None => {
                warn!("Main camera missing; display {display_index} gets a default camera.");
                let camera = scene.spawn("Camera", Some(self.anchors.scene_root));
                scene.add_component(camera, Component::Camera(Camera::default()));
                camera
            }
        };
        scene.rename(camera, format!("Display Camera {display_index}"));
        scene.set_active(camera, true);
        if let Some(cam) = scene.camera_mut(camera) {
            cam.target_display = display_index - 1;
            cam.target_texture = None;
        }

        if let Some(ui_canvas) = scene.canvas_mut(ui_root) {
            ui_canvas.world_camera = Some(camera);
        }
        canvas::run_start_hooks(scene, ui_root, self.mirror_texture);

        let session = if self.in_session {
            self.create_session_views(scene, display_index, camera)
        } else {
            None
        };

        info!(
            "Allocated display {display_index} (session views: {})",
            session.is_some()
        );
        SlotResources {
            ui_root,
            camera,
            session,
        }
    }

    fn create_session_views(
        &self,
        scene: &mut SceneGraph,
        display_index: usize,
        camera: NodeId,
    ) -> Option<SessionViews> {
        let vocal_parent = scene.parent(self.anchors.vocal_track);
        let Some(vocal_track) = scene.clone_subtree(self.anchors.vocal_track, vocal_parent) else {
            warn!("Vocal track missing; display {display_index} gets no track view.");
            return None;
        };
        scene.set_active(vocal_track, false);
        let vocal_name = format!(
            "{} {display_index}",
            scene.name(self.anchors.vocal_track).unwrap_or("VocalTrack")
        );
        scene.rename(vocal_track, vocal_name);

        let template = &self.templates.track_view_canvas;
        let track_view = scene.instantiate(template, Some(self.anchors.manager));
        scene.rename(track_view, format!("{} {display_index}", template.name));
        if let Some(view_canvas) = scene.canvas_mut(track_view) {
            view_canvas.world_camera = Some(camera);
        }
        canvas::run_start_hooks(scene, track_view, self.mirror_texture);

        Some(SessionViews {
            track_view,
            vocal_track,
        })
    }
}
