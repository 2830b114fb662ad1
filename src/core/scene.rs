use log::trace;
use smallvec::SmallVec;

// --- Handles ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

// --- Components ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    ScreenSpaceOverlay,
    ScreenSpaceCamera,
    WorldSpace,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Canvas {
    pub render_mode: RenderMode,
    pub world_camera: Option<NodeId>,
    /// Switch to world space the first time the canvas starts.
    pub world_space_on_start: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    /// Zero-based physical display the camera presents to.
    pub target_display: usize,
    pub target_texture: Option<TextureId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackView {
    pub hud_positions_set: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawImage {
    pub texture: Option<TextureId>,
    /// Shows the shared multi-display render texture once started.
    pub mirror: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Canvas(Canvas),
    Camera(Camera),
    TrackView(TrackView),
    LyricBar,
    VocalTrack,
    RawImage(RawImage),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Canvas,
    Camera,
    TrackView,
    LyricBar,
    VocalTrack,
    RawImage,
}

impl Component {
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Canvas(_) => ComponentKind::Canvas,
            Self::Camera(_) => ComponentKind::Camera,
            Self::TrackView(_) => ComponentKind::TrackView,
            Self::LyricBar => ComponentKind::LyricBar,
            Self::VocalTrack => ComponentKind::VocalTrack,
            Self::RawImage(_) => ComponentKind::RawImage,
        }
    }
}

// --- Render textures ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    ArgbHalf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_count: u32,
}

#[derive(Clone, Debug)]
pub struct RenderTexture {
    pub descriptor: RenderTextureDescriptor,
    pub released: bool,
}

// --- Templates ---

/// Blueprint for a node hierarchy, instantiated into a `SceneGraph`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub active: bool,
    pub components: Vec<Component>,
    pub children: Vec<Template>,
}

impl Template {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

// --- Scene graph ---

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    pub active: bool,
    pub components: SmallVec<[Component; 2]>,
}

impl Node {
    #[inline(always)]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }
}

/// Arena of scene nodes. Nodes are never removed; handles stay valid for the
/// lifetime of the graph.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    textures: Vec<RenderTexture>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Create an empty, active node. An unknown parent makes it a root.
    pub fn spawn(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = parent.filter(|p| p.index() < self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: SmallVec::new(),
            active: true,
            components: SmallVec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        id
    }

    pub fn add_component(&mut self, id: NodeId, component: Component) {
        if let Some(node) = self.node_mut(id) {
            node.components.push(component);
        }
    }

    pub fn instantiate(&mut self, template: &Template, parent: Option<NodeId>) -> NodeId {
        let id = self.spawn(&template.name, parent);
        let node = &mut self.nodes[id.index()];
        node.active = template.active;
        node.components.extend(template.components.iter().cloned());
        for child in &template.children {
            self.instantiate(child, Some(id));
        }
        trace!("Instantiated '{}' as {id:?}", template.name);
        id
    }

    fn snapshot(&self, id: NodeId, deep: bool) -> Option<Template> {
        let node = self.node(id)?;
        let children = if deep {
            node.children
                .iter()
                .filter_map(|child| self.snapshot(*child, true))
                .collect()
        } else {
            Vec::new()
        };
        Some(Template {
            name: node.name.clone(),
            active: node.active,
            components: node.components.to_vec(),
            children,
        })
    }

    /// Copy a single node (components and active flag, no children).
    pub fn clone_node(&mut self, source: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let template = self.snapshot(source, false)?;
        Some(self.instantiate(&template, parent))
    }

    /// Copy a node together with its whole hierarchy.
    pub fn clone_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let template = self.snapshot(source, true)?;
        Some(self.instantiate(&template, parent))
    }

    pub fn rename(&mut self, id: NodeId, name: String) {
        if let Some(node) = self.node_mut(id) {
            node.name = name;
        }
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) {
        if let Some(node) = self.node_mut(id) {
            node.active = active;
        }
    }

    #[cfg(test)]
    pub fn is_active(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.active)
    }

    /// Active itself and every ancestor active.
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.node(current) {
                Some(node) if node.active => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Depth-first search starting at `root` itself; inactive nodes included.
    pub fn find_in_children(&self, root: NodeId, kind: ComponentKind) -> Option<NodeId> {
        let node = self.node(root)?;
        if node.has(kind) {
            return Some(root);
        }
        node.children
            .iter()
            .find_map(|child| self.find_in_children(*child, kind))
    }

    pub fn find_all_in_children(&self, root: NodeId, kind: ComponentKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if node.has(kind) {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn components_mut(&mut self, id: NodeId) -> impl Iterator<Item = &mut Component> {
        self.node_mut(id)
            .into_iter()
            .flat_map(|node| node.components.iter_mut())
    }

    pub fn canvas(&self, id: NodeId) -> Option<&Canvas> {
        self.node(id)?.components.iter().find_map(|c| match c {
            Component::Canvas(canvas) => Some(canvas),
            _ => None,
        })
    }

    pub fn canvas_mut(&mut self, id: NodeId) -> Option<&mut Canvas> {
        self.components_mut(id).find_map(|c| match c {
            Component::Canvas(canvas) => Some(canvas),
            _ => None,
        })
    }

    #[cfg(test)]
    pub fn camera(&self, id: NodeId) -> Option<&Camera> {
        self.node(id)?.components.iter().find_map(|c| match c {
            Component::Camera(camera) => Some(camera),
            _ => None,
        })
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Option<&mut Camera> {
        self.components_mut(id).find_map(|c| match c {
            Component::Camera(camera) => Some(camera),
            _ => None,
        })
    }

    #[cfg(test)]
    pub fn track_view(&self, id: NodeId) -> Option<&TrackView> {
        self.node(id)?.components.iter().find_map(|c| match c {
            Component::TrackView(view) => Some(view),
            _ => None,
        })
    }

    pub fn track_view_mut(&mut self, id: NodeId) -> Option<&mut TrackView> {
        self.components_mut(id).find_map(|c| match c {
            Component::TrackView(view) => Some(view),
            _ => None,
        })
    }

    #[cfg(test)]
    pub fn raw_image(&self, id: NodeId) -> Option<&RawImage> {
        self.node(id)?.components.iter().find_map(|c| match c {
            Component::RawImage(image) => Some(image),
            _ => None,
        })
    }

    pub fn raw_image_mut(&mut self, id: NodeId) -> Option<&mut RawImage> {
        self.components_mut(id).find_map(|c| match c {
            Component::RawImage(image) => Some(image),
            _ => None,
        })
    }

    /// Released slots are reused before the arena grows.
    pub fn create_render_texture(&mut self, descriptor: RenderTextureDescriptor) -> TextureId {
        let texture = RenderTexture {
            descriptor,
            released: false,
        };
        if let Some(idx) = self.textures.iter().position(|t| t.released) {
            self.textures[idx] = texture;
            return TextureId(idx as u32);
        }
        self.textures.push(texture);
        TextureId((self.textures.len() - 1) as u32)
    }

    pub fn release_texture(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.get_mut(id.0 as usize) {
            texture.released = true;
        }
    }

    pub fn texture(&self, id: TextureId) -> Option<&RenderTexture> {
        self.textures.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Camera, Component, ComponentKind, RenderTextureDescriptor, SceneGraph, Template,
        TextureFormat, TrackView,
    };

    fn hud_template() -> Template {
        Template::new("Hud")
            .child(Template::new("Track").with(Component::TrackView(TrackView::default())))
            .child(Template::new("Lyrics").with(Component::LyricBar).inactive())
    }

    #[test]
    fn instantiate_builds_parented_hierarchy() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn("Root", None);
        let hud = scene.instantiate(&hud_template(), Some(root));

        assert_eq!(scene.parent(hud), Some(root));
        let children = &scene.node(hud).expect("hud exists").children;
        assert_eq!(children.len(), 2, "template children should be instantiated");
        assert!(
            !scene.is_active(children[1]),
            "inactive template nodes must stay inactive"
        );
    }

    #[test]
    fn find_in_children_includes_inactive_nodes() {
        let mut scene = SceneGraph::new();
        let hud = scene.instantiate(&hud_template(), None);
        let lyrics = scene
            .find_in_children(hud, ComponentKind::LyricBar)
            .expect("inactive lyric bar should still be found");
        assert_eq!(scene.name(lyrics), Some("Lyrics"));
        assert_eq!(scene.find_in_children(hud, ComponentKind::Camera), None);
    }

    #[test]
    fn active_in_hierarchy_respects_ancestors() {
        let mut scene = SceneGraph::new();
        let hud = scene.instantiate(&hud_template(), None);
        let track = scene
            .find_in_children(hud, ComponentKind::TrackView)
            .expect("track view exists");
        assert!(scene.is_active_in_hierarchy(track));
        scene.set_active(hud, false);
        assert!(scene.is_active(track), "own flag is untouched");
        assert!(!scene.is_active_in_hierarchy(track));
    }

    #[test]
    fn clone_node_is_shallow_and_clone_subtree_is_deep() {
        let mut scene = SceneGraph::new();
        let cam = scene.spawn("Main Camera", None);
        scene.add_component(cam, Component::Camera(Camera::default()));
        scene.spawn("Child", Some(cam));

        let shallow = scene.clone_node(cam, Some(cam)).expect("camera exists");
        assert!(scene.camera(shallow).is_some());
        assert!(scene.node(shallow).expect("clone exists").children.is_empty());

        let hud = scene.instantiate(&hud_template(), None);
        let deep = scene.clone_subtree(hud, None).expect("hud exists");
        assert_eq!(scene.find_all_in_children(deep, ComponentKind::LyricBar).len(), 1);
        assert_ne!(deep, hud);
    }

    #[test]
    fn unknown_handles_are_ignored() {
        let mut scene = SceneGraph::new();
        let lone = scene.spawn("Lone", None);
        let mut other = SceneGraph::new();
        other.spawn("A", None);
        let foreign = other.spawn("B", None);

        scene.set_active(foreign, false);
        assert!(!scene.is_active(foreign));
        assert_eq!(scene.clone_subtree(foreign, Some(lone)), None);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn released_textures_are_reused() {
        let mut scene = SceneGraph::new();
        let desc = |width| RenderTextureDescriptor {
            width,
            height: 720,
            format: TextureFormat::ArgbHalf,
            mip_count: 0,
        };
        let first = scene.create_render_texture(desc(1280));
        let kept = scene.create_render_texture(desc(640));

        for width in 1..=1000 {
            scene.release_texture(first);
            assert_eq!(scene.create_render_texture(desc(width)), first);
        }
        assert_eq!(scene.textures.len(), 2, "storage must not grow");
        assert_eq!(scene.texture(first).map(|t| t.descriptor.width), Some(1000));
        assert!(scene.texture(kept).is_some_and(|t| !t.released));
    }
}
