use crate::config;
use crate::core::display;
use crate::core::output::{OutputRouter, OutputWindow, pack_rgb};
use crate::core::scene::SceneGraph;
use crate::game::players::{Player, PlayerContainer, PlayerId};
use crate::game::session::{GameSession, Roster};
use crate::multi_display::{DisplayTemplates, MultiDisplayManager, MultiDisplayRenderTexture, stage};
use log::{error, info, warn};
use rustc_hash::FxHashMap;
use std::{error::Error, sync::Arc};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    monitor::MonitorHandle,
    window::{Window, WindowId},
};

/* -------------------- output colors -------------------- */
const PRIMARY_CLEAR: [f32; 3] = [0.08, 0.08, 0.12];
const DISCONNECTED_CLEAR: [f32; 3] = [0.0, 0.0, 0.0];
const DISPLAY_PALETTE: [[f32; 3]; 4] = [
    [0.85, 0.25, 0.35],
    [0.20, 0.55, 0.90],
    [0.95, 0.70, 0.15],
    [0.30, 0.80, 0.45],
];

/// Everything that only exists once the event loop is running.
struct Shell {
    primary: OutputWindow,
    /// Secondary output windows keyed by 1-based display index.
    outputs: FxHashMap<usize, OutputWindow>,
    scene: SceneGraph,
    router: OutputRouter,
    manager: MultiDisplayManager,
    capture: MultiDisplayRenderTexture,
}

pub struct App {
    shell: Option<Shell>,
    players: PlayerContainer,
    session: Option<GameSession>,
    shift_held: bool,
}

impl App {
    fn new() -> Self {
        let cfg = config::get();
        let mut players = PlayerContainer::new();
        players.join(Player::new(PlayerId::P1, cfg.display_for(PlayerId::P1)));
        Self {
            shell: None,
            players,
            session: None,
            shift_held: false,
        }
    }

    fn init_shell(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let cfg = config::get();

        let monitors: Vec<MonitorHandle> = event_loop.available_monitors().collect();
        for (idx, name) in display::friendly_monitor_names(&monitors).iter().enumerate() {
            info!("Display {}: {name}", idx + 1);
        }
        let display_count = display::resolve_display_count(monitors.len(), cfg.dev_mode);
        if cfg.dev_mode {
            info!("Dev mode: routing as if {display_count} displays exist.");
        }

        let mut attributes = Window::default_attributes()
            .with_title("Multi-Display - Display 1")
            .with_inner_size(PhysicalSize::new(cfg.window_width, cfg.window_height));
        if let Some(pos) = display::default_window_position(
            cfg.window_width,
            cfg.window_height,
            event_loop.primary_monitor(),
        ) {
            attributes = attributes.with_position(pos);
        }
        let window = Arc::new(event_loop.create_window(attributes)?);
        let primary = OutputWindow::new(window.clone())?;

        let templates = DisplayTemplates::load()?;
        let mut scene = SceneGraph::new();
        let stage = stage::build(&mut scene, &templates.track_view_canvas);

        let size = window.inner_size();
        let mut capture = MultiDisplayRenderTexture::new(stage.render_camera);
        let texture = capture.enable(&mut scene, size.width.max(1), size.height.max(1));

        let mut manager = MultiDisplayManager::new(display_count, stage.anchors, templates);
        manager.set_mirror_texture(&mut scene, Some(texture));

        let router = OutputRouter::new(display_count, !cfg.dev_mode);
        if !router.is_controllable() {
            info!("Secondary outputs are simulated; no output windows will open.");
        }

        self.shell = Some(Shell {
            primary,
            outputs: FxHashMap::default(),
            scene,
            router,
            manager,
            capture,
        });
        self.reconcile(event_loop);
        info!("Starting event loop...");
        Ok(())
    }

    /* -------------------- roster changes -------------------- */

    fn reconcile(&mut self, event_loop: &ActiveEventLoop) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };
        let roster = Roster::resolve(self.session.as_ref(), &self.players);
        shell
            .manager
            .reconcile(&mut shell.scene, &mut shell.router, roster);
        if roster.in_session() {
            shell.manager.show_player_views(&mut shell.scene, roster);
        }
        self.open_pending_outputs(event_loop);
    }

    fn toggle_player(&mut self, event_loop: &ActiveEventLoop, id: PlayerId) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };
        if let Some(player) = self.players.leave(id) {
            if let Some(session) = self.session.as_mut() {
                session.leave(id);
            }
            info!("{id} left (display {})", player.display_number);
            let remaining = Roster::resolve(self.session.as_ref(), &self.players);
            shell
                .manager
                .on_player_left(&mut shell.scene, remaining, &player);
        } else {
            let player = Player::new(id, config::get().display_for(id));
            info!("{id} joined on display {}", player.display_number);
            if player.display_number > shell.manager.display_count() {
                warn!(
                    "{id} is assigned to display {} of {}; it stays on the primary output.",
                    player.display_number,
                    shell.manager.display_count()
                );
            }
            if let Some(session) = self.session.as_mut() {
                session.join(player.clone());
            }
            shell
                .manager
                .on_player_joined_display(&mut shell.scene, &mut shell.router, &player);
            self.players.join(player);
        }
        self.open_pending_outputs(event_loop);
    }

    fn cycle_player_display(&mut self, event_loop: &ActiveEventLoop, id: PlayerId) {
        let Some(shell) = self.shell.as_ref() else {
            return;
        };
        let Some(current) = self.players.get(id).map(|p| p.display_number) else {
            warn!("{id} is not joined; join before choosing a display.");
            return;
        };
        let options = shell.manager.display_options();
        let next = options
            .iter()
            .position(|o| o.display_index == current)
            .map_or(0, |pos| (pos + 1) % options.len());
        let Some(option) = options.get(next) else {
            return;
        };
        info!("{id} -> {}", option.label);

        self.players.set_display(id, option.display_index);
        if let Some(session) = self.session.as_mut() {
            session.set_display(id, option.display_index);
        }
        config::update_player_display(id, option.display_index);
        self.reconcile(event_loop);
    }

    fn toggle_session(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.take().is_some() {
            if let Some(shell) = self.shell.as_mut() {
                shell.manager.hide_player_views(&mut shell.scene);
            }
            info!("Gameplay session ended.");
        } else if self.players.is_empty() {
            warn!("No players joined; press F1-F4 before starting a session.");
            return;
        } else {
            self.session = Some(GameSession::start(&self.players));
        }
        self.reconcile(event_loop);
    }

    /* -------------------- output windows -------------------- */

    fn open_pending_outputs(&mut self, event_loop: &ActiveEventLoop) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };
        let fullscreen_type = config::get().fullscreen_type;
        for zero_based in shell.router.take_pending() {
            let display_index = zero_based + 1;
            if zero_based == 0 || shell.outputs.contains_key(&display_index) {
                continue;
            }
            let (monitor, count, clamped) = display::resolve_monitor(event_loop, zero_based);
            if clamped != zero_based {
                warn!("Display {display_index} requested but only {count} monitor(s) reported.");
                continue;
            }
            let attributes = Window::default_attributes()
                .with_title(format!("Multi-Display - Display {display_index}"))
                .with_fullscreen(Some(display::output_fullscreen(
                    fullscreen_type,
                    monitor,
                    event_loop,
                )));
            let output = event_loop
                .create_window(attributes)
                .map_err(Box::<dyn Error>::from)
                .and_then(|window| OutputWindow::new(Arc::new(window)));
            match output {
                Ok(output) => {
                    info!("Opened output window on display {display_index}");
                    output.window.request_redraw();
                    shell.outputs.insert(display_index, output);
                }
                Err(e) => error!("Failed to open output window on display {display_index}: {e}"),
            }
        }
        shell.primary.window.request_redraw();
        for output in shell.outputs.values() {
            output.window.request_redraw();
        }
    }

    fn redraw(&mut self, window_id: WindowId) {
        let Some(shell) = self.shell.as_mut() else {
            return;
        };
        if shell.primary.window.id() == window_id {
            if let Err(e) = shell.primary.present(pack_rgb(PRIMARY_CLEAR)) {
                error!("Failed to present primary display: {e}");
            }
            return;
        }
        let Some((&display_index, output)) = shell
            .outputs
            .iter_mut()
            .find(|(_, o)| o.window.id() == window_id)
        else {
            return;
        };
        let color = if shell.manager.is_connected(&shell.scene, display_index) {
            DISPLAY_PALETTE[(display_index - 2) % DISPLAY_PALETTE.len()]
        } else {
            DISCONNECTED_CLEAR
        };
        if let Err(e) = output.present(pack_rgb(color)) {
            warn!("Failed to present display {display_index}: {e}");
        }
    }

    /* -------------------- keyboard -------------------- */

    fn handle_key_event(&mut self, event_loop: &ActiveEventLoop, key_event: &KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        if matches!(code, KeyCode::ShiftLeft | KeyCode::ShiftRight) {
            self.shift_held = key_event.state == ElementState::Pressed;
            return;
        }
        if key_event.state != ElementState::Pressed || key_event.repeat {
            return;
        }

        let player = match code {
            KeyCode::F1 => PlayerId::new(1),
            KeyCode::F2 => PlayerId::new(2),
            KeyCode::F3 => PlayerId::new(3),
            KeyCode::F4 => PlayerId::new(4),
            _ => None,
        };
        if let Some(id) = player {
            if self.shift_held {
                self.cycle_player_display(event_loop, id);
            } else {
                self.toggle_player(event_loop, id);
            }
            return;
        }

        match code {
            KeyCode::Enter => self.toggle_session(event_loop),
            KeyCode::KeyR => self.reconcile(event_loop),
            KeyCode::Escape => {
                info!("Escape pressed. Shutting down.");
                event_loop.exit();
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.shell.is_none()
            && let Err(e) = self.init_shell(event_loop)
        {
            error!("Failed to initialize displays: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let is_primary = self
            .shell
            .as_ref()
            .is_some_and(|s| s.primary.window.id() == window_id);

        match event {
            WindowEvent::CloseRequested if is_primary => {
                info!("Close requested. Shutting down.");
                event_loop.exit();
            }
            WindowEvent::CloseRequested => {
                info!("Output windows stay open for the whole session.");
            }
            WindowEvent::Resized(new_size) if is_primary => {
                if new_size.width > 0
                    && new_size.height > 0
                    && let Some(shell) = self.shell.as_mut()
                {
                    let texture = shell
                        .capture
                        .enable(&mut shell.scene, new_size.width, new_size.height);
                    shell
                        .manager
                        .set_mirror_texture(&mut shell.scene, Some(texture));
                }
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => self.handle_key_event(event_loop, &key_event),
            WindowEvent::RedrawRequested => self.redraw(window_id),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(shell) = self.shell.as_mut() {
            shell.capture.disable(&mut shell.scene);
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
