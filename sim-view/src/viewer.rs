//! Interactive wobbling-tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! (tree, configuration, seed) and implements [`eframe::App`] to run the
//! fixed-timestep update loop, draw the tree, and forward mouse input to
//! the physics world.

use eframe::App;
use glam::Vec2;
use log::{error, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sim_core::{
    Config, Tree,
    body::BodyKind,
    spring::SpringKind,
    types::BodyId,
};

const BARK: egui::Color32 = egui::Color32::from_rgb(110, 80, 50);
const CROWN: egui::Color32 = egui::Color32::from_rgb(150, 200, 120);
const TWIG: egui::Color32 = egui::Color32::from_rgb(140, 105, 70);
const LEAF: egui::Color32 = egui::Color32::from_rgb(90, 170, 80);
const GRABBED: egui::Color32 = egui::Color32::from_rgb(240, 200, 60);

/// Main application state for the viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Tree`] (which owns the physics world) and [`Config`].
/// - View state (pan/zoom, fit-on-next-frame flag).
/// - The fixed-timestep accumulator driving [`Tree::step`].
/// - Mouse interaction state (the body currently held by the pointer spring).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true`, advance the simulation by the frame time in
///    fixed steps via [`Viewer::advance`].
/// 3. Render springs and bodies.
pub struct Viewer {
    tree: Tree,
    cfg: Config,
    seed: u64,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    /// Fit the zoom to the canvas on the next frame.
    needs_fit: bool,

    grabbed: Option<BodyId>,
    show_decor: bool,

    accumulator: f32,
    steps_last_frame: usize,
}

impl Viewer {
    /// Builds the default tree once and starts running.
    ///
    /// The seed comes from `cfg.seed` when set, otherwise a fresh one is drawn
    /// so that every launch decorates differently.
    pub fn new(cfg: Config) -> sim_core::Result<Self> {
        let seed = cfg.seed.unwrap_or_else(|| rand::rng().random());
        let tree = Tree::build_default(&cfg, &mut StdRng::seed_from_u64(seed))?;
        info!(
            "tree ready: {} nodes, {} bodies, seed {seed}",
            tree.node_count(),
            tree.world().bodies().len()
        );

        Ok(Self {
            tree,
            cfg,
            seed,
            running: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            needs_fit: true,
            grabbed: None,
            show_decor: true,
            accumulator: 0.0,
            steps_last_frame: 0,
        })
    }

    /// Rebuilds the tree from the current config with the same seed.
    ///
    /// An invalid config keeps the old tree and logs the error.
    fn reset(&mut self) {
        match Tree::build_default(&self.cfg, &mut StdRng::seed_from_u64(self.seed)) {
            Ok(tree) => {
                self.tree = tree;
                self.grabbed = None;
                self.accumulator = 0.0;
                self.needs_fit = true;
                self.running = false;
            }
            Err(e) => error!("reset failed: {e}"),
        }
    }

    fn reseed(&mut self) {
        self.seed = rand::rng().random();
        self.reset();
        self.running = true;
    }

    /// Advances the simulation by one fixed step.
    fn step_once(&mut self) {
        self.tree.world_mut().forces = self.cfg.forces;
        self.tree.step(self.cfg.dt(), self.cfg.sim.sub_steps);
    }

    /// Consumes `frame_dt` seconds in fixed steps.
    ///
    /// At most `max_steps_per_frame` steps run; any backlog beyond that is
    /// dropped so a slow frame does not snowball.
    ///
    /// ### Returns
    /// The number of steps taken.
    fn advance(&mut self, frame_dt: f32) -> usize {
        let dt = self.cfg.dt();
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.cfg.sim.max_steps_per_frame {
            self.step_once();
            self.accumulator -= dt;
            steps += 1;
        }
        // Whatever is still a full step or more after the cap is backlog.
        if self.accumulator >= dt {
            self.accumulator = 0.0;
        }
        steps
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Sets zoom and pan so the whole tree fits inside `rect` with a margin.
    fn fit_to(&mut self, rect: egui::Rect) {
        let Some((min, max)) = self.tree.world().bounds() else {
            return;
        };
        // Leave headroom above the crown for anti-gravity to lift it.
        let size = (max - min).max(Vec2::splat(1.0)) * 1.25;
        self.zoom = (rect.width() / size.x)
            .min(rect.height() / size.y)
            .clamp(0.1, 10.0);

        let c = (min + max) * 0.5;
        self.pan = egui::vec2(-c.x * self.zoom, c.y * self.zoom);
    }

    fn depth_color(&self, depth: usize) -> egui::Color32 {
        let t = depth as f32 / self.tree.max_depth().max(1) as f32;
        BARK.lerp_to_gamma(CROWN, t)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                if ui.button("Reseed").clicked() {
                    self.reseed();
                }

                if ui.button("Fit").clicked() {
                    self.needs_fit = true;
                }

                ui.separator();
                ui.checkbox(&mut self.show_decor, "Leaves");
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (counts, energy, stepping).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let world = self.tree.world();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("seed = {}", self.seed));
                ui.label(format!("steps/frame = {}", self.steps_last_frame));
                ui.separator();
                ui.label(format!("energy = {:.1}", world.kinetic_energy()));
                ui.label(format!("contacts = {}", world.last_contacts()));
                ui.label(format!("springs = {}", world.springs().len()));
                ui.label(format!("bodies = {}", world.bodies().len()));
                ui.label(format!("nodes = {}", self.tree.node_count()));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Force settings apply on the next step; spring, layout and decor
    /// settings apply on Reset.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Forces");
                let f = &mut self.cfg.forces;
                Self::labeled_drag_f32(ui, "anti_gravity:", &mut f.anti_gravity, -200.0..=200.0, 0.5);
                Self::labeled_drag_f32(ui, "gravity:", &mut f.gravity, -200.0..=200.0, 0.5);
                Self::labeled_drag_f32(ui, "repulsion:", &mut f.repulsion, 0.0..=50000.0, 50.0);
                Self::labeled_drag_f32(
                    ui,
                    "repulsion_max:",
                    &mut f.repulsion_max_force,
                    0.0..=500.0,
                    0.5,
                );
                Self::labeled_drag_f32(ui, "center_pull:", &mut f.center_pull, 0.0..=10.0, 0.05);
                Self::labeled_drag_f32(ui, "damping:", &mut f.damping, 0.0..=20.0, 0.05);

                ui.separator();
                ui.label("Springs (on Reset)");
                let s = &mut self.cfg.springs;
                Self::labeled_drag_f32(ui, "branch len:", &mut s.branch.length, 1.0..=300.0, 0.5);
                Self::labeled_drag_f32(ui, "branch k:", &mut s.branch.stiffness, 0.0..=200.0, 0.5);
                Self::labeled_drag_f32(ui, "branch c:", &mut s.branch.damping, 0.0..=20.0, 0.05);
                Self::labeled_drag_f32(ui, "twig k:", &mut s.twig.stiffness, 0.0..=100.0, 0.1);
                Self::labeled_drag_f32(ui, "leaf k:", &mut s.leaf.stiffness, 0.0..=100.0, 0.1);

                ui.separator();
                ui.label("Decor (on Reset)");
                ui.checkbox(&mut self.cfg.decor.enabled, "enabled");
                ui.horizontal(|ui| {
                    ui.label("leaves_per_tip:");
                    ui.add(
                        egui::DragValue::new(&mut self.cfg.decor.leaves_per_tip)
                            .range(0..=8)
                            .speed(1.0),
                    );
                });
                Self::labeled_drag_f32(
                    ui,
                    "twig_chance:",
                    &mut self.cfg.decor.twig_chance,
                    0.0..=1.0,
                    0.01,
                );

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }
            });
    }

    /// Handles grabbing, dragging and releasing bodies with the primary button.
    ///
    /// A drag that does not start on a body pans the view instead.
    fn handle_pointer(&mut self, response: &egui::Response, rect: egui::Rect) {
        let pointer_world = response
            .interact_pointer_pos()
            .map(|p| self.screen_to_world(p, rect));

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(p) = pointer_world
            && let Some(id) = self.tree.world().body_at(p)
        {
            let springs = self.cfg.springs;
            if self
                .tree
                .world_mut()
                .grab(id, p, springs.mouse_stiffness, springs.mouse_damping)
            {
                self.grabbed = Some(id);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match (self.grabbed, pointer_world) {
                (Some(_), Some(p)) => self.tree.world_mut().drag_to(p),
                (Some(_), None) => {}
                (None, _) => self.pan += response.drag_delta(),
            }
        }

        if response.drag_stopped() && self.grabbed.take().is_some() {
            self.tree.world_mut().release();
        }
    }

    /// Builds the central canvas where the tree is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if self.needs_fit && rect.width() > 0.0 && rect.height() > 0.0 {
                self.fit_to(rect);
                self.needs_fit = false;
            }

            self.handle_pointer(&response, rect);

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if self.running {
                let frame_dt = ctx.input(|i| i.stable_dt);
                self.steps_last_frame = self.advance(frame_dt);
                ctx.request_repaint();
            } else {
                self.steps_last_frame = 0;
            }

            let world = self.tree.world();
            let bodies = world.bodies();

            // Springs first so bodies draw on top.
            for s in world.springs() {
                let (color, width) = match s.kind {
                    SpringKind::Branch => (BARK, (bodies[s.b].radius * self.zoom).max(1.0)),
                    SpringKind::Twig => (TWIG, 1.0),
                    SpringKind::Leaf => (LEAF, 1.0),
                };
                if s.kind != SpringKind::Branch && !self.show_decor {
                    continue;
                }
                let a = self.world_to_screen(bodies[s.a].pos, rect);
                let b = self.world_to_screen(bodies[s.b].pos, rect);
                painter.line_segment([a, b], egui::Stroke::new(width, color));
            }

            if let Some(m) = world.mouse() {
                let a = self.world_to_screen(bodies[m.body].pos, rect);
                let b = self.world_to_screen(m.target, rect);
                painter.line_segment([a, b], egui::Stroke::new(1.0, GRABBED));
            }

            if self.show_decor {
                for b in bodies.iter().filter(|b| b.kind.is_decor()) {
                    let color = if b.kind == BodyKind::Leaf { LEAF } else { TWIG };
                    let p = self.world_to_screen(b.pos, rect);
                    painter.circle_filled(p, (b.radius * self.zoom).max(1.5), color);
                }
            }

            for (_, node) in self.tree.nodes() {
                let b = &bodies[node.body];
                let p = self.world_to_screen(b.pos, rect);
                let color = if self.grabbed == Some(node.body) {
                    GRABBED
                } else {
                    self.depth_color(node.depth)
                };
                painter.circle_filled(p, (b.radius * self.zoom).max(2.0), color);
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
