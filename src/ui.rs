use egui::Context;
use glam::EulerRot;

use crate::model::SimulationState;
use crate::view::{DrawStats, OverlayFrame};

/// Values shown in the debug overlay for one frame
pub struct HudInfo<'a> {
    pub state: &'a SimulationState,
    pub stats: DrawStats,
    pub pointer_attached: bool,
    pub dt_ms: f32,
}

/// Build the complete UI and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, hud: &HudInfo) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_crosshair(ctx);
        draw_debug_window(ctx, hud);
    })
}

/// Tessellate a finished UI pass into something the renderer can paint
pub fn into_overlay(egui_ctx: &Context, output: egui::FullOutput) -> (OverlayFrame, egui::PlatformOutput) {
    let pixels_per_point = output.pixels_per_point;
    let primitives = egui_ctx.tessellate(output.shapes, pixels_per_point);
    (
        OverlayFrame { primitives, textures_delta: output.textures_delta, pixels_per_point },
        output.platform_output,
    )
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    painter.line_segment([egui::pos2(center.x - size, center.y), egui::pos2(center.x + size, center.y)], stroke);
    painter.line_segment([egui::pos2(center.x, center.y - size), egui::pos2(center.x, center.y + size)], stroke);
}

fn draw_debug_window(ctx: &Context, hud: &HudInfo) {
    let state = hud.state;
    let pos = state.position;
    let (roll, yaw, pitch) = state.orientation.to_euler(EulerRot::ZYX);
    let rate = state.angular_rate;

    egui::Window::new("Flight")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            let fps = if hud.dt_ms > 0.0 { 1000.0 / hud.dt_ms } else { 0.0 };
            ui.label(egui::RichText::new(format!("FPS: {fps:.0}")).small());
            ui.label(egui::RichText::new(format!("Pos: x: {:.2} y: {:.2} z: {:.2}", pos.x, pos.y, pos.z)).small());
            ui.label(egui::RichText::new(format!("Speed: {:.4}", state.speed())).small());
            ui.label(
                egui::RichText::new(format!(
                    "Roll: {:.1} Yaw: {:.1} Pitch: {:.1}",
                    roll.to_degrees(),
                    yaw.to_degrees(),
                    pitch.to_degrees()
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!("Rates: r {:.3} y {:.3} p {:.3}", rate.roll, rate.yaw, rate.pitch))
                    .small(),
            );
            ui.label(egui::RichText::new(format!("Drawn: {} Skipped: {}", hud.stats.drawn, hud.stats.skipped)).small());
            if !hud.pointer_attached {
                ui.label(egui::RichText::new("Click to capture the mouse").small().color(egui::Color32::YELLOW));
            }
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            ui.label(egui::RichText::new("Mouse - Yaw / Pitch").small());
            ui.label(egui::RichText::new("W / S - Thrust / Reverse").small());
            ui.label(egui::RichText::new("A / D - Strafe").small());
            ui.label(egui::RichText::new("Q / E - Roll").small());
            ui.label(egui::RichText::new("Esc - Release mouse").small());
        });
}
