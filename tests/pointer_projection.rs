//! Controller rays projected onto the panel, end to end through the public API

use egui::{Event, PointerButton};
use glam::{Quat, Vec2, Vec3};

use vr_gui::camera::{Camera, Pose};
use vr_gui::config::PanelConfig;
use vr_gui::gui::{PanelBackend, project_pointer};
use vr_gui::hmd::ControllerState;

const EYE: Vec3 = Vec3::new(0.0, 1.4, 0.0);

fn aimed_at(target: Vec3) -> ControllerState {
    let direction = (target - EYE).normalize();
    ControllerState {
        pose: Pose::new(EYE, Quat::from_rotation_arc(Vec3::NEG_Z, direction)),
        active: true,
        ..ControllerState::default()
    }
}

fn assert_near(actual: Option<Vec2>, expected: Vec2) {
    let actual = actual.expect("ray should hit the panel");
    assert!(
        actual.distance(expected) < 0.5,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn straight_ahead_hits_canvas_centre() {
    let config = PanelConfig::default();
    assert_near(
        project_pointer(&config, EYE, Vec3::NEG_Z),
        Vec2::new(800.0, 300.0),
    );
}

#[test]
fn upper_left_region_maps_near_top_left_pixels() {
    // Quad is 3.2 x 1.2 m centred at (0, 1.4, -2.5)
    let config = PanelConfig::default();
    let target = Vec3::new(-1.2, 1.85, -2.5);
    assert_near(
        project_pointer(&config, EYE, target - EYE),
        Vec2::new(200.0, 75.0),
    );
}

#[test]
fn panel_out_of_reach_is_ignored() {
    let config = PanelConfig {
        max_raycast_distance: 2.0,
        ..PanelConfig::default()
    };
    assert_eq!(project_pointer(&config, EYE, Vec3::NEG_Z), None);
}

#[test]
fn pointing_away_misses() {
    let config = PanelConfig::default();
    assert_eq!(project_pointer(&config, EYE, Vec3::Z), None);
    assert_eq!(project_pointer(&config, EYE, Vec3::X), None);
}

#[test]
fn backend_reports_pointer_then_pointer_gone() {
    let mut panel = PanelBackend::new(&PanelConfig::default());
    let camera = Camera::default();

    let input = panel.new_frame(&aimed_at(Vec3::new(0.0, 1.4, -2.5)), &camera);
    assert!(matches!(input.events.first(), Some(Event::PointerMoved(_))));
    assert!(panel.pointer().is_some());

    let input = panel.new_frame(&aimed_at(Vec3::new(0.0, 5.0, -2.5)), &camera);
    assert!(panel.pointer().is_none());
    assert!(input.events.contains(&Event::PointerGone));

    let input = panel.new_frame(&aimed_at(Vec3::new(0.0, 5.0, -2.5)), &camera);
    assert!(!input.events.contains(&Event::PointerGone));
}

#[test]
fn trigger_clicks_at_the_hit_point() {
    let mut panel = PanelBackend::new(&PanelConfig::default());
    let camera = Camera::default();
    let mut controller = aimed_at(Vec3::new(0.0, 1.4, -2.5));

    panel.new_frame(&controller, &camera);
    controller.index_trigger = 0.9;
    let input = panel.new_frame(&controller, &camera);

    let press = input.events.iter().find_map(|event| match event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            ..
        } => Some((*pos, *pressed)),
        _ => None,
    });
    let (pos, pressed) = press.expect("trigger should press the primary button");
    assert!(pressed);
    assert!((pos.x - 800.0).abs() < 0.5 && (pos.y - 300.0).abs() < 0.5);
}

#[test]
fn moved_camera_shifts_the_ray_into_the_world() {
    let mut panel = PanelBackend::new(&PanelConfig::default());
    // Controller tracked at the origin, camera carries it half a metre right
    let camera = Camera::new(Vec3::new(0.5, 0.0, 0.0), Quat::IDENTITY);
    panel.new_frame(&aimed_at(Vec3::new(0.0, 1.4, -2.5)), &camera);

    let hit = panel.pointer().expect("shifted ray still hits");
    assert!((hit.canvas_pos.x - 1050.0).abs() < 0.5);
    assert!((hit.canvas_pos.y - 300.0).abs() < 0.5);
}

/// Feeds one frame to a panel whose whole canvas is a single button
fn button_clicked(panel: &mut PanelBackend, controller: &ControllerState) -> bool {
    let input = panel.new_frame(controller, &Camera::default());
    let mut clicked = false;
    let _ = panel.context().run(input, |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            clicked = ui
                .add_sized(ui.available_size(), egui::Button::new("Press"))
                .clicked();
        });
    });
    clicked
}

#[test]
fn trigger_pulled_on_the_panel_clicks_the_button() {
    let mut panel = PanelBackend::new(&PanelConfig::default());
    let mut controller = aimed_at(Vec3::new(0.0, 1.4, -2.5));

    let mut clicks = 0;
    for trigger in [0.0, 0.9, 0.0] {
        controller.index_trigger = trigger;
        clicks += usize::from(button_clicked(&mut panel, &controller));
    }
    assert_eq!(clicks, 1);
}

#[test]
fn trigger_pulled_off_the_panel_clicks_nothing() {
    let mut panel = PanelBackend::new(&PanelConfig::default());
    let mut clicks = 0;

    // Hover the button first so the last pointer position lies on it
    clicks += usize::from(button_clicked(&mut panel, &aimed_at(Vec3::new(0.0, 1.4, -2.5))));

    let mut away = aimed_at(Vec3::new(0.0, 5.0, -2.5));
    for trigger in [0.0, 0.9, 0.0] {
        away.index_trigger = trigger;
        clicks += usize::from(button_clicked(&mut panel, &away));
    }
    assert_eq!(clicks, 0);
}
