use cabinet_configurator::configurator::{
    ConfiguratorEvent, catalog,
    shell::{self, Banner, Rect, UiAction},
    state::{SceneStatus, Session},
};

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

fn ready() -> Session {
    Session {
        scene: SceneStatus::Ready { animated: true },
        ..Default::default()
    }
}

#[test]
fn pick_ids_map_to_actions() {
    assert_eq!(shell::action_for(shell::DOOR_BUTTON_ID), Some(UiAction::ToggleDoor));
    assert_eq!(
        shell::action_for(shell::PANEL_BUTTON_ID),
        Some(UiAction::ToggleMaterialPanel)
    );
    assert_eq!(shell::action_for(shell::BANNER_ID), Some(UiAction::Banner));
    assert_eq!(shell::action_for(shell::LOGO_ID), None);
    assert_eq!(shell::action_for(0), None);
    assert_eq!(
        shell::action_for(shell::SWATCH_BASE_ID + 2),
        Some(UiAction::SelectMaterial("Jarrah"))
    );
    let past_the_catalog = shell::SWATCH_BASE_ID + catalog::list().len() as u32;
    assert_eq!(shell::action_for(past_the_catalog), None);
}

#[test]
fn the_panel_shows_one_swatch_per_catalog_entry() {
    let mut session = ready();
    assert!(shell::layout(WIDTH, HEIGHT, &session).panel.is_none());

    shell::apply(UiAction::ToggleMaterialPanel, &mut session);
    let layout = shell::layout(WIDTH, HEIGHT, &session);
    let panel = layout.panel.unwrap();
    assert_eq!(layout.swatches.len(), catalog::list().len());
    for (swatch, record) in layout.swatches.iter().zip(catalog::list()) {
        assert_eq!(swatch.record, record);
        assert!(panel.contains(swatch.thumbnail.x, swatch.thumbnail.y));
    }
    // the default surface is selected and ringed
    assert!(layout.swatches[0].selected);
    assert_eq!(layout.ring, Some(layout.swatches[0].thumbnail.expand(4.0)));
}

#[test]
fn selecting_a_swatch_moves_the_ring() {
    let mut session = ready();
    shell::apply(UiAction::ToggleMaterialPanel, &mut session);
    let action = shell::action_for(shell::SWATCH_BASE_ID + 5).unwrap();
    assert!(shell::apply(action, &mut session).is_none());
    assert_eq!(session.app.selected_material().id, "Midnight-Oak");

    let layout = shell::layout(WIDTH, HEIGHT, &session);
    let selected: Vec<_> = layout.swatches.iter().filter(|s| s.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].record.id, "Midnight-Oak");
}

#[test]
fn a_narrow_window_shrinks_the_panel() {
    let mut session = ready();
    shell::apply(UiAction::ToggleMaterialPanel, &mut session);
    let layout = shell::layout(600.0, HEIGHT, &session);
    let panel = layout.panel.unwrap();
    assert!(panel.x + panel.width <= 600.0);
    let last = layout.swatches.last().unwrap().thumbnail;
    assert!(last.x + last.width <= panel.x + panel.width);
}

#[test]
fn door_toggle_flips_the_state() {
    let mut session = ready();
    assert!(shell::apply(UiAction::ToggleDoor, &mut session).is_none());
    assert!(session.app.door_open());
    shell::apply(UiAction::ToggleDoor, &mut session);
    assert!(!session.app.door_open());
}

#[test]
fn the_banner_follows_the_scene_status() {
    let mut session = Session::default();
    let banner = |session: &Session| shell::layout(WIDTH, HEIGHT, session).banner.map(|(kind, _)| kind);
    assert_eq!(banner(&session), Some(Banner::Loading));

    session.scene = SceneStatus::Failed("failed to load asset models/cabinet.glb".to_string());
    assert_eq!(banner(&session), Some(Banner::SceneFailed));

    session.scene = SceneStatus::Ready { animated: false };
    assert_eq!(banner(&session), None);

    session.texture_error = Some("textures/Jarrah.jpg: 404".to_string());
    assert_eq!(banner(&session), Some(Banner::TextureFailed));
}

#[test]
fn clicking_the_failure_banner_requests_a_reload() {
    let mut session = Session {
        scene: SceneStatus::Failed("timeout".to_string()),
        ..Default::default()
    };
    let event = shell::apply(UiAction::Banner, &mut session);
    assert!(matches!(event, Some(ConfiguratorEvent::ReloadScene)));
}

#[test]
fn clicking_the_texture_banner_dismisses_it_and_retries() {
    let mut session = ready();
    session.texture_error = Some("404".to_string());
    let event = shell::apply(UiAction::Banner, &mut session);
    assert!(matches!(event, Some(ConfiguratorEvent::ReloadTexture)));
    assert!(session.texture_error.is_none());
    // nothing left to retry
    assert!(shell::apply(UiAction::Banner, &mut session).is_none());
}

#[test]
fn controls_stay_inside_the_window() {
    let layout = shell::layout(WIDTH, HEIGHT, &Session::default());
    let window = Rect::new(0.0, 0.0, WIDTH, HEIGHT);
    for rect in [layout.door_button, layout.panel_button, layout.logo] {
        assert!(window.contains(rect.x, rect.y));
        assert!(window.contains(rect.x + rect.width, rect.y + rect.height));
    }
}

#[test]
fn ndc_corners_span_the_window() {
    let corners = Rect::new(0.0, 0.0, WIDTH, HEIGHT).to_ndc(WIDTH, HEIGHT);
    assert_eq!(corners, [[-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0]]);
}
