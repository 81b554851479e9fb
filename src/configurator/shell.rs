//! Layout and input mapping of the presentation shell.
//!
//! Everything here is pure: [`layout`] turns the window size and the session into
//! pixel rectangles, [`action_for`] maps a picked GUI id to a [`UiAction`] and
//! [`apply`] mutates the session. The GUI flow turns rectangles into quads.

use crate::configurator::{
    ConfiguratorEvent,
    catalog::{self, MaterialRecord},
    state::{SceneStatus, Session},
};

pub const DOOR_BUTTON_ID: u32 = 1;
pub const PANEL_BUTTON_ID: u32 = 2;
pub const BANNER_ID: u32 = 3;
pub const LOGO_ID: u32 = 4;
/// Swatch `i` of the catalog is picked as `SWATCH_BASE_ID + i`.
pub const SWATCH_BASE_ID: u32 = 16;

const MARGIN: f32 = 24.0;
const BUTTON: f32 = 48.0;
const PANEL_LEFT: f32 = 80.0;
const PANEL_PADDING: f32 = 16.0;
const SWATCH_WIDTH: f32 = 100.0;
const SWATCH_HEIGHT: f32 = 130.0;
const SWATCH_GAP: f32 = 12.0;
const THUMBNAIL: f32 = 88.0;
const THUMBNAIL_TOP: f32 = 4.0;
const RING: f32 = 4.0;
const LOGO_WIDTH: f32 = 80.0;
const LOGO_HEIGHT: f32 = 16.0;
const LOGO_BOTTOM: f32 = 16.0;
const BANNER_WIDTH: f32 = 320.0;
const BANNER_HEIGHT: f32 = 48.0;

/// Screen rectangle in physical pixels, origin top left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn expand(&self, by: f32) -> Self {
        Self::new(
            self.x - by,
            self.y - by,
            self.width + 2.0 * by,
            self.height + 2.0 * by,
        )
    }

    /// Corners in normalized device coordinates: top left, bottom left, bottom right, top right.
    pub fn to_ndc(&self, screen_width: f32, screen_height: f32) -> [[f32; 2]; 4] {
        let x = |px: f32| px / screen_width * 2.0 - 1.0;
        let y = |py: f32| 1.0 - py / screen_height * 2.0;
        let (left, right) = (x(self.x), x(self.x + self.width));
        let (top, bottom) = (y(self.y), y(self.y + self.height));
        [[left, top], [left, bottom], [right, bottom], [right, top]]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Banner {
    Loading,
    /// Clicking it reloads the cabinet.
    SceneFailed,
    /// Clicking it dismisses the message.
    TextureFailed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Swatch {
    pub record: &'static MaterialRecord,
    pub thumbnail: Rect,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShellLayout {
    pub door_button: Rect,
    pub panel_button: Rect,
    pub panel: Option<Rect>,
    pub swatches: Vec<Swatch>,
    /// Highlight behind the selected swatch.
    pub ring: Option<Rect>,
    pub banner: Option<(Banner, Rect)>,
    pub logo: Rect,
}

pub fn layout(width: f32, height: f32, session: &Session) -> ShellLayout {
    let door_button = Rect::new(MARGIN, MARGIN, BUTTON, BUTTON);
    let panel_button = Rect::new(MARGIN, height - MARGIN - BUTTON, BUTTON, BUTTON);
    let logo = Rect::new(
        (width - LOGO_WIDTH) / 2.0,
        height - LOGO_BOTTOM - LOGO_HEIGHT,
        LOGO_WIDTH,
        LOGO_HEIGHT,
    );

    let (panel, swatches) = if session.app.material_panel_open() {
        let (panel, swatches) = panel_layout(width, height, session);
        (Some(panel), swatches)
    } else {
        (None, Vec::new())
    };
    let ring = swatches
        .iter()
        .find(|swatch| swatch.selected)
        .map(|swatch| swatch.thumbnail.expand(RING));

    let banner_kind = match (&session.scene, &session.texture_error) {
        (SceneStatus::Loading, _) => Some(Banner::Loading),
        (SceneStatus::Failed(_), _) => Some(Banner::SceneFailed),
        (SceneStatus::Ready { .. }, Some(_)) => Some(Banner::TextureFailed),
        (SceneStatus::Ready { .. }, None) => None,
    };
    let banner = banner_kind.map(|kind| {
        let banner_width = BANNER_WIDTH.min(width - 2.0 * MARGIN).max(0.0);
        (
            kind,
            Rect::new((width - banner_width) / 2.0, MARGIN, banner_width, BANNER_HEIGHT),
        )
    });

    ShellLayout {
        door_button,
        panel_button,
        panel,
        swatches,
        ring,
        banner,
        logo,
    }
}

/// The swatch row shrinks uniformly when the window is too narrow for it.
fn panel_layout(width: f32, height: f32, session: &Session) -> (Rect, Vec<Swatch>) {
    let records = catalog::list();
    let count = records.len() as f32;
    let natural = 2.0 * PANEL_PADDING + count * SWATCH_WIDTH + (count - 1.0) * SWATCH_GAP;
    let available = (width - PANEL_LEFT - MARGIN).max(0.0);
    let scale = (available / natural).min(1.0);

    let panel_height = (2.0 * PANEL_PADDING + SWATCH_HEIGHT) * scale;
    let panel = Rect::new(
        PANEL_LEFT,
        height - MARGIN - panel_height,
        natural * scale,
        panel_height,
    );
    let selected = session.app.selected_material();
    let swatches = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let cell_x = panel.x + (PANEL_PADDING + i as f32 * (SWATCH_WIDTH + SWATCH_GAP)) * scale;
            let cell_y = panel.y + PANEL_PADDING * scale;
            Swatch {
                record,
                thumbnail: Rect::new(
                    cell_x + (SWATCH_WIDTH - THUMBNAIL) / 2.0 * scale,
                    cell_y + THUMBNAIL_TOP * scale,
                    THUMBNAIL * scale,
                    THUMBNAIL * scale,
                ),
                selected: record == selected,
            }
        })
        .collect();
    (panel, swatches)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    ToggleDoor,
    ToggleMaterialPanel,
    SelectMaterial(&'static str),
    Banner,
}

pub fn action_for(pick_id: u32) -> Option<UiAction> {
    match pick_id {
        DOOR_BUTTON_ID => Some(UiAction::ToggleDoor),
        PANEL_BUTTON_ID => Some(UiAction::ToggleMaterialPanel),
        BANNER_ID => Some(UiAction::Banner),
        id if id >= SWATCH_BASE_ID => catalog::list()
            .get((id - SWATCH_BASE_ID) as usize)
            .map(|record| UiAction::SelectMaterial(record.id)),
        _ => None,
    }
}

/// Applies a shell action; returns an event for the other flows when one is needed.
pub fn apply(action: UiAction, session: &mut Session) -> Option<ConfiguratorEvent> {
    match action {
        UiAction::ToggleDoor => {
            let open = session.app.toggle_door();
            log::debug!("Door {}", if open { "opening" } else { "closing" });
            None
        }
        UiAction::ToggleMaterialPanel => {
            session.app.toggle_material_panel();
            None
        }
        UiAction::SelectMaterial(id) => {
            session.app.select_material(id);
            None
        }
        UiAction::Banner if session.is_failed() => Some(ConfiguratorEvent::ReloadScene),
        UiAction::Banner => session
            .texture_error
            .take()
            .map(|_| ConfiguratorEvent::ReloadTexture),
    }
}
